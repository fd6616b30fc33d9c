//! WebSocket client transport.

use std::io;
use std::net::TcpStream;

use tungstenite::protocol::WebSocket;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{client, Message};

use crate::{Transport, WsError};

/// How outbound payloads are framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// UTF-8 text frames (JSON game protocols).
    Text,
    /// Binary frames.
    Binary,
}

/// Client-side WebSocket transport.
///
/// The handshake is blocking; afterwards the socket is switched to
/// non-blocking so `receive` only drains frames that already arrived and
/// never stalls a frame loop.
pub struct WsTransport {
    ws: WebSocket<MaybeTlsStream<TcpStream>>,
    frame_mode: FrameMode,
    closed: bool,
}

impl WsTransport {
    /// Connect to a WebSocket server.
    pub fn connect(url: &str, frame_mode: FrameMode) -> crate::Result<Self> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(WsError::invalid_url(url));
        }

        let (ws, _response) = client::connect(url).map_err(|e| match e {
            tungstenite::Error::Url(_) => WsError::invalid_url(url),
            tungstenite::Error::Http(_) => WsError::HandshakeFailed,
            other => WsError::WebSocket(other),
        })?;

        if let MaybeTlsStream::Plain(ref stream) = ws.get_ref() {
            stream.set_nodelay(true)?;
            stream.set_nonblocking(true)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(url, ?frame_mode, "websocket connected");

        Ok(Self {
            ws,
            frame_mode,
            closed: false,
        })
    }

    /// Frame mode chosen at connect time.
    pub fn frame_mode(&self) -> FrameMode {
        self.frame_mode
    }

    /// Set blocking mode
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        if let MaybeTlsStream::Plain(ref stream) = self.ws.get_ref() {
            stream.set_nonblocking(nonblocking)?;
        }
        Ok(())
    }

    fn frame(&self, data: &[u8]) -> io::Result<Message> {
        match self.frame_mode {
            FrameMode::Binary => Ok(Message::Binary(data.to_vec().into())),
            FrameMode::Text => {
                let text = std::str::from_utf8(data)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok(Message::Text(text.into()))
            }
        }
    }
}

impl Transport for WsTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "connection closed"));
        }

        let msg = self.frame(data)?;
        match self.ws.send(msg) {
            Ok(()) => Ok(data.len()),
            // The frame is queued in tungstenite's write buffer; it goes out on
            // the next flush.
            Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => {
                Ok(data.len())
            }
            Err(e) => {
                if matches!(
                    e,
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
                ) {
                    self.closed = true;
                }
                Err(ws_to_io(e))
            }
        }
    }

    fn receive<F: FnMut(&[u8])>(&mut self, mut handler: F) -> usize {
        if self.closed {
            return 0;
        }

        let mut count = 0;

        loop {
            match self.ws.read() {
                Ok(Message::Text(text)) => {
                    handler(text.as_bytes());
                    count += 1;
                }
                Ok(Message::Binary(data)) => {
                    handler(&data);
                    count += 1;
                }
                // Pongs are queued by tungstenite itself and flushed on the next write.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(_)) => {
                    self.closed = true;
                    break;
                }
                Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => {
                    break;
                }
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(error = %_e, "websocket read failed, marking closed");
                    self.closed = true;
                    break;
                }
            }
        }

        count
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.ws.flush() {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(ws_to_io(e)),
        }
    }

    fn is_open(&self) -> bool {
        !self.closed && self.ws.can_write()
    }

    fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            let _ = self.ws.close(None);
            let _ = self.ws.flush();
            self.closed = true;
        }
        Ok(())
    }
}

fn ws_to_io(e: tungstenite::Error) -> io::Error {
    match e {
        tungstenite::Error::Io(io_err) => io_err,
        tungstenite::Error::ConnectionClosed => {
            io::Error::new(io::ErrorKind::ConnectionReset, "WebSocket connection closed")
        }
        tungstenite::Error::AlreadyClosed => {
            io::Error::new(io::ErrorKind::NotConnected, "WebSocket already closed")
        }
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}
