//! # mitosis-ws
//!
//! WebSocket client transport for the mitosis arena client.
//!
//! ## Features
//!
//! - **RFC 6455 compliant**: WebSocket protocol via tungstenite
//! - **Composable**: game code talks to the [`Transport`] trait, so tests can
//!   swap in an in-memory transport
//! - **Text or binary frames**: JSON protocols use [`FrameMode::Text`]
//! - **Non-blocking**: designed for single-threaded frame loops
//!
//! ## Example
//!
//! ```rust,ignore
//! use mitosis_ws::{FrameMode, Transport, WsTransport};
//!
//! let mut transport = WsTransport::connect("ws://localhost:8765", FrameMode::Text)?;
//! transport.send(br##"{"name":"cell","color":"#ff0000"}"##)?;
//!
//! transport.receive(|frame| println!("{} bytes", frame.len()));
//! ```

mod error;
mod transport;

pub use error::{Result, WsError};
pub use transport::{FrameMode, WsTransport};

/// Message-framed duplex connection.
pub trait Transport {
    /// Send one frame, returns bytes accepted.
    fn send(&mut self, data: &[u8]) -> std::io::Result<usize>;

    /// Drain buffered frames into the callback, returns count received.
    fn receive<F: FnMut(&[u8])>(&mut self, handler: F) -> usize;

    /// Flush pending operations
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    /// Check if the connection is open and writable
    fn is_open(&self) -> bool;

    /// Close the connection
    fn close(&mut self) -> std::io::Result<()>;
}
