//! Network channel: one duplex connection to the game server.
//!
//! Outbound traffic is fire-and-forget. The hello goes out once, before any
//! movement; movement intents are sent only while the transport reports
//! itself open and are dropped otherwise. There is no queue, no retry and no
//! acknowledgement: the next movement supersedes a dropped one.
//!
//! Inbound frames are decoded at this boundary. Frames that do not decode are
//! logged and skipped.

use glam::Vec2;
use mitosis_ws::Transport;
use tracing::{debug, info, warn};

use crate::binding::Identity;
use crate::protocol::{ClientMessage, ServerMessage};

/// Result of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Transport not ready or the write failed; nothing was queued.
    Dropped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub frames_received: u64,
    pub frames_rejected: u64,
}

pub struct NetworkChannel<T: Transport> {
    transport: T,
    hello: Option<ClientMessage>,
    stats: ChannelStats,
}

impl<T: Transport> NetworkChannel<T> {
    /// Take ownership of an opened transport and send the hello.
    ///
    /// If the transport is not ready yet, the hello is held back and goes out
    /// ahead of the first frame sent once it is.
    pub fn open(transport: T, identity: &Identity) -> Self {
        let mut channel = Self {
            transport,
            hello: Some(ClientMessage::Hello {
                name: identity.name.clone(),
                color: identity.color.clone(),
            }),
            stats: ChannelStats::default(),
        };
        if channel.transport.is_open() {
            channel.flush_hello();
        }
        channel
    }

    /// Whether the hello has gone out.
    pub fn is_greeted(&self) -> bool {
        self.hello.is_none()
    }

    /// Send an absolute position. Dropped silently when not ready.
    pub fn send_intent(&mut self, position: Vec2) -> SendOutcome {
        if !self.transport.is_open() {
            self.stats.frames_dropped += 1;
            debug!(x = position.x, y = position.y, "channel not ready, intent dropped");
            return SendOutcome::Dropped;
        }

        if !self.flush_hello() {
            self.stats.frames_dropped += 1;
            return SendOutcome::Dropped;
        }

        self.write(&ClientMessage::Move {
            x: position.x,
            y: position.y,
        })
    }

    /// Drain inbound frames, handing each decoded message to `handler`.
    /// Returns the number of messages delivered.
    pub fn poll<F: FnMut(ServerMessage)>(&mut self, mut handler: F) -> usize {
        if self.hello.is_some() && self.transport.is_open() {
            self.flush_hello();
        }

        let stats = &mut self.stats;
        let mut delivered = 0;
        self.transport.receive(|frame| {
            stats.frames_received += 1;
            match ServerMessage::decode(frame) {
                Ok(message) => {
                    delivered += 1;
                    handler(message);
                }
                Err(error) => {
                    stats.frames_rejected += 1;
                    warn!(%error, len = frame.len(), "rejected inbound frame");
                }
            }
        });
        delivered
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn close(&mut self) {
        if let Err(error) = self.transport.close() {
            debug!(%error, "close failed");
        }
        info!(stats = ?self.stats, "channel closed");
    }

    /// Send the pending hello, if any. Returns whether the channel is greeted.
    fn flush_hello(&mut self) -> bool {
        let Some(hello) = self.hello.take() else {
            return true;
        };
        match self.write(&hello) {
            SendOutcome::Sent => {
                info!("hello sent");
                true
            }
            SendOutcome::Dropped => {
                self.hello = Some(hello);
                false
            }
        }
    }

    fn write(&mut self, message: &ClientMessage) -> SendOutcome {
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(error) => {
                self.stats.frames_dropped += 1;
                warn!(%error, "could not encode outbound frame");
                return SendOutcome::Dropped;
            }
        };

        let result = self
            .transport
            .send(&frame)
            .and_then(|_| self.transport.flush());
        match result {
            Ok(()) => {
                self.stats.frames_sent += 1;
                SendOutcome::Sent
            }
            Err(error) => {
                self.stats.frames_dropped += 1;
                debug!(%error, "send failed, frame dropped");
                SendOutcome::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mitosis_test_support::{Readiness, ScriptedTransport, SnapshotBuilder};
    use serde_json::json;

    fn identity() -> Identity {
        Identity::new("cell", "#ff0000")
    }

    #[test]
    fn test_hello_sent_once_on_open() {
        let transport = ScriptedTransport::new();
        let peer = transport.clone();
        let mut channel = NetworkChannel::open(transport, &identity());

        channel.send_intent(Vec2::new(1.0, 2.0));
        channel.poll(|_| {});
        channel.send_intent(Vec2::new(3.0, 4.0));

        assert_eq!(
            peer.sent_json(),
            vec![
                json!({"name": "cell", "color": "#ff0000"}),
                json!({"x": 1.0, "y": 2.0}),
                json!({"x": 3.0, "y": 4.0}),
            ]
        );
    }

    #[test]
    fn test_not_ready_drops_without_queueing() {
        let transport = ScriptedTransport::with_readiness(Readiness::Closed);
        let peer = transport.clone();
        let mut channel = NetworkChannel::open(transport, &identity());

        assert_eq!(channel.send_intent(Vec2::new(1.0, 1.0)), SendOutcome::Dropped);
        assert!(peer.sent().is_empty());
        assert!(!channel.is_greeted());

        peer.set_readiness(Readiness::Open);
        assert_eq!(channel.send_intent(Vec2::new(2.0, 2.0)), SendOutcome::Sent);

        // The hello leads, the dropped intent is gone.
        assert_eq!(
            peer.sent_json(),
            vec![
                json!({"name": "cell", "color": "#ff0000"}),
                json!({"x": 2.0, "y": 2.0}),
            ]
        );
        assert_eq!(channel.stats().frames_dropped, 1);
    }

    #[test]
    fn test_send_error_is_swallowed() {
        let transport = ScriptedTransport::new();
        let peer = transport.clone();
        let mut channel = NetworkChannel::open(transport, &identity());

        peer.fail_sends(true);
        assert_eq!(channel.send_intent(Vec2::ONE), SendOutcome::Dropped);
        assert_eq!(channel.stats().frames_sent, 1);
    }

    #[test]
    fn test_poll_decodes_and_skips_garbage() {
        let transport = ScriptedTransport::new();
        let peer = transport.clone();
        let mut channel = NetworkChannel::open(transport, &identity());

        peer.push_inbound(b"garbage");
        peer.push_inbound(SnapshotBuilder::new().build());
        peer.push_inbound(br#"{"unrelated":1}"#);

        let mut kinds = Vec::new();
        let delivered = channel.poll(|msg| kinds.push(msg.kind()));

        assert_eq!(delivered, 1);
        assert_eq!(kinds, vec!["snapshot"]);
        let stats = channel.stats();
        assert_eq!(stats.frames_received, 3);
        assert_eq!(stats.frames_rejected, 2);
    }

    #[test]
    fn test_hello_flushed_on_poll_once_ready() {
        let transport = ScriptedTransport::with_readiness(Readiness::OpensAfter { checks: 1 });
        let peer = transport.clone();
        let mut channel = NetworkChannel::open(transport, &identity());
        assert!(peer.sent().is_empty());

        channel.poll(|_| {});
        assert!(channel.is_greeted());
        assert_eq!(peer.sent_json(), vec![json!({"name": "cell", "color": "#ff0000"})]);
    }
}
