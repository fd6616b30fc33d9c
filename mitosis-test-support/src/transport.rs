//! Scripted in-memory transport.
//!
//! Inbound frames are queued by the test and drained on the next `receive`.
//! Outbound frames are recorded. Readiness follows a [`Readiness`] pattern
//! evaluated once per `is_open` check, the way a real socket can be
//! connecting, open, or flapping.
//!
//! # Example
//!
//! ```
//! use mitosis_test_support::{Readiness, ScriptedTransport};
//! use mitosis_ws::Transport;
//!
//! let mut transport = ScriptedTransport::new();
//! let peer = transport.clone();
//!
//! peer.push_inbound(br#"{"players":{},"food":[]}"#);
//! assert_eq!(transport.receive(|_| {}), 1);
//!
//! transport.send(b"hello").unwrap();
//! assert_eq!(peer.sent_text(), vec!["hello".to_string()]);
//!
//! peer.set_readiness(Readiness::Closed);
//! assert!(!transport.is_open());
//! ```

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::io;
use std::rc::Rc;

use mitosis_ws::Transport;

/// When the transport reports itself open.
#[derive(Debug, Clone)]
pub enum Readiness {
    /// Always open.
    Open,
    /// Never open.
    Closed,
    /// Closed on every Nth check (1-based).
    Periodic { every_n: usize },
    /// Closed on the listed checks (0-based).
    Specific { checks: HashSet<usize> },
    /// Closed for the first N checks, open afterwards.
    OpensAfter { checks: usize },
}

impl Readiness {
    fn is_open_at(&self, check: usize) -> bool {
        match self {
            Readiness::Open => true,
            Readiness::Closed => false,
            Readiness::Periodic { every_n } => *every_n == 0 || (check + 1) % *every_n != 0,
            Readiness::Specific { checks } => !checks.contains(&check),
            Readiness::OpensAfter { checks } => check >= *checks,
        }
    }
}

#[derive(Debug)]
struct Inner {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    readiness: Readiness,
    checks: usize,
    closed: bool,
    fail_sends: bool,
}

/// In-memory transport; clones share the same state.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    inner: Rc<RefCell<Inner>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::with_readiness(Readiness::Open)
    }

    pub fn with_readiness(readiness: Readiness) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                inbound: VecDeque::new(),
                sent: Vec::new(),
                readiness,
                checks: 0,
                closed: false,
                fail_sends: false,
            })),
        }
    }

    /// Queue a frame for the next `receive`.
    pub fn push_inbound(&self, frame: impl AsRef<[u8]>) {
        self.inner
            .borrow_mut()
            .inbound
            .push_back(frame.as_ref().to_vec());
    }

    pub fn set_readiness(&self, readiness: Readiness) {
        let mut inner = self.inner.borrow_mut();
        inner.readiness = readiness;
        inner.checks = 0;
    }

    /// Make every send return an I/O error while still reporting open.
    pub fn fail_sends(&self, fail: bool) {
        self.inner.borrow_mut().fail_sends = fail;
    }

    /// Frames sent so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.borrow().sent.clone()
    }

    /// Frames sent so far, decoded as UTF-8.
    pub fn sent_text(&self) -> Vec<String> {
        self.inner
            .borrow()
            .sent
            .iter()
            .map(|frame| String::from_utf8_lossy(frame).into_owned())
            .collect()
    }

    /// Frames sent so far, parsed as JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.inner
            .borrow()
            .sent
            .iter()
            .map(|frame| serde_json::from_slice(frame).unwrap_or(serde_json::Value::Null))
            .collect()
    }

    /// Number of readiness checks made.
    pub fn readiness_checks(&self) -> usize {
        self.inner.borrow().checks
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "connection closed"));
        }
        if inner.fail_sends {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted send failure"));
        }
        inner.sent.push(data.to_vec());
        Ok(data.len())
    }

    fn receive<F: FnMut(&[u8])>(&mut self, mut handler: F) -> usize {
        // Drain first so the handler may queue more frames for the next poll.
        let frames: Vec<Vec<u8>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return 0;
            }
            inner.inbound.drain(..).collect()
        };
        for frame in &frames {
            handler(frame);
        }
        frames.len()
    }

    fn is_open(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        let check = inner.checks;
        inner.checks += 1;
        !inner.closed && inner.readiness.is_open_at(check)
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.borrow_mut().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_pattern(readiness: Readiness, checks: usize) -> Vec<bool> {
        let transport = ScriptedTransport::with_readiness(readiness);
        (0..checks).map(|_| transport.is_open()).collect()
    }

    #[test]
    fn test_periodic_readiness() {
        let opens = open_pattern(Readiness::Periodic { every_n: 3 }, 6);
        assert_eq!(opens, vec![true, true, false, true, true, false]);
    }

    #[test]
    fn test_opens_after() {
        let opens = open_pattern(Readiness::OpensAfter { checks: 2 }, 4);
        assert_eq!(opens, vec![false, false, true, true]);
    }

    #[test]
    fn test_specific_readiness() {
        let opens = open_pattern(
            Readiness::Specific {
                checks: [1, 3].into_iter().collect(),
            },
            4,
        );
        assert_eq!(opens, vec![true, false, true, false]);
    }

    #[test]
    fn test_clones_share_state() {
        let mut transport = ScriptedTransport::new();
        let peer = transport.clone();

        transport.send(b"one").unwrap();
        peer.push_inbound(b"two");

        let mut received = Vec::new();
        transport.receive(|frame| received.push(frame.to_vec()));

        assert_eq!(peer.sent(), vec![b"one".to_vec()]);
        assert_eq!(received, vec![b"two".to_vec()]);
    }

    #[test]
    fn test_closed_transport_rejects_sends() {
        let mut transport = ScriptedTransport::new();
        transport.close().unwrap();
        assert!(!transport.is_open());
        assert!(transport.send(b"x").is_err());
        assert!(transport.sent().is_empty());
    }
}
