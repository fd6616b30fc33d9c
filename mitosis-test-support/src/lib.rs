//! Test utilities for the mitosis client.
//!
//! - [`transport`]: in-memory [`mitosis_ws::Transport`] with scripted inbound
//!   frames and configurable readiness
//! - [`snapshot`]: builders for server frames in the wire format

pub mod snapshot;
pub mod transport;

pub use snapshot::{death, elimination, init, SnapshotBuilder};
pub use transport::{Readiness, ScriptedTransport};
