//! # mitosis-client
//!
//! Terminal client for an agar.io-style arena. The server owns the
//! simulation; the client shows it, predicts the local player's movement
//! and forwards movement intents.
//!
//! ## Layout
//!
//! - [`protocol`]: wire messages, decoded once at the boundary
//! - [`channel`]: fire-and-forget duplex channel over a [`mitosis_ws::Transport`]
//! - [`world`], [`binding`], [`camera`], [`input`], [`lifecycle`]: game state
//! - [`session`]: one session's state and handlers
//! - [`render`]: pure frame rendering onto a [`render::Surface`]
//! - [`runtime`]: terminal setup and the frame loop
//!
//! ## Example
//!
//! ```rust,ignore
//! use mitosis_client::{runtime, ClientConfig};
//!
//! let config = ClientConfig::from_env()?;
//! runtime::run(&config)?;
//! ```

pub mod binding;
pub mod camera;
pub mod channel;
pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod lifecycle;
pub mod protocol;
pub mod render;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod telemetry;
pub mod world;

pub use binding::{Identity, LocalBinding};
pub use camera::Camera;
pub use channel::{ChannelStats, NetworkChannel, SendOutcome};
pub use config::ClientConfig;
pub use error::{ClientError, ProtocolError, Result};
pub use geometry::{Rect, Viewport};
pub use input::{ControlMode, Direction, InputController, KeyState, MOVE_SPEED};
pub use lifecycle::{Lifecycle, Phase, RestartAffordance, RestartMode};
pub use protocol::{ClientMessage, ServerMessage};
pub use session::{Session, SessionConfig, SessionExit};
pub use world::{Food, Player, PlayerId, Ranking, WorldBounds, WorldState};
