//! Session lifecycle: `Playing -> Eliminated`, once, with no way back.
//!
//! Restarting is not a transition. The session reports
//! [`SessionExit::Restart`](crate::session::SessionExit) and the whole
//! session is torn down and rebuilt.

use std::str::FromStr;

use glam::Vec2;
use tracing::info;

use crate::error::ClientError;
use crate::geometry::{Rect, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Playing,
    Eliminated { final_score: i64 },
}

#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    phase: Phase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_eliminated(&self) -> bool {
        matches!(self.phase, Phase::Eliminated { .. })
    }

    pub fn final_score(&self) -> Option<i64> {
        match self.phase {
            Phase::Playing => None,
            Phase::Eliminated { final_score } => Some(final_score),
        }
    }

    /// Enter `Eliminated`, freezing `final_score`. Returns `false` (and
    /// changes nothing) if already eliminated.
    pub fn eliminate(&mut self, final_score: i64) -> bool {
        if self.is_eliminated() {
            return false;
        }
        info!(final_score, "eliminated");
        self.phase = Phase::Eliminated { final_score };
        true
    }
}

/// How the game-over screen offers a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartMode {
    /// Any click restarts.
    #[default]
    AnyClick,
    /// Only a click inside the drawn button restarts.
    Button,
}

impl FromStr for RestartMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "click" | "any" | "anyclick" => Ok(Self::AnyClick),
            "button" => Ok(Self::Button),
            _ => Err(ClientError::invalid_config(
                "MITOSIS_RESTART",
                s,
                "expected `click` or `button`",
            )),
        }
    }
}

pub const RESTART_BUTTON_WIDTH: f32 = 200.0;
pub const RESTART_BUTTON_HEIGHT: f32 = 50.0;

/// The restart affordance shown while eliminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestartAffordance {
    mode: RestartMode,
}

impl RestartAffordance {
    pub fn new(mode: RestartMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RestartMode {
        self.mode
    }

    /// Button rectangle, centred horizontally below the score line.
    pub fn button(&self, viewport: Viewport) -> Rect {
        let center = viewport.center() + Vec2::new(0.0, 120.0);
        Rect::centered(center, RESTART_BUTTON_WIDTH, RESTART_BUTTON_HEIGHT)
    }

    /// Whether a click at `point` activates the restart.
    pub fn hit(&self, viewport: Viewport, point: Vec2) -> bool {
        match self.mode {
            RestartMode::AnyClick => true,
            RestartMode::Button => self.button(viewport).contains(point),
        }
    }
}
