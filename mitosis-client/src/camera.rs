//! Camera tracking the local player.

use glam::Vec2;

use crate::geometry::Viewport;
use crate::world::Player;

/// World-to-screen offset. Starts at the origin and only moves once a local
/// player exists, so the pre-binding world is drawn anchored at (0, 0).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    offset: Vec2,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Centre the viewport on `local`; keeps the previous offset when there
    /// is no local player.
    pub fn update(&mut self, local: Option<&Player>, viewport: Viewport) -> Vec2 {
        if let Some(player) = local {
            self.offset = player.position() - viewport.center();
        }
        self.offset
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.offset
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen + self.offset
    }
}
