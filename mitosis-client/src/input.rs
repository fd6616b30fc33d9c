//! Input-to-intent translation.
//!
//! Two control schemes, fixed for the life of a session:
//!
//! - **Pointer**: every pointer move steps the player [`MOVE_SPEED`] units
//!   towards the pointer, measured from the viewport centre. Event driven.
//! - **Keyboard**: four held-direction flags, sampled once per frame.
//!   Diagonals are scaled by `1/sqrt(2)` so they move as fast as a single
//!   axis.
//!
//! The controller only computes deltas. Applying them to the local player
//! and emitting intents is the session's job.

use std::f32::consts::FRAC_1_SQRT_2;
use std::str::FromStr;

use glam::Vec2;

use crate::error::ClientError;
use crate::geometry::Viewport;

/// World units per pointer event (pointer mode) or per frame (keyboard mode).
pub const MOVE_SPEED: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    #[default]
    Pointer,
    Keyboard,
}

impl FromStr for ControlMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pointer" | "mouse" => Ok(Self::Pointer),
            "keyboard" | "keys" => Ok(Self::Keyboard),
            _ => Err(ClientError::invalid_config(
                "MITOSIS_CONTROLS",
                s,
                "expected `pointer` or `keyboard`",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// Held-direction flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl KeyState {
    /// Set one flag. Returns whether it changed; repeating the same
    /// transition is a no-op.
    pub fn set(&mut self, direction: Direction, pressed: bool) -> bool {
        let flag = match direction {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        };
        let changed = *flag != pressed;
        *flag = pressed;
        changed
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// This frame's displacement. Opposite flags cancel.
    pub fn delta(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| match (neg, pos) {
            (true, false) => -MOVE_SPEED,
            (false, true) => MOVE_SPEED,
            _ => 0.0,
        };
        let delta = Vec2::new(axis(self.left, self.right), axis(self.up, self.down));
        if delta.x != 0.0 && delta.y != 0.0 {
            delta * FRAC_1_SQRT_2
        } else {
            delta
        }
    }
}

/// Step towards `pointer` from the viewport centre, or `None` when the
/// pointer sits exactly on the centre.
pub fn pointer_step(pointer: Vec2, viewport: Viewport) -> Option<Vec2> {
    let direction = pointer - viewport.center();
    let length = direction.length();
    if length > 0.0 {
        Some(direction / length * MOVE_SPEED)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputController {
    PointerVector,
    KeyState(KeyState),
}

impl InputController {
    pub fn new(mode: ControlMode) -> Self {
        match mode {
            ControlMode::Pointer => Self::PointerVector,
            ControlMode::Keyboard => Self::KeyState(KeyState::default()),
        }
    }

    pub fn mode(&self) -> ControlMode {
        match self {
            Self::PointerVector => ControlMode::Pointer,
            Self::KeyState(_) => ControlMode::Keyboard,
        }
    }

    /// Pointer-mode step for a pointer event. Always `None` in keyboard mode.
    pub fn pointer_moved(&self, pointer: Vec2, viewport: Viewport) -> Option<Vec2> {
        match self {
            Self::PointerVector => pointer_step(pointer, viewport),
            Self::KeyState(_) => None,
        }
    }

    /// Key edge. Ignored in pointer mode; returns whether a flag changed.
    pub fn key(&mut self, direction: Direction, pressed: bool) -> bool {
        match self {
            Self::PointerVector => false,
            Self::KeyState(keys) => keys.set(direction, pressed),
        }
    }

    /// Keyboard-mode delta for this frame; `None` when there is no movement
    /// or in pointer mode.
    pub fn frame_delta(&self) -> Option<Vec2> {
        match self {
            Self::PointerVector => None,
            Self::KeyState(keys) => {
                let delta = keys.delta();
                (delta != Vec2::ZERO).then_some(delta)
            }
        }
    }

    pub fn keys(&self) -> Option<&KeyState> {
        match self {
            Self::PointerVector => None,
            Self::KeyState(keys) => Some(keys),
        }
    }
}
