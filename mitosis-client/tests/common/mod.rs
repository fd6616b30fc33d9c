//! Shared helpers for the client integration tests.

#![allow(dead_code)]

use std::io;

use glam::Vec2;
use mitosis_client::render::{Rgb, Rgba, Surface, TextStyle};
use mitosis_client::{
    ControlMode, Identity, Rect, RestartMode, Session, SessionConfig, Viewport,
};
use mitosis_test_support::ScriptedTransport;

pub const NAME: &str = "cell";
pub const COLOR: &str = "#ff0000";

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Clear(Rgb),
    Line(Vec2, Vec2, Rgb),
    Circle(Vec2, f32, Rgb),
    FillRect(Rect, Rgba),
    StrokeRect(Rect, Rgb),
    Text(Vec2, String, TextStyle),
}

/// Surface that records draw calls instead of drawing.
#[derive(Debug)]
pub struct RecordingSurface {
    viewport: Viewport,
    pub ops: Vec<Op>,
    pub presented: usize,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            ops: Vec::new(),
            presented: 0,
        }
    }

    pub fn reset(&mut self) {
        self.ops.clear();
    }

    pub fn lines(&self) -> Vec<(Vec2, Vec2)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Line(from, to, _) => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn circles(&self) -> Vec<(Vec2, f32, Rgb)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Circle(at, radius, color) => Some((*at, *radius, *color)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<(Vec2, String)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(at, text, _) => Some((*at, text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|(_, text)| text == needle)
    }
}

impl Surface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clear(&mut self, color: Rgb) {
        self.ops.push(Op::Clear(color));
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Rgb) {
        self.ops.push(Op::Line(from, to, color));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb) {
        self.ops.push(Op::Circle(center, radius, color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.ops.push(Op::FillRect(rect, color));
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb) {
        self.ops.push(Op::StrokeRect(rect, color));
    }

    fn text(&mut self, anchor: Vec2, text: &str, style: TextStyle) {
        self.ops.push(Op::Text(anchor, text.to_string(), style));
    }

    fn present(&mut self) -> io::Result<()> {
        self.presented += 1;
        Ok(())
    }
}

pub fn session_config(control_mode: ControlMode, restart_mode: RestartMode) -> SessionConfig {
    SessionConfig {
        identity: Identity::new(NAME, COLOR),
        control_mode,
        restart_mode,
    }
}

/// Session over a scripted transport with an 800x600 viewport, plus a peer
/// sharing the transport's state.
pub fn start_session(
    control_mode: ControlMode,
    restart_mode: RestartMode,
) -> (Session<ScriptedTransport>, ScriptedTransport) {
    start_session_on(ScriptedTransport::new(), control_mode, restart_mode)
}

pub fn start_session_on(
    transport: ScriptedTransport,
    control_mode: ControlMode,
    restart_mode: RestartMode,
) -> (Session<ScriptedTransport>, ScriptedTransport) {
    let peer = transport.clone();
    let session = Session::start(
        session_config(control_mode, restart_mode),
        transport,
        Viewport::new(800.0, 600.0),
    );
    (session, peer)
}

/// Frames sent after the hello, parsed as JSON.
pub fn intents(peer: &ScriptedTransport) -> Vec<serde_json::Value> {
    peer.sent_json()
        .into_iter()
        .filter(|frame| frame.get("x").is_some())
        .collect()
}
