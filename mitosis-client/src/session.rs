//! One game session: connection, world, binding, input and lifecycle.
//!
//! All session state lives in a [`Session`] value owned by the runtime loop.
//! Input handlers, inbound messages and frame ticks all go through it, one at
//! a time, each running to completion.
//!
//! A session ends in exactly one of two ways: the player quits, or asks for
//! a restart from the game-over screen. Restarting drops the whole session
//! (connection included) and builds a fresh one.

use std::io;

use glam::Vec2;
use mitosis_ws::Transport;
use tracing::{debug, info};

use crate::binding::{Identity, LocalBinding};
use crate::camera::Camera;
use crate::channel::{ChannelStats, NetworkChannel};
use crate::geometry::Viewport;
use crate::input::{ControlMode, Direction, InputController};
use crate::lifecycle::{Lifecycle, Phase, RestartAffordance, RestartMode};
use crate::protocol::ServerMessage;
use crate::render::{self, Frame, Surface};
use crate::world::{Player, Ranking, WorldBounds, WorldState};

/// Per-session settings, fixed at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub identity: Identity,
    pub control_mode: ControlMode,
    pub restart_mode: RestartMode,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// Tear down and start a new session.
    Restart,
    Quit,
}

pub struct Session<T: Transport> {
    channel: NetworkChannel<T>,
    input: InputController,
    world: WorldState,
    binding: LocalBinding,
    camera: Camera,
    lifecycle: Lifecycle,
    ranking: Ranking,
    bounds: WorldBounds,
    viewport: Viewport,
    restart: RestartAffordance,
}

impl<T: Transport> Session<T> {
    /// Start a session over an opened transport. Sends the hello.
    pub fn start(config: SessionConfig, transport: T, viewport: Viewport) -> Self {
        info!(
            name = %config.identity.name,
            color = %config.identity.color,
            controls = ?config.control_mode,
            "session started"
        );
        Self {
            channel: NetworkChannel::open(transport, &config.identity),
            input: InputController::new(config.control_mode),
            world: WorldState::new(),
            binding: LocalBinding::new(config.identity),
            camera: Camera::new(),
            lifecycle: Lifecycle::new(),
            ranking: Ranking::default(),
            bounds: WorldBounds::default(),
            viewport,
            restart: RestartAffordance::new(config.restart_mode),
        }
    }

    /// Drain and apply everything the server has sent. Returns the number of
    /// messages applied.
    pub fn poll_network(&mut self) -> usize {
        let mut inbound = Vec::new();
        let delivered = self.channel.poll(|message| inbound.push(message));
        for message in inbound {
            self.handle_message(message);
        }
        delivered
    }

    /// Apply one inbound message.
    pub fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Elimination(elimination) => self.eliminate(elimination.final_score),
            ServerMessage::Death(death) => {
                if self.binding.is_local(&death.player_id) {
                    self.eliminate(None);
                } else {
                    debug!(player_id = %death.player_id, "remote death ignored");
                }
            }
            ServerMessage::Init(init) => {
                info!(player_id = %init.player_id, "server assigned player id");
                self.binding.announce(init.player_id);
                if let (Some(width), Some(height)) = (init.map_width, init.map_height) {
                    if let Some(bounds) = WorldBounds::announced(width, height) {
                        self.bounds = bounds;
                    }
                }
            }
            ServerMessage::Snapshot(snapshot) => {
                if self.lifecycle.is_eliminated() {
                    return;
                }
                self.world.replace(snapshot);
                self.binding.try_bind(&self.world);
                self.ranking.refresh(&self.world);
            }
        }
    }

    /// Pointer moved to `pointer` (surface units). Returns whether the local
    /// player moved.
    pub fn pointer_moved(&mut self, pointer: Vec2) -> bool {
        if self.lifecycle.is_eliminated() {
            return false;
        }
        match self.input.pointer_moved(pointer, self.viewport) {
            Some(step) => self.advance_local(step),
            None => false,
        }
    }

    /// Direction key pressed or released. Returns whether a flag changed.
    pub fn key_changed(&mut self, direction: Direction, pressed: bool) -> bool {
        if self.lifecycle.is_eliminated() {
            return false;
        }
        self.input.key(direction, pressed)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Click at `point`. Returns [`SessionExit::Restart`] when it hits the
    /// restart affordance on the game-over screen.
    pub fn click(&mut self, point: Vec2) -> Option<SessionExit> {
        if !self.lifecycle.is_eliminated() || !self.restart.hit(self.viewport, point) {
            return None;
        }
        info!("restart requested");
        Some(SessionExit::Restart)
    }

    /// One frame: keyboard movement, camera, draw, present.
    pub fn tick<S: Surface + ?Sized>(&mut self, surface: &mut S) -> io::Result<()> {
        self.viewport = surface.viewport();

        if !self.lifecycle.is_eliminated() {
            if let Some(delta) = self.input.frame_delta() {
                self.advance_local(delta);
            }
        }

        let local = self
            .binding
            .bound()
            .and_then(|id| self.world.player(id));
        self.camera.update(local, self.viewport);

        render::render(&self.frame(), surface);
        surface.present()
    }

    /// Snapshot of everything the renderer needs.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            world: &self.world,
            camera: &self.camera,
            phase: self.lifecycle.phase(),
            local: self.local_player(),
            ranking: &self.ranking,
            bounds: self.bounds,
            restart: self.restart,
        }
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.binding.bound().and_then(|id| self.world.player(id))
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn binding(&self) -> &LocalBinding {
        &self.binding
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn is_eliminated(&self) -> bool {
        self.lifecycle.is_eliminated()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn stats(&self) -> ChannelStats {
        self.channel.stats()
    }

    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    pub fn close(&mut self) {
        self.channel.close();
    }

    /// Move the bound player by `delta` and emit one intent carrying the new
    /// absolute position. No-op while unbound.
    fn advance_local(&mut self, delta: Vec2) -> bool {
        let Some(id) = self.binding.bound() else {
            return false;
        };
        let Some(player) = self.world.player_mut(id) else {
            return false;
        };

        let position = player.position() + delta;
        player.set_position(position);
        self.channel.send_intent(position);
        true
    }

    fn eliminate(&mut self, final_score: Option<i64>) {
        let final_score = final_score
            .or_else(|| self.local_player().map(|player| player.score))
            .unwrap_or(0);
        self.lifecycle.eliminate(final_score);
    }
}
