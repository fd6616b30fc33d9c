//! Rendering.
//!
//! [`render`] is a pure function of a [`Frame`] (world, camera, lifecycle
//! phase and HUD data) onto a [`Surface`]. It never touches game state.
//! Two draw modes, picked by phase:
//!
//! - **Playing**: background, bounded grid, food, players with labels, HUD.
//! - **Eliminated**: translucent overlay, "Game Over", final score, restart
//!   affordance.

mod color;
mod terminal;

pub use color::{Rgb, Rgba};
pub use terminal::{cell_center, Cell, CellSize, TerminalSurface};

use std::io;

use glam::Vec2;

use crate::camera::Camera;
use crate::geometry::{Rect, Viewport};
use crate::lifecycle::{Phase, RestartAffordance, RestartMode};
use crate::world::{Player, Ranking, WorldBounds, WorldState};

/// World units between grid lines.
pub const GRID_SPACING: f32 = 50.0;

/// Gap between a player's circle and its label.
const LABEL_GAP: f32 = 5.0;

const OVERLAY: Rgba = Rgba::new(Rgb::BLACK, 0.8);
const HUD_MARGIN: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Body,
    Heading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub color: Rgb,
    pub size: TextSize,
    pub align: Align,
}

impl TextStyle {
    pub const fn new(color: Rgb, size: TextSize, align: Align) -> Self {
        Self { color, size, align }
    }
}

/// 2D drawing surface in surface units.
pub trait Surface {
    fn viewport(&self) -> Viewport;

    fn clear(&mut self, color: Rgb);

    fn line(&mut self, from: Vec2, to: Vec2, color: Rgb);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb);

    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    fn stroke_rect(&mut self, rect: Rect, color: Rgb);

    /// Draw `text` with its baseline anchored at `anchor`.
    fn text(&mut self, anchor: Vec2, text: &str, style: TextStyle);

    /// Push the finished frame to the output device.
    fn present(&mut self) -> io::Result<()>;
}

/// Everything one frame draws from.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub world: &'a WorldState,
    pub camera: &'a Camera,
    pub phase: Phase,
    pub local: Option<&'a Player>,
    pub ranking: &'a Ranking,
    pub bounds: WorldBounds,
    pub restart: RestartAffordance,
}

/// Draw one frame. Does not present it.
pub fn render<S: Surface + ?Sized>(frame: &Frame<'_>, surface: &mut S) {
    match frame.phase {
        Phase::Playing => draw_playing(frame, surface),
        Phase::Eliminated { final_score } => {
            draw_game_over(final_score, frame.restart, surface)
        }
    }
}

fn draw_playing<S: Surface + ?Sized>(frame: &Frame<'_>, surface: &mut S) {
    surface.clear(Rgb::BACKGROUND);
    draw_grid(frame.camera, frame.bounds, surface);

    for food in frame.world.food() {
        let at = frame.camera.world_to_screen(food.position());
        surface.fill_circle(at, food.mass, Rgb::parse_or_white(&food.color));
    }

    let label = TextStyle::new(Rgb::WHITE, TextSize::Body, Align::Center);
    for (_, player) in frame.world.players() {
        let at = frame.camera.world_to_screen(player.position());
        let radius = player.radius();
        surface.fill_circle(at, radius, Rgb::parse_or_white(&player.color));
        surface.text(
            at - Vec2::new(0.0, radius + LABEL_GAP),
            &format!("{} ({})", player.name, player.score),
            label,
        );
    }

    draw_hud(frame, surface);
}

/// Grid lines every [`GRID_SPACING`] units across the bounded world only.
fn draw_grid<S: Surface + ?Sized>(camera: &Camera, bounds: WorldBounds, surface: &mut S) {
    let mut x = 0.0;
    while x < bounds.width {
        surface.line(
            camera.world_to_screen(Vec2::new(x, 0.0)),
            camera.world_to_screen(Vec2::new(x, bounds.height)),
            Rgb::GRID,
        );
        x += GRID_SPACING;
    }

    let mut y = 0.0;
    while y < bounds.height {
        surface.line(
            camera.world_to_screen(Vec2::new(0.0, y)),
            camera.world_to_screen(Vec2::new(bounds.width, y)),
            Rgb::GRID,
        );
        y += GRID_SPACING;
    }
}

/// Ranking panel (top right) and local stats (top left).
fn draw_hud<S: Surface + ?Sized>(frame: &Frame<'_>, surface: &mut S) {
    let viewport = surface.viewport();
    let line_height = 20.0;

    if !frame.ranking.is_empty() {
        let right = viewport.width - HUD_MARGIN;
        let mut y = HUD_MARGIN + line_height;
        surface.text(
            Vec2::new(right, y),
            "Ranking",
            TextStyle::new(Rgb::new(0xff, 0xea, 0xa7), TextSize::Body, Align::Right),
        );
        let row = TextStyle::new(Rgb::WHITE, TextSize::Small, Align::Right);
        for (i, entry) in frame.ranking.entries().iter().enumerate() {
            y += line_height;
            surface.text(
                Vec2::new(right, y),
                &format!("{}. {}  {}", i + 1, entry.name, entry.score),
                row,
            );
        }
    }

    if let Some(local) = frame.local {
        surface.text(
            Vec2::new(HUD_MARGIN, HUD_MARGIN + line_height),
            &format!("Mass: {:.0} | Score: {}", local.display_mass(), local.score),
            TextStyle::new(Rgb::new(0x4e, 0xcd, 0xc4), TextSize::Body, Align::Left),
        );
    }
}

fn draw_game_over<S: Surface + ?Sized>(
    final_score: i64,
    restart: RestartAffordance,
    surface: &mut S,
) {
    let viewport = surface.viewport();
    let center = viewport.center();

    surface.fill_rect(viewport.bounds(), OVERLAY);
    surface.text(
        center - Vec2::new(0.0, 50.0),
        "Game Over!",
        TextStyle::new(Rgb::WHITE, TextSize::Heading, Align::Center),
    );

    let body = TextStyle::new(Rgb::WHITE, TextSize::Body, Align::Center);
    surface.text(
        center + Vec2::new(0.0, 50.0),
        &format!("Final score: {final_score}"),
        body,
    );

    match restart.mode() {
        RestartMode::AnyClick => {
            surface.text(center + Vec2::new(0.0, 100.0), "Click to play again", body);
        }
        RestartMode::Button => {
            let button = restart.button(viewport);
            surface.fill_rect(button, Rgba::new(Rgb::new(0x4e, 0xcd, 0xc4), 1.0));
            surface.stroke_rect(button, Rgb::WHITE);
            surface.text(
                button.center(),
                "Play again",
                TextStyle::new(Rgb::BLACK, TextSize::Body, Align::Center),
            );
        }
    }
}
