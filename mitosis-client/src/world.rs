//! Local mirror of the authoritative world.
//!
//! The server pushes complete snapshots; [`WorldState::replace`] swaps the
//! whole mirror for each one. Nothing is merged, so nothing from an older
//! snapshot can survive into a newer one. The only local write is
//! prediction on the bound player's position, which the next snapshot
//! overwrites.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::protocol::Snapshot;

/// Players shown in the ranking panel.
pub const RANKING_SIZE: usize = 10;

/// Default world extent when the server does not announce one.
pub const DEFAULT_WORLD_SIZE: f32 = 2000.0;

/// Server-assigned player key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub color: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub mass: f32,
    /// Servers that track size directly send the radius instead of mass.
    #[serde(rename = "radius", default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default)]
    pub score: i64,
}

impl Player {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Drawn radius: the announced one, else the square root of mass
    /// times four.
    pub fn radius(&self) -> f32 {
        match self.size {
            Some(radius) => radius.max(0.0),
            None => self.mass.max(0.0).sqrt() * 4.0,
        }
    }

    /// Mass shown in the HUD; derived from the radius when only that is
    /// known.
    pub fn display_mass(&self) -> f32 {
        match self.size {
            Some(radius) if self.mass <= 0.0 => (radius.max(0.0) / 4.0).powi(2),
            _ => self.mass,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub x: f32,
    pub y: f32,
    /// Also the drawn radius.
    pub mass: f32,
    pub color: String,
}

impl Food {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Bounded world region covered by the background grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: DEFAULT_WORLD_SIZE,
            height: DEFAULT_WORLD_SIZE,
        }
    }
}

impl WorldBounds {
    /// Announced bounds, ignoring non-positive or non-finite sizes.
    pub fn announced(width: f32, height: f32) -> Option<Self> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        (valid(width) && valid(height)).then_some(Self { width, height })
    }
}

/// Players (in snapshot order) and food.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldState {
    players: Vec<(PlayerId, Player)>,
    food: Vec<Food>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace players and food with the snapshot's contents.
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.players = snapshot.players;
        self.food = snapshot.food;
    }

    pub fn players(&self) -> impl Iterator<Item = (&PlayerId, &Player)> {
        self.players.iter().map(|(id, player)| (id, player))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, player)| player)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|(key, _)| key == id)
            .map(|(_, player)| player)
    }

    /// First player, in snapshot order, with this name and color.
    pub fn find_by_identity(&self, name: &str, color: &str) -> Option<&PlayerId> {
        self.players
            .iter()
            .find(|(_, p)| p.name == name && p.color == color)
            .map(|(id, _)| id)
    }

    pub fn food(&self) -> &[Food] {
        &self.food
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.food.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub name: String,
    pub score: i64,
}

/// Top players by score.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    entries: Vec<RankEntry>,
}

impl Ranking {
    /// Rebuild from the world: score descending, ties in snapshot order,
    /// at most [`RANKING_SIZE`] entries.
    pub fn refresh(&mut self, world: &WorldState) {
        let mut entries: Vec<RankEntry> = world
            .players()
            .map(|(_, p)| RankEntry {
                name: p.name.clone(),
                score: p.score,
            })
            .collect();
        // Stable sort keeps snapshot order among equal scores.
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(RANKING_SIZE);
        self.entries = entries;
    }

    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, color: &str, score: i64) -> Player {
        Player {
            name: name.into(),
            color: color.into(),
            x: 0.0,
            y: 0.0,
            mass: 20.0,
            size: None,
            score,
        }
    }

    fn world_with(players: Vec<(&str, Player)>) -> WorldState {
        let mut world = WorldState::new();
        world.replace(Snapshot {
            players: players
                .into_iter()
                .map(|(id, p)| (PlayerId::from(id), p))
                .collect(),
            food: vec![],
        });
        world
    }

    #[test]
    fn test_ranking_orders_by_score_descending() {
        let world = world_with(vec![
            ("1", player("ten", "#fff", 10)),
            ("2", player("fifty", "#fff", 50)),
            ("3", player("thirty", "#fff", 30)),
        ]);
        let mut ranking = Ranking::default();
        ranking.refresh(&world);

        let scores: Vec<i64> = ranking.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![50, 30, 10]);
    }

    #[test]
    fn test_ranking_truncates_to_ten() {
        let players = (0..15)
            .map(|i| (format!("p{i}"), player(&format!("p{i}"), "#fff", i)))
            .collect::<Vec<_>>();
        let world = world_with(players.iter().map(|(id, p)| (id.as_str(), p.clone())).collect());

        let mut ranking = Ranking::default();
        ranking.refresh(&world);

        assert_eq!(ranking.entries().len(), RANKING_SIZE);
        assert_eq!(ranking.entries()[0].score, 14);
        assert_eq!(ranking.entries()[9].score, 5);
    }

    #[test]
    fn test_ranking_ties_keep_snapshot_order() {
        let world = world_with(vec![
            ("z", player("first", "#fff", 7)),
            ("a", player("second", "#fff", 7)),
            ("m", player("third", "#fff", 9)),
        ]);
        let mut ranking = Ranking::default();
        ranking.refresh(&world);

        let names: Vec<&str> = ranking.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_find_by_identity_requires_name_and_color() {
        let world = world_with(vec![
            ("1", player("cell", "#ff0000", 0)),
            ("2", player("cell", "#00ff00", 0)),
        ]);
        assert_eq!(
            world.find_by_identity("cell", "#00ff00"),
            Some(&PlayerId::from("2"))
        );
        assert_eq!(world.find_by_identity("cell", "#0000ff"), None);
    }

    #[test]
    fn test_radius_is_sqrt_mass_times_four() {
        let mut p = player("cell", "#fff", 0);
        p.mass = 25.0;
        assert_eq!(p.radius(), 20.0);
        p.mass = -1.0;
        assert_eq!(p.radius(), 0.0);
    }

    #[test]
    fn test_announced_radius_overrides_mass() {
        let mut p = player("cell", "#fff", 0);
        p.size = Some(15.0);
        assert_eq!(p.radius(), 15.0);
        assert_eq!(p.display_mass(), 20.0);

        p.mass = 0.0;
        p.size = Some(20.0);
        assert_eq!(p.display_mass(), 25.0);
    }

    #[test]
    fn test_announced_bounds_reject_invalid() {
        assert_eq!(WorldBounds::announced(0.0, 10.0), None);
        assert_eq!(WorldBounds::announced(f32::NAN, 10.0), None);
        assert_eq!(
            WorldBounds::announced(1000.0, 800.0),
            Some(WorldBounds {
                width: 1000.0,
                height: 800.0
            })
        );
    }
}
