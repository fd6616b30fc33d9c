//! Builders for server frames.

use serde_json::{json, Value};

/// Builds a snapshot frame `{"players": {...}, "food": [...]}`.
///
/// Players keep insertion order on the wire.
#[derive(Debug, Default, Clone)]
pub struct SnapshotBuilder {
    players: Vec<(String, Value)>,
    food: Vec<Value>,
    omit_food: bool,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player with zero score.
    pub fn player(self, id: &str, name: &str, color: &str, x: f32, y: f32, mass: f32) -> Self {
        self.scored_player(id, name, color, x, y, mass, 0)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn scored_player(
        mut self,
        id: &str,
        name: &str,
        color: &str,
        x: f32,
        y: f32,
        mass: f32,
        score: i64,
    ) -> Self {
        self.players.push((
            id.to_string(),
            json!({
                "id": id,
                "name": name,
                "color": color,
                "x": x,
                "y": y,
                "mass": mass,
                "score": score,
            }),
        ));
        self
    }

    /// Add a player the way size-tracking servers send it: a `radius`
    /// instead of `mass`, plus server-side bookkeeping fields.
    pub fn sized_player(
        mut self,
        id: &str,
        name: &str,
        color: &str,
        x: f32,
        y: f32,
        radius: f32,
    ) -> Self {
        self.players.push((
            id.to_string(),
            json!({
                "id": id,
                "name": name,
                "x": x,
                "y": y,
                "radius": radius,
                "score": 0,
                "color": color,
                "respawn_time": 0,
            }),
        ));
        self
    }

    pub fn food(mut self, x: f32, y: f32, mass: f32, color: &str) -> Self {
        self.food.push(json!({ "x": x, "y": y, "mass": mass, "color": color }));
        self
    }

    /// Leave the `food` key out entirely.
    pub fn without_food(mut self) -> Self {
        self.omit_food = true;
        self
    }

    /// Encoded frame with players in insertion order.
    ///
    /// Written by hand so key order survives without serde_json's
    /// `preserve_order` feature.
    pub fn build(&self) -> Vec<u8> {
        let mut out = String::from("{\"players\":");
        out.push('{');
        for (i, (id, player)) in self.players.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&Value::String(id.clone()).to_string());
            out.push(':');
            out.push_str(&player.to_string());
        }
        out.push('}');
        if !self.omit_food {
            out.push_str(",\"food\":");
            out.push_str(&Value::Array(self.food.clone()).to_string());
        }
        out.push('}');
        out.into_bytes()
    }
}

/// Elimination frame, optionally carrying the final score.
pub fn elimination(final_score: Option<i64>) -> Vec<u8> {
    let value = match final_score {
        Some(score) => json!({ "eliminated": true, "finalScore": score }),
        None => json!({ "eliminated": true }),
    };
    value.to_string().into_bytes()
}

/// Server `init` frame announcing the assigned id and map size.
pub fn init(player_id: &str, map_width: f32, map_height: f32) -> Vec<u8> {
    json!({
        "type": "init",
        "player_id": player_id,
        "map_width": map_width,
        "map_height": map_height,
    })
    .to_string()
    .into_bytes()
}

/// Server `death` frame.
pub fn death(player_id: &str) -> Vec<u8> {
    json!({ "type": "death", "player_id": player_id })
        .to_string()
        .into_bytes()
}
