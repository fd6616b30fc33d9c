//! Wire protocol.
//!
//! JSON text frames. Outbound: a one-time `{name, color}` hello, then
//! `{x, y}` movement intents carrying absolute positions. Inbound frames are
//! resolved once, here, into a [`ServerMessage`]; nothing past this module
//! inspects raw fields.
//!
//! Discriminant, in order:
//! - `"eliminated": true` -> [`ServerMessage::Elimination`]
//! - `"type": "init"` / `"type": "death"` -> [`ServerMessage::Init`] / [`ServerMessage::Death`]
//! - a `players` field -> [`ServerMessage::Snapshot`]

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::world::{Food, Player, PlayerId};

/// Client -> server frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClientMessage {
    /// Sent once, on open.
    Hello { name: String, color: String },
    /// Absolute predicted position.
    Move { x: f32, y: f32 },
}

impl ClientMessage {
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Server -> client frames.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Snapshot(Snapshot),
    Elimination(Elimination),
    Init(Init),
    Death(Death),
}

/// Full authoritative world at one server tick.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    /// Wire order preserved.
    #[serde(deserialize_with = "ordered_players")]
    pub players: Vec<(PlayerId, Player)>,
    #[serde(default)]
    pub food: Vec<Food>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Elimination {
    /// Fractional scores are rounded; anything non-numeric reads as absent.
    #[serde(rename = "finalScore", default, deserialize_with = "lenient_score")]
    pub final_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Init {
    pub player_id: PlayerId,
    #[serde(default)]
    pub map_width: Option<f32>,
    #[serde(default)]
    pub map_height: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Death {
    pub player_id: PlayerId,
}

/// Only the fields that pick the variant; everything else is ignored.
#[derive(Deserialize)]
struct Discriminant {
    #[serde(default)]
    eliminated: Option<serde_json::Value>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    players: Option<de::IgnoredAny>,
}

impl ServerMessage {
    /// Decode one inbound frame.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let tag: Discriminant = serde_json::from_slice(frame)?;

        if matches!(tag.eliminated, Some(serde_json::Value::Bool(true))) {
            return Ok(Self::Elimination(serde_json::from_slice(frame)?));
        }

        match tag.kind.as_deref() {
            Some("init") => return Ok(Self::Init(serde_json::from_slice(frame)?)),
            Some("death") => return Ok(Self::Death(serde_json::from_slice(frame)?)),
            _ => {}
        }

        if tag.players.is_some() {
            return Ok(Self::Snapshot(serde_json::from_slice(frame)?));
        }

        Err(ProtocolError::UnknownMessage)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot(_) => "snapshot",
            Self::Elimination(_) => "elimination",
            Self::Init(_) => "init",
            Self::Death(_) => "death",
        }
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|score| score.is_finite())
                .map(|score| score.round() as i64)
        }),
        _ => None,
    })
}

/// Deserialize a JSON object of players into a vector in wire order.
///
/// A repeated key keeps its first position and takes the last value, the
/// same value a map would keep.
fn ordered_players<'de, D>(deserializer: D) -> Result<Vec<(PlayerId, Player)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedPlayers;

    impl<'de> Visitor<'de> for OrderedPlayers {
        type Value = Vec<(PlayerId, Player)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping player ids to players")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut players: Vec<(PlayerId, Player)> =
                Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, player)) = map.next_entry::<PlayerId, Player>()? {
                match players.iter_mut().find(|(key, _)| *key == id) {
                    Some(slot) => slot.1 = player,
                    None => players.push((id, player)),
                }
            }
            Ok(players)
        }
    }

    deserializer.deserialize_map(OrderedPlayers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> Result<ServerMessage, ProtocolError> {
        ServerMessage::decode(text.as_bytes())
    }

    #[test]
    fn test_snapshot_keeps_wire_order() {
        let msg = decode(
            r##"{"players":{
                "9":{"name":"b","color":"#fff","x":1,"y":2,"mass":20,"score":3},
                "1":{"name":"a","color":"#000","x":3.5,"y":4.5,"mass":25.5,"score":0}
            },"food":[{"x":10,"y":20,"mass":5,"color":"rgb(1,2,3)"}]}"##,
        )
        .unwrap();

        let ServerMessage::Snapshot(snapshot) = msg else {
            panic!("expected snapshot");
        };
        let ids: Vec<&str> = snapshot.players.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["9", "1"]);
        assert_eq!(snapshot.players[1].1.mass, 25.5);
        assert_eq!(snapshot.food.len(), 1);
        assert_eq!(snapshot.food[0].color, "rgb(1,2,3)");
    }

    #[test]
    fn test_snapshot_with_radius_players() {
        let msg = decode(
            r#"{"players":{"5f0c":{"id":"5f0c","name":"a","x":30,"y":40,"radius":15,
                "score":2,"color":"rgb(60,70,80)","respawn_time":0}},
                "ranking":[{"id":"5f0c","name":"a","score":2,"radius":15}]}"#,
        )
        .unwrap();
        let ServerMessage::Snapshot(snapshot) = msg else {
            panic!("expected snapshot");
        };
        let player = &snapshot.players[0].1;
        assert_eq!(player.size, Some(15.0));
        assert_eq!(player.mass, 0.0);
        assert_eq!(player.radius(), 15.0);
        assert_eq!(player.score, 2);
    }

    #[test]
    fn test_snapshot_without_food_field() {
        let msg = decode(r#"{"players":{},"ranking":[]}"#).unwrap();
        assert_eq!(msg, ServerMessage::Snapshot(Snapshot::default()));
    }

    #[test]
    fn test_duplicate_player_key_keeps_last_value() {
        let msg = decode(
            r##"{"players":{
                "1":{"name":"old","color":"#fff","x":0,"y":0,"mass":20},
                "2":{"name":"other","color":"#fff","x":0,"y":0,"mass":20},
                "1":{"name":"new","color":"#fff","x":0,"y":0,"mass":20}
            }}"##,
        )
        .unwrap();
        let ServerMessage::Snapshot(snapshot) = msg else {
            panic!("expected snapshot");
        };
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].1.name, "new");
    }

    #[test]
    fn test_elimination_with_and_without_score() {
        assert_eq!(
            decode(r#"{"eliminated":true,"finalScore":120}"#).unwrap(),
            ServerMessage::Elimination(Elimination {
                final_score: Some(120)
            })
        );
        assert_eq!(
            decode(r#"{"eliminated":true}"#).unwrap(),
            ServerMessage::Elimination(Elimination { final_score: None })
        );
    }

    #[test]
    fn test_elimination_score_tolerates_other_shapes() {
        let score = |text: &str| match decode(text).unwrap() {
            ServerMessage::Elimination(elimination) => elimination.final_score,
            other => panic!("expected elimination, got {}", other.kind()),
        };
        assert_eq!(score(r#"{"eliminated":true,"finalScore":123.5}"#), Some(124));
        assert_eq!(score(r#"{"eliminated":true,"finalScore":-2.4}"#), Some(-2));
        assert_eq!(score(r#"{"eliminated":true,"finalScore":1e300}"#), Some(i64::MAX));
        assert_eq!(score(r#"{"eliminated":true,"finalScore":"120"}"#), None);
        assert_eq!(score(r#"{"eliminated":true,"finalScore":null}"#), None);
        assert_eq!(score(r#"{"eliminated":true,"finalScore":[1]}"#), None);
    }

    #[test]
    fn test_eliminated_false_is_not_elimination() {
        let msg = decode(r#"{"eliminated":false,"players":{}}"#).unwrap();
        assert_eq!(msg.kind(), "snapshot");
    }

    #[test]
    fn test_elimination_wins_over_players() {
        let msg = decode(r#"{"eliminated":true,"finalScore":1,"players":{}}"#).unwrap();
        assert_eq!(msg.kind(), "elimination");
    }

    #[test]
    fn test_init_and_death() {
        let msg = decode(r#"{"type":"init","player_id":"abc","map_width":1000,"map_height":800}"#)
            .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Init(Init {
                player_id: PlayerId::from("abc"),
                map_width: Some(1000.0),
                map_height: Some(800.0),
            })
        );

        let msg = decode(r#"{"type":"death","player_id":"abc"}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Death(Death {
                player_id: PlayerId::from("abc")
            })
        );
    }

    #[test]
    fn test_unknown_and_malformed_frames() {
        assert!(matches!(
            decode(r#"{"hello":"world"}"#),
            Err(ProtocolError::UnknownMessage)
        ));
        assert!(matches!(decode("not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(
            decode(r#"{"players":{"1":{"name":"x"}}}"#),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_client_messages_encode_as_plain_objects() {
        let hello = ClientMessage::Hello {
            name: "cell".into(),
            color: "#ff0000".into(),
        };
        let value: serde_json::Value = serde_json::from_slice(&hello.encode().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"name": "cell", "color": "#ff0000"}));

        let step = ClientMessage::Move { x: 12.5, y: -3.0 };
        let value: serde_json::Value = serde_json::from_slice(&step.encode().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"x": 12.5, "y": -3.0}));
    }
}
