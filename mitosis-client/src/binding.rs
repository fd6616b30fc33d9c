//! Local player binding.
//!
//! Binds the session to one world entry, by server key, the first time an
//! entry with the session's `(name, color)` shows up. The binding is made at
//! most once and is never re-matched afterwards, even if another entry with
//! the same identity appears later.

use tracing::info;

use crate::world::{PlayerId, WorldState};

/// Display identity chosen at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub color: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalBinding {
    identity: Identity,
    announced: Option<PlayerId>,
    bound: Option<PlayerId>,
}

impl LocalBinding {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            announced: None,
            bound: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Key of the bound entry, once bound.
    pub fn bound(&self) -> Option<&PlayerId> {
        self.bound.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Id the server announced for this session, if any.
    pub fn announced(&self) -> Option<&PlayerId> {
        self.announced.as_ref()
    }

    /// Record a server-assigned id. Only used as a hint while unbound.
    pub fn announce(&mut self, id: PlayerId) {
        if self.bound.is_none() {
            self.announced = Some(id);
        }
    }

    /// Whether `id` refers to this session's player.
    pub fn is_local(&self, id: &PlayerId) -> bool {
        self.bound.as_ref() == Some(id) || self.announced.as_ref() == Some(id)
    }

    /// Try to bind against `world`. Returns the key only on the call that
    /// binds; every later call returns `None`.
    pub fn try_bind(&mut self, world: &WorldState) -> Option<&PlayerId> {
        if self.bound.is_some() {
            return None;
        }

        let announced = self
            .announced
            .as_ref()
            .filter(|id| world.player(id).is_some())
            .cloned();
        let found = announced.or_else(|| {
            world
                .find_by_identity(&self.identity.name, &self.identity.color)
                .cloned()
        })?;

        info!(player_id = %found, name = %self.identity.name, "local player bound");
        self.bound = Some(found);
        self.bound.as_ref()
    }
}
