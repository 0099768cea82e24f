//! Online player directory.
//!
//! Written by connection handling as players join and leave, read from the tick
//! thread when deciding who to notify. `DashMap` lets both sides proceed without
//! a global lock.

use dashmap::DashMap;
use territory_core::{PlayerDirectory, PlayerId};
use tracing::debug;

#[derive(Debug, Default)]
pub struct OnlinePlayers {
    players: DashMap<PlayerId, String>,
}

impl OnlinePlayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, player: PlayerId, display_name: impl Into<String>) {
        let name = display_name.into();
        debug!("🟢 {} ({}) is online", name, player);
        self.players.insert(player, name);
    }

    pub fn disconnect(&self, player: PlayerId) -> Option<String> {
        let removed = self.players.remove(&player).map(|(_, name)| name);
        if let Some(name) = &removed {
            debug!("⚫ {} ({}) went offline", name, player);
        }
        removed
    }

    pub fn online_count(&self) -> usize {
        self.players.len()
    }
}

impl PlayerDirectory for OnlinePlayers {
    fn is_online(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    fn display_name(&self, player: PlayerId) -> Option<String> {
        self.players.get(&player).map(|entry| entry.value().clone())
    }
}
