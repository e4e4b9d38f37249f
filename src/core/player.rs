use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::GameId;

/// A player's relation to one game of their BGG collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub game_id: GameId,

    #[serde(default)]
    pub owned: bool,

    /// Personal rating scaled to 0.0 - 1.0
    #[serde(default)]
    pub rating: Option<f64>,

    #[serde(default)]
    pub play_count: u32,

    #[serde(default)]
    pub want_to_play: bool,
}

impl GameStats {
    pub fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            owned: false,
            rating: None,
            play_count: 0,
            want_to_play: false,
        }
    }
}

/// A member of the game group: a BGG user or an anonymous guest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub username: String,

    #[serde(default)]
    pub is_guest: bool,

    #[serde(default)]
    pub games_stats: HashMap<GameId, GameStats>,
}

impl Player {
    /// BGG user with collection stats
    pub fn new(username: impl Into<String>, games_stats: HashMap<GameId, GameStats>) -> Self {
        Self {
            username: username.into(),
            is_guest: false,
            games_stats,
        }
    }

    /// Anonymous guest `GUEST_<index>`
    pub fn guest(index: usize) -> Self {
        Self {
            username: format!("GUEST_{}", index),
            is_guest: true,
            games_stats: HashMap::new(),
        }
    }

    pub fn stats_for(&self, game_id: GameId) -> Option<&GameStats> {
        self.games_stats.get(&game_id)
    }

    pub fn owns(&self, game_id: GameId) -> bool {
        self.stats_for(game_id).map_or(false, |s| s.owned)
    }

    /// IDs of every game flagged as owned
    pub fn owned_games(&self) -> impl Iterator<Item = GameId> + '_ {
        self.games_stats
            .values()
            .filter(|s| s.owned)
            .map(|s| s.game_id)
    }
}
