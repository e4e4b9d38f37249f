pub mod sqlite;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

use crate::core::{Game, GameId, Player};
use crate::error::Result;

pub use sqlite::SqliteCache;

/// Key of a cached record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Collection of a BGG user
    Player(String),
    /// Metadata of a game
    Game(GameId),
}

impl CacheKey {
    /// Usernames are matched case-insensitively
    pub fn player(username: &str) -> Self {
        CacheKey::Player(normalize_username(username))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Player(username) => write!(f, "player:{}", username),
            CacheKey::Game(id) => write!(f, "game:{}", id),
        }
    }
}

/// Normalize username for consistent cache lookups
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Trait for local stores of BGG records
#[async_trait]
pub trait SuggestCache: Send + Sync {
    /// Get cached player collection by username
    async fn get_player(&self, username: &str) -> Result<Option<CachedPlayer>>;

    /// Save (or replace) a player collection
    async fn save_player(&self, player: &Player) -> Result<()>;

    /// Get every cached game among `ids`
    async fn get_games(&self, ids: &[GameId]) -> Result<HashMap<GameId, Game>>;

    /// Save (or replace) game records
    async fn save_games(&self, games: &[Game]) -> Result<()>;

    /// Increment cache hit counter
    async fn increment_hit(&self, key: &CacheKey) -> Result<()>;

    /// Get cache statistics
    async fn stats(&self) -> Result<CacheStats>;

    /// Clear expired entries (older than `max_age_days`)
    async fn cleanup(&self, max_age_days: i64) -> Result<u64>;

    /// Remove every entry
    async fn clear(&self) -> Result<u64>;
}

/// Cached player with metadata
#[derive(Debug, Clone)]
pub struct CachedPlayer {
    pub player: Player,
    pub hit_count: i32,
    pub cached_at: chrono::DateTime<chrono::Utc>,
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub players: u64,
    pub games: u64,
    pub total_hits: u64,
    pub oldest_entry: Option<chrono::DateTime<chrono::Utc>>,
    pub newest_entry: Option<chrono::DateTime<chrono::Utc>>,
}

impl CacheStats {
    pub fn total_entries(&self) -> u64 {
        self.players + self.games
    }

    pub fn avg_hit_count(&self) -> f64 {
        match self.total_entries() {
            0 => 0.0,
            n => self.total_hits as f64 / n as f64,
        }
    }
}
