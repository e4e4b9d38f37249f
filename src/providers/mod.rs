pub mod bgg;
pub mod xml;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::core::{Game, GameId, GameStats};
use crate::error::Result;

pub use bgg::{BggConfig, BggProvider};

/// Trait for board game data sources (BoardGameGeek, mirrors, test doubles)
#[async_trait]
pub trait BoardGameProvider: Send + Sync {
    /// Fetch the collection of a user, keyed by game id
    async fn fetch_collection(&self, username: &str) -> Result<HashMap<GameId, GameStats>>;

    /// Fetch metadata for a set of games. Unknown ids are simply absent from the result.
    async fn fetch_games(&self, ids: &[GameId]) -> Result<HashMap<GameId, Game>>;

    /// Get provider name
    fn name(&self) -> &str;

    /// Check if provider is available
    async fn is_available(&self) -> bool;
}
