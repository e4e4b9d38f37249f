//! # BGG Suggest
//!
//! Board game suggestions for a group of players:
//! - BoardGameGeek XML API provider (collections and game metadata)
//! - SQLite caching layer for players and games
//! - Heuristic scoring against playing time, weight and group size
//! - Expansion grouping under the base game they require
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bgg_suggest::{EngineOptions, SuggestQuery, SuggestionEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = SuggestionEngine::new(EngineOptions::default()).await?;
//!
//!     let report = engine.suggest(SuggestQuery {
//!         usernames: vec!["alice".to_string(), "bob".to_string()],
//!         guests: 1,
//!         playing_time: Some(60),
//!         ..SuggestQuery::default()
//!     }).await?;
//!
//!     for suggestion in &report.suggestions {
//!         println!("{}", suggestion.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod core;
pub mod engine;
pub mod error;
pub mod providers;
pub mod ranking;

// Re-export primary types
pub use cache::{SqliteCache, SuggestCache};
pub use crate::core::{Evaluation, ExpansionMode, Game, GameStats, Player, Suggestion, SuggestionReport};
pub use engine::{EngineOptions, SuggestQuery, SuggestionEngine};
pub use error::{Result, SuggestError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
