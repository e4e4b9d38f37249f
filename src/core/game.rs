use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// BGG game identifier (`objectid`)
pub type GameId = u32;

/// Votes from the `suggested_numplayers` poll for one player count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionVotes {
    #[serde(default)]
    pub best: u32,
    #[serde(default)]
    pub recommended: u32,
    #[serde(default)]
    pub not_recommended: u32,
}

impl SuggestionVotes {
    /// Add votes for a poll option ("Best", "Recommended", "Not Recommended").
    /// Unknown options are ignored.
    pub fn add(&mut self, option: &str, votes: u32) {
        match option {
            "Best" => self.best = self.best.saturating_add(votes),
            "Recommended" => self.recommended = self.recommended.saturating_add(votes),
            "Not Recommended" => self.not_recommended = self.not_recommended.saturating_add(votes),
            _ => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.best
            .saturating_add(self.recommended)
            .saturating_add(self.not_recommended)
    }
}

/// Game metadata as published by BoardGameGeek
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    /// BGG object id
    pub game_id: GameId,

    /// Primary name
    #[serde(default)]
    pub name: String,

    /// Minimum number of players (only when > 0)
    #[serde(default)]
    pub player_min: Option<u32>,

    /// Maximum number of players (only when > 0)
    #[serde(default)]
    pub player_max: Option<u32>,

    /// Playing time in minutes (only when > 0)
    #[serde(default)]
    pub playing_time: Option<u32>,

    /// Community poll results keyed by player count
    #[serde(default)]
    pub suggested_players: Option<BTreeMap<u32, SuggestionVotes>>,

    /// Base games this one expands (empty for base games)
    #[serde(default)]
    pub expansion_of: BTreeSet<GameId>,

    /// Average complexity (1.0 - 5.0)
    #[serde(default)]
    pub average_weight: Option<f64>,

    /// Average community rating scaled to 0.0 - 1.0
    #[serde(default)]
    pub average_rating: Option<f64>,
}

impl Game {
    /// Create a new Game with required fields
    pub fn new(game_id: GameId, name: impl Into<String>) -> Self {
        Self {
            game_id,
            name: name.into(),
            player_min: None,
            player_max: None,
            playing_time: None,
            suggested_players: None,
            expansion_of: BTreeSet::new(),
            average_weight: None,
            average_rating: None,
        }
    }

    /// Builder-style player range setter
    pub fn with_players(mut self, min: u32, max: u32) -> Self {
        self.player_min = Some(min);
        self.player_max = Some(max);
        self
    }

    pub fn is_expansion(&self) -> bool {
        !self.expansion_of.is_empty()
    }

    /// Whether a group of `players` fits the declared range.
    /// An incomplete range never excludes a group.
    pub fn supports_players(&self, players: usize) -> bool {
        match (self.player_min, self.player_max) {
            (Some(min), Some(max)) => (min as usize..=max as usize).contains(&players),
            _ => true,
        }
    }

    /// Poll votes for a group size, if enough people voted
    pub fn suggestion_for(&self, players: usize) -> Option<&SuggestionVotes> {
        let players = u32::try_from(players).ok()?;
        self.suggested_players.as_ref()?.get(&players)
    }

    /// Get display name (for logging/UI)
    pub fn display_name(&self) -> String {
        match (self.player_min, self.player_max) {
            (Some(min), Some(max)) if min == max => format!("{} ({}p)", self.name, min),
            (Some(min), Some(max)) => format!("{} ({}-{}p)", self.name, min, max),
            _ => self.name.clone(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
