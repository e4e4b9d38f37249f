use serde::{Deserialize, Serialize};

use crate::core::{Evaluation, Game};

/// How expansions are presented in a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionMode {
    /// Expansions folded under the base game they need
    #[default]
    Grouped,
    /// Every playable game (expansions included) listed on its own
    Separate,
}

/// An expansion proposed together with its base game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionSuggestion {
    pub game: Game,

    /// `None` when the expansion is not playable on its own for this group
    pub score: Option<f64>,

    #[serde(default)]
    pub evaluation: Option<Evaluation>,
}

/// A suggested game with its score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub game: Game,

    /// Sort score (for a base game: best score among itself and its expansions)
    pub rank_score: f64,

    /// The game's own score, `None` when it needs an expansion to be played
    pub score: Option<f64>,

    #[serde(default)]
    pub evaluation: Option<Evaluation>,

    #[serde(default)]
    pub expansions: Vec<ExpansionSuggestion>,
}

impl Suggestion {
    pub fn new(game: Game, score: f64, evaluation: Evaluation) -> Self {
        Self {
            game,
            rank_score: score,
            score: Some(score),
            evaluation: Some(evaluation),
            expansions: Vec::new(),
        }
    }

    /// True when the game cannot be played by this group without an expansion
    pub fn requires_expansion(&self) -> bool {
        self.score.is_none()
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        match self.score {
            Some(score) => format!("{} [{:.4}]", self.game.name, score),
            None => format!(
                "{} (you must use an expansion to play this game)",
                self.game.name
            ),
        }
    }
}

/// Outcome of a suggestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionReport {
    /// Ordered best first
    pub suggestions: Vec<Suggestion>,

    /// Size of the game group (users + guests)
    pub players: usize,

    pub expansion_mode: ExpansionMode,

    /// Games that passed the player-count and base-game checks
    pub playable_games: usize,

    /// Pipeline latency in milliseconds
    pub latency_ms: f64,

    /// Ranking method used
    pub ranking_method: String,
}

impl SuggestionReport {
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}
