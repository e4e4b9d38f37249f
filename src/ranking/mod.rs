pub mod expansions;
pub mod heuristic;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::core::{Evaluation, Game, Player};
use crate::error::Result;

pub use expansions::{group_expansions, list_separately};
pub use heuristic::{HeuristicRanker, ScoreWeights};

/// What the group asked for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConstraints {
    /// Size of the game group (users + guests)
    pub players: usize,
    /// Desired playing time in minutes
    pub playing_time: Option<u32>,
    /// Desired complexity (0.0 - 5.0)
    pub weight: Option<f64>,
}

/// Trait for game scoring implementations
pub trait Ranker: Send + Sync {
    /// Score candidates for the game group, return sorted by score (highest first)
    fn rank(
        &self,
        constraints: &SessionConstraints,
        candidates: &[Game],
        players: &[Player],
    ) -> Result<Vec<RankedGame>>;

    /// Get ranker name for logging
    fn name(&self) -> &str;
}

/// Candidate with its score and breakdown
#[derive(Debug, Clone)]
pub struct RankedGame {
    pub game: Game,
    pub score: f64,
    pub evaluation: Evaluation,
}

impl RankedGame {
    pub fn new(game: Game, evaluation: Evaluation) -> Self {
        let score = evaluation.final_score();
        Self {
            game,
            score,
            evaluation,
        }
    }
}

/// Highest score first, then by name and id so that output is stable
pub(crate) fn by_score_desc(a: (f64, &Game), b: (f64, &Game)) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.1.name.cmp(&b.1.name))
        .then_with(|| a.1.game_id.cmp(&b.1.game_id))
}
