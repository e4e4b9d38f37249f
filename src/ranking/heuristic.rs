//! Suitability heuristic.
//!
//! Each game gets up to four weighted components (playing time, weight,
//! community player-count poll, players' own ratings) averaged into a
//! score in `0.0..=1.0`.

use std::collections::BTreeMap;

use crate::core::{standardize, Evaluation, Game, Player, ScoreComponent, SuggestionVotes};
use crate::error::Result;
use crate::ranking::{by_score_desc, RankedGame, Ranker, SessionConstraints};

/// Relative importance of each score component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub playing_time: f64,
    pub weight: f64,
    pub suggested_players: f64,
    pub players_score: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            playing_time: 0.4,
            weight: 0.4,
            suggested_players: 0.2,
            players_score: 0.4,
        }
    }
}

const DEFAULT_PLAYING_TIME_SCORE: f64 = 0.5;
const DEFAULT_WEIGHT_SCORE: f64 = 0.5;
const DEFAULT_SUGGESTION_SCORE: f64 = 0.6;
const DEFAULT_PLAYERS_SCORE: f64 = 0.5;

/// Largest weight difference still worth a positive score
const MAX_WEIGHT_DELTA: f64 = 2.5;

/// Zero ratings mean "not rated"
fn rated(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// 1.0 on target, decaying exponentially to 0.0 at `requested` minutes off
pub fn playing_time_score(requested: u32, actual: u32) -> f64 {
    let max_delta = f64::from(requested);
    let delta = (max_delta - f64::from(actual)).abs();

    if delta >= max_delta {
        0.0
    } else {
        let raw = delta * (3.0 / max_delta) + 2.0;
        1.0 - (2f64.powf(raw) - 4.0) / 28.0
    }
}

/// 1.0 on target, decaying exponentially to 0.0 at 2.5 weight points off
pub fn weight_score(requested: f64, actual: f64) -> f64 {
    let delta = (requested - actual).abs();

    if delta >= MAX_WEIGHT_DELTA {
        0.0
    } else {
        let raw = delta * (2.0 / MAX_WEIGHT_DELTA) + 2.0;
        1.0 - (2f64.powf(raw) - 4.0) / 16.0
    }
}

/// Share of "Best" votes plus half the share of "Recommended" votes
pub fn suggestion_score(votes: &SuggestionVotes) -> Option<f64> {
    let total = f64::from(votes.total());
    if total <= 0.0 {
        return None;
    }

    let score = (f64::from(votes.best) + f64::from(votes.recommended) * 0.5) / total;
    Some(score.max(0.0))
}

/// Scores games with fixed formulas
#[derive(Debug, Clone, Default)]
pub struct HeuristicRanker {
    weights: ScoreWeights,
}

impl HeuristicRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    fn playing_time_component(&self, constraints: &SessionConstraints, game: &Game) -> Option<ScoreComponent> {
        let requested = constraints.playing_time.filter(|t| *t > 0)?;

        Some(match game.playing_time {
            Some(actual) => ScoreComponent::computed(
                playing_time_score(requested, actual),
                self.weights.playing_time,
            ),
            None => ScoreComponent::default_value(DEFAULT_PLAYING_TIME_SCORE, self.weights.playing_time),
        })
    }

    fn weight_component(&self, constraints: &SessionConstraints, game: &Game) -> Option<ScoreComponent> {
        let requested = constraints.weight.filter(|w| *w > 0.0)?;

        Some(match game.average_weight {
            Some(actual) => ScoreComponent::computed(weight_score(requested, actual), self.weights.weight),
            None => ScoreComponent::default_value(DEFAULT_WEIGHT_SCORE, self.weights.weight),
        })
    }

    fn suggestion_component(&self, constraints: &SessionConstraints, game: &Game) -> ScoreComponent {
        game.suggestion_for(constraints.players)
            .and_then(suggestion_score)
            .map(|score| ScoreComponent::computed(score, self.weights.suggested_players))
            .unwrap_or_else(|| {
                ScoreComponent::default_value(DEFAULT_SUGGESTION_SCORE, self.weights.suggested_players)
            })
    }

    /// Average rating (half weight) blended with what each BGG user thinks of the game
    fn players_component(&self, game: &Game, players: &[Player]) -> (ScoreComponent, BTreeMap<String, f64>) {
        let mut score = 0.0;
        let mut divide_by = 0.0;
        let mut contributions = BTreeMap::new();

        if let Some(average) = rated(game.average_rating) {
            score = average * 0.5;
            divide_by = 0.5;
        }

        for player in players.iter().filter(|p| !p.is_guest) {
            let Some(stats) = player.stats_for(game.game_id) else {
                continue;
            };

            let contribution = match (stats.want_to_play, rated(stats.rating)) {
                (true, Some(rating)) => 0.8 + rating * 0.2,
                (true, None) => 0.9,
                (false, Some(rating)) if stats.play_count != 0 => {
                    // Plays wear a game out; highly rated games wear out slower
                    let decay = f64::from(stats.play_count) / 2f64.powf(rating * 10.0);
                    (-decay).exp() * rating
                }
                (false, Some(rating)) => rating * 0.8,
                (false, None) => continue,
            };

            score += contribution;
            divide_by += 1.0;
            contributions.insert(player.username.clone(), standardize(contribution));
        }

        let component = if divide_by > 0.0 {
            ScoreComponent::computed(score / divide_by, self.weights.players_score)
        } else {
            ScoreComponent::default_value(DEFAULT_PLAYERS_SCORE, self.weights.players_score)
        };

        (component, contributions)
    }

    /// Detailed evaluation of one game for the group
    pub fn evaluate(&self, constraints: &SessionConstraints, game: &Game, players: &[Player]) -> Evaluation {
        let (players_score, player_contributions) = self.players_component(game, players);

        Evaluation {
            playing_time: self.playing_time_component(constraints, game),
            weight: self.weight_component(constraints, game),
            suggested_players: self.suggestion_component(constraints, game),
            players_score,
            player_contributions,
        }
    }
}

impl Ranker for HeuristicRanker {
    fn rank(
        &self,
        constraints: &SessionConstraints,
        candidates: &[Game],
        players: &[Player],
    ) -> Result<Vec<RankedGame>> {
        let mut ranked: Vec<RankedGame> = candidates
            .iter()
            .map(|game| RankedGame::new(game.clone(), self.evaluate(constraints, game, players)))
            .collect();

        ranked.sort_by(|a, b| by_score_desc((a.score, &a.game), (b.score, &b.game)));

        Ok(ranked)
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
