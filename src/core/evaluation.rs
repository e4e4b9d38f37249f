use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Round to 4 decimals and clamp into `0.0..=1.0`
pub fn standardize(value: f64) -> f64 {
    ((value * 10_000.0).round() / 10_000.0).clamp(0.0, 1.0)
}

/// Whether a component used its fallback value or was computed from data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Default,
    Computed,
}

/// One weighted term of the final score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub score: f64,
    pub weight: f64,
    pub source: ScoreSource,
}

impl ScoreComponent {
    pub fn default_value(score: f64, weight: f64) -> Self {
        Self {
            score,
            weight,
            source: ScoreSource::Default,
        }
    }

    pub fn computed(score: f64, weight: f64) -> Self {
        Self {
            score,
            weight,
            source: ScoreSource::Computed,
        }
    }
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            ScoreSource::Default => write!(f, "default {:.4} (weight {})", self.score, self.weight),
            ScoreSource::Computed => write!(f, "{:.4} (weight {})", self.score, self.weight),
        }
    }
}

/// Detailed breakdown of a game's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Absent when no playing time was requested
    #[serde(default)]
    pub playing_time: Option<ScoreComponent>,

    /// Absent when no weight was requested
    #[serde(default)]
    pub weight: Option<ScoreComponent>,

    pub suggested_players: ScoreComponent,

    pub players_score: ScoreComponent,

    /// Standardized contribution of each BGG user to `players_score`
    #[serde(default)]
    pub player_contributions: BTreeMap<String, f64>,
}

impl Evaluation {
    /// Components taking part in the weighted average
    pub fn components(&self) -> impl Iterator<Item = (&'static str, &ScoreComponent)> + '_ {
        [
            ("playing_time", self.playing_time.as_ref()),
            ("weight", self.weight.as_ref()),
            ("suggested_players", Some(&self.suggested_players)),
            ("players_score", Some(&self.players_score)),
        ]
        .into_iter()
        .filter_map(|(name, component)| component.map(|c| (name, c)))
    }

    /// Weighted average of all components, standardized
    pub fn final_score(&self) -> f64 {
        let (weighted, weights) = self
            .components()
            .fold((0.0, 0.0), |(sum, total), (_, c)| (sum + c.score * c.weight, total + c.weight));

        if weights > 0.0 {
            standardize(weighted / weights)
        } else {
            0.0
        }
    }

    /// Multi-line description for debug output
    pub fn describe(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .components()
            .map(|(name, component)| format!("{} = {}", name, component))
            .collect();

        for (username, contribution) in &self.player_contributions {
            lines.push(format!("player {} = {:.4}", username, contribution));
        }

        lines
    }
}
