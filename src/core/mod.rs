pub mod evaluation;
pub mod game;
pub mod player;
pub mod suggestion;

pub use evaluation::{standardize, Evaluation, ScoreComponent, ScoreSource};
pub use game::{Game, GameId, SuggestionVotes};
pub use player::{GameStats, Player};
pub use suggestion::{ExpansionMode, ExpansionSuggestion, Suggestion, SuggestionReport};
