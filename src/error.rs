use thiserror::Error;

/// Main error type for the suggestion engine
#[derive(Error, Debug)]
pub enum SuggestError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed XML documents
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Provider errors
    #[error("Provider '{provider}' error: {message}")]
    Provider { provider: String, message: String },

    /// Cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Rejected query parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A BGG user whose collection could not be loaded
    #[error("Cannot load player data for {username}: {reason}")]
    PlayerUnavailable { username: String, reason: String },

    /// No game metadata at all for the given collections
    #[error("Cannot find games in given collections")]
    EmptyCollection,

    /// Games exist but none is owned by the collection group
    #[error("No available games, check usernames and/or collections for owned games")]
    NoAvailableGames,

    /// Nothing fits the group size
    #[error("No possible games for a group of {players} players")]
    NoPlayableGames { players: usize },

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<String> for SuggestError {
    fn from(s: String) -> Self {
        SuggestError::Other(s)
    }
}

impl From<&str> for SuggestError {
    fn from(s: &str) -> Self {
        SuggestError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SuggestError>;
