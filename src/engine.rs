use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::cache::{CacheKey, CacheStats, SqliteCache, SuggestCache};
use crate::core::{ExpansionMode, Game, GameId, GameStats, Player, SuggestionReport};
use crate::error::{Result, SuggestError};
use crate::providers::{BggConfig, BggProvider, BoardGameProvider};
use crate::ranking::{group_expansions, list_separately, HeuristicRanker, Ranker, ScoreWeights, SessionConstraints};

/// Heaviest weight on the BGG scale
pub const MAX_WEIGHT: f64 = 5.0;

/// Main suggestion pipeline orchestrator
pub struct SuggestionEngine {
    cache: Arc<dyn SuggestCache>,
    provider: Arc<dyn BoardGameProvider>,
    ranker: Arc<dyn Ranker>,
    /// Collections downloaded during this run, keyed by username
    downloaded: Mutex<HashMap<String, HashMap<GameId, GameStats>>>,
}

/// Suggestion request parameters
#[derive(Debug, Clone)]
pub struct SuggestQuery {
    /// BGG users sitting at the table
    pub usernames: Vec<String>,
    /// Players without a BGG account
    pub guests: usize,
    /// Owners of the candidate games (empty: the players themselves)
    pub collection: Vec<String>,
    /// Desired playing time in minutes (`Some(0)` counts as not given)
    pub playing_time: Option<u32>,
    /// Desired weight, 0.0 - 5.0 (`Some(0.0)` counts as not given)
    pub weight: Option<f64>,
    /// Maximum number of suggestions (`Some(0)` counts as no limit)
    pub limit: Option<usize>,
    /// Read from the local cache before hitting BGG
    pub use_cache: bool,
    pub expansion_mode: ExpansionMode,
}

impl Default for SuggestQuery {
    fn default() -> Self {
        Self {
            usernames: Vec::new(),
            guests: 0,
            collection: Vec::new(),
            playing_time: None,
            weight: None,
            limit: None,
            use_cache: true,
            expansion_mode: ExpansionMode::Grouped,
        }
    }
}

fn clean_usernames(usernames: Vec<String>) -> Vec<String> {
    usernames
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

impl SuggestQuery {
    /// Trim names, drop zero values and check that the query makes sense
    pub fn normalized(mut self) -> Result<Self> {
        self.usernames = clean_usernames(self.usernames);
        self.collection = clean_usernames(self.collection);
        self.playing_time = self.playing_time.filter(|t| *t > 0);
        self.limit = self.limit.filter(|l| *l > 0);

        if self.usernames.is_empty() && self.guests == 0 {
            return Err(SuggestError::InvalidInput(
                "at least one player (or guest) must be specified".to_string(),
            ));
        }

        if self.usernames.is_empty() && self.collection.is_empty() {
            return Err(SuggestError::InvalidInput(
                "at least one BGG username must be specified".to_string(),
            ));
        }

        if let Some(weight) = self.weight {
            if !(0.0..=MAX_WEIGHT).contains(&weight) {
                return Err(SuggestError::InvalidInput(format!(
                    "weight must be a value between 0.0 and {:.1}",
                    MAX_WEIGHT
                )));
            }
        }
        self.weight = self.weight.filter(|w| *w > 0.0);

        Ok(self)
    }

    /// Usernames whose owned games are candidates
    pub fn collection_owners(&self) -> &[String] {
        if self.collection.is_empty() {
            &self.usernames
        } else {
            &self.collection
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub db_path: String,
    pub bgg: BggConfig,
    pub weights: ScoreWeights,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            db_path: "bgg-suggest.db".to_string(),
            bgg: BggConfig::default(),
            weights: ScoreWeights::default(),
        }
    }
}

impl EngineOptions {
    /// Defaults overridden by `BGG_DB_PATH` and the `BGG_*` provider variables
    pub fn from_env() -> Self {
        let mut options = Self {
            bgg: BggConfig::from_env(),
            ..Self::default()
        };

        if let Ok(db_path) = std::env::var("BGG_DB_PATH") {
            options.db_path = db_path;
        }

        options
    }
}

impl SuggestionEngine {
    /// Create new engine with SQLite cache, BGG provider and heuristic ranker
    pub async fn new(options: EngineOptions) -> Result<Self> {
        let cache = Arc::new(SqliteCache::new(&options.db_path).await?);
        let provider = Arc::new(BggProvider::new(options.bgg)?);
        let ranker = Arc::new(HeuristicRanker::with_weights(options.weights));

        tracing::debug!("📦 Database: {}", options.db_path);

        Ok(Self::with_components(cache, provider, ranker))
    }

    /// Assemble an engine from custom parts
    pub fn with_components(
        cache: Arc<dyn SuggestCache>,
        provider: Arc<dyn BoardGameProvider>,
        ranker: Arc<dyn Ranker>,
    ) -> Self {
        Self {
            cache,
            provider,
            ranker,
            downloaded: Mutex::new(HashMap::new()),
        }
    }

    /// Download a collection once per engine
    async fn download_collection(&self, username: &str) -> Result<HashMap<GameId, GameStats>> {
        let key = crate::cache::normalize_username(username);

        if let Some(stats) = self.downloaded.lock().await.get(&key) {
            tracing::debug!("Player data already downloaded, skip");
            return Ok(stats.clone());
        }

        let stats = self
            .provider
            .fetch_collection(username)
            .await
            .map_err(|e| SuggestError::PlayerUnavailable {
                username: username.to_string(),
                reason: e.to_string(),
            })?;

        self.downloaded.lock().await.insert(key, stats.clone());
        Ok(stats)
    }

    /// Resolve BGG users, from the cache when allowed, otherwise from the provider
    pub async fn load_players(&self, usernames: &[String], use_cache: bool) -> Result<Vec<Player>> {
        let mut players = Vec::with_capacity(usernames.len());

        for username in usernames {
            if use_cache {
                if let Some(cached) = self.cache.get_player(username).await? {
                    tracing::info!("✅ Loaded {} from cache", username);
                    if let Err(e) = self.cache.increment_hit(&CacheKey::player(username)).await {
                        tracing::warn!("Failed to update cache hits: {}", e);
                    }
                    players.push(cached.player);
                    continue;
                }
            }

            let stats = match self.download_collection(username).await {
                Ok(stats) => stats,
                Err(e) => {
                    tracing::error!("❌ {}", e);
                    return Err(e);
                }
            };

            let player = Player::new(username.clone(), stats);
            if let Err(e) = self.cache.save_player(&player).await {
                tracing::warn!("Failed to save to cache: {}", e);
            }
            players.push(player);
        }

        Ok(players)
    }

    /// Metadata for `ids`: cached records first, then the missing ones from the provider
    pub async fn load_games(&self, ids: &BTreeSet<GameId>, use_cache: bool) -> Result<HashMap<GameId, Game>> {
        let ids: Vec<GameId> = ids.iter().copied().collect();
        let mut games = HashMap::new();

        if use_cache {
            tracing::info!("Loading games data from cache ..");
            games = self.cache.get_games(&ids).await?;
            for id in games.keys() {
                if let Err(e) = self.cache.increment_hit(&CacheKey::Game(*id)).await {
                    tracing::warn!("Failed to update cache hits: {}", e);
                }
            }
        }

        let missing: Vec<GameId> = ids.iter().copied().filter(|id| !games.contains_key(id)).collect();

        if !missing.is_empty() {
            tracing::info!("📥 Downloading data for {} games from {} ..", missing.len(), self.provider.name());

            let fetched = self.provider.fetch_games(&missing).await?;
            if fetched.len() < missing.len() {
                tracing::warn!("⚠️ {} games were not returned by {}", missing.len() - fetched.len(), self.provider.name());
            }

            let records: Vec<Game> = fetched.values().cloned().collect();
            if let Err(e) = self.cache.save_games(&records).await {
                tracing::warn!("Failed to save to cache: {}", e);
            }

            games.extend(fetched);
        }

        if games.is_empty() {
            tracing::error!("Cannot find games in given collections");
            return Err(SuggestError::EmptyCollection);
        }

        Ok(games)
    }

    /// Run the whole pipeline
    pub async fn suggest(&self, query: SuggestQuery) -> Result<SuggestionReport> {
        let start = Instant::now();
        let query = query.normalized()?;

        tracing::info!("Adding BGG players ..");
        let mut group = self.load_players(&query.usernames, query.use_cache).await?;

        if query.guests > 0 {
            tracing::info!("Adding {} guests ..", query.guests);
            group.extend((0..query.guests).map(Player::guest));
        }

        tracing::info!("Adding player game collections ..");
        let owners: Vec<Player> = if query.collection.is_empty() {
            group.iter().filter(|p| !p.is_guest).cloned().collect()
        } else {
            self.load_players(query.collection_owners(), query.use_cache).await?
        };

        let owned: BTreeSet<GameId> = owners.iter().flat_map(|p| p.owned_games()).collect();
        if owned.is_empty() {
            return Err(SuggestError::NoAvailableGames);
        }

        let available: HashMap<GameId, Game> = self
            .load_games(&owned, query.use_cache)
            .await?
            .into_iter()
            .filter(|(id, _)| owners.iter().any(|p| p.owns(*id)))
            .collect();

        if available.is_empty() {
            return Err(SuggestError::NoAvailableGames);
        }

        let players = group.len();
        let mut playable: Vec<Game> = available
            .values()
            .filter(|g| g.supports_players(players))
            .filter(|g| !g.is_expansion() || g.expansion_of.iter().any(|b| available.contains_key(b)))
            .cloned()
            .collect();
        playable.sort_by_key(|g| g.game_id);

        if playable.is_empty() {
            tracing::error!("No possible games for this game group, sorry");
            return Err(SuggestError::NoPlayableGames { players });
        }

        tracing::debug!(
            "{} available games, {} playable by {} players",
            available.len(),
            playable.len(),
            players
        );

        let constraints = SessionConstraints {
            players,
            playing_time: query.playing_time,
            weight: query.weight,
        };
        let ranked = self.ranker.rank(&constraints, &playable, &group)?;

        let mut suggestions = match query.expansion_mode {
            ExpansionMode::Grouped => group_expansions(ranked, &available, players),
            ExpansionMode::Separate => list_separately(ranked),
        };

        if let Some(limit) = query.limit {
            suggestions.truncate(limit);
        }

        Ok(SuggestionReport {
            suggestions,
            players,
            expansion_mode: query.expansion_mode,
            playable_games: playable.len(),
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            ranking_method: self.ranker.name().to_string(),
        })
    }

    /// Get cache statistics
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.stats().await
    }

    /// Clean up old cache entries
    pub async fn cleanup_cache(&self, max_age_days: i64) -> Result<u64> {
        self.cache.cleanup(max_age_days).await
    }

    /// Drop every cached record
    pub async fn clear_cache(&self) -> Result<u64> {
        self.cache.clear().await
    }
}
