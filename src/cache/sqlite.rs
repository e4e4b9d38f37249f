use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cache::{normalize_username, CacheKey, CacheStats, CachedPlayer, SuggestCache};
use crate::core::{Game, GameId, Player};
use crate::error::{Result, SuggestError};

/// SQLite-based cache of BGG records
///
/// Records are stored as JSON documents, one row per key:
/// ```sql
/// CREATE TABLE player_cache (
///     username TEXT PRIMARY KEY,
///     player_data TEXT NOT NULL,
///     hit_count INTEGER DEFAULT 0,
///     cached_at TEXT NOT NULL
/// );
/// CREATE TABLE game_cache (
///     game_id INTEGER PRIMARY KEY,
///     game_data TEXT NOT NULL,
///     hit_count INTEGER DEFAULT 0,
///     cached_at TEXT NOT NULL
/// );
/// ```
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
}

/// Fixed-width RFC 3339 so that timestamps compare correctly as text
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

impl SqliteCache {
    /// Create new SQLite cache
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS player_cache (
                username TEXT PRIMARY KEY,
                player_data TEXT NOT NULL,
                hit_count INTEGER DEFAULT 0,
                cached_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS game_cache (
                game_id INTEGER PRIMARY KEY,
                game_data TEXT NOT NULL,
                hit_count INTEGER DEFAULT 0,
                cached_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_player_cached_at ON player_cache(cached_at);
            CREATE INDEX IF NOT EXISTS idx_game_cached_at ON game_cache(cached_at);",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SuggestError::Cache("connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl SuggestCache for SqliteCache {
    async fn get_player(&self, username: &str) -> Result<Option<CachedPlayer>> {
        let normalized = normalize_username(username);
        let conn = self.conn()?;

        let row = conn
            .query_row(
                "SELECT player_data, hit_count, cached_at FROM player_cache WHERE username = ?",
                params![normalized],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i32>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((player_json, hit_count, cached_at)) = row else {
            return Ok(None);
        };

        let player: Player = match serde_json::from_str(&player_json) {
            Ok(player) => player,
            Err(e) => {
                tracing::warn!("Invalid cache entry for username {}: {}", username, e);
                return Ok(None);
            }
        };

        Ok(Some(CachedPlayer {
            player,
            hit_count,
            cached_at: cached_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
        }))
    }

    async fn save_player(&self, player: &Player) -> Result<()> {
        let normalized = normalize_username(&player.username);
        let player_json = serde_json::to_string(player)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT OR REPLACE INTO player_cache (username, player_data, hit_count, cached_at)
             VALUES (?1, ?2, COALESCE((SELECT hit_count FROM player_cache WHERE username = ?1), 0), ?3)",
            params![normalized, player_json, timestamp(Utc::now())],
        )?;

        Ok(())
    }

    async fn get_games(&self, ids: &[GameId]) -> Result<HashMap<GameId, Game>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached("SELECT game_data FROM game_cache WHERE game_id = ?")?;

        let mut games = HashMap::new();
        for id in ids {
            let Some(game_json) = stmt
                .query_row(params![id], |row| row.get::<_, String>(0))
                .optional()?
            else {
                continue;
            };

            match Game::from_json(&game_json) {
                Ok(game) => {
                    games.insert(*id, game);
                }
                Err(e) => tracing::warn!("Invalid cache entry for game {}: {}", id, e),
            }
        }

        Ok(games)
    }

    async fn save_games(&self, games: &[Game]) -> Result<()> {
        let now = timestamp(Utc::now());
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO game_cache (game_id, game_data, hit_count, cached_at)
                 VALUES (?1, ?2, COALESCE((SELECT hit_count FROM game_cache WHERE game_id = ?1), 0), ?3)",
            )?;

            for game in games {
                stmt.execute(params![game.game_id, game.to_json()?, now])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    async fn increment_hit(&self, key: &CacheKey) -> Result<()> {
        let conn = self.conn()?;

        match key {
            CacheKey::Player(username) => conn.execute(
                "UPDATE player_cache SET hit_count = hit_count + 1 WHERE username = ?",
                params![normalize_username(username)],
            )?,
            CacheKey::Game(id) => conn.execute(
                "UPDATE game_cache SET hit_count = hit_count + 1 WHERE game_id = ?",
                params![id],
            )?,
        };

        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let conn = self.conn()?;

        let players: u64 = conn.query_row("SELECT COUNT(*) FROM player_cache", [], |row| row.get(0))?;
        let games: u64 = conn.query_row("SELECT COUNT(*) FROM game_cache", [], |row| row.get(0))?;

        let total_hits: u64 = conn.query_row(
            "SELECT (SELECT COALESCE(SUM(hit_count), 0) FROM player_cache)
                  + (SELECT COALESCE(SUM(hit_count), 0) FROM game_cache)",
            [],
            |row| row.get(0),
        )?;

        let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(cached_at), MAX(cached_at) FROM (
                SELECT cached_at FROM player_cache
                UNION ALL
                SELECT cached_at FROM game_cache
            )",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(CacheStats {
            players,
            games,
            total_hits,
            oldest_entry: oldest.as_deref().and_then(parse_timestamp),
            newest_entry: newest.as_deref().and_then(parse_timestamp),
        })
    }

    async fn cleanup(&self, max_age_days: i64) -> Result<u64> {
        if max_age_days < 0 {
            return Err(SuggestError::InvalidInput(format!(
                "max age must not be negative (got {} days)",
                max_age_days
            )));
        }

        // Cutoff before the start of time: nothing is that old
        let Some(cutoff) = chrono::Duration::try_days(max_age_days)
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return Ok(0);
        };
        let cutoff = timestamp(cutoff);
        let conn = self.conn()?;

        let players = conn.execute("DELETE FROM player_cache WHERE cached_at < ?", params![cutoff])?;
        let games = conn.execute("DELETE FROM game_cache WHERE cached_at < ?", params![cutoff])?;

        Ok((players + games) as u64)
    }

    async fn clear(&self) -> Result<u64> {
        let conn = self.conn()?;

        let players = conn.execute("DELETE FROM player_cache", [])?;
        let games = conn.execute("DELETE FROM game_cache", [])?;

        Ok((players + games) as u64)
    }
}
