use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;

use crate::core::{Game, GameId, GameStats};
use crate::error::{Result, SuggestError};
use crate::providers::{xml, BoardGameProvider};

const PROVIDER: &str = "bgg";

/// BoardGameGeek XML API settings
#[derive(Debug, Clone)]
pub struct BggConfig {
    /// Site root, without trailing slash
    pub base_url: String,
    /// Wait between retries of a queued (202) request and between batches
    pub retry_delay: Duration,
    /// Retries of a queued request before giving up
    pub max_retries: u32,
    pub collection_timeout: Duration,
    pub games_timeout: Duration,
    /// Game ids per `/xmlapi/boardgame` request
    pub batch_size: usize,
}

impl Default for BggConfig {
    fn default() -> Self {
        Self {
            base_url: "https://boardgamegeek.com".to_string(),
            retry_delay: Duration::from_secs(2),
            max_retries: 10,
            collection_timeout: Duration::from_secs(5),
            games_timeout: Duration::from_secs(30),
            batch_size: 50,
        }
    }
}

impl BggConfig {
    /// Defaults overridden by `BGG_BASE_URL`, `BGG_RETRY_DELAY_MS`,
    /// `BGG_MAX_RETRIES` and `BGG_BATCH_SIZE`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("BGG_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(ms) = std::env::var("BGG_RETRY_DELAY_MS").ok().and_then(|v| v.parse::<u64>().ok()) {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(retries) = std::env::var("BGG_MAX_RETRIES").ok().and_then(|v| v.parse::<u32>().ok()) {
            config.max_retries = retries;
        }
        if let Some(size) = std::env::var("BGG_BATCH_SIZE").ok().and_then(|v| v.parse::<usize>().ok()) {
            config.batch_size = size.max(1);
        }

        config
    }
}

fn provider_error(message: impl Into<String>) -> SuggestError {
    SuggestError::Provider {
        provider: PROVIDER.to_string(),
        message: message.into(),
    }
}

/// BoardGameGeek XML API (v1) provider
pub struct BggProvider {
    client: Client,
    config: BggConfig,
}

impl BggProvider {
    /// Create new BGG provider
    pub fn new(config: BggConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("bgg-suggest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn collection_url(&self, username: &str) -> String {
        format!(
            "{}/xmlapi/collection/{}",
            self.config.base_url,
            urlencoding::encode(username)
        )
    }

    pub fn games_url(&self, ids: &[GameId]) -> String {
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        format!("{}/xmlapi/boardgame/{}?stats=1", self.config.base_url, ids.join(","))
    }

    /// GET an XML document, waiting while BGG answers 202 (request queued)
    async fn get_xml(&self, url: &str, timeout: Duration) -> Result<String> {
        let mut retries = 0;

        loop {
            tracing::debug!("Request url: {}", url);

            let response = self
                .client
                .get(url)
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| provider_error(format!("Request failed: {}", e)))?;

            match response.status() {
                StatusCode::OK => {
                    return response
                        .text()
                        .await
                        .map_err(|e| provider_error(format!("Cannot read body: {}", e)));
                }
                StatusCode::ACCEPTED if retries < self.config.max_retries => {
                    retries += 1;
                    tracing::debug!(
                        "Got accepted code, retry #{} after {:?}",
                        retries,
                        self.config.retry_delay
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                StatusCode::ACCEPTED => {
                    return Err(provider_error(format!(
                        "Request still queued after {} retries",
                        retries
                    )));
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    tracing::debug!("{}", body);
                    return Err(provider_error(format!("HTTP {}", status)));
                }
            }
        }
    }
}

#[async_trait]
impl BoardGameProvider for BggProvider {
    async fn fetch_collection(&self, username: &str) -> Result<HashMap<GameId, GameStats>> {
        tracing::info!("📥 Downloading data for player {} ..", username);

        let url = self.collection_url(username);
        let body = self.get_xml(&url, self.config.collection_timeout).await?;

        tracing::debug!("Parsing xml ..");
        let games = xml::parse_collection(&body)?;

        tracing::debug!("Download Ok: {} games for {}", games.len(), username);
        Ok(games)
    }

    async fn fetch_games(&self, ids: &[GameId]) -> Result<HashMap<GameId, Game>> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut games = HashMap::new();

        for (i, batch) in ids.chunks(self.config.batch_size.max(1)).enumerate() {
            // Small delay to avoid rate limiting
            if i > 0 {
                tokio::time::sleep(self.config.retry_delay).await;
            }

            let url = self.games_url(batch);
            tracing::debug!("Requesting games xml for {} ids ..", batch.len());

            let body = self.get_xml(&url, self.config.games_timeout).await?;
            games.extend(xml::parse_games(&body)?);
        }

        Ok(games)
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    async fn is_available(&self) -> bool {
        // Catan - 13
        self.fetch_games(&[13]).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider() -> BggProvider {
        BggProvider::new(BggConfig::default()).unwrap()
    }

    #[test]
    fn test_collection_url_encodes_username() {
        assert_eq!(
            provider().collection_url("john doe"),
            "https://boardgamegeek.com/xmlapi/collection/john%20doe"
        );
    }

    #[test]
    fn test_games_url() {
        assert_eq!(
            provider().games_url(&[13, 822]),
            "https://boardgamegeek.com/xmlapi/boardgame/13,822?stats=1"
        );
    }

    #[test]
    fn test_fetch_no_games_skips_network() {
        let config = BggConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..BggConfig::default()
        };
        let provider = BggProvider::new(config).unwrap();

        let games = tokio_test::block_on(provider.fetch_games(&[])).unwrap();
        assert!(games.is_empty());
    }

    fn mock_config(server: &MockServer) -> BggConfig {
        BggConfig {
            base_url: server.uri(),
            retry_delay: Duration::from_millis(5),
            max_retries: 2,
            ..BggConfig::default()
        }
    }

    const COLLECTION_XML: &str = r#"<items totalitems="1">
  <item objectid="13"><status own="1" wanttoplay="0"/><numplays>3</numplays></item>
</items>"#;

    fn games_xml(ids: &[GameId]) -> String {
        let games: String = ids
            .iter()
            .map(|id| format!(r#"<boardgame objectid="{id}"><name primary="true">Game {id}</name></boardgame>"#))
            .collect();
        format!("<boardgames>{}</boardgames>", games)
    }

    #[tokio::test]
    async fn test_retry_while_queued() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/xmlapi/collection/alice"))
            .respond_with(ResponseTemplate::new(202))
            .up_to_n_times(2)
            .expect(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/xmlapi/collection/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_string(COLLECTION_XML))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = BggProvider::new(mock_config(&mock_server)).unwrap();
        let games = provider.fetch_collection("alice").await.unwrap();

        assert_eq!(games.len(), 1);
        assert!(games[&13].owned);
        assert_eq!(games[&13].play_count, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mock_server = MockServer::start().await;

        // First attempt plus two retries
        Mock::given(method("GET"))
            .and(path("/xmlapi/collection/alice"))
            .respond_with(ResponseTemplate::new(202))
            .expect(3)
            .mount(&mock_server)
            .await;

        let provider = BggProvider::new(mock_config(&mock_server)).unwrap();
        let err = provider.fetch_collection("alice").await.unwrap_err();

        assert!(matches!(err, SuggestError::Provider { .. }));
        assert!(err.to_string().contains("after 2 retries"));
    }

    #[tokio::test]
    async fn test_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/xmlapi/boardgame/13"))
            .and(query_param("stats", "1"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&mock_server)
            .await;

        let provider = BggProvider::new(mock_config(&mock_server)).unwrap();
        let err = provider.fetch_games(&[13]).await.unwrap_err();

        assert!(matches!(err, SuggestError::Provider { .. }));
        assert!(err.to_string().contains("500"));
        assert!(!provider.is_available().await);
    }

    #[tokio::test]
    async fn test_fetch_games_in_sorted_batches() {
        let mock_server = MockServer::start().await;

        for batch in [[1, 2], [3, 5]] {
            Mock::given(method("GET"))
                .and(path(format!("/xmlapi/boardgame/{},{}", batch[0], batch[1])))
                .and(query_param("stats", "1"))
                .respond_with(ResponseTemplate::new(200).set_body_string(games_xml(&batch)))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let config = BggConfig {
            batch_size: 2,
            ..mock_config(&mock_server)
        };
        let provider = BggProvider::new(config).unwrap();
        let games = provider.fetch_games(&[5, 1, 3, 2, 1]).await.unwrap();

        let mut ids: Vec<GameId> = games.keys().copied().collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 5]);
        assert_eq!(games[&5].name, "Game 5");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_bgg_fetch_games() {
        let games = provider().fetch_games(&[13]).await.unwrap();

        assert!(games[&13].name.to_lowercase().contains("catan"));
        assert!(games[&13].player_max.is_some());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_bgg_fetch_unknown_user() {
        let result = provider()
            .fetch_collection("this-user-should-not-exist-0xdeadbeef")
            .await;
        assert!(result.is_err());
    }
}
