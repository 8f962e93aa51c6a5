pub mod parse;

pub use parse::{parse_lobby_rows, RawLobbyRow};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::models::LobbyRow;

/// Lobby rows for one cycle, plus the raw capture they came from.
#[derive(Debug, Clone, Default)]
pub struct LobbyCapture {
    pub rows: Vec<LobbyRow>,
    /// Kept only for the debug artifact
    pub raw: serde_json::Value,
}

/// Produces the coarse listing of currently offered matches.
#[async_trait]
pub trait LobbyReader: Send + Sync {
    async fn read_lobby(&self) -> Result<LobbyCapture>;

    fn name(&self) -> &str;
}

/// Lobby captured by the render service as a JSON array of raw rows.
pub struct HttpLobby {
    http: Client,
    url: String,
    max_rows: usize,
    timeout: Duration,
}

impl HttpLobby {
    pub fn new(http: Client, url: &str, max_rows: usize, timeout: Duration) -> Self {
        HttpLobby {
            http,
            url: url.to_string(),
            max_rows,
            timeout,
        }
    }
}

#[async_trait]
impl LobbyReader for HttpLobby {
    fn name(&self) -> &str {
        "http-lobby"
    }

    async fn read_lobby(&self) -> Result<LobbyCapture> {
        debug!("Fetching lobby from {}", self.url);
        let resp = self
            .http
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .context("Lobby request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Lobby fetch error: {}", resp.status());
        }

        let raw: serde_json::Value = resp.json().await.context("Failed to parse lobby capture")?;
        // Some captures wrap the table as {"rows": [...]}
        let table = raw.get("rows").unwrap_or(&raw);
        let raw_rows: Vec<RawLobbyRow> =
            serde_json::from_value(table.clone()).context("Unexpected lobby capture shape")?;

        Ok(LobbyCapture {
            rows: parse_lobby_rows(&raw_rows, self.max_rows),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_wrapped_rows() {
        let base = crate::testutil::slow_json_server(
            Duration::ZERO,
            r#"{"rows": [{"title": "India v Australia", "live": true}]}"#,
        )
        .await;
        let lobby = HttpLobby::new(Client::new(), &base, 25, Duration::from_secs(5));

        let capture = lobby.read_lobby().await.unwrap();
        assert_eq!(capture.rows.len(), 1);
        assert_eq!(capture.rows[0].match_id, "india-v-australia");
    }

    #[tokio::test]
    async fn test_request_timeout_applies() {
        let base = crate::testutil::slow_json_server(Duration::from_secs(3), "[]").await;
        let lobby = HttpLobby::new(Client::new(), &base, 25, Duration::from_millis(200));

        let started = std::time::Instant::now();
        assert!(lobby.read_lobby().await.is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
