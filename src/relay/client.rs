//! HTTP client for a running relay.
//!
//! Used by game backends that hold no key of their own: they ask the relay
//! to sign house transactions on their behalf.

use anyhow::{Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::types::RoundOffers;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Confirmation returned by the relay's write endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReceipt {
    pub success: bool,
    pub hash: String,
    #[serde(default)]
    pub offer_amount: Option<String>,
}

/// Error body the relay returns on failure.
#[derive(Debug, Default, Deserialize)]
struct RelayErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hash: Option<String>,
}

pub struct RelayClient {
    http: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("scratcher-house/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn health(&self) -> Result<bool> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("Relay health check failed")?;
        Ok(resp.status().is_success())
    }

    pub async fn set_offer(&self, game_id: u64, offer_amount: Decimal) -> Result<RelayReceipt> {
        self.post(
            "/api/house/set-offer",
            json!({ "gameId": game_id, "offerAmount": offer_amount }),
        )
        .await
    }

    /// Have the relay price and submit an offer for the game's current round.
    pub async fn generate_offer(&self, game_id: u64) -> Result<RelayReceipt> {
        self.post("/api/house/generate-offer", json!({ "gameId": game_id }))
            .await
    }

    pub async fn accept_offer(&self, game_id: u64) -> Result<RelayReceipt> {
        self.post("/api/house/accept-offer", json!({ "gameId": game_id }))
            .await
    }

    pub async fn play_round(&self, game_id: u64, cells: [u8; 3]) -> Result<RelayReceipt> {
        self.post(
            "/api/house/play-round",
            json!({ "gameId": game_id, "cellIndexes": cells }),
        )
        .await
    }

    pub async fn game_offers(&self, game_id: u64) -> Result<RoundOffers> {
        let resp = self
            .http
            .get(format!("{}/api/games/{game_id}/offers", self.base_url))
            .send()
            .await
            .context("Failed to reach relay")?;
        Self::decode(resp, "game offers").await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: B) -> Result<T> {
        debug!(path, "Relay request");
        let resp = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach relay at {path}"))?;
        Self::decode(resp, path).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response, what: &str) -> Result<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body: RelayErrorBody = resp.json().await.unwrap_or_default();
            let mut msg = body.error.unwrap_or_else(|| "unknown error".to_string());
            if let Some(details) = body.details {
                msg = format!("{msg}: {details}");
            }
            if let Some(hash) = body.hash {
                msg = format!("{msg} (tx {hash})");
            }
            anyhow::bail!("Relay {what} returned {status}: {msg}");
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse relay {what} response"))
    }
}
