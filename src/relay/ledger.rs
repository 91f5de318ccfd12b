//! Per-service record of offers the house has submitted.
//!
//! Guards against submitting two offers for the same game round when
//! requests race, and backs the `/api/offers` feed. Only the latest
//! `RECENT_LIMIT` records are kept; claims are retired once a game has moved
//! past the claimed round.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::OfferStrategy;

/// Maximum records retained.
pub const RECENT_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRecord {
    pub id: Uuid,
    pub game_id: u64,
    pub round: Option<u32>,
    pub offer: Decimal,
    /// `None` for manually priced offers.
    pub strategy: Option<OfferStrategy>,
    pub hash: String,
    pub timestamp: DateTime<Utc>,
}

impl OfferRecord {
    pub fn new(
        game_id: u64,
        round: Option<u32>,
        offer: Decimal,
        strategy: Option<OfferStrategy>,
        hash: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            game_id,
            round,
            offer,
            strategy,
            hash,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    records: VecDeque<OfferRecord>,
    /// (game, round) pairs that are submitted or being submitted.
    claimed: HashSet<(u64, u32)>,
}

#[derive(Debug, Default)]
pub struct OfferLedger {
    inner: RwLock<LedgerInner>,
}

impl OfferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a game round for submission. Returns `false` if it was
    /// already claimed.
    pub async fn try_claim(&self, game_id: u64, round: u32) -> bool {
        self.inner.write().await.claimed.insert((game_id, round))
    }

    /// Give back a claim after a failed submission.
    pub async fn release(&self, game_id: u64, round: u32) {
        self.inner.write().await.claimed.remove(&(game_id, round));
    }

    pub async fn is_claimed(&self, game_id: u64, round: u32) -> bool {
        self.inner.read().await.claimed.contains(&(game_id, round))
    }

    /// Drop a game's claims for rounds before `current_round`, or all of
    /// them once the game is over (`None`).
    pub async fn retire(&self, game_id: u64, current_round: Option<u32>) {
        let mut inner = self.inner.write().await;
        inner.claimed.retain(|&(game, round)| {
            game != game_id || current_round.is_some_and(|current| round >= current)
        });
    }

    pub async fn claim_count(&self) -> usize {
        self.inner.read().await.claimed.len()
    }

    /// Store a submitted offer. Rounded offers also claim their round.
    pub async fn record(&self, record: OfferRecord) {
        let mut inner = self.inner.write().await;
        if let Some(round) = record.round {
            inner.claimed.insert((record.game_id, round));
        }
        inner.records.push_back(record);
        while inner.records.len() > RECENT_LIMIT {
            inner.records.pop_front();
        }
    }

    /// Retained records, oldest first.
    pub async fn recent(&self) -> Vec<OfferRecord> {
        self.inner.read().await.records.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
