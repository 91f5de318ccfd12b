//! Relay route handlers.
//!
//! Each write endpoint validates its body, signs the matching contract call
//! with the house key, and waits for the receipt. State is shared via
//! `Arc<RelayState>`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::ledger::{OfferLedger, OfferRecord};
use crate::chain::units;
use crate::chain::{ScratcherContract, TxOutcome};
use crate::strategy::{HouseNegotiator, NegotiationDecision};
use crate::symbols;
use crate::types::{HouseError, RoundOffers};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct RelayState {
    pub contract: Arc<dyn ScratcherContract>,
    pub negotiator: HouseNegotiator,
    pub ledger: OfferLedger,
}

impl RelayState {
    pub fn new(contract: Arc<dyn ScratcherContract>, negotiator: HouseNegotiator) -> Self {
        Self {
            contract,
            negotiator,
            ledger: OfferLedger::new(),
        }
    }
}

pub type AppState = Arc<RelayState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOfferRequest {
    pub game_id: i64,
    pub offer_amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    pub game_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRoundRequest {
    pub game_id: i64,
    pub cell_indexes: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxResponse {
    pub success: bool,
    pub hash: String,
    /// Micro-USDC amount sent on-chain (set-offer only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_amount: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOfferResponse {
    pub success: bool,
    pub hash: String,
    pub decision: NegotiationDecision,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures surfaced to relay callers as `{error, details?}` JSON.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    House(#[from] HouseError),

    #[error("Transaction failed")]
    TransactionFailed { hash: String },

    #[error("Server error: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            RelayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            RelayError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            RelayError::House(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": e.to_string() }),
            ),
            RelayError::TransactionFailed { hash } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Transaction failed", "hash": hash, "status": "reverted" }),
            ),
            RelayError::Upstream(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Server error", "details": format!("{e:#}") }),
            ),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Relay request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Relay request rejected");
        }

        (status, Json(body)).into_response()
    }
}

type RelayResult<T> = Result<Json<T>, RelayError>;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn parse_body<T>(body: Result<Json<T>, JsonRejection>, msg: &str) -> Result<T, RelayError> {
    body.map(|Json(inner)| inner)
        .map_err(|_| RelayError::BadRequest(msg.to_string()))
}

fn positive_game_id(game_id: i64, msg: &str) -> Result<u64, RelayError> {
    u64::try_from(game_id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| RelayError::BadRequest(msg.to_string()))
}

fn cell_triple(cells: &[i64], msg: &str) -> Result<[u8; 3], RelayError> {
    let bad = || RelayError::BadRequest(msg.to_string());
    if cells.len() != 3 {
        return Err(bad());
    }
    let mut out = [0u8; 3];
    for (slot, &cell) in out.iter_mut().zip(cells) {
        if !(0..9).contains(&cell) {
            return Err(bad());
        }
        *slot = cell as u8;
    }
    Ok(out)
}

fn confirmed(outcome: TxOutcome) -> Result<TxOutcome, RelayError> {
    if outcome.success {
        Ok(outcome)
    } else {
        Err(RelayError::TransactionFailed { hash: outcome.hash })
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/house/set-offer
pub async fn set_offer(
    State(state): State<AppState>,
    body: Result<Json<SetOfferRequest>, JsonRejection>,
) -> RelayResult<TxResponse> {
    const INVALID: &str = "Invalid gameId or offerAmount";
    let req = parse_body(body, INVALID)?;
    let game_id = positive_game_id(req.game_id, INVALID)?;
    if req.offer_amount <= Decimal::ZERO {
        return Err(RelayError::BadRequest(INVALID.to_string()));
    }
    // Sub-micro amounts floor to zero on-chain.
    let amount = units::to_fixed_point(req.offer_amount)?;
    if amount == 0 {
        return Err(RelayError::BadRequest(INVALID.to_string()));
    }

    let game = state.contract.get_game(game_id).await?;
    state.ledger.retire(game_id, game.state.current_round()).await;
    let outcome = confirmed(state.contract.set_house_offer(game_id, amount).await?)?;

    state
        .ledger
        .record(OfferRecord::new(
            game_id,
            game.state.current_round(),
            req.offer_amount,
            None,
            outcome.hash.clone(),
        ))
        .await;

    info!(game_id, amount = %amount, tx = %outcome.hash, "House offer set");

    Ok(Json(TxResponse {
        success: true,
        hash: outcome.hash,
        offer_amount: Some(amount.to_string()),
    }))
}

/// POST /api/house/generate-offer
///
/// Prices an offer from the game's on-chain progress and submits it.
pub async fn generate_offer(
    State(state): State<AppState>,
    body: Result<Json<GameRequest>, JsonRejection>,
) -> RelayResult<GenerateOfferResponse> {
    const INVALID: &str = "Invalid gameId";
    let req = parse_body(body, INVALID)?;
    let game_id = positive_game_id(req.game_id, INVALID)?;

    let game = state.contract.get_game(game_id).await?;
    state.ledger.retire(game_id, game.state.current_round()).await;
    let decision = state.negotiator.propose_for_game(&game)?;
    let round = decision.round;

    let revealed: Vec<&str> = game.revealed_payouts[..round as usize]
        .iter()
        .map(|&raw| symbols::symbol_for_payout(raw).glyph())
        .collect();
    debug!(game_id, round, revealed = ?revealed, "Pricing from revealed symbols");

    let already_on_chain = game
        .offered_payouts
        .get(round as usize - 1)
        .is_some_and(|raw| *raw > 0);
    if already_on_chain || !state.ledger.try_claim(game_id, round).await {
        return Err(RelayError::Conflict(format!(
            "Offer already set for game {game_id} round {round}"
        )));
    }

    let outcome = match state
        .contract
        .set_house_offer(game_id, decision.offer_fixed_point)
        .await
        .map_err(RelayError::from)
        .and_then(confirmed)
    {
        Ok(outcome) => outcome,
        Err(e) => {
            state.ledger.release(game_id, round).await;
            return Err(e);
        }
    };

    state
        .ledger
        .record(OfferRecord::new(
            game_id,
            Some(round),
            decision.proposal.offer,
            Some(decision.proposal.strategy),
            outcome.hash.clone(),
        ))
        .await;

    info!(
        game_id,
        round,
        offer = %format!("${:.2}", decision.proposal.offer),
        strategy = %decision.proposal.strategy,
        tx = %outcome.hash,
        "Generated house offer submitted"
    );

    Ok(Json(GenerateOfferResponse {
        success: true,
        hash: outcome.hash,
        decision,
    }))
}

/// POST /api/house/accept-offer
pub async fn accept_offer(
    State(state): State<AppState>,
    body: Result<Json<GameRequest>, JsonRejection>,
) -> RelayResult<TxResponse> {
    const INVALID: &str = "Invalid gameId";
    let req = parse_body(body, INVALID)?;
    let game_id = positive_game_id(req.game_id, INVALID)?;

    let outcome = confirmed(state.contract.accept_offer(game_id).await?)?;
    state.ledger.retire(game_id, None).await;
    info!(game_id, tx = %outcome.hash, "House accepted offer");

    Ok(Json(TxResponse {
        success: true,
        hash: outcome.hash,
        offer_amount: None,
    }))
}

/// POST /api/house/play-round
pub async fn play_round(
    State(state): State<AppState>,
    body: Result<Json<PlayRoundRequest>, JsonRejection>,
) -> RelayResult<TxResponse> {
    const INVALID: &str = "Invalid gameId or cellIndexes";
    let req = parse_body(body, INVALID)?;
    let game_id = positive_game_id(req.game_id, INVALID)?;
    let cells = cell_triple(&req.cell_indexes, INVALID)?;

    let outcome = confirmed(state.contract.play_round(game_id, cells).await?)?;
    info!(game_id, cells = ?cells, tx = %outcome.hash, "House played round");

    Ok(Json(TxResponse {
        success: true,
        hash: outcome.hash,
        offer_amount: None,
    }))
}

/// GET /api/games/:id/offers
pub async fn get_game_offers(
    State(state): State<AppState>,
    Path(game_id): Path<u64>,
) -> RelayResult<RoundOffers> {
    if game_id == 0 {
        return Err(RelayError::BadRequest("Invalid gameId".to_string()));
    }
    let game = state.contract.get_game(game_id).await?;
    Ok(Json(game.offers()))
}

/// GET /api/offers
pub async fn get_offers(State(state): State<AppState>) -> Json<Vec<OfferRecord>> {
    Json(state.ledger.recent().await)
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
