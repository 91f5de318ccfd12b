//! Shared types for the house negotiation service.
//!
//! These types form the data model used across all modules. The pricing
//! records (`GameProgressSnapshot`, `ExpectedValueResult`, `HouseProposal`)
//! are plain immutable values; `GameState` and `GameView` mirror what the
//! scratcher contract reports through `getGame`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::units;

// ---------------------------------------------------------------------------
// Game progress
// ---------------------------------------------------------------------------

/// Accumulated winnings and completed-cell count at a negotiation checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProgressSnapshot {
    /// Total payout revealed so far, in USDC.
    pub current_payout: Decimal,
    /// Cells scratched: 3, 6 or 9.
    pub cells_scratched: u32,
}

impl GameProgressSnapshot {
    /// Build a snapshot, rejecting anything that is not a round boundary.
    pub fn new(current_payout: Decimal, cells_scratched: u32) -> Result<Self, HouseError> {
        if !matches!(cells_scratched, 3 | 6 | 9) {
            return Err(HouseError::InvalidGameState { cells_scratched });
        }
        if current_payout.is_sign_negative() && !current_payout.is_zero() {
            return Err(HouseError::InvalidAmount(format!(
                "payout cannot be negative: {current_payout}"
            )));
        }
        Ok(Self {
            current_payout,
            cells_scratched,
        })
    }

    /// Round (1–3) that has just completed.
    pub fn round(&self) -> u32 {
        self.cells_scratched / 3
    }
}

impl fmt::Display for GameProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "round {} ({} cells) payout=${:.2}",
            self.round(),
            self.cells_scratched,
            self.current_payout,
        )
    }
}

/// Expected continuation value at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedValueResult {
    pub current_payout: Decimal,
    pub expected_value: Decimal,
    /// Rounds still to play (0–2).
    pub remaining_rounds: u32,
    pub cells_scratched: u32,
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

/// Pricing band the house used for an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStrategy {
    /// Player EV above the threshold: offer 70–90% of EV.
    HighEvConservative,
    /// Player EV at or below the threshold: offer 80–120% of EV.
    NormalEvVariable,
}

impl fmt::Display for OfferStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferStrategy::HighEvConservative => write!(f, "HIGH_EV_CONSERVATIVE"),
            OfferStrategy::NormalEvVariable => write!(f, "NORMAL_EV_VARIABLE"),
        }
    }
}

/// A house buy-out offer. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseProposal {
    /// Offer in USDC, rounded to the cent.
    pub offer: Decimal,
    #[serde(rename = "playerEV")]
    pub player_ev: Decimal,
    /// Percentage of EV offered (e.g. 84.5 for 84.5%).
    pub offer_percentage: Decimal,
    pub strategy: OfferStrategy,
    pub reasoning: String,
}

impl fmt::Display for HouseProposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} offer ${:.2} ({:.2}% of EV ${:.2})",
            self.strategy, self.offer, self.offer_percentage, self.player_ev,
        )
    }
}

/// Diagnostic view of a proposal from the player's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalAnalysis {
    pub should_accept: bool,
    pub player_advantage: Decimal,
    pub analysis: String,
}

// ---------------------------------------------------------------------------
// On-chain game view
// ---------------------------------------------------------------------------

/// The scratcher contract's game state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    AwaitingRandomnessRound1,
    Round1Negotiation,
    AwaitingRandomnessRound2,
    Round2Negotiation,
    AwaitingRandomnessRound3,
    Round3Negotiation,
    Finished,
    FinishedByHole,
}

impl GameState {
    /// Round in progress, or `None` once the game is over.
    pub fn current_round(&self) -> Option<u32> {
        match self {
            GameState::AwaitingRandomnessRound1 | GameState::Round1Negotiation => Some(1),
            GameState::AwaitingRandomnessRound2 | GameState::Round2Negotiation => Some(2),
            GameState::AwaitingRandomnessRound3 | GameState::Round3Negotiation => Some(3),
            GameState::Finished | GameState::FinishedByHole => None,
        }
    }

    pub fn is_awaiting_vrf(&self) -> bool {
        matches!(
            self,
            GameState::AwaitingRandomnessRound1
                | GameState::AwaitingRandomnessRound2
                | GameState::AwaitingRandomnessRound3
        )
    }

    pub fn is_in_negotiation(&self) -> bool {
        matches!(
            self,
            GameState::Round1Negotiation
                | GameState::Round2Negotiation
                | GameState::Round3Negotiation
        )
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, GameState::Finished | GameState::FinishedByHole)
    }
}

impl TryFrom<u8> for GameState {
    type Error = HouseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameState::AwaitingRandomnessRound1),
            1 => Ok(GameState::Round1Negotiation),
            2 => Ok(GameState::AwaitingRandomnessRound2),
            3 => Ok(GameState::Round2Negotiation),
            4 => Ok(GameState::AwaitingRandomnessRound3),
            5 => Ok(GameState::Round3Negotiation),
            6 => Ok(GameState::Finished),
            7 => Ok(GameState::FinishedByHole),
            other => Err(HouseError::UnknownState(other)),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameState::AwaitingRandomnessRound1 => "AwaitingRandomnessRound1",
            GameState::Round1Negotiation => "Round1Negotiation",
            GameState::AwaitingRandomnessRound2 => "AwaitingRandomnessRound2",
            GameState::Round2Negotiation => "Round2Negotiation",
            GameState::AwaitingRandomnessRound3 => "AwaitingRandomnessRound3",
            GameState::Round3Negotiation => "Round3Negotiation",
            GameState::Finished => "Finished",
            GameState::FinishedByHole => "FinishedByHole",
        };
        write!(f, "{s}")
    }
}

/// Decoded `getGame` result. Amounts are 6-decimal fixed-point integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: u64,
    /// Player address, 0x-prefixed hex.
    pub player: String,
    pub state: GameState,
    pub chosen_cells: [u8; 9],
    pub revealed_payouts: [u128; 3],
    pub offered_payouts: [u128; 3],
    pub hole_found: bool,
    pub cell_payouts: [u128; 9],
}

/// Per-round house offers in USDC; `None` where no offer was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOffers {
    pub round1: Option<Decimal>,
    pub round2: Option<Decimal>,
    pub round3: Option<Decimal>,
}

impl GameView {
    /// Sum of revealed payouts across all rounds, in USDC.
    ///
    /// Fails with `InvalidAmount` if the total does not fit in a `Decimal`.
    pub fn total_revealed(&self) -> Result<Decimal, HouseError> {
        self.revealed_payouts
            .iter()
            .try_fold(Decimal::ZERO, |acc, &raw| {
                acc.checked_add(units::from_fixed_point(raw))
            })
            .ok_or_else(|| {
                HouseError::InvalidAmount(format!(
                    "revealed payouts overflow: {:?}",
                    self.revealed_payouts
                ))
            })
    }

    /// Progress snapshot for the negotiation window the game is in.
    pub fn progress(&self) -> Result<GameProgressSnapshot, HouseError> {
        if !self.state.is_in_negotiation() {
            return Err(HouseError::NotNegotiating(self.state.to_string()));
        }
        let round = self
            .state
            .current_round()
            .ok_or_else(|| HouseError::NotNegotiating(self.state.to_string()))?;
        GameProgressSnapshot::new(self.total_revealed()?, round * 3)
    }

    /// Offers already recorded on-chain.
    pub fn offers(&self) -> RoundOffers {
        let pick = |raw: u128| (raw > 0).then(|| units::from_fixed_point(raw));
        RoundOffers {
            round1: pick(self.offered_payouts[0]),
            round2: pick(self.offered_payouts[1]),
            round3: pick(self.offered_payouts[2]),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific errors for pricing and the chain boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HouseError {
    #[error("Invalid number of cells scratched: {cells_scratched}. Must be 3, 6, or 9.")]
    InvalidGameState { cells_scratched: u32 },

    #[error("Invalid round: {0}. Must be 1, 2, or 3.")]
    InvalidRound(u32),

    #[error("Game is not in a negotiation window (state: {0})")]
    NotNegotiating(String),

    #[error("Unknown contract game state: {0}")]
    UnknownState(u8),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid house key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
