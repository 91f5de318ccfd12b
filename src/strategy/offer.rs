//! House offer generation.
//!
//! Prices a buy-out offer as a random percentage of the player's expected
//! value. High-EV games get a conservative band; everything else gets a
//! wider band that can exceed EV. The random draw comes from an injected
//! `OfferSampler` so pricing stays deterministic under test.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::debug;

use super::expected_value::calculate_expected_value;
use super::sampler::{EntropySampler, OfferSampler};
use crate::types::{GameProgressSnapshot, HouseError, HouseProposal, OfferStrategy, ProposalAnalysis};

// ---------------------------------------------------------------------------
// Configuration (defaults, overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

pub const HIGH_EV_THRESHOLD: Decimal = dec!(0.98);
pub const HIGH_EV_MIN_PERCENT: Decimal = dec!(70);
pub const HIGH_EV_MAX_PERCENT: Decimal = dec!(90);
pub const NORMAL_EV_MIN_PERCENT: Decimal = dec!(80);
pub const NORMAL_EV_MAX_PERCENT: Decimal = dec!(120);

/// Inclusive percentage range an offer is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentBand {
    pub min: Decimal,
    pub max: Decimal,
}

impl PercentBand {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Point at fraction `u` along the band. `u` is clamped to [0, 1].
    pub fn at(&self, u: Decimal) -> Decimal {
        let u = u.clamp(Decimal::ZERO, Decimal::ONE);
        (self.min + (self.max - self.min) * u).normalize()
    }

    pub fn contains(&self, pct: Decimal) -> bool {
        pct >= self.min && pct <= self.max
    }
}

/// Pricing thresholds and bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationConfig {
    /// EV strictly above this selects the conservative band.
    pub high_ev_threshold: Decimal,
    pub high_ev_band: PercentBand,
    pub normal_ev_band: PercentBand,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            high_ev_threshold: HIGH_EV_THRESHOLD,
            high_ev_band: PercentBand::new(HIGH_EV_MIN_PERCENT, HIGH_EV_MAX_PERCENT),
            normal_ev_band: PercentBand::new(NORMAL_EV_MIN_PERCENT, NORMAL_EV_MAX_PERCENT),
        }
    }
}

impl NegotiationConfig {
    /// Strategy and band for a given player EV.
    pub fn band_for(&self, player_ev: Decimal) -> (OfferStrategy, PercentBand) {
        if player_ev > self.high_ev_threshold {
            (OfferStrategy::HighEvConservative, self.high_ev_band)
        } else {
            (OfferStrategy::NormalEvVariable, self.normal_ev_band)
        }
    }

    /// Reject inverted or negative bands.
    pub fn validate(&self) -> Result<(), HouseError> {
        for (name, band) in [("high_ev", self.high_ev_band), ("normal_ev", self.normal_ev_band)] {
            if band.min.is_sign_negative() || band.min > band.max {
                return Err(HouseError::Config(format!(
                    "{name} band must satisfy 0 <= min <= max (got {}..{})",
                    band.min, band.max
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Offer generator
// ---------------------------------------------------------------------------

/// Generates strategy-labelled buy-out offers.
pub struct OfferGenerator<S = EntropySampler> {
    config: NegotiationConfig,
    sampler: S,
}

impl OfferGenerator<EntropySampler> {
    /// Default bands with the thread-local entropy source.
    pub fn with_entropy(config: NegotiationConfig) -> Self {
        Self::new(config, EntropySampler)
    }
}

impl<S: OfferSampler> OfferGenerator<S> {
    pub fn new(config: NegotiationConfig, sampler: S) -> Self {
        Self { config, sampler }
    }

    /// Access the negotiation configuration.
    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    /// Price an offer for the given checkpoint.
    ///
    /// Fails with `InvalidGameState` if `cells_scratched` is not 3, 6 or 9.
    pub fn generate(
        &self,
        current_payout: Decimal,
        cells_scratched: u32,
    ) -> Result<HouseProposal, HouseError> {
        let ev = calculate_expected_value(current_payout, cells_scratched)?;
        let player_ev = ev.expected_value;

        let (strategy, band) = self.config.band_for(player_ev);
        let offer_percentage = band.at(self.sampler.unit_fraction());
        let offer = round_to_cents(player_ev * offer_percentage / dec!(100));

        let threshold = self.config.high_ev_threshold;
        let reasoning = match strategy {
            OfferStrategy::HighEvConservative => format!(
                "High EV (>{threshold}) detected. Conservative offer at {offer_percentage:.2}% of EV."
            ),
            OfferStrategy::NormalEvVariable => format!(
                "Normal EV (<={threshold}). Variable offer at {offer_percentage:.2}% of EV."
            ),
        };

        debug!(
            cells_scratched,
            player_ev = %player_ev,
            pct = %format!("{:.2}%", offer_percentage),
            strategy = %strategy,
            offer = %format!("${:.2}", offer),
            "Offer priced"
        );

        Ok(HouseProposal {
            offer,
            player_ev,
            offer_percentage,
            strategy,
            reasoning,
        })
    }

    /// Price an offer for a validated snapshot.
    pub fn generate_for(&self, snapshot: &GameProgressSnapshot) -> Result<HouseProposal, HouseError> {
        self.generate(snapshot.current_payout, snapshot.cells_scratched)
    }
}

/// One-shot pricing with default bands and OS entropy.
pub fn generate_house_proposal(
    current_payout: Decimal,
    cells_scratched: u32,
) -> Result<HouseProposal, HouseError> {
    OfferGenerator::with_entropy(NegotiationConfig::default()).generate(current_payout, cells_scratched)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Round to whole cents, ties away from zero.
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Offer floor for a round. Unknown rounds get the round-1 floor.
pub fn get_minimum_offer(round: u32) -> Decimal {
    match round {
        1 => dec!(0.50),
        2 => dec!(1.00),
        3 => dec!(1.50),
        _ => dec!(0.50),
    }
}

/// Sanity check used before submitting an offer. Advisory only.
pub fn is_reasonable_offer(offer: Decimal, current_payout: Decimal, round: u32) -> bool {
    if offer < get_minimum_offer(round) {
        return false;
    }
    if current_payout > Decimal::ZERO && offer < current_payout * dec!(0.5) {
        return false;
    }
    true
}

/// Whether the offer beats the player's EV, and by how much.
pub fn analyze_proposal(proposal: &HouseProposal) -> ProposalAnalysis {
    let player_advantage = proposal.offer - proposal.player_ev;
    let should_accept = proposal.offer > proposal.player_ev;

    let analysis = if should_accept {
        format!("Good offer! {:.2} above EV", player_advantage)
    } else {
        format!("Below EV by {:.2}", player_advantage.abs())
    };

    ProposalAnalysis {
        should_accept,
        player_advantage,
        analysis,
    }
}

/// Short display line for a proposal.
pub fn format_proposal(proposal: &HouseProposal) -> String {
    format!("💰 House Offer: ${:.2}", proposal.offer)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
