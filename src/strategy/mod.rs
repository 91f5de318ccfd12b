//! Strategy engine: expected value, offer pricing, and the negotiation
//! adapter that sits between the contract view and the pricing core.

pub mod expected_value;
pub mod offer;
pub mod sampler;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::chain::units;
use crate::types::{GameView, HouseError, HouseProposal, ProposalAnalysis};
use expected_value::cells_for_round;
use offer::{analyze_proposal, get_minimum_offer, is_reasonable_offer, NegotiationConfig, OfferGenerator};
use sampler::{EntropySampler, OfferSampler};

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// A priced offer plus everything the relay needs to submit it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationDecision {
    pub round: u32,
    pub current_payout: Decimal,
    pub proposal: HouseProposal,
    /// Result of the advisory floor check.
    pub reasonable: bool,
    pub analysis: ProposalAnalysis,
    /// Offer in micro-USDC, as it will be sent on-chain.
    #[serde(serialize_with = "serialize_u128_as_string")]
    pub offer_fixed_point: u128,
}

fn serialize_u128_as_string<S: serde::Serializer>(v: &u128, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&v.to_string())
}

// ---------------------------------------------------------------------------
// Negotiator
// ---------------------------------------------------------------------------

/// Turns a game checkpoint into a submit-ready house offer.
///
/// The floor check (`is_reasonable_offer`) is logged but never blocks an
/// offer; the pricing bands are the policy.
pub struct HouseNegotiator {
    generator: OfferGenerator<Box<dyn OfferSampler>>,
}

impl HouseNegotiator {
    pub fn new(generator: OfferGenerator<Box<dyn OfferSampler>>) -> Self {
        Self { generator }
    }

    /// Negotiator with the production entropy source.
    pub fn with_config(config: NegotiationConfig) -> Self {
        Self::with_sampler(config, EntropySampler)
    }

    pub fn with_sampler<S: OfferSampler + 'static>(config: NegotiationConfig, sampler: S) -> Self {
        let sampler: Box<dyn OfferSampler> = Box::new(sampler);
        Self::new(OfferGenerator::new(config, sampler))
    }

    pub fn config(&self) -> &NegotiationConfig {
        self.generator.config()
    }

    /// Price an offer after `round` (1–3) has been revealed.
    pub fn propose_for_round(
        &self,
        current_payout: Decimal,
        round: u32,
    ) -> Result<NegotiationDecision, HouseError> {
        let cells = cells_for_round(round)?;
        let proposal = self.generator.generate(current_payout, cells)?;
        let reasonable = is_reasonable_offer(proposal.offer, current_payout, round);
        let analysis = analyze_proposal(&proposal);
        let offer_fixed_point = units::to_fixed_point(proposal.offer)?;

        if reasonable {
            info!(
                round,
                payout = %format!("${:.2}", current_payout),
                offer = %format!("${:.2}", proposal.offer),
                strategy = %proposal.strategy,
                "House offer proposed"
            );
        } else {
            warn!(
                round,
                payout = %format!("${:.2}", current_payout),
                offer = %format!("${:.2}", proposal.offer),
                floor = %format!("${:.2}", get_minimum_offer(round)),
                strategy = %proposal.strategy,
                "House offer below sanity floor"
            );
        }

        Ok(NegotiationDecision {
            round,
            current_payout,
            proposal,
            reasonable,
            analysis,
            offer_fixed_point,
        })
    }

    /// Price an offer for a game currently in a negotiation window.
    pub fn propose_for_game(&self, game: &GameView) -> Result<NegotiationDecision, HouseError> {
        let progress = game.progress()?;
        self.propose_for_round(progress.current_payout, progress.round())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
