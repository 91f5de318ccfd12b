//! Payout tiers and their symbols.
//!
//! The contract pays one of nine fixed amounts per cell. Each amount maps
//! to exactly one tier; lookups by fixed-point amount must match a tier
//! key exactly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::chain::units;

/// Rarity class shown next to a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    UltraLegendary,
    Legendary,
    Epic,
    Rare,
    Uncommon,
    Common,
    Hole,
}

impl Rarity {
    pub fn color(&self) -> &'static str {
        match self {
            Rarity::UltraLegendary => "#ff6b9d",
            Rarity::Legendary => "#ffd700",
            Rarity::Epic => "#ff8c00",
            Rarity::Rare => "#4169e1",
            Rarity::Uncommon => "#00bfff",
            Rarity::Common => "#32cd32",
            Rarity::Hole => "#000000",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rarity::UltraLegendary => "Ultra Legendary",
            Rarity::Legendary => "Legendary",
            Rarity::Epic => "Epic",
            Rarity::Rare => "Rare",
            Rarity::Uncommon => "Uncommon",
            Rarity::Common => "Common",
            Rarity::Hole => "Hole",
        };
        write!(f, "{s}")
    }
}

/// One of the nine cell outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutTier {
    DiamondCrown,
    GoldenCrown,
    GoldTreasure,
    Trophy,
    BlueDiamond,
    Cherry,
    Star,
    Stone,
    /// Zero payout; ends the game.
    Hole,
}

/// Tiers with their cumulative roll ceilings out of 100 000, in roll order.
const ROLL_TABLE: [(u128, PayoutTier); 9] = [
    (500, PayoutTier::DiamondCrown),
    (2_000, PayoutTier::GoldenCrown),
    (5_000, PayoutTier::GoldTreasure),
    (15_000, PayoutTier::Trophy),
    (26_000, PayoutTier::BlueDiamond),
    (41_000, PayoutTier::Cherry),
    (66_000, PayoutTier::Star),
    (96_000, PayoutTier::Stone),
    (100_000, PayoutTier::Hole),
];

const ROLL_MODULUS: u128 = 100_000;

impl PayoutTier {
    pub const ALL: [PayoutTier; 9] = [
        PayoutTier::DiamondCrown,
        PayoutTier::GoldenCrown,
        PayoutTier::GoldTreasure,
        PayoutTier::Trophy,
        PayoutTier::BlueDiamond,
        PayoutTier::Cherry,
        PayoutTier::Star,
        PayoutTier::Stone,
        PayoutTier::Hole,
    ];

    /// Payout in micro-USDC (the contract's key for this tier).
    pub fn fixed_point(&self) -> u128 {
        match self {
            PayoutTier::DiamondCrown => 100_000_000,
            PayoutTier::GoldenCrown => 25_000_000,
            PayoutTier::GoldTreasure => 8_000_000,
            PayoutTier::Trophy => 2_000_000,
            PayoutTier::BlueDiamond => 1_000_000,
            PayoutTier::Cherry => 500_000,
            PayoutTier::Star => 200_000,
            PayoutTier::Stone => 100_000,
            PayoutTier::Hole => 0,
        }
    }

    pub fn payout(&self) -> Decimal {
        units::from_fixed_point(self.fixed_point())
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            PayoutTier::DiamondCrown => "💎",
            PayoutTier::GoldenCrown => "👑",
            PayoutTier::GoldTreasure => "💰",
            PayoutTier::Trophy => "🏆",
            PayoutTier::BlueDiamond => "💎",
            PayoutTier::Cherry => "🍒",
            PayoutTier::Star => "⭐",
            PayoutTier::Stone => "🗿",
            PayoutTier::Hole => "🕳️",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PayoutTier::DiamondCrown => "Diamond Crown",
            PayoutTier::GoldenCrown => "Golden Crown",
            PayoutTier::GoldTreasure => "Gold Treasure",
            PayoutTier::Trophy => "Trophy",
            PayoutTier::BlueDiamond => "Blue Diamond",
            PayoutTier::Cherry => "Cherry",
            PayoutTier::Star => "Star",
            PayoutTier::Stone => "Stone",
            PayoutTier::Hole => "Hole",
        }
    }

    pub fn rarity(&self) -> Rarity {
        match self {
            PayoutTier::DiamondCrown => Rarity::UltraLegendary,
            PayoutTier::GoldenCrown => Rarity::Legendary,
            PayoutTier::GoldTreasure => Rarity::Epic,
            PayoutTier::Trophy => Rarity::Rare,
            PayoutTier::BlueDiamond => Rarity::Uncommon,
            PayoutTier::Cherry | PayoutTier::Star | PayoutTier::Stone => Rarity::Common,
            PayoutTier::Hole => Rarity::Hole,
        }
    }

    /// Display colour for this specific symbol.
    pub fn color(&self) -> &'static str {
        match self {
            PayoutTier::DiamondCrown => "#ff6b9d",
            PayoutTier::GoldenCrown => "#ffd700",
            PayoutTier::GoldTreasure => "#ff8c00",
            PayoutTier::Trophy => "#4169e1",
            PayoutTier::BlueDiamond => "#00bfff",
            PayoutTier::Cherry => "#dc143c",
            PayoutTier::Star => "#ffa500",
            PayoutTier::Stone => "#696969",
            PayoutTier::Hole => "#000000",
        }
    }

    /// Chance of this tier per cell, out of 100 000 rolls.
    pub fn roll_weight(&self) -> u128 {
        let mut floor = 0;
        for (ceiling, tier) in ROLL_TABLE {
            if tier == *self {
                return ceiling - floor;
            }
            floor = ceiling;
        }
        0
    }

    /// Chance of this tier per cell, as a percentage.
    pub fn probability(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.roll_weight() as i128, 3)
    }

    /// Exact lookup by fixed-point payout.
    pub fn from_fixed_point(raw: u128) -> Option<PayoutTier> {
        Self::ALL.into_iter().find(|t| t.fixed_point() == raw)
    }

    /// Tier the contract assigns to a VRF value (`value % 100_000` against
    /// the cumulative roll table).
    pub fn from_random_value(value: u128) -> PayoutTier {
        let roll = value % ROLL_MODULUS;
        ROLL_TABLE
            .iter()
            .find(|(ceiling, _)| roll < *ceiling)
            .map(|(_, tier)| *tier)
            .unwrap_or(PayoutTier::Hole)
    }
}

impl fmt::Display for PayoutTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph(), self.name())
    }
}

/// Tier for a revealed cell payout.
///
/// Amounts that match no tier resolve to `Hole`. A mismatch means the
/// contract's payout table changed; it is logged, never guessed at.
pub fn symbol_for_payout(raw: u128) -> PayoutTier {
    PayoutTier::from_fixed_point(raw).unwrap_or_else(|| {
        warn!(payout = %raw, "Unknown payout amount, showing as Hole");
        PayoutTier::Hole
    })
}

/// Human-readable payout: whole dollars from $1 up, cents below.
pub fn format_payout(payout: Decimal) -> String {
    if payout.is_zero() {
        "No Prize".to_string()
    } else if payout >= Decimal::ONE {
        format!("${:.0}", payout)
    } else {
        format!("${:.2}", payout)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
