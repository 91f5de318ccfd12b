//! Expected-value estimator.
//!
//! Maps a checkpoint (payout so far, cells scratched) to the player's
//! expected total if they play on. The continuation bonus per checkpoint is
//! fixed by the contract's payout table.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{ExpectedValueResult, HouseError};

/// EV of playing rounds 2 and 3 (after 3 cells).
pub const ROUNDS_TWO_AND_THREE_EV: Decimal = dec!(0.61);
/// EV of playing round 3 (after 6 cells).
pub const ROUND_THREE_EV: Decimal = dec!(0.60);

pub const CELLS_PER_ROUND: u32 = 3;
pub const TOTAL_ROUNDS: u32 = 3;

/// Continuation bonus for the given checkpoint.
pub fn ev_bonus(cells_scratched: u32) -> Result<Decimal, HouseError> {
    match cells_scratched {
        3 => Ok(ROUNDS_TWO_AND_THREE_EV),
        6 => Ok(ROUND_THREE_EV),
        9 => Ok(Decimal::ZERO),
        _ => Err(HouseError::InvalidGameState { cells_scratched }),
    }
}

/// Expected total value if the player continues to the end of the game.
///
/// Fails with `InvalidGameState` unless `cells_scratched` is 3, 6 or 9.
/// No rounding is applied; that happens at the offer stage.
pub fn calculate_expected_value(
    current_payout: Decimal,
    cells_scratched: u32,
) -> Result<ExpectedValueResult, HouseError> {
    let bonus = ev_bonus(cells_scratched)?;
    let remaining_rounds = TOTAL_ROUNDS - cells_scratched / CELLS_PER_ROUND;

    Ok(ExpectedValueResult {
        current_payout,
        expected_value: current_payout + bonus,
        remaining_rounds,
        cells_scratched,
    })
}

/// Cells scratched once `round` has been revealed.
pub fn cells_for_round(round: u32) -> Result<u32, HouseError> {
    if !(1..=TOTAL_ROUNDS).contains(&round) {
        return Err(HouseError::InvalidRound(round));
    }
    Ok(round * CELLS_PER_ROUND)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
