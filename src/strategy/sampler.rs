//! Random sources for the offer percentage.
//!
//! The generator asks for a unit fraction in [0, 1] and maps it onto the
//! active percentage band. Production wiring uses `EntropySampler`; tests
//! and simulations inject a fixed or seeded source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::sync::Mutex;

/// Resolution of a draw: fractions are multiples of 10^-6.
const UNIT_STEPS: i64 = 1_000_000;
const UNIT_SCALE: u32 = 6;

/// Source of uniform draws in [0, 1] (inclusive at both ends).
pub trait OfferSampler: Send + Sync {
    fn unit_fraction(&self) -> Decimal;
}

impl<S: OfferSampler + ?Sized> OfferSampler for Box<S> {
    fn unit_fraction(&self) -> Decimal {
        (**self).unit_fraction()
    }
}

fn draw<R: Rng>(rng: &mut R) -> Decimal {
    Decimal::new(rng.gen_range(0..=UNIT_STEPS), UNIT_SCALE)
}

/// OS-seeded thread-local RNG. Safe to share across threads: every call
/// uses the calling thread's own generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropySampler;

impl OfferSampler for EntropySampler {
    fn unit_fraction(&self) -> Decimal {
        draw(&mut rand::thread_rng())
    }
}

/// Reproducible sequence for simulations. Not for production offers.
#[derive(Debug)]
pub struct SeededSampler {
    rng: Mutex<StdRng>,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl OfferSampler for SeededSampler {
    fn unit_fraction(&self) -> Decimal {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        draw(&mut *rng)
    }
}

/// Always returns the same fraction.
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler(pub Decimal);

impl OfferSampler for FixedSampler {
    fn unit_fraction(&self) -> Decimal {
        self.0
    }
}
