//! Deterministic random source for dice rolls.
//!
//! A 32-bit linear congruential generator:
//! `state' = (1664525 * state + 1013904223) mod 2^32`.
//!
//! Two sources built from the same seed and driven by the same call sequence
//! produce identical outputs. The draw counter is part of the serialized
//! state so a restored match continues bit-exactly.

// The float-to-int conversions here are the documented rounding rule.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use serde::{Deserialize, Serialize};

/// LCG multiplier.
const MULTIPLIER: u32 = 1_664_525;

/// LCG increment.
const INCREMENT: u32 = 1_013_904_223;

/// 2^32 as a float, the divisor mapping a state into `[0, 1)`.
const MODULUS: f64 = 4_294_967_296.0;

/// Source of die rolls consumed by combat resolution.
///
/// [`RandomSource`] is the production implementation; tests can script rolls.
pub trait Dice {
    /// Roll a die with `faces` sides, returning a value in `1..=faces`.
    fn roll_dice(&mut self, faces: u32) -> u32;
}

/// Seeded deterministic generator.
///
/// Not `Copy`: a silent copy would fork the match's dice stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_copy_implementations)]
pub struct RandomSource {
    /// Seed the generator was created with.
    seed: u32,
    /// Current recurrence value.
    state: u32,
    /// Number of values drawn so far.
    draws: u64,
}

impl RandomSource {
    /// Create a generator from a match seed.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self {
            seed,
            state: seed,
            draws: 0,
        }
    }

    /// The seed this generator started from.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Number of values drawn since construction.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    /// Advance the recurrence and return a value in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        self.draws += 1;
        f64::from(self.state) / MODULUS
    }

    /// Inclusive integer in `[min, max]`: `floor(random() * (max - min + 1)) + min`.
    pub fn random_int(&mut self, min: i64, max: i64) -> i64 {
        let span = (max - min + 1) as f64;
        (self.random() * span).floor() as i64 + min
    }
}

impl Dice for RandomSource {
    fn roll_dice(&mut self, faces: u32) -> u32 {
        self.random_int(1, i64::from(faces)) as u32
    }
}
