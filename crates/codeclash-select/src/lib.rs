//! Deterministic content selection and duel-code generation for Codeclash.
//!
//! The load-bearing property of this crate is *reproducibility*: for the
//! same seed and the same pool, in the same order, [`select`] returns the
//! same items in the same order — on every client, in every process, with
//! no shared state. Two consistency strategies ride on that primitive:
//!
//! - **Recompute-everywhere** ([`daily_selection`]): the seed is derived
//!   from the UTC calendar date alone, so every client independently
//!   re-derives the same daily-challenge list. The candidate pool's
//!   *order* is part of the contract, not just its contents.
//! - **Materialize-once** ([`duel_seed`]): the seed is salted with the
//!   creation time, the resulting list is written into the duel record,
//!   and nobody ever recomputes it. The stored seed is diagnostic only.
//!
//! Because determinism across processes is the contract, the generator is
//! a hand-rolled LCG with fixed constants — not `rand`, whose output may
//! change between versions. `rand` is used only for [`generate_code`],
//! where unpredictability is the point.

use chrono::{DateTime, NaiveDate, Utc};
use codeclash_model::{CODE_ALPHABET, CODE_LENGTH, DuelCode};
use rand::Rng;

// ---------------------------------------------------------------------------
// Lcg
// ---------------------------------------------------------------------------

/// Linear-congruential generator over non-negative 31-bit state.
///
/// `state = (state * 1103515245 + 12345) mod 2^31` — the classic libc
/// constants. Not a good source of randomness; a perfectly reproducible
/// one, which is all the selection contract needs.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    const MULTIPLIER: u64 = 1_103_515_245;
    const INCREMENT: u64 = 12_345;
    const MODULUS: u64 = 1 << 31;

    /// Seeds the generator. State is reduced into `[0, 2^31)`.
    pub fn new(seed: u32) -> Self {
        Self {
            state: (u64::from(seed) % Self::MODULUS) as u32,
        }
    }

    /// Advances the generator and returns the new state.
    pub fn next_u32(&mut self) -> u32 {
        self.state = ((u64::from(self.state) * Self::MULTIPLIER + Self::INCREMENT)
            % Self::MODULUS) as u32;
        self.state
    }
}

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Maps an arbitrary string to an LCG seed.
///
/// Rolling hash `h = h * 31 + byte` in wrapping 32-bit signed arithmetic,
/// absolute value of the final state. Stable across platforms and
/// releases — changing this function silently changes every daily
/// challenge, so don't.
pub fn seed_from_str(input: &str) -> u32 {
    let mut hash: i32 = 0;
    for byte in input.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(byte));
    }
    hash.unsigned_abs()
}

/// Seed for a day's challenge: derived from the UTC calendar date alone,
/// so every client agrees without coordination.
pub fn daily_seed(date: NaiveDate) -> u32 {
    seed_from_str(&date.format("%Y-%m-%d").to_string())
}

/// Seed for a duel's exercise list, salted with the creation time.
///
/// Deliberately time-dependent: the same code reused later would *not*
/// reproduce the same list. That's fine — the duel list is materialized
/// into the record at creation and never recomputed (the guest reads the
/// stored list, not the selector).
pub fn duel_seed(code: &DuelCode, created_at: DateTime<Utc>) -> u32 {
    seed_from_str(&format!("{}{}", code, created_at.timestamp()))
}

// ---------------------------------------------------------------------------
// Shuffle and selection
// ---------------------------------------------------------------------------

/// Fisher–Yates shuffle of `pool`, driven by the LCG.
///
/// Identical seed and identical pool order always yield an identical
/// permutation.
pub fn shuffle<T: Clone>(seed: u32, pool: &[T]) -> Vec<T> {
    let mut items: Vec<T> = pool.to_vec();
    let mut rng = Lcg::new(seed);
    for i in (1..items.len()).rev() {
        let j = (rng.next_u32() as usize) % (i + 1);
        items.swap(i, j);
    }
    items
}

/// The first `count` items of the seeded shuffle — the whole pool when it
/// is shorter than `count`. Callers that need an exact length validate
/// their pool up front.
pub fn select<T: Clone>(seed: u32, pool: &[T], count: usize) -> Vec<T> {
    let mut items = shuffle(seed, pool);
    items.truncate(count);
    items
}

/// Recompute-everywhere strategy: the `count` items every client derives
/// for `date`, given an identical, identically-ordered pool.
pub fn daily_selection<T: Clone>(date: NaiveDate, pool: &[T], count: usize) -> Vec<T> {
    let seed = daily_seed(date);
    tracing::debug!(%date, seed, "derived daily selection seed");
    select(seed, pool, count)
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

/// Draws a 6-character duel code uniformly from the code alphabet.
///
/// No uniqueness probing here — the creator treats an existing-key error
/// from the store as a retryable collision (astronomically rare at
/// 32^6 ≈ 10^9 codes).
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> DuelCode {
    let code: String = (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    DuelCode::parse(code).expect("drawn from the code alphabet")
}

// =========================================================================
// Tests
// =========================================================================
