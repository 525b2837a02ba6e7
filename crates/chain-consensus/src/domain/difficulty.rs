//! ASERT-style difficulty retarget.
//!
//! Unlike the Dark Gravity Wave / epoch-window adjusters this is modeled
//! on, ASERT needs no sliding window of recent blocks: the next
//! difficulty is a pure function of one anchor block and the height/time
//! elapsed since it, which is what keeps `BlockValidator` (C4) stateless
//! beyond its per-batch `context_map`.
//!
//! `difficulty` here follows the convention used throughout this crate:
//! higher means harder (the inverse of a PoW "target ceiling"). The
//! exponential moving target is computed in the usual target-ceiling
//! domain and then inverted, so the public API never leaks that detail.

use chain_types::{Difficulty, TimestampMs};
use primitive_types::U256;

/// Network parameters that make height -> difficulty a pure function,
/// loaded once from the genesis document (see `chain-node`'s config
/// layer) and passed by reference everywhere difficulty is computed.
#[derive(Clone, Debug)]
pub struct DifficultyParams {
    /// Desired average seconds between blocks.
    pub target_mining_time_secs: u64,
    /// Seconds over which a 2x deviation from target fully corrects;
    /// smaller halves react faster but tolerate more variance.
    pub half_life_secs: u64,
    /// Hard floor; the retarget never produces anything below this.
    pub minimum_difficulty: Difficulty,
}

impl DifficultyParams {
    pub fn new(target_mining_time_secs: u64, half_life_secs: u64, minimum_difficulty: Difficulty) -> Self {
        Self {
            target_mining_time_secs,
            half_life_secs,
            minimum_difficulty,
        }
    }
}

/// The single anchor block ASERT retargets against: some ancestor whose
/// height and timestamp are known, plus its difficulty.
#[derive(Clone, Copy, Debug)]
pub struct DifficultyAnchor {
    pub height: u64,
    pub timestamp: TimestampMs,
    pub difficulty: Difficulty,
}

/// Computes `next_difficulty` as a pure function of `(params, anchor, height, timestamp)`.
pub struct DifficultyAdjuster {
    params: DifficultyParams,
}

impl DifficultyAdjuster {
    pub fn new(params: DifficultyParams) -> Self {
        Self { params }
    }

    /// Difficulty required of the block at `height` with timestamp
    /// `timestamp`, retargeted from `anchor`.
    pub fn next_difficulty(&self, anchor: &DifficultyAnchor, height: u64, timestamp: TimestampMs) -> Difficulty {
        let height_diff = height.saturating_sub(anchor.height) as i64;
        let time_diff_ms = timestamp as i64 - anchor.timestamp as i64;
        let time_diff_secs = time_diff_ms / 1000;

        let ideal_elapsed = height_diff * self.params.target_mining_time_secs as i64;
        let deviation_secs = time_diff_secs - ideal_elapsed;

        // target = anchor_target * 2^(deviation_secs / half_life_secs), computed in the
        // target-ceiling domain so doubling deviation doubles the target (easier),
        // then inverted back to the difficulty domain the rest of this crate uses.
        let anchor_target = difficulty_to_target(anchor.difficulty);
        let scaled_target = asert_exp2(anchor_target, deviation_secs, self.params.half_life_secs as i64);

        let next = target_to_difficulty(scaled_target);
        next.max(self.params.minimum_difficulty)
    }
}

/// `MAX_TARGET` such that `difficulty = MAX_TARGET / target` and back.
/// `U256::MAX` would overflow on invert, so an all-but-top-bit ceiling is
/// used instead; concrete value doesn't matter beyond being fixed.
fn max_target() -> U256 {
    U256::MAX >> 1
}

fn difficulty_to_target(difficulty: Difficulty) -> U256 {
    if difficulty.is_zero() {
        return max_target();
    }
    max_target() / difficulty
}

fn target_to_difficulty(target: U256) -> Difficulty {
    if target.is_zero() {
        return U256::MAX;
    }
    max_target() / target
}

/// `base * 2^(numerator / denominator)`, `numerator` possibly negative,
/// via the same shift-plus-cubic-interpolation trick real ASERT
/// implementations use to avoid floating point: split the exponent into
/// an integer shift and a fractional remainder in `[0, 1)`, then
/// approximate `2^frac` with a fixed-point cubic fit good to within
/// 0.1% over the unit interval.
fn asert_exp2(base: U256, numerator: i64, denominator: i64) -> U256 {
    if denominator == 0 || base.is_zero() {
        return base;
    }

    let shifts = numerator.div_euclid(denominator);
    let remainder = numerator.rem_euclid(denominator);
    // frac in [0, 65536) represents the fractional exponent scaled by 2^16.
    let frac = ((remainder as i128) * 65536 / denominator as i128) as i64;

    // 2^(frac/65536) ~= 1 + c1*frac + c2*frac^2 + c3*frac^3, all fixed-point
    // Q16 coefficients taken from the well-known ASERT-3 polynomial fit.
    let frac = frac as i128;
    let cubic = 195_766_423_245_049i128 * frac
        + 971_821_376i128 * frac * frac
        + 5_127i128 * frac * frac * frac
        + (1i128 << 47);
    let poly = 65536i128 + (cubic >> 48);

    let scaled = shift_u256(base, shifts);
    mul_by_q16(scaled, poly)
}

fn shift_u256(value: U256, shifts: i64) -> U256 {
    if shifts >= 0 {
        let shifts = shifts.min(255) as usize;
        value << shifts
    } else {
        let shifts = (-shifts).min(255) as usize;
        value >> shifts
    }
}

/// `value * (q16 / 65536)`, splitting the multiply to stay within U256.
fn mul_by_q16(value: U256, q16: i128) -> U256 {
    let q16 = U256::from(q16.max(0) as u128);
    let (product, overflowed) = value.overflowing_mul(q16);
    if overflowed {
        // Divide first, at some precision cost, rather than panicking on
        // a difficulty this large.
        (value / U256::from(65536u32)).saturating_mul(q16)
    } else {
        product / U256::from(65536u32)
    }
}
