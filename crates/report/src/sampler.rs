//! Value sampler: unique, range-bounded, gap-separated values.
//!
//! Sampling works on an integer grid at the requested precision (grid unit
//! `10^-decimals`), so "equal at the configured precision" is integer
//! equality and every emitted value is a grid point inside the range.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::grade::{GradeKind, GradeSpec, ValueRange, STRENGTHS_PER_AGE, WEIGHTS_PER_ROW};

/// Random draws tried before falling back to nudging.
pub const MAX_ATTEMPTS: usize = 2000;

/// Absorbs binary representation error when mapping decimals onto the grid
const GRID_EPSILON: f64 = 1e-6;

fn scale_for(decimals: u32) -> f64 {
    10f64.powi(decimals as i32)
}

/// Inclusive grid bounds of `range`, or None if no grid point lies inside it.
pub(crate) fn grid_bounds(range: ValueRange, decimals: u32) -> Option<(i64, i64)> {
    let scale = scale_for(decimals);
    let lo = (range.min * scale - GRID_EPSILON).ceil() as i64;
    let hi = (range.max * scale + GRID_EPSILON).floor() as i64;
    (lo <= hi).then_some((lo, hi))
}

fn gap_units(min_gap: f64, decimals: u32) -> i64 {
    ((min_gap * scale_for(decimals) - GRID_EPSILON).ceil() as i64).max(0)
}

/// How many values `range` can hold at `decimals` precision with every pair
/// at least `min_gap` apart.
pub fn grid_capacity(range: ValueRange, decimals: u32, min_gap: f64) -> usize {
    if !range.is_valid() {
        return 0;
    }
    match grid_bounds(range, decimals) {
        Some((lo, hi)) => ((hi - lo) / gap_units(min_gap, decimals).max(1)) as usize + 1,
        None => 0,
    }
}

/// Draw `count` values from `range`, rounded to `decimals`, pairwise distinct
/// and, under normal configurations, pairwise at least `min_gap` apart.
///
/// Random draws are accepted while they keep every pairwise distance at or
/// above the gap, for at most [`MAX_ATTEMPTS`] draws. Any shortfall is then
/// filled by stepping 1 to 9 grid units from the last accepted value,
/// wrapping inside the range and skipping taken points; those values honour
/// range and distinctness but not the gap. The result is shuffled.
///
/// Returns fewer than `count` values only if the range holds fewer than
/// `count` grid points (validated grade tables never do).
pub fn sample_unique<R: Rng + ?Sized>(
    rng: &mut R,
    range: ValueRange,
    count: usize,
    decimals: u32,
    min_gap: f64,
) -> Vec<f64> {
    if count == 0 || !range.is_valid() {
        return Vec::new();
    }
    let Some((lo, hi)) = grid_bounds(range, decimals) else {
        return Vec::new();
    };
    let scale = scale_for(decimals);
    let gap = gap_units(min_gap, decimals);

    let mut taken: Vec<i64> = Vec::with_capacity(count);
    let mut attempts = 0;
    while taken.len() < count && attempts < MAX_ATTEMPTS {
        attempts += 1;
        let draw = rng.gen_range(range.min..=range.max);
        let unit = ((draw * scale).round() as i64).clamp(lo, hi);
        if taken.iter().all(|&t| t != unit && (t - unit).abs() >= gap) {
            taken.push(unit);
        }
    }

    let span = hi - lo + 1;
    let target = count.min(usize::try_from(span).unwrap_or(usize::MAX));
    if taken.len() < target {
        log::debug!(
            "sampler fell back after {} attempts: {} of {} values in [{}, {}]",
            attempts,
            taken.len(),
            count,
            range.min,
            range.max
        );
    }
    while taken.len() < target {
        let base = match taken.last() {
            Some(&last) => last,
            None => rng.gen_range(lo..=hi),
        };
        let mut candidate = lo + (base - lo + rng.gen_range(1..=9)) % span;
        while taken.contains(&candidate) {
            candidate = if candidate >= hi { lo } else { candidate + 1 };
        }
        taken.push(candidate);
    }

    let mut values: Vec<f64> = taken.into_iter().map(|unit| unit as f64 / scale).collect();
    values.shuffle(rng);
    values
}

/// One sheet's worth of sampled measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledRow {
    pub weights: [f64; WEIGHTS_PER_ROW],
    pub strength_7d: [f64; STRENGTHS_PER_AGE],
    pub strength_28d: [f64; STRENGTHS_PER_AGE],
}

fn into_array<const N: usize>(values: Vec<f64>) -> [f64; N] {
    // A validated GradeSpec always yields N values
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value;
    }
    out
}

/// Sample a full row for `spec`
pub fn generate_row<R: Rng + ?Sized>(rng: &mut R, spec: &GradeSpec) -> SampledRow {
    let kind = spec.kind();
    SampledRow {
        weights: into_array(sample_unique(
            rng,
            spec.weight(),
            WEIGHTS_PER_ROW,
            GradeKind::WEIGHT_DECIMALS,
            kind.weight_gap(),
        )),
        strength_7d: into_array(sample_unique(
            rng,
            spec.strength_7d(),
            STRENGTHS_PER_AGE,
            GradeKind::STRENGTH_DECIMALS,
            kind.strength_gap(),
        )),
        strength_28d: into_array(sample_unique(
            rng,
            spec.strength_28d(),
            STRENGTHS_PER_AGE,
            GradeKind::STRENGTH_DECIMALS,
            kind.strength_gap(),
        )),
    }
}

pub fn generate_rows<R: Rng + ?Sized>(rng: &mut R, spec: &GradeSpec, count: usize) -> Vec<SampledRow> {
    (0..count).map(|_| generate_row(rng, spec)).collect()
}
