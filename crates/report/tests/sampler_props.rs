// Property-based tests for the value sampler and grade matching.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use cubefill_report::grade::{GradeTable, ValueRange};
use cubefill_report::matcher::{detect_grade, normalize_grade};
use cubefill_report::sampler::{generate_row, grid_capacity, sample_unique};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// A range expressed in grid units with enough points for `count` values:
/// (decimals, lo_units, span_units, count, gap_units)
fn arb_sampling_case() -> impl Strategy<Value = (u32, i64, i64, usize, i64)> {
    (2u32..=3, 0i64..200_000, 1usize..=8).prop_flat_map(|(decimals, lo, count)| {
        (
            Just(decimals),
            Just(lo),
            (count as i64 - 1)..2_000,
            Just(count),
            0i64..50,
        )
    })
}

/// A builtin grade id dressed up with random case, spaces and separators.
fn arb_concrete_label() -> impl Strategy<Value = (String, String)> {
    let ids = vec!["M10", "M15", "M20", "M25", "M30", "M35", "M40", "M45"];
    (prop::sample::select(ids), any::<bool>(), prop::sample::select(vec!["", " ", "-", "_", "  "]))
        .prop_map(|(id, lower, sep)| {
            let (m, digits) = id.split_at(1);
            let m = if lower { m.to_lowercase() } else { m.to_string() };
            (format!(" {m}{sep}{digits} "), id.to_string())
        })
}

fn units(values: &[f64], decimals: u32) -> Vec<i64> {
    let scale = 10f64.powi(decimals as i32);
    values.iter().map(|v| (v * scale).round() as i64).collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn sample_unique_contract(
        (decimals, lo, span, count, gap) in arb_sampling_case(),
        seed in any::<u64>(),
    ) {
        let scale = 10f64.powi(decimals as i32);
        let range = ValueRange::new(lo as f64 / scale, (lo + span) as f64 / scale);
        let min_gap = gap as f64 / scale;
        let mut rng = StdRng::seed_from_u64(seed);

        let values = sample_unique(&mut rng, range, count, decimals, min_gap);

        // Exact count whenever the grid has room
        prop_assert_eq!(values.len(), count, "{:?} in {:?}", values, range);

        // In range and on the grid
        let u = units(&values, decimals);
        for (v, unit) in values.iter().zip(&u) {
            prop_assert!(*unit >= lo && *unit <= lo + span, "{} outside {:?}", v, range);
            prop_assert!((v * scale - *unit as f64).abs() < 1e-6, "{} not rounded", v);
        }

        // Pairwise distinct at the configured precision
        let distinct: HashSet<i64> = u.iter().copied().collect();
        prop_assert_eq!(distinct.len(), count, "duplicates in {:?}", values);
    }

    #[test]
    fn sample_unique_is_seed_deterministic(
        (decimals, lo, span, count, gap) in arb_sampling_case(),
        seed in any::<u64>(),
    ) {
        let scale = 10f64.powi(decimals as i32);
        let range = ValueRange::new(lo as f64 / scale, (lo + span) as f64 / scale);
        let min_gap = gap as f64 / scale;

        let a = sample_unique(&mut StdRng::seed_from_u64(seed), range, count, decimals, min_gap);
        let b = sample_unique(&mut StdRng::seed_from_u64(seed), range, count, decimals, min_gap);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn gap_holds_when_the_range_is_roomy(
        lo in 0i64..100_000,
        gap in 1i64..20,
        count in 1usize..=6,
        seed in any::<u64>(),
    ) {
        // Ten times the capacity needed: random draws never jam
        let span = gap * count as i64 * 10;
        let range = ValueRange::new(lo as f64 / 100.0, (lo + span) as f64 / 100.0);
        let min_gap = gap as f64 / 100.0;
        prop_assert!(grid_capacity(range, 2, min_gap) >= count);

        let values = sample_unique(&mut StdRng::seed_from_u64(seed), range, count, 2, min_gap);
        let u = units(&values, 2);
        for i in 0..u.len() {
            for j in (i + 1)..u.len() {
                prop_assert!((u[i] - u[j]).abs() >= gap, "{:?} closer than {}", values, min_gap);
            }
        }
    }

    #[test]
    fn builtin_rows_stay_in_range(seed in any::<u64>()) {
        let table = GradeTable::builtin();
        let mut rng = StdRng::seed_from_u64(seed);
        for spec in table.iter() {
            let row = generate_row(&mut rng, spec);
            prop_assert!(row.weights.iter().all(|v| spec.weight().contains(*v)), "{}", spec.id());
            prop_assert!(row.strength_7d.iter().all(|v| spec.strength_7d().contains(*v)), "{}", spec.id());
            prop_assert!(row.strength_28d.iter().all(|v| spec.strength_28d().contains(*v)), "{}", spec.id());

            let weights: HashSet<i64> = units(&row.weights, 3).into_iter().collect();
            prop_assert_eq!(weights.len(), 6, "{}: {:?}", spec.id(), row.weights);
        }
    }

    #[test]
    fn normalize_is_idempotent(raw in r"[ a-zA-Z0-9:_\-]{0,12}") {
        let once = normalize_grade(&raw);
        prop_assert_eq!(normalize_grade(&once), once.clone());
        prop_assert!(!once.chars().any(char::is_whitespace));
    }

    #[test]
    fn detect_tolerates_spacing_and_case((label, id) in arb_concrete_label()) {
        let table = GradeTable::builtin();
        let detected = detect_grade(&table, &label).map(|g| g.id().to_string());
        prop_assert_eq!(detected, Some(id));
    }
}
