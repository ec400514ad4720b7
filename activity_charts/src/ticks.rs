//! Evenly spaced axis tick values.

use crate::units::round_to;

/// Ascending axis gridline positions.
pub type TickSet = Vec<f64>;

const MAX_TICK_DECIMALS: f64 = 17.0;

/// Produce `count` ticks spanning `[min, max]` inclusive.
///
/// Interior ticks are rounded to whole numbers when the step is at least one,
/// otherwise to the precision of the step. The first and last ticks are
/// always exactly `min` and `max`. A reversed range is swapped so the result
/// stays ascending, and non-finite endpoints yield no ticks.
pub fn calculate_ticks(min: f64, max: f64, count: usize) -> TickSet {
    if !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    if count <= 1 {
        return vec![min];
    }
    if min == max {
        return vec![min; count];
    }

    let (lo, hi) = if min < max { (min, max) } else { (max, min) };
    let last = count - 1;
    let step = (hi - lo) / last as f64;
    let decimals = tick_decimals(step);

    let mut ticks = Vec::with_capacity(count);
    ticks.push(lo);
    let mut prev = lo;
    for i in 1..last {
        let raw = lo + step * i as f64;
        let rounded = round_to(raw, decimals);
        // Rounding may not move a tick by more than half a step.
        let tick = if (rounded - raw).abs() <= step / 2.0 {
            rounded
        } else {
            raw
        };
        let tick = tick.max(prev).min(hi);
        ticks.push(tick);
        prev = tick;
    }
    ticks.push(hi);
    ticks
}

fn tick_decimals(step: f64) -> u32 {
    if step >= 1.0 {
        0
    } else {
        ((-step.log10()).ceil() + 1.0).clamp(1.0, MAX_TICK_DECIMALS) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_even_integer_ticks() {
        assert_eq!(calculate_ticks(0.0, 100.0, 5), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_degenerate_axis_repeats_value() {
        assert_eq!(calculate_ticks(5.0, 5.0, 3), vec![5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_small_counts() {
        assert_eq!(calculate_ticks(3.0, 9.0, 1), vec![3.0]);
        assert_eq!(calculate_ticks(3.0, 9.0, 0), vec![3.0]);
        assert_eq!(calculate_ticks(3.0, 9.0, 2), vec![3.0, 9.0]);
    }

    #[test]
    fn test_interior_ticks_round_to_integers() {
        assert_eq!(calculate_ticks(0.0, 10.0, 4), vec![0.0, 3.0, 7.0, 10.0]);
        assert_eq!(calculate_ticks(112.0, 171.0, 5), vec![112.0, 127.0, 142.0, 156.0, 171.0]);
    }

    #[test]
    fn test_fractional_step_keeps_precision() {
        assert_eq!(calculate_ticks(0.0, 3.0, 5), vec![0.0, 0.75, 1.5, 2.25, 3.0]);
        assert_eq!(calculate_ticks(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_endpoints_are_exact_for_non_integer_range() {
        let ticks = calculate_ticks(0.1, 0.7, 7);
        assert_eq!(ticks.first(), Some(&0.1));
        assert_eq!(ticks.last(), Some(&0.7));
    }

    #[test]
    fn test_reversed_and_non_finite_ranges() {
        assert_eq!(calculate_ticks(100.0, 0.0, 3), vec![0.0, 50.0, 100.0]);
        assert!(calculate_ticks(f64::NAN, 1.0, 5).is_empty());
        assert!(calculate_ticks(0.0, f64::INFINITY, 5).is_empty());

        let tiny = calculate_ticks(1e-13, 3e-13, 3);
        assert_eq!(tiny.len(), 3);
        assert_eq!(tiny[0], 1e-13);
        assert_eq!(tiny[2], 3e-13);
        assert!(tiny[0] <= tiny[1] && tiny[1] <= tiny[2]);
        assert!((tiny[1] - 2e-13).abs() < 1e-20);
    }

    proptest! {
        #[test]
        fn prop_ticks_hit_endpoints_and_ascend(
            a in -1e5..1e5f64,
            span in 1e-3..1e5f64,
            count in 2usize..12,
        ) {
            let b = a + span;
            let ticks = calculate_ticks(a, b, count);
            prop_assert_eq!(ticks.len(), count);
            prop_assert_eq!(ticks[0], a);
            prop_assert_eq!(ticks[count - 1], b);
            for pair in ticks.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }

        #[test]
        fn prop_tiny_spans_still_ascend(
            a in -1e-9..1e-9f64,
            span in 1e-18..1e-11f64,
            count in 2usize..12,
        ) {
            let ticks = calculate_ticks(a, a + span, count);
            prop_assert_eq!(ticks[0], a);
            prop_assert_eq!(ticks[ticks.len() - 1], a + span);
            for pair in ticks.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }

        #[test]
        fn prop_ticks_are_idempotent(a in -1e3..1e3f64, b in -1e3..1e3f64, count in 0usize..10) {
            let first: Vec<u64> = calculate_ticks(a, b, count).iter().map(|v| v.to_bits()).collect();
            let second: Vec<u64> = calculate_ticks(a, b, count).iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(first, second);
        }
    }
}
