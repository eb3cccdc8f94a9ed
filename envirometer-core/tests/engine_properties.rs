//! Property tests for the core engines.
//!
//! These pin down the window and classification invariants for arbitrary
//! inputs: the CPU window never over-retains, its mean always covers
//! exactly the retained samples, and trend classification agrees with a
//! direct comparison of the window ends.

use proptest::prelude::*;

use envirometer_core::baseline::Baseline;
use envirometer_core::compensation::CompensationEngine;
use envirometer_core::history::History;
use envirometer_core::trend::{Trend, TrendTracker};

proptest! {
    #[test]
    fn history_never_exceeds_capacity(
        capacity in 1usize..32,
        values in proptest::collection::vec(-100.0f64..150.0, 0..128),
    ) {
        let mut history = History::new(capacity);
        for (i, v) in values.iter().enumerate() {
            history.push(*v);
            prop_assert!(history.len() <= capacity);
            prop_assert_eq!(history.len(), (i + 1).min(capacity));
        }
    }

    #[test]
    fn history_retains_the_most_recent_window(
        capacity in 1usize..16,
        values in proptest::collection::vec(-100.0f64..150.0, 1..64),
    ) {
        let mut history = History::new(capacity);
        for v in &values {
            history.push(*v);
        }
        let start = values.len().saturating_sub(capacity);
        let expected: Vec<f64> = values[start..].to_vec();
        let retained: Vec<f64> = history.iter().copied().collect();
        prop_assert_eq!(retained, expected);
    }

    #[test]
    fn mean_matches_reference_over_retained_samples(
        capacity in 1usize..16,
        samples in proptest::collection::vec(10.0f64..90.0, 1..64),
        factor in 0.01f64..1.0,
    ) {
        let mut engine = CompensationEngine::new(factor, capacity);
        let mut last = None;
        for s in &samples {
            last = Some(engine.record_cpu_temperature(*s));
        }
        let comp = last.unwrap();

        let start = samples.len().saturating_sub(capacity);
        let window = &samples[start..];
        let mean: f64 = window.iter().sum::<f64>() / window.len() as f64;

        // Recover the mean the compensation captured: apply(0) = -mean * factor.
        let captured_mean = -comp.apply(0.0) / factor;
        prop_assert!((captured_mean - mean).abs() < 1e-9);
    }

    #[test]
    fn classification_agrees_with_window_ends(
        capacity in 2usize..16,
        values in proptest::collection::vec(0.0f64..1000.0, 2..64),
        tolerance in 0.0f64..10.0,
    ) {
        let mut tracker = TrendTracker::new();
        tracker.track("m", capacity, tolerance);
        for (i, v) in values.iter().enumerate() {
            tracker.push("m", i as u64, *v).unwrap();
        }

        let start = values.len().saturating_sub(capacity);
        let oldest = values[start];
        let newest = values[values.len() - 1];
        let expected = if (newest - oldest).abs() <= tolerance {
            Trend::Steady
        } else if newest > oldest {
            Trend::Rising
        } else {
            Trend::Falling
        };
        prop_assert_eq!(tracker.classify("m").unwrap(), Some(expected));
    }

    #[test]
    fn baseline_round_trips_any_registers(co2 in any::<u16>(), tvoc in any::<u16>()) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline");
        let baseline = Baseline { co2, tvoc };
        baseline.save(&path).unwrap();
        prop_assert_eq!(Baseline::load(&path).unwrap(), Some(baseline));
    }
}
