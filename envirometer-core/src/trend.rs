//! Trend Estimation for the Display Client
//!
//! ## Overview
//!
//! The display rotates through a handful of metrics and annotates each
//! value with a coarse direction glyph: rising, steady, or falling. The
//! estimator behind that keeps a short bounded history of `(timestamp,
//! value)` samples per metric and compares the two ends of the window.
//!
//! The classification is deliberately crude. It compares only the oldest
//! and newest retained samples against a per-metric tolerance; no slope
//! fitting, no smoothing. At a glance "is the CO₂ going up" is all the
//! panel needs to convey, and anything cleverer would have to justify its
//! behaviour during the sparse warm-up window.
//!
//! ## Lifecycle
//!
//! Histories live for the display process's lifetime and are rebuilt from
//! scratch on restart; there is no persistence. Capacity and tolerance are
//! fixed per metric when the metric is registered, before the rotation
//! loop starts.
//!
//! ## Example
//!
//! ```
//! use envirometer_core::trend::{Trend, TrendTracker};
//!
//! let mut tracker = TrendTracker::new();
//! tracker.track("sgp30_co2_ppm", 30, 5.0);
//!
//! tracker.push("sgp30_co2_ppm", 1_000, 400.0).unwrap();
//! assert_eq!(tracker.classify("sgp30_co2_ppm").unwrap(), None); // warming up
//!
//! tracker.push("sgp30_co2_ppm", 2_000, 450.0).unwrap();
//! assert_eq!(
//!     tracker.classify("sgp30_co2_ppm").unwrap(),
//!     Some(Trend::Rising),
//! );
//! ```

use std::collections::HashMap;

use crate::errors::TrendError;
use crate::history::History;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// One retained observation of a published metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// When the value was fetched, not when the backend scraped it.
    pub timestamp: Timestamp,
    /// The published metric value.
    pub value: f64,
}

/// Coarse direction of a metric over its retained window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Newest exceeds oldest by more than the tolerance.
    Rising,
    /// Newest within tolerance of oldest.
    Steady,
    /// Newest below oldest by more than the tolerance.
    Falling,
}

impl Trend {
    /// Glyph rendered next to the value on the panel.
    pub fn glyph(&self) -> &'static str {
        match self {
            Trend::Rising => "↗",
            Trend::Steady => "→",
            Trend::Falling => "↘",
        }
    }
}

/// Per-metric window plus its equality tolerance.
#[derive(Debug, Clone)]
struct TrackedMetric {
    samples: History<Sample>,
    tolerance: f64,
}

/// Maintains a bounded sample history per metric and classifies direction.
///
/// Metric-agnostic: keys are exported metric names, values are whatever
/// the backend published. The tracker knows nothing about sensors or
/// units, which is what lets one instance serve every metric in the
/// rotation.
#[derive(Debug, Clone, Default)]
pub struct TrendTracker {
    metrics: HashMap<String, TrackedMetric>,
}

impl TrendTracker {
    /// Empty tracker; register metrics with [`TrendTracker::track`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metric with a fixed window capacity and tolerance.
    ///
    /// Re-registering an existing metric resets its history and adopts
    /// the new parameters.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (configuration validation rejects
    /// that earlier).
    pub fn track(&mut self, metric: impl Into<String>, capacity: usize, tolerance: f64) {
        self.metrics.insert(
            metric.into(),
            TrackedMetric {
                samples: History::new(capacity),
                tolerance: tolerance.abs(),
            },
        );
    }

    /// Append a sample to a metric's window, evicting the oldest when the
    /// window is full.
    pub fn push(
        &mut self,
        metric: &str,
        timestamp: Timestamp,
        value: f64,
    ) -> Result<(), TrendError> {
        let tracked = self
            .metrics
            .get_mut(metric)
            .ok_or_else(|| TrendError::Untracked(metric.to_string()))?;
        tracked.samples.push(Sample { timestamp, value });
        Ok(())
    }

    /// Classify a metric's recent direction.
    ///
    /// Returns `Ok(None)` with fewer than two retained samples: the metric
    /// is freshly initializing and no glyph should be shown. Otherwise
    /// compares the oldest and newest retained samples against the
    /// metric's tolerance.
    pub fn classify(&self, metric: &str) -> Result<Option<Trend>, TrendError> {
        let tracked = self
            .metrics
            .get(metric)
            .ok_or_else(|| TrendError::Untracked(metric.to_string()))?;
        if tracked.samples.len() < 2 {
            return Ok(None);
        }
        // len >= 2 guarantees both ends exist.
        let oldest = tracked.samples.oldest().map(|s| s.value).unwrap_or(0.0);
        let newest = tracked.samples.newest().map(|s| s.value).unwrap_or(0.0);
        let trend = if (newest - oldest).abs() <= tracked.tolerance {
            Trend::Steady
        } else if newest > oldest {
            Trend::Rising
        } else {
            Trend::Falling
        };
        Ok(Some(trend))
    }

    /// Number of samples currently retained for a metric.
    pub fn samples(&self, metric: &str) -> Result<usize, TrendError> {
        self.metrics
            .get(metric)
            .map(|t| t.samples.len())
            .ok_or_else(|| TrendError::Untracked(metric.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRIC: &str = "bme280_temperature_celsius";

    fn tracker(capacity: usize, tolerance: f64) -> TrendTracker {
        let mut t = TrendTracker::new();
        t.track(METRIC, capacity, tolerance);
        t
    }

    #[test]
    fn untracked_metric_is_an_error() {
        let tracker = TrendTracker::new();
        assert_eq!(
            tracker.classify("nope"),
            Err(TrendError::Untracked("nope".into()))
        );
    }

    #[test]
    fn fewer_than_two_samples_gives_no_trend() {
        let mut tracker = tracker(5, 0.5);
        assert_eq!(tracker.classify(METRIC).unwrap(), None);
        tracker.push(METRIC, 1_000, 20.0).unwrap();
        assert_eq!(tracker.classify(METRIC).unwrap(), None);
    }

    #[test]
    fn tolerance_boundaries() {
        let tolerance = 0.5;
        let eps = 0.001;

        // newest = oldest + tolerance + ε → rising
        let mut t = tracker(5, tolerance);
        t.push(METRIC, 0, 100.0).unwrap();
        t.push(METRIC, 1, 100.0 + tolerance + eps).unwrap();
        assert_eq!(t.classify(METRIC).unwrap(), Some(Trend::Rising));

        // newest = oldest - tolerance - ε → falling
        let mut t = tracker(5, tolerance);
        t.push(METRIC, 0, 100.0).unwrap();
        t.push(METRIC, 1, 100.0 - tolerance - eps).unwrap();
        assert_eq!(t.classify(METRIC).unwrap(), Some(Trend::Falling));

        // unchanged → steady
        let mut t = tracker(5, tolerance);
        t.push(METRIC, 0, 100.0).unwrap();
        t.push(METRIC, 1, 100.0).unwrap();
        assert_eq!(t.classify(METRIC).unwrap(), Some(Trend::Steady));

        // exactly at the tolerance is still steady
        let mut t = tracker(5, tolerance);
        t.push(METRIC, 0, 100.0).unwrap();
        t.push(METRIC, 1, 100.0 + tolerance).unwrap();
        assert_eq!(t.classify(METRIC).unwrap(), Some(Trend::Steady));
    }

    #[test]
    fn classification_uses_retained_window_ends() {
        let mut t = tracker(3, 0.1);
        // Window sees [10, 20, 30], then eviction leaves [20, 30, 5].
        for (ts, v) in [(0, 10.0), (1, 20.0), (2, 30.0)] {
            t.push(METRIC, ts, v).unwrap();
        }
        assert_eq!(t.classify(METRIC).unwrap(), Some(Trend::Rising));

        t.push(METRIC, 3, 5.0).unwrap();
        // Oldest retained is now 20, newest 5.
        assert_eq!(t.classify(METRIC).unwrap(), Some(Trend::Falling));
    }

    #[test]
    fn reregistering_resets_history() {
        let mut t = tracker(5, 0.5);
        t.push(METRIC, 0, 1.0).unwrap();
        t.push(METRIC, 1, 2.0).unwrap();
        t.track(METRIC, 5, 0.5);
        assert_eq!(t.samples(METRIC).unwrap(), 0);
        assert_eq!(t.classify(METRIC).unwrap(), None);
    }

    #[test]
    fn metrics_are_independent() {
        let mut t = TrendTracker::new();
        t.track("a", 4, 0.0);
        t.track("b", 4, 0.0);
        t.push("a", 0, 1.0).unwrap();
        t.push("a", 1, 2.0).unwrap();
        t.push("b", 0, 2.0).unwrap();
        t.push("b", 1, 1.0).unwrap();
        assert_eq!(t.classify("a").unwrap(), Some(Trend::Rising));
        assert_eq!(t.classify("b").unwrap(), Some(Trend::Falling));
    }
}
