//! Cross-Sensor Compensation Engine
//!
//! ## Physics Background
//!
//! The environmental sensor sits on the same board as the CPU, close
//! enough that dissipated heat biases its temperature reading upward. The
//! standard correction subtracts a fraction of the gap between the smoothed
//! CPU temperature and the ambient reading:
//!
//! ```text
//! corrected = ambient - (mean_cpu - ambient) * factor
//! ```
//!
//! `mean_cpu` is the arithmetic mean over a short window of CPU samples
//! (the CPU temperature is noisy at sub-second scales; the board's thermal
//! mass is not). `factor` expresses how strongly the board couples the two,
//! 0.2 by default for a Pi with the sensor on a breakout garden.
//!
//! The CO₂/organics sensor in turn wants the *absolute* humidity of the
//! air for its on-chip compensation. That is derived from relative
//! humidity and the corrected temperature via the Magnus saturation
//! vapour pressure formula (see [`absolute_humidity`]).
//!
//! ## Ordering contract
//!
//! Values flow CPU → environmental → CO₂/organics. The compensation for a
//! cycle must be computed before the environmental temperature is exported,
//! and the absolute humidity must be handed to the CO₂/organics driver
//! before that driver's read. The polling loop owns that ordering; this
//! module only provides the pure computations and the CPU window.
//!
//! ## Warm-up transient
//!
//! On the very first cycle the CPU window holds a single sample and the
//! mean equals it. That transient is intentional and preserved; the window
//! simply fills over the first `capacity` cycles.

use crate::history::History;

/// Default coupling factor between mean CPU temperature and the ambient
/// reading. Empirically reasonable for a Pi Zero with a stacked sensor
/// board.
pub const DEFAULT_CPU_COMPENSATION_FACTOR: f64 = 0.2;

/// Default number of CPU-temperature samples retained for smoothing.
pub const DEFAULT_CPU_HISTORY_SAMPLES: usize = 10;

/// One cycle's temperature correction, captured as a value.
///
/// This is the "closure" of the compensation formula: it carries only the
/// two numbers it needs, so a cycle's correction can be applied to any
/// temperature reading produced later in the same cycle (environmental
/// sensor, CO₂ sensor's internal thermometer) without borrowing the
/// engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureCompensation {
    mean_cpu: f64,
    factor: f64,
}

impl TemperatureCompensation {
    /// Correction derived from a smoothed CPU temperature.
    pub fn new(mean_cpu: f64, factor: f64) -> Self {
        Self { mean_cpu, factor }
    }

    /// The no-op correction, used when CPU sensing is disabled or has not
    /// yet produced a sample.
    pub fn identity() -> Self {
        Self {
            mean_cpu: 0.0,
            factor: 0.0,
        }
    }

    /// Apply the correction to a raw temperature in °C.
    pub fn apply(&self, raw_celsius: f64) -> f64 {
        raw_celsius - (self.mean_cpu - raw_celsius) * self.factor
    }

    /// True for [`TemperatureCompensation::identity`].
    pub fn is_identity(&self) -> bool {
        self.factor == 0.0
    }
}

/// Holds the CPU-temperature window and derives per-cycle corrections.
///
/// Process-lifetime state, owned by the polling loop; one instance per
/// daemon.
#[derive(Debug, Clone)]
pub struct CompensationEngine {
    cpu_history: History<f64>,
    factor: f64,
}

impl CompensationEngine {
    /// Engine with the given coupling factor and CPU window capacity.
    ///
    /// # Panics
    ///
    /// Panics if `cpu_history_samples` is zero; configuration validation
    /// rejects that before the engine exists.
    pub fn new(factor: f64, cpu_history_samples: usize) -> Self {
        Self {
            cpu_history: History::new(cpu_history_samples),
            factor,
        }
    }

    /// Engine with the documented defaults (factor 0.2, window 10).
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CPU_COMPENSATION_FACTOR, DEFAULT_CPU_HISTORY_SAMPLES)
    }

    /// Record a raw CPU-temperature sample and return this cycle's
    /// correction.
    ///
    /// The returned value averages over exactly the retained samples, so a
    /// single-sample window yields `mean == raw` (the warm-up transient).
    pub fn record_cpu_temperature(&mut self, raw_celsius: f64) -> TemperatureCompensation {
        self.cpu_history.push(raw_celsius);
        let sum: f64 = self.cpu_history.iter().sum();
        let mean = sum / self.cpu_history.len() as f64;
        TemperatureCompensation::new(mean, self.factor)
    }

    /// Number of CPU samples currently retained (trace/tests).
    pub fn cpu_samples(&self) -> usize {
        self.cpu_history.len()
    }
}

/// Absolute humidity in grams of water per cubic metre of air.
///
/// Magnus-form saturation vapour pressure over water:
///
/// ```text
/// svp(T)  = 6.112 * exp(17.62 * T / (243.12 + T))      [hPa]
/// ah(rh,T) = 216.7 * (rh/100 * svp(T)) / (273.15 + T)  [g/m³]
/// ```
///
/// `temperature_celsius` must be the *corrected* temperature when CPU
/// compensation is active; feeding the uncorrected reading here would bake
/// the CPU's heat into the CO₂ sensor's humidity compensation. At
/// rh = 50 %, T = 25 °C this evaluates to ≈ 11.5 g/m³.
pub fn absolute_humidity(relative_humidity_pct: f64, temperature_celsius: f64) -> f64 {
    let svp_hpa = 6.112 * ((17.62 * temperature_celsius) / (243.12 + temperature_celsius)).exp();
    216.7 * ((relative_humidity_pct / 100.0) * svp_hpa) / (273.15 + temperature_celsius)
}

/// Unit normalization applied at the export boundary.
///
/// Exported canonical units are base SI where one exists: Pascals for
/// pressure, a 0–1 ratio for humidity. Gas concentrations stay in their
/// native ppm/ppb.
pub mod units {
    /// hPa (driver-native) to base Pascals.
    pub fn hectopascals_to_pascals(hpa: f64) -> f64 {
        hpa * 100.0
    }

    /// 0–100 percentage (driver-native) to a 0–1 ratio.
    pub fn percent_to_ratio(pct: f64) -> f64 {
        pct / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_the_identity() {
        let id = TemperatureCompensation::identity();
        assert!(id.is_identity());
        for t in [-40.0, 0.0, 19.4, 22.0, 85.0] {
            assert_eq!(id.apply(t), t);
        }
    }

    #[test]
    fn single_sample_mean_is_that_sample() {
        let mut engine = CompensationEngine::new(0.2, 10);
        let comp = engine.record_cpu_temperature(35.0);
        assert_eq!(engine.cpu_samples(), 1);
        // mean == 35.0, so: 22.0 - (35.0 - 22.0) * 0.2 = 19.4
        assert!((comp.apply(22.0) - 19.4).abs() < 1e-9);
    }

    #[test]
    fn mean_covers_exactly_retained_samples() {
        let mut engine = CompensationEngine::new(0.5, 3);
        engine.record_cpu_temperature(10.0);
        engine.record_cpu_temperature(20.0);
        let comp = engine.record_cpu_temperature(30.0);
        // mean = 20.0; apply(10.0) = 10 - (20 - 10) * 0.5 = 5.0
        assert!((comp.apply(10.0) - 5.0).abs() < 1e-9);

        // Overflow evicts the 10.0 sample: mean of [20, 30, 40] is 30.
        let comp = engine.record_cpu_temperature(40.0);
        assert_eq!(engine.cpu_samples(), 3);
        assert!((comp.apply(30.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn compensation_pulls_reading_toward_ambient() {
        let mut engine = CompensationEngine::new(0.2, 10);
        // Saturate the window at a constant CPU temperature.
        let mut comp = TemperatureCompensation::identity();
        for _ in 0..10 {
            comp = engine.record_cpu_temperature(35.0);
        }
        assert!((comp.apply(22.0) - 19.4).abs() < 1e-9);
    }

    #[test]
    fn absolute_humidity_reference_point() {
        // Closed-form value at rh = 50 %, T = 25 °C.
        let expected = 216.7 * (0.5 * 6.112 * (17.62 * 25.0_f64 / 268.12).exp()) / 298.15;
        let got = absolute_humidity(50.0, 25.0);
        assert!((got - expected).abs() < 1e-12);
        assert!((got - 11.5).abs() < 0.1, "≈11.5 g/m³ expected, got {got}");
    }

    #[test]
    fn absolute_humidity_grows_with_heat_and_moisture() {
        let base = absolute_humidity(50.0, 25.0);
        assert!(absolute_humidity(60.0, 25.0) > base);
        assert!(absolute_humidity(50.0, 30.0) > base);
        assert!(absolute_humidity(0.0, 25.0).abs() < 1e-12);
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(units::hectopascals_to_pascals(1013.25), 101325.0);
        assert_eq!(units::percent_to_ratio(45.0), 0.45);
    }
}
