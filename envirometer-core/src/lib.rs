//! Core engines for the envirometer sensor pipeline
//!
//! Turns raw, possibly interdependent sensor readings into the corrected
//! values the daemon exports, and short histories of published values
//! into the rising/steady/falling classification the display shows.
//!
//! Two pieces of long-lived state live here, each owned by exactly one
//! logical thread of control:
//! - the compensation engine's CPU-temperature window (daemon side),
//! - the trend tracker's per-metric sample windows (display side).
//!
//! Everything else is pure functions plus the baseline file, which is
//! read once at startup and written only on explicit request.
//!
//! ```
//! use envirometer_core::compensation::CompensationEngine;
//!
//! let mut engine = CompensationEngine::with_defaults();
//! let comp = engine.record_cpu_temperature(35.0);
//!
//! // BME280 reports 22.0 °C; the board's heat is subtracted out.
//! let corrected = comp.apply(22.0);
//! assert!((corrected - 19.4).abs() < 1e-9);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod baseline;
pub mod compensation;
pub mod errors;
pub mod history;
pub mod sensors;
pub mod trend;

// Public API
pub use baseline::Baseline;
pub use compensation::{absolute_humidity, CompensationEngine, TemperatureCompensation};
pub use errors::{BaselineError, TrendError};
pub use sensors::SensorKind;
pub use trend::{Trend, TrendTracker};

/// Crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
