//! Daemon Configuration Surface
//!
//! Flags select which sensors a run polls, which cross-sensor
//! compensations are applied, and where the results go. Everything is
//! validated up front: a combination that cannot work (compensation
//! without the sensors it depends on, no sensors at all) is rejected with
//! a descriptive message before the first poll cycle, never discovered
//! mid-run.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use envirometer_core::compensation::{
    DEFAULT_CPU_COMPENSATION_FACTOR, DEFAULT_CPU_HISTORY_SAMPLES,
};
use envirometer_core::SensorKind;
use thiserror::Error;

/// A rejected flag combination. Always fatal, always pre-loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no sensors enabled; enable at least one of --sgp30, --bme280, --scd30, --ltr559, --cpu-temperature")]
    NoSensors,

    #[error("--{flag} requires {needs}")]
    MissingDependency {
        flag: &'static str,
        needs: &'static str,
    },

    #[error("--{flag}: {reason}")]
    InvalidValue {
        flag: &'static str,
        reason: &'static str,
    },
}

/// Command-line surface of `envirometerd`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "envirometerd",
    version,
    about = "Poll environment sensors and export corrected readings to Prometheus"
)]
pub struct Config {
    /// Poll the SGP30 CO₂/organics sensor.
    #[arg(long)]
    pub sgp30: bool,

    /// Poll the BME280 temperature/pressure/humidity sensor.
    #[arg(long)]
    pub bme280: bool,

    /// Poll the SCD30 CO₂ sensor (non-blocking reads).
    #[arg(long)]
    pub scd30: bool,

    /// Poll the LTR559 light/proximity sensor.
    #[arg(long)]
    pub ltr559: bool,

    /// Sample the host CPU temperature each cycle.
    #[arg(long)]
    pub cpu_temperature: bool,

    /// Correct ambient temperatures using the smoothed CPU temperature.
    /// Requires --cpu-temperature and a temperature-reporting sensor.
    #[arg(long)]
    pub cpu_compensation: bool,

    /// Coupling factor between mean CPU temperature and ambient readings.
    #[arg(long, default_value_t = DEFAULT_CPU_COMPENSATION_FACTOR)]
    pub cpu_compensation_factor: f64,

    /// CPU-temperature samples retained for smoothing.
    #[arg(long, default_value_t = DEFAULT_CPU_HISTORY_SAMPLES)]
    pub cpu_history: usize,

    /// Feed BME280-derived absolute humidity to the SGP30 before each
    /// read. Requires --sgp30 and --bme280.
    #[arg(long)]
    pub humidity_compensation: bool,

    /// Where the SGP30 calibration baseline is persisted.
    #[arg(long, default_value = "/var/lib/envirometer/sgp30-baseline")]
    pub baseline_path: PathBuf,

    /// Save the SGP30 baseline every N cycles.
    #[arg(long, default_value_t = 3600)]
    pub baseline_save_cycles: u64,

    /// Seconds between poll cycles (best effort; blocking reads eat into it).
    #[arg(long, default_value_t = 1.0)]
    pub interval_seconds: f64,

    /// Port for the /metrics endpoint.
    #[arg(long, default_value_t = 9092)]
    pub port: u16,

    /// Address the /metrics endpoint binds to.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Value of the `instance` label on every exported metric.
    #[arg(long, default_value = "lounge")]
    pub instance: String,

    /// Use deterministic simulated drivers instead of hardware.
    #[arg(long)]
    pub simulate: bool,
}

impl Config {
    /// Validate the flag combination and return the enabled capability
    /// set, in polling dependency order.
    pub fn validate(&self) -> Result<Vec<SensorKind>, ConfigError> {
        let mut sensors = Vec::new();
        if self.cpu_temperature {
            sensors.push(SensorKind::CpuThermal);
        }
        if self.bme280 {
            sensors.push(SensorKind::Bme280);
        }
        if self.sgp30 {
            sensors.push(SensorKind::Sgp30);
        }
        if self.scd30 {
            sensors.push(SensorKind::Scd30);
        }
        if self.ltr559 {
            sensors.push(SensorKind::Ltr559);
        }
        if sensors.is_empty() {
            return Err(ConfigError::NoSensors);
        }

        if self.humidity_compensation && !(self.sgp30 && self.bme280) {
            return Err(ConfigError::MissingDependency {
                flag: "humidity-compensation",
                needs: "both --sgp30 and --bme280",
            });
        }
        if self.cpu_compensation {
            if !self.cpu_temperature {
                return Err(ConfigError::MissingDependency {
                    flag: "cpu-compensation",
                    needs: "--cpu-temperature",
                });
            }
            if !(self.bme280 || self.scd30) {
                return Err(ConfigError::MissingDependency {
                    flag: "cpu-compensation",
                    needs: "a temperature-reporting sensor (--bme280 or --scd30)",
                });
            }
        }

        if !(self.cpu_compensation_factor.is_finite() && self.cpu_compensation_factor > 0.0) {
            return Err(ConfigError::InvalidValue {
                flag: "cpu-compensation-factor",
                reason: "must be a positive number",
            });
        }
        if self.cpu_history == 0 {
            return Err(ConfigError::InvalidValue {
                flag: "cpu-history",
                reason: "must retain at least one sample",
            });
        }
        if self.baseline_save_cycles == 0 {
            return Err(ConfigError::InvalidValue {
                flag: "baseline-save-cycles",
                reason: "must be at least 1",
            });
        }
        if !(self.interval_seconds.is_finite() && self.interval_seconds > 0.0) {
            return Err(ConfigError::InvalidValue {
                flag: "interval-seconds",
                reason: "must be a positive number of seconds",
            });
        }

        Ok(sensors)
    }

    /// Bind address of the /metrics endpoint.
    pub fn export_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for Config {
    /// Matches the clap defaults; used by tests that bypass argument
    /// parsing.
    fn default() -> Self {
        Self {
            sgp30: false,
            bme280: false,
            scd30: false,
            ltr559: false,
            cpu_temperature: false,
            cpu_compensation: false,
            cpu_compensation_factor: DEFAULT_CPU_COMPENSATION_FACTOR,
            cpu_history: DEFAULT_CPU_HISTORY_SAMPLES,
            humidity_compensation: false,
            baseline_path: PathBuf::from("/var/lib/envirometer/sgp30-baseline"),
            baseline_save_cycles: 3600,
            interval_seconds: 1.0,
            port: 9092,
            bind: IpAddr::from([0, 0, 0, 0]),
            instance: "lounge".into(),
            simulate: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_with_defaults() {
        let config = Config::parse_from(["envirometerd", "--sgp30"]);
        assert!(config.sgp30);
        assert_eq!(config.port, 9092);
        assert_eq!(config.baseline_save_cycles, 3600);
        assert!((config.cpu_compensation_factor - 0.2).abs() < 1e-12);
    }

    #[test]
    fn no_sensors_is_fatal() {
        let config = Config::default();
        assert_eq!(config.validate(), Err(ConfigError::NoSensors));
    }

    #[test]
    fn humidity_compensation_needs_both_sensors() {
        // Only the CO₂/organics sensor enabled: rejected before any poll.
        let config = Config {
            sgp30: true,
            humidity_compensation: true,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDependency { flag: "humidity-compensation", .. })
        ));

        // Only the environmental sensor: also rejected.
        let config = Config {
            bme280: true,
            humidity_compensation: true,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        // Both: fine.
        let config = Config {
            sgp30: true,
            bme280: true,
            humidity_compensation: true,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn cpu_compensation_needs_source_and_consumer() {
        let config = Config {
            bme280: true,
            cpu_compensation: true,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDependency { flag: "cpu-compensation", .. })
        ));

        let config = Config {
            cpu_temperature: true,
            cpu_compensation: true,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            cpu_temperature: true,
            bme280: true,
            cpu_compensation: true,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nonsense_numbers_are_rejected() {
        let config = Config {
            sgp30: true,
            cpu_history: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            sgp30: true,
            interval_seconds: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            sgp30: true,
            baseline_save_cycles: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            sgp30: true,
            cpu_compensation_factor: f64::NAN,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn capability_set_is_in_dependency_order() {
        let config = Config {
            sgp30: true,
            bme280: true,
            cpu_temperature: true,
            ..Config::default()
        };
        let sensors = config.validate().unwrap();
        assert_eq!(
            sensors,
            vec![SensorKind::CpuThermal, SensorKind::Bme280, SensorKind::Sgp30]
        );
    }
}
