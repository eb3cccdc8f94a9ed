//! Sensor Driver Boundary
//!
//! The daemon never talks to a bus directly. Every physical sensor sits
//! behind one of the small traits here; the polling loop sees only
//! `read`-shaped calls and typed readings in driver-native units (unit
//! normalization happens later, in the compensation engine's `units`
//! module).
//!
//! Two kinds of implementation ship in this crate:
//!
//! - [`cpu::Vcgencmd`] — the real CPU-thermal collaborator, a subprocess
//!   shell-out to the firmware's `vcgencmd` tool.
//! - [`sim`] — deterministic in-memory drivers for development
//!   (`--simulate`) and for the pipeline tests.
//!
//! Real I²C bus drivers are external collaborators: wire one in by
//! implementing the matching trait and handing it to the poller. A build
//! without such a driver refuses an enabled bus sensor at startup rather
//! than failing mid-run.

use envirometer_core::Baseline;
use thiserror::Error;

use crate::config::Config;

pub mod cpu;
pub mod sim;

/// Failures at the driver/OS boundary.
///
/// These are reported and the cycle's corresponding readings omitted;
/// they never abort the polling loop. The one exception is
/// [`DriverError::NoBackend`], which is raised while *building* the
/// driver set and is fatal at startup.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Spawning or running an OS collaborator failed.
    #[error("{tool}: {source}")]
    Os {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The collaborator ran but its output made no sense.
    #[error("{tool}: unparseable output {output:?}")]
    Unparseable { tool: &'static str, output: String },

    /// The sensor is enabled but this build has no driver for it.
    #[error("no {sensor} hardware backend in this build; run with --simulate or wire a driver behind the corresponding trait")]
    NoBackend { sensor: &'static str },
}

/// One SGP30 air-quality read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirQuality {
    /// Equivalent CO₂, ppm.
    pub co2_ppm: u16,
    /// Total VOC, ppb.
    pub tvoc_ppb: u16,
}

/// One BME280 read, driver-native units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    pub temperature_celsius: f64,
    pub pressure_hpa: f64,
    pub humidity_pct: f64,
}

/// One SCD30 read, driver-native units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scd30Reading {
    pub co2_ppm: f64,
    pub temperature_celsius: f64,
    pub humidity_pct: f64,
}

/// One LTR559 read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightProximity {
    pub lux: f64,
    /// Raw proximity count, higher is closer.
    pub proximity: f64,
}

/// The host CPU's thermal sensor, queried through the OS.
pub trait CpuThermal {
    /// CPU temperature in °C.
    fn read_cpu_temperature(&mut self) -> Result<f64, DriverError>;
}

/// Ratiometric CO₂ + organics sensor (SGP30).
///
/// The humidity compensation input affects the sensor's internal
/// calibration, so the poller hands it over *before* the cycle's read.
pub trait Sgp30 {
    /// Supply absolute humidity (g/m³) for on-chip compensation.
    fn set_absolute_humidity(&mut self, grams_per_cubic_metre: f64) -> Result<(), DriverError>;

    /// Blocking air-quality read.
    fn read_air_quality(&mut self) -> Result<AirQuality, DriverError>;

    /// Current calibration registers, for persistence.
    fn baseline(&mut self) -> Result<Baseline, DriverError>;

    /// Restore persisted calibration registers at startup.
    fn restore_baseline(&mut self, baseline: &Baseline) -> Result<(), DriverError>;
}

/// Environmental sensor (BME280).
pub trait Bme280 {
    /// Blocking temperature/pressure/humidity read.
    fn read(&mut self) -> Result<Climate, DriverError>;
}

/// True-CO₂ sensor (SCD30), non-blocking read mode.
pub trait Scd30 {
    /// `Ok(None)` means "no new data yet" and is not an error.
    fn try_read(&mut self) -> Result<Option<Scd30Reading>, DriverError>;
}

/// Light/proximity sensor (LTR559).
pub trait Ltr559 {
    /// Blocking light/proximity read.
    fn read(&mut self) -> Result<LightProximity, DriverError>;
}

/// The drivers a run actually polls; `None` means the sensor is disabled.
#[derive(Default)]
pub struct DriverSet {
    pub cpu: Option<Box<dyn CpuThermal>>,
    pub sgp30: Option<Box<dyn Sgp30>>,
    pub bme280: Option<Box<dyn Bme280>>,
    pub scd30: Option<Box<dyn Scd30>>,
    pub ltr559: Option<Box<dyn Ltr559>>,
}

/// Build the driver set for the enabled sensors.
///
/// With `--simulate`, every enabled sensor gets its deterministic
/// simulation. Otherwise the CPU thermal sensor uses [`cpu::Vcgencmd`]
/// and any enabled bus sensor is a startup error: those drivers live
/// outside this repository and plug in behind the traits above.
pub fn build(config: &Config) -> Result<DriverSet, DriverError> {
    let mut set = DriverSet::default();

    if config.simulate {
        if config.cpu_temperature {
            set.cpu = Some(Box::new(sim::SimCpuThermal::new(38.0)));
        }
        if config.sgp30 {
            set.sgp30 = Some(Box::new(sim::SimSgp30::new(412, 19)));
        }
        if config.bme280 {
            set.bme280 = Some(Box::new(sim::SimBme280::new(21.5, 1008.2, 48.0)));
        }
        if config.scd30 {
            set.scd30 = Some(Box::new(sim::SimScd30::new(
                Scd30Reading {
                    co2_ppm: 523.0,
                    temperature_celsius: 22.1,
                    humidity_pct: 47.0,
                },
                2,
            )));
        }
        if config.ltr559 {
            set.ltr559 = Some(Box::new(sim::SimLtr559::new(120.0, 0.0)));
        }
        return Ok(set);
    }

    if config.cpu_temperature {
        set.cpu = Some(Box::new(cpu::Vcgencmd::default()));
    }
    for (enabled, sensor) in [
        (config.sgp30, "sgp30"),
        (config.bme280, "bme280"),
        (config.scd30, "scd30"),
        (config.ltr559, "ltr559"),
    ] {
        if enabled {
            return Err(DriverError::NoBackend { sensor });
        }
    }
    Ok(set)
}
