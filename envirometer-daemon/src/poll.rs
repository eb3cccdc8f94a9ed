//! The Polling Loop
//!
//! One fixed-cadence cycle: read each active sensor exactly once, route
//! raw values through the compensation engine in dependency order, write
//! every derived value to the export sink, and emit a single trace line.
//!
//! ## Ordering within a cycle
//!
//! 1. CPU thermal — must come first so this cycle's temperature
//!    correction exists before any ambient temperature is exported.
//! 2. BME280 — corrected temperature, pressure, humidity; derives the
//!    absolute humidity for the SGP30.
//! 3. SGP30 — receives the absolute humidity *before* its read (the
//!    compensation input affects its internal calibration), then reads.
//! 4. SCD30 — non-blocking; "no new data yet" contributes nothing.
//! 5. LTR559.
//!
//! ## Failure posture
//!
//! A driver failure is logged and that sensor's readings are omitted for
//! the cycle; the loop continues. A failed CPU read leaves the window
//! untouched, so the most recent successful correction stays in effect
//! (identity until the first success). Baseline saves are periodic,
//! explicit, and non-fatal when they fail. There is no save on shutdown.
//!
//! Cadence is best effort: the sleep is fixed, and whatever time blocking
//! driver reads cost is accepted imprecision.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use envirometer_core::compensation::{units, CompensationEngine, TemperatureCompensation};
use envirometer_core::sensors::*;
use envirometer_core::{absolute_humidity, Baseline};

use crate::config::Config;
use crate::drivers::DriverSet;
use crate::export::ExportSink;

/// Single-threaded driver of the sensor-to-metric pipeline.
pub struct Poller {
    drivers: DriverSet,
    sink: Arc<dyn ExportSink>,
    engine: CompensationEngine,
    /// Correction in effect for the current cycle; most recent successful
    /// CPU record, identity before the first.
    compensation: TemperatureCompensation,
    cpu_compensation: bool,
    humidity_compensation: bool,
    baseline_path: PathBuf,
    baseline_save_cycles: u64,
    cycle: u64,
}

/// One cycle's key values, for the trace line and the tests.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleSummary {
    pub cycle: u64,
    pub cpu_temperature: Option<f64>,
    pub temperature: Option<f64>,
    pub pressure_pa: Option<f64>,
    pub humidity_ratio: Option<f64>,
    pub absolute_humidity: Option<f64>,
    pub co2_ppm: Option<f64>,
    pub tvoc_ppb: Option<f64>,
    pub scd30_co2_ppm: Option<f64>,
    pub lux: Option<f64>,
}

impl fmt::Display for CycleSummary {
    /// Fixed-precision trace record, one line per cycle.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle {:6}", self.cycle)?;
        if let Some(v) = self.co2_ppm {
            write!(f, "  eCO2 {v:5.0} ppm")?;
        }
        if let Some(v) = self.tvoc_ppb {
            write!(f, "  TVOC {v:5.0} ppb")?;
        }
        if let Some(v) = self.scd30_co2_ppm {
            write!(f, "  CO2 {v:5.0} ppm")?;
        }
        if let Some(v) = self.temperature {
            write!(f, "  T {v:5.1} C")?;
        }
        if let Some(v) = self.pressure_pa {
            write!(f, "  P {v:6.0} Pa")?;
        }
        if let Some(v) = self.humidity_ratio {
            write!(f, "  RH {:4.1} %", v * 100.0)?;
        }
        if let Some(v) = self.absolute_humidity {
            write!(f, "  AH {v:5.2} g/m3")?;
        }
        if let Some(v) = self.cpu_temperature {
            write!(f, "  CPU {v:5.1} C")?;
        }
        if let Some(v) = self.lux {
            write!(f, "  {v:6.1} lux")?;
        }
        Ok(())
    }
}

impl Poller {
    /// Assemble a poller from validated configuration, built drivers, and
    /// an owned sink.
    pub fn new(config: &Config, drivers: DriverSet, sink: Arc<dyn ExportSink>) -> Self {
        Self {
            drivers,
            sink,
            engine: CompensationEngine::new(config.cpu_compensation_factor, config.cpu_history),
            compensation: TemperatureCompensation::identity(),
            cpu_compensation: config.cpu_compensation,
            humidity_compensation: config.humidity_compensation,
            baseline_path: config.baseline_path.clone(),
            baseline_save_cycles: config.baseline_save_cycles,
            cycle: 0,
        }
    }

    /// Load the persisted SGP30 baseline and restore it into the driver.
    ///
    /// Absent file: normal uncalibrated start. Corrupt or unreadable
    /// file: logged, then uncalibrated start. Never fatal.
    pub fn restore_baseline(&mut self) {
        let Some(sgp30) = self.drivers.sgp30.as_mut() else {
            return;
        };
        match Baseline::load(&self.baseline_path) {
            Ok(Some(baseline)) => match sgp30.restore_baseline(&baseline) {
                Ok(()) => info!(
                    "restored SGP30 baseline co2={} tvoc={} from {}",
                    baseline.co2,
                    baseline.tvoc,
                    self.baseline_path.display()
                ),
                Err(e) => warn!("SGP30 baseline restore failed: {e}"),
            },
            Ok(None) => info!(
                "no baseline at {}; SGP30 starts uncalibrated",
                self.baseline_path.display()
            ),
            Err(e) => warn!("ignoring unusable baseline: {e}"),
        }
    }

    /// Run one poll cycle. Exactly one read attempt per active sensor.
    pub fn run_cycle(&mut self) -> CycleSummary {
        self.cycle += 1;
        let mut summary = CycleSummary {
            cycle: self.cycle,
            ..CycleSummary::default()
        };

        // 1. CPU thermal, first: this cycle's correction must exist
        // before any ambient temperature is exported.
        if let Some(cpu) = self.drivers.cpu.as_mut() {
            match cpu.read_cpu_temperature() {
                Ok(celsius) => {
                    if self.cpu_compensation {
                        self.compensation = self.engine.record_cpu_temperature(celsius);
                    }
                    self.sink.set(CPU_TEMPERATURE_CELSIUS, celsius);
                    summary.cpu_temperature = Some(celsius);
                }
                Err(e) => warn!("cpu thermal read failed, reading omitted: {e}"),
            }
        }

        // 2. Environmental sensor; derives the compensation input for the
        // CO₂/organics sensor further down.
        let mut humidity_input = None;
        if let Some(bme280) = self.drivers.bme280.as_mut() {
            match bme280.read() {
                Ok(climate) => {
                    let corrected = self.compensation.apply(climate.temperature_celsius);
                    let pressure_pa = units::hectopascals_to_pascals(climate.pressure_hpa);
                    let humidity_ratio = units::percent_to_ratio(climate.humidity_pct);
                    self.sink.set(BME280_TEMPERATURE_CELSIUS, corrected);
                    self.sink.set(BME280_PRESSURE_PASCALS, pressure_pa);
                    self.sink.set(BME280_HUMIDITY_RATIO, humidity_ratio);
                    summary.temperature = Some(corrected);
                    summary.pressure_pa = Some(pressure_pa);
                    summary.humidity_ratio = Some(humidity_ratio);
                    if self.humidity_compensation {
                        humidity_input =
                            Some(absolute_humidity(climate.humidity_pct, corrected));
                    }
                }
                Err(e) => warn!("bme280 read failed, readings omitted: {e}"),
            }
        }

        // 3. CO₂/organics sensor: compensation input first, then read.
        if let Some(sgp30) = self.drivers.sgp30.as_mut() {
            if let Some(grams) = humidity_input {
                match sgp30.set_absolute_humidity(grams) {
                    Ok(()) => {
                        self.sink.set(SGP30_ABSOLUTE_HUMIDITY, grams);
                        summary.absolute_humidity = Some(grams);
                    }
                    Err(e) => warn!("sgp30 humidity compensation rejected: {e}"),
                }
            }
            match sgp30.read_air_quality() {
                Ok(aq) => {
                    self.sink.set(SGP30_CO2_PPM, aq.co2_ppm as f64);
                    self.sink.set(SGP30_TVOC_PPB, aq.tvoc_ppb as f64);
                    summary.co2_ppm = Some(aq.co2_ppm as f64);
                    summary.tvoc_ppb = Some(aq.tvoc_ppb as f64);
                }
                Err(e) => warn!("sgp30 read failed, readings omitted: {e}"),
            }
            if self.cycle % self.baseline_save_cycles == 0 {
                self.save_baseline();
            }
        }

        // 4. Non-blocking CO₂ sensor; no new data is not an error.
        if let Some(scd30) = self.drivers.scd30.as_mut() {
            match scd30.try_read() {
                Ok(Some(reading)) => {
                    let corrected = self.compensation.apply(reading.temperature_celsius);
                    self.sink.set(SCD30_CO2_PPM, reading.co2_ppm);
                    self.sink.set(SCD30_TEMPERATURE_CELSIUS, corrected);
                    self.sink
                        .set(SCD30_HUMIDITY_RATIO, units::percent_to_ratio(reading.humidity_pct));
                    summary.scd30_co2_ppm = Some(reading.co2_ppm);
                }
                Ok(None) => debug!("scd30: no new data this cycle"),
                Err(e) => warn!("scd30 read failed, readings omitted: {e}"),
            }
        }

        // 5. Light/proximity.
        if let Some(ltr559) = self.drivers.ltr559.as_mut() {
            match ltr559.read() {
                Ok(reading) => {
                    self.sink.set(LTR559_LUX, reading.lux);
                    self.sink.set(LTR559_PROXIMITY, reading.proximity);
                    summary.lux = Some(reading.lux);
                }
                Err(e) => warn!("ltr559 read failed, readings omitted: {e}"),
            }
        }

        summary
    }

    /// Read the current baseline out of the sensor and persist it.
    fn save_baseline(&mut self) {
        let Some(sgp30) = self.drivers.sgp30.as_mut() else {
            return;
        };
        match sgp30.baseline() {
            Ok(baseline) => match baseline.save(&self.baseline_path) {
                Ok(()) => info!(
                    "saved SGP30 baseline co2={} tvoc={} to {}",
                    baseline.co2,
                    baseline.tvoc,
                    self.baseline_path.display()
                ),
                Err(e) => warn!("baseline save skipped: {e}"),
            },
            Err(e) => warn!("baseline save skipped, driver refused: {e}"),
        }
    }

    /// Poll until `running` clears, sleeping `interval` between cycles.
    pub fn run(&mut self, interval: Duration, running: &AtomicBool) {
        while running.load(Ordering::Relaxed) {
            let summary = self.run_cycle();
            info!("{summary}");
            thread::sleep(interval);
        }
    }

    /// Cycles completed so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }
}
