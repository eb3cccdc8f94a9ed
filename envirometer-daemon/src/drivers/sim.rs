//! Deterministic simulated drivers.
//!
//! Used by `--simulate` for development away from the hardware and by the
//! pipeline tests. Each simulation returns fixed values so a test can
//! predict every exported number; the SGP30 simulation additionally
//! records the compensation input it held at read time, which is how the
//! tests pin down the "humidity before read" ordering contract.

use envirometer_core::Baseline;

use super::{
    AirQuality, Bme280, Climate, CpuThermal, DriverError, LightProximity, Ltr559, Scd30,
    Scd30Reading, Sgp30,
};

/// Constant CPU temperature.
pub struct SimCpuThermal {
    temperature: f64,
}

impl SimCpuThermal {
    pub fn new(temperature: f64) -> Self {
        Self { temperature }
    }
}

impl CpuThermal for SimCpuThermal {
    fn read_cpu_temperature(&mut self) -> Result<f64, DriverError> {
        Ok(self.temperature)
    }
}

/// SGP30 simulation with inspectable compensation state.
pub struct SimSgp30 {
    co2_ppm: u16,
    tvoc_ppb: u16,
    baseline: Baseline,
    restored: Option<Baseline>,
    humidity: Option<f64>,
    /// Compensation input in effect when the last read happened.
    humidity_at_last_read: Option<f64>,
    reads: u64,
}

impl SimSgp30 {
    pub fn new(co2_ppm: u16, tvoc_ppb: u16) -> Self {
        Self {
            co2_ppm,
            tvoc_ppb,
            baseline: Baseline { co2: 36051, tvoc: 39012 },
            restored: None,
            humidity: None,
            humidity_at_last_read: None,
            reads: 0,
        }
    }

    /// Compensation input the driver held when it last produced data.
    pub fn humidity_at_last_read(&self) -> Option<f64> {
        self.humidity_at_last_read
    }

    /// Baseline handed to [`Sgp30::restore_baseline`], if any.
    pub fn restored(&self) -> Option<Baseline> {
        self.restored
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl Sgp30 for SimSgp30 {
    fn set_absolute_humidity(&mut self, grams_per_cubic_metre: f64) -> Result<(), DriverError> {
        self.humidity = Some(grams_per_cubic_metre);
        Ok(())
    }

    fn read_air_quality(&mut self) -> Result<AirQuality, DriverError> {
        self.reads += 1;
        self.humidity_at_last_read = self.humidity;
        Ok(AirQuality {
            co2_ppm: self.co2_ppm,
            tvoc_ppb: self.tvoc_ppb,
        })
    }

    fn baseline(&mut self) -> Result<Baseline, DriverError> {
        Ok(self.baseline)
    }

    fn restore_baseline(&mut self, baseline: &Baseline) -> Result<(), DriverError> {
        self.restored = Some(*baseline);
        self.baseline = *baseline;
        Ok(())
    }
}

/// Constant climate.
pub struct SimBme280 {
    climate: Climate,
}

impl SimBme280 {
    pub fn new(temperature_celsius: f64, pressure_hpa: f64, humidity_pct: f64) -> Self {
        Self {
            climate: Climate {
                temperature_celsius,
                pressure_hpa,
                humidity_pct,
            },
        }
    }
}

impl Bme280 for SimBme280 {
    fn read(&mut self) -> Result<Climate, DriverError> {
        Ok(self.climate)
    }
}

/// SCD30 simulation producing data on every `interval`-th attempt.
///
/// The real sensor measures on its own cadence and reports "no new data
/// yet" in between; `interval` of 2 means every other poll has data.
pub struct SimScd30 {
    reading: Scd30Reading,
    interval: u64,
    attempts: u64,
}

impl SimScd30 {
    pub fn new(reading: Scd30Reading, interval: u64) -> Self {
        Self {
            reading,
            interval: interval.max(1),
            attempts: 0,
        }
    }
}

impl Scd30 for SimScd30 {
    fn try_read(&mut self) -> Result<Option<Scd30Reading>, DriverError> {
        self.attempts += 1;
        if self.attempts % self.interval == 0 {
            Ok(Some(self.reading))
        } else {
            Ok(None)
        }
    }
}

/// Constant light/proximity.
pub struct SimLtr559 {
    reading: LightProximity,
}

impl SimLtr559 {
    pub fn new(lux: f64, proximity: f64) -> Self {
        Self {
            reading: LightProximity { lux, proximity },
        }
    }
}

impl Ltr559 for SimLtr559 {
    fn read(&mut self) -> Result<LightProximity, DriverError> {
        Ok(self.reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sgp30_records_compensation_at_read_time() {
        let mut sgp = SimSgp30::new(400, 10);
        sgp.read_air_quality().unwrap();
        assert_eq!(sgp.humidity_at_last_read(), None);

        sgp.set_absolute_humidity(9.7).unwrap();
        sgp.read_air_quality().unwrap();
        assert_eq!(sgp.humidity_at_last_read(), Some(9.7));
        assert_eq!(sgp.reads(), 2);
    }

    #[test]
    fn scd30_reports_not_ready_between_measurements() {
        let reading = Scd30Reading {
            co2_ppm: 600.0,
            temperature_celsius: 21.0,
            humidity_pct: 50.0,
        };
        let mut scd = SimScd30::new(reading, 3);
        assert_eq!(scd.try_read().unwrap(), None);
        assert_eq!(scd.try_read().unwrap(), None);
        assert_eq!(scd.try_read().unwrap(), Some(reading));
        assert_eq!(scd.try_read().unwrap(), None);
    }
}
