//! Sensor Capability Set and Exported Metric Names
//!
//! Which sensors a run polls is decided by configuration, once, at
//! startup. Rather than probing drivers at call time, the daemon works
//! from this closed enumeration: each variant declares the metrics it can
//! produce and how its read behaves. Configuration validation (for
//! example "humidity compensation needs both the SGP30 and the BME280")
//! is a set-membership check over `[SensorKind]`.
//!
//! Metric names are the stable export surface; the display client queries
//! the backend with these exact strings, so they live here where both
//! processes can share them.

/// Equivalent CO₂ from the SGP30, parts per million.
pub const SGP30_CO2_PPM: &str = "sgp30_co2_ppm";
/// Total volatile organic compounds from the SGP30, parts per billion.
pub const SGP30_TVOC_PPB: &str = "sgp30_tvoc_ppb";
/// Absolute humidity handed to the SGP30 for compensation, g/m³.
pub const SGP30_ABSOLUTE_HUMIDITY: &str = "sgp30_absolute_humidity_grams_per_cubic_metre";
/// BME280 temperature after CPU compensation, °C.
pub const BME280_TEMPERATURE_CELSIUS: &str = "bme280_temperature_celsius";
/// BME280 pressure, base Pascals.
pub const BME280_PRESSURE_PASCALS: &str = "bme280_pressure_pascals";
/// BME280 relative humidity as a 0–1 ratio.
pub const BME280_HUMIDITY_RATIO: &str = "bme280_humidity_ratio";
/// True CO₂ from the SCD30, parts per million.
pub const SCD30_CO2_PPM: &str = "scd30_co2_ppm";
/// SCD30 temperature after CPU compensation, °C.
pub const SCD30_TEMPERATURE_CELSIUS: &str = "scd30_temperature_celsius";
/// SCD30 relative humidity as a 0–1 ratio.
pub const SCD30_HUMIDITY_RATIO: &str = "scd30_humidity_ratio";
/// Ambient light from the LTR559, lux.
pub const LTR559_LUX: &str = "ltr559_lux";
/// Raw proximity count from the LTR559.
pub const LTR559_PROXIMITY: &str = "ltr559_proximity";
/// Raw CPU temperature used for compensation, °C.
pub const CPU_TEMPERATURE_CELSIUS: &str = "cpu_temperature_celsius";

/// The physical sensors this system knows how to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Ratiometric CO₂ + organics (SGP30). Blocking bus read; consumes an
    /// absolute-humidity compensation input when one is available.
    Sgp30,
    /// Temperature / pressure / humidity (BME280). Blocking bus read.
    Bme280,
    /// True CO₂ + temperature/humidity (SCD30). Non-blocking: a read may
    /// legitimately report "no new data yet".
    Scd30,
    /// Ambient light / proximity (LTR559). Blocking bus read.
    Ltr559,
    /// The host CPU's own thermal sensor, queried through the OS.
    CpuThermal,
}

impl SensorKind {
    /// Label used for the `sensor` export label and in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Sgp30 => "sgp30",
            SensorKind::Bme280 => "bme280",
            SensorKind::Scd30 => "scd30",
            SensorKind::Ltr559 => "ltr559",
            SensorKind::CpuThermal => "cpu",
        }
    }

    /// Exported metric names this sensor can produce in a poll cycle.
    pub fn metrics(&self) -> &'static [&'static str] {
        match self {
            SensorKind::Sgp30 => &[SGP30_CO2_PPM, SGP30_TVOC_PPB, SGP30_ABSOLUTE_HUMIDITY],
            SensorKind::Bme280 => &[
                BME280_TEMPERATURE_CELSIUS,
                BME280_PRESSURE_PASCALS,
                BME280_HUMIDITY_RATIO,
            ],
            SensorKind::Scd30 => &[SCD30_CO2_PPM, SCD30_TEMPERATURE_CELSIUS, SCD30_HUMIDITY_RATIO],
            SensorKind::Ltr559 => &[LTR559_LUX, LTR559_PROXIMITY],
            SensorKind::CpuThermal => &[CPU_TEMPERATURE_CELSIUS],
        }
    }

    /// Whether the driver's read call may block on bus I/O.
    pub fn may_block(&self) -> bool {
        !matches!(self, SensorKind::Scd30)
    }

    /// Whether a read may return "no new data yet" without it being an
    /// error. Only the SCD30 behaves this way.
    pub fn reads_may_be_empty(&self) -> bool {
        matches!(self, SensorKind::Scd30)
    }

    /// Help text for a metric's export registration.
    pub fn metric_help(metric: &str) -> &'static str {
        match metric {
            SGP30_CO2_PPM => "Equivalent carbon dioxide in parts per million",
            SGP30_TVOC_PPB => "Total volatile organic compounds in parts per billion",
            SGP30_ABSOLUTE_HUMIDITY => {
                "Absolute humidity fed to the SGP30 for compensation, grams per cubic metre"
            }
            BME280_TEMPERATURE_CELSIUS => "Ambient temperature in Celsius, CPU-compensated",
            BME280_PRESSURE_PASCALS => "Barometric pressure in Pascals",
            BME280_HUMIDITY_RATIO => "Relative humidity as a 0-1 ratio",
            SCD30_CO2_PPM => "Carbon dioxide in parts per million",
            SCD30_TEMPERATURE_CELSIUS => "SCD30 temperature in Celsius, CPU-compensated",
            SCD30_HUMIDITY_RATIO => "SCD30 relative humidity as a 0-1 ratio",
            LTR559_LUX => "Ambient light in lux",
            LTR559_PROXIMITY => "Raw proximity count, higher is closer",
            CPU_TEMPERATURE_CELSIUS => "Host CPU temperature in Celsius",
            _ => "Sensor reading",
        }
    }
}
