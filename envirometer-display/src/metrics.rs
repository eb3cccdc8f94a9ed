//! Metrics the display knows how to present, and how.
//!
//! A closed table rather than free-form metric strings: each entry pairs
//! the exported query name with its human label, unit, formatting, and a
//! sensible steady-band tolerance for trend classification. Adding a
//! metric to the rotation means adding a variant here.

use std::fmt;

use clap::ValueEnum;
use envirometer_core::sensors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayMetric {
    #[value(name = "sgp30_co2_ppm")]
    Sgp30Co2Ppm,
    #[value(name = "bme280_temperature_celsius")]
    Bme280TemperatureCelsius,
    #[value(name = "bme280_humidity_ratio")]
    Bme280HumidityRatio,
    #[value(name = "scd30_co2_ppm")]
    Scd30Co2Ppm,
}

impl DisplayMetric {
    /// Exported metric name, used verbatim as the backend query.
    pub fn query_name(&self) -> &'static str {
        match self {
            Self::Sgp30Co2Ppm => sensors::SGP30_CO2_PPM,
            Self::Bme280TemperatureCelsius => sensors::BME280_TEMPERATURE_CELSIUS,
            Self::Bme280HumidityRatio => sensors::BME280_HUMIDITY_RATIO,
            Self::Scd30Co2Ppm => sensors::SCD30_CO2_PPM,
        }
    }

    /// Short human name shown on the panel.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sgp30Co2Ppm => "eCO2",
            Self::Bme280TemperatureCelsius => "Temperature",
            Self::Bme280HumidityRatio => "Humidity",
            Self::Scd30Co2Ppm => "CO2",
        }
    }

    /// Unit suffix shown after the value.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Sgp30Co2Ppm | Self::Scd30Co2Ppm => "ppm",
            Self::Bme280TemperatureCelsius => "°C",
            Self::Bme280HumidityRatio => "%",
        }
    }

    /// Render a raw exported value for the panel.
    ///
    /// Humidity is exported as a 0–1 ratio but displayed as a whole
    /// percentage; concentrations as whole ppm; temperature to one
    /// decimal.
    pub fn format(&self, value: f64) -> String {
        match self {
            Self::Sgp30Co2Ppm | Self::Scd30Co2Ppm => format!("{value:.0}"),
            Self::Bme280TemperatureCelsius => format!("{value:.1}"),
            Self::Bme280HumidityRatio => format!("{:.0}", (value * 100.0).round()),
        }
    }

    /// Equality tolerance for trend classification, in the metric's
    /// exported unit. Differences within this band read as steady.
    pub fn tolerance(&self) -> f64 {
        match self {
            Self::Sgp30Co2Ppm | Self::Scd30Co2Ppm => 10.0,
            Self::Bme280TemperatureCelsius => 0.2,
            Self::Bme280HumidityRatio => 0.01,
        }
    }
}

impl fmt::Display for DisplayMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_name())
    }
}
