//! `envirometer-display` — rotating trend-annotated sensor readout.
//!
//! Cycles through the configured metrics at a fixed delay. Each step
//! fetches the latest exported value, pushes it into the trend tracker,
//! and renders value + direction glyph; a failed fetch renders an error
//! frame and the metric is simply retried on its next turn. On the way
//! out (interrupt) the panel is blanked.
//!
//! `--once` skips the panel and trend state entirely: every configured
//! metric is fetched a single time and printed as one line, suitable
//! for shells and status bars.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use log::{error, info, warn};

use envirometer_core::TrendTracker;

mod metrics;
mod screen;
mod source;

use metrics::DisplayMetric;
use screen::{DisplayPanel, Frame, TerminalPanel};
use source::PrometheusSource;

#[derive(Parser, Debug)]
#[command(
    name = "envirometer-display",
    version,
    about = "Show sensor trends from the exported metrics feed",
    allow_negative_numbers = true
)]
struct Args {
    /// Prometheus address.
    #[arg(long, default_value = "http://localhost:9090")]
    prometheus: String,

    /// Instance to show values from.
    #[arg(long, default_value = "lounge")]
    instance: String,

    /// Job the exporter is scraped under.
    #[arg(long, default_value = source::DEFAULT_JOB)]
    job: String,

    /// Metrics to rotate through, in order.
    #[arg(long, value_enum, num_args = 1.., default_values_t = vec![
        DisplayMetric::Sgp30Co2Ppm,
        DisplayMetric::Bme280TemperatureCelsius,
        DisplayMetric::Bme280HumidityRatio,
    ])]
    metrics: Vec<DisplayMetric>,

    /// Seconds of history to judge trends over.
    #[arg(long, default_value_t = 60.0)]
    lookback: f64,

    /// Seconds to hold each metric before moving to the next.
    #[arg(long, default_value_t = 2.0)]
    delay: f64,

    /// Maximum tolerated age of sensor values before ignoring them.
    #[arg(long, default_value_t = 60.0)]
    max_age: f64,

    /// Steady-band tolerance override, applied to every metric in place
    /// of the per-metric defaults.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Fetch each metric once, print a single readout line, and exit.
    #[arg(long)]
    once: bool,
}

impl Args {
    fn validate(&self) -> Result<(), String> {
        if !(self.delay.is_finite() && self.delay > 0.0) {
            return Err("--delay must be a positive number of seconds".into());
        }
        if !(self.lookback.is_finite() && self.lookback >= self.delay) {
            return Err("--lookback must be at least one --delay".into());
        }
        if !(self.max_age.is_finite() && self.max_age > 0.0) {
            return Err("--max-age must be a positive number of seconds".into());
        }
        if let Some(tolerance) = self.tolerance {
            if !(tolerance.is_finite() && tolerance >= 0.0) {
                return Err("--tolerance must be a non-negative number".into());
            }
        }
        Ok(())
    }

    /// Steady-band tolerance in effect for a metric: the override when
    /// given, the metric's own default otherwise.
    fn tolerance_for(&self, metric: &DisplayMetric) -> f64 {
        self.tolerance.unwrap_or_else(|| metric.tolerance())
    }

    /// Samples retained per metric: one full rotation of lookback, never
    /// fewer than the two a classification needs.
    fn history_capacity(&self) -> usize {
        let per_visit = self.delay * self.metrics.len() as f64;
        ((self.lookback / per_visit).ceil() as usize).max(2)
    }
}

/// Single readout line: `Label: value unit` per metric, two-space
/// separated, with `[ERROR]` standing in for anything that could not be
/// fetched. Always produces a full line; failures are reported via the
/// log, not the exit status.
fn readout_line<F>(metrics: &[DisplayMetric], mut fetch: F) -> String
where
    F: FnMut(&DisplayMetric) -> Result<f64, source::FetchError>,
{
    let parts: Vec<String> = metrics
        .iter()
        .map(|metric| {
            let value_text = match fetch(metric) {
                Ok(value) => metric.format(value),
                Err(e) => {
                    warn!("{e}");
                    "[ERROR]".to_string()
                }
            };
            format!("{}: {}{}", metric.label(), value_text, metric.unit())
        })
        .collect();
    parts.join("  ")
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(message) = args.validate() {
        error!("configuration error: {message}");
        return ExitCode::FAILURE;
    }

    let source = PrometheusSource::new(&args.prometheus, &args.instance, &args.job, args.max_age);

    if args.once {
        println!("{}", readout_line(&args.metrics, |m| source.fetch(m.query_name())));
        return ExitCode::SUCCESS;
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::Relaxed)) {
            error!("cannot install signal handler: {e}");
            return ExitCode::FAILURE;
        }
    }

    let mut tracker = TrendTracker::new();
    let capacity = args.history_capacity();
    for metric in &args.metrics {
        tracker.track(metric.query_name(), capacity, args.tolerance_for(metric));
    }

    let mut panel = TerminalPanel::new();
    panel.set_backlight(true);
    info!(
        "rotating {} metrics every {:.1}s, {} samples of history each",
        args.metrics.len(),
        args.delay,
        capacity
    );

    let delay = Duration::from_secs_f64(args.delay);
    'rotation: loop {
        for metric in &args.metrics {
            if !running.load(Ordering::Relaxed) {
                break 'rotation;
            }

            let name = metric.query_name();
            let frame = match source.fetch(name) {
                Ok(value) => {
                    // Registered above; push/classify cannot miss.
                    let _ = tracker.push(name, now_millis(), value);
                    let trend = tracker.classify(name).ok().flatten();
                    Frame {
                        label: metric.label().to_string(),
                        value_text: metric.format(value),
                        unit: metric.unit(),
                        glyph: trend.map(|t| t.glyph()),
                    }
                }
                Err(e) => {
                    // Stale or missing data reads as an error frame; the
                    // retry is simply this metric's next turn.
                    warn!("{e}");
                    Frame::error(metric.label())
                }
            };
            panel.draw(&frame);
            thread::sleep(delay);
        }
    }

    info!("turning off display");
    panel.set_backlight(false);
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["envirometer-display"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_rotate_the_classic_three() {
        let args = args(&[]);
        assert_eq!(
            args.metrics,
            vec![
                DisplayMetric::Sgp30Co2Ppm,
                DisplayMetric::Bme280TemperatureCelsius,
                DisplayMetric::Bme280HumidityRatio,
            ]
        );
        assert!(args.validate().is_ok());
    }

    #[test]
    fn metric_names_parse_as_flags() {
        let args = args(&["--metrics", "scd30_co2_ppm", "bme280_temperature_celsius"]);
        assert_eq!(
            args.metrics,
            vec![
                DisplayMetric::Scd30Co2Ppm,
                DisplayMetric::Bme280TemperatureCelsius,
            ]
        );
    }

    #[test]
    fn capacity_covers_lookback_with_a_floor_of_two() {
        // 60s lookback / (2s delay * 3 metrics) = 10 samples.
        assert_eq!(args(&[]).history_capacity(), 10);
        // Tiny lookback still leaves enough to classify.
        let a = args(&["--lookback", "2.0", "--delay", "2.0"]);
        assert_eq!(a.history_capacity(), 2);
    }

    #[test]
    fn nonsense_timing_is_rejected() {
        assert!(args(&["--delay", "0"]).validate().is_err());
        assert!(args(&["--lookback", "1.0", "--delay", "2.0"]).validate().is_err());
        assert!(args(&["--max-age", "-1"]).validate().is_err());
        assert!(args(&["--tolerance", "-0.5"]).validate().is_err());
        assert!(args(&["--tolerance", "nan"]).validate().is_err());
    }

    #[test]
    fn tolerance_flag_overrides_every_metric() {
        let defaults = args(&[]);
        assert_eq!(
            defaults.tolerance_for(&DisplayMetric::Sgp30Co2Ppm),
            DisplayMetric::Sgp30Co2Ppm.tolerance()
        );

        let overridden = args(&["--tolerance", "3.5"]);
        assert!(overridden.validate().is_ok());
        for metric in &overridden.metrics {
            assert_eq!(overridden.tolerance_for(metric), 3.5);
        }
    }

    #[test]
    fn readout_line_joins_all_metrics() {
        let metrics = [
            DisplayMetric::Sgp30Co2Ppm,
            DisplayMetric::Bme280TemperatureCelsius,
            DisplayMetric::Bme280HumidityRatio,
        ];
        let line = readout_line(&metrics, |m| match m {
            DisplayMetric::Sgp30Co2Ppm => Ok(412.0),
            DisplayMetric::Bme280TemperatureCelsius => Ok(19.44),
            DisplayMetric::Bme280HumidityRatio => Ok(0.45),
            _ => unreachable!(),
        });
        assert_eq!(line, "eCO2: 412ppm  Temperature: 19.4°C  Humidity: 45%");
    }

    #[test]
    fn readout_line_marks_failed_fetches() {
        let metrics = [DisplayMetric::Sgp30Co2Ppm, DisplayMetric::Scd30Co2Ppm];
        let line = readout_line(&metrics, |m| match m {
            DisplayMetric::Scd30Co2Ppm => Ok(615.0),
            _ => Err(source::FetchError::NoData {
                metric: m.query_name().to_string(),
                instance: "lounge".to_string(),
                job: source::DEFAULT_JOB.to_string(),
            }),
        });
        assert_eq!(line, "eCO2: [ERROR]ppm  CO2: 615ppm");
    }

    #[test]
    fn once_flag_parses() {
        let args = args(&["--once"]);
        assert!(args.once);
        assert!(args.validate().is_ok());
    }
}
