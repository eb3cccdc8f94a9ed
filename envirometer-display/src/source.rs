//! Prometheus instant-query client.
//!
//! The display asks the backend for the latest value of one metric per
//! rotation step. The instant-query API cannot filter by instance/job in
//! the query string for a bare metric name, so we ask for every series of
//! that metric and pick ours out of the result vector, exactly as the
//! backend returns it:
//!
//! ```json
//! {"status":"success","data":{"resultType":"vector","result":[
//!   {"metric":{"__name__":"sgp30_co2_ppm","instance":"lounge","job":"enviro-sensors"},
//!    "value":[1700000000.123,"412"]}]}}
//! ```
//!
//! Samples older than the configured maximum age are treated as missing:
//! a wedged daemon should read as "no data", not as a frozen value.
//!
//! Every failure mode gets its own error variant so the rotation loop can
//! log something actionable, but the handling is uniform: log, show an
//! error frame, try again on the next visit.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use thiserror::Error;

/// Job label the daemon's scrape target is registered under.
pub const DEFAULT_JOB: &str = "enviro-sensors";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error querying Prometheus: {0}")]
    Transport(String),

    #[error("Prometheus returned HTTP {0}")]
    Status(u16),

    #[error("got bad JSON from Prometheus: {0}")]
    BadJson(String),

    #[error("non-success response from Prometheus: {0}")]
    NonSuccess(String),

    #[error("no data for {metric} instance=\"{instance}\", job=\"{job}\"")]
    NoData {
        metric: String,
        instance: String,
        job: String,
    },

    #[error("data for {metric} is too old ({age_secs:.1} > {max_age_secs:.1} seconds)")]
    Stale {
        metric: String,
        age_secs: f64,
        max_age_secs: f64,
    },

    #[error("bad metric value {0:?} from Prometheus")]
    BadValue(String),
}

/// Instant-query response, success shape.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    #[serde(default)]
    pub data: QueryData,
}

#[derive(Debug, Deserialize, Default)]
pub struct QueryData {
    #[serde(default)]
    pub result: Vec<VectorSample>,
}

#[derive(Debug, Deserialize)]
pub struct VectorSample {
    pub metric: HashMap<String, String>,
    /// `[unix_seconds, "value"]` — Prometheus sends the value as a string.
    pub value: (f64, String),
}

/// Latest-value source backed by a Prometheus instant query.
pub struct PrometheusSource {
    agent: ureq::Agent,
    base_url: String,
    instance: String,
    job: String,
    max_age_secs: f64,
}

impl PrometheusSource {
    pub fn new(base_url: impl Into<String>, instance: impl Into<String>, job: impl Into<String>, max_age_secs: f64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("envirometer-display/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.into(),
            instance: instance.into(),
            job: job.into(),
            max_age_secs,
        }
    }

    /// Latest value of `metric` for our instance and job.
    pub fn fetch(&self, metric: &str) -> Result<f64, FetchError> {
        let url = format!("{}/api/v1/query", self.base_url);
        let response = self
            .agent
            .get(&url)
            .query("query", metric)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => FetchError::Status(code),
                ureq::Error::Transport(t) => FetchError::Transport(t.to_string()),
            })?;

        // Remember when we asked so the too-old check is made against the
        // moment of the query, not whenever parsing finished.
        let asked_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();

        let text = response
            .into_string()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let parsed: QueryResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::BadJson(e.to_string()))?;

        extract_value(
            &parsed,
            metric,
            &self.instance,
            &self.job,
            asked_at,
            self.max_age_secs,
        )
    }
}

/// Pick our series out of the result vector and vet its age.
fn extract_value(
    response: &QueryResponse,
    metric: &str,
    instance: &str,
    job: &str,
    asked_at: f64,
    max_age_secs: f64,
) -> Result<f64, FetchError> {
    if response.status != "success" {
        return Err(FetchError::NonSuccess(response.status.clone()));
    }
    for sample in &response.data.result {
        let matches = sample.metric.get("instance").map(String::as_str) == Some(instance)
            && sample.metric.get("job").map(String::as_str) == Some(job);
        if !matches {
            continue;
        }
        let (sampled_at, ref raw) = sample.value;
        let age = asked_at - sampled_at;
        if age > max_age_secs {
            return Err(FetchError::Stale {
                metric: metric.to_string(),
                age_secs: age,
                max_age_secs,
            });
        }
        return raw
            .parse::<f64>()
            .map_err(|_| FetchError::BadValue(raw.clone()));
    }
    Err(FetchError::NoData {
        metric: metric.to_string(),
        instance: instance.to_string(),
        job: job.to_string(),
    })
}
