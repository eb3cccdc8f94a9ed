//! Error types shared by the core engines.
//!
//! All fallible operations in this crate return one of these via
//! `Result`; callers decide whether a failure is fatal. For the daemon
//! and display processes almost nothing here is: a missing or corrupt
//! baseline degrades to an uncalibrated start, and an untracked trend
//! metric is a programming error surfaced to the log.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures loading or saving the persisted calibration baseline.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// The file exists but could not be read, or the atomic save failed.
    #[error("baseline file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but does not hold two integers.
    #[error("baseline file {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Failures in the trend estimator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrendError {
    /// The metric was never registered with the tracker.
    #[error("metric '{0}' is not tracked")]
    Untracked(String),
}
