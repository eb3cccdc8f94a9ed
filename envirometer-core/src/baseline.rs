//! Persisted Calibration Baseline for the CO₂/Organics Sensor
//!
//! The SGP30 self-calibrates against its environment over roughly twelve
//! hours. Losing that state on every restart would mean hours of junk
//! readings, so the daemon persists the two baseline registers to a small
//! file and restores them at startup.
//!
//! ## File format
//!
//! Two ASCII unsigned integers separated by a space, newline terminated:
//!
//! ```text
//! 36051 39012
//! ```
//!
//! (CO₂ baseline first, then TVOC.) The format round-trips exactly
//! through [`Baseline::save`] / [`Baseline::load`].
//!
//! ## Failure semantics
//!
//! - No file at the configured path: [`Baseline::load`] returns
//!   `Ok(None)` and the sensor starts uncalibrated. This is the normal
//!   first-boot case, not an error.
//! - Unreadable or malformed file: an error the caller logs before
//!   degrading to an uncalibrated start. Never fatal to the daemon.
//! - Saves go through a sibling temporary file and a rename, so a crash
//!   mid-write leaves the previous good baseline intact.
//!
//! Saves happen only on explicit request (the daemon's periodic save
//! counter). There is deliberately no save on shutdown; baseline drift is
//! slow and the periodic save bounds the loss.

use std::fs;
use std::io;
use std::path::Path;

use crate::errors::BaselineError;

/// The two calibration registers of the CO₂/organics sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    /// Equivalent-CO₂ baseline register.
    pub co2: u16,
    /// Total-VOC baseline register.
    pub tvoc: u16,
}

impl Baseline {
    /// Read a baseline from `path`.
    ///
    /// `Ok(None)` when the file does not exist ("start uncalibrated");
    /// any other read or parse failure is returned for the caller to log.
    pub fn load(path: &Path) -> Result<Option<Self>, BaselineError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(BaselineError::Io {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };

        let malformed = |reason: String| BaselineError::Malformed {
            path: path.to_path_buf(),
            reason,
        };

        let mut fields = contents.split_whitespace();
        let co2 = fields
            .next()
            .ok_or_else(|| malformed("empty file".into()))?;
        let tvoc = fields
            .next()
            .ok_or_else(|| malformed("missing TVOC field".into()))?;
        if fields.next().is_some() {
            return Err(malformed("trailing data after two fields".into()));
        }

        let co2 = co2
            .parse::<u16>()
            .map_err(|e| malformed(format!("bad CO₂ baseline '{co2}': {e}")))?;
        let tvoc = tvoc
            .parse::<u16>()
            .map_err(|e| malformed(format!("bad TVOC baseline '{tvoc}': {e}")))?;

        Ok(Some(Self { co2, tvoc }))
    }

    /// Atomically write the baseline to `path`.
    ///
    /// Writes `<path>.tmp` in full, then renames it over the target, so
    /// the previous file is either fully replaced or untouched.
    pub fn save(&self, path: &Path) -> Result<(), BaselineError> {
        let io_err = |source: io::Error| BaselineError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");

        fs::write(&tmp, format!("{} {}\n", self.co2, self.tvoc)).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}
