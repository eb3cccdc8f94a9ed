//! CPU thermal readout via the firmware's `vcgencmd` tool.
//!
//! The Pi firmware exposes the SoC temperature through
//! `vcgencmd measure_temp`, which prints a single line:
//!
//! ```text
//! temp=48.3'C
//! ```
//!
//! The shell-out is the OS-call boundary; everything above it depends
//! only on the [`CpuThermal`] trait. A failed spawn, a non-zero exit, or
//! output that does not match the line above is a [`DriverError`] the
//! poller logs before moving on — the cycle simply lacks a CPU reading.

use std::path::PathBuf;
use std::process::Command;

use super::{CpuThermal, DriverError};

const TOOL: &str = "vcgencmd";

/// Subprocess-based CPU thermal source.
pub struct Vcgencmd {
    command: PathBuf,
}

impl Vcgencmd {
    /// Use a specific binary (tests point this at a stub script).
    pub fn with_command(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn parse(output: &str) -> Option<f64> {
        output
            .trim()
            .strip_prefix("temp=")?
            .strip_suffix("'C")?
            .parse()
            .ok()
    }
}

impl Default for Vcgencmd {
    fn default() -> Self {
        Self::with_command(TOOL)
    }
}

impl CpuThermal for Vcgencmd {
    fn read_cpu_temperature(&mut self) -> Result<f64, DriverError> {
        let output = Command::new(&self.command)
            .arg("measure_temp")
            .output()
            .map_err(|source| DriverError::Os { tool: TOOL, source })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            return Err(DriverError::Unparseable {
                tool: TOOL,
                output: format!("exit {}: {}", output.status, stdout.trim()),
            });
        }

        Self::parse(&stdout).ok_or_else(|| DriverError::Unparseable {
            tool: TOOL,
            output: stdout.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_firmware_output() {
        assert_eq!(Vcgencmd::parse("temp=48.3'C\n"), Some(48.3));
        assert_eq!(Vcgencmd::parse("temp=50.0'C"), Some(50.0));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "48.3", "temp=", "temp=hot'C", "temp=48.3"] {
            assert_eq!(Vcgencmd::parse(bad), None, "accepted {bad:?}");
        }
    }

    #[test]
    fn missing_binary_is_an_os_error() {
        let mut source = Vcgencmd::with_command("/nonexistent/vcgencmd");
        match source.read_cpu_temperature() {
            Err(DriverError::Os { tool, .. }) => assert_eq!(tool, "vcgencmd"),
            other => panic!("expected Os error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn reads_through_a_stub_tool() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("vcgencmd");
        std::fs::write(&script, "#!/bin/sh\necho \"temp=42.8'C\"\n").unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let mut source = Vcgencmd::with_command(&script);
        let temp = source.read_cpu_temperature().unwrap();
        assert!((temp - 42.8).abs() < 1e-9);
    }
}
