//! Daemon side of the envirometer pipeline.
//!
//! Library form of `envirometerd`: configuration, the sensor driver
//! boundary, the export sink, and the polling loop. The binary in
//! `main.rs` only parses flags and wires these together; the pipeline
//! tests drive the same pieces with simulated drivers and an in-memory
//! sink.

#![deny(unsafe_code)]

pub mod config;
pub mod drivers;
pub mod export;
pub mod poll;

pub use config::{Config, ConfigError};
pub use export::{ExportSink, MemorySink, PrometheusSink};
pub use poll::Poller;
