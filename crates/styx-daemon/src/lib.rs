//! styx-daemon
//!
//! HTTP façade over the STYX belief-computation core. Marshals JSON into
//! core calls and back; the core itself never touches the wire.

pub mod api;
pub mod config;
pub mod telemetry;
