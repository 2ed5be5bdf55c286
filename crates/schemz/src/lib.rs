//! Eligibility matching and multi-party approval workflows for welfare schemes.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
