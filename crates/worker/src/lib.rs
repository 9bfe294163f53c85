//! Gymflow background worker.
//!
//! Runs the expiry reminder sweep on a fixed cadence, or once for
//! cron-style scheduling, independently of any operator session.

pub mod config;
pub mod expiry_job;

pub use config::JobConfig;
pub use expiry_job::{ExpiryJob, SweepSummary};
