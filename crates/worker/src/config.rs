use std::time::Duration;

/// Default pause between expiry sweeps: once a day.
const DEFAULT_INTERVAL_SECS: u64 = 86_400;

/// Scheduling for the expiry reminder job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Time between sweeps (default: 24 hours).
    pub interval: Duration,
    /// Run one sweep and exit, for cron-style invocation (default: `false`).
    pub run_once: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            run_once: false,
        }
    }
}

impl JobConfig {
    /// Load job configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `EXPIRY_CHECK_INTERVAL_SECS` | `86400` |
    /// | `EXPIRY_RUN_ONCE`            | `false` |
    pub fn from_env() -> Self {
        let interval_secs: u64 = std::env::var("EXPIRY_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_INTERVAL_SECS.to_string())
            .parse()
            .expect("EXPIRY_CHECK_INTERVAL_SECS must be a valid u64");
        assert!(interval_secs > 0, "EXPIRY_CHECK_INTERVAL_SECS must be positive");

        let run_once = std::env::var("EXPIRY_RUN_ONCE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            interval: Duration::from_secs(interval_secs),
            run_once,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
