use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use crate::channel::ChannelKind;
use crate::dispatch::DEFAULT_THROTTLE;
use crate::expiry::DEFAULT_WINDOW_DAYS;
use crate::phone::{PhoneRules, DEFAULT_COUNTRY_CODE};

/// India Standard Time, UTC+05:30.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Workflow tunables shared by the API and the worker.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Prepended to bare national phone numbers (default: `91`).
    pub default_country_code: String,
    /// Expiry lookahead in days (default: `5`).
    pub expiry_window_days: u32,
    /// Pause between provider calls (default: 1 second).
    pub dispatch_throttle: Duration,
    /// The gym's local offset, used to decide "today" (default: `+05:30`).
    pub utc_offset: FixedOffset,
    /// Channel used when a request does not name one (default: `sms`).
    pub default_channel: ChannelKind,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            expiry_window_days: DEFAULT_WINDOW_DAYS,
            dispatch_throttle: DEFAULT_THROTTLE,
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
            default_channel: ChannelKind::Sms,
        }
    }
}

impl WorkflowSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `DEFAULT_COUNTRY_CODE`   | `91`    |
    /// | `EXPIRY_WINDOW_DAYS`     | `5`     |
    /// | `DISPATCH_THROTTLE_MS`   | `1000`  |
    /// | `GYM_UTC_OFFSET_MINUTES` | `330`   |
    /// | `DEFAULT_CHANNEL`        | `sms`   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let default_country_code = std::env::var("DEFAULT_COUNTRY_CODE")
            .map(|c| c.trim().trim_start_matches('+').to_string())
            .unwrap_or(defaults.default_country_code);

        let expiry_window_days: u32 = std::env::var("EXPIRY_WINDOW_DAYS")
            .map(|v| v.parse().expect("EXPIRY_WINDOW_DAYS must be a valid u32"))
            .unwrap_or(defaults.expiry_window_days);

        let dispatch_throttle = std::env::var("DISPATCH_THROTTLE_MS")
            .map(|v| {
                Duration::from_millis(v.parse().expect("DISPATCH_THROTTLE_MS must be a valid u64"))
            })
            .unwrap_or(defaults.dispatch_throttle);

        let utc_offset = std::env::var("GYM_UTC_OFFSET_MINUTES")
            .map(|v| {
                let minutes: i32 = v
                    .parse()
                    .expect("GYM_UTC_OFFSET_MINUTES must be a valid i32");
                FixedOffset::east_opt(minutes * 60)
                    .expect("GYM_UTC_OFFSET_MINUTES must be within +/- 24 hours")
            })
            .unwrap_or(defaults.utc_offset);

        let default_channel = std::env::var("DEFAULT_CHANNEL")
            .map(|v| v.parse().expect("DEFAULT_CHANNEL must be sms or whatsapp"))
            .unwrap_or(defaults.default_channel);

        Self {
            default_country_code,
            expiry_window_days,
            dispatch_throttle,
            utc_offset,
            default_channel,
        }
    }

    pub fn phone_rules(&self) -> PhoneRules {
        PhoneRules::with_country_code(&self.default_country_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_conventions() {
        let settings = WorkflowSettings::default();
        assert_eq!(settings.default_country_code, "91");
        assert_eq!(settings.expiry_window_days, 5);
        assert_eq!(settings.dispatch_throttle, Duration::from_secs(1));
        assert_eq!(settings.utc_offset.local_minus_utc(), 330 * 60);
        assert_eq!(settings.default_channel, ChannelKind::Sms);
    }

    #[test]
    fn phone_rules_follow_country_code() {
        let settings = WorkflowSettings {
            default_country_code: "44".to_string(),
            ..WorkflowSettings::default()
        };
        assert_eq!(settings.phone_rules().default_country_code, "44");
    }
}
