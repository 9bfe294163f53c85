//! API process configuration.
//!
//! Read once at startup. Besides the HTTP listener it carries the workflow
//! tunables shared with the worker and the messaging provider credentials,
//! so `main` builds everything from one value.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use gymflow_core::WorkflowSettings;
use gymflow_notify::ProviderConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Front-desk origins allowed by CORS, from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Limit for ordinary requests (default: `30`). Notification dispatch is
    /// exempt; see [`crate::router`].
    pub request_timeout_secs: u64,
    /// Grace period for in-flight dispatches after the listener stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Operator token validation.
    pub jwt: JwtConfig,
    /// Country code, expiry window, dispatch throttle, gym offset and default channel.
    pub workflow: WorkflowSettings,
    /// WhatsApp and Twilio credentials; absent providers get no channel.
    pub providers: ProviderConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    ///
    /// plus `JWT_SECRET` ([`JwtConfig::from_env`]), the workflow variables
    /// ([`WorkflowSettings::from_env`]) and the provider credentials
    /// ([`ProviderConfig::from_env`]).
    ///
    /// Panics on malformed values.
    pub fn from_env() -> Self {
        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 30);
        assert!(request_timeout_secs > 0, "REQUEST_TIMEOUT_SECS must be positive");

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000),
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
            ),
            request_timeout_secs,
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            workflow: WorkflowSettings::from_env(),
            providers: ProviderConfig::from_env(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} is invalid ('{raw}'): {e}")),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
