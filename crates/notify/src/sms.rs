//! Twilio SMS channel.

use async_trait::async_trait;
use gymflow_core::channel::{ChannelKind, MessageChannel, SendError};

use crate::{http_client, non_empty_env, rejected, transport};

/// Twilio REST host used when `TWILIO_API_BASE` is not set.
pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Credentials for the Twilio Messages API.
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in `+<country><number>` form.
    pub from_number: String,
    pub api_base: String,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("from_number", &self.from_number)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TwilioConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless all three credentials are set.
    ///
    /// | Variable              | Required | Default                  |
    /// |-----------------------|----------|--------------------------|
    /// | `TWILIO_ACCOUNT_SID`  | yes      |                          |
    /// | `TWILIO_AUTH_TOKEN`   | yes      |                          |
    /// | `TWILIO_PHONE_NUMBER` | yes      |                          |
    /// | `TWILIO_API_BASE`     | no       | `https://api.twilio.com` |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            account_sid: non_empty_env("TWILIO_ACCOUNT_SID")?,
            auth_token: non_empty_env("TWILIO_AUTH_TOKEN")?,
            from_number: non_empty_env("TWILIO_PHONE_NUMBER")?,
            api_base: std::env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

/// Sends SMS through Twilio.
pub struct SmsChannel {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl SmsChannel {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: http_client(),
            config,
        }
    }
}

#[async_trait]
impl MessageChannel for SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), SendError> {
        let form = [
            ("From", self.config.from_number.as_str()),
            ("To", to),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let err = rejected(response).await;
            tracing::warn!(error = %err, "Twilio rejected message");
            return Err(err);
        }
        Ok(())
    }
}
