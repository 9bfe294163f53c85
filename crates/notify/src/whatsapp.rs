//! WhatsApp Cloud API channel.

use async_trait::async_trait;
use gymflow_core::channel::{ChannelKind, MessageChannel, SendError};

use crate::{http_client, non_empty_env, rejected, transport};

/// Graph API host used when `WHATSAPP_API_BASE` is not set.
pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com";

/// Graph API version the message endpoint is pinned to.
const GRAPH_API_VERSION: &str = "v18.0";

/// Credentials for the WhatsApp Cloud API.
#[derive(Clone)]
pub struct WhatsAppConfig {
    pub access_token: String,
    /// Sender phone number id from the WhatsApp Business account.
    pub phone_number_id: String,
    pub api_base: String,
}

impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("phone_number_id", &self.phone_number_id)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl WhatsAppConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless both credentials are set.
    ///
    /// | Variable                   | Required | Default                      |
    /// |----------------------------|----------|------------------------------|
    /// | `WHATSAPP_ACCESS_TOKEN`    | yes      |                              |
    /// | `WHATSAPP_PHONE_NUMBER_ID` | yes      |                              |
    /// | `WHATSAPP_API_BASE`        | no       | `https://graph.facebook.com` |
    pub fn from_env() -> Option<Self> {
        let access_token = non_empty_env("WHATSAPP_ACCESS_TOKEN")?;
        let phone_number_id = non_empty_env("WHATSAPP_PHONE_NUMBER_ID")?;
        Some(Self {
            access_token,
            phone_number_id,
            api_base: std::env::var("WHATSAPP_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{GRAPH_API_VERSION}/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.phone_number_id
        )
    }
}

/// Sends plain-text WhatsApp messages.
pub struct WhatsAppChannel {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppChannel {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            client: http_client(),
            config,
        }
    }
}

#[async_trait]
impl MessageChannel for WhatsAppChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Whatsapp
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), SendError> {
        // The Cloud API wants the number without the leading `+`.
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to.trim_start_matches('+'),
            "type": "text",
            "text": { "body": body },
        });

        let response = self
            .client
            .post(self.config.messages_url())
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let err = rejected(response).await;
            tracing::warn!(error = %err, "WhatsApp API rejected message");
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> WhatsAppConfig {
        WhatsAppConfig {
            access_token: "secret".to_string(),
            phone_number_id: "10987".to_string(),
            api_base: base.to_string(),
        }
    }

    #[test]
    fn messages_url_is_versioned() {
        assert_eq!(
            config("https://graph.facebook.com/").messages_url(),
            "https://graph.facebook.com/v18.0/10987/messages"
        );
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", config(DEFAULT_API_BASE));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("10987"));
    }
}
