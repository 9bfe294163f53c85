//! Messaging provider clients.
//!
//! - [`whatsapp::WhatsAppChannel`]: WhatsApp Cloud API text messages.
//! - [`sms::SmsChannel`]: Twilio programmable SMS.
//!
//! Both implement [`gymflow_core::MessageChannel`]. A provider is registered
//! only when its credentials are present in the environment.

use std::sync::Arc;
use std::time::Duration;

use gymflow_core::channel::{ChannelRegistry, SendError};

pub mod sms;
pub mod whatsapp;

pub use sms::{SmsChannel, TwilioConfig};
pub use whatsapp::{WhatsAppChannel, WhatsAppConfig};

/// HTTP request timeout for a single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on how much of a provider error body is kept for diagnostics.
const MAX_ERROR_BODY: usize = 512;

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build reqwest HTTP client")
}

/// Read a failed response into a [`SendError::Rejected`].
async fn rejected(response: reqwest::Response) -> SendError {
    let status = response.status().as_u16();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    SendError::Rejected { status, body }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn transport(err: reqwest::Error) -> SendError {
    SendError::Transport(err.to_string())
}

/// Credentials for every provider. A provider left as `None` gets no channel.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub whatsapp: Option<WhatsAppConfig>,
    pub twilio: Option<TwilioConfig>,
}

impl ProviderConfig {
    /// Read both providers' credentials; see [`WhatsAppConfig::from_env`] and
    /// [`TwilioConfig::from_env`].
    pub fn from_env() -> Self {
        Self {
            whatsapp: WhatsAppConfig::from_env(),
            twilio: TwilioConfig::from_env(),
        }
    }

    /// A registry with one channel per configured provider.
    pub fn registry(&self) -> ChannelRegistry {
        let mut registry = ChannelRegistry::new();

        match &self.whatsapp {
            Some(config) => {
                registry.register(Arc::new(WhatsAppChannel::new(config.clone())));
                tracing::info!(phone_number_id = %config.phone_number_id, "WhatsApp channel configured");
            }
            None => tracing::info!("WHATSAPP_ACCESS_TOKEN not set, WhatsApp channel disabled"),
        }

        match &self.twilio {
            Some(config) => {
                registry.register(Arc::new(SmsChannel::new(config.clone())));
                tracing::info!(from = %config.from_number, "SMS channel configured");
            }
            None => tracing::info!("TWILIO_ACCOUNT_SID not set, SMS channel disabled"),
        }

        registry
    }
}

/// Build the registry from whichever provider credentials are set.
pub fn channels_from_env() -> ChannelRegistry {
    ProviderConfig::from_env().registry()
}
