//! Outbound messaging channel abstraction and registry.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which external messaging provider a dispatch goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Plain SMS.
    Sms,
    /// Rich-text messages on WhatsApp.
    Whatsapp,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Sms => "sms",
            ChannelKind::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sms" => Ok(ChannelKind::Sms),
            "whatsapp" => Ok(ChannelKind::Whatsapp),
            other => Err(format!(
                "Invalid channel '{other}'. Must be one of: sms, whatsapp"
            )),
        }
    }
}

/// A single failed send, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The request never completed (DNS, TLS, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(String),
}

/// An external provider that delivers a text message to one phone number.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Deliver `body` to the normalized `+<country><number>` recipient.
    async fn send(&self, to: &str, body: &str) -> Result<(), SendError>;
}

/// The channels whose credentials are present in this deployment.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: HashMap<ChannelKind, Arc<dyn MessageChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel, replacing any previous one of the same kind.
    pub fn register(&mut self, channel: Arc<dyn MessageChannel>) {
        self.channels.insert(channel.kind(), channel);
    }

    pub fn with(mut self, channel: Arc<dyn MessageChannel>) -> Self {
        self.register(channel);
        self
    }

    pub fn get(&self, kind: ChannelKind) -> Option<Arc<dyn MessageChannel>> {
        self.channels.get(&kind).cloned()
    }

    pub fn is_configured(&self, kind: ChannelKind) -> bool {
        self.channels.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Configured channel kinds, in a stable order.
    pub fn kinds(&self) -> Vec<ChannelKind> {
        let mut kinds: Vec<_> = self.channels.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

impl fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingChannel;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("SMS".parse::<ChannelKind>().unwrap(), ChannelKind::Sms);
        assert_eq!(
            " WhatsApp ".parse::<ChannelKind>().unwrap(),
            ChannelKind::Whatsapp
        );
        assert!("email".parse::<ChannelKind>().is_err());
    }

    #[test]
    fn empty_registry_has_no_channels() {
        let registry = ChannelRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(ChannelKind::Sms).is_none());
    }

    #[test]
    fn registered_channel_is_found_by_kind() {
        let registry = ChannelRegistry::new()
            .with(Arc::new(RecordingChannel::new(ChannelKind::Whatsapp)))
            .with(Arc::new(RecordingChannel::new(ChannelKind::Sms)));
        assert!(registry.is_configured(ChannelKind::Sms));
        assert_eq!(
            registry.kinds(),
            vec![ChannelKind::Sms, ChannelKind::Whatsapp]
        );
        assert_eq!(
            registry.get(ChannelKind::Whatsapp).unwrap().kind(),
            ChannelKind::Whatsapp
        );
    }

    #[test]
    fn send_error_display() {
        let err = SendError::Rejected {
            status: 400,
            body: "bad number".to_string(),
        };
        assert_eq!(err.to_string(), "provider returned HTTP 400: bad number");
    }
}
