//! Dispatch channels
//!
//! One interface, two variants picked once at construction:
//!
//! - [`NativeChannel`] hands the message to the device's SMS composer in a
//!   single call addressed to every recipient.
//! - [`LoggingChannel`] stands in where no composer exists (web). It never
//!   transmits; it logs what would have been sent and reports success so
//!   the whole flow can run without a phone.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::device::DeviceMessenger;
use crate::error::AlertError;
use crate::model::Platform;
use crate::{Result, SafeherError};

/// Channel variant identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Device SMS composer
    Native,
    /// Log-only stand-in
    Logging,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Native => write!(f, "native"),
            ChannelKind::Logging => write!(f, "logging"),
        }
    }
}

/// Sends one composed message to an ordered recipient list.
///
/// `Ok(n)` means delivered to the channel for `n` recipients. Exactly one
/// attempt is made per call.
#[async_trait]
pub trait DispatchChannel: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> ChannelKind;

    async fn send(&self, recipients: &[String], body: &str) -> std::result::Result<usize, AlertError>;
}

/// Log-only channel for platforms without SMS
#[derive(Debug, Clone, Default)]
pub struct LoggingChannel;

impl LoggingChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DispatchChannel for LoggingChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Logging
    }

    async fn send(&self, recipients: &[String], body: &str) -> std::result::Result<usize, AlertError> {
        tracing::info!(
            recipients = ?recipients,
            body = %body,
            "No native messaging, logging alert instead of sending"
        );
        Ok(recipients.len())
    }
}

/// SMS composer channel
#[derive(Debug, Clone)]
pub struct NativeChannel {
    messenger: Arc<dyn DeviceMessenger>,
}

impl NativeChannel {
    pub fn new(messenger: Arc<dyn DeviceMessenger>) -> Self {
        Self { messenger }
    }
}

#[async_trait]
impl DispatchChannel for NativeChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Native
    }

    async fn send(&self, recipients: &[String], body: &str) -> std::result::Result<usize, AlertError> {
        let available = self
            .messenger
            .is_available()
            .await
            .map_err(|e| AlertError::unexpected(e.to_string()))?;

        if !available {
            tracing::warn!("SMS composer not available");
            return Err(AlertError::ChannelUnavailable);
        }

        match self.messenger.compose(recipients, body).await {
            Ok(result) if result.is_delivered() => {
                tracing::info!("SMS composer finished with {:?} for {} recipients", result, recipients.len());
                Ok(recipients.len())
            }
            Ok(result) => {
                tracing::warn!("SMS composer finished with {:?}", result);
                Err(AlertError::SendRejected)
            }
            Err(e) => {
                tracing::error!("SMS composer error: {}", e);
                Err(AlertError::SendRejected)
            }
        }
    }
}

/// Pick the channel for a platform.
///
/// Web always gets the logging channel. Phones need a messenger.
pub fn select_channel(
    platform: Platform,
    messenger: Option<Arc<dyn DeviceMessenger>>,
) -> Result<Arc<dyn DispatchChannel>> {
    if !platform.has_native_messaging() {
        return Ok(Arc::new(LoggingChannel::new()));
    }

    match messenger {
        Some(messenger) => Ok(Arc::new(NativeChannel::new(messenger))),
        None => Err(SafeherError::InvalidConfig(format!(
            "platform {} requires a device messenger",
            platform
        ))),
    }
}

/// How contact phone numbers become recipient addresses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientPolicy {
    /// Prefix for numbers without an international `+` prefix, e.g. `+91`
    pub default_country_code: Option<String>,
}

impl RecipientPolicy {
    pub fn with_country_code(code: impl Into<String>) -> Self {
        Self {
            default_country_code: Some(code.into()),
        }
    }

    /// Recipient address for a phone number, `None` when the number is blank.
    pub fn address(&self, phone: &str) -> Option<String> {
        let trimmed = phone.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match &self.default_country_code {
            Some(code) if !trimmed.starts_with('+') => format!("{}{}", code, trimmed),
            _ => trimmed.to_string(),
        })
    }
}
