//! Error types for SafeHer
//!
//! Two families live here. [`SafeherError`] covers infrastructure failures
//! (storage, configuration, device plumbing) and travels through `?`.
//! [`AlertError`] is the closed set of reasons an alert cycle can fail; its
//! `Display` output is the message shown to the user.

use thiserror::Error;

use crate::device::DeviceError;

/// Fallback text when an unexpected failure carries no message.
pub const UNEXPECTED_FALLBACK: &str = "Failed to send emergency alert";

/// Infrastructure error type
#[derive(Error, Debug)]
pub enum SafeherError {
    #[error("Contact directory error: {0}")]
    Directory(String),

    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SafeherError {
    fn from(e: serde_json::Error) -> Self {
        SafeherError::Serialization(e.to_string())
    }
}

/// Result type for SafeHer operations
pub type Result<T> = std::result::Result<T, SafeherError>;

/// Why an alert cycle did not reach its recipients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    /// Recipient list was empty.
    #[error("No emergency contacts found.")]
    NoContacts,

    /// Location permission denied or the fix could not be acquired.
    #[error("Could not get your location.")]
    LocationUnavailable,

    /// The device has no usable messaging capability.
    #[error("SMS not available on this device")]
    ChannelUnavailable,

    /// The composer was cancelled or reported failure.
    #[error("SMS cancelled or failed.")]
    SendRejected,

    /// Anything else, with a best-effort message.
    #[error("{0}")]
    Unexpected(String),
}

impl AlertError {
    /// Build an [`AlertError::Unexpected`], substituting the fallback text
    /// for an empty message.
    pub fn unexpected(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            AlertError::Unexpected(UNEXPECTED_FALLBACK.to_string())
        } else {
            AlertError::Unexpected(message)
        }
    }

    /// Stable machine-readable tag.
    pub fn code(&self) -> &'static str {
        match self {
            AlertError::NoContacts => "no_contacts",
            AlertError::LocationUnavailable => "location_unavailable",
            AlertError::ChannelUnavailable => "channel_unavailable",
            AlertError::SendRejected => "send_rejected",
            AlertError::Unexpected(_) => "unexpected_failure",
        }
    }
}

impl From<SafeherError> for AlertError {
    fn from(e: SafeherError) -> Self {
        AlertError::unexpected(e.to_string())
    }
}
