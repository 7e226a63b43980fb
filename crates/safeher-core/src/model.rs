//! Core data model shared by every component

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AlertError;

/// Opaque contact identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub String);

impl ContactId {
    pub fn new() -> Self {
        Self(format!("contact:{}", Uuid::new_v4()))
    }

}

impl From<&str> for ContactId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContactId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Default for ContactId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A trusted recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Identifier, unique within a directory
    pub id: ContactId,

    /// Display name
    pub name: String,

    /// Dialable phone number
    pub phone: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: ContactId::new(),
            name: name.into(),
            phone: phone.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = ContactId(id.into());
        self
    }
}

/// A single position sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,

    /// Horizontal accuracy radius in meters, if reported
    pub accuracy_m: Option<f64>,

    /// Altitude in meters, if reported
    pub altitude_m: Option<f64>,

    /// When the sample was taken
    pub captured_at: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            altitude_m: None,
            captured_at: Utc::now(),
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = Some(altitude_m);
        self
    }
}

/// OS-level capability guarded by a permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Location,
    Notifications,
    Messaging,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::Location,
        Capability::Notifications,
        Capability::Messaging,
    ];
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Location => write!(f, "location"),
            Capability::Notifications => write!(f, "notifications"),
            Capability::Messaging => write!(f, "messaging"),
        }
    }
}

/// Runtime platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl Platform {
    /// Platform of the compile target. Anything that is not a phone is
    /// treated as web: no native messaging, no notification prompts.
    pub fn detect() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Web
        }
    }

    /// Whether a native SMS composer exists.
    pub fn has_native_messaging(&self) -> bool {
        !matches!(self, Platform::Web)
    }

    /// Whether the OS has a grant/prompt concept for this capability.
    pub fn prompts_for(&self, capability: Capability) -> bool {
        match (self, capability) {
            (_, Capability::Location) => true,
            (Platform::Web, _) => false,
            (Platform::Android, Capability::Notifications) => true,
            // Managed Android grants SMS composer access without a runtime prompt
            (Platform::Android, Capability::Messaging) => false,
            (Platform::Ios, _) => true,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::detect()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
            Platform::Web => write!(f, "web"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "web" => Ok(Platform::Web),
            other => Err(format!("unknown platform '{}' (expected android, ios or web)", other)),
        }
    }
}

/// Snapshot of grant state per capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionState {
    pub location: bool,
    pub notifications: bool,
    pub messaging: bool,
}

impl PermissionState {
    pub fn get(&self, capability: Capability) -> bool {
        match capability {
            Capability::Location => self.location,
            Capability::Notifications => self.notifications,
            Capability::Messaging => self.messaging,
        }
    }
}

/// Result of one alert cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    /// Handed to the channel for this many recipients
    Sent { sent_to: usize },
    /// Stopped at the first unmet precondition or failure
    Failed(AlertError),
}

impl AlertOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AlertOutcome::Sent { .. })
    }

    pub fn sent_to(&self) -> Option<usize> {
        match self {
            AlertOutcome::Sent { sent_to } => Some(*sent_to),
            AlertOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&AlertError> {
        match self {
            AlertOutcome::Sent { .. } => None,
            AlertOutcome::Failed(error) => Some(error),
        }
    }

    /// Flat record for callers that expect `{success, sentTo | error}`.
    pub fn to_record(&self) -> OutcomeRecord {
        match self {
            AlertOutcome::Sent { sent_to } => OutcomeRecord {
                success: true,
                sent_to: Some(*sent_to),
                error: None,
                code: None,
            },
            AlertOutcome::Failed(error) => OutcomeRecord {
                success: false,
                sent_to: None,
                error: Some(error.to_string()),
                code: Some(error.code().to_string()),
            },
        }
    }
}

impl Serialize for AlertOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

/// Wire shape of an [`AlertOutcome`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_to: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
