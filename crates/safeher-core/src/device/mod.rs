//! Device subsystem seam
//!
//! The OS surfaces the alert flow depends on (permission prompts, the
//! location hardware, the SMS composer) sit behind these traits. A real
//! app binds them to platform APIs; [`SimulatedDevice`] binds all three to
//! a configurable in-process profile.

mod simulated;

pub use simulated::{Coordinates, DeviceCall, DeviceProfile, SimulatedDevice};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Capability, PositionFix};

/// Failures raised by device subsystems
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Permission query failed for {capability}: {reason}")]
    Permission {
        capability: Capability,
        reason: String,
    },

    #[error("Location request timed out")]
    Timeout,

    #[error("Location provider error: {0}")]
    Provider(String),

    #[error("Location hardware unavailable")]
    HardwareUnavailable,

    #[error("Messaging error: {0}")]
    Messaging(String),
}

/// Grant state as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Granted,
    Denied,
    /// Never asked
    Undetermined,
}

impl GrantStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, GrantStatus::Granted)
    }
}

impl Default for GrantStatus {
    fn default() -> Self {
        Self::Undetermined
    }
}

/// Requested accuracy for a position sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Balanced,
    High,
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::High
    }
}

/// How the SMS composer finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerResult {
    Sent,
    /// The user completed the composer; the OS cannot tell whether it was sent
    Composed,
    Cancelled,
    Failed,
}

impl ComposerResult {
    /// `sent` and `composed` both count as delivered.
    pub fn is_delivered(&self) -> bool {
        matches!(self, ComposerResult::Sent | ComposerResult::Composed)
    }
}

impl Default for ComposerResult {
    fn default() -> Self {
        Self::Sent
    }
}

/// OS permission queries and prompts
#[async_trait]
pub trait PermissionBackend: Send + Sync + std::fmt::Debug {
    /// Current grant state. Must not change it.
    async fn status(&self, capability: Capability) -> Result<GrantStatus, DeviceError>;

    /// Prompt if needed and return the resulting grant state.
    async fn request(&self, capability: Capability) -> Result<GrantStatus, DeviceError>;
}

/// Single-shot position reads
#[async_trait]
pub trait PositionSource: Send + Sync + std::fmt::Debug {
    async fn current_position(&self, accuracy: Accuracy) -> Result<PositionFix, DeviceError>;
}

/// Native SMS composer
#[async_trait]
pub trait DeviceMessenger: Send + Sync + std::fmt::Debug {
    async fn is_available(&self) -> Result<bool, DeviceError>;

    /// Open one composer addressed to every recipient, pre-filled with `body`.
    async fn compose(&self, recipients: &[String], body: &str) -> Result<ComposerResult, DeviceError>;
}
