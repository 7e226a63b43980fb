//! Permission gate
//!
//! Answers "is this capability usable right now?" as a plain bool. Nothing
//! is cached: every call goes to the OS, and a failing OS call reads as
//! "not granted". Capabilities the platform has no prompt for are always
//! reported as granted; the user completes those actions by hand.

use std::sync::Arc;

use crate::device::PermissionBackend;
use crate::model::{Capability, PermissionState, Platform};

/// Stateless view over the OS permission backend
#[derive(Debug, Clone)]
pub struct PermissionGate {
    platform: Platform,
    backend: Arc<dyn PermissionBackend>,
}

impl PermissionGate {
    pub fn new(platform: Platform, backend: Arc<dyn PermissionBackend>) -> Self {
        Self { platform, backend }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Current grant state. Never prompts.
    pub async fn check(&self, capability: Capability) -> bool {
        if !self.platform.prompts_for(capability) {
            return true;
        }

        match self.backend.status(capability).await {
            Ok(status) => status.is_granted(),
            Err(e) => {
                tracing::error!("{} permission check failed: {}", capability, e);
                false
            }
        }
    }

    /// Prompt if needed and return the resulting grant state.
    pub async fn request(&self, capability: Capability) -> bool {
        if !self.platform.prompts_for(capability) {
            return true;
        }

        match self.backend.request(capability).await {
            Ok(status) => {
                tracing::debug!("{} permission after request: {:?}", capability, status);
                status.is_granted()
            }
            Err(e) => {
                tracing::error!("{} permission error: {}", capability, e);
                false
            }
        }
    }

    /// Check every capability, one after another.
    pub async fn check_all(&self) -> PermissionState {
        PermissionState {
            location: self.check(Capability::Location).await,
            notifications: self.check(Capability::Notifications).await,
            messaging: self.check(Capability::Messaging).await,
        }
    }

    /// Request every capability, one after another.
    pub async fn request_all(&self) -> PermissionState {
        PermissionState {
            location: self.request(Capability::Location).await,
            notifications: self.request(Capability::Notifications).await,
            messaging: self.request(Capability::Messaging).await,
        }
    }
}
