//! In-process device driven by a [`DeviceProfile`]

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    Accuracy, ComposerResult, DeviceError, DeviceMessenger, GrantStatus, PermissionBackend,
    PositionSource,
};
use crate::model::{Capability, PositionFix};

/// Coordinates the simulated GPS reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
}

/// Behaviour of a [`SimulatedDevice`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    /// Initial location grant
    pub location: GrantStatus,

    /// Initial notification grant
    pub notifications: GrantStatus,

    /// What the user answers when prompted
    pub grant_on_request: bool,

    /// Position the GPS reports; `None` makes every read fail
    pub position: Option<Coordinates>,

    /// Whether the SMS composer exists
    pub messaging_available: bool,

    /// How the composer finishes
    pub composer_result: ComposerResult,

    /// Make every permission query and prompt error out
    pub fail_permission_queries: bool,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            location: GrantStatus::Undetermined,
            notifications: GrantStatus::Undetermined,
            grant_on_request: true,
            position: Some(Coordinates {
                latitude: 28.6139,
                longitude: 77.209,
                accuracy_m: Some(12.0),
            }),
            messaging_available: true,
            composer_result: ComposerResult::Sent,
            fail_permission_queries: false,
        }
    }
}

impl DeviceProfile {
    pub fn with_location(mut self, status: GrantStatus) -> Self {
        self.location = status;
        self
    }

    pub fn with_grant_on_request(mut self, grant: bool) -> Self {
        self.grant_on_request = grant;
        self
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.position = Some(Coordinates {
            latitude,
            longitude,
            accuracy_m: None,
        });
        self
    }

    pub fn without_position(mut self) -> Self {
        self.position = None;
        self
    }

    pub fn with_messaging_available(mut self, available: bool) -> Self {
        self.messaging_available = available;
        self
    }

    pub fn with_composer_result(mut self, result: ComposerResult) -> Self {
        self.composer_result = result;
        self
    }

    pub fn with_failing_permissions(mut self) -> Self {
        self.fail_permission_queries = true;
        self
    }
}

/// One interaction with the simulated OS
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    PermissionStatus(Capability),
    PermissionRequest(Capability),
    PositionRead(Accuracy),
    MessagingAvailability,
    Compose { recipients: Vec<String>, body: String },
}

/// Device that answers from a profile and records every call
#[derive(Debug)]
pub struct SimulatedDevice {
    profile: DeviceProfile,
    grants: RwLock<HashMap<Capability, GrantStatus>>,
    calls: Mutex<Vec<DeviceCall>>,
}

impl SimulatedDevice {
    pub fn new(profile: DeviceProfile) -> Self {
        let mut grants = HashMap::new();
        grants.insert(Capability::Location, profile.location);
        grants.insert(Capability::Notifications, profile.notifications);

        Self {
            profile,
            grants: RwLock::new(grants),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Current grant for a capability, without recording a call
    pub fn grant(&self, capability: Capability) -> GrantStatus {
        match capability {
            Capability::Messaging => self.messaging_grant(),
            other => self.grants.read().get(&other).copied().unwrap_or_default(),
        }
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }

    pub fn permission_requests(&self, capability: Capability) -> usize {
        self.count(|c| matches!(c, DeviceCall::PermissionRequest(cap) if *cap == capability))
    }

    pub fn position_reads(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::PositionRead(_)))
    }

    pub fn availability_checks(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::MessagingAvailability))
    }

    /// Recipients and body of every composer invocation
    pub fn composed(&self) -> Vec<(Vec<String>, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Compose { recipients, body } => Some((recipients.clone(), body.clone())),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: DeviceCall) {
        self.calls.lock().push(call);
    }

    fn messaging_grant(&self) -> GrantStatus {
        if self.profile.messaging_available {
            GrantStatus::Granted
        } else {
            GrantStatus::Denied
        }
    }

    fn injected_failure(&self, capability: Capability) -> Result<(), DeviceError> {
        if self.profile.fail_permission_queries {
            return Err(DeviceError::Permission {
                capability,
                reason: "permission service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionBackend for SimulatedDevice {
    async fn status(&self, capability: Capability) -> Result<GrantStatus, DeviceError> {
        self.record(DeviceCall::PermissionStatus(capability));
        self.injected_failure(capability)?;
        Ok(self.grant(capability))
    }

    async fn request(&self, capability: Capability) -> Result<GrantStatus, DeviceError> {
        self.record(DeviceCall::PermissionRequest(capability));
        self.injected_failure(capability)?;

        if capability == Capability::Messaging {
            return Ok(self.messaging_grant());
        }

        let mut grants = self.grants.write();
        let current = grants.get(&capability).copied().unwrap_or_default();
        if current.is_granted() {
            return Ok(current);
        }

        let answer = if self.profile.grant_on_request {
            GrantStatus::Granted
        } else {
            GrantStatus::Denied
        };
        grants.insert(capability, answer);
        tracing::debug!("Simulated prompt for {}: {:?}", capability, answer);
        Ok(answer)
    }
}

#[async_trait]
impl PositionSource for SimulatedDevice {
    async fn current_position(&self, accuracy: Accuracy) -> Result<PositionFix, DeviceError> {
        self.record(DeviceCall::PositionRead(accuracy));

        let coords = self.profile.position.ok_or(DeviceError::HardwareUnavailable)?;
        let fix = PositionFix::new(coords.latitude, coords.longitude);
        Ok(match coords.accuracy_m {
            Some(radius) => fix.with_accuracy(radius),
            None => fix,
        })
    }
}

#[async_trait]
impl DeviceMessenger for SimulatedDevice {
    async fn is_available(&self) -> Result<bool, DeviceError> {
        self.record(DeviceCall::MessagingAvailability);
        Ok(self.profile.messaging_available)
    }

    async fn compose(&self, recipients: &[String], body: &str) -> Result<ComposerResult, DeviceError> {
        self.record(DeviceCall::Compose {
            recipients: recipients.to_vec(),
            body: body.to_string(),
        });
        Ok(self.profile.composer_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_does_not_change_grant() {
        let device = SimulatedDevice::new(DeviceProfile::default());

        let status = device.status(Capability::Location).await.unwrap();
        assert_eq!(status, GrantStatus::Undetermined);
        assert_eq!(device.grant(Capability::Location), GrantStatus::Undetermined);
    }

    #[tokio::test]
    async fn test_request_applies_prompt_answer() {
        let device = SimulatedDevice::new(DeviceProfile::default().with_grant_on_request(false));

        let status = device.request(Capability::Location).await.unwrap();
        assert_eq!(status, GrantStatus::Denied);
        assert_eq!(device.grant(Capability::Location), GrantStatus::Denied);
        assert_eq!(device.permission_requests(Capability::Location), 1);
    }

    #[tokio::test]
    async fn test_missing_position_is_hardware_failure() {
        let device = SimulatedDevice::new(DeviceProfile::default().without_position());
        assert!(device.profile().position.is_none());

        let err = device.current_position(Accuracy::High).await.unwrap_err();
        assert_eq!(err, DeviceError::HardwareUnavailable);
        assert_eq!(device.position_reads(), 1);
    }

    #[test]
    fn test_profile_deserializes_partial_json() {
        let profile: DeviceProfile =
            serde_json::from_str(r#"{"composer_result": "cancelled"}"#).unwrap();
        assert_eq!(profile.composer_result, ComposerResult::Cancelled);
        assert!(profile.messaging_available);
    }
}
