//! Alert orchestrator
//!
//! Runs one alert cycle:
//!
//! ```text
//! FetchingContacts ─► FetchingLocation ─► Composing ─► Dispatching ─► Done
//!        │                   │                              │
//!        └── no contacts     └── no fix                     └── channel refused
//!                 ▼                  ▼                               ▼
//!                            Done(failure)
//! ```
//!
//! Steps are awaited one after another. Whatever goes wrong, including a
//! panic inside a collaborator, `trigger()` returns an [`AlertOutcome`].

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::composer;
use crate::config::SafeherConfig;
use crate::contacts::ContactDirectory;
use crate::device::{DeviceMessenger, PermissionBackend, PositionSource};
use crate::dispatch::{select_channel, DispatchChannel, RecipientPolicy};
use crate::error::{AlertError, UNEXPECTED_FALLBACK};
use crate::location::LocationProvider;
use crate::model::AlertOutcome;
use crate::permissions::PermissionGate;
use crate::Result;

/// Cycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStage {
    FetchingContacts,
    FetchingLocation,
    Composing,
    Dispatching,
    Done,
}

impl std::fmt::Display for AlertStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStage::FetchingContacts => write!(f, "fetching_contacts"),
            AlertStage::FetchingLocation => write!(f, "fetching_location"),
            AlertStage::Composing => write!(f, "composing"),
            AlertStage::Dispatching => write!(f, "dispatching"),
            AlertStage::Done => write!(f, "done"),
        }
    }
}

/// Device subsystems an orchestrator is built from
#[derive(Debug, Clone)]
pub struct DeviceBindings {
    pub permissions: Arc<dyn PermissionBackend>,
    pub positions: Arc<dyn PositionSource>,
    pub messenger: Option<Arc<dyn DeviceMessenger>>,
}

impl DeviceBindings {
    /// Bind every subsystem to one device.
    pub fn from_device<D>(device: Arc<D>) -> Self
    where
        D: PermissionBackend + PositionSource + DeviceMessenger + 'static,
    {
        Self {
            permissions: device.clone(),
            positions: device.clone(),
            messenger: Some(device),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertOrchestrator {
    directory: Arc<dyn ContactDirectory>,
    location: LocationProvider,
    channel: Arc<dyn DispatchChannel>,
    recipients: RecipientPolicy,
}

impl AlertOrchestrator {
    pub fn new(
        directory: Arc<dyn ContactDirectory>,
        location: LocationProvider,
        channel: Arc<dyn DispatchChannel>,
    ) -> Self {
        Self {
            directory,
            location,
            channel,
            recipients: RecipientPolicy::default(),
        }
    }

    pub fn with_recipient_policy(mut self, policy: RecipientPolicy) -> Self {
        self.recipients = policy;
        self
    }

    /// Wire gate, location provider and channel from configuration.
    pub fn from_config(
        config: &SafeherConfig,
        directory: Arc<dyn ContactDirectory>,
        device: DeviceBindings,
    ) -> Result<Self> {
        let gate = PermissionGate::new(config.platform, device.permissions);
        let location = LocationProvider::new(gate, device.positions).with_accuracy(config.location.accuracy);
        let channel = select_channel(config.platform, device.messenger)?;

        tracing::debug!("Alert orchestrator on {} using {} channel", config.platform, channel.kind());

        Ok(Self::new(directory, location, channel).with_recipient_policy(config.dispatch.recipient_policy()))
    }

    pub fn channel(&self) -> &Arc<dyn DispatchChannel> {
        &self.channel
    }

    /// Run one alert cycle.
    pub async fn trigger(&self) -> AlertOutcome {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("alert_cycle", %cycle_id);

        async {
            tracing::info!("Starting emergency alert");

            let outcome = match AssertUnwindSafe(self.run()).catch_unwind().await {
                Ok(Ok(sent_to)) => AlertOutcome::Sent { sent_to },
                Ok(Err(error)) => AlertOutcome::Failed(error),
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!("Emergency alert error: {}", message);
                    AlertOutcome::Failed(AlertError::unexpected(message))
                }
            };

            match &outcome {
                AlertOutcome::Sent { sent_to } => tracing::info!("Alert sent to {} contacts", sent_to),
                AlertOutcome::Failed(error) => {
                    tracing::warn!(code = error.code(), "Alert failed: {}", error)
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self) -> std::result::Result<usize, AlertError> {
        enter(AlertStage::FetchingContacts);
        let contacts = self.directory.contacts().await?;
        let recipients: Vec<String> = contacts
            .iter()
            .filter_map(|contact| {
                let address = self.recipients.address(&contact.phone);
                if address.is_none() {
                    tracing::warn!(contact = %contact.id, "Skipping contact without a phone number");
                }
                address
            })
            .collect();
        if recipients.is_empty() {
            return Err(AlertError::NoContacts);
        }

        enter(AlertStage::FetchingLocation);
        let fix = self
            .location
            .current_fix()
            .await
            .ok_or(AlertError::LocationUnavailable)?;

        enter(AlertStage::Composing);
        let body = composer::compose(&fix);
        tracing::debug!("Recipients: {:?}", recipients);

        enter(AlertStage::Dispatching);
        let sent_to = self.channel.send(&recipients, &body).await?;

        enter(AlertStage::Done);
        Ok(sent_to)
    }
}

fn enter(stage: AlertStage) {
    tracing::debug!(%stage, "alert stage");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        UNEXPECTED_FALLBACK.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::InMemoryDirectory;
    use crate::device::{DeviceProfile, GrantStatus, SimulatedDevice};
    use crate::dispatch::ChannelKind;
    use crate::model::{Contact, Platform};

    fn build_orchestrator(
        platform: Platform,
        contacts: Vec<Contact>,
        profile: DeviceProfile,
    ) -> (AlertOrchestrator, Arc<SimulatedDevice>) {
        let device = Arc::new(SimulatedDevice::new(profile));
        let config = SafeherConfig::default().with_platform(platform);
        let orchestrator = AlertOrchestrator::from_config(
            &config,
            Arc::new(InMemoryDirectory::with_contacts(contacts)),
            DeviceBindings::from_device(device.clone()),
        )
        .unwrap();
        (orchestrator, device)
    }

    fn two_contacts() -> Vec<Contact> {
        vec![
            Contact::new("Asha", "+911111").with_id("c1"),
            Contact::new("Meera", "+912222").with_id("c2"),
        ]
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(AlertStage::FetchingContacts.to_string(), "fetching_contacts");
        assert_eq!(AlertStage::Done.to_string(), "done");
    }

    #[test]
    fn test_channel_selected_from_platform() {
        let (web, _) = build_orchestrator(Platform::Web, vec![], DeviceProfile::default());
        assert_eq!(web.channel().kind(), ChannelKind::Logging);

        let (android, _) = build_orchestrator(Platform::Android, vec![], DeviceProfile::default());
        assert_eq!(android.channel().kind(), ChannelKind::Native);
    }

    #[tokio::test]
    async fn test_native_happy_path() {
        let (orchestrator, device) = build_orchestrator(Platform::Android, two_contacts(), DeviceProfile::default());

        let outcome = orchestrator.trigger().await;
        assert_eq!(outcome, AlertOutcome::Sent { sent_to: 2 });

        let composed = device.composed();
        assert_eq!(composed.len(), 1);
        assert_eq!(composed[0].0, vec!["+911111", "+912222"]);
        assert!(composed[0].1.contains("http://maps.google.com/maps?q=28.6139,77.209"));
    }

    #[tokio::test]
    async fn test_no_contacts_short_circuits() {
        let (orchestrator, device) = build_orchestrator(Platform::Android, vec![], DeviceProfile::default());

        let outcome = orchestrator.trigger().await;
        assert_eq!(outcome, AlertOutcome::Failed(AlertError::NoContacts));
        assert!(device.calls().is_empty());
    }

    #[tokio::test]
    async fn test_location_denied_short_circuits() {
        let (orchestrator, device) = build_orchestrator(
            Platform::Android,
            two_contacts(),
            DeviceProfile::default().with_grant_on_request(false),
        );

        let outcome = orchestrator.trigger().await;
        assert_eq!(outcome, AlertOutcome::Failed(AlertError::LocationUnavailable));
        assert_eq!(device.availability_checks(), 0);
        assert!(device.composed().is_empty());
    }

    #[tokio::test]
    async fn test_recipient_policy_applied() {
        let (orchestrator, device) = build_orchestrator(
            Platform::Android,
            vec![Contact::new("Asha", " 9876543210 ")],
            DeviceProfile::default().with_location(GrantStatus::Granted),
        );
        let orchestrator = orchestrator.with_recipient_policy(RecipientPolicy::with_country_code("+91"));

        assert!(orchestrator.trigger().await.is_success());
        assert_eq!(device.composed()[0].0, vec!["+919876543210"]);
    }

    #[tokio::test]
    async fn test_blank_phone_skipped() {
        let (orchestrator, device) = build_orchestrator(
            Platform::Android,
            vec![
                Contact::new("Asha", "   "),
                Contact::new("Meera", "9876543210"),
            ],
            DeviceProfile::default().with_location(GrantStatus::Granted),
        );
        let orchestrator = orchestrator.with_recipient_policy(RecipientPolicy::with_country_code("+91"));

        assert_eq!(orchestrator.trigger().await, AlertOutcome::Sent { sent_to: 1 });
        assert_eq!(device.composed()[0].0, vec!["+919876543210"]);
    }

    #[tokio::test]
    async fn test_only_blank_phones_is_no_contacts() {
        let (orchestrator, device) = build_orchestrator(
            Platform::Android,
            vec![Contact::new("Asha", ""), Contact::new("Meera", "  ")],
            DeviceProfile::default(),
        );

        assert_eq!(
            orchestrator.trigger().await,
            AlertOutcome::Failed(AlertError::NoContacts)
        );
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), UNEXPECTED_FALLBACK);
    }
}
