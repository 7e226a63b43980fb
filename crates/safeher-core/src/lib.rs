//! SafeHer Core - panic-button alert orchestration
//!
//! On trigger, SafeHer reads the user's trusted contacts, takes one location
//! fix, composes an alert with a map link, and hands it to the device's
//! messaging channel. The caller always gets back a single [`AlertOutcome`].
//!
//! # Architecture
//!
//! ```text
//!                     AlertOrchestrator
//!                            │
//!     ┌──────────────┬───────┴────────┬──────────────────┐
//!     ▼              ▼                ▼                  ▼
//! ContactDirectory  LocationProvider  composer   DispatchChannel
//!                    │                            │          │
//!                    ▼                            ▼          ▼
//!              PermissionGate              NativeChannel  LoggingChannel
//!                    │                            │
//!                    ▼                            ▼
//!      PermissionBackend + PositionSource    DeviceMessenger
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use safeher_core::{
//!     AlertOrchestrator, Contact, DeviceBindings, DeviceProfile, InMemoryDirectory,
//!     Platform, SafeherConfig, SimulatedDevice,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> safeher_core::Result<()> {
//! let config = SafeherConfig::default().with_platform(Platform::Web);
//! let contacts = InMemoryDirectory::with_contacts(vec![Contact::new("Asha", "+911111")]);
//! let device = Arc::new(SimulatedDevice::new(DeviceProfile::default()));
//!
//! let orchestrator = AlertOrchestrator::from_config(
//!     &config,
//!     Arc::new(contacts),
//!     DeviceBindings::from_device(device),
//! )?;
//!
//! let outcome = orchestrator.trigger().await;
//! assert_eq!(outcome.sent_to(), Some(1));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations)]

pub mod bootstrap;
pub mod composer;
pub mod config;
pub mod contacts;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod permissions;

pub use bootstrap::{bootstrap, resolve_route, AuthStatus, BootstrapConfig, FileLaunchFlag, LaunchFlagStore, Route, StaticAuth};
pub use config::SafeherConfig;
pub use contacts::{ContactDirectory, InMemoryDirectory, JsonFileDirectory};
pub use device::{
    Accuracy, ComposerResult, DeviceError, DeviceMessenger, DeviceProfile, GrantStatus,
    PermissionBackend, PositionSource, SimulatedDevice,
};
pub use dispatch::{select_channel, ChannelKind, DispatchChannel, LoggingChannel, NativeChannel, RecipientPolicy};
pub use error::{AlertError, Result, SafeherError};
pub use location::{LocationError, LocationProvider};
pub use model::{AlertOutcome, Capability, Contact, ContactId, OutcomeRecord, PermissionState, Platform, PositionFix};
pub use orchestrator::{AlertOrchestrator, AlertStage, DeviceBindings};
pub use permissions::PermissionGate;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
