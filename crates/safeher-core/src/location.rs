//! Location provider
//!
//! One fix per call: check the grant, prompt at most once, then take a
//! single sample. Denial and acquisition failures are ordinary outcomes
//! here, not errors.

use std::sync::Arc;
use thiserror::Error;

use crate::device::{Accuracy, DeviceError, PositionSource};
use crate::model::{Capability, PositionFix};
use crate::permissions::PermissionGate;

/// Why no fix was produced
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Location permission not granted")]
    PermissionDenied,

    #[error("Failed to get location: {0}")]
    Acquisition(#[from] DeviceError),
}

#[derive(Debug, Clone)]
pub struct LocationProvider {
    gate: PermissionGate,
    source: Arc<dyn PositionSource>,
    accuracy: Accuracy,
}

impl LocationProvider {
    pub fn new(gate: PermissionGate, source: Arc<dyn PositionSource>) -> Self {
        Self {
            gate,
            source,
            accuracy: Accuracy::High,
        }
    }

    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Acquire a fix, keeping the reason when there is none.
    pub async fn acquire(&self) -> Result<PositionFix, LocationError> {
        let mut granted = self.gate.check(Capability::Location).await;
        if !granted {
            granted = self.gate.request(Capability::Location).await;
        }

        if !granted {
            return Err(LocationError::PermissionDenied);
        }

        let fix = self.source.current_position(self.accuracy).await?;
        Ok(fix)
    }

    /// Acquire a fix; denial and failure both come back as `None`.
    pub async fn current_fix(&self) -> Option<PositionFix> {
        match self.acquire().await {
            Ok(fix) => Some(fix),
            Err(LocationError::PermissionDenied) => {
                tracing::warn!("Location permission not granted");
                None
            }
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        }
    }
}
