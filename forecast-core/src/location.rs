//! Collaborators the orchestrator asks for a coordinate.
//!
//! Both are one-shot: no streaming updates, no polling.

use async_trait::async_trait;

use crate::{error::ForecastError, model::Coordinate};

/// London. Used whenever the device location is denied or unavailable.
pub const FALLBACK_COORDINATE: Coordinate = Coordinate::new(51.5074, 0.1278);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not been asked yet.
    Undetermined,
}

#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn check(&self) -> PermissionStatus;

    /// Prompt the user. Never returns [`PermissionStatus::Undetermined`]
    /// from a well-behaved gate; callers treat it as a denial.
    async fn request(&self) -> PermissionStatus;
}

#[async_trait]
pub trait LocationService: Send + Sync {
    /// Last known device location. `Ok(None)` means the service answered
    /// but has nothing cached.
    async fn last_known(&self) -> Result<Option<Coordinate>, ForecastError>;
}

/// A gate with a fixed answer, for hosts that decide permission up front.
#[derive(Debug, Clone, Copy)]
pub struct FixedPermission(pub PermissionStatus);

#[async_trait]
impl PermissionGate for FixedPermission {
    async fn check(&self) -> PermissionStatus {
        self.0
    }

    async fn request(&self) -> PermissionStatus {
        match self.0 {
            PermissionStatus::Undetermined => PermissionStatus::Denied,
            status => status,
        }
    }
}

/// A location service that always reports the same (possibly absent) fix.
#[derive(Debug, Clone, Copy)]
pub struct StaticLocation(pub Option<Coordinate>);

#[async_trait]
impl LocationService for StaticLocation {
    async fn last_known(&self) -> Result<Option<Coordinate>, ForecastError> {
        Ok(self.0)
    }
}
