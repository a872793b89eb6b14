//! Device geolocation resolution
//!
//! This module turns a one-shot device position fix into a canonical
//! [`LocationQuery`]. The platform location API is injected behind the
//! [`LocatePosition`] trait so the library never touches a real device
//! directly; requesting a fix may prompt the user for permission, which is
//! opaque to this crate.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{LocationQuery, ParkError};

/// Geolocation-specific error types, mirroring the platform error classes.
#[derive(Error, Debug)]
pub enum GeolocateError {
    #[error("user denied the request for geolocation")]
    PermissionDenied,

    #[error("location information is unavailable")]
    PositionUnavailable,

    #[error("the request to get the device location timed out")]
    Timeout,

    #[error("an unknown geolocation error occurred: {0}")]
    Unknown(String),
}

/// Options for a one-shot position request.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    /// Upper bound on how long the platform may take to produce a fix.
    pub timeout: Duration,
    /// Maximum acceptable age of a cached fix. Zero disables caching.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// One-shot access to the device's current position.
///
/// Implementations return a `(latitude, longitude)` pair or a classified
/// [`GeolocateError`]. They are expected to honor [`PositionOptions`], but
/// [`resolve_device_location`] enforces the timeout regardless.
pub trait LocatePosition {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl std::future::Future<Output = Result<(f64, f64), GeolocateError>> + Send;
}

/// Resolve the device's current position into a [`LocationQuery`].
///
/// The wait is bounded by `options.timeout` even if the provider ignores it;
/// an elapsed bound maps to [`GeolocateError::Timeout`].
pub async fn resolve_device_location<P: LocatePosition>(
    provider: &P,
    options: &PositionOptions,
) -> Result<LocationQuery, ParkError> {
    debug!(
        high_accuracy = options.enable_high_accuracy,
        timeout_ms = options.timeout.as_millis() as u64,
        "Requesting device position"
    );

    match tokio::time::timeout(options.timeout, provider.current_position(options)).await {
        Ok(Ok((latitude, longitude))) => {
            debug!(latitude, longitude, "Device position acquired");
            Ok(LocationQuery::from_coordinates(latitude, longitude))
        }
        Ok(Err(err)) => {
            warn!(error = %err, "Device position request failed");
            Err(err.into())
        }
        Err(_) => {
            warn!(
                timeout_ms = options.timeout.as_millis() as u64,
                "Device position request exceeded its time bound"
            );
            Err(GeolocateError::Timeout.into())
        }
    }
}
