//! Where the visitor is.
//!
//! A terminal host has no browser geolocation, so the device-location role is
//! played by an IP lookup. Manual coordinates and the configured landmark are
//! the other sources.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{config::LocationConfig, model::Coordinate};

/// Why a location could not be determined.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("location access was denied")]
    PermissionDenied,
    #[error("location information is unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("location lookup is not supported")]
    Unsupported,
    #[error("unknown location error: {0}")]
    Unknown(String),
}

impl LocationError {
    /// Message shown on the weather card.
    pub fn user_message(&self) -> String {
        let reason = match self {
            LocationError::PermissionDenied => "Location access was denied.",
            LocationError::PositionUnavailable => "Location information is unavailable.",
            LocationError::Timeout => "The request to get location timed out.",
            LocationError::Unsupported => {
                return "Location lookup is not supported here. Using default location."
                    .to_string();
            }
            LocationError::Unknown(_) => "An unknown error occurred.",
        };
        format!("Unable to get your location. {reason}")
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinate, LocationError>;
}

#[async_trait]
impl<T: LocationProvider + ?Sized> LocationProvider for Box<T> {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        (**self).locate().await
    }
}

/// A coordinate supplied up front, e.g. from the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// Location lookup switched off by the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLocator;

#[async_trait]
impl LocationProvider for DisabledLocator {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

/// No lookup mechanism available at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocator;

#[async_trait]
impl LocationProvider for UnsupportedLocator {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Approximates the device position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpLocator {
    endpoint: String,
    http: Client,
}

impl IpLocator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint: endpoint.into(), http })
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[async_trait]
impl LocationProvider for IpLocator {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        tracing::debug!(endpoint = %self.endpoint, "requesting location");

        let res = self.http.get(&self.endpoint).send().await.map_err(|e| {
            tracing::warn!(error = %e, "location request failed");
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::PositionUnavailable
            }
        })?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LocationError::PermissionDenied);
        }
        if !status.is_success() {
            tracing::warn!(%status, "location lookup returned an error status");
            return Err(LocationError::PositionUnavailable);
        }

        let body = res.text().await.map_err(|e| {
            if e.is_timeout() { LocationError::Timeout } else { LocationError::PositionUnavailable }
        })?;

        let parsed: IpLookupResponse =
            serde_json::from_str(&body).map_err(|e| LocationError::Unknown(e.to_string()))?;

        if parsed.error {
            tracing::warn!(reason = ?parsed.reason, "location lookup refused");
            return Err(LocationError::PositionUnavailable);
        }

        match (parsed.latitude, parsed.longitude) {
            (Some(latitude), Some(longitude)) => {
                tracing::info!(latitude, longitude, "location resolved");
                Ok(Coordinate::new(latitude, longitude))
            }
            _ => Err(LocationError::PositionUnavailable),
        }
    }
}

/// Picks the device-location provider implied by the configuration.
pub fn locator_from_config(config: &LocationConfig) -> anyhow::Result<Box<dyn LocationProvider>> {
    if !config.geolocation {
        return Ok(Box::new(DisabledLocator));
    }

    let boxed: Box<dyn LocationProvider> = match config.lookup_endpoint.as_deref() {
        Some(endpoint) if !endpoint.trim().is_empty() => Box::new(IpLocator::new(
            endpoint,
            Duration::from_secs(config.timeout_secs),
        )?),
        _ => Box::new(UnsupportedLocator),
    };

    Ok(boxed)
}
