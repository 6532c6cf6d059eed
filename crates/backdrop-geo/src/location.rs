//! Position providers: where the device position comes from.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use backdrop_core::{GeolocationConfig, GeolocationMode};
use reqwest::Client;
use serde::Deserialize;

use crate::types::{LookupError, Position};

const IP_LOOKUP_TIMEOUT_SECS: u64 = 10;

/// The platform's geolocation capability.
///
/// `current_position` is called at most once per page view.
pub trait PositionProvider: Send + Sync {
    fn is_available(&self) -> bool;

    fn current_position(&self) -> impl Future<Output = Result<Position, LookupError>> + Send;
}

/// No geolocation capability at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl PositionProvider for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Position, LookupError> {
        Err(LookupError::CapabilityUnavailable)
    }
}

/// A position known up front
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Position);

impl PositionProvider for FixedPosition {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Position, LookupError> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position from an ip-api.com style endpoint
#[derive(Debug, Clone)]
pub struct IpPosition {
    client: Arc<Client>,
    endpoint: String,
}

impl IpPosition {
    pub fn new(endpoint: &str) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(IP_LOOKUP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            endpoint: endpoint.to_string(),
        })
    }
}

impl PositionProvider for IpPosition {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Position, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| LookupError::PositionUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LookupError::PositionUnavailable(format!(
                "IP lookup returned status {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LookupError::PositionUnavailable(e.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Position::new(lat, lon)),
            _ => Err(LookupError::PositionUnavailable(
                body.message
                    .unwrap_or_else(|| format!("IP lookup status {}", body.status)),
            )),
        }
    }
}

/// Provider chosen by `[geolocation] mode`
#[derive(Debug, Clone)]
pub enum ConfiguredPosition {
    Ip(IpPosition),
    Fixed(FixedPosition),
    Unavailable(Unavailable),
}

impl ConfiguredPosition {
    pub fn from_config(config: &GeolocationConfig) -> Result<Self, LookupError> {
        Ok(match config.mode {
            GeolocationMode::Ip => Self::Ip(IpPosition::new(&config.ip_endpoint)?),
            GeolocationMode::Fixed => match (config.latitude, config.longitude) {
                (Some(lat), Some(lon)) => Self::Fixed(FixedPosition(Position::new(lat, lon))),
                _ => {
                    tracing::warn!("Fixed geolocation without coordinates; treating as unavailable");
                    Self::Unavailable(Unavailable)
                }
            },
            GeolocationMode::Disabled => Self::Unavailable(Unavailable),
        })
    }
}

impl PositionProvider for ConfiguredPosition {
    fn is_available(&self) -> bool {
        match self {
            Self::Ip(p) => p.is_available(),
            Self::Fixed(p) => p.is_available(),
            Self::Unavailable(p) => p.is_available(),
        }
    }

    async fn current_position(&self) -> Result<Position, LookupError> {
        match self {
            Self::Ip(p) => p.current_position().await,
            Self::Fixed(p) => p.current_position().await,
            Self::Unavailable(p) => p.current_position().await,
        }
    }
}
