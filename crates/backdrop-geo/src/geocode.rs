//! Reverse geocoding: convert coordinates to a city name.
//! Talks to geocode.xyz, optionally through a CORS relay.

use std::future::Future;
use std::sync::Arc;

use backdrop_core::GeocodeConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{LookupError, PlaceName, Position};

const USER_AGENT: &str = "Backdrop/0.1.0";

/// Anything that can turn a position into a place name
pub trait Geocoder: Send + Sync {
    fn reverse(
        &self,
        position: Position,
    ) -> impl Future<Output = Result<PlaceName, LookupError>> + Send;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    city: Option<String>,
    state: Option<String>,
}

/// HTTP geocoder for `GET {endpoint}/{lat},{lon}?geoit=json`.
///
/// The request itself has no deadline; `GeolocationLookup` owns the timeout.
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    client: Arc<Client>,
    endpoint: String,
    relay: Option<String>,
}

impl HttpGeocoder {
    pub fn new(endpoint: &str, relay: Option<&str>) -> Result<Self, LookupError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client: Arc::new(client),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            relay: relay.map(str::to_string),
        })
    }

    pub fn from_config(config: &GeocodeConfig) -> Result<Self, LookupError> {
        Self::new(&config.endpoint, config.relay.as_deref())
    }

    /// Full request URL for a position, relay included
    pub fn request_url(&self, position: Position) -> String {
        let target = format!(
            "{}/{},{}?geoit=json",
            self.endpoint, position.latitude, position.longitude
        );
        match &self.relay {
            Some(relay) => format!("{}{}", relay, target),
            None => target,
        }
    }
}

impl Geocoder for HttpGeocoder {
    #[instrument(skip(self), level = "debug")]
    async fn reverse(&self, position: Position) -> Result<PlaceName, LookupError> {
        let url = self.request_url(position);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::debug!("Reverse geocode request failed: {}", e);
            LookupError::from(e)
        })?;

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let text = response.text().await?;
        let body: GeocodeResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::debug!("Reverse geocode parse error: {}", e);
            LookupError::MalformedResponse(e.to_string())
        })?;

        let place = PlaceName::new(body.city, body.state)?;
        tracing::info!("Reverse geocoded {} to {}", position, place.city());
        Ok(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_without_relay() {
        let geocoder = HttpGeocoder::new("https://geocode.xyz/", None).unwrap();
        assert_eq!(
            geocoder.request_url(Position::new(37.7749, -122.4194)),
            "https://geocode.xyz/37.7749,-122.4194?geoit=json"
        );
    }

    #[test]
    fn test_request_url_with_relay() {
        let geocoder =
            HttpGeocoder::new("https://geocode.xyz", Some("https://relay.example/")).unwrap();
        assert_eq!(
            geocoder.request_url(Position::new(1.5, 2.5)),
            "https://relay.example/https://geocode.xyz/1.5,2.5?geoit=json"
        );
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test -p backdrop-geo -- --ignored
    async fn test_reverse_geocode_seattle() {
        let geocoder = HttpGeocoder::new("https://geocode.xyz", None).unwrap();
        let place = geocoder
            .reverse(Position::new(47.6062, -122.3321))
            .await
            .unwrap();
        assert!(place.city_qualifier().contains("seattle"));
    }
}
