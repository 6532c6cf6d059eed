use serde::{Deserialize, Serialize};

/// Device position, produced once per page view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A resolved place. `city` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceName {
    city: String,
    state: Option<String>,
}

impl PlaceName {
    /// Build a place from geocoder fields.
    ///
    /// A missing or blank city is a malformed response, not a place.
    pub fn new(city: Option<String>, state: Option<String>) -> Result<Self, LookupError> {
        let city = match city {
            Some(c) if !c.trim().is_empty() => c,
            Some(_) => {
                return Err(LookupError::MalformedResponse(
                    "city field is empty".to_string(),
                ))
            }
            None => {
                return Err(LookupError::MalformedResponse(
                    "city field is missing".to_string(),
                ))
            }
        };
        let state = state.filter(|s| !s.trim().is_empty());
        Ok(Self { city, state })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Lowercased city, as appended to the photo query
    pub fn city_qualifier(&self) -> String {
        self.city.to_lowercase()
    }
}

/// Every way a lookup can fail. All of them lead to the same fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Geolocation capability unavailable")]
    CapabilityUnavailable,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Geocoder returned status {0}")]
    Status(u16),
    #[error("Geocode request timed out")]
    Timeout,
    #[error("Malformed geocode response: {0}")]
    MalformedResponse(String),
}

impl LookupError {
    /// Whether the failure happened before any position was known
    pub fn is_position_failure(&self) -> bool {
        matches!(
            self,
            Self::CapabilityUnavailable | Self::PermissionDenied | Self::PositionUnavailable(_)
        )
    }
}

/// A client-side timeout is a network failure. Only the lookup deadline
/// produces [`LookupError::Timeout`].
impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_name_requires_city() {
        let err = PlaceName::new(None, Some("CA".into())).unwrap_err();
        assert!(matches!(err, LookupError::MalformedResponse(_)));
    }

    #[test]
    fn test_place_name_rejects_blank_city() {
        assert!(PlaceName::new(Some(String::new()), None).is_err());
        assert!(PlaceName::new(Some("   ".into()), None).is_err());
    }

    #[test]
    fn test_place_name_drops_blank_state() {
        let place = PlaceName::new(Some("Austin".into()), Some(" ".into())).unwrap();
        assert_eq!(place.state(), None);
    }

    #[test]
    fn test_city_qualifier_is_lowercase() {
        let place = PlaceName::new(Some("SAN FRANCISCO".into()), None).unwrap();
        assert_eq!(place.city_qualifier(), "san francisco");
        assert_eq!(place.city(), "SAN FRANCISCO");
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(37.5, -122.25).to_string(), "37.5,-122.25");
    }

    #[test]
    fn test_position_failures() {
        assert!(LookupError::CapabilityUnavailable.is_position_failure());
        assert!(LookupError::PermissionDenied.is_position_failure());
        assert!(!LookupError::Timeout.is_position_failure());
        assert!(!LookupError::Status(500).is_position_failure());
    }
}
