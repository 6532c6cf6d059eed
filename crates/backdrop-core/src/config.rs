use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single line summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Random photo service
    #[serde(default)]
    pub photo: PhotoConfig,

    /// Reverse geocoding service
    #[serde(default)]
    pub geocode: GeocodeConfig,

    /// Where the device position comes from
    #[serde(default)]
    pub geolocation: GeolocationConfig,

    /// Viewport, greeting and photo output
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Which time-of-day labels bias the photo query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualifierStyle {
    /// night / morning / noon / evening
    #[default]
    FourPart,
    /// day / night, split after noon
    DayNight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoConfig {
    /// Base URL; `/{width}x{height}?{qualifiers}` is appended
    pub endpoint: String,

    #[serde(default)]
    pub qualifier_style: QualifierStyle,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://source.unsplash.com/random".to_string(),
            qualifier_style: QualifierStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    /// Reverse geocoder base URL; `/{lat},{lon}?geoit=json` is appended
    pub endpoint: String,

    /// Optional CORS relay prefixed to the full geocoder URL
    #[serde(default)]
    pub relay: Option<String>,

    /// Request budget in milliseconds; 0 disables the timeout
    #[serde(default = "default_geocode_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_geocode_timeout_ms() -> u64 {
    4000
}

impl GeocodeConfig {
    /// Timeout as a duration, `None` when unbounded
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://geocode.xyz".to_string(),
            relay: None,
            timeout_ms: default_geocode_timeout_ms(),
        }
    }
}

/// Source of the device position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    /// Approximate position from the public IP address
    #[default]
    Ip,
    /// Coordinates from this file
    Fixed,
    /// Behave as if the platform had no geolocation capability
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub mode: GeolocationMode,

    /// Used when mode = "fixed"
    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    /// IP geolocation endpoint returning `{ status, lat, lon }`
    #[serde(default = "default_ip_endpoint")]
    pub ip_endpoint: String,
}

fn default_ip_endpoint() -> String {
    "http://ip-api.com/json".to_string()
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            mode: GeolocationMode::default(),
            latitude: None,
            longitude: None,
            ip_endpoint: default_ip_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Shown when no city is known
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Append ", {state}" to the city
    #[serde(default)]
    pub show_state: bool,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Where the revealed photo is written
    #[serde(default = "default_image_path")]
    pub image_path: PathBuf,
}

fn default_greeting() -> String {
    "Namaste!".to_string()
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_image_path() -> PathBuf {
    std::env::temp_dir().join("backdrop-featured.jpg")
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            show_state: false,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            image_path: default_image_path(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Load configuration from the default location and validate it
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path)
    }

    /// Load configuration from `path` and validate it
    ///
    /// Fails with [`ConfigError::Invalid`] when validation reports errors;
    /// warnings are logged.
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.photo.endpoint, "photo.endpoint", &mut result);
        self.validate_url(&self.geocode.endpoint, "geocode.endpoint", &mut result);

        if let Some(relay) = &self.geocode.relay {
            self.validate_url(relay, "geocode.relay", &mut result);
        }

        if self.geocode.timeout_ms == 0 {
            result.add_warning(
                "geocode.timeout_ms",
                "Geocode timeout disabled; a slow geocoder delays the photo",
            );
        }

        match self.geolocation.mode {
            GeolocationMode::Ip => {
                self.validate_url(
                    &self.geolocation.ip_endpoint,
                    "geolocation.ip_endpoint",
                    &mut result,
                );
            }
            GeolocationMode::Fixed => {
                match self.geolocation.latitude {
                    Some(lat) if (-90.0..=90.0).contains(&lat) => {}
                    Some(lat) => result.add_error(
                        "geolocation.latitude",
                        format!("Latitude out of range: {}", lat),
                    ),
                    None => result.add_error(
                        "geolocation.latitude",
                        "Latitude is required in fixed mode",
                    ),
                }
                match self.geolocation.longitude {
                    Some(lon) if (-180.0..=180.0).contains(&lon) => {}
                    Some(lon) => result.add_error(
                        "geolocation.longitude",
                        format!("Longitude out of range: {}", lon),
                    ),
                    None => result.add_error(
                        "geolocation.longitude",
                        "Longitude is required in fixed mode",
                    ),
                }
            }
            GeolocationMode::Disabled => {}
        }

        if self.display.viewport_width == 0 {
            result.add_error(
                "display.viewport_width",
                "Viewport width must be greater than 0",
            );
        } else if self.display.viewport_width > 10000 {
            result.add_warning(
                "display.viewport_width",
                "Viewport width is unusually large (>10000)",
            );
        }

        // The photo is requested 4px shorter than the viewport
        if self.display.viewport_height <= 4 {
            result.add_error(
                "display.viewport_height",
                "Viewport height must be greater than 4",
            );
        } else if self.display.viewport_height > 10000 {
            result.add_warning(
                "display.viewport_height",
                "Viewport height is unusually large (>10000)",
            );
        }

        if self.display.greeting.trim().is_empty() {
            result.add_warning("display.greeting", "Greeting is empty");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("no platform config directory".to_string()))?
            .join("backdrop");

        Ok(config_dir.join("config.toml"))
    }
}
