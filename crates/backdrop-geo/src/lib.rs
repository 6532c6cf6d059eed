//! Geolocation for Backdrop
//!
//! Finds the device position, reverse geocodes it to a city name under a
//! bounded timeout, and collapses every failure into a single fallback.

pub mod geocode;
pub mod location;
pub mod lookup;
pub mod types;

pub use geocode::{Geocoder, HttpGeocoder};
pub use location::{ConfiguredPosition, FixedPosition, IpPosition, PositionProvider, Unavailable};
pub use lookup::{GeolocationLookup, LookupOutcome, LookupReport, LookupState};
pub use types::*;
