//! Page view for Backdrop
//!
//! Widgets draw into injected surfaces; `PageView` wires them to the
//! geolocation lookup and reveals the photo exactly once.

pub mod clock;
pub mod image;
pub mod label;
pub mod page;
pub mod surface;
pub mod time_of_day;

pub use clock::{format_time, pad_zero, ClockDisplay, FixedTime, LocalTime, TimeSource};
pub use image::{BackgroundImage, ImageSource, Viewport};
pub use label::{to_title_case, LocationLabel, DEFAULT_GREETING};
pub use page::{PageOptions, PageView, RevealGate, Revealed, Surfaces};
pub use surface::{ImageSurface, LoadSignal, TextSurface};
pub use time_of_day::TimeOfDay;
