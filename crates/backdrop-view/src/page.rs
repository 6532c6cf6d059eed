//! One page view: build the photo URL, look up the city, reveal once.

use std::sync::Arc;

use backdrop_core::{Config, QualifierStyle};
use backdrop_geo::{Geocoder, GeolocationLookup, LookupReport, PositionProvider};
use chrono::Timelike;
use parking_lot::Mutex;

use crate::clock::{ClockDisplay, LocalTime, TimeSource};
use crate::image::{BackgroundImage, ImageSource, Viewport};
use crate::label::{LocationLabel, DEFAULT_GREETING};
use crate::surface::{ImageSurface, TextSurface};
use crate::time_of_day::TimeOfDay;

/// Render targets for one page view
#[derive(Clone)]
pub struct Surfaces {
    pub image: Arc<dyn ImageSurface>,
    pub time: Arc<dyn TextSurface>,
    pub location: Arc<dyn TextSurface>,
}

#[derive(Debug, Clone)]
pub struct PageOptions {
    pub photo_endpoint: String,
    pub qualifier_style: QualifierStyle,
    pub greeting: String,
    pub show_state: bool,
}

impl PageOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            photo_endpoint: config.photo.endpoint.clone(),
            qualifier_style: config.photo.qualifier_style,
            greeting: config.display.greeting.clone(),
            show_state: config.display.show_state,
        }
    }

    fn greeting_or_default(&self) -> &str {
        if self.greeting.is_empty() {
            DEFAULT_GREETING
        } else {
            &self.greeting
        }
    }
}

impl Default for PageOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Holds the pending photo URL until it is shown.
///
/// `reveal` consumes the gate, so the image surface is assigned exactly once.
#[derive(Debug)]
pub struct RevealGate {
    pending: ImageSource,
}

impl RevealGate {
    pub fn new(source: ImageSource) -> Self {
        Self { pending: source }
    }

    pub fn append_city(&mut self, city: &str) -> bool {
        self.pending.append_city(city)
    }

    pub fn pending(&self) -> &ImageSource {
        &self.pending
    }

    pub fn reveal(self, image: &mut BackgroundImage) -> String {
        let url = self.pending.to_url();
        image.set_source(url.clone());
        url
    }
}

/// What a page view ended up showing
#[derive(Debug, Clone)]
pub struct Revealed {
    pub source: String,
    pub lookup: LookupReport,
}

pub struct PageView {
    options: PageOptions,
    surfaces: Surfaces,
    time: Arc<dyn TimeSource>,
}

impl PageView {
    pub fn new(options: PageOptions, surfaces: Surfaces) -> Self {
        Self {
            options,
            surfaces,
            time: Arc::new(LocalTime),
        }
    }

    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// Run the page view up to the reveal.
    ///
    /// The clock and the location label start when the image surface fires
    /// its load signal, which may be after this returns.
    pub async fn load<P, G>(self, viewport: Viewport, lookup: GeolocationLookup<P, G>) -> Revealed
    where
        P: PositionProvider,
        G: Geocoder,
    {
        let hour = self.time.now().hour();
        let time_of_day = TimeOfDay::classify(hour, self.options.qualifier_style);
        let mut gate = RevealGate::new(ImageSource::new(
            &self.options.photo_endpoint,
            viewport,
            time_of_day,
        ));
        tracing::debug!("Initial photo source {}", gate.pending());

        let label = Arc::new(Mutex::new(
            LocationLabel::new(self.surfaces.location.clone())
                .with_greeting(self.options.greeting_or_default())
                .with_state(self.options.show_state),
        ));
        let clock = ClockDisplay::new(self.surfaces.time.clone(), self.time.clone());
        let mut image = BackgroundImage::new(self.surfaces.image.clone());

        {
            let label = label.clone();
            image.on_load(move || {
                label.lock().render();
                clock.start();
            });
        }

        let report = lookup.run().await;
        if let Some(place) = report.outcome.place() {
            gate.append_city(&place.city_qualifier());
            label.lock().set_place(place);
        }

        let source = gate.reveal(&mut image);
        Revealed {
            source,
            lookup: report,
        }
    }
}
