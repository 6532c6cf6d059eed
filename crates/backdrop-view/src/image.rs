use std::sync::Arc;

use crate::surface::{ImageSurface, LoadSignal};
use crate::time_of_day::TimeOfDay;

/// Rows trimmed from the viewport height when sizing the photo
const HEIGHT_TRIM: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Photo URL under construction: `{endpoint}/{w}x{h}?{q1},{q2}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    endpoint: String,
    width: u32,
    height: u32,
    qualifiers: Vec<String>,
    city: Option<String>,
}

impl ImageSource {
    pub fn new(endpoint: &str, viewport: Viewport, time_of_day: TimeOfDay) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            width: viewport.width,
            height: viewport.height.saturating_sub(HEIGHT_TRIM),
            qualifiers: vec![time_of_day.as_str().to_string()],
            city: None,
        }
    }

    /// Add the lowercased city qualifier. Only the first call has an effect.
    pub fn append_city(&mut self, city: &str) -> bool {
        if self.city.is_some() {
            tracing::warn!("City qualifier already set; ignoring {}", city);
            return false;
        }
        let city = city.to_lowercase();
        self.qualifiers.push(city.clone());
        self.city = Some(city);
        true
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn to_url(&self) -> String {
        format!(
            "{}/{}x{}?{}",
            self.endpoint,
            self.width,
            self.height,
            self.qualifiers.join(",")
        )
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_url())
    }
}

/// The single background image of a page view
pub struct BackgroundImage {
    surface: Arc<dyn ImageSurface>,
    loaded: LoadSignal,
    source: Option<String>,
}

impl BackgroundImage {
    pub fn new(surface: Arc<dyn ImageSurface>) -> Self {
        Self {
            surface,
            loaded: LoadSignal::new(),
            source: None,
        }
    }

    /// Run `callback` once the surface reports the current source loaded
    pub fn on_load(&self, callback: impl FnOnce() + Send + 'static) {
        self.loaded.register(Box::new(callback));
    }

    pub fn set_source(&mut self, url: String) {
        tracing::info!("Showing image {}", url);
        self.surface.assign(&url, self.loaded.clone());
        self.source = Some(url);
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        assigned: Mutex<Vec<(String, LoadSignal)>>,
    }

    impl ImageSurface for Recorder {
        fn assign(&self, url: &str, loaded: LoadSignal) {
            self.assigned.lock().push((url.to_string(), loaded));
        }
    }

    #[test]
    fn test_source_trims_height_and_joins_qualifiers() {
        let mut source = ImageSource::new(
            "https://source.unsplash.com/random/",
            Viewport::new(1024, 768),
            TimeOfDay::Noon,
        );
        assert_eq!(
            source.to_url(),
            "https://source.unsplash.com/random/1024x764?noon"
        );

        assert!(source.append_city("New York"));
        assert_eq!(
            source.to_url(),
            "https://source.unsplash.com/random/1024x764?noon,new york"
        );
    }

    #[test]
    fn test_city_appended_once() {
        let mut source = ImageSource::new("https://p.example", Viewport::new(10, 10), TimeOfDay::Night);
        assert!(source.append_city("Pune"));
        assert!(!source.append_city("Delhi"));
        assert_eq!(source.city(), Some("pune"));
        assert!(source.to_url().ends_with("?night,pune"));
    }

    #[test]
    fn test_tiny_viewport_does_not_underflow() {
        let source = ImageSource::new("https://p.example", Viewport::new(3, 2), TimeOfDay::Day);
        assert_eq!(source.to_url(), "https://p.example/3x0?day");
    }

    #[test]
    fn test_on_load_fires_after_surface_signals() {
        let surface = Arc::new(Recorder::default());
        let mut image = BackgroundImage::new(surface.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let hits = hits.clone();
            image.on_load(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        image.set_source("https://p.example/1x1?day".to_string());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(image.source(), Some("https://p.example/1x1?day"));

        let assigned = surface.assigned.lock();
        assert_eq!(assigned.len(), 1);
        assigned[0].1.fire();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
