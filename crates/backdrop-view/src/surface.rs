//! Render targets the widgets draw into.

use std::sync::Arc;

use parking_lot::Mutex;

/// Something that displays a line of text
pub trait TextSurface: Send + Sync {
    fn set_text(&self, text: &str);
}

/// Something that displays an image from a URL.
///
/// `assign` starts loading `url`; the surface calls `loaded.fire()` once the
/// image is rendered. A surface that fails to load simply never fires.
pub trait ImageSurface: Send + Sync {
    fn assign(&self, url: &str, loaded: LoadSignal);
}

type LoadCallback = Box<dyn FnOnce() + Send>;

/// Load-completion notification shared between an image and its surface.
///
/// Every registered callback runs at most once.
#[derive(Clone, Default)]
pub struct LoadSignal {
    listeners: Arc<Mutex<Vec<LoadCallback>>>,
}

impl LoadSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, callback: LoadCallback) {
        self.listeners.lock().push(callback);
    }

    /// Run all pending callbacks; returns how many ran.
    pub fn fire(&self) -> usize {
        // Take the callbacks first so a callback can register again
        let pending = std::mem::take(&mut *self.listeners.lock());
        let count = pending.len();
        for callback in pending {
            callback();
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl std::fmt::Debug for LoadSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadSignal")
            .field("pending", &self.pending())
            .finish()
    }
}
