use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveTime, Timelike};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::surface::TextSurface;

const TICK: Duration = Duration::from_millis(1000);

/// Wall-clock source for the clock and the time-of-day label
pub trait TimeSource: Send + Sync {
    fn now(&self) -> NaiveTime;
}

/// Local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTime;

impl TimeSource for LocalTime {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock stopped at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedTime(pub NaiveTime);

impl TimeSource for FixedTime {
    fn now(&self) -> NaiveTime {
        self.0
    }
}

pub fn pad_zero(n: u32) -> String {
    if n < 10 {
        format!("0{}", n)
    } else {
        n.to_string()
    }
}

/// `HH:MM:SS`
pub fn format_time(time: NaiveTime) -> String {
    format!(
        "{}:{}:{}",
        pad_zero(time.hour()),
        pad_zero(time.minute()),
        pad_zero(time.second())
    )
}

pub struct ClockDisplay {
    target: Arc<dyn TextSurface>,
    time: Arc<dyn TimeSource>,
}

impl ClockDisplay {
    pub fn new(target: Arc<dyn TextSurface>, time: Arc<dyn TimeSource>) -> Self {
        Self { target, time }
    }

    /// Draw the current time once
    pub fn render(&self) -> String {
        let text = format_time(self.time.now());
        self.target.set_text(&text);
        text
    }

    /// Render now, then every second for as long as the runtime lives.
    ///
    /// Slow ticks push the next one back instead of bursting to catch up.
    /// Without a tokio runtime only the first render happens.
    pub fn start(self) -> Option<JoinHandle<()>> {
        self.render();

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                tracing::warn!("No async runtime; clock will not tick");
                return None;
            }
        };

        Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately and was rendered above
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.render();
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl TextSurface for Lines {
        fn set_text(&self, text: &str) {
            self.0.lock().push(text.to_string());
        }
    }

    fn at(h: u32, m: u32, s: u32) -> Arc<dyn TimeSource> {
        Arc::new(FixedTime(NaiveTime::from_hms_opt(h, m, s).unwrap()))
    }

    #[test]
    fn test_pad_zero() {
        assert_eq!(pad_zero(0), "00");
        assert_eq!(pad_zero(9), "09");
        assert_eq!(pad_zero(10), "10");
        assert_eq!(pad_zero(23), "23");
        for n in 0..60 {
            assert_eq!(pad_zero(n).len(), 2);
        }
    }

    #[test]
    fn test_format_time() {
        let t = NaiveTime::from_hms_opt(7, 5, 0).unwrap();
        assert_eq!(format_time(t), "07:05:00");
        let t = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
        assert_eq!(format_time(t), "23:59:59");
    }

    #[test]
    fn test_start_without_runtime_renders_once() {
        let lines = Arc::new(Lines::default());
        let clock = ClockDisplay::new(lines.clone(), at(9, 3, 7));

        assert!(clock.start().is_none());
        assert_eq!(*lines.0.lock(), vec!["09:03:07".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_renders_immediately_then_every_second() {
        let lines = Arc::new(Lines::default());
        let clock = ClockDisplay::new(lines.clone(), at(14, 0, 1));

        let handle = clock.start();
        assert!(handle.is_some());
        assert_eq!(lines.0.lock().len(), 1);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let rendered = lines.0.lock().clone();
        assert_eq!(rendered.len(), 3);
        assert!(rendered.iter().all(|l| l == "14:00:01"));
    }
}
