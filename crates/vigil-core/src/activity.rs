use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Input events that count as user activity
///
/// Mirrors what the embedding page listens for: pointer, key, scroll and
/// touch input, plus the tab regaining focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
    /// The tab became visible again after being hidden
    TabRefocus,
}

/// Shared last-activity timestamp
///
/// Activity events are high-frequency; recording one must stay cheap. This
/// is a single atomic epoch-milliseconds store, no lock, no allocation.
#[derive(Debug)]
pub struct ActivityStamp {
    epoch_millis: AtomicI64,
}

impl ActivityStamp {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            epoch_millis: AtomicI64::new(now.timestamp_millis()),
        }
    }

    /// Record activity at `now`
    pub fn touch(&self, now: DateTime<Utc>) {
        self.epoch_millis
            .store(now.timestamp_millis(), Ordering::Relaxed);
    }

    /// Read the most recent activity timestamp
    #[must_use]
    pub fn get(&self) -> DateTime<Utc> {
        let millis = self.epoch_millis.load(Ordering::Relaxed);
        DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
