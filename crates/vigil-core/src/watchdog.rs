use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, WatchdogConfig};

/// Watchdog lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchdogState {
    /// Viewer interacted recently, nothing is showing
    Active,
    /// Inactivity crossed the warning threshold, warning is showing
    Warned,
    /// Inactivity reached the timeout. Terminal: the watchdog is inert
    /// from here on
    Expired,
}

impl WatchdogState {
    /// Check whether the watchdog has reached its terminal state
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Get human-readable description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Active => "Session active",
            Self::Warned => "Session expiring soon",
            Self::Expired => "Session expired",
        }
    }
}

/// Side-effect signal for the rendering collaborator
///
/// At most one signal is produced per operation. `Warn`/`DismissWarning` may
/// alternate arbitrarily many times; `Expire` is produced exactly once per
/// watchdog lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogSignal {
    /// Show the inactivity warning
    Warn,
    /// Remove the warning if present
    DismissWarning,
    /// The session expired; monitoring stops
    Expire,
}

/// Inactivity state machine
///
/// Pure and clock-free: both operations take an explicit `now` so behavior
/// is fully deterministic under test. All I/O (timers, rendering, the
/// extend-session call) lives in the driver, not here.
pub struct Watchdog {
    config: WatchdogConfig,
    state: WatchdogState,
    last_activity: DateTime<Utc>,
}

impl Watchdog {
    /// Create a watchdog with its last-activity timestamp set to `now`
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configured thresholds are inconsistent
    /// (see [`WatchdogConfig::validate`]).
    pub fn new(config: WatchdogConfig, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: WatchdogState::Active,
            last_activity: now,
        })
    }

    #[must_use]
    pub fn state(&self) -> WatchdogState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Record a qualifying input event
    ///
    /// Updates the last-activity timestamp. From `Warned` this transitions
    /// back to `Active` and asks the collaborator to dismiss the warning.
    /// From `Expired` this is a complete no-op.
    pub fn record_activity(&mut self, now: DateTime<Utc>) -> Option<WatchdogSignal> {
        if self.state == WatchdogState::Expired {
            return None;
        }
        self.last_activity = now;
        if self.state == WatchdogState::Warned {
            self.state = WatchdogState::Active;
            return Some(WatchdogSignal::DismissWarning);
        }
        None
    }

    /// Evaluate elapsed inactivity once
    ///
    /// Expiry is checked first: elapsed time past the timeout also satisfies
    /// the warning threshold, and a `Warn` must never follow an `Expire`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<WatchdogSignal> {
        if self.state == WatchdogState::Expired {
            return None;
        }
        let elapsed = now.signed_duration_since(self.last_activity);

        if elapsed >= self.config.expiry_threshold() {
            self.state = WatchdogState::Expired;
            return Some(WatchdogSignal::Expire);
        }
        if elapsed >= self.config.warn_threshold() && self.state == WatchdogState::Active {
            self.state = WatchdogState::Warned;
            return Some(WatchdogSignal::Warn);
        }
        None
    }

    /// Time left until expiry as seen from `now`, clamped at zero
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let deadline = self.last_activity + self.config.expiry_threshold();
        (deadline - now).max(Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn watchdog() -> Watchdog {
        Watchdog::new(WatchdogConfig::default(), start()).unwrap()
    }

    fn mins(m: i64) -> Duration {
        Duration::minutes(m)
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = WatchdogConfig {
            timeout_minutes: 2,
            warn_minutes: 2,
            ..WatchdogConfig::default()
        };
        assert!(Watchdog::new(config, start()).is_err());
    }

    #[test]
    fn test_stays_active_with_frequent_activity() {
        let mut dog = watchdog();

        // Activity every 10 minutes, well under the 13 minute warning
        // threshold, with ticks in between
        for i in 1..=12 {
            let t = start() + mins(i * 10);
            assert_eq!(dog.tick(t - mins(1)), None);
            assert_eq!(dog.record_activity(t), None);
            assert_eq!(dog.state(), WatchdogState::Active);
        }
    }

    #[test]
    fn test_warns_exactly_at_threshold() {
        let mut dog = watchdog();

        assert_eq!(dog.tick(start() + mins(12)), None);
        assert_eq!(dog.tick(start() + mins(13)), Some(WatchdogSignal::Warn));
        assert_eq!(dog.state(), WatchdogState::Warned);

        // No re-warn while the warning is already showing
        assert_eq!(dog.tick(start() + mins(14)), None);
    }

    #[test]
    fn test_activity_dismisses_warning_once() {
        let mut dog = watchdog();

        assert_eq!(dog.tick(start() + mins(13)), Some(WatchdogSignal::Warn));
        assert_eq!(
            dog.record_activity(start() + mins(14)),
            Some(WatchdogSignal::DismissWarning)
        );
        assert_eq!(dog.state(), WatchdogState::Active);

        // Further activity from Active produces no signal
        assert_eq!(dog.record_activity(start() + mins(14) + mins(1)), None);
    }

    #[test]
    fn test_expires_once_then_silent() {
        let mut dog = watchdog();

        assert_eq!(dog.tick(start() + mins(13)), Some(WatchdogSignal::Warn));
        assert_eq!(dog.tick(start() + mins(15)), Some(WatchdogSignal::Expire));
        assert_eq!(dog.state(), WatchdogState::Expired);
        assert!(dog.state().is_terminal());

        // t = 15.5 min: no further signal of any kind
        assert_eq!(dog.tick(start() + mins(15) + Duration::seconds(30)), None);
        assert_eq!(dog.tick(start() + mins(60)), None);
    }

    #[test]
    fn test_expiry_checked_before_rewarning() {
        let mut dog = watchdog();

        // First evaluation after a long gap: one Expire, never a Warn
        assert_eq!(dog.tick(start() + mins(20)), Some(WatchdogSignal::Expire));
    }

    #[test]
    fn test_inert_after_expiry() {
        let mut dog = watchdog();
        dog.tick(start() + mins(15));
        assert_eq!(dog.state(), WatchdogState::Expired);

        let before = dog.last_activity();
        assert_eq!(dog.record_activity(start() + mins(16)), None);
        assert_eq!(dog.last_activity(), before);
        assert_eq!(dog.state(), WatchdogState::Expired);
    }

    #[test]
    fn test_warn_dismiss_warn_scenario() {
        // timeout=15, warn=2: activity at t=0, tick at 13 warns, activity at
        // 14 dismisses, tick at 27 (13 after the reset) warns again
        let mut dog = watchdog();

        assert_eq!(dog.tick(start() + mins(13)), Some(WatchdogSignal::Warn));
        assert_eq!(
            dog.record_activity(start() + mins(14)),
            Some(WatchdogSignal::DismissWarning)
        );
        assert_eq!(dog.tick(start() + mins(26)), None);
        assert_eq!(dog.tick(start() + mins(27)), Some(WatchdogSignal::Warn));
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        let mut dog = watchdog();
        assert_eq!(dog.remaining(start() + mins(13)), mins(2));

        dog.tick(start() + mins(20));
        assert_eq!(dog.remaining(start() + mins(20)), Duration::zero());
    }
}
