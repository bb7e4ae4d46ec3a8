use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration error raised at watchdog construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The warning window must fit inside the timeout window, otherwise the
    /// Warned state is unreachable or immediately skipped
    #[error("warn_minutes ({warn}) must be less than timeout_minutes ({timeout})")]
    WarnNotBeforeTimeout { warn: u32, timeout: u32 },
    #[error("timeout_minutes must be greater than zero")]
    ZeroTimeout,
    #[error("poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
}

/// Where the rendering collaborator should send the viewer after expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectPolicy {
    pub login_path: String,
    /// Delay before automatic navigation, unless the viewer acts sooner
    pub delay_secs: u64,
}

/// Watchdog configuration
///
/// Defaults match the deployed behavior: 15 minute session timeout, warning
/// 2 minutes before expiry, one check every 30 seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub timeout_minutes: u32,
    pub warn_minutes: u32,
    pub poll_interval_ms: u64,
    pub login_path: String,
    pub redirect_delay_secs: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: 15,
            warn_minutes: 2,
            poll_interval_ms: 30_000,
            login_path: String::from("/login"),
            redirect_delay_secs: 5,
        }
    }
}

impl WatchdogConfig {
    /// Check the configured thresholds for consistency
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any threshold is zero or if the warning
    /// window does not fit inside the timeout window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_minutes == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.warn_minutes >= self.timeout_minutes {
            return Err(ConfigError::WarnNotBeforeTimeout {
                warn: self.warn_minutes,
                timeout: self.timeout_minutes,
            });
        }
        Ok(())
    }

    /// Inactivity after which the warning is raised (timeout minus warning window)
    #[must_use]
    pub fn warn_threshold(&self) -> Duration {
        Duration::minutes(i64::from(
            self.timeout_minutes.saturating_sub(self.warn_minutes),
        ))
    }

    /// Inactivity after which the session is considered expired
    #[must_use]
    pub fn expiry_threshold(&self) -> Duration {
        Duration::minutes(i64::from(self.timeout_minutes))
    }

    /// How often the watchdog re-evaluates elapsed inactivity
    #[must_use]
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }

    /// The redirect policy handed to the rendering collaborator on expiry
    #[must_use]
    pub fn redirect_policy(&self) -> RedirectPolicy {
        RedirectPolicy {
            login_path: self.login_path.clone(),
            delay_secs: self.redirect_delay_secs,
        }
    }
}

/// Get the configuration file path for vigil.
///
/// # Errors
///
/// Returns an error if the platform config directory cannot be determined.
pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Failed to get config dir"))?;
    path.push("vigil");
    path.push("config.toml");
    Ok(path)
}
