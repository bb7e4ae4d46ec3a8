pub mod activity;
pub mod auth;
pub mod config;
pub mod monitor;
pub mod watchdog;

pub use activity::{ActivityKind, ActivityStamp};
pub use auth::AuthState;
pub use config::{get_config_path, ConfigError, RedirectPolicy, WatchdogConfig};
pub use monitor::{MonitorHandle, SessionExtender, SessionMonitor, SignalSink};
pub use watchdog::{Watchdog, WatchdogSignal, WatchdogState};
