use crate::{
    activity::{ActivityKind, ActivityStamp},
    config::{ConfigError, RedirectPolicy, WatchdogConfig},
    watchdog::{Watchdog, WatchdogSignal},
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::{sync::mpsc, time::interval};

/// Rendering collaborator for watchdog side effects
///
/// The monitor never renders anything itself; it tells the sink what should
/// be on screen. Showing a warning must be idempotent at the sink level
/// (remove any prior instance before creating a new one).
#[async_trait]
pub trait SignalSink: Send + Sync {
    /// Show the inactivity warning. `remaining_secs` is the time left until
    /// the session expires.
    async fn on_warn(&self, remaining_secs: u64);

    /// Remove the warning if present
    async fn on_dismiss_warning(&self);

    /// The session expired. Fired exactly once per monitor lifetime; the
    /// sink owns the navigation described by `redirect`.
    async fn on_expire(&self, redirect: &RedirectPolicy);

    /// The server acknowledged a session extension
    async fn on_extension_confirmed(&self);
}

/// Server-side session extension side channel
#[async_trait]
pub trait SessionExtender: Send + Sync {
    /// Ask the backend to extend the session
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be read.
    async fn extend_session(&self) -> Result<bool>;
}

enum Command {
    Activity,
    Extend,
    Dispose,
}

/// Cheap, cloneable front door to a running [`SessionMonitor`]
///
/// Event handlers hold one of these; every method is safe to call at input
/// frequency and after disposal.
#[derive(Clone)]
pub struct MonitorHandle {
    stamp: Arc<ActivityStamp>,
    warned: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
    commands: mpsc::UnboundedSender<Command>,
}

impl MonitorHandle {
    /// Record a qualifying input event
    ///
    /// The hot path is one atomic store. The monitor loop is only woken when
    /// a warning is currently showing, so the dismissal does not wait for
    /// the next poll.
    pub fn record_activity(&self, kind: ActivityKind) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        self.stamp.touch(Utc::now());
        log::trace!("Activity recorded: {kind:?}");
        if self.warned.load(Ordering::SeqCst) {
            let _ = self.commands.send(Command::Activity);
        }
    }

    /// Reset activity locally and request a server-side session extension
    ///
    /// Optimistic: the local reset happens regardless of the network
    /// outcome. A failed extension is logged, never surfaced.
    pub fn extend(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        self.stamp.touch(Utc::now());
        let _ = self.commands.send(Command::Extend);
    }

    /// Halt the monitor permanently, releasing its timer. Idempotent.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            let _ = self.commands.send(Command::Dispose);
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// Drives the [`Watchdog`] on a repeating timer
///
/// Owns the state machine exclusively; everything else reaches it through a
/// [`MonitorHandle`]. The loop stops on expiry or disposal.
pub struct SessionMonitor {
    watchdog: Watchdog,
    stamp: Arc<ActivityStamp>,
    warned: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
    sink: Arc<dyn SignalSink>,
    extender: Arc<dyn SessionExtender>,
    commands: mpsc::UnboundedReceiver<Command>,
    // Keeps the channel open if the caller drops every handle
    _keepalive: mpsc::UnboundedSender<Command>,
}

impl SessionMonitor {
    /// Create a monitor and the handle used to feed it
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is inconsistent.
    pub fn new(
        config: WatchdogConfig,
        sink: Arc<dyn SignalSink>,
        extender: Arc<dyn SessionExtender>,
    ) -> Result<(Self, MonitorHandle), ConfigError> {
        let now = Utc::now();
        let watchdog = Watchdog::new(config, now)?;
        let stamp = Arc::new(ActivityStamp::new(now));
        let warned = Arc::new(AtomicBool::new(false));
        let disposed = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = MonitorHandle {
            stamp: stamp.clone(),
            warned: warned.clone(),
            disposed: disposed.clone(),
            commands: tx.clone(),
        };

        let monitor = Self {
            watchdog,
            stamp,
            warned,
            disposed,
            sink,
            extender,
            commands: rx,
            _keepalive: tx,
        };

        Ok((monitor, handle))
    }

    /// Run until the session expires or the handle disposes the monitor
    pub async fn run(mut self) {
        let mut ticker = interval(self.watchdog.config().poll_interval());
        log::info!(
            "Session monitor started (timeout: {}m, warn: {}m)",
            self.watchdog.config().timeout_minutes,
            self.watchdog.config().warn_minutes
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.absorb_activity().await;
                    if self.evaluate().await {
                        break;
                    }
                }
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Activity) => self.absorb_activity().await,
                    Some(Command::Extend) => self.extend().await,
                    Some(Command::Dispose) | None => break,
                }
            }

            if self.disposed.load(Ordering::SeqCst) {
                break;
            }
        }

        self.disposed.store(true, Ordering::SeqCst);
        log::info!("Session monitor stopped");
    }

    /// Fold the shared activity stamp into the state machine
    async fn absorb_activity(&mut self) {
        let stamp = self.stamp.get();
        if stamp > self.watchdog.last_activity() {
            if let Some(WatchdogSignal::DismissWarning) = self.watchdog.record_activity(stamp) {
                self.warned.store(false, Ordering::SeqCst);
                self.sink.on_dismiss_warning().await;
            }
        }
    }

    /// One evaluation of elapsed inactivity; true means monitoring stops
    async fn evaluate(&mut self) -> bool {
        let now = Utc::now();
        match self.watchdog.tick(now) {
            Some(WatchdogSignal::Warn) => {
                self.warned.store(true, Ordering::SeqCst);
                let remaining = self.watchdog.remaining(now).num_seconds().max(0) as u64;
                self.sink.on_warn(remaining).await;
                false
            }
            Some(WatchdogSignal::Expire) => {
                self.warned.store(false, Ordering::SeqCst);
                let redirect = self.watchdog.config().redirect_policy();
                self.sink.on_expire(&redirect).await;
                true
            }
            Some(WatchdogSignal::DismissWarning) | None => false,
        }
    }

    /// Handle an extension request from the handle
    ///
    /// The network call runs on its own task so a slow backend never blocks
    /// the tick or activity recording.
    async fn extend(&mut self) {
        self.absorb_activity().await;

        let sink = self.sink.clone();
        let extender = self.extender.clone();
        tokio::spawn(async move {
            match extender.extend_session().await {
                Ok(true) => sink.on_extension_confirmed().await,
                Ok(false) => log::warn!("Session extension rejected by server"),
                Err(e) => log::warn!("Failed to extend session: {e}"),
            }
        });
    }
}
