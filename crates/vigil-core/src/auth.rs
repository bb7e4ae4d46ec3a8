use std::sync::atomic::{AtomicBool, Ordering};

/// Ambient "viewer is authenticated" flag
///
/// Owned by the application shell and shared (`Arc`) with every component
/// that gates behavior on it. The reporter checks it before each send; the
/// shell checks it before constructing a watchdog at all.
#[derive(Debug)]
pub struct AuthState {
    authenticated: AtomicBool,
}

impl AuthState {
    #[must_use]
    pub fn new(authenticated: bool) -> Self {
        Self {
            authenticated: AtomicBool::new(authenticated),
        }
    }

    pub fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Relaxed)
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new(false)
    }
}
