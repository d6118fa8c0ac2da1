//! # Session Tracker
//!
//! Issues a fresh [`SessionToken`] every time an item is opened.
//!
//! ## Stale Response Handling
//! ```text
//! open(Pizza) ── token #1 ── fetch ─────────────────────────► response #1
//! open(Pasta) ── token #2 ── fetch ──► response #2 (installed)     │
//!                                                                  ▼
//!                                              #1 != current → discarded
//! ```
//! Only the response for the newest token may install a configuration
//! session.

use bistro_core::SessionToken;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Monotonic source of configuration session tokens.
#[derive(Debug, Default)]
pub struct SessionTracker {
    current: AtomicU64,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session; every earlier token becomes stale.
    pub fn begin(&self) -> SessionToken {
        let token = SessionToken::new(self.current.fetch_add(1, Ordering::SeqCst)).next();
        debug!(%token, "Session token issued");
        token
    }

    /// The newest token, if any was issued.
    pub fn current(&self) -> Option<SessionToken> {
        match self.current.load(Ordering::SeqCst) {
            0 => None,
            value => Some(SessionToken::new(value)),
        }
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.value()
    }

    /// Makes every issued token stale (item popup closed).
    pub fn invalidate(&self) {
        self.begin();
    }
}
