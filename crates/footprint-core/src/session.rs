//! Session identity with a sliding inactivity window.
//!
//! Each session slot cycles through three states:
//!
//! ```text
//!   absent --mint--> fresh --read within window--> active (window slides)
//!                      ^                               |
//!                      +------mint------ expired <-----+ read after window
//! ```
//!
//! Every read refreshes the stored last-activity timestamp, so the window
//! is measured from the most recent call, not from session start. A
//! missing or unparseable timestamp counts as `0`, which forces rotation.

use std::time::Duration;

use footprint_db::SharedStore;
use footprint_types::SessionId;

use crate::DIAGNOSTICS;
use crate::clock::{SharedClock, duration_ms};

/// Identity store key holding the session identifier.
pub const SESSION_ID_KEY: &str = "footprint_session_id";

/// Identity store key holding the last-activity timestamp (epoch millis).
pub const LAST_ACTIVITY_KEY: &str = "footprint_session_last_activity";

/// Default inactivity window after which a session rotates.
pub const DEFAULT_INACTIVITY_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Produces a session identifier that rotates after inactivity.
#[derive(Clone)]
pub struct SessionManager {
    store: SharedStore,
    clock: SharedClock,
    window_ms: i64,
}

impl SessionManager {
    /// Create a manager rotating sessions after `inactivity_window` of idleness.
    pub fn new(store: SharedStore, clock: SharedClock, inactivity_window: Duration) -> Self {
        Self {
            store,
            clock,
            window_ms: duration_ms(inactivity_window),
        }
    }

    /// The configured inactivity window.
    pub fn inactivity_window(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.window_ms).unwrap_or(0))
    }

    /// Return the current session identifier, rotating it if expired.
    ///
    /// Always records `now` as the new last-activity time. Never fails:
    /// an unreadable store yields a fresh identifier for this call, and
    /// write failures are ignored.
    pub fn get_or_create_session_id(&self) -> SessionId {
        let now = self.clock.now_ms();

        let current = match self.read_current(now) {
            Ok(current) => current,
            Err(e) => {
                tracing::debug!(target: DIAGNOSTICS, error = %e, "Session unreadable, using ephemeral id");
                return SessionId::mint(now);
            }
        };

        let id = current.unwrap_or_else(|| {
            let id = SessionId::mint(now);
            if let Err(e) = self.store.set(SESSION_ID_KEY, id.as_str()) {
                tracing::debug!(target: DIAGNOSTICS, error = %e, "Session id not persisted");
            }
            tracing::debug!(session_id = %id, "Started new session");
            id
        });

        if let Err(e) = self.store.set(LAST_ACTIVITY_KEY, &now.to_string()) {
            tracing::debug!(target: DIAGNOSTICS, error = %e, "Session activity not persisted");
        }

        id
    }

    /// The stored session id if it is still inside the window at `now`.
    fn read_current(&self, now: i64) -> Result<Option<SessionId>, footprint_db::DbError> {
        let stored = self.store.get(SESSION_ID_KEY)?.filter(|id| !id.is_empty());
        let last_activity = self
            .store
            .get(LAST_ACTIVITY_KEY)?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);

        let idle = now.saturating_sub(last_activity);
        Ok(stored
            .filter(|_| idle <= self.window_ms)
            .map(SessionId::from))
    }
}

impl core::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionManager")
            .field("window_ms", &self.window_ms)
            .finish_non_exhaustive()
    }
}
