//! Session/user store.
//!
//! State machine: unauthenticated → (persisted cache hit) → provisionally
//! authenticated → (hub session check resolves) → authenticated or
//! unauthenticated. Each confirmation runs under a generation counter; a
//! confirmation that is no longer the latest initiated check is discarded,
//! and an explicit login invalidates any in-flight check so a stale result
//! cannot override it.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::hub::{HubApi, HubError};
use crate::models::User;

/// Result of a session confirmation round-trip.
#[derive(Debug)]
pub enum RestoreOutcome {
    /// The hub confirmed a session; the committed user is authoritative.
    Confirmed(User),
    /// The hub reported no session; cached identity was cleared.
    SignedOut,
    /// A newer check or a login superseded this one; nothing was changed.
    Superseded,
    /// The check itself failed; existing state was left untouched.
    Failed(HubError),
}

/// Holds the authenticated identity for one session engine.
pub struct UserStore {
    user: Mutex<Option<User>>,
    restore_generation: AtomicU64,
}

impl UserStore {
    /// Create the store, optimistically applying a persisted snapshot for
    /// instant feedback before the hub confirms it.
    #[must_use]
    pub fn new(cached: Option<User>) -> Self {
        Self {
            user: Mutex::new(cached),
            restore_generation: AtomicU64::new(0),
        }
    }

    /// The currently committed user, if any.
    #[must_use]
    pub fn current(&self) -> Option<User> {
        self.user.lock().map(|user| user.clone()).unwrap_or(None)
    }

    /// Confirm the cached identity against the hub session endpoint.
    ///
    /// Tags the check with a fresh generation; by the time the round-trip
    /// resolves, a newer check or a login may have superseded it, in which
    /// case the result is discarded without touching state.
    pub async fn restore(&self, api: &dyn HubApi) -> RestoreOutcome {
        let generation = self.restore_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let session_user = match api.fetch_session().await {
            Ok(user) => user,
            Err(e) => return RestoreOutcome::Failed(e),
        };

        if self.restore_generation.load(Ordering::SeqCst) != generation {
            return RestoreOutcome::Superseded;
        }

        match session_user {
            Some(user) => {
                self.commit(Some(user.clone()));
                RestoreOutcome::Confirmed(user)
            }
            None => {
                self.commit(None);
                RestoreOutcome::SignedOut
            }
        }
    }

    /// Commit a user after successful OTP verification.
    ///
    /// Bumps the generation so a late-arriving session check cannot
    /// override the fresh login.
    pub fn login(&self, user: User) {
        self.restore_generation.fetch_add(1, Ordering::SeqCst);
        self.commit(Some(user));
    }

    /// Clear the identity immediately and synchronously.
    pub fn logout(&self) {
        self.restore_generation.fetch_add(1, Ordering::SeqCst);
        self.commit(None);
    }

    fn commit(&self, user: Option<User>) {
        if let Ok(mut current) = self.user.lock() {
            *current = user;
        }
    }
}
