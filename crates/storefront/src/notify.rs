//! Transient toast notifications.
//!
//! A minimal publish/subscribe broadcaster decoupling failure reporting
//! (hub client, order save, checkout) from any specific rendering location.
//! Published toasts auto-dismiss after a fixed duration; manual dismissal
//! cancels the pending timer and is idempotent. The currently-active list
//! is also kept so the server renderer can flush it into a page.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// How long a toast stays on screen before auto-dismissal.
pub const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Identifier of a published toast.
pub type ToastId = Uuid;

/// Toast severity. Anything user-actionable that failed is `Error`;
/// confirmations are `Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    /// CSS-friendly name used by templates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

/// Events delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    Shown(Toast),
    Dismissed(ToastId),
}

/// Process-wide (per session engine) toast broadcaster.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    tx: broadcast::Sender<ToastEvent>,
    active: Mutex<Vec<Toast>>,
    timers: Mutex<HashMap<ToastId, JoinHandle<()>>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(NotifierInner {
                tx,
                active: Mutex::new(Vec::new()),
                timers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Publish a toast, notify subscribers, and schedule auto-dismissal.
    pub fn publish(&self, message: impl Into<String>, severity: Severity) -> ToastId {
        let toast = Toast {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            duration: TOAST_DURATION,
        };
        let id = toast.id;

        if let Ok(mut active) = self.inner.active.lock() {
            active.push(toast.clone());
        }

        // Subscribers may come and go; a send with no receivers is fine.
        let _ = self.inner.tx.send(ToastEvent::Shown(toast));

        let notifier = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(TOAST_DURATION).await;
            notifier.expire(id);
        });
        if let Ok(mut timers) = self.inner.timers.lock() {
            timers.insert(id, handle);
        }

        id
    }

    /// Dismiss a toast early. Dismissing an unknown or already-dismissed id
    /// has no effect.
    pub fn dismiss(&self, id: ToastId) {
        let handle = self
            .inner
            .timers
            .lock()
            .ok()
            .and_then(|mut timers| timers.remove(&id));

        let Some(handle) = handle else {
            return;
        };
        handle.abort();
        self.remove_and_notify(id);
    }

    /// Auto-dismissal path, invoked by the timer task.
    fn expire(&self, id: ToastId) {
        let had_timer = self
            .inner
            .timers
            .lock()
            .ok()
            .and_then(|mut timers| timers.remove(&id))
            .is_some();

        // A manual dismissal that raced the timer already notified.
        if had_timer {
            self.remove_and_notify(id);
        }
    }

    fn remove_and_notify(&self, id: ToastId) {
        if let Ok(mut active) = self.inner.active.lock() {
            active.retain(|toast| toast.id != id);
        }
        let _ = self.inner.tx.send(ToastEvent::Dismissed(id));
    }

    /// Subscribe to toast events. Dropping the receiver unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.inner.tx.subscribe()
    }

    /// Currently-visible toasts, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Toast> {
        self.inner
            .active
            .lock()
            .map(|active| active.clone())
            .unwrap_or_default()
    }
}
