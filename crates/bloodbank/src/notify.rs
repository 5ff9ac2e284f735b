//! Transient user-facing notifications ("toasts").
//!
//! A toast is visible for a fixed delay, then fades, then disappears. Toasts
//! stack in creation order; nothing is deduplicated or queued. Dismissal is a
//! deferred timer spawned on the current tokio runtime and cannot be
//! cancelled. If the toast is already gone when a timer fires, the timer does
//! nothing. Without a runtime toasts stay until [`Notifier::drain`] is
//! called.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace};

/// How a toast is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Positive outcome.
    Success,
    /// Rejected input.
    Error,
    /// Destructive action performed.
    Warn,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
        }
    }
}

/// Where a toast is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Fully shown.
    Visible,
    /// On its way out.
    Fading,
}

/// One notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    /// Identifier, unique per notifier.
    pub id: u64,
    /// Message text.
    pub message: String,
    /// Styling.
    pub severity: Severity,
    /// Lifetime phase.
    pub phase: Phase,
}

/// Display and fade delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastTiming {
    /// How long a toast stays fully visible.
    pub display: Duration,
    /// How long the fade lasts before removal.
    pub fade: Duration,
}

impl Default for ToastTiming {
    fn default() -> Self {
        Self {
            display: Duration::from_millis(1600),
            fade: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Default)]
struct Stack {
    next_id: u64,
    toasts: Vec<Toast>,
}

/// The toast container.
///
/// Cloning yields another handle to the same stack.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    stack: Arc<Mutex<Stack>>,
    timing: ToastTiming,
}

impl Notifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new(timing: ToastTiming) -> Self {
        Self {
            stack: Arc::default(),
            timing,
        }
    }

    /// Show a message and schedule its dismissal.
    ///
    /// Returns the toast id.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> u64 {
        let message = message.into();
        debug!(%severity, %message, "Notification");

        let id = {
            let mut stack = lock(&self.stack);
            stack.next_id += 1;
            let id = stack.next_id;
            stack.toasts.push(Toast {
                id,
                message,
                severity,
                phase: Phase::Visible,
            });
            id
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(dismiss_later(Arc::downgrade(&self.stack), id, self.timing));
        }
        id
    }

    /// Shorthand for a success toast.
    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(message, Severity::Success)
    }

    /// Shorthand for an error toast.
    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(message, Severity::Error)
    }

    /// Shorthand for a warning toast.
    pub fn warn(&self, message: impl Into<String>) -> u64 {
        self.notify(message, Severity::Warn)
    }

    /// Toasts currently on screen, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Toast> {
        lock(&self.stack).toasts.clone()
    }

    /// Remove and return every toast.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut lock(&self.stack).toasts)
    }

    /// Remove one toast right away. Returns whether it was still present.
    pub fn dismiss(&self, id: u64) -> bool {
        remove(&self.stack, id)
    }
}

fn lock(stack: &Mutex<Stack>) -> MutexGuard<'_, Stack> {
    stack.lock().unwrap_or_else(PoisonError::into_inner)
}

fn remove(stack: &Mutex<Stack>, id: u64) -> bool {
    let mut stack = lock(stack);
    let before = stack.toasts.len();
    stack.toasts.retain(|t| t.id != id);
    stack.toasts.len() != before
}

async fn dismiss_later(stack: Weak<Mutex<Stack>>, id: u64, timing: ToastTiming) {
    tokio::time::sleep(timing.display).await;
    let Some(strong) = stack.upgrade() else {
        return;
    };
    if let Some(toast) = lock(&strong).toasts.iter_mut().find(|t| t.id == id) {
        toast.phase = Phase::Fading;
    }
    drop(strong);

    tokio::time::sleep(timing.fade).await;
    if let Some(strong) = stack.upgrade() {
        if remove(&strong, id) {
            trace!(id, "Toast dismissed");
        }
    }
}
