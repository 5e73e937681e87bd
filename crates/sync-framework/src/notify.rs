//! # Notification Channel
//!
//! Every component reports user-visible outcomes through an injected
//! [`NotificationSink`]. The sink is fire-and-forget: nothing it does is observed
//! by the engine, and events are emitted only after the corresponding state
//! transition has been applied in memory.
//!
//! ## Provided Sinks
//!
//! - [`TracingSink`] - logs every event; the default for headless use.
//! - [`NotificationCenter`] - the toast queue behind a renderer, with ids,
//!   manual dismissal and timed auto-dismissal.
//! - [`RecordingSink`](crate::mock::RecordingSink) - captures events in tests.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How long a notification stays visible unless configured otherwise.
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A structured, user-visible event.
///
/// A `duration` of zero means the notification stays until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub duration: Duration,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_sticky(&self) -> bool {
        self.duration.is_zero()
    }
}

/// Receiver of user-visible events.
///
/// Implementations must not block: `emit` is called synchronously from inside
/// mutation and load calls.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, notification: Notification);
}

/// Sink that writes every event to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn emit(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error | NotificationKind::Warning => {
                warn!(kind = ?notification.kind, message = %notification.message, "Notification")
            }
            NotificationKind::Success | NotificationKind::Info => {
                info!(kind = ?notification.kind, message = %notification.message, "Notification")
            }
        }
    }
}

/// A notification currently held by a [`NotificationCenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNotification {
    pub id: String,
    pub notification: Notification,
}

struct CenterInner {
    active: watch::Sender<Vec<ActiveNotification>>,
    next_id: AtomicU64,
}

/// The queue a toast renderer draws from.
///
/// Each pushed notification receives a short unique id. Notifications with a
/// non-zero duration are dismissed automatically once it elapses. Auto-dismissal
/// needs a Tokio runtime; without one they stay until [`dismiss`](Self::dismiss)ed.
///
/// Cloning is cheap and every clone shares the same queue.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (active, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(CenterInner {
                active,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Queues a notification and returns its id.
    pub fn push(&self, notification: Notification) -> String {
        let id = format!("toast-{}", self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let duration = notification.duration;
        debug!(%id, kind = ?notification.kind, "Notification queued");

        self.inner.active.send_modify(|active| {
            active.push(ActiveNotification {
                id: id.clone(),
                notification,
            })
        });

        if !duration.is_zero() {
            self.schedule_dismissal(id.clone(), duration);
        }
        id
    }

    /// Removes a notification. Returns `false` if it was already gone.
    pub fn dismiss(&self, id: &str) -> bool {
        dismiss_in(&self.inner, id)
    }

    pub fn notifications(&self) -> Vec<ActiveNotification> {
        self.inner.active.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ActiveNotification>> {
        self.inner.active.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.active.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.active.borrow().is_empty()
    }

    fn schedule_dismissal(&self, id: String, after: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(%id, "No runtime, notification stays until dismissed");
            return;
        };
        let center: Weak<CenterInner> = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = center.upgrade() {
                dismiss_in(&inner, &id);
            }
        });
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for NotificationCenter {
    fn emit(&self, notification: Notification) {
        self.push(notification);
    }
}

fn dismiss_in(inner: &CenterInner, id: &str) -> bool {
    let removed = inner.active.send_if_modified(|active| {
        let before = active.len();
        active.retain(|entry| entry.id != id);
        active.len() != before
    });
    if removed {
        debug!(%id, "Notification dismissed");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_use_default_duration() {
        let n = Notification::error("boom");
        assert_eq!(n.kind, NotificationKind::Error);
        assert_eq!(n.duration, DEFAULT_NOTIFICATION_DURATION);
        assert!(!n.is_sticky());
        assert!(Notification::success("ok").with_duration(Duration::ZERO).is_sticky());
    }

    #[test]
    fn center_assigns_unique_ids_and_dismisses() {
        let center = NotificationCenter::new();
        let first = center.push(Notification::success("saved").with_duration(Duration::ZERO));
        let second = center.push(Notification::error("failed").with_duration(Duration::ZERO));
        assert_ne!(first, second);
        assert_eq!(center.len(), 2);

        assert!(center.dismiss(&first));
        assert!(!center.dismiss(&first));
        let remaining = center.notifications();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second);
    }

    #[tokio::test(start_paused = true)]
    async fn center_auto_dismisses_after_duration() {
        let center = NotificationCenter::new();
        center.push(Notification::success("timed").with_duration(Duration::from_millis(5000)));
        center.push(Notification::error("sticky").with_duration(Duration::ZERO));

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(center.len(), 2);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let remaining = center.notifications();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].notification.message, "sticky");
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&NotificationKind::Success).unwrap();
        assert_eq!(json, "\"success\"");
    }
}
