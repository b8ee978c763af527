//! User-facing notifications
//!
//! Notifications are fire-and-forget and never affect control flow.

use tracing::{error, info, warn};

/// Category of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    fn push(&self, kind: NotificationKind, title: &str, message: &str);
}

/// Forwards notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn push(&self, kind: NotificationKind, title: &str, message: &str) {
        match kind {
            NotificationKind::Info => info!("{}: {}", title, message),
            NotificationKind::Warning => warn!("{}: {}", title, message),
            NotificationKind::Error => error!("{}: {}", title, message),
        }
    }
}
