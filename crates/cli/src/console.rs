//! Console notifications

use mirror_watcher::{NotificationKind, Notifier};
use owo_colors::OwoColorize;
use tracing::debug;

/// Prints notifications as coloured lines on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn push(&self, kind: NotificationKind, title: &str, message: &str) {
        debug!("Notification ({:?}) {}: {}", kind, title, message);
        match kind {
            NotificationKind::Info => println!("{} {} {}", "•".blue(), title.bold(), message),
            NotificationKind::Warning => {
                println!("{} {} {}", "!".yellow(), title.bold(), message.yellow())
            }
            NotificationKind::Error => {
                eprintln!("{} {} {}", "✗".red(), title.bold(), message.red())
            }
        }
    }
}
