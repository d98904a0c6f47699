//! Headless desktop notifier.

use crate::dispatcher::DesktopNotifier;

/// Writes notifications to the log instead of the OS notification centre.
///
/// Used when the process runs without a desktop session (servers, CI).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl DesktopNotifier for LogNotifier {
    fn show(&self, title: &str, body: &str) -> bool {
        tracing::info!(title, body, "Notification");
        true
    }
}
