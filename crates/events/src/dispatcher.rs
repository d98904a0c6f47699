//! Alert dispatch boundary.
//!
//! The evaluator decides *whether* an alert fires; a [`NotificationDispatcher`]
//! performs the user-visible side effect. Both sides are fire-and-forget:
//! dispatch never fails from the caller's point of view and is never retried.

use std::sync::Arc;

use rigwatch_core::alert::AlertNotification;

use crate::bus::{EventBus, PlatformEvent};

/// OS-level notification sink (desktop toast, tray balloon, ...).
pub trait DesktopNotifier: Send + Sync {
    /// Show a notification. Returns whether the platform accepted it.
    fn show(&self, title: &str, body: &str) -> bool;
}

/// Receives every alert the evaluator fires.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, alert: &AlertNotification);
}

/// Shows each alert through a [`DesktopNotifier`] and publishes it on the
/// [`EventBus`] for in-app consumers.
pub struct BusDispatcher {
    notifier: Arc<dyn DesktopNotifier>,
    bus: Arc<EventBus>,
}

impl BusDispatcher {
    pub fn new(notifier: Arc<dyn DesktopNotifier>, bus: Arc<EventBus>) -> Self {
        Self { notifier, bus }
    }
}

impl NotificationDispatcher for BusDispatcher {
    fn dispatch(&self, alert: &AlertNotification) {
        if !self.notifier.show(&alert.title, &alert.message) {
            tracing::debug!(
                device_id = alert.device_id,
                alert_type = ?alert.alert_type,
                "Desktop notification was not delivered"
            );
        }

        let payload = serde_json::to_value(alert).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to serialise alert payload");
            serde_json::json!({})
        });
        let event = PlatformEvent::new(alert.alert_type.event_name())
            .with_source("device", alert.device_id)
            .with_payload(payload);
        self.bus.publish(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use rigwatch_core::alert::AlertType;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        shown: Mutex<Vec<(String, String)>>,
        accept: bool,
    }

    impl DesktopNotifier for RecordingNotifier {
        fn show(&self, title: &str, body: &str) -> bool {
            self.shown
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            self.accept
        }
    }

    fn sample_alert() -> AlertNotification {
        AlertNotification {
            alert_type: AlertType::Temperature,
            device_id: 3,
            device_name: "s19-rack-3".into(),
            title: AlertType::Temperature.title().into(),
            message: "s19-rack-3 is running at 82.0°C (threshold 70.0°C)".into(),
            value: Some(82.0),
            threshold: Some(70.0),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dispatch_shows_and_publishes() {
        let notifier = Arc::new(RecordingNotifier {
            accept: true,
            ..Default::default()
        });
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let dispatcher = BusDispatcher::new(notifier.clone(), bus);

        dispatcher.dispatch(&sample_alert());

        let shown = notifier.shown.lock().unwrap().clone();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, "High Temperature");
        assert!(shown[0].1.contains("s19-rack-3"));

        let event = rx.recv().await.expect("event should be published");
        assert_eq!(event.event_type, "alert.temperature");
        assert_eq!(event.source_entity_id, Some(3));
        assert_eq!(event.payload["device_name"], "s19-rack-3");
        assert_eq!(event.payload["threshold"], 70.0);
    }

    #[tokio::test]
    async fn rejected_desktop_notification_still_publishes() {
        let notifier = Arc::new(RecordingNotifier::default());
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let dispatcher = BusDispatcher::new(notifier, bus);

        dispatcher.dispatch(&sample_alert());

        assert!(rx.recv().await.is_ok());
    }
}
