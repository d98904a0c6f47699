//! Logs every alert event published on the event bus.

use rigwatch_events::PlatformEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Event types written by this job start with this prefix.
const ALERT_PREFIX: &str = "alert.";

/// Consume `rx` until the bus closes or `cancel` fires.
///
/// Returns the number of alert events logged.
pub async fn run(mut rx: broadcast::Receiver<PlatformEvent>, cancel: CancellationToken) -> u64 {
    tracing::info!("Alert logger started");
    let mut logged: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(logged, "Alert logger stopping");
                break;
            }
            received = rx.recv() => {
                match received {
                    Ok(event) => {
                        if event.event_type.starts_with(ALERT_PREFIX) {
                            log_alert(&event);
                            logged += 1;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Alert logger lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!(logged, "Event bus closed, alert logger shutting down");
                        break;
                    }
                }
            }
        }
    }

    logged
}

fn log_alert(event: &PlatformEvent) {
    let message = event.payload.get("message").and_then(|m| m.as_str()).unwrap_or("");
    tracing::info!(
        event_type = %event.event_type,
        device_id = ?event.source_entity_id,
        at = %event.timestamp,
        alert_message = message,
        "Alert event"
    );
}
