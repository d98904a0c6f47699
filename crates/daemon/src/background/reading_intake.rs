//! Device reading intake.
//!
//! The polling transport runs outside this process and streams its results
//! as newline-delimited JSON (usually piped into stdin):
//!
//! ```text
//! {"type":"reading","device_id":3,"device_name":"rack-a1","is_online":true,"hashrate":110.5,"temperature":64.0}
//! {"type":"device_removed","device_id":3}
//! ```
//!
//! Malformed lines are logged and skipped.

use std::sync::Arc;

use rigwatch_alerting::AlertingService;
use rigwatch_core::hardware::evaluator::DeviceReading;
use rigwatch_core::types::DbId;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

/// One intake line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntakeMessage {
    Reading {
        device_id: DbId,
        device_name: String,
        is_online: bool,
        #[serde(default)]
        hashrate: f64,
        #[serde(default)]
        temperature: f64,
    },
    DeviceRemoved {
        device_id: DbId,
    },
}

/// Counters reported when the intake stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntakeStats {
    pub readings: u64,
    pub removals: u64,
    pub rejected: u64,
}

/// Feed `input` into `service` until EOF or `cancel` fires.
pub async fn run<R>(input: R, service: Arc<AlertingService>, cancel: CancellationToken) -> IntakeStats
where
    R: AsyncBufRead + Unpin,
{
    tracing::info!("Reading intake started");
    let mut lines = input.lines();
    let mut stats = IntakeStats::default();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(?stats, "Reading intake stopping");
                break;
            }
            next = lines.next_line() => {
                match next {
                    Ok(Some(line)) => handle_line(&line, &service, &mut stats),
                    Ok(None) => {
                        tracing::info!(?stats, "Reading intake reached end of input");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reading intake: input failed");
                        break;
                    }
                }
            }
        }
    }

    stats
}

fn handle_line(line: &str, service: &AlertingService, stats: &mut IntakeStats) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    match serde_json::from_str::<IntakeMessage>(line) {
        Ok(IntakeMessage::Reading {
            device_id,
            device_name,
            is_online,
            hashrate,
            temperature,
        }) => {
            service.on_fresh_reading(&DeviceReading {
                device_id,
                device_name,
                is_online,
                hashrate,
                temperature,
            });
            stats.readings += 1;
        }
        Ok(IntakeMessage::DeviceRemoved { device_id }) => {
            service.clear_device_state(device_id);
            stats.removals += 1;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Reading intake: skipping malformed line");
            stats.rejected += 1;
        }
    }
}
