//! Background jobs spawned by the daemon.
//!
//! Every job runs until its `CancellationToken` fires or its input closes.

pub mod alert_logger;
pub mod market_warmup;
pub mod reading_intake;
