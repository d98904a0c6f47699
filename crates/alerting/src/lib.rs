//! Device alerting service.
//!
//! [`AlertingService`] is the single handle the rest of the process uses for
//! alerting: the polling transport feeds it readings, device management
//! clears state on deletion, and the settings surface reads and updates the
//! [`AlertConfig`](rigwatch_core::hardware::config::AlertConfig).

pub mod error;
pub mod service;
pub mod settings;

pub use error::AlertingError;
pub use service::AlertingService;
pub use settings::{JsonFileSettingsStore, MemorySettingsStore, SettingsError, SettingsStore};
