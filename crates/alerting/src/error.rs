use rigwatch_core::error::CoreError;

use crate::settings::SettingsError;

/// Errors surfaced by [`AlertingService`](crate::AlertingService) config updates.
///
/// Reading ingestion never fails; only the settings round-trip can.
#[derive(Debug, thiserror::Error)]
pub enum AlertingError {
    /// The update was rejected before anything changed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The settings store could not persist the new config.
    #[error("Settings store error: {0}")]
    Settings(#[from] SettingsError),
}
