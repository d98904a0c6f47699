//! rigwatch event bus and notification dispatch.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the canonical event envelope.
//! - [`dispatcher`]: the boundary between fired alerts and the
//!   user-visible side effects (OS notification + in-app event).

pub mod bus;
pub mod dispatcher;
pub mod notifier;

pub use bus::{EventBus, PlatformEvent};
pub use dispatcher::{BusDispatcher, DesktopNotifier, NotificationDispatcher};
pub use notifier::LogNotifier;
