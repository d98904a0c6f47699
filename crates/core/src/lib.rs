//! Pure domain logic for rigwatch.
//!
//! Nothing in this crate performs I/O. Callers feed readings and timestamps
//! in and receive alerts and state out, which keeps every rule testable in
//! isolation.

pub mod alert;
pub mod error;
pub mod hardware;
pub mod threshold_validation;
pub mod types;
