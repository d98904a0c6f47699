//! Device monitoring domain logic.
//!
//! Contains the alert evaluation engine and the per-device state it owns.
//! All logic in this module is pure (no I/O): the caller supplies readings,
//! the active [`config::AlertConfig`] and the current time.

pub mod baseline;
pub mod config;
pub mod cooldown;
pub mod evaluator;
pub mod state;
