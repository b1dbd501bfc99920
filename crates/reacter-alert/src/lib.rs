//! Threshold detection engine for streaming metric observations.
//!
//! Incoming value lists are matched against host- and metric-pattern rules
//! ([`matcher`]), each value is classified against the rule's warn/fail
//! bounds ([`rules::threshold`]), and the result is folded into a per-key
//! [`store::ObservationRecord`] whose hysteresis counters decide when a
//! violation is entered or cleared ([`state`]). Reportable changes leave the
//! engine as owned [`reacter_common::types::Transition`] snapshots.

pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod rules;
pub mod state;
pub mod stats;
pub mod store;
pub mod window;

#[cfg(test)]
mod tests;

pub use engine::ThresholdEngine;
pub use error::{AlertError, Result};
