//! Session diagnostics.
//!
//! Diagnostics are a read-only side channel: the reactor records into them
//! but never reads them back when deciding what to do.

pub mod event;
pub mod metrics;
pub mod recorder;
