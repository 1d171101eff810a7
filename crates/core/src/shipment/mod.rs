//! Shipment records as written by the upstream integrations.
//!
//! These are read-only to this crate. Field coverage is loose:
//! several integrations have written rate, booking and tracking data under
//! different shapes over time, so every field except `id` is optional.

mod types;

pub use types::*;
