//! Remote status-check abstraction.
//!
//! This module provides a `StatusChecker` trait for the backend operation that
//! checks a shipment with its carrier and persists any new status, plus an
//! implementation that calls it as an HTTPS callable function.

mod http;
mod types;

pub use http::HttpStatusChecker;
pub use types::*;
