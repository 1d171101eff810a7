//! Carrier classification.
//!
//! Maps a shipment to the carrier platform that owns its status updates and
//! resolves the identifier that platform expects for a tracking lookup.

mod classifier;
mod types;

pub use classifier::{
    carrier_name, classify, tracking_chain, TrackingField, ESHIPPLUS_KEYWORDS,
    ESHIPPLUS_PLATFORM_ID, ESHIPPLUS_SOURCE_PLATFORM,
};
pub use types::*;
