//! Eligibility filter for status refreshes.

use crate::carrier::classify;
use crate::shipment::Shipment;

/// Statuses that are terminal or not trackable.
pub const TERMINAL_STATUSES: &[&str] = &[
    "delivered",
    "cancelled",
    "canceled",
    "void",
    "voided",
    "draft",
];

/// Reason reported when a shipment is skipped for ineligibility.
pub const NOT_ELIGIBLE_REASON: &str = "Shipment not eligible for update";

/// Whether a shipment may be refreshed.
///
/// False for terminal statuses (compared case-insensitively); otherwise true
/// iff the carrier classifier resolves a non-empty tracking value.
pub fn is_eligible(shipment: &Shipment) -> bool {
    ineligibility_reason(shipment).is_none()
}

/// Why a shipment is not eligible, or `None` when it is.
pub fn ineligibility_reason(shipment: &Shipment) -> Option<&'static str> {
    if has_terminal_status(shipment) {
        return Some("status is terminal");
    }
    if !classify(shipment).has_tracking_value() {
        return Some("no tracking identifier");
    }
    None
}

/// Whether the shipment's status is in [`TERMINAL_STATUSES`].
pub fn has_terminal_status(shipment: &Shipment) -> bool {
    shipment
        .normalized_status()
        .is_some_and(|status| TERMINAL_STATUSES.iter().any(|t| *t == status))
}

/// Keep only eligible shipments, preserving order.
pub fn eligible_shipments(shipments: &[Shipment]) -> Vec<Shipment> {
    shipments.iter().filter(|s| is_eligible(s)).cloned().collect()
}
