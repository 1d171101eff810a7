//! Testing utilities and mock implementations.
//!
//! This module provides a mock of the remote status check and shipment
//! fixtures, allowing orchestrator and API tests without a backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use shiptrack_core::testing::{fixtures, MockStatusChecker};
//!
//! let checker = Arc::new(MockStatusChecker::new());
//! checker.set_response("s1", fixtures::changed_response("booked", "in_transit")).await;
//!
//! let orchestrator = StatusUpdateOrchestrator::new(config, checker.clone());
//! ```

mod mock_status_checker;

pub use mock_status_checker::{MockStatusChecker, RecordedCheck};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::shipment::{BookingConfirmation, RateDetails, Shipment};
    use crate::status_check::StatusCheckResponse;

    /// A shipment with a generic tracking number and a non-terminal status.
    pub fn tracked_shipment(id: &str) -> Shipment {
        Shipment {
            id: id.to_string(),
            shipment_number: Some(format!("IC-{}", id)),
            status: Some("booked".to_string()),
            tracking_number: Some(format!("TRK-{}", id)),
            ..Default::default()
        }
    }

    /// An eShipPlus shipment identified by its platform id.
    pub fn eshipplus_shipment(id: &str, booking_reference: &str) -> Shipment {
        Shipment {
            id: id.to_string(),
            shipment_number: Some(format!("IC-{}", id)),
            status: Some("booked".to_string()),
            selected_rate: Some(RateDetails {
                carrier: Some("Estes Freight".to_string()),
                platform_id: Some("ESHIPPLUS".to_string()),
                booking_reference_number: Some(booking_reference.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// A Canpar shipment whose tracking number sits in the legacy rate field.
    pub fn canpar_shipment(id: &str, tracking_number: &str) -> Shipment {
        Shipment {
            id: id.to_string(),
            status: Some("booked".to_string()),
            carrier: Some("Canpar".to_string()),
            selected_rate: Some(RateDetails {
                tracking_number_legacy: Some(tracking_number.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// A Polaris shipment with a PRO number from its booking confirmation.
    pub fn polaris_shipment(id: &str, pro_number: &str) -> Shipment {
        Shipment {
            id: id.to_string(),
            status: Some("booked".to_string()),
            carrier: Some("Polaris Transportation".to_string()),
            booking_confirmation: Some(BookingConfirmation {
                pro_number: Some(pro_number.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// A shipment with no tracking data anywhere.
    pub fn untracked_shipment(id: &str) -> Shipment {
        Shipment {
            id: id.to_string(),
            status: Some("booked".to_string()),
            carrier: Some("Local Courier".to_string()),
            ..Default::default()
        }
    }

    /// `count` tracked shipments with ids `s1..=s{count}`.
    pub fn tracked_shipments(count: usize) -> Vec<Shipment> {
        (1..=count)
            .map(|i| tracked_shipment(&format!("s{}", i)))
            .collect()
    }

    /// A backend reply reporting a status change.
    pub fn changed_response(previous: &str, new: &str) -> StatusCheckResponse {
        StatusCheckResponse {
            previous_status: Some(previous.to_string()),
            new_status: Some(new.to_string()),
            status_changed: true,
            tracking_updates_count: 1,
        }
    }

    /// A backend reply reporting no change.
    pub fn unchanged_response(status: &str) -> StatusCheckResponse {
        StatusCheckResponse {
            previous_status: Some(status.to_string()),
            new_status: Some(status.to_string()),
            status_changed: false,
            tracking_updates_count: 0,
        }
    }
}
