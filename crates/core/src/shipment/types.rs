//! Types for shipment records.

use serde::{Deserialize, Serialize};

/// A shipment document as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    /// Opaque document id. Keys the results map.
    pub id: String,
    /// Human-facing shipment identifier.
    #[serde(default, rename = "shipmentID", skip_serializing_if = "Option::is_none")]
    pub shipment_number: Option<String>,
    /// Free-form status, compared case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Top-level carrier name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    /// Generic tracking number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    /// Rate the shipper selected at booking time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_rate: Option<RateDetails>,
    /// Legacy rate reference written by older integrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_rate_ref: Option<RateDetails>,
    /// Confirmation returned by the carrier's booking API.
    #[serde(
        default,
        rename = "carrierBookingConfirmation",
        skip_serializing_if = "Option::is_none"
    )]
    pub booking_confirmation: Option<BookingConfirmation>,
    /// Tracking payload persisted by earlier status checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_data: Option<TrackingData>,
}

impl Shipment {
    /// Create a shipment with only an id set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Identifier to show to a person: the shipment number when present, else the id.
    pub fn display_id(&self) -> &str {
        non_empty(&self.shipment_number).unwrap_or(self.id.as_str())
    }

    /// Status lower-cased and trimmed, if any.
    pub fn normalized_status(&self) -> Option<String> {
        non_empty(&self.status).map(|s| s.trim().to_lowercase())
    }
}

/// Rate details. Both `selectedRate` and `selectedRateRef` share this shape,
/// including the historical casing variants of a few fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDetails {
    /// Carrier display name, e.g. "Estes Freight".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    /// Platform id marker (e.g. `ESHIPPLUS`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    /// Source platform name marker (e.g. `eShipPlus`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_reference_number: Option<String>,
    #[serde(
        default,
        rename = "BookingReferenceNumber",
        skip_serializing_if = "Option::is_none"
    )]
    pub booking_reference_number_legacy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(
        default,
        rename = "TrackingNumber",
        skip_serializing_if = "Option::is_none"
    )]
    pub tracking_number_legacy: Option<String>,
    #[serde(default, rename = "Barcode", skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro_number: Option<String>,
}

/// Booking confirmation returned by a carrier integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

/// Tracking payload left behind by a previous status check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_reference_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

/// Borrow an optional string, treating empty and whitespace-only values as absent.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
