//! Types produced by the carrier classifier.

use serde::{Deserialize, Serialize};

/// Canonical carrier platform that owns a shipment's status updates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MasterCarrier {
    Eshipplus,
    Canpar,
    PolarisTransportation,
    Unknown,
}

impl MasterCarrier {
    /// Wire name, as the status-check backend expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            MasterCarrier::Eshipplus => "ESHIPPLUS",
            MasterCarrier::Canpar => "CANPAR",
            MasterCarrier::PolarisTransportation => "POLARIS_TRANSPORTATION",
            MasterCarrier::Unknown => "UNKNOWN",
        }
    }

    /// Which identifier the backend expects when tracking this carrier.
    pub fn tracking_identifier(&self) -> TrackingIdentifierKind {
        match self {
            MasterCarrier::Eshipplus => TrackingIdentifierKind::BookingReferenceNumber,
            MasterCarrier::PolarisTransportation => TrackingIdentifierKind::ProNumber,
            MasterCarrier::Canpar | MasterCarrier::Unknown => TrackingIdentifierKind::TrackingNumber,
        }
    }
}

impl std::fmt::Display for MasterCarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field semantics of the tracking value sent to the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TrackingIdentifierKind {
    BookingReferenceNumber,
    TrackingNumber,
    ProNumber,
}

impl TrackingIdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingIdentifierKind::BookingReferenceNumber => "bookingReferenceNumber",
            TrackingIdentifierKind::TrackingNumber => "trackingNumber",
            TrackingIdentifierKind::ProNumber => "proNumber",
        }
    }
}

/// How strongly the master carrier was detected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DetectionConfidence {
    /// No rule matched.
    Fallback,
    /// Matched a keyword in the free-text carrier name.
    Keyword,
    /// Matched an explicit platform marker on a rate object.
    Explicit,
}

/// Carrier identity derived from a shipment. Computed fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarrierInfo {
    pub master_carrier: MasterCarrier,
    /// Best-effort human carrier name; empty when no carrier field is set.
    pub carrier_name: String,
    pub tracking_identifier: TrackingIdentifierKind,
    /// Identifier to look up, `None` when no candidate field is populated.
    pub tracking_value: Option<String>,
    pub is_eshipplus_family: bool,
    pub detection: DetectionConfidence,
    /// JSON path of the field `tracking_value` was read from.
    pub tracking_source: Option<&'static str>,
}

impl CarrierInfo {
    /// Whether a usable tracking value was resolved.
    pub fn has_tracking_value(&self) -> bool {
        self.tracking_value
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }
}
