//! Carrier classification.
//!
//! Upstream data is inconsistent, so detection combines several weak signals:
//! an ordered table of rules is evaluated and the first positive match wins.
//! Tracking values are then read through a per-carrier fallback chain of
//! candidate fields, each chain reflecting a different historical data shape.

use crate::shipment::{non_empty, RateDetails, Shipment};

use super::types::{CarrierInfo, DetectionConfidence, MasterCarrier};

/// Platform id marker written by the eShipPlus integration.
pub const ESHIPPLUS_PLATFORM_ID: &str = "ESHIPPLUS";

/// Source platform name marker written by the eShipPlus integration.
pub const ESHIPPLUS_SOURCE_PLATFORM: &str = "eShipPlus";

/// Carrier-name keywords routed through eShipPlus. Matched as substrings, so
/// generic words like `freight` or `ltl` favour recall over precision.
pub const ESHIPPLUS_KEYWORDS: &[&str] = &[
    "freight",
    "fedex freight",
    "road runner",
    "estes",
    "yrc",
    "xpo",
    "old dominion",
    "saia",
    "ltl",
    "eshipplus",
];

const CANPAR_KEYWORDS: &[&str] = &["canpar"];
const POLARIS_KEYWORDS: &[&str] = &["polaris"];

/// A single detection signal.
#[derive(Debug, Clone, Copy)]
enum Signal {
    /// `platformId` on either rate object equals the sentinel.
    PlatformId(&'static str),
    /// `sourcePlatform` on either rate object equals the sentinel.
    SourcePlatform(&'static str),
    /// Carrier name contains any of the keywords (case-insensitive).
    CarrierKeywords(&'static [&'static str]),
}

impl Signal {
    fn matches(&self, shipment: &Shipment, carrier_name_lower: &str) -> bool {
        match self {
            Signal::PlatformId(sentinel) => rate_objects(shipment)
                .any(|rate| sentinel_eq(&rate.platform_id, sentinel)),
            Signal::SourcePlatform(sentinel) => rate_objects(shipment)
                .any(|rate| sentinel_eq(&rate.source_platform, sentinel)),
            Signal::CarrierKeywords(keywords) => {
                !carrier_name_lower.is_empty()
                    && keywords.iter().any(|k| carrier_name_lower.contains(k))
            }
        }
    }

    fn confidence(&self) -> DetectionConfidence {
        match self {
            Signal::PlatformId(_) | Signal::SourcePlatform(_) => DetectionConfidence::Explicit,
            Signal::CarrierKeywords(_) => DetectionConfidence::Keyword,
        }
    }
}

struct DetectionRule {
    carrier: MasterCarrier,
    signal: Signal,
}

/// Evaluated in order; the first matching rule decides the master carrier.
/// eShipPlus rows come first, so "Canpar Freight" routes through eShipPlus.
const DETECTION_RULES: &[DetectionRule] = &[
    DetectionRule {
        carrier: MasterCarrier::Eshipplus,
        signal: Signal::PlatformId(ESHIPPLUS_PLATFORM_ID),
    },
    DetectionRule {
        carrier: MasterCarrier::Eshipplus,
        signal: Signal::SourcePlatform(ESHIPPLUS_SOURCE_PLATFORM),
    },
    DetectionRule {
        carrier: MasterCarrier::Eshipplus,
        signal: Signal::CarrierKeywords(ESHIPPLUS_KEYWORDS),
    },
    DetectionRule {
        carrier: MasterCarrier::Canpar,
        signal: Signal::CarrierKeywords(CANPAR_KEYWORDS),
    },
    DetectionRule {
        carrier: MasterCarrier::PolarisTransportation,
        signal: Signal::CarrierKeywords(POLARIS_KEYWORDS),
    },
];

/// A candidate field that may hold a tracking value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingField {
    TrackingNumber,
    SelectedRateBookingReference,
    SelectedRateBookingReferenceLegacy,
    SelectedRateTrackingNumber,
    SelectedRateTrackingNumberLegacy,
    SelectedRateBarcode,
    SelectedRateProNumber,
    RateRefBookingReference,
    RateRefBookingReferenceLegacy,
    RateRefTrackingNumber,
    RateRefTrackingNumberLegacy,
    RateRefBarcode,
    RateRefProNumber,
    TrackingDataBookingReference,
    ConfirmationBookingReference,
    ConfirmationNumber,
    ConfirmationProNumber,
    ConfirmationTrackingNumber,
    ConfirmationBarcode,
}

impl TrackingField {
    /// Read this field from a shipment. Empty values count as absent.
    pub fn value<'a>(&self, shipment: &'a Shipment) -> Option<&'a str> {
        let rate = shipment.selected_rate.as_ref();
        let rate_ref = shipment.selected_rate_ref.as_ref();
        let confirmation = shipment.booking_confirmation.as_ref();

        match self {
            TrackingField::TrackingNumber => non_empty(&shipment.tracking_number),
            TrackingField::SelectedRateBookingReference => {
                rate.and_then(|r| non_empty(&r.booking_reference_number))
            }
            TrackingField::SelectedRateBookingReferenceLegacy => {
                rate.and_then(|r| non_empty(&r.booking_reference_number_legacy))
            }
            TrackingField::SelectedRateTrackingNumber => {
                rate.and_then(|r| non_empty(&r.tracking_number))
            }
            TrackingField::SelectedRateTrackingNumberLegacy => {
                rate.and_then(|r| non_empty(&r.tracking_number_legacy))
            }
            TrackingField::SelectedRateBarcode => rate.and_then(|r| non_empty(&r.barcode)),
            TrackingField::SelectedRateProNumber => rate.and_then(|r| non_empty(&r.pro_number)),
            TrackingField::RateRefBookingReference => {
                rate_ref.and_then(|r| non_empty(&r.booking_reference_number))
            }
            TrackingField::RateRefBookingReferenceLegacy => {
                rate_ref.and_then(|r| non_empty(&r.booking_reference_number_legacy))
            }
            TrackingField::RateRefTrackingNumber => {
                rate_ref.and_then(|r| non_empty(&r.tracking_number))
            }
            TrackingField::RateRefTrackingNumberLegacy => {
                rate_ref.and_then(|r| non_empty(&r.tracking_number_legacy))
            }
            TrackingField::RateRefBarcode => rate_ref.and_then(|r| non_empty(&r.barcode)),
            TrackingField::RateRefProNumber => rate_ref.and_then(|r| non_empty(&r.pro_number)),
            TrackingField::TrackingDataBookingReference => shipment
                .tracking_data
                .as_ref()
                .and_then(|t| non_empty(&t.booking_reference_number)),
            TrackingField::ConfirmationBookingReference => {
                confirmation.and_then(|c| non_empty(&c.booking_reference))
            }
            TrackingField::ConfirmationNumber => {
                confirmation.and_then(|c| non_empty(&c.confirmation_number))
            }
            TrackingField::ConfirmationProNumber => {
                confirmation.and_then(|c| non_empty(&c.pro_number))
            }
            TrackingField::ConfirmationTrackingNumber => {
                confirmation.and_then(|c| non_empty(&c.tracking_number))
            }
            TrackingField::ConfirmationBarcode => confirmation.and_then(|c| non_empty(&c.barcode)),
        }
    }

    /// JSON path of the field in the backend document.
    pub fn path(&self) -> &'static str {
        match self {
            TrackingField::TrackingNumber => "trackingNumber",
            TrackingField::SelectedRateBookingReference => "selectedRate.bookingReferenceNumber",
            TrackingField::SelectedRateBookingReferenceLegacy => {
                "selectedRate.BookingReferenceNumber"
            }
            TrackingField::SelectedRateTrackingNumber => "selectedRate.trackingNumber",
            TrackingField::SelectedRateTrackingNumberLegacy => "selectedRate.TrackingNumber",
            TrackingField::SelectedRateBarcode => "selectedRate.Barcode",
            TrackingField::SelectedRateProNumber => "selectedRate.proNumber",
            TrackingField::RateRefBookingReference => "selectedRateRef.bookingReferenceNumber",
            TrackingField::RateRefBookingReferenceLegacy => {
                "selectedRateRef.BookingReferenceNumber"
            }
            TrackingField::RateRefTrackingNumber => "selectedRateRef.trackingNumber",
            TrackingField::RateRefTrackingNumberLegacy => "selectedRateRef.TrackingNumber",
            TrackingField::RateRefBarcode => "selectedRateRef.Barcode",
            TrackingField::RateRefProNumber => "selectedRateRef.proNumber",
            TrackingField::TrackingDataBookingReference => "trackingData.bookingReferenceNumber",
            TrackingField::ConfirmationBookingReference => {
                "carrierBookingConfirmation.bookingReference"
            }
            TrackingField::ConfirmationNumber => "carrierBookingConfirmation.confirmationNumber",
            TrackingField::ConfirmationProNumber => "carrierBookingConfirmation.proNumber",
            TrackingField::ConfirmationTrackingNumber => "carrierBookingConfirmation.trackingNumber",
            TrackingField::ConfirmationBarcode => "carrierBookingConfirmation.barcode",
        }
    }
}

const ESHIPPLUS_CHAIN: &[TrackingField] = &[
    TrackingField::SelectedRateBookingReference,
    TrackingField::SelectedRateBookingReferenceLegacy,
    TrackingField::RateRefBookingReference,
    TrackingField::RateRefBookingReferenceLegacy,
    TrackingField::TrackingDataBookingReference,
    TrackingField::ConfirmationBookingReference,
    TrackingField::ConfirmationNumber,
    TrackingField::ConfirmationProNumber,
    TrackingField::TrackingNumber,
];

const CANPAR_CHAIN: &[TrackingField] = &[
    TrackingField::TrackingNumber,
    TrackingField::SelectedRateTrackingNumberLegacy,
    TrackingField::SelectedRateBarcode,
    TrackingField::RateRefTrackingNumberLegacy,
    TrackingField::RateRefBarcode,
    TrackingField::ConfirmationTrackingNumber,
    TrackingField::ConfirmationBarcode,
];

const POLARIS_CHAIN: &[TrackingField] = &[
    TrackingField::ConfirmationProNumber,
    TrackingField::ConfirmationNumber,
    TrackingField::TrackingNumber,
    TrackingField::SelectedRateProNumber,
    TrackingField::RateRefProNumber,
];

const GENERIC_CHAIN: &[TrackingField] = &[
    TrackingField::TrackingNumber,
    TrackingField::ConfirmationTrackingNumber,
    TrackingField::ConfirmationProNumber,
    TrackingField::SelectedRateTrackingNumber,
    TrackingField::RateRefTrackingNumber,
];

/// Ordered candidate fields for a carrier's tracking value.
pub fn tracking_chain(carrier: MasterCarrier) -> &'static [TrackingField] {
    match carrier {
        MasterCarrier::Eshipplus => ESHIPPLUS_CHAIN,
        MasterCarrier::Canpar => CANPAR_CHAIN,
        MasterCarrier::PolarisTransportation => POLARIS_CHAIN,
        MasterCarrier::Unknown => GENERIC_CHAIN,
    }
}

/// Classify a shipment. Pure: no I/O, never fails.
pub fn classify(shipment: &Shipment) -> CarrierInfo {
    let carrier_name = carrier_name(shipment).to_string();
    let (master_carrier, detection) = detect(shipment, &carrier_name.to_lowercase());

    let resolved = tracking_chain(master_carrier)
        .iter()
        .find_map(|field| field.value(shipment).map(|value| (value, field.path())));

    CarrierInfo {
        master_carrier,
        carrier_name,
        tracking_identifier: master_carrier.tracking_identifier(),
        tracking_value: resolved.map(|(value, _)| value.to_string()),
        is_eshipplus_family: master_carrier == MasterCarrier::Eshipplus,
        detection,
        tracking_source: resolved.map(|(_, path)| path),
    }
}

/// Best-effort carrier name: selected rate, then legacy rate reference, then top level.
pub fn carrier_name(shipment: &Shipment) -> &str {
    shipment
        .selected_rate
        .as_ref()
        .and_then(|r| non_empty(&r.carrier))
        .or_else(|| {
            shipment
                .selected_rate_ref
                .as_ref()
                .and_then(|r| non_empty(&r.carrier))
        })
        .or_else(|| non_empty(&shipment.carrier))
        .unwrap_or("")
}

fn detect(shipment: &Shipment, carrier_name_lower: &str) -> (MasterCarrier, DetectionConfidence) {
    DETECTION_RULES
        .iter()
        .find(|rule| rule.signal.matches(shipment, carrier_name_lower))
        .map(|rule| (rule.carrier, rule.signal.confidence()))
        .unwrap_or((MasterCarrier::Unknown, DetectionConfidence::Fallback))
}

fn rate_objects(shipment: &Shipment) -> impl Iterator<Item = &RateDetails> {
    shipment
        .selected_rate
        .iter()
        .chain(shipment.selected_rate_ref.iter())
}

fn sentinel_eq(value: &Option<String>, sentinel: &str) -> bool {
    non_empty(value).is_some_and(|v| v.trim().eq_ignore_ascii_case(sentinel))
}
