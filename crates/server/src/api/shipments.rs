//! Shipment inspection handlers.

use axum::Json;
use serde::Serialize;
use shiptrack_core::{classify, ineligibility_reason, CarrierInfo, Shipment};

/// Classification of one shipment
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub carrier: CarrierInfo,
    pub eligible: bool,
    /// Why the shipment would be skipped, if it would be
    pub ineligible_reason: Option<&'static str>,
}

/// Classify a shipment and report whether it would be refreshed
pub async fn classify_shipment(Json(shipment): Json<Shipment>) -> Json<ClassifyResponse> {
    let reason = ineligibility_reason(&shipment);
    Json(ClassifyResponse {
        carrier: classify(&shipment),
        eligible: reason.is_none(),
        ineligible_reason: reason,
    })
}
