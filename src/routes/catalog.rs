//! Static catalog routes

use axum::response::IntoResponse;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::api::DataResponse;
use crate::domain::assembly;
use crate::domain::payments::{self, BuildingType, MilestoneTemplate};

/// GET /assembly-levels
pub async fn list_assembly_levels() -> impl IntoResponse {
    DataResponse::new(assembly::catalog())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTemplate {
    pub building_type: BuildingType,
    pub milestones: &'static [MilestoneTemplate],
    pub percentage_total: Decimal,
}

/// GET /payment-templates
pub async fn list_payment_templates() -> impl IntoResponse {
    let templates: Vec<PaymentTemplate> = BuildingType::ALL
        .into_iter()
        .map(|building_type| {
            let milestones = payments::template(building_type);
            PaymentTemplate {
                building_type,
                milestones,
                percentage_total: milestones.iter().map(|m| m.percentage).sum(),
            }
        })
        .collect();
    DataResponse::new(templates)
}
