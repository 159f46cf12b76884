//! Payment schedule routes
//!
//! Milestone amounts are cached: applying a template or calling recompute
//! prices them against the current total, plain edits do not.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{ApiJson, DataResponse, Mutated};
use crate::app::AppState;
use crate::domain::payments::{ApplyTemplateRequest, CreateMilestoneRequest, UpdateMilestoneRequest};
use crate::domain::{PaymentScheduleSummary, Quotation};
use crate::error::ApiError;

fn summary(quotation: &Quotation) -> PaymentScheduleSummary {
    PaymentScheduleSummary::new(&quotation.payment_schedule, quotation.pricing.total_with_vat)
}

/// GET /quotations/:quotation_id/payment-schedule
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quotation = state.store.get(quotation_id)?;
    Ok(DataResponse::new(summary(&quotation)))
}

/// POST /quotations/:quotation_id/payment-schedule/template
///
/// Replace the schedule with the template of a building type.
pub async fn apply_template(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<ApplyTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.apply_payment_template(req.building_type))?;

    tracing::info!(
        quotation_id = %quotation_id,
        building_type = ?req.building_type,
        milestones = quotation.payment_schedule.len(),
        "Payment template applied"
    );
    Ok(Mutated::new(summary(&quotation), &quotation))
}

/// POST /quotations/:quotation_id/payment-schedule/recompute
///
/// Re-derive every milestone amount from the current total.
pub async fn recompute(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.recompute_payment_amounts())?;
    Ok(Mutated::new(summary(&quotation), &quotation))
}

/// POST /quotations/:quotation_id/payment-schedule/milestones
pub async fn create_milestone(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateMilestoneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (milestone, quotation) = state
        .store
        .update(quotation_id, |q| q.add_milestone(req))?;
    Ok(Mutated::created(milestone, &quotation))
}

/// PATCH /quotations/:quotation_id/payment-schedule/milestones/:milestone_id
pub async fn update_milestone(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, milestone_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateMilestoneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (milestone, quotation) = state
        .store
        .update(quotation_id, |q| q.update_milestone(milestone_id, req))?;
    Ok(Mutated::new(milestone, &quotation))
}

/// DELETE /quotations/:quotation_id/payment-schedule/milestones/:milestone_id
pub async fn delete_milestone(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, milestone_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.remove_milestone(milestone_id))?;
    Ok(Mutated::new((), &quotation))
}
