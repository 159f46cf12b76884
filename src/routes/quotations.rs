//! Quotation routes
//!
//! Lifecycle of the quotation aggregate: create, list, header edits,
//! pricing inputs, status transitions and versions.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{
    ApiJson, Created, DataResponse, Mutated, NoContent, Paginated, PaginationParams,
};
use crate::app::AppState;
use crate::domain::{
    CreateQuotationRequest, TransitionRequest, UpdateDeliveryRequest, UpdatePricingSettingsRequest,
    UpdateQuotationRequest,
};
use crate::error::ApiError;

/// POST /quotations
///
/// Create a draft quotation.
pub async fn create_quotation(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateQuotationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }

    tracing::info!(title = %req.title, building_type = ?req.building_type, "Creating quotation");

    let quotation = state.store.create(req);
    Ok(Created(quotation))
}

/// GET /quotations
///
/// List quotations, most recently edited first.
pub async fn list_quotations(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> impl IntoResponse {
    let (data, total) = state.store.list(pagination.offset(), pagination.limit());
    Paginated::new(data, &pagination, total as u64)
}

/// GET /quotations/:quotation_id
pub async fn get_quotation(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quotation = state.store.get(quotation_id)?;
    Ok(DataResponse::new(quotation))
}

/// PATCH /quotations/:quotation_id
///
/// Edit title, customer, site address, building type or notes.
pub async fn update_quotation(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateQuotationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.update_header(req))?;
    Ok(DataResponse::new(quotation))
}

/// DELETE /quotations/:quotation_id
pub async fn delete_quotation(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete(quotation_id)?;
    Ok(NoContent)
}

/// GET /quotations/:quotation_id/pricing
pub async fn get_pricing(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quotation = state.store.get(quotation_id)?;
    Ok(DataResponse::new(quotation.pricing))
}

/// PATCH /quotations/:quotation_id/pricing-settings
///
/// Category markups, commission percentage and VAT mode.
pub async fn update_pricing_settings(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdatePricingSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.update_pricing_settings(req))?;
    Ok(Mutated::new(quotation.pricing_settings.clone(), &quotation))
}

/// PATCH /quotations/:quotation_id/delivery
///
/// Assembly level selection and transportation parameters.
pub async fn update_delivery(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateDeliveryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.update_delivery(req))?;
    Ok(Mutated::new(quotation.delivery.clone(), &quotation))
}

/// POST /quotations/:quotation_id/status
///
/// Move the quotation through its lifecycle.
pub async fn transition_status(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<TransitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (previous, quotation) = state.store.update(quotation_id, |q| {
        let previous = q.status;
        q.transition(req.status)?;
        Ok(previous)
    })?;

    tracing::info!(
        quotation_id = %quotation_id,
        from = ?previous,
        to = ?quotation.status,
        "Quotation status changed"
    );
    Ok(DataResponse::new(quotation))
}

/// GET /quotations/:quotation_id/versions
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quotation = state.store.get(quotation_id)?;
    Ok(DataResponse::new(quotation.versions))
}

/// POST /quotations/:quotation_id/versions
///
/// Snapshot the current quotation as a new numbered version.
pub async fn create_version(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (version, _) = state
        .store
        .update(quotation_id, |q| Ok(q.create_version().clone()))?;

    tracing::info!(quotation_id = %quotation_id, number = version.number, "Version created");
    Ok(Created(version))
}

/// GET /quotations/:quotation_id/versions/:number
pub async fn get_version(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, number)): Path<(Uuid, u32)>,
) -> Result<impl IntoResponse, ApiError> {
    let quotation = state.store.get(quotation_id)?;
    let version = quotation
        .version(number)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("Version {} not found", number)))?;
    Ok(DataResponse::new(version))
}
