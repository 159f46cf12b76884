//! Line item routes
//!
//! Element and product sections, their items, design documents and custom
//! installation scope. Every response carries the recomputed pricing.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{ApiJson, Mutated};
use crate::app::AppState;
use crate::domain::{
    CreateDocumentRequest, CreateElementItemRequest, CreateInstallationItemRequest,
    CreateProductItemRequest, CreateSectionRequest, UpdateDocumentRequest,
    UpdateElementItemRequest, UpdateProductItemRequest,
};
use crate::error::ApiError;

fn section_name(req: CreateSectionRequest) -> Result<String, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Section name is required"));
    }
    Ok(name)
}

// ---- element sections ----

/// POST /quotations/:quotation_id/element-sections
pub async fn create_element_section(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateSectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = section_name(req)?;
    let (section, quotation) = state
        .store
        .update(quotation_id, |q| q.add_element_section(name))?;
    Ok(Mutated::created(section, &quotation))
}

/// DELETE /quotations/:quotation_id/element-sections/:section_id
pub async fn delete_element_section(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, section_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.remove_element_section(section_id))?;
    Ok(Mutated::new((), &quotation))
}

/// POST /quotations/:quotation_id/element-sections/:section_id/items
///
/// The item's element/truss tag is fixed here, inferred from its type when
/// the client does not send one.
pub async fn create_element_item(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, section_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<CreateElementItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (item, quotation) = state
        .store
        .update(quotation_id, |q| q.add_element_item(section_id, req))?;
    Ok(Mutated::created(item, &quotation))
}

/// PATCH /quotations/:quotation_id/element-sections/:section_id/items/:item_id
pub async fn update_element_item(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, section_id, item_id)): Path<(Uuid, Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateElementItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (item, quotation) = state
        .store
        .update(quotation_id, |q| q.update_element_item(section_id, item_id, req))?;
    Ok(Mutated::new(item, &quotation))
}

/// DELETE /quotations/:quotation_id/element-sections/:section_id/items/:item_id
pub async fn delete_element_item(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, section_id, item_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.remove_element_item(section_id, item_id))?;
    Ok(Mutated::new((), &quotation))
}

// ---- product sections ----

/// POST /quotations/:quotation_id/product-sections
///
/// Adds a worksite delivery section; windows and doors always exist.
pub async fn create_product_section(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateSectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = section_name(req)?;
    let (section, quotation) = state
        .store
        .update(quotation_id, |q| q.add_product_section(name))?;
    Ok(Mutated::created(section, &quotation))
}

/// DELETE /quotations/:quotation_id/product-sections/:section_id
pub async fn delete_product_section(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, section_id)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.remove_product_section(&section_id))?;
    Ok(Mutated::new((), &quotation))
}

/// POST /quotations/:quotation_id/product-sections/:section_id/items
pub async fn create_product_item(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, section_id)): Path<(Uuid, String)>,
    ApiJson(req): ApiJson<CreateProductItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (item, quotation) = state
        .store
        .update(quotation_id, |q| q.add_product_item(&section_id, req))?;
    Ok(Mutated::created(item, &quotation))
}

/// PATCH /quotations/:quotation_id/product-sections/:section_id/items/:item_id
pub async fn update_product_item(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, section_id, item_id)): Path<(Uuid, String, Uuid)>,
    ApiJson(req): ApiJson<UpdateProductItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (item, quotation) = state
        .store
        .update(quotation_id, |q| q.update_product_item(&section_id, item_id, req))?;
    Ok(Mutated::new(item, &quotation))
}

/// DELETE /quotations/:quotation_id/product-sections/:section_id/items/:item_id
pub async fn delete_product_item(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, section_id, item_id)): Path<(Uuid, String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.remove_product_item(&section_id, item_id))?;
    Ok(Mutated::new((), &quotation))
}

// ---- documents ----

/// POST /quotations/:quotation_id/documents
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (document, quotation) = state
        .store
        .update(quotation_id, |q| q.add_document(req))?;
    Ok(Mutated::created(document, &quotation))
}

/// PATCH /quotations/:quotation_id/documents/:document_id
///
/// Toggle inclusion or change the price of a design document.
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, document_id)): Path<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (document, quotation) = state
        .store
        .update(quotation_id, |q| q.update_document(document_id, req))?;
    Ok(Mutated::new(document, &quotation))
}

/// DELETE /quotations/:quotation_id/documents/:document_id
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, document_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.remove_document(document_id))?;
    Ok(Mutated::new((), &quotation))
}

// ---- custom installation ----

/// POST /quotations/:quotation_id/installation-items
pub async fn create_installation_item(
    State(state): State<Arc<AppState>>,
    Path(quotation_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateInstallationItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (item, quotation) = state
        .store
        .update(quotation_id, |q| q.add_installation_item(req))?;
    Ok(Mutated::created(item, &quotation))
}

/// DELETE /quotations/:quotation_id/installation-items/:item_id
pub async fn delete_installation_item(
    State(state): State<Arc<AppState>>,
    Path((quotation_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, quotation) = state
        .store
        .update(quotation_id, |q| q.remove_installation_item(item_id))?;
    Ok(Mutated::new((), &quotation))
}
