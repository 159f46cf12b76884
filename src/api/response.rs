//! Response envelopes
//!
//! Reads answer `{ "data": ... }`. Edits answer `{ "data", "pricing",
//! "revision" }` so a client can replace its totals after every change.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::{PricingResult, Quotation};

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `201 Created` with a data envelope
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(DataResponse::new(self.0))).into_response()
    }
}

/// The changed entity plus the quotation's recomputed pricing.
#[derive(Debug, Serialize)]
pub struct Mutated<T: Serialize> {
    pub data: T,
    pub pricing: PricingResult,
    pub revision: u64,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> Mutated<T> {
    pub fn new(data: T, quotation: &Quotation) -> Self {
        Self {
            data,
            pricing: quotation.pricing.clone(),
            revision: quotation.revision,
            status: StatusCode::OK,
        }
    }

    /// Same body, answered with `201 Created`.
    pub fn created(data: T, quotation: &Quotation) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::new(data, quotation)
        }
    }
}

impl<T: Serialize> IntoResponse for Mutated<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}
