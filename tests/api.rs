//! HTTP integration tests
//!
//! Drives the full router with `oneshot` requests against an in-memory store.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use quotation_backend::app::{create_app, AppState};
use quotation_backend::config::Settings;
use quotation_backend::services::QuotationStore;

fn test_app() -> Router {
    let state = AppState::new(Settings::default(), QuotationStore::new(64));
    create_app(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn number(value: &Value) -> f64 {
    value.as_f64().unwrap_or_else(|| panic!("not a number: {}", value))
}

fn assert_close(actual: &Value, expected: f64) {
    let actual = number(actual);
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {} got {}",
        expected,
        actual
    );
}

async fn create_quotation(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/quotations",
        Some(json!({ "title": "Omakotitalo Virtanen", "buildingType": "detached_house" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

// -- Quotations ---------------------------------------------------------------

#[tokio::test]
async fn new_quotation_is_an_empty_draft() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/quotations",
        Some(json!({ "title": "Sauna", "customer": { "name": "Laine" } })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let quotation = &body["data"];
    assert_eq!(quotation["status"], "draft");
    assert_eq!(quotation["revision"], 0);
    assert_eq!(quotation["delivery"]["assemblyLevelId"], "shell");
    assert_eq!(quotation["productSections"].as_array().unwrap().len(), 2);
    assert_eq!(quotation["documents"].as_array().unwrap().len(), 5);
    assert_close(&quotation["pricing"]["totalWithVat"], 0.0);
}

#[tokio::test]
async fn empty_title_is_rejected() {
    let app = test_app();
    let (status, body) = send(&app, Method::POST, "/quotations", Some(json!({ "title": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/quotations")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_quotation_is_not_found() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/quotations/7d1f7a4e-2b7c-4c8e-9d53-2f0a7c1b9e11",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["message"], "Quotation not found");
}

#[tokio::test]
async fn list_is_paginated() {
    let app = test_app();
    for _ in 0..3 {
        create_quotation(&app).await;
    }

    let (status, body) = send(&app, Method::GET, "/quotations?page=2&per_page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total_items"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["has_next"], false);
}

#[tokio::test]
async fn delete_removes_quotation() {
    let app = test_app();
    let id = create_quotation(&app).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/quotations/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/quotations/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Pricing ------------------------------------------------------------------

#[tokio::test]
async fn every_edit_returns_fresh_pricing() {
    let app = test_app();
    let id = create_quotation(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/quotations/{}/element-sections", id),
        Some(json!({ "name": "Ulkoseinät" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let section_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/quotations/{}/element-sections/{}/items", id, section_id),
        Some(json!({ "type": "Ulkoseinäelementti", "quantity": 2, "unitPrice": 5000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["category"], "element");
    assert_eq!(body["revision"], 2);
    assert_close(&body["data"]["totalPrice"], 10000.0);
    assert_close(&body["pricing"]["elementsCost"], 10000.0);
    // Shell level: 10000 * 1.2 - 10000
    assert_close(&body["pricing"]["installationCost"], 2000.0);

    let (_, body) = send(
        &app,
        Method::POST,
        &format!("/quotations/{}/element-sections/{}/items", id, section_id),
        Some(json!({ "type": "Kattoristikko", "quantity": 1, "unitPrice": "3000,00" })),
    )
    .await;
    assert_eq!(body["data"]["category"], "truss");
    assert_close(&body["pricing"]["trussesCost"], 3000.0);
    assert_close(&body["pricing"]["installationCost"], 2600.0);

    let pricing = &body["pricing"];
    let breakdown = pricing["breakdown"].as_object().unwrap();
    assert_eq!(breakdown.len(), 7);
    let selling_sum: f64 = breakdown.values().map(|c| number(&c["sellingPrice"])).sum();
    assert_close(&pricing["sellingPriceExVat"], selling_sum);

    let (_, stored) = send(&app, Method::GET, &format!("/quotations/{}/pricing", id), None).await;
    assert_eq!(stored["data"], body["pricing"]);
}

#[tokio::test]
async fn transportation_and_vat_mode() {
    let app = test_app();
    let id = create_quotation(&app).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/quotations/{}/delivery", id),
        Some(json!({ "transportation": { "distanceKm": 100, "truckCount": 2 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_close(&body["pricing"]["transportationCost"], 880.0);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/quotations/{}/pricing-settings", id),
        Some(json!({ "vatMode": "construction_service" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_close(&body["pricing"]["vatAmount"], 0.0);
    assert_eq!(body["pricing"]["totalWithVat"], body["pricing"]["sellingPriceExVat"]);
}

#[tokio::test]
async fn markup_reset_and_unknown_assembly_level() {
    let app = test_app();
    let id = create_quotation(&app).await;

    let (_, body) = send(
        &app,
        Method::PATCH,
        &format!("/quotations/{}/pricing-settings", id),
        Some(json!({ "categoryMarkups": { "elements": 30 } })),
    )
    .await;
    assert_close(&body["data"]["categoryMarkups"]["elements"], 30.0);

    let (_, body) = send(
        &app,
        Method::PATCH,
        &format!("/quotations/{}/pricing-settings", id),
        Some(json!({ "categoryMarkups": { "elements": null } })),
    )
    .await;
    assert_close(&body["data"]["categoryMarkups"]["elements"], 22.0);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/quotations/{}/delivery", id),
        Some(json!({ "assemblyLevelId": "penthouse" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn fixed_product_sections_cannot_be_removed() {
    let app = test_app();
    let id = create_quotation(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/quotations/{}/product-sections/windows/items", id),
        Some(json!({ "name": "Ikkuna 12x14", "quantity": 4, "unitPrice": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_close(&body["pricing"]["windowsDoorsCost"], 2000.0);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/quotations/{}/product-sections/windows", id),
        None,
    )
    .await;
    assert_ne!(status, StatusCode::OK);
}

// -- Payment schedule ---------------------------------------------------------

#[tokio::test]
async fn template_amounts_follow_explicit_recompute() {
    let app = test_app();
    let id = create_quotation(&app).await;
    let windows = format!("/quotations/{}/product-sections/windows/items", id);

    send(
        &app,
        Method::POST,
        &windows,
        Some(json!({ "name": "Ikkuna", "quantity": 10, "unitPrice": 400 })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/quotations/{}/payment-schedule/template", id),
        Some(json!({ "buildingType": "garage" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let schedule = &body["data"];
    assert_eq!(schedule["milestones"].as_array().unwrap().len(), 3);
    assert_eq!(schedule["isValid"], true);
    assert_eq!(schedule["amountsStale"], false);
    assert_close(&schedule["amountTotal"], number(&body["pricing"]["totalWithVat"]));

    send(
        &app,
        Method::POST,
        &windows,
        Some(json!({ "name": "Ovi", "quantity": 1, "unitPrice": 900 })),
    )
    .await;
    let (_, body) = send(&app, Method::GET, &format!("/quotations/{}/payment-schedule", id), None).await;
    assert_eq!(body["data"]["amountsStale"], true);

    let (_, body) = send(
        &app,
        Method::POST,
        &format!("/quotations/{}/payment-schedule/recompute", id),
        None,
    )
    .await;
    assert_eq!(body["data"]["amountsStale"], false);
    assert_close(&body["data"]["amountTotal"], number(&body["data"]["totalWithVat"]));
}

#[tokio::test]
async fn manual_milestones_report_invalid_total() {
    let app = test_app();
    let id = create_quotation(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/quotations/{}/payment-schedule/milestones", id),
        Some(json!({ "description": "Käsiraha", "percentage": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["order"], 1);

    let (_, body) = send(&app, Method::GET, &format!("/quotations/{}/payment-schedule", id), None).await;
    assert_eq!(body["data"]["isValid"], false);
    assert_close(&body["data"]["percentageTotal"], 30.0);
}

// -- Lifecycle ----------------------------------------------------------------

#[tokio::test]
async fn sending_creates_a_sent_version_and_closing_freezes() {
    let app = test_app();
    let id = create_quotation(&app).await;
    let status_uri = format!("/quotations/{}/status", id);

    let (status, _) = send(&app, Method::POST, &status_uri, Some(json!({ "status": "sent" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    for next in ["awaiting_approval", "approved", "sent"] {
        let (status, body) = send(&app, Method::POST, &status_uri, Some(json!({ "status": next }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], next);
    }

    let (_, body) = send(&app, Method::GET, &format!("/quotations/{}/versions", id), None).await;
    let versions = body["data"].as_array().unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0]["isSent"], true);
    assert_eq!(versions[0]["isActive"], true);

    let (status, _) = send(&app, Method::POST, &status_uri, Some(json!({ "status": "accepted" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/quotations/{}", id),
        Some(json!({ "title": "Muutettu" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn versions_are_numbered() {
    let app = test_app();
    let id = create_quotation(&app).await;
    let uri = format!("/quotations/{}/versions", id);

    let (status, body) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["number"], 1);
    let (_, body) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(body["data"]["number"], 2);

    let (status, body) = send(&app, Method::GET, &format!("{}/1", uri), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);

    let (status, _) = send(&app, Method::GET, &format!("{}/9", uri), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Catalogs and health ------------------------------------------------------

#[tokio::test]
async fn catalogs_are_served() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/assembly-levels", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let (_, body) = send(&app, Method::GET, "/payment-templates", None).await;
    for template in body["data"].as_array().unwrap() {
        assert_close(&template["percentageTotal"], 100.0);
    }
}

#[tokio::test]
async fn health_reports_store_size() {
    let app = test_app();
    create_quotation(&app).await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["quotations"], 1);
}
