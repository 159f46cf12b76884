pub mod catalog;
pub mod health;
pub mod line_items;
pub mod payments;
pub mod quotations;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Static catalogs
        .route("/assembly-levels", get(catalog::list_assembly_levels))
        .route("/payment-templates", get(catalog::list_payment_templates))
        // Quotations
        .route(
            "/quotations",
            post(quotations::create_quotation).get(quotations::list_quotations),
        )
        .route(
            "/quotations/:quotation_id",
            get(quotations::get_quotation)
                .patch(quotations::update_quotation)
                .delete(quotations::delete_quotation),
        )
        .route("/quotations/:quotation_id/pricing", get(quotations::get_pricing))
        .route(
            "/quotations/:quotation_id/pricing-settings",
            patch(quotations::update_pricing_settings),
        )
        .route(
            "/quotations/:quotation_id/delivery",
            patch(quotations::update_delivery),
        )
        .route(
            "/quotations/:quotation_id/status",
            post(quotations::transition_status),
        )
        .route(
            "/quotations/:quotation_id/versions",
            get(quotations::list_versions).post(quotations::create_version),
        )
        .route(
            "/quotations/:quotation_id/versions/:number",
            get(quotations::get_version),
        )
        // Element sections
        .route(
            "/quotations/:quotation_id/element-sections",
            post(line_items::create_element_section),
        )
        .route(
            "/quotations/:quotation_id/element-sections/:section_id",
            delete(line_items::delete_element_section),
        )
        .route(
            "/quotations/:quotation_id/element-sections/:section_id/items",
            post(line_items::create_element_item),
        )
        .route(
            "/quotations/:quotation_id/element-sections/:section_id/items/:item_id",
            patch(line_items::update_element_item).delete(line_items::delete_element_item),
        )
        // Product sections (windows, doors, worksite deliveries)
        .route(
            "/quotations/:quotation_id/product-sections",
            post(line_items::create_product_section),
        )
        .route(
            "/quotations/:quotation_id/product-sections/:section_id",
            delete(line_items::delete_product_section),
        )
        .route(
            "/quotations/:quotation_id/product-sections/:section_id/items",
            post(line_items::create_product_item),
        )
        .route(
            "/quotations/:quotation_id/product-sections/:section_id/items/:item_id",
            patch(line_items::update_product_item).delete(line_items::delete_product_item),
        )
        // Design documents
        .route(
            "/quotations/:quotation_id/documents",
            post(line_items::create_document),
        )
        .route(
            "/quotations/:quotation_id/documents/:document_id",
            patch(line_items::update_document).delete(line_items::delete_document),
        )
        // Custom installation
        .route(
            "/quotations/:quotation_id/installation-items",
            post(line_items::create_installation_item),
        )
        .route(
            "/quotations/:quotation_id/installation-items/:item_id",
            delete(line_items::delete_installation_item),
        )
        // Payment schedule
        .route(
            "/quotations/:quotation_id/payment-schedule",
            get(payments::get_schedule),
        )
        .route(
            "/quotations/:quotation_id/payment-schedule/template",
            post(payments::apply_template),
        )
        .route(
            "/quotations/:quotation_id/payment-schedule/recompute",
            post(payments::recompute),
        )
        .route(
            "/quotations/:quotation_id/payment-schedule/milestones",
            post(payments::create_milestone),
        )
        .route(
            "/quotations/:quotation_id/payment-schedule/milestones/:milestone_id",
            patch(payments::update_milestone).delete(payments::delete_milestone),
        )
}
