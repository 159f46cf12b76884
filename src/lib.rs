//! Construction quotation backend
//!
//! Pricing engine, quotation store and HTTP API for prefabricated
//! building quotations.

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;
