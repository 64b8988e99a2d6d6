//! Carteira API Library
//!
//! Core functionality for the client order portfolio and separation API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod webhooks;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Versioned API surface. Health and metrics live outside the version
/// prefix; see `main.rs` for the full router assembly.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/groups", get(handlers::orders::list_order_groups))
        .route(
            "/orders/groups/export",
            get(handlers::orders::export_order_groups),
        )
        .route("/orders/import", post(handlers::orders::import_orders))
        .route(
            "/separations",
            post(handlers::separations::create_separations)
                .get(handlers::separations::list_separations),
        )
        .route(
            "/separations/:id",
            get(handlers::separations::get_separation),
        )
        .route(
            "/separations/:id/approve",
            post(handlers::separations::approve_separation),
        )
        .route(
            "/separations/:id/reject",
            post(handlers::separations::reject_separation),
        )
        .route(
            "/separations/:id/export",
            get(handlers::separations::export_separation),
        )
        .route("/approvals", get(handlers::approvals::list_approvals))
        .route(
            "/approvals/:separation_id/billing",
            get(handlers::approvals::separation_billing),
        )
        .route(
            "/dashboard/billing",
            get(handlers::dashboard::billing_dashboard),
        )
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/ready", get(handlers::health::readiness))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_response_carries_data_and_metadata() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, Some("ok"));
        assert!(response.meta.is_some());
    }

    #[test]
    fn error_response_has_no_data() {
        let response = ApiResponse::<()>::error("boom".to_string());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("boom"));
    }
}
