//! HTTP API Layer
//!
//! This crate exposes the invoicing user API over REST using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Invoice and health request handlers
//! - **Middleware**: Authentication and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(InvoiceUserApi::new(dao.clone()), dao, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use core_kernel::HealthCheckable;
use domain_invoice::InvoiceUserApi;

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{health, invoice};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_api: InvoiceUserApi,
    /// Probed by the readiness endpoint
    pub health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(user_api: InvoiceUserApi, health: Arc<dyn HealthCheckable>, config: ApiConfig) -> Self {
        Self { user_api, health, config }
    }
}

/// Creates the main API router
///
/// Health endpoints are public; everything under `/api/v1` requires a
/// bearer token.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let invoice_routes = Router::new()
        .route("/", post(invoice::create_invoice))
        .route("/due", get(invoice::list_due_invoices))
        .route("/:id", get(invoice::get_invoice))
        .route("/:id/payments/success", post(invoice::record_payment_success))
        .route("/:id/payments/failure", post(invoice::record_payment_failure));

    let account_routes = Router::new()
        .route("/:id/invoices", get(invoice::list_account_invoices))
        .route("/:id/invoice-items", get(invoice::list_account_invoice_items));

    let subscription_routes = Router::new()
        .route("/:id/invoices", get(invoice::list_subscription_invoices));

    let api_routes = Router::new()
        .nest("/invoices", invoice_routes)
        .nest("/accounts", account_routes)
        .nest("/subscriptions", subscription_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
