//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, health, transactions};
use crate::state::AppState;

/// Maximum concurrent requests for the API route group.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/accounts` / `GET /v1/accounts/:id` - Account reads
/// - `GET /v1/transactions` / `GET /v1/transactions/:id` - Transfer reads
///
/// ## Authenticated (bearer JWT)
/// - `POST /v1/accounts` - Create account
/// - `PUT /v1/accounts/:id` - Update account (owner only)
/// - `DELETE /v1/accounts/:id` - Delete account (owner only)
/// - `POST /v1/transactions` - Create transfer (source owner only)
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Create concurrency-limited API routes
    let api_routes = Router::new()
        // Accounts
        .route("/accounts", post(accounts::create_account))
        .route("/accounts", get(accounts::list_accounts))
        .route("/accounts/:id", get(accounts::get_account))
        .route("/accounts/:id", put(accounts::update_account))
        .route("/accounts/:id", delete(accounts::delete_account))
        // Transactions
        .route("/transactions", post(transactions::create_transaction))
        .route("/transactions", get(transactions::list_transactions))
        .route("/transactions/:id", get(transactions::get_transaction))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
