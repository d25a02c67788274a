//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::{middleware, BoxError, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{customers, health, transactions};
use crate::limit::{self, RateLimiter};
use crate::state::AppState;

/// Window over which `rate_limit_max` requests per client are accepted.
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Create the service router with all routes and middleware.
///
/// Clients are told apart by peer IP, so serve the router with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check (not rate limited)
///
/// ## Customers
/// - `GET /clientes` - List customers
/// - `POST /clientes` - Create customer
/// - `GET /clientes/:id` - Get customer
/// - `PUT /clientes/:id` - Update name and/or email
/// - `DELETE /clientes/:id` - Delete customer and its ledger
///
/// ## Balance
/// - `POST /clientes/:id/depositar` - Deposit
/// - `POST /clientes/:id/sacar` - Withdraw
/// - `GET /clientes/:id/transacoes?page&size` - Transaction history, newest first
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds.max(1));
    let limiter = Arc::new(RateLimiter::new(
        state.config.rate_limit_max,
        RATE_LIMIT_WINDOW,
    ));

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        .route(
            "/clientes",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/clientes/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/clientes/:id/depositar", post(customers::deposit))
        .route("/clientes/:id/sacar", post(customers::withdraw))
        .route(
            "/clientes/:id/transacoes",
            get(transactions::list_transactions),
        )
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(request_timeout),
        )
        .layer(middleware::from_fn_with_state(limiter, limit::enforce))
        .with_state(state);

    Router::new()
        .route("/health", get(health::health))
        .merge(api_routes)
        // Global middleware
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}

/// Render failures raised by the timeout layer.
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(format!("unhandled middleware error: {err}"))
    }
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
