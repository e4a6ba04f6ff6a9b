mod auth_handlers;


use axum::extract::State;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::dto::HealthResponse;
use crate::error::AppError;
use crate::middleware;
use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/signup", post(auth_handlers::signup))
        .fallback(api_not_found)
}

/// The full application.
///
/// Layer order, outermost first: tracing, security headers, body limit on
/// every route, then CORS and the rate limiter on `/api` only. CORS sits
/// outside the limiter so 429 responses stay readable cross-origin. Unknown
/// `/api` paths hit the API fallback and are counted like any other call.
pub fn app(state: AppState) -> Router {
    let api = api_router()
        .layer(from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit,
        ))
        .layer(from_fn_with_state(state.clone(), middleware::cors::cors));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_bytes))
        .layer(from_fn(middleware::security_headers::security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        tracked_clients: state.limiter.len(),
    })
}

async fn api_not_found() -> AppError {
    AppError::NotFound
}
