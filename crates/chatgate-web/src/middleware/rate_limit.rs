use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chatgate_core::RateDecision;

use crate::error::AppError;
use crate::middleware::client_ip;
use crate::state::AppState;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

fn add_quota_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining()));
    headers.insert(RESET_HEADER, HeaderValue::from(decision.reset_at));
}

/// Per-client fixed-window quota for the API router. Every response, denied
/// or not, carries the `X-RateLimit-*` telemetry.
pub async fn rate_limit(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let client = client_ip::resolve(req.headers(), req.extensions(), state.config.trust_proxy);
    let now = state.clock.now_ms();
    let decision = state.limiter.check_and_record(&client, now);

    let mut response = if decision.allowed {
        tracing::debug!(
            client = %client,
            count = decision.count,
            limit = decision.limit,
            "request admitted"
        );
        next.run(req).await
    } else {
        AppError::RateLimited {
            retry_after_secs: decision.retry_after_secs(now),
        }
        .into_response()
    };

    add_quota_headers(response.headers_mut(), &decision);
    response
}
