use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chatgate_core::cors::{ALLOW_HEADERS, ALLOW_METHODS, MAX_AGE_SECS};

use crate::state::AppState;

fn add_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(MAX_AGE_SECS));
    headers.append(header::VARY, HeaderValue::from_static("origin"));
}

/// Mounted on the API router only. A listed `Origin` is echoed back; an
/// absent or unlisted one gets no CORS headers and the browser blocks it.
pub async fn cors(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    let allowed = state
        .cors
        .allowed_origin(origin)
        .and_then(|o| HeaderValue::from_str(o).ok());

    let Some(allowed) = allowed else {
        if let Some(origin) = origin {
            tracing::debug!("No CORS headers for unlisted origin {origin}");
        }
        return next.run(req).await;
    };

    // Answer preflights here; routes only register their real methods.
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    add_cors_headers(response.headers_mut(), allowed);
    response
}
