use axum::body::Body;
use axum::http::{header::HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-dns-prefetch-control", "on"),
    (
        "strict-transport-security",
        "max-age=63072000; includeSubDomains; preload",
    ),
    ("x-xss-protection", "1; mode=block"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "origin-when-cross-origin"),
];

fn add_security_headers(response: &mut Response) {
    let headers = response.headers_mut();
    for &(name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Runs on every route, after the handler and any admission layer, so denied
/// and failed responses carry the headers too.
pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    add_security_headers(&mut response);
    response
}
