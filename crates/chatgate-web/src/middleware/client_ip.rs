use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};
use chatgate_core::UNKNOWN_CLIENT;

use crate::state::AppState;

/// The identifier admission control counts a request under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

/// Picks the client address for a request.
///
/// Proxy headers are only consulted when `trust_proxy` is set; otherwise any
/// client could pick its own bucket.
pub fn resolve(headers: &HeaderMap, extensions: &Extensions, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = real_ip {
            return ip.to_string();
        }
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

impl FromRequestParts<AppState> for ClientId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientId(resolve(
            &parts.headers,
            &parts.extensions,
            state.config.trust_proxy,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer(addr: &str) -> Extensions {
        let mut ext = Extensions::new();
        ext.insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        ext
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(k, v) in pairs {
            map.insert(k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn uses_peer_address() {
        let id = resolve(&HeaderMap::new(), &peer("10.0.0.7:51234"), false);
        assert_eq!(id, "10.0.0.7");
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(resolve(&HeaderMap::new(), &Extensions::new(), true), "unknown");
    }

    #[test]
    fn ignores_proxy_headers_unless_trusted() {
        let h = headers(&[("x-forwarded-for", "1.2.3.4")]);
        assert_eq!(resolve(&h, &peer("10.0.0.7:1"), false), "10.0.0.7");
    }

    #[test]
    fn trusted_forwarded_for_takes_first_hop() {
        let h = headers(&[
            ("x-forwarded-for", " 1.2.3.4 , 10.0.0.1"),
            ("x-real-ip", "9.9.9.9"),
        ]);
        assert_eq!(resolve(&h, &peer("10.0.0.7:1"), true), "1.2.3.4");
    }

    #[test]
    fn trusted_real_ip_when_no_forwarded_for() {
        let h = headers(&[("x-real-ip", "9.9.9.9")]);
        assert_eq!(resolve(&h, &Extensions::new(), true), "9.9.9.9");
    }

    #[test]
    fn ipv6_peer() {
        let id = resolve(&HeaderMap::new(), &peer("[::1]:8080"), false);
        assert_eq!(id, "::1");
    }
}
