//! Cross-origin allow-list.
//!
//! A matching `Origin` is echoed back verbatim. There is no wildcard mode.

use crate::config::CorsConfig;

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
/// Preflight cache lifetime: 24 hours.
pub const MAX_AGE_SECS: u32 = 86_400;

#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(config: &CorsConfig) -> Self {
        Self {
            origins: config.origins.clone(),
        }
    }

    /// Returns the origin to echo in `Access-Control-Allow-Origin`, or
    /// `None` when the request carries no origin or an unlisted one.
    pub fn allowed_origin<'a>(&self, origin: Option<&'a str>) -> Option<&'a str> {
        let origin = origin?;
        self.origins
            .iter()
            .any(|allowed| allowed == origin)
            .then_some(origin)
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}
