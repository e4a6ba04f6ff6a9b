//! Environment overrides for the admission settings.
//!
//! Lookups go through a closure so callers can pass `std::env::var` in
//! production and a map in tests.

use std::str::FromStr;

use super::settings::{AdmissionConfig, CorsConfig};

pub const RATE_LIMIT_MAX: &str = "RATE_LIMIT_MAX";
pub const RATE_LIMIT_WINDOW_MS: &str = "RATE_LIMIT_WINDOW_MS";
pub const CORS_ORIGINS: &str = "CORS_ORIGINS";

impl AdmissionConfig {
    /// Applies `RATE_LIMIT_MAX`, `RATE_LIMIT_WINDOW_MS` and `CORS_ORIGINS`.
    ///
    /// Numeric values that fail to parse or are zero are ignored with a
    /// warning; the previous value stays in effect.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(max) = positive_var::<u32, _>(&lookup, RATE_LIMIT_MAX) {
            self.rate_limit.max_requests = max;
        }
        if let Some(window) = positive_var::<u64, _>(&lookup, RATE_LIMIT_WINDOW_MS) {
            self.rate_limit.window_ms = window;
        }
        if let Some(origins) = lookup(CORS_ORIGINS) {
            self.cors = CorsConfig::from_comma_list(&origins);
        }
    }
}

fn positive_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr + PartialEq + Default,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(v) if v != T::default() => Some(v),
        _ => {
            tracing::warn!("Ignoring {name}={raw:?}: expected a positive integer");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_apply() {
        let mut config = AdmissionConfig::default();
        config.apply_env(env(&[
            ("RATE_LIMIT_MAX", "3"),
            ("RATE_LIMIT_WINDOW_MS", "1000"),
            ("CORS_ORIGINS", "https://app.example.com,https://other.com"),
        ]));

        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window_ms, 1000);
        assert_eq!(
            config.cors.origins,
            vec!["https://app.example.com", "https://other.com"]
        );
    }

    #[test]
    fn missing_vars_leave_config_untouched() {
        let mut config = AdmissionConfig::default();
        config.apply_env(env(&[]));
        assert_eq!(config, AdmissionConfig::default());
    }

    #[test]
    fn garbage_and_zero_are_ignored() {
        let mut config = AdmissionConfig::default();
        config.apply_env(env(&[
            ("RATE_LIMIT_MAX", "lots"),
            ("RATE_LIMIT_WINDOW_MS", "0"),
        ]));
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_ms, 60_000);
    }

    #[test]
    fn negative_max_is_ignored() {
        let mut config = AdmissionConfig::default();
        config.apply_env(env(&[("RATE_LIMIT_MAX", "-5")]));
        assert_eq!(config.rate_limit.max_requests, 100);
    }

    #[test]
    fn empty_cors_var_clears_list() {
        let mut config = AdmissionConfig::default();
        config.cors.origins = vec!["https://a.com".to_string()];
        config.apply_env(env(&[("CORS_ORIGINS", "")]));
        assert!(config.cors.origins.is_empty());
    }
}
