//! Admission settings and their defaults.
//!
//! All fields have defaults so the edge works without a config file.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Everything the admission layer needs, grouped by concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub lockout: LockoutConfig,
}

impl AdmissionConfig {
    /// Parses an admission config from TOML text.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    /// - [`CoreError::InvalidConfig`] if a value is out of range.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.rate_limit.validate()?;
        self.cors.validate()?;
        self.lockout.validate()
    }
}

/// Fixed-window quota applied per client identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Run an opportunistic prune every N recorded requests. 0 disables it.
    #[serde(default = "default_sweep_every")]
    pub sweep_every: u64,
    /// How long past `reset_at` an idle entry survives a prune.
    #[serde(default = "default_prune_grace_ms")]
    pub prune_grace_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            sweep_every: default_sweep_every(),
            prune_grace_ms: default_prune_grace_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_requests == 0 {
            return Err(positive("rate_limit.max_requests"));
        }
        if self.window_ms == 0 {
            return Err(positive("rate_limit.window_ms"));
        }
        Ok(())
    }
}

/// Origins allowed to call the API cross-origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub origins: Vec<String>,
}

impl CorsConfig {
    /// Builds the allow-list from a comma-separated string such as the
    /// `CORS_ORIGINS` variable. Blank items are skipped.
    pub fn from_comma_list(list: &str) -> Self {
        Self {
            origins: list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        // Responses echo the matched origin; a wildcard entry would never match.
        if self.origins.iter().any(|o| o == "*") {
            return Err(CoreError::InvalidConfig {
                field: "cors.origins",
                reason: "wildcard origins are not supported, list each origin".to_string(),
            });
        }
        Ok(())
    }
}

/// Failed-login lockout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Failures that trigger a lock. The lock engages on this failure.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    #[serde(default = "default_lock_seconds")]
    pub lock_seconds: u32,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            lock_seconds: default_lock_seconds(),
        }
    }
}

impl LockoutConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_failures == 0 {
            return Err(positive("lockout.max_failures"));
        }
        if self.lock_seconds == 0 {
            return Err(positive("lockout.lock_seconds"));
        }
        Ok(())
    }
}

fn positive(field: &'static str) -> CoreError {
    CoreError::InvalidConfig {
        field,
        reason: "must be greater than zero".to_string(),
    }
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_sweep_every() -> u64 {
    1024
}

fn default_prune_grace_ms() -> u64 {
    60_000
}

fn default_max_failures() -> u32 {
    3
}

fn default_lock_seconds() -> u32 {
    10
}
