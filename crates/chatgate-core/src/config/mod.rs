//! Admission-control configuration.
//!
//! The section structs in [`settings`] deserialize from TOML with per-field
//! defaults. [`env`] layers the `RATE_LIMIT_*` and `CORS_ORIGINS` variables
//! on top.

pub mod env;
pub mod settings;

pub use settings::{AdmissionConfig, CorsConfig, LockoutConfig, RateLimitConfig};
