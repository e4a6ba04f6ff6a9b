//! chatgate core library: admission control for the chat API edge.
//!
//! Nothing here knows about HTTP. The web crate feeds client identifiers and
//! timestamps in and turns the decisions into responses.
//!
//! # Modules
//!
//! - [`rate_limit`]: Fixed-window per-client request counter ([`RateLimiter`]).
//! - [`lockout`]: Failed-login state machine ([`LockoutGuard`]) and its countdown driver.
//! - [`throttle`]: Server-side per-account lockout ([`LoginThrottle`]).
//! - [`cors`]: Origin allow-list ([`CorsPolicy`]).
//! - [`config`]: TOML settings and environment overrides.
//! - [`clock`]: Epoch-millisecond clock, with a manual clock for tests.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod clock;
pub mod config;
pub mod cors;
pub mod error;
pub mod lockout;
pub mod rate_limit;
pub mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AdmissionConfig, CorsConfig, LockoutConfig, RateLimitConfig};
pub use cors::CorsPolicy;
pub use error::{CoreError, CoreResult};
pub use lockout::{run_countdown, CountdownEnd, FailureOutcome, LockoutGuard, LockoutState};
pub use rate_limit::{RateDecision, RateLimitEntry, RateLimiter, UNKNOWN_CLIENT};
pub use throttle::{LoginCheck, LoginThrottle};
