use std::sync::Arc;

use chatgate_core::{Clock, CorsPolicy, LoginThrottle, RateLimiter};

use crate::auth::users::UserRepository;
use crate::config::ServerConfig;

/// Shared per-server state. Every admission component is owned here rather
/// than living in a global, so each test gets a fresh set.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub limiter: Arc<RateLimiter>,
    pub login_throttle: Arc<LoginThrottle>,
    pub cors: Arc<CorsPolicy>,
    pub users: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let admission = &config.admission;
        Self {
            limiter: Arc::new(RateLimiter::new(&admission.rate_limit)),
            login_throttle: Arc::new(LoginThrottle::new(admission.lockout)),
            cors: Arc::new(CorsPolicy::new(&admission.cors)),
            config: Arc::new(config),
            users,
            clock,
        }
    }

    /// One maintenance pass over the in-memory counters.
    pub fn prune(&self) {
        let now = self.clock.now_ms();
        let limits = self.limiter.prune(now);
        let logins = self.login_throttle.prune(now, self.config.login_idle_ms);
        tracing::debug!(
            limits,
            logins,
            tracked_clients = self.limiter.len(),
            "maintenance pass complete"
        );
    }
}
