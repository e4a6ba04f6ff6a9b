//! Fixed-window request counter keyed by client identifier.
//!
//! Each identifier owns one [`RateLimitEntry`]. A request either opens a
//! fresh window, spends one unit of the current window, or is denied once
//! the window is spent. Denials never consume quota.
//!
//! Windows reset on the first request at or after `reset_at`, so a client
//! can burst up to twice the quota across a window boundary.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Identifier used when the caller cannot name the client.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Counter state for one client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Requests admitted in the current window.
    pub count: u32,
    /// Epoch milliseconds at which the current window expires.
    pub reset_at: u64,
}

/// The outcome of [`RateLimiter::check_and_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub count: u32,
    pub limit: u32,
    pub reset_at: u64,
}

impl RateDecision {
    /// Requests left in the current window.
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }

    /// Whole seconds until the window resets, rounded up.
    pub fn retry_after_secs(&self, now: u64) -> u64 {
        self.reset_at.saturating_sub(now).div_ceil(1000)
    }
}

/// Process-wide admission counter. Owned by the caller and shared via `Arc`.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    max_requests: u32,
    window_ms: u64,
    sweep_every: u64,
    prune_grace_ms: u64,
    calls: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests: config.max_requests,
            window_ms: config.window_ms,
            sweep_every: config.sweep_every,
            prune_grace_ms: config.prune_grace_ms,
            calls: AtomicU64::new(0),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Admits or denies one request from `id` observed at `now` (epoch ms).
    ///
    /// A blank `id` is counted under [`UNKNOWN_CLIENT`]. The read-modify-write
    /// happens under the map shard's write lock, so concurrent requests from
    /// the same identifier never admit more than `max_requests` per window.
    pub fn check_and_record(&self, id: &str, now: u64) -> RateDecision {
        let id = normalize_id(id);

        let decision = {
            // A fresh entry has `reset_at == 0`, so it takes the reset branch.
            let mut entry = self
                .entries
                .entry(id.to_string())
                .or_insert(RateLimitEntry {
                    count: 0,
                    reset_at: 0,
                });

            let allowed = if entry.reset_at <= now {
                entry.count = 1;
                entry.reset_at = now.saturating_add(self.window_ms);
                true
            } else if entry.count < self.max_requests {
                entry.count += 1;
                true
            } else {
                false
            };

            RateDecision {
                allowed,
                count: entry.count,
                limit: self.max_requests,
                reset_at: entry.reset_at,
            }
        };

        if !decision.allowed {
            tracing::warn!(
                client = id,
                limit = self.max_requests,
                reset_at = decision.reset_at,
                "rate limit exceeded"
            );
        }

        self.maybe_sweep(now);
        decision
    }

    /// Current entry for `id`, if any. Does not record a request.
    pub fn peek(&self, id: &str) -> Option<RateLimitEntry> {
        self.entries.get(normalize_id(id)).map(|e| *e)
    }

    /// Drops entries whose window ended more than the prune grace ago.
    /// Returns how many were removed.
    pub fn prune(&self, now: u64) -> usize {
        let before = self.entries.len();
        let grace = self.prune_grace_ms;
        self.entries
            .retain(|_, entry| entry.reset_at.saturating_add(grace) > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.entries.len(), "pruned rate limit entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn maybe_sweep(&self, now: u64) {
        if self.sweep_every == 0 {
            return;
        }
        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if calls % self.sweep_every == 0 {
            self.prune(now);
        }
    }
}

fn normalize_id(id: &str) -> &str {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        UNKNOWN_CLIENT
    } else {
        trimmed
    }
}
