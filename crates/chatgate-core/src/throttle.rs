//! Server-side login throttle.
//!
//! One [`LockoutGuard`] per key (client address plus account), advanced
//! against the wall clock instead of a UI timer. Reloading the page does
//! not reset it.

use dashmap::DashMap;

use crate::config::LockoutConfig;
use crate::lockout::{FailureOutcome, LockoutGuard};

/// Result of asking whether a login attempt may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginCheck {
    Allowed,
    Locked { retry_after_secs: u32 },
}

struct ThrottleEntry {
    guard: LockoutGuard,
    /// Wall-clock instant up to which `guard` has been ticked.
    ticked_at: u64,
    last_seen: u64,
}

impl ThrottleEntry {
    fn catch_up(&mut self, now: u64) {
        if !self.guard.is_locked() {
            self.ticked_at = now;
            return;
        }
        let secs = now.saturating_sub(self.ticked_at) / 1000;
        if secs > 0 {
            self.guard.advance(secs);
            self.ticked_at += secs * 1000;
        }
    }
}

pub struct LoginThrottle {
    entries: DashMap<String, ThrottleEntry>,
    policy: LockoutConfig,
}

impl LoginThrottle {
    pub fn new(policy: LockoutConfig) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    /// Builds the throttle key for a client and the account it targets.
    pub fn key(client: &str, account: &str) -> String {
        format!("{client}|{}", account.trim().to_lowercase())
    }

    pub fn check(&self, key: &str, now: u64) -> LoginCheck {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return LoginCheck::Allowed;
        };
        entry.catch_up(now);
        if entry.guard.is_locked() {
            LoginCheck::Locked {
                retry_after_secs: entry.guard.remaining_seconds(),
            }
        } else {
            LoginCheck::Allowed
        }
    }

    pub fn record_failure(&self, key: &str, now: u64) -> FailureOutcome {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| ThrottleEntry {
                guard: LockoutGuard::new(self.policy),
                ticked_at: now,
                last_seen: now,
            });
        entry.catch_up(now);
        entry.last_seen = now;

        let outcome = entry.guard.record_failure();
        if let FailureOutcome::Locked { seconds } = outcome {
            entry.ticked_at = now;
            tracing::warn!(key, seconds, "login locked after repeated failures");
        }
        outcome
    }

    pub fn record_success(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drops unlocked entries idle for at least `idle_ms`. Returns how many
    /// were removed.
    pub fn prune(&self, now: u64, idle_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            entry.catch_up(now);
            entry.guard.is_locked() || now.saturating_sub(entry.last_seen) < idle_ms
        });
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "pruned login throttle entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
