//! Failed-login lockout state machine.
//!
//! ```text
//! Unlocked(n) --failure--> Unlocked(n + 1)
//! Unlocked(max - 1) --failure--> Locked(lock_seconds)
//! Locked(r) --tick--> Locked(r - 1)
//! Locked(1) --tick--> Unlocked(0)
//! any --success--> Unlocked(0)
//! ```
//!
//! [`LockoutGuard`] is scoped to one login form. [`run_countdown`] drives it
//! with a one-second timer. The server-side [`crate::throttle::LoginThrottle`]
//! reuses the same machine per account.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use crate::config::LockoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutState {
    Unlocked { attempts: u32 },
    Locked { remaining_seconds: u32 },
}

/// What happened when a failure was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Still unlocked; this many failures remain before a lock.
    Retry { attempts_left: u32 },
    /// This failure engaged the lock.
    Locked { seconds: u32 },
    /// The guard was already locked, so the attempt was not counted.
    Ignored { remaining_seconds: u32 },
}

#[derive(Debug, Clone)]
pub struct LockoutGuard {
    policy: LockoutConfig,
    attempts: u32,
    remaining_seconds: u32,
}

impl LockoutGuard {
    pub fn new(policy: LockoutConfig) -> Self {
        Self {
            policy,
            attempts: 0,
            remaining_seconds: 0,
        }
    }

    pub fn state(&self) -> LockoutState {
        if self.is_locked() {
            LockoutState::Locked {
                remaining_seconds: self.remaining_seconds,
            }
        } else {
            LockoutState::Unlocked {
                attempts: self.attempts,
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        self.remaining_seconds > 0
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Submit gate: `false` while locked, meaning the submit is a no-op.
    pub fn can_submit(&self) -> bool {
        !self.is_locked()
    }

    pub fn record_failure(&mut self) -> FailureOutcome {
        if self.is_locked() {
            return FailureOutcome::Ignored {
                remaining_seconds: self.remaining_seconds,
            };
        }

        self.attempts += 1;
        if self.attempts >= self.policy.max_failures {
            self.remaining_seconds = self.policy.lock_seconds;
            tracing::debug!(
                attempts = self.attempts,
                seconds = self.remaining_seconds,
                "lockout engaged"
            );
            return FailureOutcome::Locked {
                seconds: self.remaining_seconds,
            };
        }

        FailureOutcome::Retry {
            attempts_left: self.policy.max_failures - self.attempts,
        }
    }

    /// Successful login ends the sequence.
    pub fn record_success(&mut self) {
        self.attempts = 0;
        self.remaining_seconds = 0;
    }

    /// One elapsed second. Returns `true` if this tick released the lock.
    pub fn tick(&mut self) -> bool {
        if !self.is_locked() {
            return false;
        }
        self.remaining_seconds -= 1;
        if self.remaining_seconds == 0 {
            self.attempts = 0;
            tracing::debug!("lockout released");
            return true;
        }
        false
    }

    /// Applies `seconds` ticks at once. Returns `true` if the lock was released.
    pub fn advance(&mut self, seconds: u64) -> bool {
        let steps = seconds.min(u64::from(self.remaining_seconds));
        let mut released = false;
        for _ in 0..steps {
            released |= self.tick();
        }
        released
    }
}

/// Why [`run_countdown`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEnd {
    Unlocked,
    Cancelled,
}

/// Ticks `guard` once per second until it unlocks or `cancel` fires.
///
/// Sending `true` on the cancel channel, or dropping its sender, stops the
/// timer without touching the guard.
pub async fn run_countdown(
    guard: Arc<Mutex<LockoutGuard>>,
    mut cancel: watch::Receiver<bool>,
) -> CountdownEnd {
    if !guard.lock().await.is_locked() {
        return CountdownEnd::Unlocked;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut g = guard.lock().await;
                g.tick();
                if !g.is_locked() {
                    return CountdownEnd::Unlocked;
                }
            }
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    return CountdownEnd::Cancelled;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> LockoutGuard {
        LockoutGuard::new(LockoutConfig::default())
    }

    #[test]
    fn third_failure_locks_for_ten_seconds() {
        let mut g = guard();
        assert_eq!(g.record_failure(), FailureOutcome::Retry { attempts_left: 2 });
        assert_eq!(g.state(), LockoutState::Unlocked { attempts: 1 });
        assert_eq!(g.record_failure(), FailureOutcome::Retry { attempts_left: 1 });
        assert_eq!(g.state(), LockoutState::Unlocked { attempts: 2 });
        assert_eq!(g.record_failure(), FailureOutcome::Locked { seconds: 10 });
        assert_eq!(
            g.state(),
            LockoutState::Locked {
                remaining_seconds: 10
            }
        );
        assert!(!g.can_submit());
    }

    #[test]
    fn ten_ticks_unlock_and_reset_attempts() {
        let mut g = guard();
        for _ in 0..3 {
            g.record_failure();
        }
        for i in 1..10 {
            assert!(!g.tick(), "tick {i} released early");
            assert_eq!(g.remaining_seconds(), 10 - i);
        }
        assert!(g.tick());
        assert_eq!(g.state(), LockoutState::Unlocked { attempts: 0 });
        assert!(g.can_submit());
    }

    #[test]
    fn failures_while_locked_are_ignored() {
        let mut g = guard();
        for _ in 0..3 {
            g.record_failure();
        }
        g.tick();
        assert_eq!(
            g.record_failure(),
            FailureOutcome::Ignored {
                remaining_seconds: 9
            }
        );
        assert_eq!(g.remaining_seconds(), 9);
    }

    #[test]
    fn success_interleaved_prevents_lock() {
        let mut g = guard();
        g.record_failure();
        g.record_failure();
        g.record_success();
        assert_eq!(g.record_failure(), FailureOutcome::Retry { attempts_left: 2 });
        assert!(!g.is_locked());
    }

    #[test]
    fn tick_while_unlocked_is_noop() {
        let mut g = guard();
        g.record_failure();
        assert!(!g.tick());
        assert_eq!(g.state(), LockoutState::Unlocked { attempts: 1 });
    }

    #[test]
    fn advance_clamps_to_remaining() {
        let mut g = guard();
        for _ in 0..3 {
            g.record_failure();
        }
        assert!(!g.advance(4));
        assert_eq!(g.remaining_seconds(), 6);
        assert!(g.advance(1_000));
        assert!(!g.is_locked());
        assert!(!g.advance(5));
    }

    #[test]
    fn custom_policy_threshold() {
        let mut g = LockoutGuard::new(LockoutConfig {
            max_failures: 1,
            lock_seconds: 2,
        });
        assert_eq!(g.record_failure(), FailureOutcome::Locked { seconds: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_unlocks_after_lock_seconds() {
        let g = Arc::new(Mutex::new(guard()));
        {
            let mut locked = g.lock().await;
            for _ in 0..3 {
                locked.record_failure();
            }
        }
        let (_tx, rx) = watch::channel(false);

        let start = tokio::time::Instant::now();
        let end = run_countdown(Arc::clone(&g), rx).await;

        assert_eq!(end, CountdownEnd::Unlocked);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(g.lock().await.state(), LockoutState::Unlocked { attempts: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_stops_on_cancel() {
        let g = Arc::new(Mutex::new(guard()));
        {
            let mut locked = g.lock().await;
            for _ in 0..3 {
                locked.record_failure();
            }
        }
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(run_countdown(Arc::clone(&g), rx));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        tx.send(true).unwrap();

        assert_eq!(task.await.unwrap(), CountdownEnd::Cancelled);
        assert_eq!(g.lock().await.remaining_seconds(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_returns_immediately_when_unlocked() {
        let g = Arc::new(Mutex::new(guard()));
        let (_tx, rx) = watch::channel(false);
        assert_eq!(run_countdown(g, rx).await, CountdownEnd::Unlocked);
    }
}
