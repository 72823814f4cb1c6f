//! Retry budget.
//!
//! # Responsibilities
//! - Cap retries by attempt count AND wall-clock time, whichever runs out first
//! - Tell the caller how long it may still sleep or wait on a request
//!
//! # Design Decisions
//! - Fixed interval, no jitter: one operation polls one transaction
//! - The clock starts when the budget is created, so an initial delay
//!   counts against it

use std::time::Duration;
use tokio::time::Instant;

/// Bounded attempts within a time window.
#[derive(Debug, Clone)]
pub struct RetryBudget {
    max_attempts: u32,
    attempts: u32,
    deadline: Instant,
}

impl RetryBudget {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            attempts: 0,
            deadline: Instant::now() + window,
        }
    }

    /// Claim the next attempt. Returns its 1-based number, or `None` when
    /// the budget is spent.
    pub fn next_attempt(&mut self) -> Option<u32> {
        if self.attempts >= self.max_attempts || Instant::now() >= self.deadline {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True once no further attempt will be granted.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts || Instant::now() >= self.deadline
    }

    /// Time left in the window.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// `wanted`, shortened to what is left of the window.
    pub fn clamp_wait(&self, wanted: Duration) -> Duration {
        wanted.min(self.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_cap() {
        let mut budget = RetryBudget::new(3, Duration::from_secs(60));
        assert_eq!(budget.next_attempt(), Some(1));
        assert_eq!(budget.next_attempt(), Some(2));
        assert!(!budget.is_exhausted());
        assert_eq!(budget.next_attempt(), Some(3));
        assert!(budget.is_exhausted());
        assert_eq!(budget.next_attempt(), None);
        assert_eq!(budget.attempts(), 3);
    }

    #[tokio::test]
    async fn test_window_cap() {
        let mut budget = RetryBudget::new(100, Duration::from_millis(30));
        assert_eq!(budget.next_attempt(), Some(1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(budget.next_attempt(), None);
        assert_eq!(budget.clamp_wait(Duration::from_secs(1)), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_remaining_shrinks() {
        let budget = RetryBudget::new(5, Duration::from_millis(200));
        assert!(budget.remaining() <= Duration::from_millis(200));
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(budget.remaining(), Duration::ZERO);
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_clamp_wait() {
        let budget = RetryBudget::new(1, Duration::from_secs(10));
        assert_eq!(budget.clamp_wait(Duration::from_millis(5)), Duration::from_millis(5));
        assert!(budget.clamp_wait(Duration::from_secs(60)) <= Duration::from_secs(10));
    }
}
