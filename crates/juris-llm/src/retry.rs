//! Retry policy and the per-pair retry state machine.
//!
//! Retries are bounded per (model, credential) pair, never globally. A pair
//! starts at retry 0 and may be tried `max_retries_per_pair + 1` times in
//! total; each retryable failure waits `base_backoff * 2^retry` first.

use std::time::Duration;

use crate::error::FailureKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries_per_pair: u32,
    pub base_backoff: Duration,
    /// Answers with fewer characters than this are treated as failures.
    pub min_answer_chars: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries_per_pair: 2,
            base_backoff: Duration::from_secs(2),
            min_answer_chars: 50,
        }
    }
}

impl RetryPolicy {
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }

    /// Fresh retry state for one (model, credential) pair.
    pub fn pair(&self) -> PairRetry {
        PairRetry {
            retry: 0,
            policy: self.clone(),
        }
    }

    /// Lower bound on the time a pair spends backing off when every attempt
    /// fails retryably.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_retries_per_pair)
            .map(|r| self.backoff_for(r))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep, then try the same pair again.
    Backoff(Duration),
    /// Give up on this pair and move to the next credential.
    Escalate,
}

#[derive(Debug, Clone)]
pub struct PairRetry {
    retry: u32,
    policy: RetryPolicy,
}

impl PairRetry {
    pub fn retry_index(&self) -> u32 {
        self.retry
    }

    pub fn decide(&mut self, failure: &FailureKind) -> RetryDecision {
        if failure.is_retryable() && self.retry < self.policy.max_retries_per_pair {
            let wait = self.policy.backoff_for(self.retry);
            self.retry += 1;
            RetryDecision::Backoff(wait)
        } else {
            RetryDecision::Escalate
        }
    }
}
