//! Exponential backoff policy for failed sync cycles
//!
//! Deterministic on purpose: the wait before retry `n` is exactly
//! `base * 2^n`, with no jitter, so retry scheduling is predictable and
//! testable.

use std::time::Duration;

use sitework_domain::constants::{BACKOFF_BASE_SECS, MAX_SYNC_RETRIES};

/// Exponential backoff with a bounded retry count.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max_retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self { base: Duration::from_secs(BACKOFF_BASE_SECS), max_retries: MAX_SYNC_RETRIES }
    }
}

impl Backoff {
    pub fn new(base: Duration, max_retries: u32) -> Self {
        Self { base, max_retries }
    }

    /// Maximum number of retries before the error surfaces.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait before retry number `retry_number` (1-based): `base * 2^n`.
    pub fn delay(&self, retry_number: u32) -> Duration {
        // Cap the shift so a runaway counter cannot overflow the multiplier.
        let shift = retry_number.min(16);
        self.base.saturating_mul(1_u32 << shift)
    }

    /// True once `retry_number` exceeds the bound.
    pub fn is_exhausted(&self, retry_number: u32) -> bool {
        retry_number > self.max_retries
    }
}
