//! Token-bucket rate limiter for outbound remote-catalog calls
//!
//! Delays rather than rejects: `acquire()` suspends until a token is
//! available, so callers always eventually proceed, trading latency for
//! never tripping the provider's hard rate cap. Refill is elapsed-time
//! accounting on each call, never a timer.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket shared by one remote client instance
///
/// Refill-then-debit runs atomically under a single lock guard per
/// `acquire()` pass. Under contention, woken callers recompute a slightly
/// stale refill and may sleep again, which biases the realized rate under
/// the nominal limit, never over it.
pub struct TokenBucket {
    state: Mutex<BucketState>,
    max_tokens: f64,
    refill_per_ms: f64,
}

impl TokenBucket {
    /// Create a bucket starting full
    ///
    /// `refill_per_ms` is tokens added per elapsed millisecond
    /// (e.g. 1 request/sec = 0.001).
    pub fn new(max_tokens: u32, refill_per_ms: f64) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: max_tokens as f64,
                last_refill: Instant::now(),
            }),
            max_tokens: max_tokens as f64,
            refill_per_ms,
        }
    }

    /// Suspend until a token is available, then debit exactly one
    pub async fn acquire(&self) {
        loop {
            let wait_ms = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }

                ((1.0 - state.tokens) / self.refill_per_ms).ceil() as u64
            };

            tracing::debug!(wait_ms, "Rate limiting: waiting for token");
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }
    }

    /// Add elapsed-time tokens, capped at the bucket maximum
    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(state.last_refill).as_millis() as f64;
        state.tokens = (state.tokens + elapsed_ms * self.refill_per_ms).min(self.max_tokens);
        state.last_refill = now;
    }
}
