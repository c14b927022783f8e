//! Tick-based retry backoff

/// Exponential backoff counted in ticks
///
/// After the n-th consecutive failure the next attempt waits
/// `min(2^(n-1), max_ticks)` ticks, so the delays run 1, 2, 4 ... up to the
/// cap. A cap of zero retries on every tick.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    max_ticks: u32,
    failures: u32,
    remaining: u32,
}

impl RetryBackoff {
    /// Create a backoff capped at `max_ticks`
    pub fn new(max_ticks: u32) -> Self {
        Self {
            max_ticks,
            failures: 0,
            remaining: 0,
        }
    }

    /// Called once per tick; returns whether an attempt may run now
    pub fn ready(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            false
        } else {
            true
        }
    }

    /// Record a failed attempt
    pub fn failed(&mut self) {
        self.failures = self.failures.saturating_add(1);
        self.remaining = self.delay().saturating_sub(1);
    }

    /// Record a success, or an external change that makes a retry worthwhile
    pub fn reset(&mut self) {
        self.failures = 0;
        self.remaining = 0;
    }

    /// Consecutive failures so far
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Ticks from the last failure to the next attempt
    pub fn delay(&self) -> u32 {
        if self.failures == 0 || self.max_ticks == 0 {
            return 1;
        }
        let exponent = (self.failures - 1).min(31);
        (1u32 << exponent).min(self.max_ticks).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempts(backoff: &mut RetryBackoff, ticks: usize) -> Vec<usize> {
        let mut at = Vec::new();
        for tick in 0..ticks {
            if backoff.ready() {
                at.push(tick);
                backoff.failed();
            }
        }
        at
    }

    #[test]
    fn test_delays_double_up_to_cap() {
        let mut backoff = RetryBackoff::new(4);
        // delays 1, 2, 4, 4, 4
        assert_eq!(attempts(&mut backoff, 16), vec![0, 1, 3, 7, 11, 15]);
        assert_eq!(backoff.delay(), 4);
    }

    #[test]
    fn test_zero_cap_retries_every_tick() {
        let mut backoff = RetryBackoff::new(0);
        assert_eq!(attempts(&mut backoff, 4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reset_allows_immediate_attempt() {
        let mut backoff = RetryBackoff::new(64);
        for _ in 0..5 {
            backoff.failed();
        }
        assert!(!backoff.ready());

        backoff.reset();
        assert!(backoff.ready());
        assert_eq!(backoff.failures(), 0);
    }
}
