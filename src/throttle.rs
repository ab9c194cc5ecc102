//! Per-account rate limiting

use std::{num::NonZeroU32, time::Duration};

use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};

use crate::error::Error;

pub struct Throttle {
    limiter: RateLimiter<i64, DashMapStateStore<i64>, DefaultClock>,
}

impl Throttle {
    pub fn new(quota: Quota) -> Self {
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(Quota::per_minute(nonzero_or_one(limit)))
    }

    /// Counts one request for `key`, failing once its quota is used up
    pub fn check(&self, key: i64) -> Result<(), Error> {
        self.limiter.check_key(&key).map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            Error::TooManyRequests(retry_after_secs(wait))
        })
    }
}

/// Whole seconds to wait, rounded up and never zero
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

#[inline]
fn nonzero_or_one(val: u32) -> NonZeroU32 {
    NonZeroU32::new(val).unwrap_or(NonZeroU32::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_throttles() {
        let throttle = Throttle::per_minute(3);

        for _ in 0..3 {
            assert!(throttle.check(1).is_ok());
        }

        match throttle.check(1) {
            Err(Error::TooManyRequests(wait)) => assert!((1..=20).contains(&wait)),
            other => panic!("expected throttling, got {other:?}"),
        }
    }

    #[test]
    fn keys_are_independent() {
        let throttle = Throttle::per_minute(1);

        assert!(throttle.check(1).is_ok());
        assert!(throttle.check(2).is_ok());
        assert!(throttle.check(1).is_err());
    }

    #[test]
    fn zero_limit_still_admits_one() {
        let throttle = Throttle::per_minute(0);

        assert!(throttle.check(5).is_ok());
        assert!(throttle.check(5).is_err());
    }

    #[test]
    fn quota_replenishes_over_time() {
        let quota = Quota::with_period(Duration::from_millis(50)).unwrap();
        let throttle = Throttle::new(quota);

        assert!(throttle.check(7).is_ok());
        assert!(throttle.check(7).is_err());

        std::thread::sleep(Duration::from_millis(80));

        assert!(throttle.check(7).is_ok());
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(19_200)), 20);
        assert_eq!(retry_after_secs(Duration::from_secs(20)), 20);
    }
}
