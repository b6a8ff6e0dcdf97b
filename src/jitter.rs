use rand::Rng;
use std::time::Duration;

/// Draw a duration uniformly from `[0, upper)`.
///
/// Every worker thread gets its own `thread_rng` stream, so concurrent
/// heartbeat loops never contend on a shared generator and their draws stay
/// uncorrelated.
pub fn uniform_before(upper: Duration) -> Duration {
    let upper_ms = upper.as_millis() as u64;
    if upper_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..upper_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_before_stays_in_range() {
        let upper = Duration::from_millis(250);
        for _ in 0..500 {
            assert!(uniform_before(upper) < upper);
        }
    }

    #[test]
    fn test_uniform_before_zero_upper() {
        assert_eq!(uniform_before(Duration::ZERO), Duration::ZERO);
    }
}
