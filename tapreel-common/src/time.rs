//! Clock helpers shared by events and fades

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Wall-clock timestamp for events
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Fraction of `total` covered by `elapsed`, clamped to 0.0..=1.0
///
/// A zero-length span is always complete.
pub fn progress(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() || elapsed >= total {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_recent() {
        // 2024-01-01 00:00:00 UTC
        assert!(now().timestamp() > 1_704_067_200);
    }

    #[test]
    fn test_progress() {
        let total = Duration::from_millis(400);
        assert_eq!(progress(Duration::ZERO, total), 0.0);
        assert!((progress(Duration::from_millis(100), total) - 0.25).abs() < 1e-6);
        assert_eq!(progress(Duration::from_millis(400), total), 1.0);
        assert_eq!(progress(Duration::from_secs(9), total), 1.0);
        assert_eq!(progress(Duration::from_millis(5), Duration::ZERO), 1.0);
    }
}
