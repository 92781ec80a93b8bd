//! Time source for the order timers.
//!
//! The payment watchdog and the executor retry never call `tokio::time` directly. They ask an injected [`Clock`]
//! for the current time and sleep on it, which lets tests move time forward deterministically.
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Resolves once the clock reads `deadline` or later. Returns immediately if the deadline has passed.
    async fn sleep_until(&self, deadline: DateTime<Utc>);
}

/// The wall clock, backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        let remaining = (deadline - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(remaining).await;
    }
}

/// `now + d`, at millisecond precision.
pub fn add_duration(now: DateTime<Utc>, d: Duration) -> DateTime<Utc> {
    #[allow(clippy::cast_possible_truncation)]
    let millis = d.as_millis().min(i64::MAX as u128) as i64;
    now + chrono::Duration::milliseconds(millis)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn past_deadlines_do_not_block() {
        let clock = SystemClock;
        let past = clock.now() - chrono::Duration::seconds(5);
        tokio::time::timeout(Duration::from_millis(100), clock.sleep_until(past)).await.unwrap();
    }

    #[test]
    fn adding_durations() {
        let now = Utc::now();
        assert_eq!(add_duration(now, Duration::from_secs(600)) - now, chrono::Duration::minutes(10));
    }
}
