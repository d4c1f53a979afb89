use chrono::{Local, NaiveDateTime, Timelike, Utc};
use std::time::Duration;

const SECS_PER_HOUR: u64 = 3600;

/// Local wall-clock source
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Time left until the top of the next clock hour.
///
/// Exactly on the hour this is a full hour.
pub fn duration_until_next_hour(now: NaiveDateTime) -> Duration {
    let into_hour = Duration::new(
        u64::from(now.minute()) * 60 + u64::from(now.second()),
        now.nanosecond().min(999_999_999),
    );
    Duration::from_secs(SECS_PER_HOUR).saturating_sub(into_hour)
}

/// Clock that starts at a fixed wall-clock time and advances with tokio's
/// (pausable) timer, so sleeping in a paused runtime moves it forward.
#[cfg(test)]
pub struct TokioClock {
    base: NaiveDateTime,
    origin: tokio::time::Instant,
}

#[cfg(test)]
impl TokioClock {
    pub fn starting_at(base: NaiveDateTime) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(test)]
impl Clock for TokioClock {
    fn now(&self) -> NaiveDateTime {
        let elapsed = tokio::time::Instant::now() - self.origin;
        self.base + chrono::TimeDelta::from_std(elapsed).unwrap()
    }
}

#[cfg(test)]
pub fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2024, 3, 14)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_timestamp() {
        let ts = current_timestamp();
        // Should be a reasonable timestamp (after 2020-01-01)
        assert!(ts > 1577836800);
        // Should be before 2100-01-01
        assert!(ts < 4102444800);
    }

    #[test]
    fn test_duration_until_next_hour() {
        assert_eq!(duration_until_next_hour(at(14, 0, 5)), Duration::from_secs(3595));
        assert_eq!(duration_until_next_hour(at(14, 59, 59)), Duration::from_secs(1));
        assert_eq!(duration_until_next_hour(at(14, 30, 0)), Duration::from_secs(1800));
    }

    #[test]
    fn test_exactly_on_the_hour_waits_full_hour() {
        assert_eq!(duration_until_next_hour(at(9, 0, 0)), Duration::from_secs(3600));
    }

    #[test]
    fn test_sub_second_precision() {
        let now = at(23, 59, 59).with_nanosecond(250_000_000).unwrap();
        assert_eq!(duration_until_next_hour(now), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::starting_at(at(13, 59, 50));
        assert_eq!(clock.now(), at(13, 59, 50));

        tokio::time::sleep(Duration::from_secs(15)).await;

        let now = clock.now();
        assert!(now >= at(14, 0, 5) && now < at(14, 0, 6));
    }
}
