use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Calendar date of `at` as seen in `tz`.
pub fn local_day(tz: &Tz, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// First instant of the local day after `from`, in UTC.
///
/// Zones that skip local midnight on a DST change get the first valid local
/// time after it instead.
pub fn next_local_midnight(tz: &Tz, from: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = local_day(tz, from) + Duration::days(1);
    let midnight = tomorrow.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(from + Duration::days(1))
}

/// Delay before retry `attempt` (0-based): `base * 2^attempt`, capped at `max`.
pub fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> StdDuration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    StdDuration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn local_day_follows_timezone() {
        let london = chrono_tz::Europe::London;
        // 23:30 UTC in June is 00:30 BST the next day
        assert_eq!(
            local_day(&london, utc(2025, 6, 1, 23, 30)),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
        assert_eq!(
            local_day(&chrono_tz::UTC, utc(2025, 6, 1, 23, 30)),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
    }

    #[test]
    fn midnight_across_dst_change() {
        let london = chrono_tz::Europe::London;
        // clocks go forward at 01:00 on 2025-03-30
        assert_eq!(next_local_midnight(&london, utc(2025, 3, 29, 12, 0)), utc(2025, 3, 30, 0, 0));
        assert_eq!(next_local_midnight(&london, utc(2025, 3, 30, 12, 0)), utc(2025, 3, 30, 23, 0));
    }

    #[test]
    fn midnight_exactly_is_next_day() {
        let tz = chrono_tz::UTC;
        assert_eq!(next_local_midnight(&tz, utc(2025, 3, 1, 0, 0)), utc(2025, 3, 2, 0, 0));
    }

    #[test]
    fn skipped_midnight_falls_forward() {
        // 2018-11-04 00:00 did not exist in Sao Paulo (clocks jumped to 01:00, -02)
        let tz = chrono_tz::America::Sao_Paulo;
        assert_eq!(next_local_midnight(&tz, utc(2018, 11, 3, 12, 0)), utc(2018, 11, 4, 3, 0));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0, 500, 30_000), StdDuration::from_millis(500));
        assert_eq!(backoff_delay(3, 500, 30_000), StdDuration::from_millis(4_000));
        assert_eq!(backoff_delay(10, 500, 30_000), StdDuration::from_millis(30_000));
        assert_eq!(backoff_delay(200, 500, 30_000), StdDuration::from_millis(30_000));
    }
}
