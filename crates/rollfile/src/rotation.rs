//! Time-based rotation policy: granularity, deadlines, and name suffixes

use std::fmt;

use chrono::{DateTime, Utc};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_DAY: u64 = 86_400;

/// Rotation interval in seconds, classified into a calendar granularity by
/// magnitude.
///
/// Deadlines are aligned to UTC calendar boundaries rather than sliding
/// windows, so backup names stay on human-meaningful boundaries (always the
/// hour, never 37 minutes past it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotateTime(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Day,
    Hour,
    Minute,
    Second,
}

impl RotateTime {
    /// Rotate once per UTC day.
    pub const EVERY_DAY: RotateTime = RotateTime(SECS_PER_DAY);
    /// Rotate at the start of every hour.
    pub const EVERY_HOUR: RotateTime = RotateTime(SECS_PER_HOUR);
    /// Rotate every 30 minutes, aligned within the hour.
    pub const EVERY_30_MIN: RotateTime = RotateTime(30 * SECS_PER_MINUTE);
    /// Rotate every 15 minutes, aligned within the hour.
    pub const EVERY_15_MIN: RotateTime = RotateTime(15 * SECS_PER_MINUTE);
    /// Rotate every minute.
    pub const EVERY_MINUTE: RotateTime = RotateTime(SECS_PER_MINUTE);
    /// Rotate every second. Mainly useful in tests.
    pub const EVERY_SECOND: RotateTime = RotateTime(1);

    /// Interval from a raw second count. Zero is clamped to one second.
    pub fn from_secs(secs: u64) -> Self {
        RotateTime(secs.max(1))
    }

    /// Configured interval in seconds.
    pub fn interval_secs(&self) -> u64 {
        self.0
    }

    fn granularity(&self) -> Granularity {
        match self.0 {
            s if s >= SECS_PER_DAY => Granularity::Day,
            s if s >= SECS_PER_HOUR => Granularity::Hour,
            s if s >= SECS_PER_MINUTE => Granularity::Minute,
            _ => Granularity::Second,
        }
    }

    /// Epoch-second deadline of the next aligned boundary, strictly after
    /// `now`.
    ///
    /// Day granularity lands on the start of the next UTC day, hour
    /// granularity on the start of the next hour. Minute granularity
    /// advances by the interval and rounds to the nearest multiple of it
    /// within the hour; a result at or past the hour collapses to the next
    /// hour start, so minute boundaries never straddle an hour. Second
    /// granularity is a plain offset from now.
    pub fn next_deadline(&self, now: DateTime<Utc>) -> i64 {
        let ts = now.timestamp();
        match self.granularity() {
            Granularity::Day => day_start(ts) + SECS_PER_DAY as i64,
            Granularity::Hour => hour_start(ts) + SECS_PER_HOUR as i64,
            Granularity::Minute => {
                let minutes = (self.0 / SECS_PER_MINUTE) as i64;
                let hour = hour_start(ts);
                let next_min = (ts - hour) / 60 + minutes;
                if next_min >= 60 {
                    return hour + SECS_PER_HOUR as i64;
                }

                // round to the nearest multiple of the interval, half up
                let rem = next_min % minutes;
                let rounded = if rem * 2 >= minutes {
                    next_min - rem + minutes
                } else {
                    next_min - rem
                };
                if rounded >= 60 {
                    hour + SECS_PER_HOUR as i64
                } else {
                    hour + rounded * 60
                }
            }
            Granularity::Second => ts + self.0 as i64,
        }
    }

    /// Epoch second at which the period ending at `deadline` began, one
    /// boundary back on the deadline ladder.
    ///
    /// Day and hour deadlines advance one calendar unit per rotation
    /// whatever the configured magnitude, so the step back is one day or
    /// one hour. Minute deadlines step back one interval, except at an
    /// hour start reached by collapse, where the prior boundary is the
    /// last interval multiple inside the previous hour.
    pub fn period_start(&self, deadline: i64) -> i64 {
        match self.granularity() {
            Granularity::Day => deadline - SECS_PER_DAY as i64,
            Granularity::Hour => deadline - SECS_PER_HOUR as i64,
            Granularity::Minute => {
                let minutes = (self.0 / SECS_PER_MINUTE) as i64;
                let hour = hour_start(deadline);
                if deadline == hour {
                    let last = 59 / minutes * minutes;
                    hour - SECS_PER_HOUR as i64 + last * 60
                } else {
                    deadline - minutes * 60
                }
            }
            Granularity::Second => deadline - self.0 as i64,
        }
    }

    /// chrono format string for backup-name suffixes at this granularity.
    pub fn suffix_format(&self) -> &'static str {
        match self.granularity() {
            Granularity::Day => "%Y%m%d",
            Granularity::Hour => "%Y%m%d_%H00",
            Granularity::Minute => "%Y%m%d_%H%M",
            Granularity::Second => "%Y%m%d_%H%M%S",
        }
    }

    /// Render the name suffix for the rotation period starting at the given
    /// epoch second.
    pub fn period_suffix(&self, period_start: i64) -> String {
        match DateTime::<Utc>::from_timestamp(period_start, 0) {
            Some(dt) => dt.format(self.suffix_format()).to_string(),
            None => period_start.to_string(),
        }
    }
}

impl fmt::Display for RotateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity() {
            Granularity::Day => write_every(f, self.0 / SECS_PER_DAY, "day"),
            Granularity::Hour => write_every(f, self.0 / SECS_PER_HOUR, "hour"),
            Granularity::Minute => write_every(f, self.0 / SECS_PER_MINUTE, "minute"),
            Granularity::Second => write_every(f, self.0, "second"),
        }
    }
}

fn write_every(f: &mut fmt::Formatter<'_>, n: u64, unit: &str) -> fmt::Result {
    if n == 1 {
        write!(f, "every {}", unit)
    } else {
        write!(f, "every {} {}s", n, unit)
    }
}

fn day_start(ts: i64) -> i64 {
    ts - ts.rem_euclid(SECS_PER_DAY as i64)
}

fn hour_start(ts: i64) -> i64 {
    ts - ts.rem_euclid(SECS_PER_HOUR as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_granularity_by_magnitude() {
        assert_eq!(RotateTime::EVERY_DAY.suffix_format(), "%Y%m%d");
        assert_eq!(RotateTime::from_secs(2 * 86_400).suffix_format(), "%Y%m%d");
        assert_eq!(RotateTime::EVERY_HOUR.suffix_format(), "%Y%m%d_%H00");
        assert_eq!(RotateTime::EVERY_30_MIN.suffix_format(), "%Y%m%d_%H%M");
        assert_eq!(RotateTime::EVERY_MINUTE.suffix_format(), "%Y%m%d_%H%M");
        assert_eq!(RotateTime::EVERY_SECOND.suffix_format(), "%Y%m%d_%H%M%S");
    }

    #[test]
    fn test_day_deadline_is_next_day_start() {
        let deadline = RotateTime::EVERY_DAY.next_deadline(at(23, 59, 59));
        let next_day = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(deadline, next_day.timestamp());

        // same boundary no matter where in the day we start
        let deadline = RotateTime::EVERY_DAY.next_deadline(at(0, 0, 1));
        assert_eq!(deadline, next_day.timestamp());
    }

    #[test]
    fn test_hour_deadline_is_next_hour_start() {
        let deadline = RotateTime::EVERY_HOUR.next_deadline(at(14, 37, 22));
        assert_eq!(deadline, at(15, 0, 0).timestamp());

        // exactly on the boundary still yields the next one
        let deadline = RotateTime::EVERY_HOUR.next_deadline(at(14, 0, 0));
        assert_eq!(deadline, at(15, 0, 0).timestamp());
    }

    #[test]
    fn test_minute_deadline_rounds_within_hour() {
        // 37 + 5 = 42, rounded down to 40
        let five_min = RotateTime::from_secs(5 * 60);
        assert_eq!(five_min.next_deadline(at(14, 37, 10)), at(14, 40, 0).timestamp());

        // 10 + 15 = 25, rounded up to 30
        assert_eq!(
            RotateTime::EVERY_15_MIN.next_deadline(at(14, 10, 0)),
            at(14, 30, 0).timestamp()
        );
    }

    #[test]
    fn test_minute_deadline_collapses_to_next_hour() {
        // 57 + 5 = 62 crosses the hour
        let five_min = RotateTime::from_secs(5 * 60);
        assert_eq!(five_min.next_deadline(at(14, 57, 0)), at(15, 0, 0).timestamp());

        // 51 + 6 = 57 rounds up to 60, which is also the next hour
        let six_min = RotateTime::from_secs(6 * 60);
        assert_eq!(six_min.next_deadline(at(14, 51, 0)), at(15, 0, 0).timestamp());
    }

    #[test]
    fn test_second_deadline_is_plain_offset() {
        let now = at(14, 37, 22);
        assert_eq!(RotateTime::EVERY_SECOND.next_deadline(now), now.timestamp() + 1);
        assert_eq!(RotateTime::from_secs(10).next_deadline(now), now.timestamp() + 10);
    }

    #[test]
    fn test_deadline_always_in_future() {
        let intervals = [
            RotateTime::EVERY_DAY,
            RotateTime::EVERY_HOUR,
            RotateTime::EVERY_30_MIN,
            RotateTime::EVERY_15_MIN,
            RotateTime::EVERY_MINUTE,
            RotateTime::EVERY_SECOND,
            RotateTime::from_secs(7 * 60),
        ];
        let instants = [at(0, 0, 0), at(14, 37, 10), at(23, 59, 59), at(14, 0, 0)];
        for rt in intervals {
            for now in instants {
                assert!(
                    rt.next_deadline(now) > now.timestamp(),
                    "{} at {} produced a non-future deadline",
                    rt,
                    now
                );
            }
        }
    }

    #[test]
    fn test_period_start_is_one_boundary_back() {
        let next_hour = at(15, 0, 0).timestamp();
        assert_eq!(
            RotateTime::EVERY_HOUR.period_start(next_hour),
            at(14, 0, 0).timestamp()
        );
        // intervals above one unit still step back a single hour or day
        assert_eq!(
            RotateTime::from_secs(7200).period_start(next_hour),
            at(14, 0, 0).timestamp()
        );

        let next_day = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap().timestamp();
        assert_eq!(RotateTime::EVERY_DAY.period_start(next_day), at(0, 0, 0).timestamp());
        assert_eq!(
            RotateTime::from_secs(2 * 86_400).period_start(next_day),
            at(0, 0, 0).timestamp()
        );

        // second granularity steps back the raw interval
        assert_eq!(
            RotateTime::from_secs(10).period_start(at(14, 0, 10).timestamp()),
            at(14, 0, 0).timestamp()
        );
    }

    #[test]
    fn test_period_start_for_minute_ladder() {
        let m25 = RotateTime::from_secs(25 * 60);
        assert_eq!(m25.period_start(at(14, 50, 0).timestamp()), at(14, 25, 0).timestamp());
        assert_eq!(m25.period_start(at(14, 25, 0).timestamp()), at(14, 0, 0).timestamp());
        // an hour start reached by collapse steps into the previous hour
        assert_eq!(m25.period_start(at(15, 0, 0).timestamp()), at(14, 50, 0).timestamp());
        assert_eq!(
            RotateTime::EVERY_30_MIN.period_start(at(15, 0, 0).timestamp()),
            at(14, 30, 0).timestamp()
        );
    }

    #[test]
    fn test_period_start_inverts_next_deadline() {
        let intervals = [
            RotateTime::EVERY_DAY,
            RotateTime::from_secs(2 * 86_400),
            RotateTime::EVERY_HOUR,
            RotateTime::from_secs(7200),
            RotateTime::EVERY_30_MIN,
            RotateTime::from_secs(25 * 60),
            RotateTime::EVERY_MINUTE,
            RotateTime::EVERY_SECOND,
        ];
        let instants = [at(0, 0, 0), at(14, 37, 10), at(23, 59, 59), at(14, 0, 0)];
        for rt in intervals {
            for now in instants {
                let due = rt.next_deadline(now);
                let start = rt.period_start(due);
                assert!(start < due, "{} at {} put the period start past the deadline", rt, now);

                // stepping forward from the period start lands back on the
                // same deadline, so start and deadline are ladder neighbors
                let from_start = DateTime::<Utc>::from_timestamp(start, 0).unwrap();
                assert_eq!(
                    rt.next_deadline(from_start),
                    due,
                    "{} at {} did not step back to the previous boundary",
                    rt,
                    now
                );
            }
        }
    }

    #[test]
    fn test_period_suffix_per_granularity() {
        let start = at(14, 0, 0).timestamp();
        assert_eq!(RotateTime::EVERY_DAY.period_suffix(start), "20240301");
        assert_eq!(RotateTime::EVERY_HOUR.period_suffix(start), "20240301_1400");

        let five_past = at(14, 5, 9).timestamp();
        assert_eq!(RotateTime::EVERY_MINUTE.period_suffix(five_past), "20240301_1405");
        assert_eq!(RotateTime::EVERY_SECOND.period_suffix(five_past), "20240301_140509");
    }

    #[test]
    fn test_display() {
        assert_eq!(RotateTime::EVERY_DAY.to_string(), "every day");
        assert_eq!(RotateTime::EVERY_HOUR.to_string(), "every hour");
        assert_eq!(RotateTime::EVERY_15_MIN.to_string(), "every 15 minutes");
        assert_eq!(RotateTime::from_secs(7200).to_string(), "every 2 hours");
        assert_eq!(RotateTime::from_secs(30).to_string(), "every 30 seconds");
        assert_eq!(RotateTime::EVERY_SECOND.to_string(), "every second");
    }
}
