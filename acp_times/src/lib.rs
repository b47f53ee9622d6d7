//! Control open/close time computation for ACP-sanctioned brevets.
//!
//! Times follow the RUSA control time algorithm: each stretch of the route is
//! timed at the minimum and maximum average speeds of the ACP table, and the
//! elapsed time is rounded to the nearest minute.

pub mod schedule;
pub mod table;

use chrono::{DateTime, TimeDelta, TimeZone};
use thiserror::Error;

pub use schedule::{Brevet, BrevetDistance, Control, ControlTimes, Unit};
pub use table::{elapsed_hours, segment_index, Segment, SpeedBound, SEGMENTS};

#[derive(Error, Debug, PartialEq)]
pub enum BrevetError {
    #[error("invalid brevet distance: {0} km")]
    InvalidDistance(f64),
    #[error("{0} km is not an official ACP brevet distance")]
    UnofficialDistance(f64),
    #[error("invalid control #{index}: distance {distance}")]
    InvalidControl { index: usize, distance: f64 },
    #[error("failed to parse brevet definition: {0}")]
    Parse(String),
}

/// Earliest time a rider may check in at a control.
///
/// Returns `None` when the control lies beyond the brevet's nominal distance,
/// or when the resulting time cannot be represented (a distance so large the
/// elapsed time overflows the calendar). The result keeps the time zone of
/// `start_time`.
pub fn open_time<Tz: TimeZone>(
    control_distance_km: f64,
    brevet_distance_km: f64,
    start_time: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    control_time(
        control_distance_km,
        brevet_distance_km,
        start_time,
        SpeedBound::Maximum,
    )
}

/// Latest time a rider may check in at a control.
///
/// Same contract as [`open_time`], timed at the minimum speeds.
pub fn close_time<Tz: TimeZone>(
    control_distance_km: f64,
    brevet_distance_km: f64,
    start_time: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    control_time(
        control_distance_km,
        brevet_distance_km,
        start_time,
        SpeedBound::Minimum,
    )
}

/// Elapsed time from the start to a control, rounded to the nearest minute.
///
/// `None` if the minute count does not fit in a `TimeDelta`.
pub fn elapsed(control_distance_km: f64, bound: SpeedBound) -> Option<TimeDelta> {
    let minutes = (elapsed_hours(control_distance_km, bound) * 60.0).round();
    TimeDelta::try_minutes(minutes as i64)
}

fn control_time<Tz: TimeZone>(
    control_distance_km: f64,
    brevet_distance_km: f64,
    start_time: &DateTime<Tz>,
    bound: SpeedBound,
) -> Option<DateTime<Tz>> {
    if control_distance_km > brevet_distance_km {
        return None;
    }
    let delta = elapsed(control_distance_km, bound)?;
    start_time.clone().checked_add_signed(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("1970-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn hhmm<Tz: TimeZone>(t: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        t.format("%Y-%m-%dT%H:%M").to_string()
    }

    #[test]
    fn zero_distance_opens_and_closes_at_start() {
        let start = epoch();
        assert_eq!(open_time(0.0, 0.0, &start), Some(start));
        assert_eq!(close_time(0.0, 0.0, &start), Some(start));
        assert_eq!(open_time(0.0, 600.0, &start), Some(start));
        assert_eq!(close_time(0.0, 600.0, &start), Some(start));
    }

    #[test]
    fn control_past_brevet_has_no_times() {
        let start = epoch();
        assert_eq!(open_time(1.0, 0.0, &start), None);
        assert_eq!(close_time(1.0, 0.0, &start), None);
        assert_eq!(open_time(200.5, 200.0, &start), None);
        assert_eq!(close_time(1001.0, 1000.0, &start), None);
    }

    #[test]
    fn two_hundred_kilometer_finish() {
        let start = epoch();
        let open = open_time(200.0, 200.0, &start).unwrap();
        let close = close_time(200.0, 200.0, &start).unwrap();
        assert_eq!(hhmm(&open), "1970-01-01T05:53");
        assert_eq!(hhmm(&close), "1970-01-01T13:20");
    }

    #[test]
    fn published_rusa_examples() {
        let start = epoch();
        // 890 km control on a 1000 km brevet: 29H09 / 65H23
        let open = open_time(890.0, 1000.0, &start).unwrap();
        let close = close_time(890.0, 1000.0, &start).unwrap();
        assert_eq!(open - start, TimeDelta::minutes(29 * 60 + 9));
        assert_eq!(close - start, TimeDelta::minutes(65 * 60 + 23));

        let open = open_time(1000.0, 1000.0, &start).unwrap();
        let close = close_time(1000.0, 1000.0, &start).unwrap();
        assert_eq!(open - start, TimeDelta::minutes(33 * 60 + 5));
        assert_eq!(close - start, TimeDelta::minutes(75 * 60));
    }

    #[test]
    fn keeps_start_offset() {
        let start = DateTime::parse_from_rfc3339("2026-06-01T07:00:00+02:00").unwrap();
        let open = open_time(60.0, 200.0, &start).unwrap();
        let close = close_time(60.0, 200.0, &start).unwrap();
        assert_eq!(*open.offset(), FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(open.to_rfc3339(), "2026-06-01T08:46:00+02:00");
        assert_eq!(close.to_rfc3339(), "2026-06-01T11:00:00+02:00");
    }

    #[test]
    fn close_never_before_open() {
        let start = epoch();
        let mut km = 0.0;
        while km <= 1000.0 {
            let open = open_time(km, 1000.0, &start).unwrap();
            let close = close_time(km, 1000.0, &start).unwrap();
            assert!(close >= open, "close before open at {km} km");
            km += 7.5;
        }
    }

    #[test]
    fn times_grow_with_distance() {
        let start = epoch();
        let mut prev_open = start;
        let mut prev_close = start;
        let mut km = 0.0;
        while km <= 1300.0 {
            let open = open_time(km, 1300.0, &start).unwrap();
            let close = close_time(km, 1300.0, &start).unwrap();
            assert!(open >= prev_open);
            assert!(close >= prev_close);
            prev_open = open;
            prev_close = close;
            km += 3.0;
        }
    }

    #[test]
    fn unrepresentable_times_are_absent() {
        let start = epoch();
        assert_eq!(open_time(1e11, 1e11, &start), None);
        assert_eq!(close_time(1e11, 1e11, &start), None);
        assert_eq!(open_time(f64::INFINITY, f64::INFINITY, &start), None);
        assert_eq!(close_time(f64::INFINITY, f64::INFINITY, &start), None);
        assert_eq!(elapsed(f64::INFINITY, SpeedBound::Minimum), None);
        // still inside chrono's range
        assert!(open_time(1e9, 1e9, &start).is_some());
    }

    #[test]
    fn distance_beyond_table_does_not_panic() {
        let start = epoch();
        let open = open_time(1400.0, 1400.0, &start).unwrap();
        let ceiling = open_time(1300.0, 1400.0, &start).unwrap();
        assert!(open > ceiling);
        assert!(close_time(1400.0, 1400.0, &start).is_some());
    }
}
