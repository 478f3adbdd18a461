//! Wall-clock arithmetic on microsecond timestamps in an arbitrary zone.
//!
//! Sub-day units step in absolute time; days, months and years step on the
//! local calendar and are re-anchored at local midnight, so they land on
//! real boundaries regardless of DST or month length. Local times that do
//! not exist (spring-forward gaps) resolve to the first valid instant after
//! them. A repeated wall-clock hour has a boundary at both of its instants.

use chrono::{
    DateTime, Datelike, Days, LocalResult, Months, NaiveDate, NaiveDateTime, TimeDelta, TimeZone,
    Timelike, Utc,
};

use super::GridError;
use super::unit::TimeUnit;

/// Gap search step and limit; no zone skips more than a few hours.
const GAP_STEP_MINUTES: i64 = 15;
const GAP_STEP_LIMIT: usize = 4 * 24;

/// Convert a UTC microsecond timestamp into local time.
pub fn to_local<Tz: TimeZone>(tz: &Tz, us: i64) -> Result<DateTime<Tz>, GridError> {
    DateTime::<Utc>::from_timestamp_micros(us)
        .map(|utc| utc.with_timezone(tz))
        .ok_or(GridError::OutOfRange { us })
}

/// Both instants a local wall-clock time maps to, earliest first.
///
/// Unambiguous times give the same instant twice. Times inside a gap are
/// pushed forward to the first valid step after it.
fn candidates<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Result<(i64, i64), GridError> {
    let mut candidate = naive;
    for _ in 0..=GAP_STEP_LIMIT {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => {
                let us = dt.timestamp_micros();
                return Ok((us, us));
            }
            LocalResult::Ambiguous(early, late) => {
                return Ok((early.timestamp_micros(), late.timestamp_micros()));
            }
            LocalResult::None => {}
        }
        candidate = candidate
            .checked_add_signed(TimeDelta::minutes(GAP_STEP_MINUTES))
            .ok_or(GridError::OutOfRange {
                us: naive.and_utc().timestamp_micros(),
            })?;
    }
    Err(GridError::OutOfRange {
        us: naive.and_utc().timestamp_micros(),
    })
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, GridError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(GridError::OutOfRange { us: 0 })
}

fn floor_to(value: u32, step: u32) -> u32 {
    value - value % step.max(1)
}

/// Local wall-clock start of the `step`-aligned unit containing `local`.
fn floor_naive(local: NaiveDateTime, unit: TimeUnit, step: u32) -> Result<NaiveDateTime, GridError> {
    let d = local.date();
    let (h, m, s) = (local.hour(), local.minute(), local.second());
    let hms = |date: NaiveDate, h: u32, m: u32, s: u32| {
        date.and_hms_opt(h, m, s)
            .ok_or(GridError::OutOfRange { us: 0 })
    };
    match unit {
        TimeUnit::Second => hms(d, h, m, floor_to(s, step)),
        TimeUnit::Minute => hms(d, h, floor_to(m, step), 0),
        TimeUnit::Hour => hms(d, floor_to(h, step), 0, 0),
        TimeUnit::Day => hms(date(d.year(), d.month(), 1 + floor_to(d.day() - 1, step))?, 0, 0, 0),
        TimeUnit::Month => hms(date(d.year(), 1 + floor_to(d.month0(), step), 1)?, 0, 0, 0),
        TimeUnit::Year => {
            let year = d.year() - d.year().rem_euclid(step.max(1) as i32);
            hms(date(year, 1, 1)?, 0, 0, 0)
        }
        TimeUnit::Microsecond | TimeUnit::Millisecond => Ok(local),
    }
}

/// Add `n` wall-clock units to a local time.
fn add_naive(local: NaiveDateTime, unit: TimeUnit, n: u32) -> Option<NaiveDateTime> {
    match unit {
        TimeUnit::Second => local.checked_add_signed(TimeDelta::seconds(i64::from(n))),
        TimeUnit::Minute => local.checked_add_signed(TimeDelta::minutes(i64::from(n))),
        TimeUnit::Hour => local.checked_add_signed(TimeDelta::hours(i64::from(n))),
        TimeUnit::Day => local.checked_add_days(Days::new(u64::from(n))),
        TimeUnit::Month => local.checked_add_months(Months::new(n)),
        TimeUnit::Year => local.checked_add_months(Months::new(n.checked_mul(12)?)),
        TimeUnit::Microsecond => local.checked_add_signed(TimeDelta::microseconds(i64::from(n))),
        TimeUnit::Millisecond => local.checked_add_signed(TimeDelta::milliseconds(i64::from(n))),
    }
}

/// Latest `step`-aligned boundary of `unit` at or before `us`.
pub fn floor<Tz: TimeZone>(tz: &Tz, us: i64, unit: TimeUnit, step: u32) -> Result<i64, GridError> {
    if let Some(len) = fixed_subsecond(unit) {
        let period = len * i64::from(step.max(1));
        return Ok(us - us.rem_euclid(period));
    }
    let local = to_local(tz, us)?.naive_local();
    let mut naive = floor_naive(local, unit, step)?;
    // A boundary pushed forward out of a gap can overshoot `us`; step back.
    for _ in 0..4 {
        let (early, late) = candidates(tz, naive)?;
        let resolved = if late <= us { late } else { early };
        if resolved <= us {
            return Ok(resolved);
        }
        naive = sub_naive(naive, unit, step).ok_or(GridError::OutOfRange { us })?;
    }
    Err(GridError::NoForwardProgress { at_us: us })
}

/// Whether `us` sits exactly on a `step`-aligned boundary of `unit`.
pub fn is_aligned<Tz: TimeZone>(tz: &Tz, us: i64, unit: TimeUnit, step: u32) -> Result<bool, GridError> {
    Ok(floor(tz, us, unit, step)? == us)
}

/// Calendar-safe addition of `n` units.
///
/// Units up to an hour are fixed lengths of absolute time. Days and longer
/// move on the local calendar and resolve at local midnight.
pub fn add<Tz: TimeZone>(tz: &Tz, us: i64, unit: TimeUnit, n: u32) -> Result<i64, GridError> {
    if let Some(len) = unit.fixed_us() {
        return len
            .checked_mul(i64::from(n))
            .and_then(|delta| us.checked_add(delta))
            .ok_or(GridError::OutOfRange { us });
    }
    let local = to_local(tz, us)?.naive_local();
    let midnight = local.date().and_time(chrono::NaiveTime::MIN);
    let next = add_naive(midnight, unit, n).ok_or(GridError::OutOfRange { us })?;
    Ok(candidates(tz, next)?.0)
}

/// The next `step`-aligned boundary strictly after the aligned boundary
/// `aligned_us`, stepping on the wall clock.
pub fn next_aligned<Tz: TimeZone>(
    tz: &Tz,
    aligned_us: i64,
    unit: TimeUnit,
    step: u32,
) -> Result<i64, GridError> {
    if let Some(len) = fixed_subsecond(unit) {
        let period = len * i64::from(step.max(1));
        return aligned_us
            .checked_add(period)
            .ok_or(GridError::OutOfRange { us: aligned_us });
    }
    let local = to_local(tz, aligned_us)?.naive_local();
    let mut naive = floor_naive(local, unit, step)?;
    for _ in 0..4 {
        naive = add_naive(naive, unit, step).ok_or(GridError::OutOfRange { us: aligned_us })?;
        let (early, late) = candidates(tz, naive)?;
        if early > aligned_us {
            return Ok(early);
        }
        if late > aligned_us {
            return Ok(late);
        }
    }
    Err(GridError::NoForwardProgress { at_us: aligned_us })
}

fn sub_naive(local: NaiveDateTime, unit: TimeUnit, n: u32) -> Option<NaiveDateTime> {
    match unit {
        TimeUnit::Day => local.checked_sub_days(Days::new(u64::from(n))),
        TimeUnit::Month => local.checked_sub_months(Months::new(n)),
        TimeUnit::Year => local.checked_sub_months(Months::new(n.checked_mul(12)?)),
        _ => {
            let len = unit.fixed_us()?;
            local.checked_sub_signed(TimeDelta::microseconds(len.checked_mul(i64::from(n))?))
        }
    }
}

/// Sub-second units align on absolute time; zone offsets are whole seconds.
fn fixed_subsecond(unit: TimeUnit) -> Option<i64> {
    match unit {
        TimeUnit::Microsecond | TimeUnit::Millisecond => unit.fixed_us(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::unit::{US_PER_DAY, US_PER_HOUR};
    use chrono_tz::America::New_York;

    fn ny(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        New_York
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .earliest()
            .map(|dt| dt.timestamp_micros())
            .unwrap_or_default()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0)
            .single()
            .map(|dt| dt.timestamp_micros())
            .unwrap_or_default()
    }

    #[test]
    fn floors_sub_second_units_on_absolute_time() {
        assert_eq!(floor(&Utc, 1_234_567, TimeUnit::Millisecond, 5), Ok(1_230_000));
        assert_eq!(floor(&Utc, -1, TimeUnit::Microsecond, 10), Ok(-10));
    }

    #[test]
    fn floors_months_and_years_to_aligned_starts() {
        let t = utc(2023, 8, 17, 13);
        assert_eq!(floor(&Utc, t, TimeUnit::Month, 3), Ok(utc(2023, 7, 1, 0)));
        assert_eq!(floor(&Utc, t, TimeUnit::Year, 10), Ok(utc(2020, 1, 1, 0)));
        assert_eq!(floor(&Utc, t, TimeUnit::Day, 5), Ok(utc(2023, 8, 16, 0)));
    }

    #[test]
    fn day_addition_follows_dst_length() {
        // 2024-03-10 is 23 hours long in New York, 2024-11-03 is 25.
        let before_spring = ny(2024, 3, 10, 0, 0);
        assert_eq!(
            add(&New_York, before_spring, TimeUnit::Day, 1),
            Ok(before_spring + 23 * US_PER_HOUR)
        );
        let before_fall = ny(2024, 11, 3, 0, 0);
        assert_eq!(
            add(&New_York, before_fall, TimeUnit::Day, 1),
            Ok(before_fall + 25 * US_PER_HOUR)
        );
    }

    #[test]
    fn month_addition_handles_variable_lengths() {
        let jan = utc(2024, 1, 1, 0);
        assert_eq!(add(&Utc, jan, TimeUnit::Month, 1), Ok(jan + 31 * US_PER_DAY));
        let feb = utc(2024, 2, 1, 0);
        assert_eq!(add(&Utc, feb, TimeUnit::Month, 1), Ok(feb + 29 * US_PER_DAY));
    }

    #[test]
    fn floor_inside_spring_gap_resolves_forward() {
        // 02:00-03:00 does not exist on 2024-03-10 in New York.
        let three_thirty = ny(2024, 3, 10, 3, 30);
        let floored = floor(&New_York, three_thirty, TimeUnit::Hour, 2);
        assert_eq!(floored, Ok(ny(2024, 3, 10, 3, 0)));
    }

    #[test]
    fn repeated_hour_has_boundaries_at_both_instants() {
        // 01:00-02:00 happens twice on 2024-11-03 in New York.
        let first_one = ny(2024, 11, 3, 1, 0);
        let second_one = first_one + US_PER_HOUR;
        assert_eq!(floor(&New_York, second_one + 60_000_000, TimeUnit::Hour, 1), Ok(second_one));
        assert_eq!(floor(&New_York, first_one + 60_000_000, TimeUnit::Hour, 1), Ok(first_one));
        // Walking the wall clock from 01:55 EDT lands on 02:00 EST.
        assert_eq!(
            next_aligned(&New_York, first_one + 55 * 60_000_000, TimeUnit::Minute, 5),
            Ok(second_one + US_PER_HOUR)
        );
        assert_eq!(
            next_aligned(&New_York, second_one, TimeUnit::Minute, 5),
            Ok(second_one + 5 * 60_000_000)
        );
    }

    #[test]
    fn next_aligned_steps_on_the_wall_clock() {
        // Fall back: 00:00 EDT + 3 wall-clock hours = 03:00 EST (4h later).
        let midnight = ny(2024, 11, 3, 0, 0);
        assert_eq!(
            next_aligned(&New_York, midnight, TimeUnit::Hour, 3),
            Ok(midnight + 4 * US_PER_HOUR)
        );
    }

    #[test]
    fn out_of_range_is_reported() {
        assert!(to_local(&Utc, i64::MAX).is_err());
    }
}
