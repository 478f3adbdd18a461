use std::fmt::{self, Write as _};

use chrono::{NaiveDate, TimeZone};
use timeline_protocol::SharedStr;

use super::calendar;
use super::unit::{TimeUnit, UnitTable};
use super::{GridError, GridLine, LabelMetrics};
use crate::config::GridConfig;
use crate::range::TimeRange;

/// A chosen unit and multiplier, e.g. "15 minutes".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Row of the unit table.
    pub unit_index: usize,
    pub unit: TimeUnit,
    pub step: u32,
    /// Shortest real length of one step.
    pub min_duration_us: i64,
}

/// Chooses grid spacing for a zoom window and walks calendar boundaries.
#[derive(Debug, Clone)]
pub struct GridPlanner<Tz: TimeZone> {
    tz: Tz,
    units: UnitTable,
    max_label_px: f64,
    /// Minimum distance between rendered labels.
    pitch_px: f64,
    max_lines: usize,
    interval: Option<Interval>,
    pitch_us: f64,
}

impl<Tz> GridPlanner<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    /// Measures the widest label any unit can produce once, up front.
    pub fn new(tz: Tz, config: &GridConfig, metrics: &dyn LabelMetrics) -> Self {
        let max_label_px = widest_label(&config.units, metrics);
        let pitch_px = config
            .min_interval_px
            .max(max_label_px + config.label_margin_px);
        Self {
            tz,
            units: config.units.clone(),
            max_label_px,
            pitch_px,
            max_lines: config.max_lines,
            interval: None,
            pitch_us: 0.0,
        }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn max_label_px(&self) -> f64 {
        self.max_label_px
    }

    pub fn pitch_px(&self) -> f64 {
        self.pitch_px
    }

    /// Interval chosen by the last successful [`GridPlanner::update_zoom`].
    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }

    /// Pick the smallest unit and multiplier whose shortest real length
    /// covers the label pitch at this zoom.
    pub fn update_zoom(&mut self, zoom: TimeRange, width_px: f64) -> Result<Interval, GridError> {
        if !zoom.is_valid() || !(width_px > 0.0 && width_px.is_finite()) {
            self.interval = None;
            return Err(GridError::InvalidWindow);
        }
        let required_us = self.pitch_px * zoom.duration() / width_px;

        let mut best: Option<Interval> = None;
        for (unit_index, spec) in self.units.units().iter().enumerate() {
            for &step in &spec.intervals {
                let duration = spec.min_duration_us.saturating_mul(i64::from(step));
                if (duration as f64) < required_us {
                    continue;
                }
                if best.is_none_or(|b| duration < b.min_duration_us) {
                    best = Some(Interval {
                        unit_index,
                        unit: spec.unit,
                        step,
                        min_duration_us: duration,
                    });
                }
            }
        }

        let Some(interval) = best else {
            self.interval = None;
            return Err(GridError::NoSuitableInterval { required_us });
        };
        tracing::trace!(
            unit = ?interval.unit,
            step = interval.step,
            required_us,
            "selected grid interval"
        );
        self.interval = Some(interval);
        self.pitch_us = required_us;
        Ok(interval)
    }

    /// Lazily produce grid lines covering `zoom`.
    ///
    /// The first line is at or before the window start and the last is the
    /// first line at or after the window end. Errors stop the iteration and
    /// are available from [`GridLines::error`] afterwards.
    pub fn generate(&self, zoom: TimeRange) -> GridLines<'_, Tz> {
        let (start_us, end_us) = zoom.to_micros();
        let mut lines = GridLines {
            planner: self,
            interval: self.interval,
            next: None,
            end: end_us,
            emitted: 0,
            last_label: None,
            error: None,
        };
        match self.interval {
            None => lines.error = Some(GridError::NotPlanned),
            Some(iv) if zoom.is_valid() => {
                match calendar::floor(&self.tz, start_us, iv.unit, iv.step) {
                    Ok(first) => lines.next = Some(first),
                    Err(e) => lines.error = Some(e),
                }
            }
            Some(_) => lines.error = Some(GridError::InvalidWindow),
        }
        lines
    }

    fn larger_unit(&self, interval: Interval) -> Option<TimeUnit> {
        self.units.get(interval.unit_index + 1).map(|s| s.unit)
    }

    /// Advance `step` units with calendar addition, then realign.
    ///
    /// Around DST transitions the sum can land off the step grid; both the
    /// aligned boundary at or before it and the next aligned one are tried,
    /// and the first that still moves forward wins. Inside a repeated hour
    /// this reaches the second instant of a boundary, which the wall clock
    /// alone skips.
    fn advance(&self, t: i64, unit: TimeUnit, step: u32) -> Result<i64, GridError> {
        let sum = calendar::add(&self.tz, t, unit, step)?;
        let back = calendar::floor(&self.tz, sum, unit, step)?;
        if back > t {
            return Ok(back);
        }
        let forward = calendar::next_aligned(&self.tz, back, unit, step)?;
        if forward > t {
            Ok(forward)
        } else {
            Err(GridError::NoForwardProgress { at_us: t })
        }
    }

    fn format(&self, t: i64, unit_index: usize) -> Result<SharedStr, GridError> {
        let local = calendar::to_local(&self.tz, t)?;
        let Some(spec) = self.units.get(unit_index) else {
            return Ok(SharedStr::empty());
        };
        let mut label = String::new();
        if write!(label, "{}", local.format(&spec.format)).is_err() {
            label.clear();
        }
        Ok(SharedStr::from(label))
    }

    /// Highest unit boundary `t` lands on, at or above `from`.
    fn highest_aligned(&self, t: i64, from: usize) -> Result<usize, GridError> {
        for index in (from..self.units.len()).rev() {
            let Some(spec) = self.units.get(index) else {
                continue;
            };
            if calendar::is_aligned(&self.tz, t, spec.unit, 1)? {
                return Ok(index);
            }
        }
        Ok(from)
    }

    fn line(&self, t: i64, iv: Interval, last_label: Option<i64>) -> Result<GridLine, GridError> {
        let larger = self.larger_unit(iv);
        let major = match larger {
            Some(unit) => calendar::is_aligned(&self.tz, t, unit, 1)?,
            None => false,
        };
        if major {
            let index = self.highest_aligned(t, iv.unit_index + 1)?;
            return Ok(GridLine {
                major,
                time_us: t,
                label: self.format(t, index)?,
            });
        }

        let crowded_behind = last_label.is_some_and(|l| ((t - l) as f64) < self.pitch_us);
        let crowded_ahead = match larger {
            Some(unit) => {
                let boundary = calendar::floor(&self.tz, t, unit, 1)?;
                let upcoming = self.advance(boundary, unit, 1)?;
                ((upcoming - t) as f64) < self.pitch_us
            }
            None => false,
        };
        let label = if crowded_behind || crowded_ahead {
            SharedStr::empty()
        } else {
            self.format(t, iv.unit_index)?
        };
        Ok(GridLine {
            major,
            time_us: t,
            label,
        })
    }
}

/// Lazy grid-line sequence from [`GridPlanner::generate`].
#[derive(Debug)]
pub struct GridLines<'a, Tz: TimeZone> {
    planner: &'a GridPlanner<Tz>,
    interval: Option<Interval>,
    next: Option<i64>,
    end: i64,
    emitted: usize,
    last_label: Option<i64>,
    error: Option<GridError>,
}

impl<Tz: TimeZone> GridLines<'_, Tz> {
    /// Why iteration stopped early, if it did.
    pub fn error(&self) -> Option<&GridError> {
        self.error.as_ref()
    }

    pub fn into_error(self) -> Option<GridError> {
        self.error
    }
}

impl<Tz> Iterator for GridLines<'_, Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    type Item = GridLine;

    fn next(&mut self) -> Option<GridLine> {
        let t = self.next.take()?;
        let iv = self.interval?;
        if self.emitted >= self.planner.max_lines {
            tracing::warn!(cap = self.planner.max_lines, "grid line cap reached");
            self.error = Some(GridError::IterationCap {
                cap: self.planner.max_lines,
            });
            return None;
        }

        let line = match self.planner.line(t, iv, self.last_label) {
            Ok(line) => line,
            Err(e) => {
                self.error = Some(e);
                return None;
            }
        };
        if !line.label.is_empty() {
            self.last_label = Some(t);
        }
        self.emitted += 1;

        if t < self.end {
            match self.planner.advance(t, iv.unit, iv.step) {
                Ok(next) => self.next = Some(next),
                Err(e) => {
                    tracing::warn!(at_us = t, error = %e, "grid generation stopped");
                    self.error = Some(e);
                }
            }
        }
        Some(line)
    }
}

/// Widest rendering of every unit's format on a sample date chosen to
/// maximise digit and month-name widths.
fn widest_label(units: &UnitTable, metrics: &dyn LabelMetrics) -> f64 {
    let Some(sample) = NaiveDate::from_ymd_opt(2000, 12, 28)
        .and_then(|d| d.and_hms_micro_opt(23, 59, 59, 999_999))
    else {
        return 0.0;
    };
    units
        .units()
        .iter()
        .map(|spec| {
            let mut text = String::new();
            if write!(text, "{}", sample.format(&spec.format)).is_err() {
                text = spec.format.clone();
            }
            metrics.text_width(&text)
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::unit::UnitSpec;
    use crate::grid::{FixedWidthMetrics, US_PER_DAY, US_PER_HOUR, US_PER_SECOND};
    use chrono::Utc;
    use chrono_tz::America::New_York;

    const NO_TEXT: FixedWidthMetrics = FixedWidthMetrics { char_width: 0.0 };

    fn planner() -> GridPlanner<Utc> {
        GridPlanner::new(Utc, &GridConfig::default(), &NO_TEXT)
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0)
            .single()
            .map(|dt| dt.timestamp_micros())
            .unwrap_or_default()
    }

    fn lines<Tz>(planner: &GridPlanner<Tz>, zoom: TimeRange) -> Vec<GridLine>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut iter = planner.generate(zoom);
        let out: Vec<GridLine> = iter.by_ref().collect();
        assert_eq!(iter.error(), None);
        out
    }

    #[test]
    fn one_second_on_a_narrow_surface_steps_in_milliseconds() {
        let mut p = planner();
        let iv = p.update_zoom(TimeRange::new(0.0, 1_000_000.0), 100.0);
        let iv = match iv {
            Ok(iv) => iv,
            Err(e) => panic!("no interval: {e}"),
        };
        assert_eq!(iv.unit, TimeUnit::Millisecond);
        assert_eq!(iv.step, 1000);
    }

    #[test]
    fn label_width_widens_the_pitch() {
        let wide = FixedWidthMetrics { char_width: 10.0 };
        let p = GridPlanner::new(Utc, &GridConfig::default(), &wide);
        // "23:59:59.999999" is the longest default label.
        assert_eq!(p.max_label_px(), 150.0);
        assert_eq!(p.pitch_px(), 158.0);
    }

    #[test]
    fn rejects_windows_no_unit_can_cover() {
        let mut p = planner();
        let huge = 5_000.0 * 365.0 * US_PER_DAY as f64;
        assert!(matches!(
            p.update_zoom(TimeRange::new(0.0, huge), 10.0),
            Err(GridError::NoSuitableInterval { .. })
        ));
        assert_eq!(p.interval(), None);
        assert_eq!(
            p.update_zoom(TimeRange::new(0.0, 1.0), 0.0),
            Err(GridError::InvalidWindow)
        );
    }

    #[test]
    fn generate_before_planning_reports_error() {
        let p = planner();
        let mut iter = p.generate(TimeRange::new(0.0, 10.0));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.error(), Some(&GridError::NotPlanned));
    }

    #[test]
    fn lines_bracket_the_window() {
        let mut p = planner();
        let zoom = TimeRange::new(utc(2024, 1, 1, 3) as f64 + 1.0, utc(2024, 1, 1, 21) as f64);
        assert!(p.update_zoom(zoom, 800.0).is_ok());
        let out = lines(&p, zoom);
        assert!(out.len() >= 2);
        assert!(out[0].time_us as f64 <= zoom.start);
        let last = out[out.len() - 1].time_us as f64;
        assert!(last >= zoom.end);
        assert!(out[out.len() - 2].time_us as f64 <= zoom.end);
        assert!(out.windows(2).all(|w| w[0].time_us < w[1].time_us));
    }

    #[test]
    fn month_lines_follow_calendar_lengths() {
        let mut p = planner();
        let zoom = TimeRange::new(utc(2023, 12, 15, 0) as f64, utc(2024, 6, 15, 0) as f64);
        let iv = p.update_zoom(zoom, 800.0);
        assert!(matches!(iv, Ok(Interval { unit: TimeUnit::Month, step: 1, .. })));
        let out = lines(&p, zoom);
        let times: Vec<i64> = out.iter().map(|l| l.time_us).collect();
        assert_eq!(times[0], utc(2023, 12, 1, 0));
        assert_eq!(times[1], utc(2024, 1, 1, 0));
        assert_eq!(times[2], utc(2024, 2, 1, 0));
        assert_eq!(times[3] - times[2], 29 * US_PER_DAY);
        // New year is a major line and shows the year.
        assert!(out[1].major);
        assert_eq!(out[1].label, "2024");
        assert!(!out[2].major);
        assert_eq!(out[2].label, "Feb");
    }

    #[test]
    fn major_label_uses_highest_aligned_unit() {
        let mut p = planner();
        let midnight = utc(2024, 1, 1, 0);
        let zoom = TimeRange::new((midnight - 30 * US_PER_SECOND) as f64, (midnight + 30 * US_PER_SECOND) as f64);
        assert!(p.update_zoom(zoom, 800.0).is_ok());
        let out = lines(&p, zoom);
        let at_midnight = out.iter().find(|l| l.time_us == midnight);
        assert!(matches!(at_midnight, Some(l) if l.major && l.label == "2024"));
    }

    #[test]
    fn minor_label_before_close_major_is_suppressed() {
        // Five-day steps put the 31st one day before the 1st.
        let mut p = planner();
        let zoom = TimeRange::new(utc(2024, 7, 20, 0) as f64, utc(2024, 8, 29, 0) as f64);
        let iv = p.update_zoom(zoom, 800.0);
        assert!(matches!(iv, Ok(Interval { unit: TimeUnit::Day, step: 5, .. })));
        let out = lines(&p, zoom);
        let jul31 = out.iter().find(|l| l.time_us == utc(2024, 7, 31, 0));
        assert!(matches!(jul31, Some(l) if l.label.is_empty()));
        let aug1 = out.iter().find(|l| l.time_us == utc(2024, 8, 1, 0));
        assert!(matches!(aug1, Some(l) if l.major && l.label == "Aug"));
    }

    #[test]
    fn hours_stay_ascending_across_spring_forward() {
        let mut p = GridPlanner::new(New_York, &GridConfig::default(), &NO_TEXT);
        let start = New_York
            .with_ymd_and_hms(2024, 3, 9, 20, 0, 0)
            .single()
            .map(|d| d.timestamp_micros())
            .unwrap_or_default();
        let zoom = TimeRange::new(start as f64, (start + 12 * US_PER_HOUR) as f64);
        let iv = p.update_zoom(zoom, 800.0);
        assert!(matches!(iv, Ok(Interval { unit: TimeUnit::Hour, .. })));
        let out = lines(&p, zoom);
        assert!(out.windows(2).all(|w| w[0].time_us < w[1].time_us));
        let midnight = out.iter().find(|l| l.major);
        assert!(matches!(midnight, Some(l) if l.label == "Mar 10"));
    }

    #[test]
    fn repeated_hour_is_walked_twice_on_fall_back() {
        let mut p = GridPlanner::new(New_York, &GridConfig::default(), &NO_TEXT);
        let start = New_York
            .with_ymd_and_hms(2024, 11, 3, 0, 30, 0)
            .single()
            .map(|d| d.timestamp_micros())
            .unwrap_or_default();
        let zoom = TimeRange::new(start as f64, (start + 3 * US_PER_HOUR) as f64);
        let iv = p.update_zoom(zoom, 800.0);
        assert!(matches!(iv, Ok(Interval { unit: TimeUnit::Minute, step: 30, .. })));
        let out = lines(&p, zoom);
        assert_eq!(out.len(), 7);
        assert!(out.windows(2).all(|w| w[1].time_us - w[0].time_us == 30 * 60_000_000));
        let majors: Vec<&str> = out.iter().filter(|l| l.major).map(|l| l.label.as_str()).collect();
        assert_eq!(majors, vec!["01:00", "01:00", "02:00"]);
    }

    #[test]
    fn crowding_inside_repeated_hour_uses_the_real_next_hour() {
        // 25-minute steps leave a line ten minutes before each hour.
        let row = |unit, min_duration_us, intervals: &[u32], format: &str| UnitSpec {
            unit,
            min_duration_us,
            intervals: intervals.to_vec(),
            format: format.to_string(),
        };
        let units = UnitTable::new(vec![
            row(TimeUnit::Minute, 60 * US_PER_SECOND, &[25], "%H:%M"),
            row(TimeUnit::Hour, US_PER_HOUR, &[1], "%H:%M"),
            row(TimeUnit::Day, 23 * US_PER_HOUR, &[1], "%b %d"),
        ]);
        let units = match units {
            Ok(units) => units,
            Err(e) => panic!("{e}"),
        };
        let config = GridConfig {
            units,
            ..GridConfig::default()
        };
        let mut p = GridPlanner::new(New_York, &config, &NO_TEXT);
        let first_one = New_York
            .with_ymd_and_hms(2024, 11, 3, 1, 0, 0)
            .earliest()
            .map(|d| d.timestamp_micros())
            .unwrap_or_default();
        let minute = 60 * US_PER_SECOND;
        let zoom = TimeRange::new((first_one - 30 * minute) as f64, (first_one + 150 * minute) as f64);
        let iv = p.update_zoom(zoom, 800.0);
        assert!(matches!(iv, Ok(Interval { unit: TimeUnit::Minute, step: 25, .. })));

        let out = lines(&p, zoom);
        let at = |t: i64| out.iter().find(|l| l.time_us == t);
        // 01:25 EDT has room before 01:00 EST.
        assert!(matches!(at(first_one + 25 * minute), Some(l) if l.label == "01:25"));
        // 01:50 EDT is ten minutes before the second 01:00.
        assert!(matches!(at(first_one + 50 * minute), Some(l) if l.label.is_empty()));
        assert!(matches!(at(first_one + 60 * minute), Some(l) if l.major && l.label == "01:00"));
        assert!(matches!(at(first_one + 110 * minute), Some(l) if l.label.is_empty()));
    }

    #[test]
    fn cap_truncates_and_reports() {
        let config = GridConfig {
            max_lines: 3,
            ..GridConfig::default()
        };
        let mut p = GridPlanner::new(Utc, &config, &NO_TEXT);
        let zoom = TimeRange::new(0.0, 1_000_000.0);
        assert!(p.update_zoom(zoom, 10_000.0).is_ok());
        let mut iter = p.generate(zoom);
        assert_eq!(iter.by_ref().count(), 3);
        assert_eq!(iter.error(), Some(&GridError::IterationCap { cap: 3 }));
    }
}
