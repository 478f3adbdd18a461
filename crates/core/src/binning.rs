//! Bin boundary plans fed to [`crate::index::TimestampIndex::rebin`].

use serde::{Deserialize, Serialize};

use crate::range::TimeRange;

/// Upper bound on bins produced by an adaptive plan.
const MAX_ADAPTIVE_BINS: usize = 100_000;

/// `bins` consecutive bins of `width` µs starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinSpec {
    pub start: i64,
    pub width: i64,
    pub bins: usize,
}

impl BinSpec {
    /// `bins` equal-width bins covering the integral range `first..=last`.
    pub fn equal_width(first: i64, last: i64, bins: usize) -> Self {
        if bins == 0 || last < first {
            return Self {
                start: first,
                width: 1,
                bins: 0,
            };
        }
        let span = (last - first).saturating_add(1);
        let n = bins as i64;
        let width = ((span + n - 1) / n).max(1);
        Self {
            start: first,
            width,
            bins,
        }
    }

    /// Bins roughly `bar_px` wide at the current zoom, restricted to the
    /// data range.
    ///
    /// The width is snapped to a 1-2-5 ladder and the start aligned to a
    /// multiple of the width, so small pans and zooms reuse the same plan.
    pub fn adaptive(zoom: TimeRange, data: TimeRange, width_px: f64, bar_px: f64) -> Self {
        let raw = if width_px > 0.0 {
            zoom.duration() * bar_px / width_px
        } else {
            zoom.duration()
        };
        let width = nice_width(raw);
        let lo = zoom.start.max(data.start).floor() as i64;
        let hi = zoom.end.min(data.end).ceil() as i64;
        let start = lo.div_euclid(width) * width;
        if hi <= start {
            return Self {
                start,
                width,
                bins: 0,
            };
        }
        let bins = (hi - start + width - 1) / width;
        Self {
            start,
            width,
            bins: (bins as usize).min(MAX_ADAPTIVE_BINS),
        }
    }

    /// Exclusive end of the last bin.
    pub fn end(&self) -> i64 {
        self.start
            .saturating_add(self.width.saturating_mul(self.bins as i64))
    }

    /// Right edge of every bin, ascending.
    pub fn boundaries(&self) -> impl Iterator<Item = i64> + '_ {
        (1..=self.bins as i64).map(move |k| self.start.saturating_add(self.width.saturating_mul(k)))
    }
}

/// Smallest value of the form `{1, 2, 5} × 10^k` µs that is `>= raw`.
fn nice_width(raw: f64) -> i64 {
    if !raw.is_finite() || raw <= 1.0 {
        return 1;
    }
    let mut magnitude: i64 = 1;
    loop {
        for factor in [1, 2, 5] {
            let candidate = magnitude.saturating_mul(factor);
            if candidate as f64 >= raw || candidate == i64::MAX {
                return candidate;
            }
        }
        magnitude = magnitude.saturating_mul(10);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_width_covers_last_timestamp() {
        let spec = BinSpec::equal_width(0, 99, 10);
        assert_eq!(spec.width, 10);
        assert_eq!(spec.end(), 100);

        let spec = BinSpec::equal_width(0, 100, 10);
        assert_eq!(spec.width, 11);
        assert!(spec.end() > 100);
        assert_eq!(spec.boundaries().count(), 10);
    }

    #[test]
    fn equal_width_single_timestamp() {
        let spec = BinSpec::equal_width(42, 42, 5);
        assert_eq!(spec.width, 1);
        assert_eq!(spec.boundaries().last(), Some(47));
    }

    #[test]
    fn nice_width_ladder() {
        assert_eq!(nice_width(0.3), 1);
        assert_eq!(nice_width(3.0), 5);
        assert_eq!(nice_width(11.0), 20);
        assert_eq!(nice_width(500.0), 500);
        assert_eq!(nice_width(501.0), 1_000);
    }

    #[test]
    fn adaptive_is_aligned_and_clipped_to_data() {
        let zoom = TimeRange::new(-1_000.0, 10_000.0);
        let data = TimeRange::new(1_234.0, 50_000.0);
        let spec = BinSpec::adaptive(zoom, data, 110.0, 10.0);
        assert_eq!(spec.width, 1_000);
        assert_eq!(spec.start, 1_000);
        assert_eq!(spec.end(), 10_000);
    }

    #[test]
    fn adaptive_outside_data_is_empty() {
        let spec = BinSpec::adaptive(
            TimeRange::new(0.0, 100.0),
            TimeRange::new(500.0, 600.0),
            100.0,
            4.0,
        );
        assert_eq!(spec.bins, 0);
    }
}
