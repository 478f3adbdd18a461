//! Incremental bin counting over a sorted timestamp series.
//!
//! Bins are queried left to right: each [`TimestampIndex::count`] call
//! closes the current bin at the given boundary. The cursor only moves
//! forward, so the next boundary is located by exponential search from the
//! cursor followed by a binary search of the bracketed run, which costs
//! `O(log d)` for `d` elements skipped instead of `O(log n)` per call.

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binning::BinSpec;
use crate::source::{SourceError, check_ascending};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("bin boundary {requested} is before the current bin start {current}")]
    NonMonotonic { requested: i64, current: i64 },
}

/// A non-empty histogram bin covering `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: i64,
    pub end: i64,
    pub count: usize,
}

impl HistogramBin {
    pub fn contains(&self, t: i64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Append-only bin counter over an immutable ascending timestamp array.
///
/// Only bins with a non-zero count are stored; gaps between stored bins are
/// zero-count regions.
#[derive(Debug)]
pub struct TimestampIndex {
    timestamps: Vec<i64>,
    /// Index of the first timestamp `>= bin_start`.
    cursor: usize,
    bin_start: i64,
    bins: Vec<HistogramBin>,
    max_count: usize,
    /// Bin returned by the previous reverse lookup.
    last_bin: Cell<usize>,
}

impl TimestampIndex {
    /// Build an index over `timestamps`. Sortedness is the caller's
    /// responsibility; use [`TimestampIndex::try_new`] for untrusted input.
    pub fn new(timestamps: Vec<i64>) -> Self {
        let bin_start = timestamps.first().copied().unwrap_or(0);
        Self {
            timestamps,
            cursor: 0,
            bin_start,
            bins: Vec::new(),
            max_count: 0,
            last_bin: Cell::new(0),
        }
    }

    /// Like [`TimestampIndex::new`] but rejects descending input.
    pub fn try_new(timestamps: Vec<i64>) -> Result<Self, SourceError> {
        check_ascending(&timestamps)?;
        Ok(Self::new(timestamps))
    }

    /// Number of timestamps in the series.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    /// Start of the bin the next [`TimestampIndex::count`] call closes.
    pub fn bin_start(&self) -> i64 {
        self.bin_start
    }

    /// Materialized (non-empty) bins in ascending order.
    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    /// Largest count among the materialized bins (0 when there are none).
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Count the timestamps in `[bin_start, next)` and start the next bin at
    /// `next`. Fails if `next` lies before the current bin start.
    pub fn count(&mut self, next: i64) -> Result<usize, IndexError> {
        if next < self.bin_start {
            return Err(IndexError::NonMonotonic {
                requested: next,
                current: self.bin_start,
            });
        }
        let end = self.seek_forward(next);
        let count = end - self.cursor;
        if count > 0 {
            self.bins.push(HistogramBin {
                start: self.bin_start,
                end: next,
                count,
            });
            self.max_count = self.max_count.max(count);
        }
        self.cursor = end;
        self.bin_start = next;
        Ok(count)
    }

    /// Drop all bins and restart counting at `initial`.
    ///
    /// The cursor may move backwards here, so it is repositioned with a
    /// binary search over the whole series.
    pub fn reset(&mut self, initial: i64) {
        self.bins.clear();
        self.max_count = 0;
        self.last_bin.set(0);
        self.bin_start = initial;
        self.cursor = self.timestamps.partition_point(|&t| t < initial);
    }

    /// Recount the series into the bins described by `layout`.
    pub fn rebin(&mut self, layout: &BinSpec) -> Result<(), IndexError> {
        self.reset(layout.start);
        for boundary in layout.boundaries() {
            self.count(boundary)?;
        }
        tracing::debug!(
            width_us = layout.width,
            bins = layout.bins,
            non_empty = self.bins.len(),
            max_count = self.max_count,
            "rebinned timestamps"
        );
        Ok(())
    }

    /// Find the stored bin containing `t`.
    ///
    /// Searches outward from the bin found by the previous call, which keeps
    /// sequential hover movement cheap. Returns `None` for zero-count gaps
    /// and for times outside every bin.
    pub fn find_bin_for_timestamp(&self, t: i64) -> Option<HistogramBin> {
        let bins = &self.bins;
        if bins.is_empty() {
            return None;
        }
        let cached = self.last_bin.get().min(bins.len() - 1);
        let current = bins[cached];

        let found = if t >= current.end {
            self.search_forward(cached, t)
        } else if t < current.start {
            self.search_backward(cached, t)
        } else {
            cached
        };
        let found = found.min(bins.len() - 1);
        self.last_bin.set(found);

        let bin = bins[found];
        bin.contains(t).then_some(bin)
    }

    /// Largest bin count over the whole series when bins are `width` wide
    /// and aligned to multiples of `width`.
    ///
    /// Only occupied bins are visited, each with one galloping search, so
    /// the cost is `O(k log d)` for `k` occupied bins rather than a walk
    /// over every empty bin between them.
    pub fn peak_count(&self, width: i64) -> usize {
        let ts = &self.timestamps;
        if width <= 0 {
            return ts.len();
        }
        let mut peak = 0;
        let mut i = 0;
        while i < ts.len() {
            let end = ts[i].div_euclid(width).saturating_add(1).saturating_mul(width);
            let j = gallop(ts, i, end).max(i + 1);
            peak = peak.max(j - i);
            i = j;
        }
        peak
    }

    /// First index `>= cursor` whose timestamp is `>= target`.
    fn seek_forward(&self, target: i64) -> usize {
        gallop(&self.timestamps, self.cursor, target)
    }

    /// First bin after `from` whose end is beyond `t`; `bins.len()` if none.
    fn search_forward(&self, from: usize, t: i64) -> usize {
        let bins = &self.bins;
        // Invariant: bins[from + bound / 2].end <= t.
        let mut bound = 1;
        while from + bound < bins.len() && bins[from + bound].end <= t {
            bound *= 2;
        }
        let lo = from + bound / 2 + 1;
        let hi = (from + bound).min(bins.len());
        lo + bins[lo..hi].partition_point(|b| b.end <= t)
    }

    /// Last bin before `from` starting at or before `t`; 0 if none.
    fn search_backward(&self, from: usize, t: i64) -> usize {
        let bins = &self.bins;
        // Invariant: bins[from - bound / 2].start > t.
        let mut bound = 1;
        while bound <= from && bins[from - bound].start > t {
            bound *= 2;
        }
        let lo = from.saturating_sub(bound);
        let hi = from - bound / 2;
        let first_after = lo + bins[lo..hi].partition_point(|b| b.start <= t);
        first_after.saturating_sub(1)
    }
}

/// First index `>= from` in the ascending slice `ts` whose value is
/// `>= target`.
fn gallop(ts: &[i64], from: usize, target: i64) -> usize {
    if from >= ts.len() || ts[from] >= target {
        return from;
    }
    // Invariant: ts[from + bound / 2] < target.
    let mut bound = 1;
    while from + bound < ts.len() && ts[from + bound] < target {
        bound *= 2;
    }
    let lo = from + bound / 2 + 1;
    let hi = (from + bound).min(ts.len());
    lo + ts[lo..hi].partition_point(|&t| t < target)
}
