use serde::{Deserialize, Serialize};

/// Half-open time window `[start, end)` in microseconds.
///
/// Kept in floating point so anchor-preserving zoom math does not
/// accumulate rounding; timestamps themselves are integral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Range covering the integral timestamps `first..=last`.
    pub fn covering(first: i64, last: i64) -> Self {
        Self::new(first as f64, last as f64 + 1.0)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    pub fn shifted(&self, delta: f64) -> Self {
        Self::new(self.start + delta, self.end + delta)
    }

    /// Valid ranges are finite and strictly increasing.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.end > self.start
    }

    /// Integral window `[floor(start), ceil(end))`.
    pub fn to_micros(&self) -> (i64, i64) {
        (self.start.floor() as i64, self.end.ceil() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covering_includes_last_timestamp() {
        let r = TimeRange::covering(1_000, 5_000);
        assert!(r.contains(5_000.0));
        assert!(!r.contains(5_001.0));
        assert_eq!(r.duration(), 4_001.0);
    }

    #[test]
    fn shifted_preserves_duration() {
        let r = TimeRange::new(10.0, 30.0).shifted(-15.0);
        assert_eq!(r, TimeRange::new(-5.0, 15.0));
        assert!(r.is_valid());
        assert!(!TimeRange::new(3.0, 3.0).is_valid());
    }

    #[test]
    fn to_micros_widens_to_whole_microseconds() {
        assert_eq!(TimeRange::new(10.4, 20.2).to_micros(), (10, 21));
        assert_eq!(TimeRange::new(-1.5, 3.0).to_micros(), (-2, 3));
    }
}
