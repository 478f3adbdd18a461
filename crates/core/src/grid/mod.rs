//! Calendar-aware grid lines for the time axis.
//!
//! [`GridPlanner`] picks a unit and multiplier from a [`UnitTable`] so that
//! labels never crowd each other at the current zoom, then walks real
//! calendar boundaries in a time zone to produce [`GridLine`]s lazily.

mod calendar;
mod planner;
mod unit;

use thiserror::Error;
use timeline_protocol::SharedStr;

pub use planner::{GridLines, GridPlanner, Interval};
pub use unit::{
    TimeUnit, US_PER_DAY, US_PER_HOUR, US_PER_MINUTE, US_PER_MS, US_PER_SECOND, UnitSpec,
    UnitTable,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GridError {
    #[error("no configured unit spans {required_us} us; clamp the zoom-out duration")]
    NoSuitableInterval { required_us: f64 },
    #[error("grid generation stopped after {cap} lines")]
    IterationCap { cap: usize },
    #[error("grid did not advance past {at_us}")]
    NoForwardProgress { at_us: i64 },
    #[error("timestamp {us} is outside the supported calendar range")]
    OutOfRange { us: i64 },
    #[error("zoom window or pixel width is empty")]
    InvalidWindow,
    #[error("grid lines requested before a zoom was planned")]
    NotPlanned,
    #[error("invalid unit table: {0}")]
    InvalidTable(String),
}

/// One vertical grid line.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLine {
    /// Lands on a boundary of the next larger configured unit.
    pub major: bool,
    pub time_us: i64,
    /// Empty when suppressed to keep labels apart.
    pub label: SharedStr,
}

/// Text measurement supplied by the renderer.
pub trait LabelMetrics {
    fn text_width(&self, text: &str) -> f64;
}

/// Monospace approximation, used by the terminal front end and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWidthMetrics {
    pub char_width: f64,
}

impl LabelMetrics for FixedWidthMetrics {
    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width
    }
}
