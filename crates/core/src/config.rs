//! Tunables for the timeline surface, loadable from JSON.
//!
//! Every section defaults independently, so a config file only needs the
//! keys it changes:
//!
//! ```json
//! { "grid": { "min_interval_px": 100 }, "histogram": { "binning": { "adaptive": { "bar_px": 4 } } } }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{GridError, US_PER_DAY, UnitTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
    #[error(transparent)]
    Units(#[from] GridError),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub viewport: ViewportConfig,
    pub grid: GridConfig,
    pub histogram: HistogramConfig,
    pub indicators: IndicatorConfig,
    pub tooltip: TooltipConfig,
    /// Pointer travel below which a press and release count as a click.
    pub click_slop_px: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub zoom_factor: f64,
    /// Normalized wheel pixels per zoom step.
    pub wheel_scale: f64,
    pub line_height_px: f64,
    pub page_height_px: f64,
    pub max_px_per_us: f64,
    pub max_duration_us: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom_factor: 0.1,
            wheel_scale: 100.0,
            line_height_px: 16.0,
            page_height_px: 800.0,
            max_px_per_us: 1.0,
            max_duration_us: 50.0 * 365.25 * US_PER_DAY as f64,
        }
    }
}

impl ViewportConfig {
    /// Shortest zoom window at `width_px`.
    pub fn min_duration_us(&self, width_px: f64) -> f64 {
        (width_px / self.max_px_per_us).max(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub min_interval_px: f64,
    pub label_margin_px: f64,
    pub max_lines: usize,
    pub axis_height_px: f64,
    pub units: UnitTable,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_interval_px: 80.0,
            label_margin_px: 8.0,
            max_lines: 10_000,
            axis_height_px: 20.0,
            units: UnitTable::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binning {
    /// `bins` equal-width bins over the full data range.
    Fixed { bins: usize },
    /// Bins about `bar_px` wide at the current zoom.
    Adaptive { bar_px: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub binning: Binning,
    /// Height fraction of a bin holding a single event.
    pub single_event_fraction: f64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            binning: Binning::Fixed { bins: 200 },
            single_event_fraction: 0.15,
        }
    }
}

/// Palette slot for each indicator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub hover: u8,
    pub selection: u8,
    pub visible_range: u8,
    pub external_range: u8,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            hover: 0,
            selection: 1,
            visible_range: 2,
            external_range: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
    pub width_px: f64,
    pub height_px: f64,
    pub arrow_px: f64,
    pub font_size: f32,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            width_px: 220.0,
            height_px: 52.0,
            arrow_px: 6.0,
            font_size: 11.0,
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            grid: GridConfig::default(),
            histogram: HistogramConfig::default(),
            indicators: IndicatorConfig::default(),
            tooltip: TooltipConfig::default(),
            click_slop_px: 3.0,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected: "positive",
            value,
        })
    }
}

impl TimelineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.viewport;
        if !(v.zoom_factor > 0.0 && v.zoom_factor < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "viewport.zoom_factor",
                expected: "in (0, 1)",
                value: v.zoom_factor,
            });
        }
        positive("viewport.wheel_scale", v.wheel_scale)?;
        positive("viewport.line_height_px", v.line_height_px)?;
        positive("viewport.page_height_px", v.page_height_px)?;
        positive("viewport.max_px_per_us", v.max_px_per_us)?;
        positive("viewport.max_duration_us", v.max_duration_us)?;

        let g = &self.grid;
        positive("grid.min_interval_px", g.min_interval_px)?;
        if g.label_margin_px.is_nan() || g.label_margin_px < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "grid.label_margin_px",
                expected: "non-negative",
                value: g.label_margin_px,
            });
        }
        positive("grid.max_lines", g.max_lines as f64)?;
        positive("grid.axis_height_px", g.axis_height_px)?;
        g.units.validate()?;

        match self.histogram.binning {
            Binning::Fixed { bins } => positive("histogram.binning.bins", bins as f64)?,
            Binning::Adaptive { bar_px } => positive("histogram.binning.bar_px", bar_px)?,
        }
        let fraction = self.histogram.single_event_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConfigError::OutOfRange {
                field: "histogram.single_event_fraction",
                expected: "in [0, 1]",
                value: fraction,
            });
        }

        positive("tooltip.width_px", self.tooltip.width_px)?;
        positive("tooltip.height_px", self.tooltip.height_px)?;
        if self.click_slop_px.is_nan() || self.click_slop_px < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "click_slop_px",
                expected: "non-negative",
                value: self.click_slop_px,
            });
        }
        Ok(())
    }
}
