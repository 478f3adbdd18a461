//! Zoom state and time/pixel projection.
//!
//! [`ViewportTransform`] is the single owner of the zoom range. Pan and
//! wheel gestures mutate it; everything else only reads it. The zoom range
//! is never clamped to the data range, so users can look past either end.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ViewportConfig;
use crate::range::TimeRange;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum ViewportError {
    #[error("time range [{start}, {end}) is empty or not finite")]
    InvalidRange { start: f64, end: f64 },
    #[error("surface width {0} must be positive")]
    InvalidWidth(f64),
}

/// Unit of a wheel delta as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WheelMode {
    #[default]
    Pixel,
    Line,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelDelta {
    /// Positive scrolls down and zooms out.
    pub delta_y: f64,
    pub mode: WheelMode,
}

/// What a pan gesture measures from: a pointer position and the zoom
/// range it maps onto.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PanAnchor {
    gesture: u64,
    start_px: f64,
    /// Pointer position of the latest frame.
    last_px: f64,
    zoom: TimeRange,
}

#[derive(Debug, Clone)]
pub struct ViewportTransform {
    full: TimeRange,
    zoom: TimeRange,
    width_px: f64,
    config: ViewportConfig,
    pan_anchor: Option<PanAnchor>,
}

fn check_width(width_px: f64) -> Result<f64, ViewportError> {
    if width_px > 0.0 && width_px.is_finite() {
        Ok(width_px)
    } else {
        Err(ViewportError::InvalidWidth(width_px))
    }
}

impl ViewportTransform {
    /// Start zoomed to `full`. A zero-length range is widened to the
    /// minimum duration around its start.
    pub fn new(full: TimeRange, width_px: f64, config: ViewportConfig) -> Result<Self, ViewportError> {
        let width_px = check_width(width_px)?;
        let full = if full.start.is_finite() && full.end == full.start {
            let half = config.min_duration_us(width_px) / 2.0;
            TimeRange::new(full.start - half, full.start + half)
        } else if full.is_valid() {
            full
        } else {
            return Err(ViewportError::InvalidRange {
                start: full.start,
                end: full.end,
            });
        };
        let mut viewport = Self {
            full,
            zoom: full,
            width_px,
            config,
            pan_anchor: None,
        };
        viewport.zoom = viewport.clamp_duration(full);
        Ok(viewport)
    }

    pub fn full_range(&self) -> TimeRange {
        self.full
    }

    pub fn zoom_range(&self) -> TimeRange {
        self.zoom
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn min_duration_us(&self) -> f64 {
        self.config.min_duration_us(self.width_px)
    }

    pub fn max_duration_us(&self) -> f64 {
        self.config.max_duration_us.max(self.min_duration_us())
    }

    pub fn time2pixel(&self, t: f64) -> f64 {
        (t - self.zoom.start) / self.zoom.duration() * self.width_px
    }

    pub fn pixel2time(&self, px: f64) -> f64 {
        self.zoom.start + px / self.width_px * self.zoom.duration()
    }

    pub fn duration2pixels(&self, duration_us: f64) -> f64 {
        duration_us / self.zoom.duration() * self.width_px
    }

    pub fn pixels2duration(&self, px: f64) -> f64 {
        px / self.width_px * self.zoom.duration()
    }

    /// Re-project onto a new width. The zoom range is left alone.
    pub fn resize(&mut self, width_px: f64) -> Result<bool, ViewportError> {
        let width_px = check_width(width_px)?;
        let changed = width_px != self.width_px;
        self.width_px = width_px;
        Ok(changed)
    }

    /// Drag from `start_px` to `current_px` within gesture `gesture`.
    ///
    /// The zoom range at the first call of a gesture is the anchor; every
    /// later frame translates from it rather than from the previous frame.
    /// A zoom during the gesture moves the anchor to the new range.
    pub fn pan(&mut self, gesture: u64, start_px: f64, current_px: f64) -> bool {
        if let Some(anchor) = self.pan_anchor.as_mut().filter(|a| a.gesture == gesture) {
            anchor.last_px = current_px;
        }
        let anchor = match self.pan_anchor {
            Some(anchor) if anchor.gesture == gesture => anchor,
            _ => {
                let anchor = PanAnchor {
                    gesture,
                    start_px,
                    last_px: current_px,
                    zoom: self.zoom,
                };
                self.pan_anchor = Some(anchor);
                anchor
            }
        };
        let delta = (current_px - anchor.start_px) / self.width_px * anchor.zoom.duration();
        self.replace(anchor.zoom.shifted(-delta))
    }

    /// Forget the pan anchor of `gesture`. Other gesture ids are ignored.
    pub fn end_gesture(&mut self, gesture: u64) {
        if self.pan_anchor.is_some_and(|a| a.gesture == gesture) {
            self.pan_anchor = None;
        }
    }

    pub fn active_gesture(&self) -> Option<u64> {
        self.pan_anchor.map(|a| a.gesture)
    }

    /// Zoom around `anchor_px`, keeping the time under it fixed.
    pub fn zoom(&mut self, wheel: WheelDelta, anchor_px: f64) -> bool {
        let normalized = wheel.delta_y
            * match wheel.mode {
                WheelMode::Pixel => 1.0,
                WheelMode::Line => self.config.line_height_px,
                WheelMode::Page => self.config.page_height_px,
            };
        if normalized == 0.0 || !normalized.is_finite() {
            return false;
        }
        let iterations = normalized.abs() / self.config.wheel_scale;
        let out = 1.0 + self.config.zoom_factor;
        let growth = if normalized > 0.0 { out } else { out.recip() };

        let old = self.zoom.duration();
        let duration = (old * growth.powf(iterations))
            .clamp(self.min_duration_us(), self.max_duration_us());
        let proportion = anchor_px / self.width_px;
        let anchor_time = self.pixel2time(anchor_px);
        let start = anchor_time - duration * proportion;
        self.rezoom(TimeRange::new(start, start + duration))
    }

    /// Replace the zoom range from outside, e.g. dashboard sync.
    pub fn set_zoom_range(&mut self, range: TimeRange) -> Result<bool, ViewportError> {
        if !range.is_valid() {
            return Err(ViewportError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        let clamped = self.clamp_duration(range);
        Ok(self.rezoom(clamped))
    }

    /// Clamp the duration of `range` into bounds around its centre.
    fn clamp_duration(&self, range: TimeRange) -> TimeRange {
        let duration = range.duration();
        let clamped = duration.clamp(self.min_duration_us(), self.max_duration_us());
        if clamped == duration {
            return range;
        }
        let centre = range.start + duration / 2.0;
        TimeRange::new(centre - clamped / 2.0, centre + clamped / 2.0)
    }

    /// Replace the range outside a pan frame. An active pan continues from
    /// the new range at the pointer's latest position.
    fn rezoom(&mut self, zoom: TimeRange) -> bool {
        let changed = self.replace(zoom);
        if changed {
            if let Some(anchor) = self.pan_anchor.as_mut() {
                anchor.start_px = anchor.last_px;
                anchor.zoom = self.zoom;
            }
        }
        changed
    }

    fn replace(&mut self, zoom: TimeRange) -> bool {
        if !zoom.is_valid() || zoom == self.zoom {
            return false;
        }
        self.zoom = zoom;
        true
    }
}
