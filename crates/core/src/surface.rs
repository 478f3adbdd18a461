//! The timeline surface: input handling, hover hit-testing and painting.
//!
//! A [`RenderSurface`] owns every piece of state for one histogram: the
//! timestamp index, the grid planner, the viewport and the indicators.
//! Platforms feed it normalized [`InputEvent`]s and draw the commands
//! returned by [`RenderSurface::paint`].

use std::fmt::{self, Write as _};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use timeline_protocol::{Point, Rect, RenderCommand, SharedStr, ThemeToken};

use crate::binning::BinSpec;
use crate::config::{Binning, TimelineConfig};
use crate::error::TimelineError;
use crate::grid::{GridError, GridLine, GridPlanner, LabelMetrics};
use crate::index::{HistogramBin, TimestampIndex};
use crate::nearest::{RowOrder, nearest_row};
use crate::range::TimeRange;
use crate::viewport::{ViewportTransform, WheelDelta, WheelMode};
use crate::views::histogram::{render_histogram, render_no_data};
use crate::views::indicators::{Indicator, IndicatorRole, render_indicators};
use crate::views::time_axis::render_time_axis;
use crate::views::tooltip::{TooltipPlacement, place_tooltip, render_tooltip};

const TOOLTIP_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Normalized platform input in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown { gesture: u64, x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { gesture: u64, x: f64, y: f64 },
    PointerLeave,
    Wheel { delta_y: f64, mode: WheelMode, x: f64 },
    Resize { width: f64, height: f64 },
}

/// Notifications for collaborators outside the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// The visible window moved; dashboards may sync to it.
    ZoomRangeChanged(TimeRange),
    /// A click picked the row nearest to the clicked time.
    NearestRowSelected { row: usize, timestamp: i64 },
}

/// What the pointer is over.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub x: f64,
    pub time_us: i64,
    /// `None` over zero-count gaps.
    pub bin: Option<HistogramBin>,
    pub nearest_row: Option<usize>,
    pub lines: Vec<SharedStr>,
    pub placement: TooltipPlacement,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    gesture: u64,
    x: f64,
    panning: bool,
}

pub struct RenderSurface<Tz: TimeZone> {
    config: TimelineConfig,
    index: TimestampIndex,
    full: Option<TimeRange>,
    planner: GridPlanner<Tz>,
    viewport: ViewportTransform,
    height_px: f64,

    rows: Vec<i64>,
    row_order: RowOrder,
    selection: Option<i64>,
    visible_range: Option<(i64, i64)>,
    external_range: Option<(i64, i64)>,

    press: Option<Press>,
    pointer: Option<Point>,
    hover: Option<HoverInfo>,

    bins: Option<BinSpec>,
    /// Tallest bin over the whole dataset, keyed by bin width.
    peak: Option<(i64, usize)>,
    grid_key: Option<(TimeRange, f64)>,
    grid_lines: Vec<GridLine>,
    grid_error: Option<GridError>,
}

impl<Tz> RenderSurface<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    /// Create an empty surface showing `initial_zoom`.
    pub fn new(
        tz: Tz,
        config: TimelineConfig,
        metrics: &dyn LabelMetrics,
        width_px: f64,
        height_px: f64,
        initial_zoom: TimeRange,
    ) -> Result<Self, TimelineError> {
        config.validate()?;
        let planner = GridPlanner::new(tz, &config.grid, metrics);
        let viewport = ViewportTransform::new(initial_zoom, width_px, config.viewport)?;
        Ok(Self {
            config,
            index: TimestampIndex::new(Vec::new()),
            full: None,
            planner,
            viewport,
            height_px: height_px.max(0.0),
            rows: Vec::new(),
            row_order: RowOrder::Ascending,
            selection: None,
            visible_range: None,
            external_range: None,
            press: None,
            pointer: None,
            hover: None,
            bins: None,
            peak: None,
            grid_key: None,
            grid_lines: Vec::new(),
            grid_error: None,
        })
    }

    /// Replace the dataset. A non-empty series resets the zoom to its full
    /// range; an empty one keeps the current window.
    pub fn load(&mut self, timestamps: Vec<i64>) -> Result<(), TimelineError> {
        self.index = TimestampIndex::try_new(timestamps)?;
        let ts = self.index.timestamps();
        self.full = match (ts.first(), ts.last()) {
            (Some(&first), Some(&last)) => Some(TimeRange::covering(first, last)),
            _ => None,
        };
        if let Some(full) = self.full {
            self.viewport = ViewportTransform::new(full, self.viewport.width_px(), self.config.viewport)?;
        }
        self.bins = None;
        self.peak = None;
        self.grid_key = None;
        self.hover = None;
        self.press = None;
        tracing::debug!(
            count = self.index.len(),
            full = ?self.full,
            "loaded timestamps"
        );
        self.ensure_bins()?;
        Ok(())
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn index(&self) -> &TimestampIndex {
        &self.index
    }

    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    pub fn planner(&self) -> &GridPlanner<Tz> {
        &self.planner
    }

    pub fn zoom_range(&self) -> TimeRange {
        self.viewport.zoom_range()
    }

    pub fn full_range(&self) -> Option<TimeRange> {
        self.full
    }

    pub fn size(&self) -> (f64, f64) {
        (self.viewport.width_px(), self.height_px)
    }

    pub fn hover(&self) -> Option<&HoverInfo> {
        self.hover.as_ref()
    }

    pub fn selection(&self) -> Option<i64> {
        self.selection
    }

    /// Count that maps to full bar height: the largest bin of the whole
    /// dataset at the current bin width, so panning keeps bar heights.
    pub fn peak_count(&self) -> usize {
        self.peak.map_or(0, |(_, peak)| peak)
    }

    /// Lines from the last grid pass.
    pub fn grid_lines(&self) -> &[GridLine] {
        &self.grid_lines
    }

    /// Why the last grid pass failed or was truncated.
    pub fn grid_error(&self) -> Option<&GridError> {
        self.grid_error.as_ref()
    }

    /// Register the external row list used by click selection.
    pub fn set_rows(&mut self, rows: Vec<i64>, order: RowOrder) {
        self.rows = rows;
        self.row_order = order;
    }

    pub fn set_selection(&mut self, timestamp: Option<i64>) {
        self.selection = timestamp;
    }

    pub fn set_visible_range(&mut self, range: Option<(i64, i64)>) {
        self.visible_range = range;
    }

    pub fn set_external_range(&mut self, range: Option<(i64, i64)>) {
        self.external_range = range;
    }

    pub fn clear_indicators(&mut self) {
        self.selection = None;
        self.visible_range = None;
        self.external_range = None;
    }

    /// Apply a time window from outside (dashboard sync). No
    /// [`SurfaceEvent::ZoomRangeChanged`] is emitted for it.
    pub fn set_zoom_range(&mut self, range: TimeRange) -> Result<bool, TimelineError> {
        Ok(self.viewport.set_zoom_range(range)?)
    }

    /// Histogram area above the time axis.
    pub fn plot_rect(&self) -> Rect {
        let axis = self.config.grid.axis_height_px.min(self.height_px);
        Rect::new(0.0, 0.0, self.viewport.width_px(), self.height_px - axis)
    }

    pub fn axis_rect(&self) -> Rect {
        let axis = self.config.grid.axis_height_px.min(self.height_px);
        Rect::new(0.0, self.height_px - axis, self.viewport.width_px(), axis)
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport.width_px(), self.height_px)
    }

    pub fn handle_event(&mut self, event: InputEvent) -> Vec<SurfaceEvent> {
        let before = self.viewport.zoom_range();
        let mut events = Vec::new();

        match event {
            InputEvent::PointerDown { gesture, x, y } => {
                self.press = Some(Press {
                    gesture,
                    x,
                    panning: false,
                });
                self.pointer = Some(Point::new(x, y));
            }
            InputEvent::PointerMove { x, y } => {
                self.pointer = Some(Point::new(x, y));
                self.drag_to(x);
            }
            InputEvent::PointerUp { gesture, x, y } => {
                let Some(press) = self.press.filter(|p| p.gesture == gesture) else {
                    return events;
                };
                self.pointer = Some(Point::new(x, y));
                self.drag_to(x);
                let panned = self.press.is_some_and(|p| p.panning);
                self.press = None;
                self.viewport.end_gesture(press.gesture);
                if !panned {
                    events.extend(self.click(x));
                }
            }
            InputEvent::PointerLeave => {
                self.pointer = None;
                self.hover = None;
            }
            InputEvent::Wheel { delta_y, mode, x } => {
                self.viewport.zoom(WheelDelta { delta_y, mode }, x);
            }
            InputEvent::Resize { width, height } => {
                if let Err(e) = self.viewport.resize(width) {
                    tracing::debug!(error = %e, "ignoring resize");
                }
                self.height_px = height.max(0.0);
            }
        }

        let after = self.viewport.zoom_range();
        if after != before {
            tracing::debug!(start = after.start, end = after.end, "zoom range changed");
            events.insert(0, SurfaceEvent::ZoomRangeChanged(after));
        }
        self.refresh_hover();
        events
    }

    /// Pan once the pointer has travelled past the click slop.
    fn drag_to(&mut self, x: f64) {
        let Some(press) = self.press.as_mut() else {
            return;
        };
        if !press.panning && (x - press.x).abs() > self.config.click_slop_px {
            press.panning = true;
        }
        if press.panning {
            let (gesture, start) = (press.gesture, press.x);
            self.viewport.pan(gesture, start, x);
        }
    }

    fn click(&mut self, x: f64) -> Option<SurfaceEvent> {
        let t = self.viewport.pixel2time(x).round() as i64;
        match nearest_row(&self.rows, self.row_order, t) {
            Some(row) => {
                let timestamp = self.rows[row];
                self.selection = Some(timestamp);
                Some(SurfaceEvent::NearestRowSelected { row, timestamp })
            }
            None => {
                self.selection = Some(t);
                None
            }
        }
    }

    fn refresh_hover(&mut self) {
        let Some(pointer) = self.pointer else {
            self.hover = None;
            return;
        };
        if !self.bounds().contains(pointer) {
            self.hover = None;
            return;
        }
        if let Err(e) = self.ensure_bins() {
            tracing::warn!(error = %e, "rebinning failed");
        }

        let time_us = self.viewport.pixel2time(pointer.x).floor() as i64;
        let bin = self.index.find_bin_for_timestamp(time_us);
        let nearest = nearest_row(&self.rows, self.row_order, time_us);
        let lines = match bin {
            Some(b) => vec![
                SharedStr::from(format!(
                    "{} - {}",
                    self.format_time(b.start),
                    self.format_time(b.end)
                )),
                SharedStr::from(match b.count {
                    1 => "1 event".to_string(),
                    n => format!("{n} events"),
                }),
            ],
            None => vec![self.format_time(time_us), SharedStr::from("no events")],
        };
        let tip = &self.config.tooltip;
        let placement = place_tooltip(pointer, tip.width_px, tip.height_px, self.bounds(), tip.arrow_px);
        self.hover = Some(HoverInfo {
            x: pointer.x,
            time_us,
            bin,
            nearest_row: nearest,
            lines,
            placement,
        });
    }

    fn format_time(&self, us: i64) -> SharedStr {
        let Some(utc) = DateTime::<Utc>::from_timestamp_micros(us) else {
            return SharedStr::from(us.to_string());
        };
        let local = utc.with_timezone(self.planner.timezone());
        let mut text = String::new();
        if write!(text, "{}", local.format(TOOLTIP_TIME_FORMAT)).is_err() {
            text = us.to_string();
        }
        SharedStr::from(text)
    }

    /// Recount bins if the binning plan changed.
    fn ensure_bins(&mut self) -> Result<(), TimelineError> {
        let Some(full) = self.full else {
            return Ok(());
        };
        let layout = match self.config.histogram.binning {
            Binning::Fixed { bins } => {
                let ts = self.index.timestamps();
                let (first, last) = (ts.first().copied(), ts.last().copied());
                match (first, last) {
                    (Some(first), Some(last)) => BinSpec::equal_width(first, last, bins),
                    _ => return Ok(()),
                }
            }
            Binning::Adaptive { bar_px } => BinSpec::adaptive(
                self.viewport.zoom_range(),
                full,
                self.viewport.width_px(),
                bar_px,
            ),
        };
        if self.bins == Some(layout) {
            return Ok(());
        }
        self.index.rebin(&layout)?;
        let peak = match (self.config.histogram.binning, self.peak) {
            (Binning::Fixed { .. }, _) => self.index.max_count(),
            (Binning::Adaptive { .. }, Some((width, peak))) if width == layout.width => peak,
            (Binning::Adaptive { .. }, _) => self.index.peak_count(layout.width),
        };
        self.peak = Some((layout.width, peak));
        self.bins = Some(layout);
        Ok(())
    }

    /// Replan grid lines if the window or width changed.
    fn ensure_grid(&mut self) {
        let key = (self.viewport.zoom_range(), self.viewport.width_px());
        if self.grid_key == Some(key) {
            return;
        }
        self.grid_key = Some(key);
        self.grid_lines.clear();
        self.grid_error = None;

        if let Err(e) = self.planner.update_zoom(key.0, key.1) {
            tracing::warn!(error = %e, "no grid for this zoom");
            self.grid_error = Some(e);
            return;
        }
        let mut lines = self.planner.generate(key.0);
        self.grid_lines = lines.by_ref().collect();
        self.grid_error = lines.into_error();
    }

    fn indicators(&self) -> Vec<Indicator> {
        let slots = &self.config.indicators;
        let mut out = Vec::with_capacity(6);
        let mut push_range = |bounds: Option<(i64, i64)>, slot: u8| {
            if let Some((start, end)) = bounds {
                out.push(Indicator::new(start, IndicatorRole::RangeStart, ThemeToken::Palette(slot)));
                out.push(Indicator::new(end, IndicatorRole::RangeEnd, ThemeToken::Palette(slot)));
            }
        };
        push_range(self.external_range, slots.external_range);
        push_range(self.visible_range, slots.visible_range);
        if let Some(t) = self.selection {
            out.push(Indicator::new(t, IndicatorRole::Point, ThemeToken::Palette(slots.selection)));
        }
        if let Some(hover) = &self.hover {
            out.push(Indicator::new(hover.time_us, IndicatorRole::Point, ThemeToken::Palette(slots.hover)));
        }
        out
    }

    /// Produce one frame, bottom layer first.
    pub fn paint(&mut self) -> Result<Vec<RenderCommand>, TimelineError> {
        self.ensure_bins()?;
        self.ensure_grid();

        let plot = self.plot_rect();
        let axis = self.axis_rect();
        let mut commands = Vec::with_capacity(256);
        commands.push(RenderCommand::BeginGroup {
            id: SharedStr::from("timeline"),
            label: None,
        });
        commands.push(RenderCommand::DrawRect {
            rect: self.bounds(),
            color: ThemeToken::Background,
            border_color: None,
        });
        commands.extend(render_histogram(
            self.index.bins(),
            self.peak_count(),
            plot,
            &self.viewport,
            self.config.histogram.single_event_fraction,
            self.hover.as_ref().and_then(|h| h.bin),
        ));
        commands.extend(render_no_data(self.full, plot, &self.viewport));
        commands.extend(render_indicators(&self.indicators(), plot, &self.viewport));
        commands.extend(render_time_axis(&self.grid_lines, plot, axis, &self.viewport));
        if let Some(hover) = &self.hover {
            commands.extend(render_tooltip(&hover.placement, &hover.lines, &self.config.tooltip));
        }
        commands.push(RenderCommand::EndGroup);
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::FixedWidthMetrics;

    const METRICS: FixedWidthMetrics = FixedWidthMetrics { char_width: 6.0 };

    fn surface(timestamps: Vec<i64>) -> RenderSurface<Utc> {
        let mut config = TimelineConfig::default();
        config.histogram.binning = Binning::Fixed { bins: 10 };
        let s = RenderSurface::new(Utc, config, &METRICS, 1_000.0, 200.0, TimeRange::new(0.0, 3_600e6));
        let mut s = match s {
            Ok(s) => s,
            Err(e) => panic!("{e}"),
        };
        if let Err(e) = s.load(timestamps) {
            panic!("{e}");
        }
        s
    }

    fn data() -> Vec<i64> {
        (0..100).map(|i| i * 10_000).collect()
    }

    #[test]
    fn load_sets_full_range_and_bins() {
        let s = surface(data());
        assert_eq!(s.full_range(), Some(TimeRange::new(0.0, 990_001.0)));
        assert_eq!(s.zoom_range(), TimeRange::new(0.0, 990_001.0));
        assert_eq!(s.index().bins().len(), 10);
        let total: usize = s.index().bins().iter().map(|b| b.count).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn load_rejects_unsorted_input() {
        let mut s = surface(Vec::new());
        assert!(matches!(s.load(vec![3, 1]), Err(TimelineError::Source(_))));
    }

    #[test]
    fn empty_dataset_keeps_initial_window_and_paints() {
        let mut s = surface(Vec::new());
        assert_eq!(s.full_range(), None);
        assert_eq!(s.zoom_range(), TimeRange::new(0.0, 3_600e6));
        let cmds = s.paint().unwrap_or_default();
        assert!(cmds.iter().any(|c| matches!(c, RenderCommand::DrawPattern { .. })));
        assert!(!cmds.iter().any(|c| matches!(c, RenderCommand::DrawRect { color: ThemeToken::BarFill, .. })));
    }

    #[test]
    fn drag_pans_and_reports_zoom_change() {
        let mut s = surface(data());
        let before = s.zoom_range();
        assert!(s.handle_event(InputEvent::PointerDown { gesture: 1, x: 500.0, y: 50.0 }).is_empty());
        let events = s.handle_event(InputEvent::PointerMove { x: 600.0, y: 50.0 });
        assert!(matches!(events.as_slice(), [SurfaceEvent::ZoomRangeChanged(_)]));
        s.handle_event(InputEvent::PointerUp { gesture: 1, x: 600.0, y: 50.0 });
        let after = s.zoom_range();
        assert!((after.duration() - before.duration()).abs() < 1e-6);
        assert!(after.start < before.start);
        assert_eq!(s.selection(), None);
    }

    #[test]
    fn click_selects_nearest_row() {
        let mut s = surface(data());
        s.set_rows(vec![100_000, 400_000, 800_000], RowOrder::Ascending);
        s.handle_event(InputEvent::PointerDown { gesture: 4, x: 450.0, y: 50.0 });
        let events = s.handle_event(InputEvent::PointerUp { gesture: 4, x: 451.0, y: 50.0 });
        assert_eq!(
            events,
            vec![SurfaceEvent::NearestRowSelected {
                row: 1,
                timestamp: 400_000
            }]
        );
        assert_eq!(s.selection(), Some(400_000));
    }

    #[test]
    fn stray_pointer_up_is_ignored() {
        let mut s = surface(data());
        let before = s.zoom_range();
        assert!(s.handle_event(InputEvent::PointerUp { gesture: 9, x: 10.0, y: 10.0 }).is_empty());
        assert!(s.handle_event(InputEvent::PointerMove { x: 900.0, y: 10.0 }).is_empty());
        assert_eq!(s.zoom_range(), before);
    }

    #[test]
    fn wheel_zooms_and_resize_does_not() {
        let mut s = surface(data());
        let events = s.handle_event(InputEvent::Wheel {
            delta_y: -100.0,
            mode: WheelMode::Pixel,
            x: 250.0,
        });
        assert_eq!(events.len(), 1);
        let zoomed = s.zoom_range();
        assert!(zoomed.duration() < 990_001.0);

        let events = s.handle_event(InputEvent::Resize { width: 500.0, height: 100.0 });
        assert!(events.is_empty());
        assert_eq!(s.zoom_range(), zoomed);
        assert_eq!(s.size(), (500.0, 100.0));
    }

    #[test]
    fn hover_reports_bin_and_tooltip() {
        let mut s = surface(data());
        s.handle_event(InputEvent::PointerMove { x: 5.0, y: 100.0 });
        let hover = s.hover().cloned();
        let hover = match hover {
            Some(h) => h,
            None => panic!("no hover"),
        };
        assert_eq!(hover.bin.map(|b| b.start), Some(0));
        assert_eq!(hover.lines.len(), 2);
        assert_eq!(hover.lines[1], "10 events");
        assert!(hover.placement.rect.is_within(&Rect::new(0.0, 0.0, 1_000.0, 200.0)));

        s.handle_event(InputEvent::PointerLeave);
        assert!(s.hover().is_none());
    }

    #[test]
    fn paint_layers_in_order() {
        let mut s = surface(data());
        s.set_visible_range(Some((100_000, 200_000)));
        s.handle_event(InputEvent::PointerMove { x: 300.0, y: 100.0 });
        let cmds = s.paint().unwrap_or_default();

        let first = |pred: &dyn Fn(&RenderCommand) -> bool| cmds.iter().position(pred);
        let bar = first(&|c| matches!(c, RenderCommand::DrawRect { color: ThemeToken::BarFill | ThemeToken::BarHover, .. }));
        let bracket = first(&|c| matches!(c, RenderCommand::DrawPolygon { color: ThemeToken::Palette(_), .. }));
        let axis = first(&|c| matches!(c, RenderCommand::DrawRect { color: ThemeToken::AxisBackground, .. }));
        let tooltip = first(&|c| matches!(c, RenderCommand::DrawRect { color: ThemeToken::TooltipBackground, .. }));
        assert!(matches!(cmds.first(), Some(RenderCommand::BeginGroup { .. })));
        assert!(matches!(cmds.last(), Some(RenderCommand::EndGroup)));
        assert!(bar < bracket && bracket < axis && axis < tooltip);
        assert!(!s.grid_lines().is_empty());
        assert_eq!(s.grid_error(), None);
    }

    fn adaptive(timestamps: Vec<i64>) -> RenderSurface<Utc> {
        let mut config = TimelineConfig::default();
        config.histogram.binning = Binning::Adaptive { bar_px: 10.0 };
        let s = RenderSurface::new(Utc, config, &METRICS, 1_000.0, 200.0, TimeRange::new(0.0, 1.0));
        let mut s = match s {
            Ok(s) => s,
            Err(e) => panic!("{e}"),
        };
        if let Err(e) = s.load(timestamps) {
            panic!("{e}");
        }
        s
    }

    fn tallest_bar(cmds: &[RenderCommand]) -> f64 {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    color: ThemeToken::BarFill | ThemeToken::BarHover,
                    ..
                } => Some(rect.h),
                _ => None,
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn adaptive_binning_follows_zoom() {
        let mut s = adaptive(data());
        s.handle_event(InputEvent::Wheel {
            delta_y: -2_000.0,
            mode: WheelMode::Pixel,
            x: 0.0,
        });
        assert!(s.paint().is_ok());
        let zoom = s.zoom_range();
        let bins = s.index().bins();
        assert!(!bins.is_empty());
        assert!(bins.iter().all(|b| (b.start as f64) < zoom.end && (b.end as f64) > zoom.start));
    }

    #[test]
    fn adaptive_peak_survives_panning_to_sparse_data() {
        // A dense burst at the start, then one event every 10 ms.
        let mut ts: Vec<i64> = (0..500).map(|i| i * 10).collect();
        ts.extend((1..=100).map(|i| 5_000 + i * 10_000));
        let mut s = adaptive(ts);

        assert!(matches!(s.set_zoom_range(TimeRange::new(0.0, 100_000.0)), Ok(true)));
        let dense = s.paint().unwrap_or_default();
        assert_eq!(s.peak_count(), 100);
        assert_eq!(s.index().max_count(), 100);

        assert!(matches!(s.set_zoom_range(TimeRange::new(500_000.0, 600_000.0)), Ok(true)));
        let sparse = s.paint().unwrap_or_default();
        assert_eq!(s.index().max_count(), 1);
        assert_eq!(s.peak_count(), 100);
        assert!(tallest_bar(&dense) > tallest_bar(&sparse));
    }

    #[test]
    fn wheel_during_drag_keeps_the_new_zoom() {
        let mut s = surface(data());
        s.handle_event(InputEvent::PointerDown { gesture: 2, x: 500.0, y: 50.0 });
        s.handle_event(InputEvent::PointerMove { x: 520.0, y: 50.0 });
        let events = s.handle_event(InputEvent::Wheel {
            delta_y: -300.0,
            mode: WheelMode::Pixel,
            x: 520.0,
        });
        assert!(matches!(events.as_slice(), [SurfaceEvent::ZoomRangeChanged(_)]));
        let zoomed = s.zoom_range();
        assert!(zoomed.duration() < 990_001.0);

        s.handle_event(InputEvent::PointerMove { x: 521.0, y: 50.0 });
        let after = s.zoom_range();
        let step = zoomed.duration() / 1_000.0;
        assert!((after.duration() - zoomed.duration()).abs() < 1e-6);
        assert!((after.start - (zoomed.start - step)).abs() < 1e-6);

        s.handle_event(InputEvent::PointerUp { gesture: 2, x: 521.0, y: 50.0 });
        assert_eq!(s.zoom_range(), after);
        assert_eq!(s.viewport().active_gesture(), None);
    }
}
