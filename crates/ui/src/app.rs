use chrono::{DateTime, Local, TimeDelta, Utc};
use eframe::egui;
use timeline_core::config::ViewportConfig;
use timeline_core::source::parse_timestamps;
use timeline_core::{
    InputEvent, LabelMetrics, RenderSurface, SurfaceEvent, TimeRange, TimelineConfig, WheelMode,
};

use crate::renderer;
use crate::theme::{self, ThemeMode};

/// Fraction of the width moved by one arrow-key press.
const PAN_STEP: f64 = 0.1;

/// Format a duration in µs to human-readable string.
fn format_duration(us: f64) -> String {
    const UNITS: [(f64, &str); 4] = [
        (86_400e6, "d"),
        (3_600e6, "h"),
        (60e6, "min"),
        (1e6, "s"),
    ];
    for (scale, suffix) in UNITS {
        if us >= scale {
            return format!("{:.2}{suffix}", us / scale);
        }
    }
    if us >= 1000.0 {
        format!("{:.2}ms", us / 1000.0)
    } else {
        format!("{us:.0}µs")
    }
}

fn format_time(us: f64) -> String {
    match DateTime::<Utc>::from_timestamp_micros(us.round() as i64) {
        Some(t) => t
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string(),
        None => format!("{us:.0}µs"),
    }
}

/// The last hour, shown until timestamps are loaded.
fn default_window() -> TimeRange {
    let now = Local::now();
    let start = now - TimeDelta::hours(1);
    TimeRange::new(start.timestamp_micros() as f64, now.timestamp_micros() as f64)
}

/// Wheel pixels giving the same zoom as a pinch of `zoom_delta`.
fn pinch_to_wheel(zoom_delta: f32, config: &ViewportConfig) -> f64 {
    let steps = f64::from(zoom_delta).ln() / (1.0 + config.zoom_factor).ln();
    -steps * config.wheel_scale
}

/// Measures axis labels with the font egui will draw them in.
struct GalleyMetrics<'a> {
    painter: &'a egui::Painter,
}

impl LabelMetrics for GalleyMetrics<'_> {
    fn text_width(&self, text: &str) -> f64 {
        let galley = self.painter.layout_no_wrap(
            text.to_owned(),
            egui::FontId::proportional(theme::FONT_AXIS),
            egui::Color32::WHITE,
        );
        f64::from(galley.size().x)
    }
}

/// Main application state.
pub struct TimelineApp {
    /// Created on the first frame, once fonts can be measured.
    surface: Option<RenderSurface<Local>>,
    config: TimelineConfig,
    /// Timestamps loaded before the surface existed.
    pending: Option<Vec<i64>>,
    theme_mode: ThemeMode,
    title: String,
    next_gesture: u64,
    active_gesture: Option<u64>,
    last_pointer: Option<egui::Pos2>,
    /// Latest row selection, shown in the status bar.
    message: Option<String>,
    /// Error message to display.
    error: Option<String>,
}

impl TimelineApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: TimelineConfig) -> Self {
        let theme_mode = ThemeMode::Dark;
        cc.egui_ctx.set_visuals(theme_mode.visuals());
        theme::apply_typography(&cc.egui_ctx);
        Self {
            surface: None,
            config,
            pending: None,
            theme_mode,
            title: String::new(),
            next_gesture: 1,
            active_gesture: None,
            last_pointer: None,
            message: None,
            error: None,
        }
    }

    /// Queue `data` as the first file to show.
    pub fn with_file(mut self, name: &str, data: &[u8]) -> Self {
        self.load_bytes(name, data);
        self
    }

    fn load_bytes(&mut self, name: &str, data: &[u8]) {
        match parse_timestamps(data) {
            Ok(timestamps) => {
                tracing::info!(file = name, count = timestamps.len(), "parsed timestamps");
                self.title = name.to_owned();
                self.error = None;
                self.message = None;
                self.load_timestamps(timestamps);
            }
            Err(e) => {
                tracing::warn!(file = name, error = %e, "cannot parse timestamps");
                self.error = Some(format!("{name}: {e}"));
            }
        }
    }

    fn load_timestamps(&mut self, timestamps: Vec<i64>) {
        let Some(surface) = self.surface.as_mut() else {
            self.pending = Some(timestamps);
            return;
        };
        if let Err(e) = surface.load(timestamps) {
            self.error = Some(format!("Failed to load: {e}"));
        }
    }

    fn load_dropped(&mut self, file: &egui::DroppedFile) {
        if let Some(bytes) = &file.bytes {
            self.load_bytes(&file.name, bytes);
        } else if let Some(path) = &file.path {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match std::fs::read(path) {
                Ok(data) => self.load_bytes(&name, &data),
                Err(e) => self.error = Some(format!("Failed to read file: {e}")),
            }
        }
    }

    fn ensure_surface(&mut self, painter: &egui::Painter, width: f64, height: f64) {
        if self.surface.is_some() || width <= 0.0 {
            return;
        }
        let metrics = GalleyMetrics { painter };
        match RenderSurface::new(
            Local,
            self.config.clone(),
            &metrics,
            width,
            height,
            default_window(),
        ) {
            Ok(surface) => {
                self.surface = Some(surface);
                if let Some(timestamps) = self.pending.take() {
                    self.load_timestamps(timestamps);
                }
            }
            Err(e) => self.error = Some(format!("Invalid configuration: {e}")),
        }
    }

    fn gesture(&mut self) -> u64 {
        let id = self.next_gesture;
        self.next_gesture += 1;
        id
    }

    fn send(&mut self, event: InputEvent) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        for e in surface.handle_event(event) {
            match e {
                SurfaceEvent::ZoomRangeChanged(range) => {
                    tracing::trace!(start = range.start, end = range.end, "zoom changed");
                }
                SurfaceEvent::NearestRowSelected { row, timestamp } => {
                    self.message = Some(format!("Row {row} at {}", format_time(timestamp as f64)));
                }
            }
        }
    }

    /// A complete drag from the centre, used for keyboard and horizontal
    /// scroll panning.
    fn pan_by(&mut self, dx: f64) {
        let Some(surface) = &self.surface else {
            return;
        };
        let (width, height) = surface.size();
        let (x, y) = (width / 2.0, height / 2.0);
        let gesture = self.gesture();
        self.send(InputEvent::PointerDown { gesture, x, y });
        self.send(InputEvent::PointerMove { x: x + dx, y });
        self.send(InputEvent::PointerUp { gesture, x: x + dx, y });
        self.send(InputEvent::PointerLeave);
        self.last_pointer = None;
    }

    fn zoom_at_centre(&mut self, direction: f64) {
        let Some(surface) = &self.surface else {
            return;
        };
        let x = surface.size().0 / 2.0;
        let delta_y = direction * surface.config().viewport.wheel_scale;
        self.send(InputEvent::Wheel {
            delta_y,
            mode: WheelMode::Pixel,
            x,
        });
    }

    fn reset_zoom(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let Some(full) = surface.full_range() {
            if let Err(e) = surface.set_zoom_range(full) {
                tracing::warn!(error = %e, "cannot reset zoom");
            }
        }
    }

    fn open_file_dialog(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("Timestamps", &["txt", "log", "csv"])
                .pick_file()
            {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match std::fs::read(&path) {
                    Ok(data) => self.load_bytes(&name, &data),
                    Err(e) => {
                        self.error = Some(format!("Failed to read file: {e}"));
                    }
                }
            }
        }
    }

    /// Translate this frame's pointer, wheel and key input into surface events.
    fn handle_input(&mut self, ui: &egui::Ui, response: &egui::Response, area: egui::Rect) {
        let (pos, pressed, down, scroll, zoom_delta) = ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.smooth_scroll_delta,
                i.zoom_delta(),
            )
        });
        let local = |p: egui::Pos2| (f64::from(p.x - area.left()), f64::from(p.y - area.top()));

        if pressed && response.hovered() {
            if let Some(p) = pos {
                let gesture = self.gesture();
                self.active_gesture = Some(gesture);
                let (x, y) = local(p);
                self.send(InputEvent::PointerDown { gesture, x, y });
            }
        }

        let tracked = pos.filter(|p| area.contains(*p) || self.active_gesture.is_some());
        match tracked {
            Some(p) if self.last_pointer != Some(p) => {
                let (x, y) = local(p);
                self.send(InputEvent::PointerMove { x, y });
                self.last_pointer = Some(p);
            }
            Some(_) => {}
            None => {
                if self.last_pointer.take().is_some() {
                    self.send(InputEvent::PointerLeave);
                }
            }
        }

        if !down {
            if let Some(gesture) = self.active_gesture.take() {
                let (x, y) = self
                    .last_pointer
                    .map(local)
                    .unwrap_or((f64::from(area.width()) / 2.0, 0.0));
                self.send(InputEvent::PointerUp { gesture, x, y });
            }
        }

        if response.hovered() {
            let x = pos.map_or(f64::from(area.width()) / 2.0, |p| local(p).0);
            if scroll.y.abs() > 0.1 {
                // egui reports scrolling up as positive; the surface zooms in on negative deltas.
                self.send(InputEvent::Wheel {
                    delta_y: -f64::from(scroll.y),
                    mode: WheelMode::Pixel,
                    x,
                });
            }
            if scroll.x.abs() > 0.1 && self.active_gesture.is_none() {
                self.pan_by(f64::from(scroll.x));
            }
            if (zoom_delta - 1.0).abs() > 0.001 {
                let delta_y = pinch_to_wheel(zoom_delta, &self.config.viewport);
                self.send(InputEvent::Wheel {
                    delta_y,
                    mode: WheelMode::Pixel,
                    x,
                });
            }
        }

        let width = f64::from(area.width());
        let keys = ui.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals),
                i.key_pressed(egui::Key::Minus),
                i.key_pressed(egui::Key::Num0),
                i.key_pressed(egui::Key::Escape),
            )
        });
        match keys {
            (true, ..) => self.pan_by(width * PAN_STEP),
            (_, true, ..) => self.pan_by(-width * PAN_STEP),
            (_, _, true, ..) => self.zoom_at_centre(-1.0),
            (_, _, _, true, ..) => self.zoom_at_centre(1.0),
            (.., true, _) => self.reset_zoom(),
            (.., true) => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.clear_indicators();
                }
                self.message = None;
            }
            _ => {}
        }
    }

    fn status_text(&self) -> String {
        let Some(surface) = &self.surface else {
            return "No timestamps loaded. Click Open or drag & drop a file".to_owned();
        };
        let zoom = surface.zoom_range();
        let mut text = format!(
            "{} .. {} | Viewing: {} | Events: {}",
            format_time(zoom.start),
            format_time(zoom.end),
            format_duration(zoom.duration()),
            surface.index().len(),
        );
        if let Some(hover) = surface.hover() {
            match hover.bin {
                Some(bin) => text.push_str(&format!(
                    " | {} .. {}: {} events",
                    format_time(bin.start as f64),
                    format_time(bin.end as f64),
                    bin.count
                )),
                None => text.push_str(&format!(" | {}: no events", format_time(hover.time_us as f64))),
            }
        }
        if let Some(message) = &self.message {
            text.push_str(" | ");
            text.push_str(message);
        }
        text
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Top toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("timeline");
                if !self.title.is_empty() {
                    ui.label(self.title.as_str());
                }
                ui.separator();

                if ui.button("Open").clicked() {
                    self.open_file_dialog();
                }
                if ui.button("Reset zoom").clicked() {
                    self.reset_zoom();
                }

                ui.separator();

                let theme_label = match self.theme_mode {
                    ThemeMode::Dark => "Dark",
                    ThemeMode::Light => "Light",
                };
                if ui.button(theme_label).clicked() {
                    self.theme_mode = self.theme_mode.toggled();
                    ctx.set_visuals(self.theme_mode.visuals());
                }
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(err) = &self.error {
                    ui.colored_label(ui.visuals().error_fg_color, err);
                    ui.separator();
                }
                if let Some(e) = self.surface.as_ref().and_then(|s| s.grid_error()) {
                    ui.colored_label(ui.visuals().warn_fg_color, format!("Grid: {e}"));
                    ui.separator();
                }
                ui.label(self.status_text());
            });
        });

        // Central panel: histogram and axis
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_rect_before_wrap();
            let response = ui.allocate_rect(available, egui::Sense::click_and_drag());
            let (width, height) = (f64::from(available.width()), f64::from(available.height()));

            let mut painter = ui.painter_at(available);
            self.ensure_surface(&painter, width, height);
            let resized = self
                .surface
                .as_ref()
                .is_some_and(|s| s.size() != (width, height));
            if resized && width > 0.0 {
                self.send(InputEvent::Resize { width, height });
            }

            self.handle_input(ui, &response, available);

            let Some(surface) = self.surface.as_mut() else {
                return;
            };
            match surface.paint() {
                Ok(commands) => {
                    renderer::render_commands(&mut painter, &commands, available.min, self.theme_mode);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "paint failed");
                    self.error = Some(format!("Paint failed: {e}"));
                }
            }
        });

        // Handle file drop
        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        if let Some(file) = dropped {
            self.load_dropped(&file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_pick_the_largest_unit() {
        assert_eq!(format_duration(250.0), "250µs");
        assert_eq!(format_duration(1_500.0), "1.50ms");
        assert_eq!(format_duration(90e6), "1.50min");
        assert_eq!(format_duration(36.0 * 3_600e6), "1.50d");
    }

    #[test]
    fn pinch_matches_wheel_zoom() {
        let config = ViewportConfig::default();
        // One wheel step zooms out by 1 + zoom_factor.
        let out = pinch_to_wheel((1.0 / 1.1_f64) as f32, &config);
        assert!((out - config.wheel_scale).abs() < 1e-3);
        let none = pinch_to_wheel(1.0, &config);
        assert_eq!(none, 0.0);
        assert!(pinch_to_wheel(2.0, &config) < 0.0);
    }
}
