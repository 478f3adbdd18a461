use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::{Buffer, Cell},
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
};
use timeline_core::config::TimelineConfig;
use timeline_core::{
    FixedWidthMetrics, InputEvent, RenderSurface, SurfaceEvent, TimeRange, WheelMode,
};
use timeline_protocol::{RenderCommand, ThemeToken};

/// Surface pixels per terminal cell. Commands are laid out in pixels and
/// rasterized onto the cell grid.
const CELL_W: f64 = 8.0;
const CELL_H: f64 = 16.0;

/// Fraction of the width one arrow-key press pans by.
const PAN_STEP: f64 = 0.1;

const LOWER_BLOCKS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

const PALETTE: [Color; 8] = [
    Color::LightMagenta,
    Color::LightBlue,
    Color::LightGreen,
    Color::Rgb(250, 179, 135),
    Color::Magenta,
    Color::Cyan,
    Color::Yellow,
    Color::LightRed,
];

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::Background | ThemeToken::Surface => Color::Reset,
        ThemeToken::Border | ThemeToken::AxisBorder | ThemeToken::TooltipBorder => Color::DarkGray,
        ThemeToken::TextPrimary | ThemeToken::AxisText | ThemeToken::TooltipText => Color::White,
        ThemeToken::TextMuted => Color::Gray,
        ThemeToken::BarFill => Color::Blue,
        ThemeToken::BarHover => Color::LightBlue,
        ThemeToken::NoDataPattern | ThemeToken::GridMinor => Color::DarkGray,
        ThemeToken::GridMajor => Color::Gray,
        ThemeToken::AxisBackground => Color::Rgb(24, 24, 37),
        ThemeToken::TooltipBackground => Color::Rgb(17, 17, 27),
        ThemeToken::Palette(i) => PALETTE[usize::from(i) % PALETTE.len()],
    }
}

/// Cell-space clip rectangle, `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy)]
struct Clip {
    x0: u16,
    y0: u16,
    x1: u16,
    y1: u16,
}

impl Clip {
    fn of(area: Rect) -> Self {
        Self {
            x0: area.x,
            y0: area.y,
            x1: area.x + area.width,
            y1: area.y + area.height,
        }
    }

    fn intersect(self, other: Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1).max(self.x0.max(other.x0)),
            y1: self.y1.min(other.y1).max(self.y0.max(other.y0)),
        }
    }

    fn contains(self, x: u16, y: u16) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Cell column or row for a pixel coordinate, relative to `origin`.
fn cell(origin: u16, px: f64, per_cell: f64) -> i64 {
    i64::from(origin) + (px / per_cell).floor() as i64
}

fn clip_rect(origin: Rect, rect: timeline_protocol::Rect) -> Clip {
    let x0 = cell(origin.x, rect.x, CELL_W).max(0);
    let y0 = cell(origin.y, rect.y, CELL_H).max(0);
    let x1 = (i64::from(origin.x) + (rect.right() / CELL_W).ceil() as i64).max(x0);
    let y1 = (i64::from(origin.y) + (rect.bottom() / CELL_H).ceil() as i64).max(y0);
    let to_u16 = |v: i64| u16::try_from(v).unwrap_or(u16::MAX);
    Clip {
        x0: to_u16(x0),
        y0: to_u16(y0),
        x1: to_u16(x1),
        y1: to_u16(y1),
    }
}

fn cell_at(buf: &mut Buffer, clip: Clip, x: i64, y: i64) -> Option<&mut Cell> {
    let (x, y) = (u16::try_from(x).ok()?, u16::try_from(y).ok()?);
    if clip.contains(x, y) { Some(&mut buf[(x, y)]) } else { None }
}

/// Draw a frame of render commands into `area` of `buf`.
///
/// Rect tops that end mid-cell become lower-block glyphs, so bar heights
/// keep eighth-of-a-cell resolution.
pub fn rasterize(commands: &[RenderCommand], area: Rect, buf: &mut Buffer) {
    let base = Clip::of(area);
    let mut clips: Vec<Clip> = Vec::new();

    for cmd in commands {
        let clip = clips.last().copied().unwrap_or(base);
        match cmd {
            RenderCommand::DrawRect { rect, color, .. } => {
                let color = theme_to_color(*color);
                let left = cell(area.x, rect.x, CELL_W);
                let right = (i64::from(area.x) + (rect.right() / CELL_W).ceil() as i64).max(left + 1);
                let (x0, x1) = (left.max(i64::from(clip.x0)), right.min(i64::from(clip.x1)));
                let top = rect.y / CELL_H;
                let bottom = rect.bottom() / CELL_H;
                let first_row = (top.floor() as i64).max(i64::from(clip.y0) - i64::from(area.y));
                let last_row = (bottom.ceil() as i64).min(i64::from(clip.y1) - i64::from(area.y));
                for row in first_row..last_row {
                    let covered = bottom.min(row as f64 + 1.0) - top.max(row as f64);
                    let eighths = (covered * 8.0).round() as usize;
                    if eighths == 0 {
                        continue;
                    }
                    let reaches_floor = bottom >= row as f64 + 1.0;
                    let y = i64::from(area.y) + row;
                    for x in x0..x1 {
                        let Some(c) = cell_at(buf, clip, x, y) else {
                            continue;
                        };
                        if eighths >= 8 {
                            c.set_char(' ').set_bg(color);
                        } else if reaches_floor {
                            c.set_char(LOWER_BLOCKS[eighths]).set_fg(color);
                        } else if eighths >= 4 {
                            c.set_char('▀').set_fg(color);
                        }
                    }
                }
            }
            RenderCommand::DrawLine { from, to, color, .. } => {
                let color = theme_to_color(*color);
                let (x0, y0) = (cell(area.x, from.x, CELL_W), cell(area.y, from.y, CELL_H));
                let (x1, y1) = (cell(area.x, to.x, CELL_W), cell(area.y, to.y, CELL_H));
                if x0 == x1 {
                    let y_end = cell(area.y, to.y.max(from.y) - 0.5, CELL_H).min(i64::from(clip.y1));
                    for y in y0.min(y1).max(i64::from(clip.y0))..=y_end {
                        if let Some(c) = cell_at(buf, clip, x0, y) {
                            c.set_char('│').set_fg(color);
                        }
                    }
                } else if y0 == y1 {
                    let (first, last) = (x0.min(x1).max(i64::from(clip.x0)), x0.max(x1).min(i64::from(clip.x1)));
                    for x in first..=last {
                        if let Some(c) = cell_at(buf, clip, x, y0) {
                            c.set_char('─').set_fg(color);
                        }
                    }
                }
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                ..
            } => {
                let color = theme_to_color(*color);
                let x = cell(area.x, position.x, CELL_W);
                let y = cell(area.y, position.y, CELL_H);
                for (i, ch) in text.as_str().chars().enumerate() {
                    if let Some(c) = cell_at(buf, clip, x + i as i64, y) {
                        c.set_char(ch).set_fg(color);
                    }
                }
            }
            RenderCommand::DrawPolygon { points, color } => {
                if points.is_empty() {
                    continue;
                }
                let n = points.len() as f64;
                let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
                let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
                let color = theme_to_color(*color);
                if let Some(c) = cell_at(buf, clip, cell(area.x, cx, CELL_W), cell(area.y, cy, CELL_H)) {
                    c.set_char('◆').set_fg(color);
                }
            }
            RenderCommand::DrawPattern { rect, color, .. } => {
                let color = theme_to_color(*color);
                let region = clip_rect(area, *rect).intersect(clip);
                for y in region.y0..region.y1 {
                    for x in region.x0..region.x1 {
                        buf[(x, y)].set_char('╱').set_fg(color);
                    }
                }
            }
            RenderCommand::SetClip { rect } => clips.push(clip_rect(area, *rect).intersect(clip)),
            RenderCommand::ClearClip => {
                clips.pop();
            }
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}

fn format_time(us: f64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us.round() as i64)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{us:.0}"))
}

/// Short human form of a duration in microseconds.
fn human_duration(us: f64) -> String {
    const UNITS: [(f64, &str); 6] = [
        (86_400e6, "d"),
        (3_600e6, "h"),
        (60e6, "m"),
        (1e6, "s"),
        (1e3, "ms"),
        (1.0, "µs"),
    ];
    for (size, suffix) in UNITS {
        if us >= size {
            return format!("{:.1}{suffix}", us / size);
        }
    }
    format!("{us:.0}µs")
}

struct TerminalApp {
    surface: RenderSurface<Local>,
    next_gesture: u64,
    message: String,
}

impl TerminalApp {
    fn new(timestamps: Vec<i64>, mut config: TimelineConfig, window: TimeRange) -> Result<Self> {
        config.grid.axis_height_px = CELL_H;
        let metrics = FixedWidthMetrics { char_width: CELL_W };
        let mut surface = RenderSurface::new(Local, config, &metrics, 80.0 * CELL_W, 20.0 * CELL_H, window)?;
        surface.load(timestamps)?;
        Ok(Self {
            surface,
            next_gesture: 1,
            message: String::new(),
        })
    }

    fn gesture(&mut self) -> u64 {
        let id = self.next_gesture;
        self.next_gesture += 1;
        id
    }

    fn send(&mut self, event: InputEvent) {
        for e in self.surface.handle_event(event) {
            if let SurfaceEvent::NearestRowSelected { row, timestamp } = e {
                self.message = format!("row {row} at {}", format_time(timestamp as f64));
            }
        }
    }

    /// A whole drag gesture from the centre, as if the mouse had done it.
    fn pan_by(&mut self, dx: f64) {
        let (width, height) = self.surface.size();
        let (x, y) = (width / 2.0, height / 2.0);
        let gesture = self.gesture();
        self.send(InputEvent::PointerDown { gesture, x, y });
        self.send(InputEvent::PointerMove { x: x + dx, y });
        self.send(InputEvent::PointerUp { gesture, x: x + dx, y });
        self.send(InputEvent::PointerLeave);
    }

    fn zoom_at_centre(&mut self, direction: f64) {
        let (width, _) = self.surface.size();
        let delta_y = direction * self.surface.config().viewport.wheel_scale;
        self.send(InputEvent::Wheel {
            delta_y,
            mode: WheelMode::Pixel,
            x: width / 2.0,
        });
    }

    fn reset_zoom(&mut self) {
        if let Some(full) = self.surface.full_range()
            && let Err(e) = self.surface.set_zoom_range(full)
        {
            tracing::warn!(error = %e, "cannot reset zoom");
        }
    }

    fn header(&self, title: &str) -> String {
        format!(
            " timeline: {title} ({} events) | ←→ pan | +/- zoom | 0 reset | c clear | q quit ",
            self.surface.index().len()
        )
    }

    fn status(&self) -> String {
        let zoom = self.surface.zoom_range();
        let window = format!(
            "{} .. {} ({})",
            format_time(zoom.start),
            format_time(zoom.end),
            human_duration(zoom.duration())
        );
        let hover = match self.surface.hover() {
            Some(h) => match h.bin {
                Some(bin) => format!(
                    " | {} .. {}: {} events",
                    format_time(bin.start as f64),
                    format_time(bin.end as f64),
                    bin.count
                ),
                None => format!(" | {}: no events", format_time(h.time_us as f64)),
            },
            None => String::new(),
        };
        let message = if self.message.is_empty() {
            String::new()
        } else {
            format!(" | {}", self.message)
        };
        format!(" {window}{hover}{message}")
    }
}

/// Pixel position of a mouse cell inside the surface area.
fn mouse_px(area: Rect, column: u16, row: u16) -> (f64, f64) {
    let x = (f64::from(column.saturating_sub(area.x)) + 0.5) * CELL_W;
    let y = (f64::from(row.saturating_sub(area.y)) + 0.5) * CELL_H;
    (x, y)
}

pub fn run(timestamps: Vec<i64>, config: TimelineConfig, window: TimeRange, title: &str) -> Result<()> {
    let mut app = TerminalApp::new(timestamps, config, window)?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, title);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut TerminalApp,
    title: &str,
) -> Result<()> {
    let mut dragging: Option<u64> = None;
    loop {
        let size = terminal.size()?;
        let area = Rect::new(0, 1, size.width, size.height.saturating_sub(2));
        let (width, height) = (f64::from(area.width) * CELL_W, f64::from(area.height) * CELL_H);
        if app.surface.size() != (width, height) && width > 0.0 {
            app.send(InputEvent::Resize { width, height });
        }
        let commands = app.surface.paint()?;
        let header = app.header(title);
        let status = app.status();

        terminal.draw(|frame| {
            let full = frame.area();
            frame.render_widget(
                Paragraph::new(Line::from(header)).style(Style::default().fg(Color::White).bg(Color::DarkGray)),
                Rect::new(0, 0, full.width, 1),
            );
            rasterize(&commands, area, frame.buffer_mut());
            frame.render_widget(
                Paragraph::new(Line::from(status)).style(Style::default().fg(Color::Gray)),
                Rect::new(0, full.height.saturating_sub(1), full.width, 1),
            );
        })?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Left => app.pan_by(width * PAN_STEP),
                KeyCode::Right => app.pan_by(-width * PAN_STEP),
                KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_at_centre(-1.0),
                KeyCode::Char('-') => app.zoom_at_centre(1.0),
                KeyCode::Char('0') => app.reset_zoom(),
                KeyCode::Char('c') => {
                    app.surface.clear_indicators();
                    app.message.clear();
                }
                _ => {}
            },
            Event::Mouse(mouse) => {
                let (x, y) = mouse_px(area, mouse.column, mouse.row);
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        let gesture = app.gesture();
                        dragging = Some(gesture);
                        app.send(InputEvent::PointerDown { gesture, x, y });
                    }
                    MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                        app.send(InputEvent::PointerMove { x, y });
                    }
                    MouseEventKind::Up(MouseButton::Left) => {
                        if let Some(gesture) = dragging.take() {
                            app.send(InputEvent::PointerUp { gesture, x, y });
                        }
                    }
                    MouseEventKind::ScrollUp => app.send(InputEvent::Wheel {
                        delta_y: -1.0,
                        mode: WheelMode::Line,
                        x,
                    }),
                    MouseEventKind::ScrollDown => app.send(InputEvent::Wheel {
                        delta_y: 1.0,
                        mode: WheelMode::Line,
                        x,
                    }),
                    _ => {}
                }
            }
            _ => {}
        }
    }
    Ok(())
}
