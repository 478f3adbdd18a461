use timeline_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken};

use crate::grid::GridLine;
use crate::viewport::ViewportTransform;

const MAJOR_TICK_HEIGHT: f64 = 8.0;
const MINOR_TICK_HEIGHT: f64 = 4.0;
const FONT_SIZE: f64 = 10.0;
const LABEL_INSET: f64 = 3.0;

/// Render the time axis strip and the grid lines over the plot.
///
/// `axis` is the strip along the bottom of the surface and `plot` the
/// histogram area above it. Every grid line gets a tick and a full-height
/// line; only lines with a non-empty label get text.
pub fn render_time_axis(
    lines: &[GridLine],
    plot: Rect,
    axis: Rect,
    view: &ViewportTransform,
) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(lines.len() * 3 + 4);

    commands.push(RenderCommand::DrawRect {
        rect: axis,
        color: ThemeToken::AxisBackground,
        border_color: None,
    });
    commands.push(RenderCommand::DrawLine {
        from: Point::new(axis.x, axis.y),
        to: Point::new(axis.right(), axis.y),
        color: ThemeToken::AxisBorder,
        width: 1.0,
    });

    commands.push(RenderCommand::SetClip {
        rect: Rect::new(plot.x, plot.y, plot.w, axis.bottom() - plot.y),
    });
    for line in lines {
        let x = plot.x + view.time2pixel(line.time_us as f64);
        if x < plot.x - 1.0 || x > plot.right() + 1.0 {
            // Edge lines still carry labels that may reach into view.
            if line.label.is_empty() || x > plot.right() {
                continue;
            }
        }
        let (color, tick) = if line.major {
            (ThemeToken::GridMajor, MAJOR_TICK_HEIGHT)
        } else {
            (ThemeToken::GridMinor, MINOR_TICK_HEIGHT)
        };

        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, plot.y),
            to: Point::new(x, plot.bottom()),
            color,
            width: if line.major { 1.0 } else { 0.5 },
        });
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, axis.y),
            to: Point::new(x, axis.y + tick),
            color: ThemeToken::AxisBorder,
            width: 1.0,
        });
        if !line.label.is_empty() {
            commands.push(RenderCommand::DrawText {
                position: Point::new(x + LABEL_INSET, axis.y + (axis.h - FONT_SIZE) / 2.0),
                text: line.label.clone(),
                color: ThemeToken::AxisText,
                font_size: FONT_SIZE,
                align: TextAlign::Left,
            });
        }
    }
    commands.push(RenderCommand::ClearClip);

    commands
}
