use egui::{Align2, CornerRadius, FontId, Pos2, Rect, Shape, Stroke, StrokeKind};
use timeline_protocol::{FillPattern, RenderCommand, TextAlign};

use crate::theme::{self, ThemeMode};

fn to_egui_rect(rect: &timeline_protocol::Rect, offset: Pos2) -> Rect {
    Rect::from_min_size(
        Pos2::new(rect.x as f32 + offset.x, rect.y as f32 + offset.y),
        egui::vec2(rect.w as f32, rect.h as f32),
    )
}

fn to_pos(p: &timeline_protocol::Point, offset: Pos2) -> Pos2 {
    Pos2::new(p.x as f32 + offset.x, p.y as f32 + offset.y)
}

/// Text positions are the top edge of the label.
fn text_anchor(align: TextAlign) -> Align2 {
    match align {
        TextAlign::Left => Align2::LEFT_TOP,
        TextAlign::Center => Align2::CENTER_TOP,
        TextAlign::Right => Align2::RIGHT_TOP,
    }
}

/// 45° stripe segments covering `rect`, `spacing` apart measured across
/// the stripes. Segments overshoot the rect; callers clip.
fn stripe_segments(rect: Rect, spacing: f32) -> Vec<[Pos2; 2]> {
    if spacing <= 0.0 || rect.width() <= 0.0 || rect.height() <= 0.0 {
        return Vec::new();
    }
    let step = spacing * std::f32::consts::SQRT_2;
    let h = rect.height();
    let mut segments = Vec::new();
    let mut x = rect.left() - h;
    while x < rect.right() {
        segments.push([
            Pos2::new(x, rect.bottom()),
            Pos2::new(x + h, rect.top()),
        ]);
        x += step;
    }
    segments
}

/// Render a list of `RenderCommand` into an egui `Painter`.
///
/// `offset` is the top-left pixel position of the rendering area.
pub fn render_commands(
    painter: &mut egui::Painter,
    commands: &[RenderCommand],
    offset: Pos2,
    mode: ThemeMode,
) {
    let mut clip_stack: Vec<Rect> = Vec::new();

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
            } => {
                let egui_rect = to_egui_rect(rect, offset);
                if egui_rect.width() < 0.5 || egui_rect.height() < 0.5 {
                    continue;
                }
                if !painter.clip_rect().intersects(egui_rect) {
                    continue;
                }
                painter.rect_filled(egui_rect, CornerRadius::ZERO, theme::resolve(*color, mode));
                if let Some(bc) = border_color {
                    painter.rect_stroke(
                        egui_rect,
                        CornerRadius::ZERO,
                        Stroke::new(1.0, theme::resolve(*bc, mode)),
                        StrokeKind::Inside,
                    );
                }
            }

            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let size = *font_size as f32;
                if size < 1.0 || text.is_empty() {
                    continue;
                }
                painter.text(
                    to_pos(position, offset),
                    text_anchor(*align),
                    text.as_ref(),
                    FontId::proportional(size),
                    theme::resolve(*color, mode),
                );
            }

            RenderCommand::DrawLine {
                from,
                to,
                color,
                width,
            } => {
                painter.line_segment(
                    [to_pos(from, offset), to_pos(to, offset)],
                    Stroke::new(*width as f32, theme::resolve(*color, mode)),
                );
            }

            RenderCommand::DrawPolygon { points, color } => {
                if points.len() < 3 {
                    continue;
                }
                let points = points.iter().map(|p| to_pos(p, offset)).collect();
                painter.add(Shape::convex_polygon(
                    points,
                    theme::resolve(*color, mode),
                    Stroke::NONE,
                ));
            }

            RenderCommand::DrawPattern {
                rect,
                pattern: FillPattern::DiagonalStripes { spacing, width },
                color,
            } => {
                let egui_rect = to_egui_rect(rect, offset);
                if !painter.clip_rect().intersects(egui_rect) {
                    continue;
                }
                let clipped = painter.with_clip_rect(egui_rect);
                let stroke = Stroke::new(*width as f32, theme::resolve(*color, mode));
                for segment in stripe_segments(egui_rect, *spacing as f32) {
                    clipped.line_segment(segment, stroke);
                }
            }

            RenderCommand::SetClip { rect } => {
                let clip_rect = to_egui_rect(rect, offset);
                clip_stack.push(painter.clip_rect());
                let intersected = painter.clip_rect().intersect(clip_rect);
                painter.set_clip_rect(intersected);
            }

            RenderCommand::ClearClip => {
                if let Some(prev) = clip_stack.pop() {
                    painter.set_clip_rect(prev);
                }
            }

            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }

    // Leave the painter as we found it if a clip was never closed.
    if let Some(first) = clip_stack.first() {
        painter.set_clip_rect(*first);
    }
}
