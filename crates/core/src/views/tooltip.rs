use timeline_protocol::{Point, Rect, RenderCommand, SharedStr, TextAlign, ThemeToken};

use crate::config::TooltipConfig;

const PADDING: f64 = 6.0;
const LINE_GAP: f64 = 3.0;

/// Edge of the tooltip box carrying the arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowSide {
    /// Box above the anchor.
    Bottom,
    /// Box below the anchor.
    Top,
    /// Box right of the anchor.
    Left,
    /// Box left of the anchor.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipPlacement {
    pub rect: Rect,
    pub arrow: ArrowSide,
    /// Point the arrow aims at, inside `bounds`.
    pub tip: Point,
}

/// Place a `width` x `height` box next to `anchor`, fully inside `bounds`.
///
/// The box prefers to sit centred above the anchor. When that would leave
/// the bounds it moves below, or beside the anchor if it overflows
/// horizontally, and the arrow flips to the facing edge.
pub fn place_tooltip(anchor: Point, width: f64, height: f64, bounds: Rect, arrow: f64) -> TooltipPlacement {
    let mut x = anchor.x - width / 2.0;
    let mut y = anchor.y - arrow - height;
    let mut side = ArrowSide::Bottom;

    if y < bounds.y {
        y = anchor.y + arrow;
        side = ArrowSide::Top;
    }
    if x < bounds.x {
        x = anchor.x + arrow;
        y = anchor.y - height / 2.0;
        side = ArrowSide::Left;
    } else if x + width > bounds.right() {
        x = anchor.x - arrow - width;
        y = anchor.y - height / 2.0;
        side = ArrowSide::Right;
    }

    let x = x.min(bounds.right() - width).max(bounds.x);
    let y = y.min(bounds.bottom() - height).max(bounds.y);
    let tip = Point::new(
        anchor.x.clamp(bounds.x, bounds.right().max(bounds.x)),
        anchor.y.clamp(bounds.y, bounds.bottom().max(bounds.y)),
    );
    TooltipPlacement {
        rect: Rect::new(x, y, width, height),
        arrow: side,
        tip,
    }
}

/// Triangle on the arrow edge pointing towards the tip.
fn arrow_points(placement: &TooltipPlacement, size: f64) -> Vec<Point> {
    let r = placement.rect;
    let along_x = placement.tip.x.clamp(r.x + size, (r.right() - size).max(r.x + size));
    let along_y = placement.tip.y.clamp(r.y + size, (r.bottom() - size).max(r.y + size));
    match placement.arrow {
        ArrowSide::Bottom => vec![
            Point::new(along_x - size, r.bottom()),
            Point::new(along_x + size, r.bottom()),
            Point::new(along_x, r.bottom() + size),
        ],
        ArrowSide::Top => vec![
            Point::new(along_x - size, r.y),
            Point::new(along_x + size, r.y),
            Point::new(along_x, r.y - size),
        ],
        ArrowSide::Left => vec![
            Point::new(r.x, along_y - size),
            Point::new(r.x, along_y + size),
            Point::new(r.x - size, along_y),
        ],
        ArrowSide::Right => vec![
            Point::new(r.right(), along_y - size),
            Point::new(r.right(), along_y + size),
            Point::new(r.right() + size, along_y),
        ],
    }
}

pub fn render_tooltip(placement: &TooltipPlacement, lines: &[SharedStr], config: &TooltipConfig) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(lines.len() + 2);
    commands.push(RenderCommand::DrawRect {
        rect: placement.rect,
        color: ThemeToken::TooltipBackground,
        border_color: Some(ThemeToken::TooltipBorder),
    });
    if config.arrow_px > 0.0 {
        commands.push(RenderCommand::DrawPolygon {
            points: arrow_points(placement, config.arrow_px),
            color: ThemeToken::TooltipBackground,
        });
    }
    let font_size = f64::from(config.font_size);
    let mut y = placement.rect.y + PADDING;
    for line in lines {
        if y + font_size > placement.rect.bottom() {
            break;
        }
        commands.push(RenderCommand::DrawText {
            position: Point::new(placement.rect.x + PADDING, y),
            text: line.clone(),
            color: ThemeToken::TooltipText,
            font_size,
            align: TextAlign::Left,
        });
        y += font_size + LINE_GAP;
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 400.0,
        h: 200.0,
    };

    #[test]
    fn prefers_above_the_anchor() {
        let p = place_tooltip(Point::new(200.0, 150.0), 100.0, 40.0, BOUNDS, 6.0);
        assert_eq!(p.arrow, ArrowSide::Bottom);
        assert_eq!(p.rect, Rect::new(150.0, 104.0, 100.0, 40.0));
    }

    #[test]
    fn flips_below_near_the_top() {
        let p = place_tooltip(Point::new(200.0, 10.0), 100.0, 40.0, BOUNDS, 6.0);
        assert_eq!(p.arrow, ArrowSide::Top);
        assert_eq!(p.rect.y, 16.0);
    }

    #[test]
    fn flips_sideways_at_the_edges() {
        let left = place_tooltip(Point::new(10.0, 100.0), 100.0, 40.0, BOUNDS, 6.0);
        assert_eq!(left.arrow, ArrowSide::Left);
        assert_eq!(left.rect.x, 16.0);

        let right = place_tooltip(Point::new(395.0, 100.0), 100.0, 40.0, BOUNDS, 6.0);
        assert_eq!(right.arrow, ArrowSide::Right);
        assert_eq!(right.rect.right(), 389.0);
    }

    #[test]
    fn box_always_stays_inside() {
        for ax in [-50.0, 0.0, 3.0, 120.0, 399.0, 500.0] {
            for ay in [-20.0, 0.0, 30.0, 199.0, 260.0] {
                let p = place_tooltip(Point::new(ax, ay), 120.0, 50.0, BOUNDS, 6.0);
                assert!(p.rect.is_within(&BOUNDS), "anchor ({ax}, {ay}) -> {:?}", p.rect);
                assert!(BOUNDS.contains(p.tip));
            }
        }
    }

    #[test]
    fn renders_box_arrow_and_lines() {
        let p = place_tooltip(Point::new(200.0, 150.0), 200.0, 52.0, BOUNDS, 6.0);
        let lines = [SharedStr::from("12:00:00 - 12:00:05"), SharedStr::from("42 events")];
        let cmds = render_tooltip(&p, &lines, &TooltipConfig::default());
        assert!(matches!(cmds[0], RenderCommand::DrawRect { .. }));
        assert!(matches!(cmds[1], RenderCommand::DrawPolygon { .. }));
        let texts = cmds
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawText { .. }))
            .count();
        assert_eq!(texts, 2);
    }
}
