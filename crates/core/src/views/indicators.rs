use serde::{Deserialize, Serialize};
use timeline_protocol::{Point, Rect, RenderCommand, ThemeToken};

use crate::viewport::ViewportTransform;

const LINE_WIDTH: f64 = 1.5;
const BRACKET_SIZE: f64 = 6.0;

/// Whether an indicator stands alone or bounds a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorRole {
    Point,
    /// Brackets point right, into the range.
    RangeStart,
    /// Brackets point left, into the range.
    RangeEnd,
}

/// A vertical marker over the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub timestamp: i64,
    pub role: IndicatorRole,
    pub color: ThemeToken,
}

impl Indicator {
    pub fn new(timestamp: i64, role: IndicatorRole, color: ThemeToken) -> Self {
        Self {
            timestamp,
            role,
            color,
        }
    }
}

/// Render indicators as full-height lines, with triangular brackets at the
/// top and bottom for range bounds.
///
/// Indicators outside the zoom range are skipped, never drawn partially.
pub fn render_indicators(
    indicators: &[Indicator],
    plot: Rect,
    view: &ViewportTransform,
) -> Vec<RenderCommand> {
    let zoom = view.zoom_range();
    let mut commands = Vec::with_capacity(indicators.len() * 3);

    for indicator in indicators {
        let t = indicator.timestamp as f64;
        if !zoom.contains(t) {
            continue;
        }
        let x = plot.x + view.time2pixel(t);
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, plot.y),
            to: Point::new(x, plot.bottom()),
            color: indicator.color,
            width: LINE_WIDTH,
        });

        let inward = match indicator.role {
            IndicatorRole::Point => continue,
            IndicatorRole::RangeStart => BRACKET_SIZE,
            IndicatorRole::RangeEnd => -BRACKET_SIZE,
        };
        let (top, bottom) = (plot.y, plot.bottom());
        commands.push(RenderCommand::DrawPolygon {
            points: vec![
                Point::new(x, top),
                Point::new(x + inward, top),
                Point::new(x, top + BRACKET_SIZE),
            ],
            color: indicator.color,
        });
        commands.push(RenderCommand::DrawPolygon {
            points: vec![
                Point::new(x, bottom),
                Point::new(x + inward, bottom),
                Point::new(x, bottom - BRACKET_SIZE),
            ],
            color: indicator.color,
        });
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewportConfig;
    use crate::range::TimeRange;

    fn view() -> ViewportTransform {
        match ViewportTransform::new(TimeRange::new(0.0, 1_000.0), 100.0, ViewportConfig::default()) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }

    const PLOT: Rect = Rect {
        x: 0.0,
        y: 0.0,
        w: 100.0,
        h: 80.0,
    };

    #[test]
    fn point_is_a_single_line() {
        let cmds = render_indicators(&[Indicator::new(500, IndicatorRole::Point, ThemeToken::Palette(0))], PLOT, &view());
        assert_eq!(cmds.len(), 1);
        assert!(matches!(
            cmds[0],
            RenderCommand::DrawLine { from, .. } if from.x == 50.0
        ));
    }

    #[test]
    fn range_bounds_get_inward_brackets() {
        let cmds = render_indicators(
            &[
                Indicator::new(200, IndicatorRole::RangeStart, ThemeToken::Palette(2)),
                Indicator::new(800, IndicatorRole::RangeEnd, ThemeToken::Palette(2)),
            ],
            PLOT,
            &view(),
        );
        let tips: Vec<f64> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawPolygon { points, .. } => Some(points[1].x),
                _ => None,
            })
            .collect();
        assert_eq!(tips, vec![26.0, 26.0, 74.0, 74.0]);
    }

    #[test]
    fn out_of_zoom_indicators_are_skipped() {
        let cmds = render_indicators(
            &[
                Indicator::new(-1, IndicatorRole::RangeStart, ThemeToken::Palette(1)),
                Indicator::new(1_000, IndicatorRole::RangeEnd, ThemeToken::Palette(1)),
            ],
            PLOT,
            &view(),
        );
        assert!(cmds.is_empty());
    }
}
