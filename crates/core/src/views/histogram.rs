use timeline_protocol::{FillPattern, Rect, RenderCommand, ThemeToken};

use crate::index::HistogramBin;
use crate::range::TimeRange;
use crate::viewport::ViewportTransform;

const NO_DATA_STRIPES: FillPattern = FillPattern::DiagonalStripes {
    spacing: 8.0,
    width: 1.5,
};

/// Pixel height of a bar holding `count` events.
///
/// A single event gets exactly `single_fraction` of the height so sparse
/// bins stay visible; larger counts grow logarithmically towards the full
/// height at `max_count`.
pub fn bar_height(count: usize, max_count: usize, available: f64, single_fraction: f64) -> f64 {
    match count {
        0 => 0.0,
        1 => single_fraction * available,
        _ => {
            let max = max_count.max(count) as f64;
            let scaled = ((count as f64) + 1.0).ln() / (max + 1.0).ln();
            (single_fraction + (1.0 - single_fraction) * scaled) * available
        }
    }
}

/// Bars for the bins overlapping the zoom range, clipped to `plot`.
pub fn render_histogram(
    bins: &[HistogramBin],
    max_count: usize,
    plot: Rect,
    view: &ViewportTransform,
    single_fraction: f64,
    hovered: Option<HistogramBin>,
) -> Vec<RenderCommand> {
    let zoom = view.zoom_range();
    let first = bins.partition_point(|b| (b.end as f64) <= zoom.start);
    let visible = bins[first..]
        .iter()
        .take_while(|b| (b.start as f64) < zoom.end);

    let mut commands = Vec::with_capacity(bins.len().saturating_sub(first).min(4096) + 2);
    commands.push(RenderCommand::SetClip { rect: plot });
    for bin in visible {
        let height = bar_height(bin.count, max_count, plot.h, single_fraction);
        if height <= 0.0 {
            continue;
        }
        let left = plot.x + view.time2pixel(bin.start as f64);
        let right = plot.x + view.time2pixel(bin.end as f64);
        let color = if hovered == Some(*bin) {
            ThemeToken::BarHover
        } else {
            ThemeToken::BarFill
        };
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(left, plot.bottom() - height, (right - left).max(1.0), height),
            color,
            border_color: None,
        });
    }
    commands.push(RenderCommand::ClearClip);
    commands
}

/// Hatched fill over the part of the zoom range outside `full`.
///
/// With no data at all the whole plot is hatched.
pub fn render_no_data(full: Option<TimeRange>, plot: Rect, view: &ViewportTransform) -> Vec<RenderCommand> {
    let zoom = view.zoom_range();
    let hatch = |left: f64, right: f64| RenderCommand::DrawPattern {
        rect: Rect::new(left, plot.y, right - left, plot.h),
        pattern: NO_DATA_STRIPES,
        color: ThemeToken::NoDataPattern,
    };

    let Some(full) = full else {
        return vec![hatch(plot.x, plot.right())];
    };
    let mut commands = Vec::new();
    if zoom.start < full.start {
        let edge = (plot.x + view.time2pixel(full.start)).min(plot.right());
        if edge > plot.x {
            commands.push(hatch(plot.x, edge));
        }
    }
    if zoom.end > full.end {
        let edge = (plot.x + view.time2pixel(full.end)).max(plot.x);
        if edge < plot.right() {
            commands.push(hatch(edge, plot.right()));
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewportConfig;

    fn view(start: f64, end: f64, width: f64) -> ViewportTransform {
        match ViewportTransform::new(TimeRange::new(start, end), width, ViewportConfig::default()) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }

    fn bin(start: i64, end: i64, count: usize) -> HistogramBin {
        HistogramBin { start, end, count }
    }

    fn rects(cmds: &[RenderCommand]) -> Vec<Rect> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn single_event_is_fixed_fraction() {
        for max in [1, 2, 10, 1_000_000] {
            assert_eq!(bar_height(1, max, 200.0, 0.15), 30.0);
        }
        assert_eq!(bar_height(0, 50, 200.0, 0.15), 0.0);
    }

    #[test]
    fn max_count_fills_available_height() {
        assert!((bar_height(40, 40, 100.0, 0.15) - 100.0).abs() < 1e-9);
        let mid = bar_height(5, 40, 100.0, 0.15);
        assert!(mid > 15.0 && mid < 100.0);
    }

    #[test]
    fn heights_increase_with_count() {
        let heights: Vec<f64> = (1..50).map(|c| bar_height(c, 49, 100.0, 0.15)).collect();
        assert!(heights.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn skips_bins_outside_zoom() {
        let bins = [bin(0, 10, 1), bin(100, 110, 3), bin(200, 210, 2), bin(900, 910, 1)];
        let v = view(95.0, 300.0, 205.0);
        let cmds = render_histogram(&bins, 3, Rect::new(0.0, 0.0, 205.0, 100.0), &v, 0.15, None);
        assert_eq!(rects(&cmds).len(), 2);
        assert!(matches!(cmds.first(), Some(RenderCommand::SetClip { .. })));
        assert!(matches!(cmds.last(), Some(RenderCommand::ClearClip)));
    }

    #[test]
    fn narrow_bins_are_at_least_one_pixel() {
        let bins = [bin(0, 1, 2)];
        let v = view(0.0, 10_000.0, 100.0);
        let cmds = render_histogram(&bins, 2, Rect::new(0.0, 0.0, 100.0, 50.0), &v, 0.15, None);
        assert_eq!(rects(&cmds)[0].w, 1.0);
    }

    #[test]
    fn hovered_bin_is_highlighted() {
        let bins = [bin(0, 10, 1), bin(10, 20, 2)];
        let v = view(0.0, 20.0, 100.0);
        let cmds = render_histogram(&bins, 2, Rect::new(0.0, 0.0, 100.0, 50.0), &v, 0.15, Some(bins[1]));
        let hovered = cmds
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawRect { color: ThemeToken::BarHover, .. }))
            .count();
        assert_eq!(hovered, 1);
    }

    #[test]
    fn no_data_covers_both_sides() {
        let mut v = view(0.0, 1_000.0, 100.0);
        assert!(render_no_data(Some(TimeRange::new(0.0, 1_000.0)), Rect::new(0.0, 0.0, 100.0, 40.0), &v).is_empty());

        assert_eq!(v.set_zoom_range(TimeRange::new(-500.0, 1_500.0)), Ok(true));
        let cmds = render_no_data(Some(TimeRange::new(0.0, 1_000.0)), Rect::new(0.0, 0.0, 100.0, 40.0), &v);
        let widths: Vec<f64> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawPattern { rect, .. } => Some(rect.w),
                _ => None,
            })
            .collect();
        assert_eq!(widths, vec![25.0, 25.0]);
    }

    #[test]
    fn empty_dataset_is_all_no_data() {
        let v = view(0.0, 1_000.0, 100.0);
        let cmds = render_no_data(None, Rect::new(0.0, 0.0, 100.0, 40.0), &v);
        assert_eq!(cmds.len(), 1);
    }
}
