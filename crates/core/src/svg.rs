//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use timeline_protocol::{FillPattern, RenderCommand, TextAlign, ThemeToken};

const PALETTE_DARK: [&str; 8] = [
    "#f5c2e7", "#89b4fa", "#a6e3a1", "#fab387", "#cba6f7", "#94e2d5", "#f9e2af", "#f38ba8",
];
const PALETTE_LIGHT: [&str; 8] = [
    "#ea76cb", "#1e66f5", "#40a02b", "#fe640b", "#8839ef", "#179299", "#df8e1d", "#d20f39",
];

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions.
/// `dark` selects the color palette.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 120);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:system-ui,-apple-system,sans-serif">"#,
    ));

    let bg = resolve_color(ThemeToken::Background, dark);
    svg.push_str(&format!(
        r#"<rect width="{width}" height="{height}" fill="{bg}"/>"#,
    ));

    // Patterns and clip paths are numbered in document order.
    let mut defs = 0usize;
    let mut open_clips = 0usize;

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
            } => {
                let fill = resolve_color(*color, dark);
                let stroke = border_color
                    .map(|b| format!(r#" stroke="{}" stroke-width="1""#, resolve_color(b, dark)))
                    .unwrap_or_default();
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}"{stroke}/>"#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
            } => {
                let stroke = resolve_color(*color, dark);
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{stroke}" stroke-width="{line_width}"/>"#,
                    from.x, from.y, to.x, to.y,
                ));
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let fill = resolve_color(*color, dark);
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" fill="{fill}" font-size="{font_size}" text-anchor="{anchor}" dominant-baseline="hanging">{}</text>"#,
                    position.x,
                    position.y,
                    escape_xml(text),
                ));
            }
            RenderCommand::DrawPolygon { points, color } => {
                let fill = resolve_color(*color, dark);
                let coords: Vec<String> = points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
                svg.push_str(&format!(
                    r#"<polygon points="{}" fill="{fill}"/>"#,
                    coords.join(" "),
                ));
            }
            RenderCommand::DrawPattern {
                rect,
                pattern: FillPattern::DiagonalStripes { spacing, width: stripe },
                color,
            } => {
                let stroke = resolve_color(*color, dark);
                let id = format!("stripes{defs}");
                defs += 1;
                svg.push_str(&format!(
                    r#"<defs><pattern id="{id}" width="{spacing}" height="{spacing}" patternUnits="userSpaceOnUse" patternTransform="rotate(45)"><line x1="0" y1="0" x2="0" y2="{spacing}" stroke="{stroke}" stroke-width="{stripe}"/></pattern></defs>"#,
                ));
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="url(#{id})"/>"#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
            }
            RenderCommand::SetClip { rect } => {
                let id = format!("clip{defs}");
                defs += 1;
                svg.push_str(&format!(
                    r#"<clipPath id="{id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath><g clip-path="url(#{id})">"#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                open_clips += 1;
            }
            RenderCommand::ClearClip => {
                if open_clips > 0 {
                    svg.push_str("</g>");
                    open_clips -= 1;
                }
            }
            RenderCommand::BeginGroup { id, .. } => {
                svg.push_str(&format!(r#"<g id="{}">"#, escape_xml(id)));
            }
            RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    for _ in 0..open_clips {
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

fn resolve_color(token: ThemeToken, dark: bool) -> &'static str {
    if let ThemeToken::Palette(i) = token {
        let palette = if dark { &PALETTE_DARK } else { &PALETTE_LIGHT };
        return palette[usize::from(i) % palette.len()];
    }
    if dark {
        match token {
            ThemeToken::Background => "#1e1e2e",
            ThemeToken::Surface | ThemeToken::AxisBackground => "#181825",
            ThemeToken::Border | ThemeToken::AxisBorder | ThemeToken::TooltipBorder => "#45475a",
            ThemeToken::TextPrimary | ThemeToken::AxisText | ThemeToken::TooltipText => "#cdd6f4",
            ThemeToken::TextMuted => "#a6adc8",
            ThemeToken::BarFill => "#89b4fa",
            ThemeToken::BarHover => "#b4befe",
            ThemeToken::NoDataPattern => "#313244",
            ThemeToken::GridMajor => "#585b70",
            ThemeToken::GridMinor => "#313244",
            ThemeToken::TooltipBackground => "#11111b",
            ThemeToken::Palette(_) => "#f5c2e7",
        }
    } else {
        match token {
            ThemeToken::Background => "#eff1f5",
            ThemeToken::Surface | ThemeToken::AxisBackground => "#e6e9ef",
            ThemeToken::Border | ThemeToken::AxisBorder | ThemeToken::TooltipBorder => "#bcc0cc",
            ThemeToken::TextPrimary | ThemeToken::AxisText | ThemeToken::TooltipText => "#4c4f69",
            ThemeToken::TextMuted => "#6c6f85",
            ThemeToken::BarFill => "#1e66f5",
            ThemeToken::BarHover => "#7287fd",
            ThemeToken::NoDataPattern => "#ccd0da",
            ThemeToken::GridMajor => "#acb0be",
            ThemeToken::GridMinor => "#ccd0da",
            ThemeToken::TooltipBackground => "#dce0e8",
            ThemeToken::Palette(_) => "#ea76cb",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_protocol::{Point, Rect};

    #[test]
    fn basic_svg_output() {
        let commands = vec![RenderCommand::DrawRect {
            rect: Rect::new(10.0, 20.0, 100.0, 18.0),
            color: ThemeToken::BarFill,
            border_color: None,
        }];
        let svg = render_svg(&commands, 800.0, 400.0, true);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("#89b4fa"));
    }

    #[test]
    fn escapes_xml_entities() {
        let commands = vec![RenderCommand::DrawText {
            position: Point::new(0.0, 0.0),
            text: "a < b & c".into(),
            color: ThemeToken::AxisText,
            font_size: 10.0,
            align: TextAlign::Left,
        }];
        let svg = render_svg(&commands, 400.0, 100.0, false);
        assert!(svg.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn patterns_polygons_and_clips() {
        let commands = vec![
            RenderCommand::SetClip {
                rect: Rect::new(0.0, 0.0, 50.0, 50.0),
            },
            RenderCommand::DrawPattern {
                rect: Rect::new(0.0, 0.0, 20.0, 50.0),
                pattern: FillPattern::DiagonalStripes {
                    spacing: 8.0,
                    width: 1.5,
                },
                color: ThemeToken::NoDataPattern,
            },
            RenderCommand::DrawPolygon {
                points: vec![Point::new(0.0, 0.0), Point::new(6.0, 0.0), Point::new(0.0, 6.0)],
                color: ThemeToken::Palette(9),
            },
        ];
        let svg = render_svg(&commands, 50.0, 50.0, false);
        assert!(svg.contains(r#"<clipPath id="clip0">"#));
        assert!(svg.contains(r#"fill="url(#stripes1)""#));
        assert!(svg.contains(r#"points="0,0 6,0 0,6""#));
        // Palette indices wrap.
        assert!(svg.contains(PALETTE_LIGHT[1]));
        // Unclosed clip groups are closed before the end.
        assert_eq!(svg.matches("<g").count(), svg.matches("</g>").count());
    }
}
