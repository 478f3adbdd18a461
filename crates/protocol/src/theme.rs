use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    Background,
    Surface,
    Border,

    TextPrimary,
    TextMuted,

    // Histogram
    BarFill,
    BarHover,
    NoDataPattern,

    // Grid and time axis
    GridMajor,
    GridMinor,
    AxisBackground,
    AxisText,
    AxisBorder,

    // Tooltip
    TooltipBackground,
    TooltipText,
    TooltipBorder,

    /// Entry of the externally supplied, ordered RGB palette. Renderers wrap
    /// the index modulo their palette length.
    Palette(u8),
}
