use timeline_protocol::ThemeToken;

/// Resolved RGBA color for egui rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ResolvedColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            Self::Dark => dark_visuals(),
            Self::Light => light_visuals(),
        }
    }
}

/// Indicator colors, indexed by `ThemeToken::Palette`.
const PALETTE_DARK: [ResolvedColor; 8] = [
    ResolvedColor::rgb(0xf5, 0xc2, 0xe7), // Pink
    ResolvedColor::rgb(0x89, 0xb4, 0xfa), // Blue
    ResolvedColor::rgb(0xa6, 0xe3, 0xa1), // Green
    ResolvedColor::rgb(0xfa, 0xb3, 0x87), // Peach
    ResolvedColor::rgb(0xcb, 0xa6, 0xf7), // Mauve
    ResolvedColor::rgb(0x94, 0xe2, 0xd5), // Teal
    ResolvedColor::rgb(0xf9, 0xe2, 0xaf), // Yellow
    ResolvedColor::rgb(0xf3, 0x8b, 0xa8), // Red
];

const PALETTE_LIGHT: [ResolvedColor; 8] = [
    ResolvedColor::rgb(0xea, 0x76, 0xcb),
    ResolvedColor::rgb(0x1e, 0x66, 0xf5),
    ResolvedColor::rgb(0x40, 0xa0, 0x2b),
    ResolvedColor::rgb(0xfe, 0x64, 0x0b),
    ResolvedColor::rgb(0x88, 0x39, 0xef),
    ResolvedColor::rgb(0x17, 0x92, 0x99),
    ResolvedColor::rgb(0xdf, 0x8e, 0x1d),
    ResolvedColor::rgb(0xd2, 0x0f, 0x39),
];

pub fn resolve(token: ThemeToken, mode: ThemeMode) -> egui::Color32 {
    match mode {
        ThemeMode::Dark => resolve_dark(token),
        ThemeMode::Light => resolve_light(token),
    }
    .to_color32()
}

fn resolve_dark(token: ThemeToken) -> ResolvedColor {
    // Catppuccin Mocha palette
    use ThemeToken::*;
    match token {
        Background => ResolvedColor::rgb(0x11, 0x11, 0x1b), // Crust
        Surface => ResolvedColor::rgb(0x18, 0x18, 0x25),    // Mantle
        Border => ResolvedColor::rgb(0x31, 0x32, 0x44),     // Surface0

        TextPrimary => ResolvedColor::rgb(0xcd, 0xd6, 0xf4), // Text
        TextMuted => ResolvedColor::rgb(0xa6, 0xad, 0xc8),   // Subtext0

        BarFill => ResolvedColor::rgb(0x89, 0xb4, 0xfa),  // Blue
        BarHover => ResolvedColor::rgb(0xb4, 0xbe, 0xfe), // Lavender
        NoDataPattern => ResolvedColor::rgba(0x6c, 0x70, 0x86, 90), // Overlay0

        GridMajor => ResolvedColor::rgba(0x58, 0x5b, 0x70, 200), // Surface2
        GridMinor => ResolvedColor::rgba(0x31, 0x32, 0x44, 160), // Surface0

        AxisBackground => ResolvedColor::rgb(0x18, 0x18, 0x25), // Mantle
        AxisText => ResolvedColor::rgb(0xba, 0xc2, 0xde),       // Subtext1
        AxisBorder => ResolvedColor::rgb(0x45, 0x47, 0x5a),     // Surface1

        TooltipBackground => ResolvedColor::rgba(0x1e, 0x1e, 0x2e, 240), // Base
        TooltipText => ResolvedColor::rgb(0xcd, 0xd6, 0xf4),
        TooltipBorder => ResolvedColor::rgb(0x45, 0x47, 0x5a),

        Palette(i) => PALETTE_DARK[usize::from(i) % PALETTE_DARK.len()],
    }
}

fn resolve_light(token: ThemeToken) -> ResolvedColor {
    use ThemeToken::*;
    match token {
        Background => ResolvedColor::rgb(255, 255, 255),
        Surface => ResolvedColor::rgb(245, 245, 248),
        Border => ResolvedColor::rgb(210, 210, 220),

        TextPrimary => ResolvedColor::rgb(20, 20, 30),
        TextMuted => ResolvedColor::rgb(100, 100, 110),

        BarFill => ResolvedColor::rgb(50, 110, 220),
        BarHover => ResolvedColor::rgb(40, 80, 180),
        NoDataPattern => ResolvedColor::rgba(120, 120, 140, 70),

        GridMajor => ResolvedColor::rgba(150, 150, 165, 200),
        GridMinor => ResolvedColor::rgba(210, 210, 220, 160),

        AxisBackground => ResolvedColor::rgb(245, 245, 248),
        AxisText => ResolvedColor::rgb(80, 80, 100),
        AxisBorder => ResolvedColor::rgb(210, 210, 220),

        TooltipBackground => ResolvedColor::rgba(250, 250, 252, 245),
        TooltipText => ResolvedColor::rgb(40, 40, 50),
        TooltipBorder => ResolvedColor::rgb(200, 200, 210),

        Palette(i) => PALETTE_LIGHT[usize::from(i) % PALETTE_LIGHT.len()],
    }
}

// ── Typography scale ───────────────────────────────────────────────────────

pub const FONT_TITLE: f32 = 16.0;
pub const FONT_BODY: f32 = 12.0;
pub const FONT_CAPTION: f32 = 11.0;
/// Axis label size; the grid planner measures labels at this size.
pub const FONT_AXIS: f32 = 10.0;

// ── egui visual presets ────────────────────────────────────────────────────

/// Catppuccin Mocha dark visuals for egui widgets.
pub fn dark_visuals() -> egui::Visuals {
    let mut v = egui::Visuals::dark();
    v.panel_fill = egui::Color32::from_rgb(0x18, 0x18, 0x25);
    v.window_fill = egui::Color32::from_rgb(0x1e, 0x1e, 0x2e);
    v.extreme_bg_color = egui::Color32::from_rgb(0x11, 0x11, 0x1b);
    v.faint_bg_color = egui::Color32::from_rgb(0x1e, 0x1e, 0x2e);
    v.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(0x31, 0x32, 0x44);
    v.widgets.noninteractive.fg_stroke =
        egui::Stroke::new(1.0, egui::Color32::from_rgb(0xba, 0xc2, 0xde));
    v.widgets.inactive.bg_fill = egui::Color32::from_rgb(0x45, 0x47, 0x5a);
    v.widgets.hovered.bg_fill = egui::Color32::from_rgb(0x58, 0x5b, 0x70);
    v.widgets.active.bg_fill = egui::Color32::from_rgb(0x89, 0xb4, 0xfa);
    v.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::from_rgb(0x1e, 0x1e, 0x2e));
    v.selection.bg_fill = egui::Color32::from_rgba_unmultiplied(0x89, 0xb4, 0xfa, 60);
    v.warn_fg_color = egui::Color32::from_rgb(0xf9, 0xe2, 0xaf);
    v.error_fg_color = egui::Color32::from_rgb(0xf3, 0x8b, 0xa8);
    v
}

pub fn light_visuals() -> egui::Visuals {
    let mut v = egui::Visuals::light();
    v.panel_fill = egui::Color32::from_rgb(250, 250, 252);
    v.window_fill = egui::Color32::from_rgb(255, 255, 255);
    v.faint_bg_color = egui::Color32::from_rgb(245, 245, 248);
    v.widgets.inactive.bg_fill = egui::Color32::from_rgb(230, 230, 235);
    v.widgets.hovered.bg_fill = egui::Color32::from_rgb(220, 220, 228);
    v.widgets.active.bg_fill = egui::Color32::from_rgb(50, 110, 220);
    v.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
    v.selection.bg_fill = egui::Color32::from_rgba_unmultiplied(50, 110, 220, 50);
    v.warn_fg_color = egui::Color32::from_rgb(230, 170, 0);
    v.error_fg_color = egui::Color32::from_rgb(211, 47, 47);
    v
}

/// Apply the typography scale to egui styles.
pub fn apply_typography(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.text_styles.insert(
        egui::TextStyle::Heading,
        egui::FontId::proportional(FONT_TITLE),
    );
    style
        .text_styles
        .insert(egui::TextStyle::Body, egui::FontId::proportional(FONT_BODY));
    style.text_styles.insert(
        egui::TextStyle::Button,
        egui::FontId::proportional(FONT_BODY),
    );
    style.text_styles.insert(
        egui::TextStyle::Small,
        egui::FontId::proportional(FONT_CAPTION),
    );
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}
