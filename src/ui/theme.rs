use ratatui::style::Color;

/// Colours for the metronome screen
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub bg: Color,
    pub fg: Color,
    /// Lit beat cell
    pub beat_active: Color,
    /// Unlit beat cell
    pub beat_inactive: Color,
    /// Lit downbeat cell
    pub beat_accent: Color,
    pub label: Color,
    /// Speed-trainer gauge below half way, past half way, at the ceiling
    pub meter_low: Color,
    pub meter_mid: Color,
    pub meter_high: Color,
    pub border: Color,
    pub highlight: Color,
    pub dimmed: Color,
    pub error: Color,
}

/// Registered themes in cycling order
const THEMES: [(&str, fn() -> Theme); 5] = [
    ("default", Theme::terminal),
    ("phosphor-green", || Theme::mono("phosphor-green", (0, 255, 0), None)),
    ("amber-crt", || Theme::mono("amber-crt", (255, 176, 0), Some((255, 90, 40)))),
    ("blue-terminal", || Theme::mono("blue-terminal", (100, 180, 255), Some((255, 120, 120)))),
    ("high-contrast", || Theme::mono("high-contrast", (255, 255, 255), None)),
];

/// Scale an RGB colour towards black (`factor < 1`) or white (`factor > 1`)
fn shade((r, g, b): (u8, u8, u8), factor: f32) -> Color {
    let channel = |c: u8| {
        let c = c as f32;
        let v = if factor <= 1.0 {
            c * factor
        } else {
            c + (255.0 - c) * (factor - 1.0)
        };
        v.round().clamp(0.0, 255.0) as u8
    };
    Color::Rgb(channel(r), channel(g), channel(b))
}

impl Theme {
    /// Follows the terminal's own ANSI palette
    fn terminal() -> Self {
        Self {
            name: "default",
            bg: Color::Reset,
            fg: Color::Reset,
            beat_active: Color::Green,
            beat_inactive: Color::DarkGray,
            beat_accent: Color::Yellow,
            label: Color::Cyan,
            meter_low: Color::Green,
            meter_mid: Color::Yellow,
            meter_high: Color::Red,
            border: Color::White,
            highlight: Color::Magenta,
            dimmed: Color::DarkGray,
            error: Color::Red,
        }
    }

    /// Single-hue CRT look: every colour is a shade of `base` on black.
    /// `error` falls back to a pale tint of the base when not given.
    fn mono(name: &'static str, base: (u8, u8, u8), error: Option<(u8, u8, u8)>) -> Self {
        Self {
            name,
            bg: Color::Black,
            fg: shade(base, 1.0),
            beat_active: shade(base, 1.0),
            beat_inactive: shade(base, 0.3),
            beat_accent: shade(base, 1.6),
            label: shade(base, 0.8),
            meter_low: shade(base, 0.6),
            meter_mid: shade(base, 0.8),
            meter_high: shade(base, 1.0),
            border: shade(base, 0.7),
            highlight: shade(base, 1.6),
            dimmed: shade(base, 0.25),
            error: shade(error.unwrap_or(base), if error.is_some() { 1.0 } else { 1.8 }),
        }
    }

    /// Get theme by name
    pub fn from_name(name: &str) -> Option<Self> {
        THEMES.iter().find(|(n, _)| *n == name).map(|(_, build)| build())
    }

    /// List all available theme names
    pub fn available_themes() -> Vec<&'static str> {
        THEMES.iter().map(|(name, _)| *name).collect()
    }

    /// The theme after this one, wrapping
    pub fn next(&self) -> Self {
        let idx = THEMES.iter().position(|(n, _)| *n == self.name).unwrap_or(0);
        (THEMES[(idx + 1) % THEMES.len()].1)()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::terminal()
    }
}
