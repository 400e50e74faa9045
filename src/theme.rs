use std::fs;
use std::path::Path;

use ratatui::style::Color;
use serde::Deserialize;
use tracing::warn;

use crate::todo::Priority;

#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub panel_bg: Color,
    pub input_bg: Color,
    pub status_bg: Color,
    pub accent: Color,
    pub text_fg: Color,
    pub muted_fg: Color,
    pub done_fg: Color,
    pub priority_high: Color,
    pub priority_medium: Color,
    pub priority_low: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(30, 32, 40),
            panel_bg: Color::Rgb(40, 43, 54),
            input_bg: Color::Rgb(52, 56, 70),
            status_bg: Color::Rgb(24, 26, 32),
            accent: Color::Rgb(99, 102, 241),
            text_fg: Color::Rgb(226, 232, 240),
            muted_fg: Color::Rgb(148, 163, 184),
            done_fg: Color::Rgb(34, 197, 94),
            priority_high: Color::Rgb(220, 38, 38),
            priority_medium: Color::Rgb(217, 119, 6),
            priority_low: Color::Rgb(5, 150, 105),
        }
    }
}

impl Theme {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        let contents = match fs::read_to_string(path_ref) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(path = %path_ref.display(), error = %err, "theme file unreadable, using defaults");
                return Self::default();
            }
        };
        Self::from_toml_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path_ref.display(), error = %err, "theme file invalid, using defaults");
            Self::default()
        })
    }

    /// Every colour is optional; omitted entries keep their default.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let cfg: ThemeToml = toml::from_str(s)?;
        let colors = cfg.colors;
        let base = Self::default();
        let pick = |value: Option<RgbToml>, fallback: Color| value.map_or(fallback, RgbToml::to_color);
        Ok(Self {
            background: pick(colors.background, base.background),
            panel_bg: pick(colors.panel_bg, base.panel_bg),
            input_bg: pick(colors.input_bg, base.input_bg),
            status_bg: pick(colors.status_bg, base.status_bg),
            accent: pick(colors.accent, base.accent),
            text_fg: pick(colors.text_fg, base.text_fg),
            muted_fg: pick(colors.muted_fg, base.muted_fg),
            done_fg: pick(colors.done_fg, base.done_fg),
            priority_high: pick(colors.priority_high, base.priority_high),
            priority_medium: pick(colors.priority_medium, base.priority_medium),
            priority_low: pick(colors.priority_low, base.priority_low),
        })
    }

    pub fn priority_color(&self, priority: Priority) -> Color {
        match priority {
            Priority::High => self.priority_high,
            Priority::Medium => self.priority_medium,
            Priority::Low => self.priority_low,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ThemeToml {
    #[serde(default)]
    colors: ThemeColorsToml,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeColorsToml {
    background: Option<RgbToml>,
    panel_bg: Option<RgbToml>,
    input_bg: Option<RgbToml>,
    status_bg: Option<RgbToml>,
    accent: Option<RgbToml>,
    text_fg: Option<RgbToml>,
    muted_fg: Option<RgbToml>,
    done_fg: Option<RgbToml>,
    priority_high: Option<RgbToml>,
    priority_medium: Option<RgbToml>,
    priority_low: Option<RgbToml>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RgbToml {
    r: u8,
    g: u8,
    b: u8,
}

impl RgbToml {
    fn to_color(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}
