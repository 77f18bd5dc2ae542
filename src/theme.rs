use eframe::egui::{Color32, Visuals};
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::error::AppError;

#[derive(RustEmbed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

/// Theme used when a palette fails to load.
pub const FALLBACK_THEME: &str = "Blue";

const BLUE: Palette = Palette::rgb([0x1f, 0x6a, 0xa5], [0x14, 0x48, 0x70], [0x3b, 0x8e, 0xd0]);

/// Where a theme's colours come from
#[derive(Debug, Clone, Copy)]
enum ThemeSource {
    Builtin(Palette),
    Embedded(&'static str),
}

/// Selectable themes, in menu order. The first one is the default.
const THEMES: &[(&str, ThemeSource)] = &[
    ("Dark Blue", ThemeSource::Builtin(Palette::rgb([0x1f, 0x53, 0x8d], [0x14, 0x37, 0x5e], [0x1f, 0x53, 0x8d]))),
    ("Green", ThemeSource::Builtin(Palette::rgb([0x2f, 0xa5, 0x72], [0x10, 0x6a, 0x43], [0x2c, 0xc9, 0x85]))),
    ("Blue", ThemeSource::Builtin(BLUE)),
    ("Autumn", ThemeSource::Embedded("autumn.json")),
    ("Breeze", ThemeSource::Embedded("breeze.json")),
    ("Carrot", ThemeSource::Embedded("carrot.json")),
    ("Cherry", ThemeSource::Embedded("cherry.json")),
    ("Coffee", ThemeSource::Embedded("coffee.json")),
    ("Lavender", ThemeSource::Embedded("lavender.json")),
    ("Marsh", ThemeSource::Embedded("marsh.json")),
    ("Metal", ThemeSource::Embedded("metal.json")),
    ("Midnight", ThemeSource::Embedded("midnight.json")),
    ("Orange", ThemeSource::Embedded("orange.json")),
    ("Patina", ThemeSource::Embedded("patina.json")),
    ("Pink", ThemeSource::Embedded("pink.json")),
    ("Red", ThemeSource::Embedded("red.json")),
    ("Rime", ThemeSource::Embedded("rime.json")),
    ("Rose", ThemeSource::Embedded("rose.json")),
    ("Sky", ThemeSource::Embedded("sky.json")),
    ("Violet", ThemeSource::Embedded("violet.json")),
    ("Yellow", ThemeSource::Embedded("yellow.json")),
];

/// Accent colours layered over egui's dark visuals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Selected rows, progress bar, links
    pub accent: Color32,
    /// Hovered widgets
    pub hover: Color32,
    /// Resting buttons
    pub button: Color32,
}

#[derive(Deserialize)]
struct PaletteFile {
    accent: String,
    hover: String,
    button: String,
}

impl Palette {
    const fn rgb(accent: [u8; 3], hover: [u8; 3], button: [u8; 3]) -> Self {
        Self {
            accent: Color32::from_rgb(accent[0], accent[1], accent[2]),
            hover: Color32::from_rgb(hover[0], hover[1], hover[2]),
            button: Color32::from_rgb(button[0], button[1], button[2]),
        }
    }

    fn from_json(bytes: &[u8]) -> Result<Self, AppError> {
        let file: PaletteFile = serde_json::from_slice(bytes)?;
        Ok(Self {
            accent: parse_hex(&file.accent)?,
            hover: parse_hex(&file.hover)?,
            button: parse_hex(&file.button)?,
        })
    }

    pub fn visuals(&self) -> Visuals {
        let mut v = Visuals::dark();
        v.selection.bg_fill = self.accent;
        v.hyperlink_color = self.accent;
        v.widgets.inactive.weak_bg_fill = self.button;
        v.widgets.inactive.bg_fill = self.button;
        v.widgets.hovered.weak_bg_fill = self.hover;
        v.widgets.hovered.bg_fill = self.hover;
        v.widgets.active.weak_bg_fill = self.accent;
        v.widgets.active.bg_fill = self.accent;
        v
    }
}

fn parse_hex(s: &str) -> Result<Color32, AppError> {
    let hex = s.trim().trim_start_matches('#');
    let bad = || AppError::Theme(format!("invalid colour {s:?}"));
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(bad());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
    Ok(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

pub fn theme_names() -> impl Iterator<Item = &'static str> {
    THEMES.iter().map(|(name, _)| *name)
}

pub fn default_theme() -> &'static str {
    THEMES[0].0
}

pub fn is_known(name: &str) -> bool {
    THEMES.iter().any(|(n, _)| *n == name)
}

/// Loads the palette for `name`.
pub fn palette(name: &str) -> Result<Palette, AppError> {
    let source = THEMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, s)| *s)
        .ok_or_else(|| AppError::Theme(format!("{name:?} is unknown")))?;
    match source {
        ThemeSource::Builtin(p) => Ok(p),
        ThemeSource::Embedded(file) => {
            let asset = ThemeAssets::get(file)
                .ok_or_else(|| AppError::Theme(format!("{file} is not bundled")))?;
            Palette::from_json(&asset.data)
        }
    }
}

/// Palette for `name`, or the fallback theme when it cannot be loaded.
pub fn palette_or_fallback(name: &str) -> Palette {
    palette(name).unwrap_or_else(|e| {
        tracing::warn!("Failed to load theme {}: {}. Falling back to '{}'.", name, e, FALLBACK_THEME);
        palette(FALLBACK_THEME).unwrap_or(BLUE)
    })
}
