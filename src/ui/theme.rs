/// Theme palette to egui color conversion

use eframe::egui::Color32;

use crate::core::classify::{ColorTier, Theme};

/// Text color for a classified reading under the active theme
pub fn tier_color(theme: Theme, tier: ColorTier) -> Color32 {
    parse_hex(theme.hex(tier))
}

/// Color for acquisition error text
pub fn error_color(theme: Theme) -> Color32 {
    parse_hex(theme.error_hex())
}

/// Panel window background
pub fn panel_background(theme: Theme) -> Color32 {
    match theme {
        Theme::Dark => Color32::from_rgb(0x2b, 0x2b, 0x2b),
        Theme::Light => Color32::from_rgb(0xf2, 0xf2, 0xf2),
    }
}

fn parse_hex(hex: &str) -> Color32 {
    let hex = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0xff)
    };
    Color32::from_rgb(channel(0..2), channel(2..4), channel(4..6))
}
