//! Color utilities
//!
//! Helper functions for color conversion and manipulation.

/// Parse hex color string to RGB tuple
///
/// Accepts formats: "#RRGGBB" or "RRGGBB"
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');

    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Parse a hex color into an RGB array, using `fallback` when malformed
pub fn hex_to_rgb_or(hex: &str, fallback: [u8; 3]) -> [u8; 3] {
    parse_hex_color(hex)
        .map(|(r, g, b)| [r, g, b])
        .unwrap_or(fallback)
}

/// Blend two colors with alpha
///
/// result = fg * alpha + bg * (1 - alpha)
pub fn blend_colors(
    bg: (u8, u8, u8),
    fg: (u8, u8, u8),
    alpha: f32,
) -> (u8, u8, u8) {
    let alpha = alpha.clamp(0.0, 1.0);
    let inv_alpha = 1.0 - alpha;

    let r = (fg.0 as f32 * alpha + bg.0 as f32 * inv_alpha).round() as u8;
    let g = (fg.1 as f32 * alpha + bg.1 as f32 * inv_alpha).round() as u8;
    let b = (fg.2 as f32 * alpha + bg.2 as f32 * inv_alpha).round() as u8;

    (r, g, b)
}
