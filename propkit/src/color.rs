//! Colour parsing for `.color` properties.
//!
//! Parsing never fails: malformed text degrades to a best-effort RGBA value.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::Color;

lazy_static! {
    static ref NUMBER_REGEX: Regex = Regex::new(r"-?\d+(?:\.\d+)?").unwrap();
}

/// Parses `#RGB`, `#RRGGBB`, `#RRGGBBAA`, or up to four numeric channels
/// (`"10, 20, 30"`, `"rgba(10 20 30 40)"`).
///
/// Numeric channels are truncated and clamped to `[0, 255]`; missing channels
/// default to `0, 0, 0, 255`.
pub fn parse_color(value: &str) -> Color {
    let value = value.trim();
    if let Some(color) = parse_hex(value) {
        return color;
    }

    let mut channels = [0u8, 0, 0, 255];
    for (channel, token) in channels.iter_mut().zip(NUMBER_REGEX.find_iter(value)) {
        if let Ok(number) = token.as_str().parse::<f64>() {
            *channel = number.trunc().clamp(0.0, 255.0) as u8;
        }
    }
    Color::from((channels[0], channels[1], channels[2], channels[3]))
}

fn parse_hex(value: &str) -> Option<Color> {
    let digits = value.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    match digits.len() {
        3 => {
            let mut channels = digits
                .chars()
                .filter_map(|c| c.to_digit(16))
                .map(|d| (d * 17) as u8);
            Some(Color::rgb(channels.next()?, channels.next()?, channels.next()?))
        }
        6 => Some(Color::rgb(byte(0..2)?, byte(2..4)?, byte(4..6)?)),
        8 => Some(Color::rgba(byte(0..2)?, byte(2..4)?, byte(4..6)?, byte(6..8)?)),
        _ => None,
    }
}

/// Renders a colour back to hex, omitting an opaque alpha channel.
pub fn format_color(color: Color) -> String {
    if color.a == 255 {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", color.r, color.g, color.b, color.a)
    }
}
