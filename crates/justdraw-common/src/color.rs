//! RGBA color shared by the 2D and WebGL renderers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// RGBA color.
///
/// `r`, `g`, `b` are in `[0, 255]` and `a` is in `[0, 1]`, matching CSS
/// `rgba()`. Channels are `f32` so interpolated colors keep their fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(255.0, 255.0, 255.0, 1.0);
    pub const RED: Color = Color::new(255.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from 8-bit channels.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32, g as f32, b as f32, 1.0)
    }

    /// Opaque gray level, the one-argument form of `Background(r)`.
    pub fn gray(level: f32) -> Self {
        Self::new(level, level, level, 1.0)
    }

    /// Channels scaled to `[0, 1]`, the form WebGL clear colors take.
    pub fn to_normalized(self) -> [f32; 4] {
        [self.r / 255.0, self.g / 255.0, self.b / 255.0, self.a]
    }

    /// CSS `rgba()` string.
    pub fn to_css(self) -> String {
        self.to_string()
    }

    /// Parse a CSS color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` or a basic name.
    pub fn parse(s: &str) -> Option<Color> {
        let s = s.trim().to_lowercase();

        if let Some(hex) = s.strip_prefix('#') {
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(hex.get(range)?, 16).ok()
            };
            return match hex.len() {
                3 => {
                    let short = |i: usize| {
                        u8::from_str_radix(&hex.get(i..i + 1)?.repeat(2), 16).ok()
                    };
                    Some(Color::from_rgb(short(0)?, short(1)?, short(2)?))
                }
                6 => Some(Color::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
                8 => {
                    let mut color =
                        Color::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?);
                    color.a = channel(6..8)? as f32 / 255.0;
                    Some(color)
                }
                _ => None,
            };
        }

        if s.starts_with("rgb") {
            let inner = s
                .trim_start_matches("rgba(")
                .trim_start_matches("rgb(")
                .trim_end_matches(')');
            let parts: Vec<&str> = inner.split(|c| c == ',' || c == '/').collect();

            if parts.len() >= 3 {
                let r: f32 = parts[0].trim().parse().ok()?;
                let g: f32 = parts[1].trim().parse().ok()?;
                let b: f32 = parts[2].trim().parse().ok()?;
                let a: f32 = parts
                    .get(3)
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1.0);
                return Some(Color::new(r, g, b, a));
            }
            return None;
        }

        match s.as_str() {
            "black" => Some(Color::from_rgb(0, 0, 0)),
            "white" => Some(Color::from_rgb(255, 255, 255)),
            "red" => Some(Color::from_rgb(255, 0, 0)),
            "green" => Some(Color::from_rgb(0, 128, 0)),
            "blue" => Some(Color::from_rgb(0, 0, 255)),
            "yellow" => Some(Color::from_rgb(255, 255, 0)),
            "cyan" => Some(Color::from_rgb(0, 255, 255)),
            "magenta" => Some(Color::from_rgb(255, 0, 255)),
            "gray" | "grey" => Some(Color::from_rgb(128, 128, 128)),
            "transparent" => Some(Color::TRANSPARENT),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({}, {}, {}, {})",
            self.r.round() as i32,
            self.g.round() as i32,
            self.b.round() as i32,
            self.a
        )
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s).ok_or_else(|| format!("invalid color '{s}'"))
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Color::new(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert!(matches!(Color::parse("#ff0000"), Some(c) if c.r == 255.0 && c.g == 0.0 && c.b == 0.0));
        assert!(matches!(Color::parse("#f00"), Some(c) if c.r == 255.0 && c.g == 0.0));
        assert!(matches!(Color::parse("red"), Some(c) if c.r == 255.0 && c.b == 0.0));
        assert!(matches!(Color::parse("rgb(0, 255, 0)"), Some(c) if c.g == 255.0));
        assert!(matches!(Color::parse("rgba(0, 0, 0, 0.5)"), Some(c) if c.a == 0.5));
        assert!(Color::parse("#12345").is_none());
        assert!(Color::parse("nope").is_none());
    }

    #[test]
    fn test_css_round_trip() {
        let c = Color::new(10.4, 20.6, 30.0, 0.25);
        assert_eq!(c.to_css(), "rgba(10, 21, 30, 0.25)");
        let parsed: Color = "rgba(10, 21, 30, 0.25)".parse().unwrap();
        assert_eq!(parsed, Color::new(10.0, 21.0, 30.0, 0.25));
    }

    #[test]
    fn test_normalized() {
        assert_eq!(Color::new(255.0, 0.0, 51.0, 0.5).to_normalized(), [1.0, 0.0, 0.2, 0.5]);
    }
}
