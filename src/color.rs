// src/color.rs
// Linear RGBA color with the HSL round-trip the lighting effects and press
// highlight lean on. All channels are f32 in [0,1].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "default_alpha")]
    pub a: f32,
}

fn default_alpha() -> f32 {
    1.0
}

/// Hue in degrees [0,360), saturation/lightness in [0,1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Color {
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// 8-bit channels, handy for palette literals.
    #[inline]
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Color::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Color::rgb(
                byte(0)? as f32 / 255.0,
                byte(2)? as f32 / 255.0,
                byte(4)? as f32 / 255.0,
            )),
            8 => Some(Color::rgba(
                byte(0)? as f32 / 255.0,
                byte(2)? as f32 / 255.0,
                byte(4)? as f32 / 255.0,
                byte(6)? as f32 / 255.0,
            )),
            _ => None,
        }
    }

    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Relative luminance, Rec. 709 weights. Drives the light/dark legend ink choice.
    #[inline]
    pub fn luminance(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    pub fn to_hsl(self) -> Hsl {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let l = (max + min) * 0.5;
        let d = max - min;
        if d < f32::EPSILON {
            return Hsl { h: 0.0, s: 0.0, l };
        }
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        let h = if max == self.r {
            (self.g - self.b) / d + if self.g < self.b { 6.0 } else { 0.0 }
        } else if max == self.g {
            (self.b - self.r) / d + 2.0
        } else {
            (self.r - self.g) / d + 4.0
        };
        Hsl { h: h * 60.0, s, l }
    }

    pub fn from_hsl(hsl: Hsl) -> Self {
        let Hsl { h, s, l } = hsl;
        let h = h.rem_euclid(360.0) / 360.0;
        if s < f32::EPSILON {
            return Color::rgb(l, l, l);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |mut t: f32| {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };
        Color::rgb(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
    }

    /// Raise lightness by `delta` in this color's own hue/saturation; clamps to [0,1].
    pub fn lighten(self, delta: f32) -> Self {
        let mut hsl = self.to_hsl();
        hsl.l = (hsl.l + delta).clamp(0.0, 1.0);
        let mut out = Color::from_hsl(hsl);
        out.a = self.a;
        out
    }

    #[inline]
    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let c = Color::from_hex("#3fa7d6").unwrap();
        assert!((c.r - 0x3f as f32 / 255.0).abs() < 1e-6);
        assert!((c.g - 0xa7 as f32 / 255.0).abs() < 1e-6);
        assert!((c.b - 0xd6 as f32 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
        assert!(Color::from_hex("zz").is_none());
    }

    #[test]
    fn test_hsl_roundtrip() {
        for hex in ["#ff0000", "#00ff80", "#123456", "#c0c0c0"] {
            let c = Color::from_hex(hex).unwrap();
            let back = Color::from_hsl(c.to_hsl());
            assert!((c.r - back.r).abs() < 1e-3, "{hex} r");
            assert!((c.g - back.g).abs() < 1e-3, "{hex} g");
            assert!((c.b - back.b).abs() < 1e-3, "{hex} b");
        }
    }

    #[test]
    fn test_lighten_raises_lightness() {
        let c = Color::from_hex("#404040").unwrap();
        let lighter = c.lighten(0.2);
        assert!(lighter.to_hsl().l > c.to_hsl().l);
        // Clamped at white.
        let white = Color::WHITE.lighten(0.5);
        assert!((white.to_hsl().l - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_luminance_ordering() {
        assert!(Color::WHITE.luminance() > Color::BLACK.luminance());
        let green = Color::rgb(0.0, 1.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        assert!(green.luminance() > blue.luminance());
    }
}
