// src/palette.rs
// Theme: maps color roles to base keycap materials and picks legend ink with
// guaranteed contrast. Themes are externally owned and passed in; the core
// keeps no global theme state.

use std::collections::HashMap;

use crate::color::Color;
use crate::layout::ColorRole;

/// Base surface description shared through the cache; KeyInstances clone it
/// and jitter their own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub roughness: f32,
    pub metallic: f32,
}

impl Material {
    pub fn new(color: Color, roughness: f32) -> Self {
        Material {
            color,
            roughness,
            metallic: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    /// Identifies the theme inside material cache signatures.
    pub name: String,
    base: HashMap<ColorRole, Color>,
    pub roughness: f32,
    /// Ink used on dark keycaps.
    pub ink_light: Color,
    /// Ink used on light keycaps.
    pub ink_dark: Color,
}

/// Backgrounds brighter than this take the dark ink.
const INK_SPLIT_LUMINANCE: f32 = 0.45;

impl Theme {
    /// Embedder-supplied palette. Assemblies require `base` to cover the
    /// `Default` role, since every unlisted role falls back to it.
    pub fn custom(
        name: impl Into<String>,
        base: HashMap<ColorRole, Color>,
        roughness: f32,
        ink_light: Color,
        ink_dark: Color,
    ) -> Self {
        Theme {
            name: name.into(),
            base,
            roughness,
            ink_light,
            ink_dark,
        }
    }

    /// Whether the theme carries its own color for `role`.
    pub fn defines(&self, role: ColorRole) -> bool {
        self.base.contains_key(&role)
    }

    /// Charcoal caps, warm accents.
    pub fn dark() -> Self {
        let mut base = HashMap::new();
        base.insert(ColorRole::Default, Color::rgb8(0x2b, 0x2d, 0x31));
        base.insert(ColorRole::Modifier, Color::rgb8(0x1f, 0x20, 0x23));
        base.insert(ColorRole::Accent, Color::rgb8(0xd9, 0x83, 0x24));
        base.insert(ColorRole::Function, Color::rgb8(0x3a, 0x3d, 0x44));
        base.insert(ColorRole::Danger, Color::rgb8(0xa6, 0x3d, 0x40));
        Theme {
            name: "dark".into(),
            base,
            roughness: 0.78,
            ink_light: Color::rgb8(0xe8, 0xe6, 0xe3),
            ink_dark: Color::rgb8(0x1b, 0x1b, 0x1d),
        }
    }

    /// Off-white caps, cool accents.
    pub fn light() -> Self {
        let mut base = HashMap::new();
        base.insert(ColorRole::Default, Color::rgb8(0xe8, 0xe4, 0xda));
        base.insert(ColorRole::Modifier, Color::rgb8(0xc9, 0xc4, 0xb8));
        base.insert(ColorRole::Accent, Color::rgb8(0x3f, 0x7c, 0xac));
        base.insert(ColorRole::Function, Color::rgb8(0xd6, 0xd2, 0xc8));
        base.insert(ColorRole::Danger, Color::rgb8(0xc9, 0x5d, 0x63));
        Theme {
            name: "light".into(),
            base,
            roughness: 0.72,
            ink_light: Color::rgb8(0xf5, 0xf4, 0xf1),
            ink_dark: Color::rgb8(0x23, 0x25, 0x28),
        }
    }

    /// Base color for a role; a role the theme does not carry falls back to
    /// `Default` rather than failing material construction.
    pub fn base_color(&self, role: ColorRole) -> Color {
        if let Some(c) = self.base.get(&role) {
            return *c;
        }
        log::debug!("role {role:?} missing from theme '{}', using default", self.name);
        self.base
            .get(&ColorRole::Default)
            .copied()
            .unwrap_or(Color::rgb(0.5, 0.5, 0.5))
    }

    pub fn material(&self, role: ColorRole) -> Material {
        Material::new(self.base_color(role), self.roughness)
    }

    /// Two-entry light/dark ink table keyed by background luminance.
    pub fn legend_ink(&self, role: ColorRole) -> Color {
        if self.base_color(role).luminance() > INK_SPLIT_LUMINANCE {
            self.ink_dark
        } else {
            self.ink_light
        }
    }
}
