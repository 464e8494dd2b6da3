// src/layout.rs
//! Physical key layout tables.
//!
//! A `LayoutTable` is a static, read-only list of `KeySpec` records loaded
//! once from a versioned JSON asset. One physical layout per build; the
//! built-in table is an ANSI TKL embedded at compile time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};

/// Fixed palette roles a key can be tagged with. Unknown roles in an asset
/// fail deserialization; a role missing from the active theme falls back to
/// `Default` at material construction instead (see `palette.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRole {
    Default,
    Modifier,
    Accent,
    Function,
    Danger,
}

impl Default for ColorRole {
    fn default() -> Self {
        ColorRole::Default
    }
}

/// Immutable descriptor of one physical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Unique identifier, stable across locales (e.g. `KeyA`, `MetaLeft`).
    pub code: String,
    /// Primary printed label. Empty for the spacebar.
    pub label: String,
    /// Shifted character, rendered stacked above the primary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_label: Option<String>,
    /// Icon glyph for modifier-style keys; rendered above `subtext`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
    /// Width in grid units (1.0 = one standard key).
    #[serde(default = "default_width")]
    pub width: f32,
    /// Grid column of the key's left edge; fractional for staggered rows.
    pub x: f32,
    /// Physical row index, 0 = function row.
    pub y: u8,
    #[serde(default)]
    pub role: ColorRole,
}

fn default_width() -> f32 {
    1.0
}

impl KeySpec {
    /// True for the long convex-top key(s).
    #[inline]
    pub fn is_spacebar(&self) -> bool {
        self.code == "Space"
    }
}

/// Ordered, read-only key list for one physical layout variant.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutTable {
    pub name: String,
    pub version: u32,
    /// Grid-to-world scale applied by the assembly.
    pub unit_size: f32,
    keys: Vec<KeySpec>,
}

/// Embedded default layout asset.
const ANSI_TKL_JSON: &str = include_str!("../assets/layouts/ansi_tkl.json");

impl LayoutTable {
    /// Parse and validate a layout asset.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: LayoutTable = serde_json::from_str(json)?;
        table.validate()?;
        log::debug!(
            "loaded layout '{}' v{} with {} keys",
            table.name,
            table.version,
            table.keys.len()
        );
        Ok(table)
    }

    /// The built-in ANSI TKL table.
    pub fn builtin() -> Result<Self> {
        Self::from_json(ANSI_TKL_JSON)
    }

    fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(Error::Layout(format!("layout '{}' has no keys", self.name)));
        }
        if self.unit_size <= 0.0 {
            return Err(Error::Layout(format!(
                "layout '{}' has non-positive unit_size",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for key in &self.keys {
            if key.width <= 0.0 {
                return Err(Error::Layout(format!(
                    "key '{}' has non-positive width",
                    key.code
                )));
            }
            if !seen.insert(key.code.as_str()) {
                return Err(Error::Layout(format!("duplicate key code '{}'", key.code)));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeySpec> {
        self.keys.iter()
    }

    pub fn get(&self, code: &str) -> Option<&KeySpec> {
        self.keys.iter().find(|k| k.code == code)
    }

    /// Board extent in grid units: (columns, rows). Drives which keys count
    /// as sitting on a board edge for legend anchoring.
    pub fn max_extent(&self) -> (f32, f32) {
        let cols = self
            .keys
            .iter()
            .map(|k| k.x + k.width)
            .fold(0.0f32, f32::max);
        let rows = self.keys.iter().map(|k| k.y as f32 + 1.0).fold(0.0f32, f32::max);
        (cols, rows)
    }
}
