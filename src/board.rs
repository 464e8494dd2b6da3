// src/board.rs
//! Keyboard assembly: one `KeyInstance` per layout entry, board-coordinate
//! placement, input fan-out, and atomic rebuild.
//!
//! All mutation happens on the caller's thread between frame boundaries.
//! A rebuild constructs the complete replacement key set against a fresh
//! cache first; only on success are the old instances and cache entries
//! dropped and the new state swapped in, so a frame never sees a
//! half-torn-down board.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::cache::{GeometrySig, MaterialSig, ResourceCache};
use crate::error::{Error, Result};
use crate::geometry::{GeometryFactory, GeometryParams};
use crate::key::KeyInstance;
use crate::layout::{ColorRole, KeySpec, LayoutTable};
use crate::legend::{EdgePosition, LegendContent, LegendRenderer};
use crate::lighting::LightingSettings;
use crate::palette::Theme;

/// Gap between adjacent caps, in grid units.
const KEY_GAP: f32 = 0.10;
/// Cap body height before row bias, world units per grid unit.
const CAP_HEIGHT: f32 = 0.36;
const CAP_TAPER: f32 = 0.12;
/// Plate sits slightly above the board origin.
const PLATE_ELEVATION: f32 = 0.05;
/// Keys whose cap starts/ends within this margin of the board edge get
/// flipped legend anchoring.
const EDGE_MARGIN: f32 = 0.25;

pub struct KeyboardAssembly {
    layout: LayoutTable,
    theme: Theme,
    factory: GeometryFactory,
    legends: LegendRenderer,
    cache: ResourceCache,
    keys: Vec<KeyInstance>,
    index: HashMap<String, usize>,
}

impl KeyboardAssembly {
    /// Build the full board. Shared geometry/materials flow through the cache.
    pub fn build(layout: LayoutTable, theme: Theme, legends: LegendRenderer) -> Result<Self> {
        let factory = GeometryFactory::default();
        let mut cache = ResourceCache::new();
        let (keys, index) = build_keys(&layout, &theme, &factory, &legends, &mut cache)?;
        log::debug!(
            "assembled '{}': {} keys, {} cached geometries, {} cached materials",
            layout.name,
            keys.len(),
            cache.geometry_count(),
            cache.material_count()
        );
        Ok(KeyboardAssembly {
            layout,
            theme,
            factory,
            legends,
            cache,
            keys,
            index,
        })
    }

    /// Begin a press. Unknown codes are a defensive no-op.
    pub fn press_key(&mut self, code: &str) {
        match self.index.get(code) {
            Some(&i) => self.keys[i].press(),
            None => log::debug!("press for unmapped key code '{code}'"),
        }
    }

    /// Begin a release. Unknown codes are a defensive no-op.
    pub fn release_key(&mut self, code: &str) {
        match self.index.get(code) {
            Some(&i) => self.keys[i].release(),
            None => log::debug!("release for unmapped key code '{code}'"),
        }
    }

    /// Release everything; called by the input collaborator on focus loss.
    pub fn release_all_keys(&mut self) {
        for key in &mut self.keys {
            key.release();
        }
    }

    /// Advance every key's press travel and underglow by `dt` seconds, with
    /// the settings snapshot pulled for this frame.
    pub fn update(&mut self, dt: f32, settings: &LightingSettings) {
        for key in &mut self.keys {
            key.update(dt, settings);
        }
    }

    /// Regenerate legends for the named keys (locale switches). Geometry and
    /// materials are untouched; other keys keep their surfaces.
    pub fn relabel(&mut self, labels: &HashMap<String, String>) {
        let (cols, _) = self.layout.max_extent();
        for (code, label) in labels {
            let Some(&i) = self.index.get(code.as_str()) else {
                log::debug!("relabel for unmapped key code '{code}'");
                continue;
            };
            let key = &mut self.keys[i];
            let spec = key.spec().clone();
            let content = relabeled_content(&spec, label);
            let image = self.legends.render_content(
                &content,
                cap_aspect(&spec),
                self.theme.legend_ink(spec.role),
                edge_position(&spec, cols),
            );
            key.set_legend(image);
        }
    }

    /// Tear down and reconstruct under a new theme. Atomic: on failure the
    /// previous assembly and cache are left intact.
    pub fn rebuild(&mut self, theme: Theme) -> Result<()> {
        let mut fresh_cache = ResourceCache::new();
        let (keys, index) =
            build_keys(&self.layout, &theme, &self.factory, &self.legends, &mut fresh_cache)?;
        // Construction succeeded: dispose old instance-owned resources and
        // cache entries before installing the replacement.
        self.keys.clear();
        self.cache.clear();
        self.keys = keys;
        self.index = index;
        self.cache = fresh_cache;
        self.theme = theme;
        log::debug!("rebuilt '{}' with theme '{}'", self.layout.name, self.theme.name);
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

    pub fn keys(&self) -> impl Iterator<Item = &KeyInstance> {
        self.keys.iter()
    }

    pub fn key(&self, code: &str) -> Option<&KeyInstance> {
        self.index.get(code).map(|&i| &self.keys[i])
    }

    #[inline]
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    #[inline]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    #[inline]
    pub fn layout(&self) -> &LayoutTable {
        &self.layout
    }
}

fn cap_aspect(spec: &KeySpec) -> f32 {
    (spec.width - KEY_GAP) / (1.0 - KEY_GAP)
}

fn edge_position(spec: &KeySpec, cols: f32) -> EdgePosition {
    if spec.x <= EDGE_MARGIN {
        EdgePosition::Left
    } else if spec.x + spec.width >= cols - EDGE_MARGIN {
        EdgePosition::Right
    } else {
        EdgePosition::Interior
    }
}

fn legend_content(spec: &KeySpec) -> LegendContent {
    if let (Some(icon), Some(subtext)) = (&spec.icon, &spec.subtext) {
        LegendContent::IconText {
            icon: icon.clone(),
            subtext: subtext.clone(),
        }
    } else if let Some(shifted) = &spec.shift_label {
        LegendContent::Dual {
            primary: spec.label.clone(),
            shifted: shifted.clone(),
        }
    } else {
        LegendContent::Single(spec.label.clone())
    }
}

/// A locale label lands in the slot the key already uses: icon keys swap the
/// icon glyph, dual keys the primary character, plain keys the label.
fn relabeled_content(spec: &KeySpec, label: &str) -> LegendContent {
    match (&spec.icon, &spec.subtext, &spec.shift_label) {
        (Some(_), Some(subtext), _) => LegendContent::IconText {
            icon: label.to_string(),
            subtext: subtext.clone(),
        },
        (_, _, Some(shifted)) => LegendContent::Dual {
            primary: label.to_string(),
            shifted: shifted.clone(),
        },
        _ => LegendContent::Single(label.to_string()),
    }
}

type BuiltKeys = (Vec<KeyInstance>, HashMap<String, usize>);

fn build_keys(
    layout: &LayoutTable,
    theme: &Theme,
    factory: &GeometryFactory,
    legends: &LegendRenderer,
    cache: &mut ResourceCache,
) -> Result<BuiltKeys> {
    // Every role not carried by the theme resolves to Default, so a theme
    // without one cannot produce materials for the board.
    if !theme.defines(ColorRole::Default) {
        return Err(Error::custom(format!(
            "theme '{}' defines no color for the default role",
            theme.name
        )));
    }

    let unit = layout.unit_size;
    let (cols, _) = layout.max_extent();
    let mut keys = Vec::with_capacity(layout.len());
    let mut index = HashMap::with_capacity(layout.len());

    for spec in layout.iter() {
        let params = GeometryParams {
            width: (spec.width - KEY_GAP) * unit,
            depth: (1.0 - KEY_GAP) * unit,
            height: CAP_HEIGHT * unit,
            taper: CAP_TAPER * unit,
            row: spec.y,
            spacebar: spec.is_spacebar(),
        };
        let geometry =
            cache.get_or_create_geometry(GeometrySig::from(&params), || factory.build(&params));
        let material_sig = MaterialSig {
            role: spec.role,
            theme: theme.name.clone(),
        };
        let material =
            cache.get_or_create_material(material_sig, || theme.material(spec.role));

        let legend = legends.render_content(
            &legend_content(spec),
            cap_aspect(spec),
            theme.legend_ink(spec.role),
            edge_position(spec, cols),
        );

        let position = Vec3::new(
            (spec.x + spec.width / 2.0) * unit,
            PLATE_ELEVATION,
            (spec.y as f32 + 0.5) * unit,
        );

        let spec = Arc::new(spec.clone());
        index.insert(spec.code.clone(), keys.len());
        keys.push(KeyInstance::new(spec, geometry, &material, legend, position));
    }

    Ok((keys, index))
}
