// src/cache.rs
//! Shared resource cache.
//!
//! Keyed by value-equality signatures (f32 fields stored as raw bits, so
//! there are no formatting or rounding collisions). Entries are `Arc`-shared,
//! immutable after insert, and live until `clear()` — which must run as part
//! of a full-board rebuild so GPU-bound resources do not pile up across
//! theme/style switches. A miss is normal control flow, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use crate::geometry::{GeometryParams, KeycapMesh};
use crate::layout::ColorRole;
use crate::palette::Material;

/// Value-equality key for a keycap mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometrySig {
    width_bits: u32,
    depth_bits: u32,
    height_bits: u32,
    taper_bits: u32,
    row: u8,
    spacebar: bool,
}

impl From<&GeometryParams> for GeometrySig {
    fn from(p: &GeometryParams) -> Self {
        GeometrySig {
            width_bits: p.width.to_bits(),
            depth_bits: p.depth.to_bits(),
            height_bits: p.height.to_bits(),
            taper_bits: p.taper.to_bits(),
            row: p.row,
            spacebar: p.spacebar,
        }
    }
}

/// Value-equality key for a base material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialSig {
    pub role: ColorRole,
    pub theme: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub geometry_hits: u64,
    pub geometry_misses: u64,
    pub material_hits: u64,
    pub material_misses: u64,
}

#[derive(Default)]
pub struct ResourceCache {
    geometries: HashMap<GeometrySig, Arc<KeycapMesh>>,
    materials: HashMap<MaterialSig, Arc<Material>>,
    stats: CacheStats,
}

impl ResourceCache {
    pub fn new() -> Self {
        ResourceCache::default()
    }

    /// Return the shared mesh for `sig`, building and inserting on a miss.
    pub fn get_or_create_geometry(
        &mut self,
        sig: GeometrySig,
        build: impl FnOnce() -> KeycapMesh,
    ) -> Arc<KeycapMesh> {
        if let Some(mesh) = self.geometries.get(&sig) {
            self.stats.geometry_hits += 1;
            return Arc::clone(mesh);
        }
        self.stats.geometry_misses += 1;
        log::debug!("geometry cache miss: {sig:?}");
        let mesh = Arc::new(build());
        self.geometries.insert(sig, Arc::clone(&mesh));
        mesh
    }

    pub fn get_or_create_material(
        &mut self,
        sig: MaterialSig,
        build: impl FnOnce() -> Material,
    ) -> Arc<Material> {
        if let Some(mat) = self.materials.get(&sig) {
            self.stats.material_hits += 1;
            return Arc::clone(mat);
        }
        self.stats.material_misses += 1;
        log::debug!("material cache miss: {sig:?}");
        let mat = Arc::new(build());
        self.materials.insert(sig, Arc::clone(&mat));
        mat
    }

    /// Dispose every entry. Instances holding clones of the `Arc`s keep them
    /// alive until they are themselves dropped; the cache will hand out fresh
    /// entries afterwards.
    pub fn clear(&mut self) {
        log::debug!(
            "resource cache clear: {} geometries, {} materials",
            self.geometries.len(),
            self.materials.len()
        );
        self.geometries.clear();
        self.materials.clear();
    }

    #[inline]
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    #[inline]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryFactory;

    #[test]
    fn test_identical_params_share_geometry() {
        let factory = GeometryFactory::default();
        let mut cache = ResourceCache::new();
        let params = GeometryParams::default();
        let a = cache.get_or_create_geometry(GeometrySig::from(&params), || factory.build(&params));
        let b = cache.get_or_create_geometry(GeometrySig::from(&params), || factory.build(&params));
        assert!(Arc::ptr_eq(&a, &b), "equal signatures must be reference-equal");
        assert_eq!(cache.geometry_count(), 1);
        assert_eq!(cache.stats().geometry_hits, 1);
        assert_eq!(cache.stats().geometry_misses, 1);
    }

    #[test]
    fn test_distinct_params_do_not_collide() {
        let factory = GeometryFactory::default();
        let mut cache = ResourceCache::new();
        let a_params = GeometryParams { width: 1.0, ..Default::default() };
        let b_params = GeometryParams { width: 1.5, ..Default::default() };
        let a = cache.get_or_create_geometry(GeometrySig::from(&a_params), || factory.build(&a_params));
        let b = cache.get_or_create_geometry(GeometrySig::from(&b_params), || factory.build(&b_params));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.geometry_count(), 2);
    }

    #[test]
    fn test_clear_produces_independent_entries() {
        let factory = GeometryFactory::default();
        let mut cache = ResourceCache::new();
        let params = GeometryParams::default();
        let before = cache.get_or_create_geometry(GeometrySig::from(&params), || factory.build(&params));
        cache.clear();
        assert_eq!(cache.geometry_count(), 0);
        let after = cache.get_or_create_geometry(GeometrySig::from(&params), || factory.build(&params));
        assert!(!Arc::ptr_eq(&before, &after), "post-clear entry must be new");
        // The old Arc stays valid for holders until they drop it.
        assert_eq!(before.vertices.len(), after.vertices.len());
    }

    #[test]
    fn test_material_signature_by_role_and_theme() {
        use crate::palette::Theme;
        let mut cache = ResourceCache::new();
        let dark = Theme::dark();
        let sig = |theme: &Theme, role| MaterialSig { role, theme: theme.name.clone() };
        let a = cache.get_or_create_material(sig(&dark, ColorRole::Default), || dark.material(ColorRole::Default));
        let b = cache.get_or_create_material(sig(&dark, ColorRole::Default), || dark.material(ColorRole::Default));
        let c = cache.get_or_create_material(sig(&dark, ColorRole::Accent), || dark.material(ColorRole::Accent));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.material_count(), 2);
    }
}
