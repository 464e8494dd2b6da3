// src/geometry.rs
//! Procedural keycap mesh synthesis.
//!
//! **Pipeline** (per vertex of a subdivided box, `t` = normalized height):
//! - Taper: cross-section shrinks toward the top, clamped so it never inverts.
//! - Rounded vertical corners: corner vertices projected onto a quarter-circle arc.
//! - Top band: concave scoop with a radial falloff (spacebar gets a convex
//!   ridge instead), plus slight edge rounding.
//! - Row-profile bias: per-row height offset scaled by `t` so the base stays
//!   seated on the plate.
//! - Normals recomputed after all displacement.
//!
//! Deterministic by construction: no randomness, identical params always
//! yield bit-identical vertex data. The resource cache depends on this.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex format a renderer can cast straight into a GPU buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Immutable keycap mesh. Freshly allocated per build; cached copies are
/// shared read-only and never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct KeycapMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub aabb_min: Vec3,
    pub aabb_max: Vec3,
}

impl KeycapMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Shape parameters for one keycap, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryParams {
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    /// How far the top cross-section pulls toward center, per side.
    pub taper: f32,
    /// Physical row index, 0 = function row. Selects the height bias.
    pub row: u8,
    pub spacebar: bool,
}

impl Default for GeometryParams {
    fn default() -> Self {
        GeometryParams {
            width: 0.9,
            depth: 0.9,
            height: 0.36,
            taper: 0.12,
            row: 3,
            spacebar: false,
        }
    }
}

/// Factory tuning shared by every build. Fixed per process; per-key variation
/// goes through `GeometryParams` (and therefore through the cache signature).
#[derive(Debug, Clone, Copy)]
pub struct FactoryOptions {
    /// Subdivisions per world unit of face length.
    pub segments_per_unit: u32,
    pub corner_radius: f32,
    pub scoop_depth: f32,
    pub bulge_height: f32,
    /// Fraction of the height over which top-surface shaping fades in.
    pub top_band: f32,
    pub edge_round: f32,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        FactoryOptions {
            segments_per_unit: 14,
            corner_radius: 0.09,
            scoop_depth: 0.055,
            bulge_height: 0.04,
            top_band: 0.13,
            edge_round: 0.02,
        }
    }
}

/// Visually tuned sculpt heights, function row tallest down to the bottom
/// row. Presentation parameters, not load-bearing invariants.
pub const ROW_HEIGHT_BIAS: [f32; 6] = [0.10, 0.06, 0.03, 0.0, -0.02, -0.04];

/// Absolute floor on a tapered half-extent; keeps degenerate dimensions from
/// inverting the shape.
const MIN_HALF_EXTENT: f32 = 0.02;

pub struct GeometryFactory {
    opts: FactoryOptions,
}

impl Default for GeometryFactory {
    fn default() -> Self {
        GeometryFactory::new(FactoryOptions::default())
    }
}

impl GeometryFactory {
    pub fn new(opts: FactoryOptions) -> Self {
        GeometryFactory { opts }
    }

    /// Build one keycap mesh. Deterministic: equal `params` yield
    /// bit-identical vertex data.
    pub fn build(&self, params: &GeometryParams) -> KeycapMesh {
        let mut mesh = self.subdivided_box(params);
        for v in &mut mesh.vertices {
            let p = self.displace(params, Vec3::from_array(v.position));
            v.position = p.to_array();
        }
        compute_normals(&mut mesh);
        compute_aabb(&mut mesh);
        mesh
    }

    // Subdivision count for a face edge of the given length.
    fn segments(&self, length: f32) -> u32 {
        ((length * self.opts.segments_per_unit as f32).ceil() as u32).max(4)
    }

    /// Axis-aligned box spanning `y in [0, height]`, each face a subdivided
    /// grid so the displacement pass has vertices to work with.
    fn subdivided_box(&self, p: &GeometryParams) -> KeycapMesh {
        let (w, h, d) = (p.width.max(1e-3), p.height.max(1e-3), p.depth.max(1e-3));
        let (sw, sh, sd) = (self.segments(w), self.segments(h), self.segments(d));

        let mut mesh = KeycapMesh {
            vertices: Vec::new(),
            indices: Vec::new(),
            aabb_min: Vec3::ZERO,
            aabb_max: Vec3::ZERO,
        };

        // (u axis, v axis, w axis, udir, vdir, face width, face height, offset)
        let faces: [(usize, usize, usize, f32, f32, f32, f32, f32, u32, u32); 6] = [
            (2, 1, 0, -1.0, -1.0, d, h, w / 2.0, sd, sh),  // +X
            (2, 1, 0, 1.0, -1.0, d, h, -w / 2.0, sd, sh),  // -X
            (0, 2, 1, 1.0, 1.0, w, d, h / 2.0, sw, sd),    // +Y (top)
            (0, 2, 1, 1.0, -1.0, w, d, -h / 2.0, sw, sd),  // -Y
            (0, 1, 2, 1.0, -1.0, w, h, d / 2.0, sw, sh),   // +Z
            (0, 1, 2, -1.0, -1.0, w, h, -d / 2.0, sw, sh), // -Z
        ];

        for (ua, va, wa, udir, vdir, fw, fh, offset, gu, gv) in faces {
            build_plane(&mut mesh, ua, va, wa, udir, vdir, fw, fh, offset, gu, gv);
        }

        // Seat the base at y = 0.
        for v in &mut mesh.vertices {
            v.position[1] += h / 2.0;
        }
        mesh
    }

    /// The parametric displacement applied to every box vertex.
    fn displace(&self, p: &GeometryParams, pos: Vec3) -> Vec3 {
        let h = p.height.max(1e-3);
        let hw = p.width.max(1e-3) / 2.0;
        let hd = p.depth.max(1e-3) / 2.0;
        let t = (pos.y / h).clamp(0.0, 1.0);

        // 1. Taper: shrink the cross-section toward center with height, never
        //    past 25% of the base half-extent or the absolute floor.
        let floor_x = (hw * 0.25).max(MIN_HALF_EXTENT.min(hw));
        let floor_z = (hd * 0.25).max(MIN_HALF_EXTENT.min(hd));
        let shrink_x = (t * p.taper).clamp(0.0, (hw - floor_x).max(0.0));
        let shrink_z = (t * p.taper).clamp(0.0, (hd - floor_z).max(0.0));
        let hwt = hw - shrink_x;
        let hdt = hd - shrink_z;
        let mut x = pos.x * (hwt / hw);
        let mut z = pos.z * (hdt / hd);
        let mut y = pos.y;

        // 2. Rounded vertical corners: project corner-square vertices onto a
        //    quarter-circle arc in XZ, radius clamped to the smaller half-dim.
        let r = self.opts.corner_radius.min(hwt).min(hdt);
        if r > 0.0 {
            let cx = x.abs() - (hwt - r);
            let cz = z.abs() - (hdt - r);
            if cx > 0.0 && cz > 0.0 {
                let len = (cx * cx + cz * cz).sqrt();
                if len > r {
                    let k = r / len;
                    x = x.signum() * (hwt - r + cx * k);
                    z = z.signum() * (hdt - r + cz * k);
                }
            }
        }

        // 3/4. Top band: scoop for regular keys, convex ridge for the
        //      spacebar. `band²` fades the effect to zero below the band.
        let band = ((t - (1.0 - self.opts.top_band)) / self.opts.top_band).clamp(0.0, 1.0);
        if band > 0.0 {
            let nx = if hwt > 0.0 { x / hwt } else { 0.0 };
            let nz = if hdt > 0.0 { z / hdt } else { 0.0 };
            let min_half = hwt.min(hdt);
            if p.spacebar {
                let bulge = self.opts.bulge_height.min(0.5 * min_half);
                y += band * band * bulge * (1.0 - nz * nz).max(0.0);
            } else {
                // Concave dish, weighted more along the depth axis.
                let radial = 0.45 * nx * nx + 0.95 * nz * nz;
                let falloff = (1.0 - radial).max(0.0);
                let depth = self.opts.scoop_depth.min(0.5 * min_half);
                y -= band * band * depth * falloff;
                // Edge rounding: drop the rim slightly.
                let rim = (nx * nx).max(nz * nz).min(1.0);
                let edge = self.opts.edge_round.min(0.25 * min_half);
                y -= band * band * edge * rim * rim;
            }
        }

        // 5. Row-profile bias, scaled by t so the base stays on the plate.
        let row = (p.row as usize).min(ROW_HEIGHT_BIAS.len() - 1);
        y += ROW_HEIGHT_BIAS[row] * t;

        Vec3::new(x, y, z)
    }
}

/// One subdivided face of the box. `ua/va/wa` are component indices,
/// `udir/vdir` flip winding per face.
#[allow(clippy::too_many_arguments)]
fn build_plane(
    mesh: &mut KeycapMesh,
    ua: usize,
    va: usize,
    wa: usize,
    udir: f32,
    vdir: f32,
    width: f32,
    height: f32,
    offset: f32,
    grid_u: u32,
    grid_v: u32,
) {
    let seg_w = width / grid_u as f32;
    let seg_h = height / grid_v as f32;
    let base = mesh.vertices.len() as u32;

    for iv in 0..=grid_v {
        let vv = iv as f32 * seg_h - height / 2.0;
        for iu in 0..=grid_u {
            let uu = iu as f32 * seg_w - width / 2.0;
            let mut pos = [0.0f32; 3];
            pos[ua] = uu * udir;
            pos[va] = vv * vdir;
            pos[wa] = offset;
            let mut normal = [0.0f32; 3];
            normal[wa] = offset.signum();
            mesh.vertices.push(Vertex {
                position: pos,
                normal,
                uv: [iu as f32 / grid_u as f32, 1.0 - iv as f32 / grid_v as f32],
            });
        }
    }

    for iv in 0..grid_v {
        for iu in 0..grid_u {
            let a = base + iu + (grid_u + 1) * iv;
            let b = base + iu + (grid_u + 1) * (iv + 1);
            let c = base + (iu + 1) + (grid_u + 1) * (iv + 1);
            let d = base + (iu + 1) + (grid_u + 1) * iv;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
}

/// Area-weighted normal recomputation; zero-sum normals fall back to +Y.
pub fn compute_normals(mesh: &mut KeycapMesh) {
    let mut acc = vec![Vec3::ZERO; mesh.vertices.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let pa = Vec3::from_array(mesh.vertices[a].position);
        let pb = Vec3::from_array(mesh.vertices[b].position);
        let pc = Vec3::from_array(mesh.vertices[c].position);
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    for (v, n) in mesh.vertices.iter_mut().zip(acc) {
        let len = n.length();
        v.normal = if len > 1e-12 { (n / len).to_array() } else { [0.0, 1.0, 0.0] };
    }
}

fn compute_aabb(mesh: &mut KeycapMesh) {
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for v in &mesh.vertices {
        min = min.min(Vec3::from_array(v.position));
        max = max.max(Vec3::from_array(v.position));
    }
    mesh.aabb_min = min;
    mesh.aabb_max = max;
}
