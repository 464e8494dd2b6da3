// src/key.rs
//! One key on the board: shared geometry, instance-owned material clone and
//! legend surface, press state, and the underglow plane beneath the cap.
//!
//! Press/release are idempotent; `update(dt)` advances the travel offset with
//! frame-rate-independent exponential smoothing and snaps exactly onto the
//! target once within epsilon, so animations terminate instead of drifting.

use std::sync::Arc;

use glam::Vec3;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use xxhash_rust::xxh3::xxh3_64;

use crate::color::Color;
use crate::geometry::KeycapMesh;
use crate::layout::KeySpec;
use crate::lighting::{self, LightingSettings, Underglow, UnderglowPhase, PRESSED_OPACITY};
use crate::palette::Material;

/// Downward travel of a pressed cap, world units.
pub const PRESS_DEPTH: f32 = -0.06;
/// Exponential smoothing rate for press travel, 1/seconds.
pub const PRESS_SPEED: f32 = 25.0;
/// Remaining distance below which the offset snaps onto the target.
pub const SNAP_EPSILON: f32 = 1e-4;
/// Lightness added to the cap color while pressed.
const PRESS_LIGHTEN: f32 = 0.12;

pub struct KeyInstance {
    spec: Arc<KeySpec>,
    geometry: Arc<KeycapMesh>,
    /// Instance-owned clone; jitter and press lightening never touch the
    /// shared base material.
    material: Material,
    rest_color: Color,
    legend: RgbaImage,
    plate_position: Vec3,
    grid: (f32, f32),

    pressed: bool,
    target_offset: f32,
    current_offset: f32,

    phase: UnderglowPhase,
    underglow: Underglow,
    /// Baseline opacity from the most recent lighting sample; what release
    /// restores toward.
    last_base: f32,
}

impl KeyInstance {
    pub(crate) fn new(
        spec: Arc<KeySpec>,
        geometry: Arc<KeycapMesh>,
        base_material: &Material,
        legend: RgbaImage,
        plate_position: Vec3,
    ) -> Self {
        // Seeded per key code: reproducible jitter and phase desync.
        let mut rng = StdRng::seed_from_u64(xxh3_64(spec.code.as_bytes()));
        let mut material = base_material.clone();
        material.roughness = (material.roughness + rng.gen_range(-0.03..0.03)).clamp(0.0, 1.0);
        material.color = material.color.lighten(rng.gen_range(-0.02..0.02));
        let rest_color = material.color;
        let phase = UnderglowPhase::seeded(rng.gen_range(0.0..1.0));

        let grid = (spec.x + spec.width / 2.0, spec.y as f32);
        let underglow = Underglow {
            color: rest_color,
            opacity: 0.0,
        };

        KeyInstance {
            spec,
            geometry,
            material,
            rest_color,
            legend,
            plate_position,
            grid,
            pressed: false,
            target_offset: 0.0,
            current_offset: 0.0,
            phase,
            underglow,
            last_base: 0.0,
        }
    }

    /// Begin press travel. No-op if already pressed.
    pub fn press(&mut self) {
        if self.pressed {
            return;
        }
        self.pressed = true;
        self.target_offset = PRESS_DEPTH;
        self.material.color = self.rest_color.lighten(PRESS_LIGHTEN);
        self.underglow.opacity = PRESSED_OPACITY;
    }

    /// Begin release travel. No-op if already released.
    pub fn release(&mut self) {
        if !self.pressed {
            return;
        }
        self.pressed = false;
        self.target_offset = 0.0;
        self.material.color = self.rest_color;
        self.underglow.opacity = self.last_base;
    }

    /// Advance press travel and refresh the underglow for this frame.
    pub fn update(&mut self, dt: f32, settings: &LightingSettings) {
        let remaining = self.target_offset - self.current_offset;
        if remaining.abs() <= SNAP_EPSILON {
            self.current_offset = self.target_offset;
        } else {
            // speed*dt < 1 at normal frame rates; the cap guards huge stalls.
            let k = (PRESS_SPEED * dt.max(0.0)).min(1.0);
            self.current_offset += remaining * k;
            if (self.target_offset - self.current_offset).abs() <= SNAP_EPSILON {
                self.current_offset = self.target_offset;
            }
        }

        self.last_base = settings.base_opacity();
        self.underglow =
            lighting::sample(settings, &mut self.phase, self.pressed, self.grid, dt);
    }

    /// Replace the legend surface; the previous image is dropped on assignment.
    pub fn set_legend(&mut self, legend: RgbaImage) {
        self.legend = legend;
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.spec.code
    }

    #[inline]
    pub fn spec(&self) -> &KeySpec {
        &self.spec
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    #[inline]
    pub fn current_offset(&self) -> f32 {
        self.current_offset
    }

    #[inline]
    pub fn target_offset(&self) -> f32 {
        self.target_offset
    }

    /// Plate position plus the animated press offset.
    #[inline]
    pub fn world_position(&self) -> Vec3 {
        self.plate_position + Vec3::Y * self.current_offset
    }

    #[inline]
    pub fn geometry(&self) -> &Arc<KeycapMesh> {
        &self.geometry
    }

    #[inline]
    pub fn material(&self) -> &Material {
        &self.material
    }

    #[inline]
    pub fn legend(&self) -> &RgbaImage {
        &self.legend
    }

    #[inline]
    pub fn underglow(&self) -> Underglow {
        self.underglow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryFactory, GeometryParams};
    use crate::layout::ColorRole;
    use crate::palette::Theme;

    const DT: f32 = 1.0 / 60.0;

    fn spec(code: &str) -> Arc<KeySpec> {
        Arc::new(KeySpec {
            code: code.into(),
            label: "A".into(),
            shift_label: None,
            icon: None,
            subtext: None,
            width: 1.0,
            x: 2.0,
            y: 3,
            role: ColorRole::Default,
        })
    }

    fn instance(code: &str) -> KeyInstance {
        let geometry = Arc::new(GeometryFactory::default().build(&GeometryParams::default()));
        let material = Theme::dark().material(ColorRole::Default);
        KeyInstance::new(
            spec(code),
            geometry,
            &material,
            RgbaImage::new(4, 4),
            Vec3::new(2.5, 0.2, 3.5),
        )
    }

    #[test]
    fn test_press_idempotent() {
        let mut key = instance("KeyA");
        key.press();
        let color = key.material().color;
        let target = key.target_offset();
        key.press();
        assert!(key.is_pressed());
        assert_eq!(key.material().color, color);
        assert_eq!(key.target_offset(), target);
    }

    #[test]
    fn test_release_idempotent_and_restores_color() {
        let mut key = instance("KeyA");
        let rest = key.material().color;
        key.press();
        assert_ne!(key.material().color, rest, "press must lighten the cap");
        key.release();
        assert_eq!(key.material().color, rest);
        key.release();
        assert!(!key.is_pressed());
        assert_eq!(key.material().color, rest);
    }

    #[test]
    fn test_offset_converges_and_snaps() {
        let mut key = instance("KeyA");
        let settings = LightingSettings::default();
        key.press();
        let mut last = (key.target_offset() - key.current_offset()).abs();
        let mut steps = 0;
        while key.current_offset() != key.target_offset() {
            key.update(DT, &settings);
            let remaining = (key.target_offset() - key.current_offset()).abs();
            assert!(
                remaining < last || remaining == 0.0,
                "distance must strictly shrink"
            );
            last = remaining;
            steps += 1;
            assert!(steps <= 60, "did not converge within 60 frames");
        }
        assert_eq!(key.current_offset(), PRESS_DEPTH, "must snap exactly");
        // Pinned thereafter.
        key.update(DT, &settings);
        assert_eq!(key.current_offset(), PRESS_DEPTH);
    }

    #[test]
    fn test_world_position_tracks_offset() {
        let mut key = instance("KeyA");
        let settings = LightingSettings::default();
        let rest = key.world_position();
        key.press();
        for _ in 0..60 {
            key.update(DT, &settings);
        }
        let pressed = key.world_position();
        assert!((pressed.y - (rest.y + PRESS_DEPTH)).abs() < 1e-6);
        assert_eq!(pressed.x, rest.x);
        assert_eq!(pressed.z, rest.z);
    }

    #[test]
    fn test_jitter_is_reproducible_per_code() {
        let a = instance("KeyA");
        let b = instance("KeyA");
        let c = instance("KeyB");
        assert_eq!(a.material().roughness, b.material().roughness);
        assert_eq!(a.material().color, b.material().color);
        assert_ne!(a.material().roughness, c.material().roughness);
    }

    #[test]
    fn test_jitter_does_not_touch_shared_base() {
        let material = Theme::dark().material(ColorRole::Default);
        let before = material.clone();
        let _key = KeyInstance::new(
            spec("KeyA"),
            Arc::new(GeometryFactory::default().build(&GeometryParams::default())),
            &material,
            RgbaImage::new(4, 4),
            Vec3::ZERO,
        );
        assert_eq!(material, before);
    }
}
