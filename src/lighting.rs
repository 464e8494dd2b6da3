// src/lighting.rs
//! Per-key underglow effects.
//!
//! `sample()` is the whole engine: a pure per-frame function from (settings
//! snapshot, this key's phase accumulators, press state, grid position) to an
//! emitted color + opacity. It mutates nothing but the key's own phase; keys
//! never share lighting state, so the board can be updated in any order.

use serde::{Deserialize, Serialize};

use crate::color::{Color, Hsl};

/// Named underglow animation modes. Exhaustively matched; an unknown name in
/// a settings snapshot fails deserialization instead of becoming a silent
/// fallback string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Stable,
    Pulse,
    Cycle,
    Reactive,
    Gemini,
}

/// Snapshot pulled from the settings collaborator each frame. The core never
/// mutates or stores one beyond the current call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingSettings {
    pub enabled: bool,
    /// 0–100.
    pub brightness: f32,
    pub color: Color,
    pub effect: Effect,
}

impl Default for LightingSettings {
    fn default() -> Self {
        LightingSettings {
            enabled: true,
            brightness: 70.0,
            color: Color::rgb(0.35, 0.65, 1.0),
            effect: Effect::Stable,
        }
    }
}

impl LightingSettings {
    /// Baseline opacity at the current brightness.
    #[inline]
    pub fn base_opacity(&self) -> f32 {
        0.1 + 0.8 * (self.brightness.clamp(0.0, 100.0) / 100.0)
    }

    #[inline]
    fn brightness_unit(&self) -> f32 {
        self.brightness.clamp(0.0, 100.0) / 100.0
    }
}

/// Per-key accumulators. `phase_offset` is seeded per instance so cycle and
/// gemini shimmer instead of animating in lockstep.
#[derive(Debug, Clone, PartialEq)]
pub struct UnderglowPhase {
    pub elapsed: f32,
    pub hue: f32,
    pub reactive_level: f32,
    pub phase_offset: f32,
}

impl UnderglowPhase {
    pub fn seeded(phase_offset: f32) -> Self {
        UnderglowPhase {
            elapsed: 0.0,
            hue: 0.0,
            reactive_level: 0.0,
            phase_offset,
        }
    }
}

/// What a key's underglow plane shows this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Underglow {
    pub color: Color,
    pub opacity: f32,
}

/// Near-max opacity used while a key is held.
pub const PRESSED_OPACITY: f32 = 0.95;
/// Pulse period in seconds.
const PULSE_PERIOD: f32 = 1.5;
/// Hue advance for the cycle effect, degrees per second.
const CYCLE_RATE: f32 = 42.0;
/// Reactive fade: multiplicative per animation tick, deliberately not
/// dt-scaled — the observed decay speed tracks frame rate.
const REACTIVE_DECAY: f32 = 0.92;
/// Below this the fade is treated as finished; at 60 fps the whole decay
/// takes just under a second.
const REACTIVE_FLOOR: f32 = 0.01;
/// Gemini wave weights for the diagonal travel across grid columns/rows.
const GEMINI_X_WEIGHT: f32 = 0.35;
const GEMINI_Y_WEIGHT: f32 = 0.22;

/// Evaluate one key's underglow for this frame.
pub fn sample(
    settings: &LightingSettings,
    phase: &mut UnderglowPhase,
    pressed: bool,
    grid: (f32, f32),
    dt: f32,
) -> Underglow {
    phase.elapsed += dt.max(0.0);

    if !settings.enabled {
        return Underglow {
            color: settings.color,
            opacity: 0.0,
        };
    }

    let base = settings.base_opacity();
    let (gx, gy) = grid;

    match settings.effect {
        Effect::Stable => Underglow {
            color: settings.color,
            opacity: if pressed { PRESSED_OPACITY } else { base },
        },
        Effect::Pulse => {
            let wave = (std::f32::consts::TAU * phase.elapsed / PULSE_PERIOD).sin();
            let opacity = if pressed {
                PRESSED_OPACITY
            } else {
                base * (0.55 + 0.45 * wave)
            };
            Underglow {
                color: settings.color,
                opacity: opacity.clamp(0.0, 1.0),
            }
        }
        Effect::Cycle => {
            phase.hue = (phase.hue + CYCLE_RATE * dt.max(0.0)).rem_euclid(360.0);
            let hue = phase.hue + phase.phase_offset * 360.0;
            Underglow {
                color: Color::from_hsl(Hsl { h: hue, s: 1.0, l: 0.55 }),
                opacity: if pressed { PRESSED_OPACITY } else { base },
            }
        }
        Effect::Reactive => {
            if pressed {
                phase.reactive_level = 1.0;
            } else {
                phase.reactive_level *= REACTIVE_DECAY;
                if phase.reactive_level < REACTIVE_FLOOR {
                    phase.reactive_level = 0.0;
                }
            }
            Underglow {
                color: settings.color,
                opacity: (phase.reactive_level * settings.brightness_unit()).clamp(0.0, 1.0),
            }
        }
        Effect::Gemini => {
            let wave = phase.elapsed + GEMINI_X_WEIGHT * gx + GEMINI_Y_WEIGHT * gy;
            let color = Color::from_hsl(Hsl {
                h: (wave * 60.0).rem_euclid(360.0),
                s: 0.7 + 0.3 * (wave * 0.5).sin().abs(),
                l: 0.5 + 0.1 * (wave * 0.8).sin(),
            });
            // Slower secondary wave layered on the baseline.
            let swell = 0.75 + 0.25 * (phase.elapsed * 0.8 + gx * 0.5).sin();
            let opacity = if pressed { PRESSED_OPACITY } else { base * swell };
            Underglow {
                color,
                opacity: opacity.clamp(0.0, 1.0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn settings(effect: Effect) -> LightingSettings {
        LightingSettings {
            effect,
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_forces_zero_opacity() {
        for effect in [Effect::Stable, Effect::Pulse, Effect::Cycle, Effect::Reactive, Effect::Gemini] {
            for pressed in [false, true] {
                let mut s = settings(effect);
                s.enabled = false;
                let mut phase = UnderglowPhase::seeded(0.3);
                phase.reactive_level = 1.0;
                let out = sample(&s, &mut phase, pressed, (4.0, 2.0), DT);
                assert_eq!(out.opacity, 0.0, "{effect:?} pressed={pressed}");
            }
        }
    }

    #[test]
    fn test_base_opacity_formula() {
        let mut s = LightingSettings::default();
        s.brightness = 0.0;
        assert!((s.base_opacity() - 0.1).abs() < 1e-6);
        s.brightness = 100.0;
        assert!((s.base_opacity() - 0.9).abs() < 1e-6);
        s.brightness = 250.0; // clamped
        assert!((s.base_opacity() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_stable_press_override() {
        let s = settings(Effect::Stable);
        let mut phase = UnderglowPhase::seeded(0.0);
        let released = sample(&s, &mut phase, false, (0.0, 0.0), DT);
        assert!((released.opacity - s.base_opacity()).abs() < 1e-6);
        let pressed = sample(&s, &mut phase, true, (0.0, 0.0), DT);
        assert!((pressed.opacity - PRESSED_OPACITY).abs() < 1e-6);
    }

    #[test]
    fn test_reactive_decay_is_monotone() {
        let s = settings(Effect::Reactive);
        let mut phase = UnderglowPhase::seeded(0.0);
        let held = sample(&s, &mut phase, true, (0.0, 0.0), DT);
        assert!((held.opacity - s.brightness / 100.0).abs() < 1e-6);

        let mut last = f32::INFINITY;
        let mut ticks = 0;
        loop {
            let out = sample(&s, &mut phase, false, (0.0, 0.0), DT);
            assert!(out.opacity < last || out.opacity == 0.0);
            last = out.opacity;
            ticks += 1;
            if out.opacity == 0.0 {
                break;
            }
            assert!(ticks < 200, "reactive decay did not terminate");
        }
        // ~0.92^n drops below the floor well within 60 ticks plus slack.
        assert!(ticks <= 80, "decay took {ticks} ticks");
    }

    #[test]
    fn test_cycle_desynchronized_by_phase_offset() {
        let s = settings(Effect::Cycle);
        let mut a = UnderglowPhase::seeded(0.0);
        let mut b = UnderglowPhase::seeded(0.5);
        let ca = sample(&s, &mut a, false, (0.0, 0.0), DT);
        let cb = sample(&s, &mut b, false, (0.0, 0.0), DT);
        assert_ne!(ca.color, cb.color, "offset keys must not share a hue");
        assert!((ca.opacity - s.base_opacity()).abs() < 1e-6);
    }

    #[test]
    fn test_gemini_varies_across_board() {
        let s = settings(Effect::Gemini);
        let mut a = UnderglowPhase::seeded(0.0);
        let mut b = UnderglowPhase::seeded(0.0);
        // Same accumulators, different grid position: the traveling wave
        // must give them different colors.
        for _ in 0..30 {
            sample(&s, &mut a, false, (0.0, 0.0), DT);
            sample(&s, &mut b, false, (12.0, 4.0), DT);
        }
        let ca = sample(&s, &mut a, false, (0.0, 0.0), DT);
        let cb = sample(&s, &mut b, false, (12.0, 4.0), DT);
        assert_ne!(ca.color, cb.color);
    }

    #[test]
    fn test_effect_names_deserialize() {
        let s: LightingSettings = serde_json::from_str(
            r#"{"enabled": true, "brightness": 55.0,
                "color": {"r": 0.1, "g": 0.2, "b": 0.9},
                "effect": "gemini"}"#,
        )
        .unwrap();
        assert_eq!(s.effect, Effect::Gemini);
        assert!(serde_json::from_str::<Effect>(r#""strobe""#).is_err());
    }
}
