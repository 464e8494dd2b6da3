// src/legend.rs
//! Keycap legend rendering.
//!
//! Two stages: `plan()` computes a `LegendPlan` (canvas sized to the key's
//! aspect ratio, text runs with pixel positions/sizes/anchors and the
//! contrast ink) and `render()` rasterizes a plan into an `RgbaImage` with
//! `ab_glyph`. Planning is pure layout math and carries all the rules;
//! rasterization is a straightforward glyph blit.
//!
//! The font comes from the embedder. A renderer built without one
//! (`LegendRenderer::headless()`) still produces correctly sized transparent
//! images, which keeps the rest of the core usable in tests and headless runs.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::color::Color;
use crate::error::{Error, Result};

/// What gets printed on one keycap.
#[derive(Debug, Clone, PartialEq)]
pub enum LegendContent {
    /// Centered single label.
    Single(String),
    /// Shifted character stacked above the primary.
    Dual { primary: String, shifted: String },
    /// Icon glyph above a small subtext; anchoring flips near board edges.
    IconText { icon: String, subtext: String },
}

/// Where the key sits horizontally on the board; drives icon+subtext
/// anchoring so legends stay readable near the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePosition {
    Left,
    Interior,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Left,
    Center,
    Right,
}

/// One line of text to draw. `x` is the anchor point, `y` the top of the
/// line's em box, `px` the pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub px: f32,
    pub x: f32,
    pub y: f32,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendPlan {
    pub width: u32,
    pub height: u32,
    pub ink: Color,
    pub runs: Vec<TextRun>,
}

/// Canvas height in pixels; width follows the key's aspect ratio.
const CANVAS_HEIGHT: u32 = 128;
const EDGE_PAD_FRAC: f32 = 0.10;

#[derive(Debug)]
pub struct LegendRenderer {
    font: Option<FontArc>,
}

impl LegendRenderer {
    pub fn new(font: FontArc) -> Self {
        LegendRenderer { font: Some(font) }
    }

    /// Parse a TTF/OTF the embedder supplies.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| Error::Font(e.to_string()))?;
        Ok(LegendRenderer { font: Some(font) })
    }

    /// Load a TTF/OTF from disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// No font: plans are full-fidelity, rendered images stay transparent.
    pub fn headless() -> Self {
        LegendRenderer { font: None }
    }

    /// Font size for a single centered label: inversely proportional to
    /// length, floored so long labels stay legible.
    fn single_px(len: usize) -> f32 {
        let h = CANVAS_HEIGHT as f32;
        (h * 0.42 / (len.max(1) as f32).sqrt()).max(h * 0.15)
    }

    /// Lay out one legend for a key with the given width:depth aspect ratio.
    pub fn plan(
        &self,
        content: &LegendContent,
        aspect: f32,
        ink: Color,
        edge: EdgePosition,
    ) -> LegendPlan {
        let h = CANVAS_HEIGHT as f32;
        let w = (h * aspect.max(0.1)).round().max(1.0);
        let center_x = w / 2.0;

        let runs = match content {
            LegendContent::Single(label) => {
                if label.is_empty() {
                    Vec::new()
                } else {
                    let px = Self::single_px(label.chars().count());
                    vec![TextRun {
                        text: label.clone(),
                        px,
                        x: center_x,
                        y: (h - px) / 2.0,
                        anchor: Anchor::Center,
                    }]
                }
            }
            LegendContent::Dual { primary, shifted } => {
                let px = Self::single_px(primary.chars().count().max(1));
                let shifted_px = px * 0.8;
                vec![
                    TextRun {
                        text: shifted.clone(),
                        px: shifted_px,
                        x: center_x,
                        y: h * 0.10,
                        anchor: Anchor::Center,
                    },
                    TextRun {
                        text: primary.clone(),
                        px,
                        x: center_x,
                        y: h * 0.52,
                        anchor: Anchor::Center,
                    },
                ]
            }
            LegendContent::IconText { icon, subtext } => {
                // Left-edge keys right-align, right-edge keys left-align.
                let (anchor, x) = match edge {
                    EdgePosition::Left => (Anchor::Right, w - w * EDGE_PAD_FRAC),
                    EdgePosition::Right => (Anchor::Left, w * EDGE_PAD_FRAC),
                    EdgePosition::Interior => (Anchor::Center, center_x),
                };
                vec![
                    TextRun {
                        text: icon.clone(),
                        px: h * 0.34,
                        x,
                        y: h * 0.12,
                        anchor,
                    },
                    TextRun {
                        text: subtext.clone(),
                        px: h * 0.15,
                        x,
                        y: h * 0.64,
                        anchor,
                    },
                ]
            }
        };

        LegendPlan {
            width: w as u32,
            height: CANVAS_HEIGHT,
            ink,
            runs,
        }
    }

    /// Rasterize a plan onto a transparent canvas. The returned image is a
    /// freshly allocated, instance-owned surface.
    pub fn render(&self, plan: &LegendPlan) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(plan.width, plan.height, Rgba([0, 0, 0, 0]));
        if let Some(font) = &self.font {
            let ink = plan.ink.to_rgba8();
            for run in &plan.runs {
                draw_run(&mut img, font, run, ink);
            }
        }
        img
    }

    /// Convenience: plan + render in one call.
    pub fn render_content(
        &self,
        content: &LegendContent,
        aspect: f32,
        ink: Color,
        edge: EdgePosition,
    ) -> RgbaImage {
        self.render(&self.plan(content, aspect, ink, edge))
    }
}

fn draw_run(img: &mut RgbaImage, font: &FontArc, run: &TextRun, ink: [u8; 4]) {
    let scale = PxScale::from(run.px);
    let scaled = font.as_scaled(scale);

    let line_width: f32 = run
        .text
        .chars()
        .map(|c| scaled.h_advance(scaled.glyph_id(c)))
        .sum();
    let origin_x = match run.anchor {
        Anchor::Left => run.x,
        Anchor::Center => run.x - line_width / 2.0,
        Anchor::Right => run.x - line_width,
    };

    let mut caret = ab_glyph::point(origin_x, run.y + scaled.ascent());
    for ch in run.text.chars() {
        let id = scaled.glyph_id(ch);
        let glyph = id.with_scale_and_position(scale, caret);
        caret.x += scaled.h_advance(id);
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, cov| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            if px < 0 || py < 0 || px >= img.width() as i32 || py >= img.height() as i32 {
                return;
            }
            let alpha = (cov.clamp(0.0, 1.0) * ink[3] as f32) as u8;
            let dst = img.get_pixel_mut(px as u32, py as u32);
            // Keep the strongest coverage where glyphs overlap.
            if alpha > dst[3] {
                *dst = Rgba([ink[0], ink[1], ink[2], alpha]);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> LegendRenderer {
        LegendRenderer::headless()
    }

    #[test]
    fn test_from_file_missing_font_is_io_error() {
        let err = LegendRenderer::from_file("does/not/exist.ttf").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_canvas_follows_aspect_ratio() {
        let r = renderer();
        let plan = r.plan(&LegendContent::Single("A".into()), 2.0, Color::WHITE, EdgePosition::Interior);
        assert_eq!(plan.height, CANVAS_HEIGHT);
        assert_eq!(plan.width, CANVAS_HEIGHT * 2);
        let narrow = r.plan(&LegendContent::Single("A".into()), 1.0, Color::WHITE, EdgePosition::Interior);
        assert_eq!(narrow.width, CANVAS_HEIGHT);
    }

    #[test]
    fn test_font_size_shrinks_with_length() {
        let one = LegendRenderer::single_px(1);
        let four = LegendRenderer::single_px(4);
        let nine = LegendRenderer::single_px(9);
        assert!(one > four);
        assert!(four >= nine);
        // Floor keeps long labels legible.
        assert!(nine >= CANVAS_HEIGHT as f32 * 0.15 - 1e-6);
    }

    #[test]
    fn test_dual_stacks_shifted_above() {
        let r = renderer();
        let plan = r.plan(
            &LegendContent::Dual { primary: "1".into(), shifted: "!".into() },
            1.0,
            Color::WHITE,
            EdgePosition::Interior,
        );
        assert_eq!(plan.runs.len(), 2);
        let (shifted, primary) = (&plan.runs[0], &plan.runs[1]);
        assert!(shifted.y < primary.y, "shifted char must sit above primary");
        assert!(shifted.px < primary.px, "shifted char must be smaller");
        assert_eq!(shifted.anchor, Anchor::Center);
    }

    #[test]
    fn test_icon_anchor_flips_at_edges() {
        let r = renderer();
        let content = LegendContent::IconText { icon: "⇧".into(), subtext: "shift".into() };
        let left = r.plan(&content, 2.25, Color::WHITE, EdgePosition::Left);
        let interior = r.plan(&content, 2.25, Color::WHITE, EdgePosition::Interior);
        let right = r.plan(&content, 2.25, Color::WHITE, EdgePosition::Right);
        assert!(left.runs.iter().all(|run| run.anchor == Anchor::Right));
        assert!(interior.runs.iter().all(|run| run.anchor == Anchor::Center));
        assert!(right.runs.iter().all(|run| run.anchor == Anchor::Left));
        // Both runs of a legend share the same anchor x.
        assert_eq!(left.runs[0].x, left.runs[1].x);
    }

    #[test]
    fn test_empty_label_plans_no_runs() {
        let r = renderer();
        let plan = r.plan(&LegendContent::Single(String::new()), 6.0, Color::WHITE, EdgePosition::Interior);
        assert!(plan.runs.is_empty());
        // Spacebar-sized canvas still matches the aspect ratio.
        assert_eq!(plan.width, CANVAS_HEIGHT * 6);
    }

    #[test]
    fn test_headless_render_sized_and_transparent() {
        let r = renderer();
        let img = r.render_content(
            &LegendContent::Single("Esc".into()),
            1.0,
            Color::WHITE,
            EdgePosition::Interior,
        );
        assert_eq!(img.dimensions(), (CANVAS_HEIGHT, CANVAS_HEIGHT));
        assert!(img.pixels().all(|p| p[3] == 0));
    }
}
