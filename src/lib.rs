// src/lib.rs
//! # keyglow
//!
//! Core of an interactive, animated 3D mechanical keyboard visualizer:
//! procedural keycap mesh synthesis, per-key press animation, simulated RGB
//! underglow, and the resource cache that keeps repeated synthesis cheap.
//!
//! - **Geometry**: parametric keycap displacement — taper, rounded corners,
//!   top scoop, spacebar ridge, sculpted row profiles. Deterministic, so the
//!   cache can share meshes by value-equality signature.
//! - **Animation**: press/release with frame-rate-independent exponential
//!   smoothing and exact epsilon snap; five underglow effects (stable,
//!   pulse, cycle, reactive, gemini), all pure per-key functions.
//! - **Headless**: no window, device, or rasterizer here. The embedder's
//!   renderer consumes the mesh/material/legend graph; its input layer calls
//!   `press_key`/`release_key`; its settings panel hands in a
//!   `LightingSettings` snapshot each frame.
//!
//! ```no_run
//! use keyglow::{KeyboardAssembly, LayoutTable, LegendRenderer, LightingSettings, Theme};
//!
//! let mut board = KeyboardAssembly::build(
//!     LayoutTable::builtin()?,
//!     Theme::dark(),
//!     LegendRenderer::headless(),
//! )?;
//! let settings = LightingSettings::default();
//! board.press_key("KeyA");
//! board.update(1.0 / 60.0, &settings);
//! # Ok::<(), keyglow::Error>(())
//! ```

pub mod board;
pub mod cache;
pub mod color;
pub mod error;
pub mod geometry;
pub mod key;
pub mod layout;
pub mod legend;
pub mod lighting;
pub mod palette;

pub use board::KeyboardAssembly;
pub use cache::{CacheStats, GeometrySig, MaterialSig, ResourceCache};
pub use color::{Color, Hsl};
pub use error::{Error, Result};
pub use geometry::{FactoryOptions, GeometryFactory, GeometryParams, KeycapMesh, Vertex};
pub use key::KeyInstance;
pub use layout::{ColorRole, KeySpec, LayoutTable};
pub use legend::{EdgePosition, LegendContent, LegendPlan, LegendRenderer};
pub use lighting::{Effect, LightingSettings, Underglow, UnderglowPhase};
pub use palette::{Material, Theme};
