//! Handwriting tracing for vocabulary practice.
//!
//! A target word is rendered off-screen as a solid mask, the learner traces it
//! over a faint guide, and coverage of the mask by their ink decides pass/fail.
//! Built bottom-up:
//!
//! - [`glyph`]: reference mask and tracing guide for a word
//! - [`ink`]: pointer input to strokes
//! - [`coverage`]: pixel coverage score and verdict
//! - [`session`]: ties them together for one word on one panel
//!
//! [`progress`], [`config`] and [`draw`] serve the desktop driver in `main.rs`.

pub mod config;
pub mod coverage;
pub mod draw;
pub mod error;
pub mod gamma;
pub mod glyph;
pub mod ink;
pub mod progress;
pub mod raster;
pub mod session;
pub mod timer;
pub mod types;

pub use coverage::{CoverageResult, score};
pub use error::{Error, Result};
pub use glyph::GlyphRenderer;
pub use raster::RasterBuffer;
pub use session::SessionController;
