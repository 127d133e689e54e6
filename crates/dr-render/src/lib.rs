//! # dr-render
//!
//! Turns a [`dr_core::Feature`] into a banner PNG: a random mid-range
//! background, black or white text chosen for contrast, and a caption
//! wrapped and trimmed to fit the canvas.

pub mod banner;
pub mod engine;
pub mod palette;
pub mod wrap;

pub use banner::{BannerImage, BannerRenderer, RenderConfig, GLYPHS};
pub use engine::{default_engine, BlockEngine, CosmicTextEngine, TextEngine};
pub use palette::{contrast_color, random_background, ColorRange};
