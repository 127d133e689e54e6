//! Feature → banner image.

use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use dr_core::{Error, Feature, Result};

use crate::engine::{default_engine, TextEngine};
use crate::palette::{contrast_color, random_background, ColorRange};
use crate::wrap::layout_lines;

/// Decorative glyphs appended to banner captions.
pub const GLYPHS: &[char] = &['★', '✦', '◆', '●', '▲', '✚'];

/// Canvas and typography settings, the `[render]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Total horizontal space kept free of text; a line may be at most
    /// `width - margin` pixels wide.
    pub margin: u32,
    pub font_size: f32,
    /// Line height as a multiple of the font size.
    pub line_spacing: f32,
    /// Approximate characters per line before word wrapping.
    pub wrap_width: usize,
    pub colors: ColorRange,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            margin: 120,
            font_size: 64.0,
            line_spacing: 1.25,
            wrap_width: 28,
            colors: ColorRange::default(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Validation("canvas dimensions must be positive".into()));
        }
        if self.margin >= self.width {
            return Err(Error::Validation(format!(
                "margin {} leaves no room on a {}px canvas",
                self.margin, self.width
            )));
        }
        if [self.font_size, self.line_spacing]
            .iter()
            .any(|v| !v.is_finite() || *v <= 0.0)
        {
            return Err(Error::Validation(
                "font size and line spacing must be positive".into(),
            ));
        }
        if self.wrap_width == 0 {
            return Err(Error::Validation("wrap width must be positive".into()));
        }
        self.colors.validate()
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * self.line_spacing
    }

    /// Widest a rendered line may be, in pixels.
    pub fn max_line_width(&self) -> f32 {
        self.width.saturating_sub(self.margin) as f32
    }
}

/// A rendered banner on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub background: Rgb<u8>,
    pub foreground: Rgb<u8>,
    pub lines: Vec<String>,
    pub glyph: Option<char>,
}

/// Renders one banner per feature.
pub struct BannerRenderer<E: TextEngine = Box<dyn TextEngine>> {
    config: RenderConfig,
    engine: E,
    rng: StdRng,
}

impl BannerRenderer {
    /// Renderer using system fonts (or block glyphs when there are none).
    pub fn with_system_fonts(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let engine = default_engine(config.font_size, config.line_height());
        Ok(Self::new(config, engine))
    }
}

impl<E: TextEngine> BannerRenderer<E> {
    pub fn new(config: RenderConfig, engine: E) -> Self {
        Self {
            config,
            engine,
            rng: StdRng::from_entropy(),
        }
    }

    /// Fix the random source, for reproducible colors and glyphs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `feature` as a PNG at `output`.
    pub fn render(&mut self, feature: &Feature, output: &Path) -> Result<BannerImage> {
        self.config.validate()?;
        let RenderConfig { width, height, .. } = self.config;

        let glyph = GLYPHS.choose(&mut self.rng).copied();
        let text = match glyph {
            Some(g) => format!("{} {g}", feature.caption()),
            None => feature.caption(),
        };
        let background = random_background(&mut self.rng, self.config.colors);
        let foreground = contrast_color(background);

        let max_width = self.config.max_line_width();
        let lines = layout_lines(&mut self.engine, &text, self.config.wrap_width, max_width);

        let mut canvas = RgbImage::from_pixel(width, height, background);
        let line_height = self.engine.line_height();
        let block_height = line_height * lines.len() as f32;
        let top = (height as f32 - block_height) / 2.0;
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let line_width = self.engine.measure(line);
            let x = (width as f32 - line_width) / 2.0;
            let y = top + i as f32 * line_height;
            self.engine.draw(&mut canvas, line, x, y, foreground);
        }

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        canvas
            .save_with_format(output, ImageFormat::Png)
            .map_err(|e| Error::render(format!("failed to write {}: {e}", output.display())))?;

        tracing::debug!(
            "rendered banner for '{}' -> {} ({} line(s))",
            feature.name(),
            output.display(),
            lines.len()
        );

        Ok(BannerImage {
            path: output.to_path_buf(),
            width,
            height,
            background,
            foreground,
            lines,
            glyph,
        })
    }
}
