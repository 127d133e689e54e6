//! Text measurement and rasterization.

use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache};
use image::{Rgb, RgbImage};

/// Measures and draws single lines of text onto an RGB canvas.
pub trait TextEngine {
    /// Pixel width of `text` laid out on one line.
    fn measure(&mut self, text: &str) -> f32;

    /// Vertical distance between consecutive baselines.
    fn line_height(&self) -> f32;

    /// Draw `text` with its top-left corner at (`x`, `y`).
    fn draw(&mut self, canvas: &mut RgbImage, text: &str, x: f32, y: f32, color: Rgb<u8>);
}

/// Width wide enough that a single line never wraps inside cosmic-text.
const UNBOUNDED_WIDTH: f32 = 100_000.0;

/// System-font text engine backed by cosmic-text.
pub struct CosmicTextEngine {
    font_system: FontSystem,
    swash_cache: SwashCache,
    metrics: Metrics,
}

impl CosmicTextEngine {
    pub fn new(font_size: f32, line_height: f32) -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            metrics: Metrics::new(font_size, line_height),
        }
    }

    /// Whether any font face was found on this system.
    pub fn has_fonts(&self) -> bool {
        self.font_system.db().faces().next().is_some()
    }

    fn shaped(&mut self, text: &str) -> Buffer {
        let mut buffer = Buffer::new(&mut self.font_system, self.metrics);
        buffer.set_size(
            &mut self.font_system,
            Some(UNBOUNDED_WIDTH),
            Some(self.metrics.line_height * 2.0),
        );
        buffer.set_text(
            &mut self.font_system,
            text,
            Attrs::new().family(Family::SansSerif),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }
}

impl TextEngine for CosmicTextEngine {
    fn measure(&mut self, text: &str) -> f32 {
        let buffer = self.shaped(text);
        let mut width = 0.0f32;
        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                width = width.max(glyph.x + glyph.w);
            }
        }
        width
    }

    fn line_height(&self) -> f32 {
        self.metrics.line_height
    }

    fn draw(&mut self, canvas: &mut RgbImage, text: &str, x: f32, y: f32, color: Rgb<u8>) {
        let buffer = self.shaped(text);
        let [r, g, b] = color.0;
        let (ox, oy) = (x.round() as i32, y.round() as i32);
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgb(r, g, b),
            |gx, gy, w, h, c| {
                let alpha = c.a();
                if alpha == 0 {
                    return;
                }
                let src = Rgb([c.r(), c.g(), c.b()]);
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        blend(canvas, ox + gx + dx, oy + gy + dy, src, alpha);
                    }
                }
            },
        );
    }
}

/// Monospace block renderer used when no system fonts are available.
///
/// Every character advances by a fixed width; visible characters are drawn
/// as solid cells.
#[derive(Debug, Clone)]
pub struct BlockEngine {
    advance: f32,
    line_height: f32,
}

impl BlockEngine {
    pub fn new(font_size: f32, line_height: f32) -> Self {
        Self {
            advance: (font_size * 0.6).max(1.0),
            line_height,
        }
    }

    pub fn advance(&self) -> f32 {
        self.advance
    }
}

impl TextEngine for BlockEngine {
    fn measure(&mut self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }

    fn draw(&mut self, canvas: &mut RgbImage, text: &str, x: f32, y: f32, color: Rgb<u8>) {
        let cell_w = (self.advance * 0.8).max(1.0) as i32;
        let cell_h = (self.line_height * 0.7).max(1.0) as i32;
        let top = y.round() as i32;
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = (x + i as f32 * self.advance).round() as i32;
            for dy in 0..cell_h {
                for dx in 0..cell_w {
                    blend(canvas, left + dx, top + dy, color, 255);
                }
            }
        }
    }
}

/// Pick cosmic-text when the system has fonts, blocks otherwise.
pub fn default_engine(font_size: f32, line_height: f32) -> Box<dyn TextEngine> {
    let cosmic = CosmicTextEngine::new(font_size, line_height);
    if cosmic.has_fonts() {
        Box::new(cosmic)
    } else {
        tracing::warn!("No system fonts found; banners will use block glyphs");
        Box::new(BlockEngine::new(font_size, line_height))
    }
}

impl<T: TextEngine + ?Sized> TextEngine for Box<T> {
    fn measure(&mut self, text: &str) -> f32 {
        (**self).measure(text)
    }

    fn line_height(&self) -> f32 {
        (**self).line_height()
    }

    fn draw(&mut self, canvas: &mut RgbImage, text: &str, x: f32, y: f32, color: Rgb<u8>) {
        (**self).draw(canvas, text, x, y, color)
    }
}

/// Alpha-blend `src` over the pixel at (`x`, `y`); out-of-bounds is ignored.
fn blend(canvas: &mut RgbImage, x: i32, y: i32, src: Rgb<u8>, alpha: u8) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let a = u32::from(alpha);
    for i in 0..3 {
        let s = u32::from(src.0[i]);
        let d = u32::from(dst.0[i]);
        dst.0[i] = ((s * a + d * (255 - a) + 127) / 255) as u8;
    }
}
