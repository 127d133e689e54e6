//! Banner colors: a random mid-range background and a contrasting
//! black or white foreground.

use image::Rgb;
use rand::Rng;
use serde::{Deserialize, Serialize};

use dr_core::{Error, Result};

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Luminance (in thousandths) at and above which text is drawn black.
const DARK_TEXT_THRESHOLD: u32 = 186_000;

/// Inclusive per-channel range backgrounds are drawn from.
///
/// Staying away from both ends keeps either text color readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorRange {
    pub min: u8,
    pub max: u8,
}

impl Default for ColorRange {
    fn default() -> Self {
        Self { min: 50, max: 205 }
    }
}

impl ColorRange {
    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(Error::Validation(format!(
                "color range {}..={} is empty",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, channel: u8) -> bool {
        (self.min..=self.max).contains(&channel)
    }
}

/// Draw each channel uniformly from `range`.
pub fn random_background<R: Rng + ?Sized>(rng: &mut R, range: ColorRange) -> Rgb<u8> {
    let (lo, hi) = (range.min.min(range.max), range.max.max(range.min));
    Rgb([
        rng.gen_range(lo..=hi),
        rng.gen_range(lo..=hi),
        rng.gen_range(lo..=hi),
    ])
}

/// Rec. 601 luma scaled by 1000: `299r + 587g + 114b`.
pub fn luminance_milli(color: Rgb<u8>) -> u32 {
    let [r, g, b] = color.0;
    299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)
}

/// Black on light backgrounds (luminance 186 and up), white otherwise.
pub fn contrast_color(background: Rgb<u8>) -> Rgb<u8> {
    if luminance_milli(background) >= DARK_TEXT_THRESHOLD {
        BLACK
    } else {
        WHITE
    }
}
