//! Ordered color palettes.
//!
//! Index 0 of every palette doubles as the transparent sentinel. A conversion never leaves it in a
//! finished tile; [`Palette::substitute_sentinel`] swaps it for the darkest real color.

use std::path::Path;

use rgb::RGBA8;

use crate::error::ConvertError;
use crate::matcher::Tile;

pub const MAX_COLORS: usize = 256;

const ALPHA_THRESHOLD: u8 = 128;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<RGBA8>,
    darkest_index: u8,
}

fn luma(color: RGBA8) -> u32 {
    299 * u32::from(color.r) + 587 * u32::from(color.g) + 114 * u32::from(color.b)
}

fn channel_distance(color1: RGBA8, color2: RGBA8) -> u32 {
    u32::from(color1.r.abs_diff(color2.r))
        + u32::from(color1.g.abs_diff(color2.g))
        + u32::from(color1.b.abs_diff(color2.b))
}

impl Palette {
    pub fn new(colors: Vec<RGBA8>) -> Result<Self, ConvertError> {
        if colors.is_empty() {
            return Err(ConvertError::EmptyPalette);
        }

        if colors.len() > MAX_COLORS {
            return Err(ConvertError::PaletteTooLarge(colors.len()));
        }

        // Index 0 is only used when nothing else exists.
        let darkest_index = colors
            .iter()
            .enumerate()
            .skip(1)
            .min_by_key(|&(index, color)| (luma(*color), index))
            .map_or(0, |(index, _)| index as u8);

        Ok(Palette {
            colors,
            darkest_index,
        })
    }

    /// Builds a palette from the distinct opaque colors of an image, read row-major.
    pub fn from_image(image: &image::RgbaImage) -> Result<Self, ConvertError> {
        let mut colors = vec![RGBA8::new(0, 0, 0, 0)];

        for pixel in image.pixels() {
            if pixel[3] == 0 {
                continue;
            }

            let color = RGBA8::new(pixel[0], pixel[1], pixel[2], pixel[3]);

            if !colors.contains(&color) {
                colors.push(color);

                if colors.len() > MAX_COLORS {
                    return Err(ConvertError::PaletteTooLarge(colors.len()));
                }
            }
        }

        if colors.len() == 1 {
            return Err(ConvertError::EmptyPalette);
        }

        Self::new(colors)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        let image = image::open(path)?.to_rgba8();
        Self::from_image(&image)
    }

    /// The 1-bit palette used for two-color conversions: sentinel, black, white.
    #[must_use]
    pub fn black_and_white() -> Self {
        Palette {
            colors: vec![
                RGBA8::new(0, 0, 0, 0),
                RGBA8::new(0, 0, 0, 255),
                RGBA8::new(255, 255, 255, 255),
            ],
            darkest_index: 1,
        }
    }

    #[must_use]
    pub fn colors(&self) -> &[RGBA8] {
        &self.colors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn color(&self, index: u8) -> RGBA8 {
        self.colors[usize::from(index)]
    }

    #[must_use]
    pub fn darkest_index(&self) -> u8 {
        self.darkest_index
    }

    /// Replaces the sentinel index 0 in either color slot with the darkest color.
    #[must_use]
    pub fn substitute_sentinel(&self, tile: Tile) -> Tile {
        let replace = |index: u8| if index == 0 { self.darkest_index } else { index };

        Tile {
            glyph: tile.glyph,
            fg: replace(tile.fg),
            bg: replace(tile.bg),
        }
    }

    /// Maps a pixel to the closest palette entry. Mostly transparent pixels map to the sentinel.
    #[must_use]
    pub fn nearest_index(&self, pixel: image::Rgba<u8>) -> u8 {
        if pixel[3] < ALPHA_THRESHOLD {
            return 0;
        }

        let target = RGBA8::new(pixel[0], pixel[1], pixel[2], pixel[3]);
        let mut best_delta = u32::MAX;
        let mut best_index = 0;

        for (index, color) in self.colors.iter().enumerate().skip(1) {
            let delta = channel_distance(target, *color);

            if delta < best_delta {
                best_delta = delta;
                best_index = index;
            }
        }

        best_index as u8
    }
}
