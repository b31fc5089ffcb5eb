//! Palettized source pixels and the per-cell blocks cut from them.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use log::debug;

use crate::colors::Palette;
use crate::error::ConvertError;

/// The palette indices covered by one canvas cell, row-major.
///
/// Cells that lie outside the source image produce an empty block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceBlock {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl SourceBlock {
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize,
            "block pixel count does not match its size"
        );

        SourceBlock {
            width,
            height,
            pixels,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        SourceBlock {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// A source image reduced to palette indices.
#[derive(Clone, Debug)]
pub struct SourceImage {
    width: u32,
    height: u32,
    indices: Vec<u8>,
}

impl SourceImage {
    pub fn new(width: u32, height: u32, indices: Vec<u8>) -> Result<Self, ConvertError> {
        if width == 0 || height == 0 {
            return Err(ConvertError::EmptySource);
        }

        if indices.len() != width as usize * height as usize {
            return Err(ConvertError::Geometry(format!(
                "source has {} pixels, expected {width}x{height}",
                indices.len()
            )));
        }

        Ok(SourceImage {
            width,
            height,
            indices,
        })
    }

    pub fn palettize(image: &RgbaImage, palette: &Palette) -> Result<Self, ConvertError> {
        let indices = image
            .pixels()
            .map(|pixel| palette.nearest_index(*pixel))
            .collect();

        Self::new(image.width(), image.height(), indices)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.indices[(y * self.width + x) as usize]
    }

    /// The highest palette index used anywhere in the image.
    #[must_use]
    pub fn max_index(&self) -> u8 {
        self.indices.iter().copied().max().unwrap_or(0)
    }

    /// Cuts out the block for one cell, clipped to the image bounds.
    #[must_use]
    pub fn block(&self, cell_x: u32, cell_y: u32, cell_width: u32, cell_height: u32) -> SourceBlock {
        let x0 = cell_x * cell_width;
        let y0 = cell_y * cell_height;
        let x1 = (x0 + cell_width).min(self.width);
        let y1 = (y0 + cell_height).min(self.height);

        if x0 >= x1 || y0 >= y1 {
            return SourceBlock::empty();
        }

        let mut pixels = Vec::with_capacity(((x1 - x0) * (y1 - y0)) as usize);

        for y in y0..y1 {
            let row = (y * self.width) as usize;
            pixels.extend_from_slice(&self.indices[row + x0 as usize..row + x1 as usize]);
        }

        SourceBlock::new(x1 - x0, y1 - y0, pixels)
    }

    /// Renders the indices back to colors.
    #[must_use]
    pub fn to_rgba(&self, palette: &Palette) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let color = palette.color(self.get(x, y));
            image::Rgba([color.r, color.g, color.b, color.a])
        })
    }
}

/// Scales an image to fit a canvas of `columns × rows` cells, preserving its aspect ratio and
/// truncating both dimensions to whole cells.
pub fn fit_to_canvas(
    image: &DynamicImage,
    columns: u32,
    rows: u32,
    cell_width: u32,
    cell_height: u32,
    bicubic: bool,
) -> Result<RgbaImage, ConvertError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ConvertError::EmptySource);
    }

    let canvas_width = f64::from(columns * cell_width);
    let canvas_height = f64::from(rows * cell_height);
    let ratio = (canvas_height / f64::from(image.height())).min(canvas_width / f64::from(image.width()));

    let width = ((f64::from(image.width()) * ratio) / f64::from(cell_width)).floor() as u32 * cell_width;
    let height =
        ((f64::from(image.height()) * ratio) / f64::from(cell_height)).floor() as u32 * cell_height;

    if width == 0 || height == 0 {
        return Err(ConvertError::EmptySource);
    }

    let filter = if bicubic {
        FilterType::CatmullRom
    } else {
        FilterType::Nearest
    };

    debug!(
        "Scaling source from {}x{} to {width}x{height} ({filter:?})",
        image.width(),
        image.height()
    );

    Ok(imageops::resize(&image.to_rgba8(), width, height, filter))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn source() -> SourceImage {
        SourceImage::new(4, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap()
    }

    #[test]
    fn test_block_is_row_major() {
        assert_eq!(source().block(1, 0, 2, 2).pixels(), &[3, 4, 7, 8]);
    }

    #[test]
    fn test_block_outside_is_empty() {
        assert!(source().block(2, 0, 2, 2).is_empty());
        assert!(source().block(0, 1, 2, 2).is_empty());
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(matches!(
            SourceImage::new(0, 3, Vec::new()),
            Err(ConvertError::EmptySource)
        ));
    }

    #[test]
    fn test_mismatched_source_rejected() {
        assert!(matches!(
            SourceImage::new(2, 2, vec![0; 3]),
            Err(ConvertError::Geometry(_))
        ));
    }

    #[test]
    fn test_palettize() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([250, 250, 250, 255]));
        image.put_pixel(1, 0, image::Rgba([5, 5, 5, 0]));

        let source = SourceImage::palettize(&image, &Palette::black_and_white()).unwrap();
        assert_eq!(source.get(0, 0), 2);
        assert_eq!(source.get(1, 0), 0);
    }

    #[test]
    fn test_fit_preserves_aspect_in_whole_cells() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(100, 50));
        let fitted = fit_to_canvas(&image, 10, 10, 8, 8, false).unwrap();

        assert_eq!(fitted.dimensions(), (80, 40));
    }

    #[test]
    fn test_fit_truncates_to_cells() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(30, 100));
        let fitted = fit_to_canvas(&image, 4, 4, 8, 8, true).unwrap();

        assert_eq!(fitted.dimensions(), (8, 32));
    }

    #[test]
    fn test_fit_too_small_is_empty() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(1, 100));
        assert!(matches!(
            fit_to_canvas(&image, 4, 4, 8, 8, false),
            Err(ConvertError::EmptySource)
        ));
    }
}
