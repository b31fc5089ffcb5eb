//! Binary glyph masks sliced from a charset atlas.

use std::path::Path;

use image::GrayImage;
use log::{debug, warn};

use crate::error::ConvertError;

const LUMA_THRESHOLD: u8 = 128;

/// Layout of glyph cells within an atlas image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasGeometry {
    pub cell_width: u32,
    pub cell_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub last_index: u32,
}

impl AtlasGeometry {
    /// Geometry covering every whole cell of an atlas of the given size.
    #[must_use]
    pub fn for_atlas(atlas: &GrayImage, cell_width: u32, cell_height: u32) -> Self {
        let columns = atlas.width() / cell_width.max(1);
        let rows = atlas.height() / cell_height.max(1);

        AtlasGeometry {
            cell_width,
            cell_height,
            columns,
            rows,
            last_index: (columns * rows).saturating_sub(1),
        }
    }
}

/// Converts a charset image to a bi-level raster: 1 for foreground pixels, 0 for background.
#[must_use]
pub fn binarize(image: &image::DynamicImage) -> GrayImage {
    let mut atlas = image.to_luma8();

    for pixel in atlas.pixels_mut() {
        pixel[0] = u8::from(pixel[0] >= LUMA_THRESHOLD);
    }

    atlas
}

pub fn open_atlas<P: AsRef<Path>>(path: P) -> Result<GrayImage, ConvertError> {
    Ok(binarize(&image::open(path)?))
}

/// Every glyph of an atlas as a row-major mask of `cell_height × cell_width` values in {0, 1}.
#[derive(Clone, Debug)]
pub struct GlyphBitmapIndex {
    cell_width: u32,
    cell_height: u32,
    masks: Vec<u8>,
}

impl GlyphBitmapIndex {
    pub fn build(atlas: &GrayImage, geometry: AtlasGeometry) -> Result<Self, ConvertError> {
        let AtlasGeometry {
            cell_width,
            cell_height,
            columns,
            rows,
            last_index,
        } = geometry;

        if cell_width == 0 || cell_height == 0 {
            return Err(ConvertError::Geometry(format!(
                "glyph cells must be non-empty, got {cell_width}x{cell_height}"
            )));
        }

        let fit_columns = columns.min(atlas.width() / cell_width);
        let fit_rows = rows.min(atlas.height() / cell_height);

        if (fit_columns, fit_rows) != (columns, rows) {
            warn!(
                "Atlas declares {columns}x{rows} glyphs but only {fit_columns}x{fit_rows} fit; truncating"
            );
        }

        let capacity = fit_columns as usize * fit_rows as usize;
        let count = capacity.min(last_index as usize + 1);
        let cell_size = cell_width as usize * cell_height as usize;
        let mut masks = Vec::with_capacity(count * cell_size);

        'rows: for glyph_y in 0..fit_rows {
            for glyph_x in 0..fit_columns {
                if masks.len() == count * cell_size {
                    break 'rows;
                }

                let x0 = glyph_x * cell_width;
                let y0 = glyph_y * cell_height;

                for y in y0..y0 + cell_height {
                    for x in x0..x0 + cell_width {
                        masks.push(u8::from(atlas.get_pixel(x, y)[0] != 0));
                    }
                }
            }
        }

        if masks.is_empty() {
            return Err(ConvertError::NoGlyphs);
        }

        debug!("Indexed {count} glyphs of {cell_width}x{cell_height} pixels");

        Ok(GlyphBitmapIndex {
            cell_width,
            cell_height,
            masks,
        })
    }

    /// Builds an index directly from masks, each `cell_width * cell_height` values long.
    pub fn from_masks(
        cell_width: u32,
        cell_height: u32,
        glyphs: &[Vec<u8>],
    ) -> Result<Self, ConvertError> {
        let cell_size = cell_width as usize * cell_height as usize;

        if cell_size == 0 {
            return Err(ConvertError::Geometry(format!(
                "glyph cells must be non-empty, got {cell_width}x{cell_height}"
            )));
        }

        if glyphs.is_empty() {
            return Err(ConvertError::NoGlyphs);
        }

        let mut masks = Vec::with_capacity(glyphs.len() * cell_size);

        for (index, glyph) in glyphs.iter().enumerate() {
            if glyph.len() != cell_size {
                return Err(ConvertError::Geometry(format!(
                    "glyph {index} has {} pixels, expected {cell_size}",
                    glyph.len()
                )));
            }

            masks.extend(glyph.iter().map(|value| u8::from(*value != 0)));
        }

        Ok(GlyphBitmapIndex {
            cell_width,
            cell_height,
            masks,
        })
    }

    #[must_use]
    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    #[must_use]
    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    #[must_use]
    pub fn cell_size(&self) -> usize {
        self.cell_width as usize * self.cell_height as usize
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.masks.len() / self.cell_size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// The mask of one glyph. Panics if `index` is not a valid glyph.
    #[must_use]
    pub fn get(&self, index: u32) -> &[u8] {
        let index = index as usize;
        assert!(
            index < self.len(),
            "glyph index {index} out of range (0..{})",
            self.len()
        );

        let cell_size = self.cell_size();
        &self.masks[index * cell_size..(index + 1) * cell_size]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.masks.chunks_exact(self.cell_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 4x2 atlas of 2x2 cells: solid, empty, left half, checkerboard.
    fn atlas() -> GrayImage {
        GrayImage::from_raw(
            8,
            2,
            vec![
                1, 1, 0, 0, 1, 0, 1, 0, //
                1, 1, 0, 0, 1, 0, 0, 1,
            ],
        )
        .unwrap()
    }

    fn geometry(columns: u32, rows: u32, last_index: u32) -> AtlasGeometry {
        AtlasGeometry {
            cell_width: 2,
            cell_height: 2,
            columns,
            rows,
            last_index,
        }
    }

    #[test]
    fn test_slices_in_row_major_order() {
        let index = GlyphBitmapIndex::build(&atlas(), geometry(4, 1, 3)).unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index.get(0), &[1, 1, 1, 1]);
        assert_eq!(index.get(1), &[0, 0, 0, 0]);
        assert_eq!(index.get(2), &[1, 0, 1, 0]);
        assert_eq!(index.get(3), &[1, 0, 0, 1]);
    }

    #[test]
    fn test_stops_at_last_index() {
        let index = GlyphBitmapIndex::build(&atlas(), geometry(4, 1, 1)).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.iter().count(), 2);
    }

    #[test]
    fn test_truncates_oversized_geometry() {
        let index = GlyphBitmapIndex::build(&atlas(), geometry(6, 3, 100)).unwrap();
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_no_glyphs_is_an_error() {
        assert!(matches!(
            GlyphBitmapIndex::build(&atlas(), geometry(0, 1, 3)),
            Err(ConvertError::NoGlyphs)
        ));
    }

    #[test]
    fn test_zero_cell_is_an_error() {
        let geometry = AtlasGeometry {
            cell_width: 0,
            ..geometry(4, 1, 3)
        };
        assert!(matches!(
            GlyphBitmapIndex::build(&atlas(), geometry),
            Err(ConvertError::Geometry(_))
        ));
    }

    #[test]
    fn test_geometry_for_atlas() {
        let geometry = AtlasGeometry::for_atlas(&atlas(), 2, 2);
        assert_eq!(geometry, self::geometry(4, 1, 3));
    }

    #[test]
    fn test_binarize() {
        let mut image = image::GrayImage::new(2, 1);
        image.put_pixel(0, 0, image::Luma([200]));
        image.put_pixel(1, 0, image::Luma([40]));
        let atlas = binarize(&image::DynamicImage::ImageLuma8(image));
        assert_eq!(atlas.as_raw(), &vec![1, 0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_lookup_panics() {
        let index = GlyphBitmapIndex::build(&atlas(), geometry(4, 1, 1)).unwrap();
        let _ = index.get(2);
    }
}
