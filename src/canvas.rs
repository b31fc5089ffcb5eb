//! The narrow interface a conversion writes through, and a simple in-memory canvas.

use image::RgbaImage;
use serde_json::json;

use crate::colors::Palette;
use crate::glyphs::GlyphBitmapIndex;
use crate::matcher::Tile;

/// A grid of character cells that tiles can be written to.
pub trait TileCanvas {
    /// Width in cells.
    fn width(&self) -> u32;

    /// Height in cells.
    fn height(&self) -> u32;

    fn set_tile(&mut self, frame: usize, layer: usize, x: u32, y: u32, tile: Tile);
}

/// A canvas held entirely in memory, with every frame and layer stored densely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    frames: usize,
    layers: usize,
    tiles: Vec<Tile>,
}

impl TileGrid {
    #[must_use]
    pub fn new(width: u32, height: u32, frames: usize, layers: usize) -> Self {
        TileGrid {
            width,
            height,
            frames,
            layers,
            tiles: vec![Tile::default(); frames * layers * width as usize * height as usize],
        }
    }

    fn offset(&self, frame: usize, layer: usize, x: u32, y: u32) -> usize {
        assert!(
            frame < self.frames && layer < self.layers && x < self.width && y < self.height,
            "tile ({frame}, {layer}, {x}, {y}) is outside the canvas"
        );

        let cells = self.width as usize * self.height as usize;
        (frame * self.layers + layer) * cells + (y * self.width + x) as usize
    }

    #[must_use]
    pub fn tile(&self, frame: usize, layer: usize, x: u32, y: u32) -> Tile {
        self.tiles[self.offset(frame, layer, x, y)]
    }

    /// Draws one frame and layer using the glyph masks and palette colors.
    #[must_use]
    pub fn render(
        &self,
        frame: usize,
        layer: usize,
        glyphs: &GlyphBitmapIndex,
        palette: &Palette,
    ) -> RgbaImage {
        let cell_width = glyphs.cell_width();
        let cell_height = glyphs.cell_height();
        let mut image = RgbaImage::new(self.width * cell_width, self.height * cell_height);

        for y in 0..self.height {
            for x in 0..self.width {
                let tile = self.tile(frame, layer, x, y);
                let mask = glyphs.get(tile.glyph);

                for (i, value) in mask.iter().enumerate() {
                    let color = palette.color(if *value == 0 { tile.bg } else { tile.fg });
                    let px = x * cell_width + i as u32 % cell_width;
                    let py = y * cell_height + i as u32 / cell_width;

                    image.put_pixel(px, py, image::Rgba([color.r, color.g, color.b, color.a]));
                }
            }
        }

        image
    }

    /// One frame and layer as JSON: dimensions plus rows of `[glyph, fg, bg]` triples.
    #[must_use]
    pub fn to_json(&self, frame: usize, layer: usize) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        let tile = self.tile(frame, layer, x, y);
                        json!([tile.glyph, tile.fg, tile.bg])
                    })
                    .collect::<serde_json::Value>()
            })
            .collect();

        json!({
            "width": self.width,
            "height": self.height,
            "frame": frame,
            "layer": layer,
            "tiles": rows,
        })
    }
}

impl TileCanvas for TileGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_tile(&mut self, frame: usize, layer: usize, x: u32, y: u32, tile: Tile) {
        let offset = self.offset(frame, layer, x, y);
        self.tiles[offset] = tile;
    }
}
