//! Per-cell search for the glyph and color pair that best reproduces a source block.
//!
//! Candidates are every ordered pair of distinct colors present in the block, crossed with every
//! glyph in index order. The first combination that renders the block exactly is returned at once;
//! otherwise the whole space is searched and the first combination with the lowest error wins.

use crate::distance::ColorDistanceTable;
use crate::glyphs::GlyphBitmapIndex;
use crate::source::SourceBlock;

/// The contents of one canvas cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    pub glyph: u32,
    pub fg: u8,
    pub bg: u8,
}

/// A tile together with the total distance between its rendering and the source block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    pub tile: Tile,
    pub error: f32,
}

/// Glyphs returned without searching for empty and single-color blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReservedGlyphs {
    pub blank: u32,
    pub solid: u32,
}

/// Which color pairs are tried for a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PairStrategy {
    /// Every ordered pair of distinct colors present in the block.
    #[default]
    Present,
    /// A single fixed pair, used for two-color conversions.
    Fixed { fg: u8, bg: u8 },
}

/// The order in which candidate pairs are searched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PairOrder {
    /// Most frequent color pairs first.
    #[default]
    Frequency,
    /// Ascending palette index.
    Index,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ColorPair {
    fg: u8,
    bg: u8,
    weight: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BlockMatcher {
    reserved: ReservedGlyphs,
    strategy: PairStrategy,
    order: PairOrder,
}

/// Distinct colors of a block with their pixel counts, in ascending index order.
fn color_counts(pixels: &[u8]) -> Vec<(u8, usize)> {
    let mut counts = [0usize; 256];

    for pixel in pixels {
        counts[usize::from(*pixel)] += 1;
    }

    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(color, count)| (color as u8, *count))
        .collect()
}

fn candidate_pairs(counts: &[(u8, usize)], order: PairOrder) -> Vec<ColorPair> {
    let mut ranked = counts.to_vec();

    if order == PairOrder::Frequency {
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
    }

    let mut pairs = Vec::with_capacity(ranked.len() * ranked.len().saturating_sub(1));

    for &(color1, count1) in &ranked {
        for &(color2, count2) in &ranked {
            if color1 == color2 {
                continue;
            }

            // The more common color of the pair is tried as the background first.
            pairs.push(ColorPair {
                fg: color2,
                bg: color1,
                weight: count1 + count2,
            });
        }
    }

    if order == PairOrder::Frequency {
        pairs.sort_by(|a, b| b.weight.cmp(&a.weight));
    }

    pairs
}

fn search(
    pixels: &[u8],
    pairs: &[ColorPair],
    distances: &ColorDistanceTable,
    glyphs: &GlyphBitmapIndex,
) -> Match {
    let mut best = Match {
        tile: Tile::default(),
        error: f32::INFINITY,
    };

    let mut fg_costs = vec![0.0; pixels.len()];
    let mut bg_costs = vec![0.0; pixels.len()];

    for pair in pairs {
        // Per-pixel cost of each choice; a glyph's mask then selects one per pixel.
        for ((pixel, fg_cost), bg_cost) in pixels.iter().zip(&mut fg_costs).zip(&mut bg_costs) {
            *fg_cost = distances.get(*pixel, pair.fg);
            *bg_cost = distances.get(*pixel, pair.bg);
        }

        for (glyph, mask) in glyphs.iter().enumerate() {
            let error: f32 = mask
                .iter()
                .zip(&fg_costs)
                .zip(&bg_costs)
                .map(|((value, fg_cost), bg_cost)| if *value == 0 { *bg_cost } else { *fg_cost })
                .sum();

            let tile = Tile {
                glyph: glyph as u32,
                fg: pair.fg,
                bg: pair.bg,
            };

            if error <= 0.0 {
                return Match { tile, error };
            }

            if error < best.error {
                best = Match { tile, error };
            }
        }
    }

    best
}

/// Renders a tile back into a block of palette indices.
#[must_use]
pub fn render_tile(tile: Tile, glyphs: &GlyphBitmapIndex) -> Vec<u8> {
    glyphs
        .get(tile.glyph)
        .iter()
        .map(|value| if *value == 0 { tile.bg } else { tile.fg })
        .collect()
}

/// The sum of distances between two equally sized blocks of palette indices, position by position.
#[must_use]
pub fn block_error(source: &[u8], rendered: &[u8], distances: &ColorDistanceTable) -> f32 {
    debug_assert_eq!(source.len(), rendered.len());

    source
        .iter()
        .zip(rendered)
        .map(|(a, b)| distances.get(*a, *b))
        .sum()
}

impl BlockMatcher {
    #[must_use]
    pub fn new(reserved: ReservedGlyphs, strategy: PairStrategy, order: PairOrder) -> Self {
        BlockMatcher {
            reserved,
            strategy,
            order,
        }
    }

    #[must_use]
    pub fn reserved(&self) -> ReservedGlyphs {
        self.reserved
    }

    #[must_use]
    pub fn match_block(
        &self,
        block: &SourceBlock,
        distances: &ColorDistanceTable,
        glyphs: &GlyphBitmapIndex,
    ) -> Tile {
        self.match_scored(block, distances, glyphs).tile
    }

    #[must_use]
    pub fn match_scored(
        &self,
        block: &SourceBlock,
        distances: &ColorDistanceTable,
        glyphs: &GlyphBitmapIndex,
    ) -> Match {
        let counts = color_counts(block.pixels());

        let pairs = match self.strategy {
            PairStrategy::Present => match counts.as_slice() {
                [] | [(0, _)] => return self.blank(0),
                [(color, _)] => {
                    return Match {
                        tile: Tile {
                            glyph: self.reserved.solid,
                            fg: *color,
                            bg: *color,
                        },
                        error: 0.0,
                    };
                }
                _ => candidate_pairs(&counts, self.order),
            },
            PairStrategy::Fixed { fg, bg } => {
                if matches!(counts.as_slice(), [] | [(0, _)]) {
                    return self.blank(bg);
                }

                vec![ColorPair { fg, bg, weight: 0 }]
            }
        };

        assert_eq!(
            block.pixels().len(),
            glyphs.cell_size(),
            "source block does not match the glyph cell size"
        );

        search(block.pixels(), &pairs, distances, glyphs)
    }

    fn blank(&self, bg: u8) -> Match {
        Match {
            tile: Tile {
                glyph: self.reserved.blank,
                fg: 0,
                bg,
            },
            error: 0.0,
        }
    }
}
