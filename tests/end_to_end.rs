use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use rgb::RGBA8;

use tileconv::matcher::{block_error, render_tile};
use tileconv::{
    AtlasGeometry, BlockMatcher, ColorDistanceTable, ConversionState, ConverterOptions,
    DistanceMode, GlyphBitmapIndex, Palette, ProgressiveScheduler, SourceImage, Tile, TileGrid,
};

const A: u8 = 1;
const B: u8 = 2;
const C: u8 = 3;
const D: u8 = 4;

fn palette() -> Palette {
    Palette::new(vec![
        RGBA8::new(0, 0, 0, 0),
        RGBA8::new(16, 16, 16, 255),
        RGBA8::new(240, 240, 240, 255),
        RGBA8::new(220, 30, 30, 255),
        RGBA8::new(30, 30, 220, 255),
    ])
    .unwrap()
}

// Glyph 0 is a solid block, glyph 1 a checkerboard.
fn glyphs() -> GlyphBitmapIndex {
    let atlas = image::GrayImage::from_raw(4, 2, vec![1, 1, 1, 0, 1, 1, 0, 1]).unwrap();
    GlyphBitmapIndex::build(
        &atlas,
        AtlasGeometry {
            cell_width: 2,
            cell_height: 2,
            columns: 2,
            rows: 1,
            last_index: 1,
        },
    )
    .unwrap()
}

fn source() -> SourceImage {
    SourceImage::new(
        4,
        4,
        vec![
            A, A, A, B, //
            A, A, B, A, //
            C, D, D, D, //
            C, C, D, D,
        ],
    )
    .unwrap()
}

fn convert(options: ConverterOptions) -> TileGrid {
    let mut scheduler = ProgressiveScheduler::new(source(), &palette(), glyphs(), options).unwrap();
    let mut grid = TileGrid::new(2, 2, 1, 1);
    let start = Instant::now();
    let now = start + Duration::from_secs(1);
    scheduler.start(start);

    while scheduler.tick(now, &mut grid) != ConversionState::Finished {}

    grid
}

#[test]
fn solid_and_checkerboard_cells() {
    let grid = convert(ConverterOptions {
        blocks_per_tick: 1,
        start_delay: Duration::from_millis(100),
        ..ConverterOptions::default()
    });

    assert_eq!(
        grid.tile(0, 0, 0, 0),
        Tile {
            glyph: 0,
            fg: A,
            bg: A
        }
    );

    let checker = grid.tile(0, 0, 1, 0);
    assert_eq!(checker.glyph, 1);
    assert!(
        (checker.fg, checker.bg) == (A, B) || (checker.fg, checker.bg) == (B, A),
        "{checker:?}"
    );

    let glyphs = glyphs();
    let distances = ColorDistanceTable::build(palette().colors(), DistanceMode::Lab);
    let rendered = render_tile(checker, &glyphs);
    assert_eq!(rendered, vec![A, B, B, A]);
    assert_eq!(block_error(&[A, B, B, A], &rendered, &distances), 0.0);
}

#[test]
fn approximate_cell_prefers_first_best_combination() {
    let grid = convert(ConverterOptions::default());

    assert_eq!(
        grid.tile(0, 0, 0, 1),
        Tile {
            glyph: 0,
            fg: C,
            bg: D
        }
    );
    assert_eq!(
        grid.tile(0, 0, 1, 1),
        Tile {
            glyph: 0,
            fg: D,
            bg: D
        }
    );
}

#[test]
fn all_distance_modes_agree_on_exact_cells() {
    for mode in [DistanceMode::Linear, DistanceMode::Lab, DistanceMode::Redmean] {
        let grid = convert(ConverterOptions {
            distance_mode: mode,
            ..ConverterOptions::default()
        });

        assert_eq!(
            grid.tile(0, 0, 0, 0),
            Tile {
                glyph: 0,
                fg: A,
                bg: A
            }
        );
        assert_eq!(grid.tile(0, 0, 1, 0).glyph, 1, "{mode:?}");
    }
}

#[test]
fn cancelled_conversion_keeps_partial_tiles() {
    let options = ConverterOptions {
        start_delay: Duration::ZERO,
        ..ConverterOptions::default()
    };
    let mut scheduler = ProgressiveScheduler::new(source(), &palette(), glyphs(), options).unwrap();
    let mut grid = TileGrid::new(2, 2, 1, 1);
    let now = Instant::now();
    scheduler.start(now);

    scheduler.tick(now, &mut grid);
    let report = scheduler.cancel(now).unwrap();
    scheduler.tick(now, &mut grid);

    assert!(report.cancelled);
    assert_eq!(scheduler.cells_written(), 1);
    assert_eq!(grid.tile(0, 0, 0, 0).fg, A);
    assert_eq!(grid.tile(0, 0, 1, 0), Tile::default());
}

#[test]
fn rendered_grid_reproduces_exact_cells() {
    let grid = convert(ConverterOptions::default());
    let palette = palette();
    let image = grid.render(0, 0, &glyphs(), &palette);

    assert_eq!(image.dimensions(), (4, 4));

    for (x, y) in [(0, 0), (1, 1), (2, 1), (3, 0)] {
        let expected = palette.color(source().get(x, y));
        let pixel = image.get_pixel(x, y);
        assert_eq!(
            RGBA8::new(pixel[0], pixel[1], pixel[2], pixel[3]),
            expected,
            "pixel {x},{y}"
        );
    }
}

#[test]
fn matcher_is_independent_of_scheduler() {
    let glyphs = glyphs();
    let distances = ColorDistanceTable::build(palette().colors(), DistanceMode::Lab);
    let block = source().block(1, 0, 2, 2);

    assert_eq!(
        BlockMatcher::default().match_block(&block, &distances, &glyphs),
        BlockMatcher::default().match_block(&block, &distances, &glyphs)
    );
}
