//! Converts raster images into grids of character-cell tiles.
//!
//! Each tile is a glyph from a fixed atlas drawn with a foreground and background color from a
//! fixed palette. Tiles are chosen per cell to minimise the color distance to the source, and the
//! conversion runs incrementally through [`ProgressiveScheduler`] so a host loop stays responsive.

use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use log::info;
use serde_json::json;

pub mod canvas;
pub mod colors;
pub mod config;
pub mod distance;
pub mod error;
pub mod glyphs;
pub mod matcher;
pub mod scheduler;
pub mod source;
pub mod util;

pub use canvas::{TileCanvas, TileGrid};
pub use colors::Palette;
pub use distance::{ColorDistanceTable, DistanceMode};
pub use error::ConvertError;
pub use glyphs::{AtlasGeometry, GlyphBitmapIndex};
pub use matcher::{BlockMatcher, Match, PairOrder, PairStrategy, ReservedGlyphs, Tile};
pub use scheduler::{ConversionReport, ConversionState, ConverterOptions, ProgressiveScheduler};
pub use source::{SourceBlock, SourceImage};

fn load_glyphs(config: &config::Config) -> anyhow::Result<GlyphBitmapIndex> {
    let atlas = glyphs::open_atlas(&config.charset)
        .with_context(|| format!("could not load charset {}", config.charset.display()))?;

    let mut geometry = AtlasGeometry::for_atlas(&atlas, config.cell_width, config.cell_height);

    if let Some(columns) = config.columns {
        geometry.columns = columns;
    }

    if let Some(rows) = config.rows {
        geometry.rows = rows;
    }

    geometry.last_index = config
        .last_glyph
        .unwrap_or_else(|| (geometry.columns * geometry.rows).saturating_sub(1));

    Ok(GlyphBitmapIndex::build(&atlas, geometry)?)
}

fn load_palette(config: &config::Config) -> anyhow::Result<Palette> {
    if config.two_color {
        return Ok(Palette::black_and_white());
    }

    let Some(path) = &config.palette else {
        bail!("a palette is required unless --two-color is given");
    };

    Palette::open(path).with_context(|| format!("could not load palette {}", path.display()))
}

pub fn run(config: &config::Config) -> anyhow::Result<()> {
    println!("Tile Image Converter");
    println!("Source Image: {}", config.source_filename.display());

    let palette = load_palette(config)?;
    let glyphs = load_glyphs(config)?;

    let image = image::open(&config.source_filename).with_context(|| {
        format!(
            "could not load source image {}",
            config.source_filename.display()
        )
    })?;
    let scaled = source::fit_to_canvas(
        &image,
        config.width,
        config.height,
        glyphs.cell_width(),
        glyphs.cell_height(),
        config.bicubic,
    )?;
    let source = SourceImage::palettize(&scaled, &palette)?;

    let options = ConverterOptions {
        distance_mode: config.distance,
        blocks_per_tick: config.blocks_per_tick,
        start_delay: Duration::from_millis(config.start_delay_ms),
        reserved: ReservedGlyphs {
            blank: config.blank_glyph,
            solid: config.solid_glyph,
        },
        strategy: if config.two_color {
            PairStrategy::Fixed { fg: 1, bg: 2 }
        } else {
            PairStrategy::Present
        },
        ..ConverterOptions::default()
    };

    let mut scheduler = ProgressiveScheduler::new(source, &palette, glyphs, options)
        .context("could not initialize conversion")?;

    if let (Some(path), Some(preview)) = (&config.preview, scheduler.preview()) {
        preview
            .save(path)
            .with_context(|| format!("could not write preview {}", path.display()))?;
    }

    let mut grid = TileGrid::new(config.width, config.height, 1, 1);
    let time_limit = config
        .time_limit_secs
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("invalid time limit")?;
    let started = Instant::now();
    scheduler.start(started);

    let report = loop {
        let now = Instant::now();

        if time_limit.is_some_and(|limit| now.duration_since(started) >= limit) {
            if let Some(report) = scheduler.cancel(now) {
                break report;
            }
        }

        if scheduler.tick(now, &mut grid).is_terminal() {
            break scheduler.finish(now);
        }

        thread::sleep(Duration::from_millis(config.frame_ms));
    };

    let verb = if report.cancelled {
        "cancelled"
    } else {
        "finished"
    };

    info!(
        "Conversion of image {} {verb} after {:.3} seconds",
        config.source_filename.display(),
        report.elapsed_seconds()
    );

    if let Some(path) = &config.output {
        grid.render(0, 0, scheduler.glyphs(), scheduler.palette())
            .save(path)
            .with_context(|| format!("could not write output {}", path.display()))?;
    }

    if let Some(path) = &config.tiles {
        let document = json!({
            "cancelled": report.cancelled,
            "elapsed_seconds": report.elapsed_seconds(),
            "canvas": grid.to_json(0, 0),
        });

        fs::write(path, serde_json::to_string_pretty(&document)?)
            .with_context(|| format!("could not write tiles {}", path.display()))?;
    }

    Ok(())
}
