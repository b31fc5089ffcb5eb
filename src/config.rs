use std::path::PathBuf;

use clap::Parser;

use crate::distance::DistanceMode;

#[derive(Parser)]
#[command(version, author = "Jason Lynch <jason@calindora.com>", about)]
pub struct Config {
    /// Image to convert.
    pub source_filename: PathBuf,

    /// Charset atlas image; glyph cells are read left to right, top to bottom.
    #[arg(short, long)]
    pub charset: PathBuf,

    /// Palette image; its distinct colors are read left to right, top to bottom.
    #[arg(short, long, required_unless_present = "two_color")]
    pub palette: Option<PathBuf>,

    /// Width of one glyph cell in pixels.
    #[arg(long, default_value_t = 8)]
    pub cell_width: u32,

    /// Height of one glyph cell in pixels.
    #[arg(long, default_value_t = 8)]
    pub cell_height: u32,

    /// Glyph columns in the atlas (default: as many as fit).
    #[arg(long)]
    pub columns: Option<u32>,

    /// Glyph rows in the atlas (default: as many as fit).
    #[arg(long)]
    pub rows: Option<u32>,

    /// Index of the last valid glyph in the atlas.
    #[arg(long)]
    pub last_glyph: Option<u32>,

    /// Canvas width in cells.
    #[arg(long, default_value_t = 80)]
    pub width: u32,

    /// Canvas height in cells.
    #[arg(long, default_value_t = 25)]
    pub height: u32,

    /// Scale the source with a bicubic filter instead of nearest neighbour.
    #[arg(long)]
    pub bicubic: bool,

    /// Color difference metric used when scoring tiles.
    #[arg(long, value_enum, default_value_t = DistanceMode::Lab)]
    pub distance: DistanceMode,

    /// Use a black and white palette with a fixed color pair.
    #[arg(long)]
    pub two_color: bool,

    /// Glyph used for cells outside the source image.
    #[arg(long, default_value_t = 0)]
    pub blank_glyph: u32,

    /// Glyph used for cells of a single color.
    #[arg(long, default_value_t = 0)]
    pub solid_glyph: u32,

    /// Number of cells converted per tick.
    #[arg(long, default_value_t = 1)]
    pub blocks_per_tick: usize,

    /// Delay before the first cell is converted, in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub start_delay_ms: u64,

    /// Pause between ticks.
    #[arg(long, default_value_t = 0)]
    pub frame_ms: u64,

    /// Cancel the conversion after this many seconds.
    #[arg(long)]
    pub time_limit_secs: Option<f64>,

    /// Where to write the rendered tiles as an image.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Where to write the tiles and conversion report as JSON.
    #[arg(long)]
    pub tiles: Option<PathBuf>,

    /// Where to write the scaled, palettized source image.
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Log debug and trace output from the converter.
    #[arg(short, long)]
    pub verbose: bool,
}
