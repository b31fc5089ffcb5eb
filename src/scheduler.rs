//! Incremental conversion of a whole canvas.
//!
//! The scheduler is ticked from a host loop (for example once per rendered frame). Each tick
//! converts at most `blocks_per_tick` cells in row-major order, so the host never blocks for the
//! whole conversion and can cancel it between ticks. Cancelling leaves already written tiles in
//! place.

use std::time::{Duration, Instant};

use image::RgbaImage;
use log::{debug, info, trace, warn};

use crate::canvas::TileCanvas;
use crate::colors::Palette;
use crate::distance::{ColorDistanceTable, DistanceMode};
use crate::error::ConvertError;
use crate::glyphs::GlyphBitmapIndex;
use crate::matcher::{BlockMatcher, PairOrder, PairStrategy, ReservedGlyphs};
use crate::source::SourceImage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConverterOptions {
    pub distance_mode: DistanceMode,
    pub blocks_per_tick: usize,
    /// Time after `start` before the first cell is converted.
    pub start_delay: Duration,
    pub frame: usize,
    pub layer: usize,
    pub reserved: ReservedGlyphs,
    pub strategy: PairStrategy,
    pub order: PairOrder,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            distance_mode: DistanceMode::Lab,
            blocks_per_tick: 1,
            start_delay: Duration::from_secs(1),
            frame: 0,
            layer: 0,
            reserved: ReservedGlyphs::default(),
            strategy: PairStrategy::Present,
            order: PairOrder::Frequency,
        }
    }
}

impl ConverterOptions {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.blocks_per_tick == 0 {
            return Err(ConvertError::Options(
                "blocks_per_tick must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionState {
    Pending,
    Running,
    Finished,
    Cancelled,
}

impl ConversionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ConversionState::Finished | ConversionState::Cancelled)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConversionReport {
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl ConversionReport {
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

pub struct ProgressiveScheduler {
    source: SourceImage,
    palette: Palette,
    distances: ColorDistanceTable,
    glyphs: GlyphBitmapIndex,
    matcher: BlockMatcher,
    options: ConverterOptions,
    state: ConversionState,
    start_time: Option<Instant>,
    x: u32,
    y: u32,
    cells_written: usize,
    preview: Option<RgbaImage>,
    report: Option<ConversionReport>,
}

impl ProgressiveScheduler {
    pub fn new(
        source: SourceImage,
        palette: &Palette,
        glyphs: GlyphBitmapIndex,
        options: ConverterOptions,
    ) -> Result<Self, ConvertError> {
        options.validate()?;

        if palette.is_empty() {
            return Err(ConvertError::EmptyPalette);
        }

        if glyphs.is_empty() {
            return Err(ConvertError::NoGlyphs);
        }

        if source.width() % glyphs.cell_width() != 0 || source.height() % glyphs.cell_height() != 0 {
            return Err(ConvertError::Geometry(format!(
                "source size {}x{} is not a multiple of the {}x{} glyph cell",
                source.width(),
                source.height(),
                glyphs.cell_width(),
                glyphs.cell_height()
            )));
        }

        if usize::from(source.max_index()) >= palette.len() {
            return Err(ConvertError::PaletteIndex {
                index: source.max_index(),
                len: palette.len(),
            });
        }

        let glyph_count = glyphs.len();

        for glyph in [options.reserved.blank, options.reserved.solid] {
            if glyph as usize >= glyph_count {
                return Err(ConvertError::Options(format!(
                    "reserved glyph {glyph} is outside the {glyph_count} glyph atlas"
                )));
            }
        }

        if let PairStrategy::Fixed { fg, bg } = options.strategy {
            if usize::from(fg.max(bg)) >= palette.len() {
                return Err(ConvertError::Options(format!(
                    "fixed colors {fg}/{bg} are outside the {} color palette",
                    palette.len()
                )));
            }
        }

        let distances = ColorDistanceTable::build(palette.colors(), options.distance_mode);
        let matcher = BlockMatcher::new(options.reserved, options.strategy, options.order);
        let preview = Some(source.to_rgba(palette));

        debug!(
            "Prepared conversion of {}x{} source with {} colors and {glyph_count} glyphs",
            source.width(),
            source.height(),
            palette.len()
        );

        Ok(ProgressiveScheduler {
            source,
            palette: palette.clone(),
            distances,
            glyphs,
            matcher,
            options,
            state: ConversionState::Pending,
            start_time: None,
            x: 0,
            y: 0,
            cells_written: 0,
            preview,
            report: None,
        })
    }

    pub fn start(&mut self, now: Instant) {
        if self.state.is_terminal() {
            warn!("Ignoring start of a conversion that already ended");
            return;
        }

        self.start_time = Some(now);
        self.state = ConversionState::Pending;
    }

    /// Converts up to `blocks_per_tick` cells once the start delay has passed.
    pub fn tick<C: TileCanvas>(&mut self, now: Instant, canvas: &mut C) -> ConversionState {
        if self.state.is_terminal() {
            warn!("Ignoring tick of a conversion that already ended");
            return self.state;
        }

        let Some(start_time) = self.start_time else {
            warn!("Ignoring tick of a conversion that was never started");
            return self.state;
        };

        if now < start_time + self.options.start_delay {
            return self.state;
        }

        if self.state == ConversionState::Pending {
            info!(
                "Converting {}x{} cells",
                canvas.width(),
                canvas.height()
            );
            self.state = ConversionState::Running;
        }

        for _ in 0..self.options.blocks_per_tick {
            if self.x >= canvas.width() || self.y >= canvas.height() {
                self.finish(now);
                break;
            }

            let block = self.source.block(
                self.x,
                self.y,
                self.glyphs.cell_width(),
                self.glyphs.cell_height(),
            );
            let tile = self
                .matcher
                .match_block(&block, &self.distances, &self.glyphs);
            let tile = self.palette.substitute_sentinel(tile);

            trace!("Set cell {},{} to {:?}", self.x, self.y, tile);
            canvas.set_tile(self.options.frame, self.options.layer, self.x, self.y, tile);
            self.cells_written += 1;

            self.x += 1;

            if self.x >= canvas.width() {
                self.x = 0;
                self.y += 1;

                if self.y >= canvas.height() {
                    self.finish(now);
                    break;
                }
            }
        }

        self.state
    }

    /// Stops the conversion, keeping every tile written so far.
    ///
    /// Returns `None` if the conversion had already ended.
    pub fn cancel(&mut self, now: Instant) -> Option<ConversionReport> {
        if self.state.is_terminal() {
            warn!("Ignoring cancel of a conversion that already ended");
            return None;
        }

        let report = ConversionReport {
            cancelled: true,
            elapsed: self.elapsed(now),
        };

        self.state = ConversionState::Cancelled;
        self.preview = None;
        self.report = Some(report);

        info!(
            "Conversion cancelled after {:.3} seconds ({} cells written)",
            report.elapsed_seconds(),
            self.cells_written
        );

        Some(report)
    }

    pub fn finish(&mut self, now: Instant) -> ConversionReport {
        if let Some(report) = self.report {
            return report;
        }

        let report = ConversionReport {
            cancelled: false,
            elapsed: self.elapsed(now),
        };

        self.state = ConversionState::Finished;
        self.preview = None;
        self.report = Some(report);

        info!(
            "Conversion finished after {:.3} seconds",
            report.elapsed_seconds()
        );

        report
    }

    fn elapsed(&self, now: Instant) -> Duration {
        self.start_time
            .map_or(Duration::ZERO, |start_time| now.saturating_duration_since(start_time))
    }

    #[must_use]
    pub fn state(&self) -> ConversionState {
        self.state
    }

    #[must_use]
    pub fn report(&self) -> Option<ConversionReport> {
        self.report
    }

    /// The next cell to be converted.
    #[must_use]
    pub fn cursor(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    #[must_use]
    pub fn cells_written(&self) -> usize {
        self.cells_written
    }

    /// The palettized source, available until the conversion ends.
    #[must_use]
    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    #[must_use]
    pub fn glyphs(&self) -> &GlyphBitmapIndex {
        &self.glyphs
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}
