use thiserror::Error;

/// Failures that prevent a conversion from starting.
///
/// All of these are raised before any tile is written to the canvas.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("source image is empty after scaling")]
    EmptySource,

    #[error("palette contains no colors")]
    EmptyPalette,

    #[error("palette has {0} colors, but at most 256 can be indexed")]
    PaletteTooLarge(usize),

    #[error("source uses palette index {index}, but the palette has {len} colors")]
    PaletteIndex { index: u8, len: usize },

    #[error("glyph atlas yields no usable glyphs")]
    NoGlyphs,

    #[error("invalid cell geometry: {0}")]
    Geometry(String),

    #[error("invalid options: {0}")]
    Options(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
