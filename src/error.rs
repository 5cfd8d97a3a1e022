use thiserror::Error;

#[derive(Error, Debug)]
pub enum Pix2SvgError {
    #[error("invalid raster shape: expected {expected} RGBA bytes for {width}x{height}, found {found}")]
    RasterShape {
        width: u32,
        height: u32,
        expected: usize,
        found: usize,
    },

    #[error("raster has zero {0} dimension")]
    EmptyRaster(&'static str),

    #[error("invalid option `{0}`: must be a positive integer")]
    InvalidOption(&'static str),

    #[error("image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Pix2SvgError>;
