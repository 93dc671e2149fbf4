use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("FITS error: {0}")]
    Fits(#[from] fitsio::errors::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),

    #[error("no image data found in {}", .0.display())]
    NoImageData(PathBuf),

    #[error("unsupported FITS image: {0}")]
    UnsupportedShape(String),

    #[error("malformed FITS header: {0}")]
    Header(String),

    #[error("plane {index} out of range ({planes} planes)")]
    PlaneOutOfRange { index: usize, planes: usize },

    #[error(
        "frame width {actual} does not match {tap_width} pixels per tap with {num_taps} taps (expected {expected})"
    )]
    TapLayout {
        actual: usize,
        expected: usize,
        tap_width: usize,
        num_taps: usize,
    },

    #[error("image size mismatch: {0}")]
    SizeMismatch(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
