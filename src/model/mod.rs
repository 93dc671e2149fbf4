//! Domain data: FITS images, their headers and the pixel processing done on them.

pub mod error;
pub mod geometry;
pub mod header;
pub mod image;
pub mod render;
pub mod stats;
pub mod taps;

pub use error::{ModelError, Result};
pub use geometry::{fit_within, viewfinder_rect, widget_to_image, PixelRect};
pub use header::HeaderCard;
pub use image::{save_plane, FitsImage, ImageLayout, Plane, SampleKind};
pub use render::{apply_contrast, contrast_factor, render_image, render_plane, DisplayImage, Stretch};
pub use stats::Histogram;
pub use taps::{TapLayout, TapProducts};
