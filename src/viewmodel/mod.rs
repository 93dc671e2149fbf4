//! Presentation state between the FITS model and the egui view.
//!
//! The view never touches the model directly: it calls operations on
//! [`FitsViewModel`], reads back display buffers, and drains
//! [`ViewModelEvent`]s each frame to learn what changed.

pub mod directory;
pub mod fits_viewmodel;
pub mod loader;

pub use fits_viewmodel::{
    FitsViewModel, Frame, HistogramSource, Source, ViewModelError, ViewModelEvent, SLOT_COUNT,
};
pub use loader::RepaintHook;
