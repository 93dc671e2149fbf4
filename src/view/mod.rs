//! egui widgets. Holds textures and window state only; everything else is
//! asked of the view model.

mod app;
mod browser;
mod histogram;
mod viewfinder;

pub use app::FitsViewerApp;
