//! FITS image viewer.
//!
//! Layered as model (FITS I/O and pixel processing), viewmodel (presentation
//! state and operations) and view (egui widgets). Everything except the event
//! loop lives in the library so it can be driven from tests.

pub mod config;
pub mod logging;
pub mod model;
pub mod view;
pub mod viewmodel;
