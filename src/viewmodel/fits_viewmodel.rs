use super::directory::{self, FitsEntry};
use super::loader::{self, BackgroundLoader, LoadedFile, RepaintHook};
use crate::config::Config;
use crate::model::{
    self, apply_contrast, contrast_factor, render_image, render_plane, DisplayImage, FitsImage,
    ImageLayout, ModelError, SampleKind, Stretch, TapProducts,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

pub const SLOT_COUNT: usize = 2;

#[derive(Error, Debug)]
pub enum ViewModelError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("no subtraction result to export")]
    NothingToExport,

    #[error("{0} has no image")]
    Empty(&'static str),
}

/// Something the view has to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewModelEvent {
    ImageChanged { slot: usize },
    HeadersUpdated,
    ResultReady,
    ResultCleared,
    Cleared,
    LoadFailed(String),
    Status(String),
}

/// An image the view can show: one of the two slots or the subtraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    First,
    Second,
    Result,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::First, Source::Second, Source::Result];

    pub fn label(self) -> &'static str {
        match self {
            Source::First => "Image 1",
            Source::Second => "Image 2",
            Source::Result => "Result",
        }
    }

    pub fn slot(self) -> Option<usize> {
        match self {
            Source::First => Some(0),
            Source::Second => Some(1),
            Source::Result => None,
        }
    }
}

/// A loaded image together with its renders.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: FitsImage,
    pub header_text: String,
    /// Stretched, before contrast.
    base: DisplayImage,
    /// What is on screen.
    pub display: DisplayImage,
}

impl Frame {
    fn new(image: FitsImage, stretch: Stretch, contrast: u8) -> Self {
        let base = render_image(&image, stretch);
        let display = apply_contrast(&base, contrast_factor(contrast));
        Frame { header_text: image.header_text(), image, base, display }
    }

    pub fn name(&self) -> String {
        self.image.file_name()
    }
}

/// Labelled pixel samples for the histogram window.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSource {
    pub label: String,
    pub samples: Vec<f32>,
}

pub struct FitsViewModel {
    config: Config,
    slots: [Option<Frame>; SLOT_COUNT],
    match_mode: bool,
    subtraction: bool,
    products: Option<TapProducts>,
    result_display: Option<DisplayImage>,
    stretch: Stretch,
    contrast: u8,
    image_dir: Option<PathBuf>,
    /// Files last requested from the watched directory.
    last_selection: Vec<FitsEntry>,
    last_poll: Option<Instant>,
    status: Option<String>,
    events: Vec<ViewModelEvent>,
    /// `None` loads inline on the calling thread.
    loader: Option<BackgroundLoader>,
}

impl FitsViewModel {
    pub fn new(config: Config) -> Self {
        FitsViewModel {
            stretch: config.display.stretch,
            contrast: config.display.contrast.min(100),
            config,
            slots: [None, None],
            match_mode: false,
            subtraction: false,
            products: None,
            result_display: None,
            image_dir: None,
            last_selection: Vec::new(),
            last_poll: None,
            status: None,
            events: Vec::new(),
            loader: None,
        }
    }

    /// Load files on a worker thread; `repaint` fires when a batch is ready.
    pub fn with_background_loading(mut self, repaint: Option<RepaintHook>) -> Self {
        self.loader = Some(BackgroundLoader::new(repaint));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// Load `path` now and place it according to the current mode.
    pub fn display_fits_image(&mut self, path: &Path) -> Result<(), ViewModelError> {
        match FitsImage::load(path) {
            Ok(image) => {
                self.accept(image);
                Ok(())
            }
            Err(e) => {
                self.load_failed(path, &e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn open_file(&mut self, path: impl Into<PathBuf>) {
        self.request_load(vec![path.into()]);
    }

    /// Load `paths` in order, on the worker thread when background loading is on.
    pub fn request_load(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        match self.loader.as_mut() {
            Some(loader) => loader.spawn(paths),
            None => {
                let batch = loader::load_all(&paths);
                self.apply_batch(batch);
            }
        }
    }

    /// Apply a finished background batch. Returns true if one was applied.
    pub fn poll_loads(&mut self) -> bool {
        let Some(batch) = self.loader.as_mut().and_then(|l| l.try_recv()) else {
            return false;
        };
        self.apply_batch(batch);
        true
    }

    pub fn is_loading(&self) -> bool {
        self.loader.as_ref().is_some_and(|l| l.is_busy())
    }

    /// File names of the batch in flight, for the status bar.
    pub fn loading_label(&self) -> Option<String> {
        let loader = self.loader.as_ref().filter(|l| l.is_busy())?;
        let names: Vec<String> = loader
            .pending()
            .iter()
            .map(|p| p.file_name().unwrap_or_default().to_string_lossy().into_owned())
            .collect();
        Some(names.join(", "))
    }

    fn apply_batch(&mut self, batch: Vec<LoadedFile>) {
        for file in batch {
            match file.result {
                Ok(image) => self.accept(image),
                Err(message) => self.load_failed(&file.path, &message),
            }
        }
    }

    fn load_failed(&mut self, path: &Path, message: &str) {
        tracing::warn!(path = %path.display(), error = %message, "failed to load FITS file");
        let text = format!("Cannot open {}: {message}", path.display());
        self.status = Some(text.clone());
        // Retry on the next directory poll; the file may still be being written.
        self.last_selection.clear();
        self.events.push(ViewModelEvent::LoadFailed(text));
    }

    fn accept(&mut self, image: FitsImage) {
        tracing::info!(file = %image.file_name(), data_type = image.data_type(), "displaying image");
        if let ImageLayout::Multispectral(bands) = image.layout() {
            tracing::info!(bands, "multispectral image detected, displaying the first band");
        }
        let frame = Frame::new(image, self.stretch, self.contrast);
        self.status = None;

        let filled_second = if !self.match_mode {
            self.slots = [Some(frame), None];
            self.events.push(ViewModelEvent::ImageChanged { slot: 0 });
            self.events.push(ViewModelEvent::ImageChanged { slot: 1 });
            false
        } else if self.slots[0].is_none() {
            self.slots[0] = Some(frame);
            self.events.push(ViewModelEvent::ImageChanged { slot: 0 });
            false
        } else if self.slots[1].is_none() {
            self.slots[1] = Some(frame);
            self.events.push(ViewModelEvent::ImageChanged { slot: 1 });
            true
        } else {
            self.slots[0] = self.slots[1].take();
            self.slots[1] = Some(frame);
            self.events.push(ViewModelEvent::ImageChanged { slot: 0 });
            self.events.push(ViewModelEvent::ImageChanged { slot: 1 });
            true
        };
        self.events.push(ViewModelEvent::HeadersUpdated);

        if filled_second && self.subtraction {
            self.subtract_from_images();
        } else if filled_second || !self.match_mode {
            self.clear_result();
        }
    }

    /// Drop the tap products; they no longer belong to the images on screen.
    fn clear_result(&mut self) {
        let had_products = self.products.take().is_some();
        let had_display = self.result_display.take().is_some();
        if had_products || had_display {
            self.events.push(ViewModelEvent::ResultCleared);
        }
    }

    // ---------------------------------------------------------------------
    // Directory watching
    // ---------------------------------------------------------------------

    pub fn open_directory(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        tracing::info!(dir = %dir.display(), "watching directory");
        self.image_dir = Some(dir);
        self.last_selection.clear();
        self.last_poll = Some(Instant::now());
        self.update_images_in_directory();
    }

    pub fn image_dir(&self) -> Option<&Path> {
        self.image_dir.as_deref()
    }

    /// Show the most recent file, or the two most recent in match mode.
    pub fn update_images_in_directory(&mut self) {
        let Some(dir) = self.image_dir.clone() else {
            return;
        };
        let entries = match directory::scan(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot read directory");
                self.set_status(format!("Cannot read {}: {e}", dir.display()));
                return;
            }
        };

        let wanted = if self.match_mode { 2 } else { 1 };
        if entries.len() < wanted {
            if self.match_mode {
                tracing::warn!(found = entries.len(), "not enough images for match mode");
                self.set_status("Not enough images in the directory for match mode.".to_string());
            } else {
                tracing::debug!(dir = %dir.display(), "no FITS files yet");
            }
            return;
        }

        let selection = entries[entries.len() - wanted..].to_vec();
        if selection == self.last_selection {
            return;
        }
        self.last_selection = selection.clone();
        self.request_load(selection.into_iter().map(|e| e.path).collect());
    }

    /// Re-scan the watched directory once the poll interval has passed.
    /// Returns true if a scan ran.
    pub fn check_for_new_images(&mut self, now: Instant) -> bool {
        if self.image_dir.is_none() {
            return false;
        }
        let due = self
            .last_poll
            .map_or(true, |last| now.saturating_duration_since(last) >= self.config.watch.poll_interval());
        if due {
            self.last_poll = Some(now);
            self.update_images_in_directory();
        }
        due
    }

    // ---------------------------------------------------------------------
    // Modes
    // ---------------------------------------------------------------------

    pub fn match_mode(&self) -> bool {
        self.match_mode
    }

    pub fn set_match_mode(&mut self, on: bool) {
        self.match_mode = on;
        if !on {
            self.subtraction = false;
        }
        tracing::debug!(on, "match mode");
    }

    pub fn subtraction(&self) -> bool {
        self.subtraction
    }

    pub fn set_subtraction(&mut self, on: bool) {
        self.subtraction = on;
        if on {
            self.subtract_from_images();
        }
    }

    /// Subtract the signal of image 1 from the reset of image 2.
    /// Returns true when a new result was produced.
    pub fn subtract_from_images(&mut self) -> bool {
        let (Some(first), Some(second)) = (&self.slots[0], &self.slots[1]) else {
            return false;
        };
        let products = first
            .image
            .plane(0)
            .and_then(|a| second.image.plane(0).map(|b| (a, b)))
            .and_then(|(a, b)| TapProducts::compute(&a, &b, self.config.taps.layout()));
        match products {
            Ok(products) => {
                self.result_display = Some(render_plane(&products.result, Stretch::Linear));
                self.products = Some(products);
                self.events.push(ViewModelEvent::ResultReady);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "tap subtraction failed");
                self.clear_result();
                self.set_status(format!("Subtraction failed: {e}"));
                false
            }
        }
    }

    pub fn products(&self) -> Option<&TapProducts> {
        self.products.as_ref()
    }

    // ---------------------------------------------------------------------
    // Display settings
    // ---------------------------------------------------------------------

    pub fn contrast(&self) -> u8 {
        self.contrast
    }

    pub fn set_contrast(&mut self, value: u8) {
        let value = value.min(100);
        if value == self.contrast {
            return;
        }
        self.contrast = value;
        let factor = contrast_factor(value);
        for (slot, frame) in self.slots.iter_mut().enumerate() {
            if let Some(frame) = frame {
                frame.display = apply_contrast(&frame.base, factor);
                self.events.push(ViewModelEvent::ImageChanged { slot });
            }
        }
    }

    pub fn stretch(&self) -> Stretch {
        self.stretch
    }

    pub fn set_stretch(&mut self, stretch: Stretch) {
        if stretch == self.stretch {
            return;
        }
        self.stretch = stretch;
        for (slot, frame) in self.slots.iter_mut().enumerate() {
            if let Some(frame) = frame {
                *frame = Frame::new(frame.image.clone(), stretch, self.contrast);
                self.events.push(ViewModelEvent::ImageChanged { slot });
            }
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn frame(&self, slot: usize) -> Option<&Frame> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn display(&self, source: Source) -> Option<&DisplayImage> {
        match source.slot() {
            Some(slot) => self.frame(slot).map(|f| &f.display),
            None => self.result_display.as_ref(),
        }
    }

    pub fn header_text(&self, slot: usize) -> String {
        match self.frame(slot) {
            Some(frame) if !frame.header_text.is_empty() => frame.header_text.clone(),
            _ => format!("No header information available for Image {}.", slot + 1),
        }
    }

    /// Sample sets for the histogram: each loaded image, then the result.
    pub fn histogram_sources(&self) -> Vec<HistogramSource> {
        let mut sources: Vec<HistogramSource> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                f.as_ref().map(|f| HistogramSource {
                    label: format!("Image {}: {}", i + 1, f.name()),
                    samples: f.display.samples(),
                })
            })
            .collect();
        if let Some(products) = &self.products {
            sources.push(HistogramSource {
                label: "Result".to_string(),
                samples: products.result.data.clone(),
            });
        }
        sources
    }

    /// Region of `source` around the pointer, for the viewfinder.
    ///
    /// `pointer` is relative to the top-left of a widget of `widget_size`
    /// showing the whole image.
    pub fn viewfinder(
        &self,
        source: Source,
        pointer: (f32, f32),
        widget_size: (f32, f32),
    ) -> Option<DisplayImage> {
        let img = self.display(source)?;
        let center = model::widget_to_image(pointer, widget_size, (img.width, img.height))?;
        let rect = model::viewfinder_rect(center, self.config.viewfinder.size, img.width, img.height)?;
        Some(img.crop(rect))
    }

    /// On-screen size of `source` scaled to fit within `max`.
    pub fn scale_to_fit(&self, source: Source, max: (f32, f32)) -> Option<(f32, f32)> {
        let img = self.display(source)?;
        Some(model::fit_within((img.width as f32, img.height as f32), max))
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn set_status(&mut self, message: String) {
        self.status = Some(message.clone());
        self.events.push(ViewModelEvent::Status(message));
    }

    pub fn take_events(&mut self) -> Vec<ViewModelEvent> {
        std::mem::take(&mut self.events)
    }

    // ---------------------------------------------------------------------
    // Export
    // ---------------------------------------------------------------------

    /// Write the signal, reset and result planes into `dir`.
    pub fn export_tap_products(&mut self, dir: &Path) -> Result<Vec<PathBuf>, ViewModelError> {
        let products = self.products.as_ref().ok_or(ViewModelError::NothingToExport)?;
        std::fs::create_dir_all(dir).map_err(ModelError::from)?;
        let outputs = [
            ("signal.fits", &products.signal, SampleKind::Float),
            ("reset.fits", &products.reset, SampleKind::Float),
            ("result.fits", &products.result, SampleKind::Short),
        ];
        let mut written = Vec::with_capacity(outputs.len());
        for (name, plane, kind) in outputs {
            let path = dir.join(name);
            model::save_plane(&path, plane, kind)?;
            written.push(path);
        }
        self.set_status(format!("Exported tap products to {}", dir.display()));
        Ok(written)
    }

    pub fn save_display_png(&mut self, source: Source, path: &Path) -> Result<(), ViewModelError> {
        let img = self.display(source).ok_or(ViewModelError::Empty(source.label()))?;
        img.save_png(path)?;
        tracing::info!(path = %path.display(), source = source.label(), "saved PNG");
        self.set_status(format!("Saved {} to {}", source.label(), path.display()));
        Ok(())
    }

    /// Drop every loaded image and result. Modes and display settings stay.
    pub fn reset(&mut self) {
        self.slots = [None, None];
        self.products = None;
        self.result_display = None;
        self.last_selection.clear();
        self.status = None;
        self.events.push(ViewModelEvent::Cleared);
        tracing::info!("UI has been reset.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Plane;

    fn image(name: &str, width: usize, height: usize, value: impl Fn(usize) -> f32) -> FitsImage {
        FitsImage {
            path: PathBuf::from(name),
            width,
            height,
            planes: 1,
            data: (0..width * height).map(value).collect(),
            headers: vec![model::HeaderCard { key: "OBJECT".into(), value: name.into() }],
            bitpix: 16,
        }
    }

    fn names(vm: &FitsViewModel) -> [Option<String>; 2] {
        [vm.frame(0).map(Frame::name), vm.frame(1).map(Frame::name)]
    }

    #[test]
    fn single_mode_replaces_first_slot() {
        let mut vm = FitsViewModel::new(Config::default());
        vm.accept(image("a.fits", 2, 2, |i| i as f32));
        vm.accept(image("b.fits", 2, 2, |i| i as f32));
        assert_eq!(names(&vm), [Some("b.fits".into()), None]);
        assert_eq!(vm.header_text(0), "OBJECT: b.fits");
        assert_eq!(vm.header_text(1), "No header information available for Image 2.");
    }

    #[test]
    fn match_mode_rolls_slots() {
        let mut vm = FitsViewModel::new(Config::default());
        vm.set_match_mode(true);
        vm.accept(image("a.fits", 2, 2, |i| i as f32));
        assert_eq!(names(&vm), [Some("a.fits".into()), None]);
        vm.accept(image("b.fits", 2, 2, |i| i as f32));
        assert_eq!(names(&vm), [Some("a.fits".into()), Some("b.fits".into())]);
        vm.accept(image("c.fits", 2, 2, |i| i as f32));
        assert_eq!(names(&vm), [Some("b.fits".into()), Some("c.fits".into())]);
    }

    #[test]
    fn leaving_match_mode_disables_subtraction() {
        let mut vm = FitsViewModel::new(Config::default());
        vm.set_match_mode(true);
        vm.set_subtraction(true);
        assert!(vm.subtraction());
        vm.set_match_mode(false);
        assert!(!vm.subtraction());
    }

    #[test]
    fn subtraction_runs_when_second_slot_fills() {
        let mut config = Config::default();
        config.taps.tap_width = 4;
        config.taps.num_taps = 2;
        let mut vm = FitsViewModel::new(config);
        vm.set_match_mode(true);
        vm.set_subtraction(true);
        vm.accept(image("a.fits", 12, 1, |_| 10.0));
        assert!(vm.products().is_none());
        vm.accept(image("b.fits", 12, 1, |x| x as f32));
        let result = &vm.products().unwrap().result;
        // reset columns of b are 2,3,6,7; signal of a is 10 everywhere
        assert_eq!(result, &Plane::new(4, 1, vec![-8.0, -7.0, -4.0, -3.0]).unwrap());
        assert!(vm.take_events().contains(&ViewModelEvent::ResultReady));
        assert!(vm.display(Source::Result).is_some());
    }

    #[test]
    fn subtraction_layout_error_sets_status() {
        let mut vm = FitsViewModel::new(Config::default());
        vm.set_match_mode(true);
        vm.accept(image("a.fits", 8, 1, |_| 0.0));
        vm.accept(image("b.fits", 8, 1, |_| 0.0));
        assert!(!vm.subtract_from_images());
        assert!(vm.status().unwrap().contains("does not match"));
    }

    #[test]
    fn contrast_rerenders_loaded_slots() {
        let mut vm = FitsViewModel::new(Config::default());
        vm.accept(image("a.fits", 2, 1, |i| i as f32));
        assert_eq!(vm.display(Source::First).unwrap().pixels, vec![0, 255]);
        vm.take_events();
        vm.set_contrast(25);
        assert_eq!(vm.display(Source::First).unwrap().pixels, vec![0, 127]);
        assert_eq!(vm.take_events(), vec![ViewModelEvent::ImageChanged { slot: 0 }]);
        vm.set_contrast(200);
        assert_eq!(vm.contrast(), 100);
    }

    #[test]
    fn histogram_sources_follow_slots_then_result() {
        let mut vm = FitsViewModel::new(Config::default());
        assert!(vm.histogram_sources().is_empty());
        vm.accept(image("a.fits", 2, 1, |i| i as f32));
        let sources = vm.histogram_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].label, "Image 1: a.fits");
        assert_eq!(sources[0].samples, vec![0.0, 255.0]);
    }

    #[test]
    fn viewfinder_crops_around_pointer() {
        let mut config = Config::default();
        config.viewfinder.size = 2;
        let mut vm = FitsViewModel::new(config);
        vm.accept(image("a.fits", 4, 4, |i| i as f32));
        let crop = vm.viewfinder(Source::First, (20.0, 20.0), (40.0, 40.0)).unwrap();
        assert_eq!((crop.width, crop.height), (2, 2));
        assert!(vm.viewfinder(Source::Result, (0.0, 0.0), (40.0, 40.0)).is_none());
        assert_eq!(vm.scale_to_fit(Source::First, (100.0, 50.0)), Some((50.0, 50.0)));
    }

    #[test]
    fn reset_keeps_modes() {
        let mut vm = FitsViewModel::new(Config::default());
        vm.set_match_mode(true);
        vm.accept(image("a.fits", 2, 2, |i| i as f32));
        vm.reset();
        assert!(vm.frame(0).is_none());
        assert!(vm.match_mode());
        assert_eq!(vm.take_events().last(), Some(&ViewModelEvent::Cleared));
    }

    #[test]
    fn export_without_result_fails() {
        let mut vm = FitsViewModel::new(Config::default());
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            vm.export_tap_products(dir.path()),
            Err(ViewModelError::NothingToExport)
        ));
        assert!(matches!(
            vm.save_display_png(Source::First, &dir.path().join("x.png")),
            Err(ViewModelError::Empty("Image 1"))
        ));
    }

    fn small_taps() -> Config {
        let mut config = Config::default();
        config.taps.tap_width = 4;
        config.taps.num_taps = 2;
        config
    }

    #[test]
    fn stretch_rerenders_every_filled_slot() {
        let mut vm = FitsViewModel::new(Config::default());
        vm.set_match_mode(true);
        let a = image("a.fits", 4, 1, |i| (i * i) as f32);
        vm.accept(a.clone());
        vm.accept(image("b.fits", 4, 1, |i| i as f32));
        vm.take_events();

        vm.set_stretch(Stretch::Auto);
        assert_eq!(vm.stretch(), Stretch::Auto);
        assert_eq!(
            vm.take_events(),
            vec![ViewModelEvent::ImageChanged { slot: 0 }, ViewModelEvent::ImageChanged { slot: 1 }]
        );
        let expected = apply_contrast(&render_image(&a, Stretch::Auto), contrast_factor(50));
        assert_eq!(vm.display(Source::First), Some(&expected));

        vm.set_stretch(Stretch::Auto);
        assert!(vm.take_events().is_empty());
    }

    #[test]
    fn enabling_subtraction_with_both_slots_filled_subtracts_now() {
        let mut vm = FitsViewModel::new(small_taps());
        vm.set_match_mode(true);
        vm.accept(image("a.fits", 12, 1, |_| 10.0));
        vm.accept(image("b.fits", 12, 1, |x| x as f32));
        assert!(vm.products().is_none());
        vm.take_events();

        vm.set_subtraction(true);
        assert_eq!(vm.products().unwrap().result.data, vec![-8.0, -7.0, -4.0, -3.0]);
        assert_eq!(vm.take_events(), vec![ViewModelEvent::ResultReady]);
    }

    #[test]
    fn histogram_lists_result_after_slots() {
        let mut vm = FitsViewModel::new(small_taps());
        vm.set_match_mode(true);
        vm.set_subtraction(true);
        vm.accept(image("a.fits", 12, 1, |_| 10.0));
        vm.accept(image("b.fits", 12, 1, |x| x as f32));

        let sources = vm.histogram_sources();
        let labels: Vec<&str> = sources.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Image 1: a.fits", "Image 2: b.fits", "Result"]);
        assert_eq!(sources[2].samples, vm.products().unwrap().result.data);
    }

    #[test]
    fn reset_keeps_display_settings() {
        let mut vm = FitsViewModel::new(small_taps());
        vm.set_match_mode(true);
        vm.set_subtraction(true);
        vm.set_stretch(Stretch::Auto);
        vm.set_contrast(70);
        vm.accept(image("a.fits", 12, 1, |_| 10.0));
        vm.accept(image("b.fits", 12, 1, |x| x as f32));
        assert!(vm.products().is_some());

        vm.reset();
        assert_eq!(vm.stretch(), Stretch::Auto);
        assert_eq!(vm.contrast(), 70);
        assert!(vm.subtraction());
        assert!(vm.products().is_none());
        assert!(vm.display(Source::Result).is_none());
    }

    #[test]
    fn failed_subtraction_drops_previous_result() {
        let mut vm = FitsViewModel::new(small_taps());
        vm.set_match_mode(true);
        vm.set_subtraction(true);
        vm.accept(image("a.fits", 12, 1, |_| 10.0));
        vm.accept(image("b.fits", 12, 1, |x| x as f32));
        assert!(vm.products().is_some());
        vm.take_events();

        vm.accept(image("c.fits", 10, 1, |_| 0.0));
        assert!(vm.products().is_none());
        assert!(vm.display(Source::Result).is_none());
        assert!(vm.take_events().contains(&ViewModelEvent::ResultCleared));
        assert!(vm.status().unwrap().contains("does not match"));
        assert!(matches!(
            vm.export_tap_products(Path::new("unused")),
            Err(ViewModelError::NothingToExport)
        ));
    }

    #[test]
    fn single_image_load_drops_result() {
        let mut vm = FitsViewModel::new(small_taps());
        vm.set_match_mode(true);
        vm.set_subtraction(true);
        vm.accept(image("a.fits", 12, 1, |_| 10.0));
        vm.accept(image("b.fits", 12, 1, |x| x as f32));
        vm.set_match_mode(false);
        vm.take_events();

        vm.accept(image("c.fits", 12, 1, |_| 0.0));
        assert_eq!(names(&vm), [Some("c.fits".into()), None]);
        assert!(vm.products().is_none());
        assert!(vm.take_events().contains(&ViewModelEvent::ResultCleared));
    }

    #[test]
    fn new_pair_without_subtraction_drops_result() {
        let mut vm = FitsViewModel::new(small_taps());
        vm.set_match_mode(true);
        vm.accept(image("a.fits", 12, 1, |_| 10.0));
        vm.accept(image("b.fits", 12, 1, |x| x as f32));
        vm.set_subtraction(true);
        vm.set_subtraction(false);
        assert!(vm.products().is_some());

        vm.accept(image("c.fits", 12, 1, |_| 0.0));
        assert!(vm.products().is_none());
    }
}
