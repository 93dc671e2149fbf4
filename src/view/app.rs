use super::browser::{BrowseMode, Browser, BrowserAction};
use super::histogram::HistogramWindow;
use super::viewfinder::ViewfinderWindow;
use crate::config::Config;
use crate::model::Stretch;
use crate::viewmodel::{FitsViewModel, RepaintHook, Source, ViewModelEvent, SLOT_COUNT};
use egui::TextureHandle;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Images,
    Header,
}

/// Everything a widget can ask for; applied after the frame's UI is built.
enum Action {
    Browse(BrowseMode),
    OpenFile(PathBuf),
    OpenDirectory(PathBuf),
    ShowExport,
    Reset,
    SetMatchMode(bool),
    SetSubtraction(bool),
    SetStretch(Stretch),
    SetContrast(u8),
    ShowTab(Tab),
    ShowHistogram,
    ShowViewfinder,
    Hover { source: Source, pointer: (f32, f32), size: (f32, f32) },
}

pub struct FitsViewerApp {
    vm: FitsViewModel,
    /// Cached textures, dropped when the view model reports a change.
    textures: HashMap<Source, TextureHandle>,
    tab: Tab,
    browser: Option<Browser>,
    histogram: HistogramWindow,
    viewfinder: ViewfinderWindow,
    show_export: bool,
    export_dir: String,
    export_message: Option<Result<String, String>>,
}

impl FitsViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        start_path: Option<PathBuf>,
        match_mode: bool,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        let repaint: RepaintHook = Arc::new(move || ctx.request_repaint());
        let export_dir = config
            .export
            .directory
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        let bins = config.display.histogram_bins;

        let mut vm = FitsViewModel::new(config).with_background_loading(Some(repaint));
        vm.set_match_mode(match_mode);
        match start_path {
            Some(path) if path.is_dir() => vm.open_directory(path),
            Some(path) => vm.open_file(path),
            None => {}
        }

        FitsViewerApp {
            vm,
            textures: HashMap::new(),
            tab: Tab::Images,
            browser: None,
            histogram: HistogramWindow::new(bins),
            viewfinder: ViewfinderWindow::new(),
            show_export: false,
            export_dir,
            export_message: None,
        }
    }

    fn texture(&mut self, ctx: &egui::Context, source: Source) -> Option<TextureHandle> {
        if let Some(texture) = self.textures.get(&source) {
            return Some(texture.clone());
        }
        let img = self.vm.display(source)?;
        let color = egui::ColorImage::from_rgba_unmultiplied([img.width, img.height], &img.to_rgba());
        let texture = ctx.load_texture(source.label(), color, egui::TextureOptions::LINEAR);
        self.textures.insert(source, texture.clone());
        Some(texture)
    }

    /// Returns true when the view model reported anything.
    fn handle_events(&mut self) -> bool {
        let events = self.vm.take_events();
        let any = !events.is_empty();
        let mut images_changed = false;
        for event in events {
            match event {
                ViewModelEvent::ImageChanged { slot } => {
                    let source = if slot == 0 { Source::First } else { Source::Second };
                    self.textures.remove(&source);
                    if self.viewfinder.source == source {
                        self.viewfinder.clear();
                    }
                    images_changed = true;
                }
                ViewModelEvent::ResultReady | ViewModelEvent::ResultCleared => {
                    self.textures.remove(&Source::Result);
                    images_changed = true;
                }
                ViewModelEvent::Cleared => {
                    self.textures.clear();
                    self.viewfinder.clear();
                    images_changed = true;
                }
                ViewModelEvent::HeadersUpdated
                | ViewModelEvent::LoadFailed(_)
                | ViewModelEvent::Status(_) => {}
            }
        }
        if images_changed && self.histogram.open {
            self.histogram.set_sources(self.vm.histogram_sources());
        }
        any
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Browse(mode) => {
                let start = self
                    .vm
                    .image_dir()
                    .map(PathBuf::from)
                    .or_else(|| std::env::current_dir().ok())
                    .unwrap_or_else(|| PathBuf::from("."));
                self.browser = Some(Browser::new(mode, &start));
            }
            Action::OpenFile(path) => {
                self.browser = None;
                self.vm.open_file(path);
            }
            Action::OpenDirectory(dir) => {
                self.browser = None;
                self.vm.open_directory(dir);
            }
            Action::ShowExport => {
                self.show_export = true;
                self.export_message = None;
            }
            Action::Reset => self.vm.reset(),
            Action::SetMatchMode(on) => {
                self.vm.set_match_mode(on);
                self.vm.update_images_in_directory();
            }
            Action::SetSubtraction(on) => self.vm.set_subtraction(on),
            Action::SetStretch(stretch) => self.vm.set_stretch(stretch),
            Action::SetContrast(value) => self.vm.set_contrast(value),
            Action::ShowTab(tab) => self.tab = tab,
            Action::ShowHistogram => {
                self.histogram.set_sources(self.vm.histogram_sources());
                self.histogram.open = true;
            }
            Action::ShowViewfinder => self.viewfinder.open = true,
            Action::Hover { source, pointer, size } => {
                if let Some(crop) = self.vm.viewfinder(source, pointer, size) {
                    self.viewfinder.set_crop(source, crop);
                }
            }
        }
    }

    fn menu_bar(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open FITS Image…").clicked() {
                    actions.push(Action::Browse(BrowseMode::File));
                    ui.close_menu();
                }
                if ui.button("Open Directory of FITS Images…").clicked() {
                    actions.push(Action::Browse(BrowseMode::Directory));
                    ui.close_menu();
                }
                if ui.button("Export…").clicked() {
                    actions.push(Action::ShowExport);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Reset").clicked() {
                    actions.push(Action::Reset);
                    ui.close_menu();
                }
            });

            ui.menu_button("Tools", |ui| {
                let mut match_mode = self.vm.match_mode();
                if ui.checkbox(&mut match_mode, "Match Mode").changed() {
                    actions.push(Action::SetMatchMode(match_mode));
                }
                let mut subtraction = self.vm.subtraction();
                if ui
                    .add_enabled(match_mode, egui::Checkbox::new(&mut subtraction, "Subtract Signal"))
                    .changed()
                {
                    actions.push(Action::SetSubtraction(subtraction));
                }
                ui.separator();
                if ui.button("Show Header").clicked() {
                    actions.push(Action::ShowTab(Tab::Header));
                    ui.close_menu();
                }
                if ui.button("Histogram").clicked() {
                    actions.push(Action::ShowHistogram);
                    ui.close_menu();
                }
                if ui.button("Viewfinder").clicked() {
                    actions.push(Action::ShowViewfinder);
                    ui.close_menu();
                }
            });

            ui.menu_button("View", |ui| {
                ui.label("Stretch");
                let mut stretch = self.vm.stretch();
                for option in [Stretch::Linear, Stretch::Auto] {
                    if ui.radio_value(&mut stretch, option, option.label()).clicked() {
                        actions.push(Action::SetStretch(option));
                        ui.close_menu();
                    }
                }
            });

            if ui.button("Reset").on_hover_text("Clear all images").clicked() {
                actions.push(Action::Reset);
            }
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(names) = self.vm.loading_label() {
                ui.spinner();
                ui.label(format!("Loading {names}…"));
                ui.separator();
            }
            if let Some(dir) = self.vm.image_dir() {
                ui.label(format!("Watching {}", dir.display()));
                ui.separator();
            }
            ui.label(format!("Stretch: {}", self.vm.stretch().label()));
            if self.vm.match_mode() {
                ui.separator();
                ui.label("Match mode");
            }
            if let Some(status) = self.vm.status() {
                ui.separator();
                ui.label(egui::RichText::new(status).color(egui::Color32::LIGHT_RED));
            }
        });
    }

    fn image_tab(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let ctx = ui.ctx().clone();
        let match_mode = self.vm.match_mode();
        let show_result = match_mode && self.vm.subtraction();

        let slider_height = 32.0;
        let available = ui.available_size() - egui::vec2(0.0, slider_height);
        let column_width = if show_result { available.x / 2.0 - 8.0 } else { available.x };
        let rows = if match_mode { SLOT_COUNT } else { 1 };
        let image_max = (column_width, available.y / rows as f32 - 28.0);

        let mut slots: Vec<(Source, Option<TextureHandle>)> = vec![(Source::First, self.texture(&ctx, Source::First))];
        if match_mode {
            slots.push((Source::Second, self.texture(&ctx, Source::Second)));
        }
        let result = show_result.then(|| self.texture(&ctx, Source::Result));

        ui.horizontal_top(|ui| {
            ui.vertical(|ui| {
                ui.set_width(column_width);
                for (source, texture) in &slots {
                    let name = source
                        .slot()
                        .and_then(|s| self.vm.frame(s))
                        .map(|f| f.name())
                        .unwrap_or_else(|| source.label().to_string());
                    ui.label(egui::RichText::new(name).strong());
                    self.image_panel(ui, *source, texture.as_ref(), image_max, actions);
                }
            });
            if let Some(result) = &result {
                ui.separator();
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new("Result Image").strong());
                    let max = (column_width, available.y - 28.0);
                    self.image_panel(ui, Source::Result, result.as_ref(), max, actions);
                });
            }
        });

        ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
            let mut contrast = self.vm.contrast();
            let slider = egui::Slider::new(&mut contrast, 0..=100)
                .text("Contrast")
                .step_by(1.0);
            if ui.add(slider).on_hover_text("Adjust contrast").changed() {
                actions.push(Action::SetContrast(contrast));
            }
        });
    }

    fn image_panel(
        &self,
        ui: &mut egui::Ui,
        source: Source,
        texture: Option<&TextureHandle>,
        max: (f32, f32),
        actions: &mut Vec<Action>,
    ) {
        let Some(texture) = texture else {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(max.0, max.1.max(40.0)), egui::Sense::hover());
            ui.painter().rect_stroke(rect, 4.0, ui.visuals().widgets.noninteractive.bg_stroke);
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No image",
                egui::FontId::proportional(14.0),
                ui.visuals().weak_text_color(),
            );
            return;
        };
        let (w, h) = self
            .vm
            .scale_to_fit(source, (max.0.max(1.0), max.1.max(1.0)))
            .unwrap_or((max.0, max.1));
        let response = ui.add(
            egui::Image::new((texture.id(), egui::vec2(w, h))).sense(egui::Sense::hover()),
        );
        if self.viewfinder.open && self.viewfinder.source == source {
            if let Some(pos) = response.hover_pos() {
                let rel = pos - response.rect.min;
                actions.push(Action::Hover {
                    source,
                    pointer: (rel.x, rel.y),
                    size: (response.rect.width(), response.rect.height()),
                });
            }
        }
    }

    fn header_tab(&self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            let slots = if self.vm.match_mode() { SLOT_COUNT } else { 1 };
            for slot in 0..slots {
                ui.label(egui::RichText::new(format!("Header {}:", slot + 1)).strong());
                let text = self.vm.header_text(slot);
                ui.add(
                    egui::TextEdit::multiline(&mut text.as_str())
                        .code_editor()
                        .desired_width(f32::INFINITY)
                        .desired_rows(16),
                );
                ui.add_space(8.0);
            }
        });
    }

    fn export_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_export;
        egui::Window::new("Export")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Directory:");
                    ui.text_edit_singleline(&mut self.export_dir);
                });
                let dir = PathBuf::from(self.export_dir.trim());
                ui.separator();

                let has_result = self.vm.products().is_some();
                if ui
                    .add_enabled(has_result, egui::Button::new("Export signal / reset / result (FITS)"))
                    .clicked()
                {
                    self.export_message = Some(
                        self.vm
                            .export_tap_products(&dir)
                            .map(|paths| format!("Wrote {} files", paths.len()))
                            .map_err(|e| e.to_string()),
                    );
                }
                ui.horizontal(|ui| {
                    for (source, file) in [
                        (Source::First, "image1.png"),
                        (Source::Second, "image2.png"),
                        (Source::Result, "result.png"),
                    ] {
                        let enabled = self.vm.display(source).is_some();
                        if ui
                            .add_enabled(enabled, egui::Button::new(format!("Save {} (PNG)", source.label())))
                            .clicked()
                        {
                            self.export_message = Some(
                                self.vm
                                    .save_display_png(source, &dir.join(file))
                                    .map(|()| format!("Saved {file}"))
                                    .map_err(|e| e.to_string()),
                            );
                        }
                    }
                });

                match &self.export_message {
                    Some(Ok(msg)) => {
                        ui.label(msg);
                    }
                    Some(Err(err)) => {
                        ui.label(egui::RichText::new(err).color(egui::Color32::RED));
                    }
                    None => {}
                }
            });
        self.show_export = open;
    }

    fn shortcuts(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        if ctx.wants_keyboard_input() {
            return;
        }
        ctx.input(|i| {
            use egui::Key;
            if i.key_pressed(Key::O) {
                actions.push(Action::Browse(BrowseMode::File));
            }
            if i.key_pressed(Key::D) {
                actions.push(Action::Browse(BrowseMode::Directory));
            }
            if i.key_pressed(Key::M) {
                actions.push(Action::SetMatchMode(!self.vm.match_mode()));
            }
            if i.key_pressed(Key::H) {
                actions.push(Action::ShowHistogram);
            }
            if i.key_pressed(Key::V) {
                actions.push(Action::ShowViewfinder);
            }
        });
    }
}

impl eframe::App for FitsViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.vm.poll_loads();
        self.vm.check_for_new_images(Instant::now());
        if self.vm.image_dir().is_some() {
            ctx.request_repaint_after(self.vm.config().watch.poll_interval());
        }
        self.handle_events();

        let mut actions = Vec::new();
        self.shortcuts(ctx, &mut actions);
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.browser = None;
            self.histogram.open = false;
            self.viewfinder.open = false;
            self.show_export = false;
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ui, &mut actions);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Images, "Images");
                ui.selectable_value(&mut self.tab, Tab::Header, "Header");
            });
            ui.separator();
            match self.tab {
                Tab::Images => self.image_tab(ui, &mut actions),
                Tab::Header => self.header_tab(ui),
            }
        });

        if let Some(browser) = &mut self.browser {
            match browser.show(ctx) {
                Some(BrowserAction::OpenFile(path)) => actions.push(Action::OpenFile(path)),
                Some(BrowserAction::OpenDirectory(dir)) => actions.push(Action::OpenDirectory(dir)),
                Some(BrowserAction::Cancel) => self.browser = None,
                None => {}
            }
        }
        if self.histogram.open {
            self.histogram.show(ctx);
        }
        if self.viewfinder.open {
            self.viewfinder.show(ctx);
        }
        if self.show_export {
            self.export_window(ctx);
        }

        for action in actions {
            self.apply(action);
        }
        // Changes made by this frame's actions show on the next frame.
        if self.handle_events() {
            ctx.request_repaint();
        }
    }
}
