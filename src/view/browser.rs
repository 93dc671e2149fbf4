use crate::viewmodel::directory::{self, DirListing};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseMode {
    File,
    Directory,
}

pub enum BrowserAction {
    OpenFile(PathBuf),
    OpenDirectory(PathBuf),
    Cancel,
}

/// Minimal in-app picker: a path field plus the sub-directories and FITS
/// files of the current directory.
pub struct Browser {
    mode: BrowseMode,
    current: PathBuf,
    path_text: String,
    listing: DirListing,
    error: Option<String>,
}

impl Browser {
    pub fn new(mode: BrowseMode, start: &Path) -> Self {
        let mut browser = Browser {
            mode,
            current: start.to_path_buf(),
            path_text: String::new(),
            listing: DirListing::default(),
            error: None,
        };
        browser.navigate(start.to_path_buf());
        browser
    }

    fn navigate(&mut self, dir: PathBuf) {
        match directory::list(&dir) {
            Ok(listing) => {
                self.listing = listing;
                self.error = None;
                self.path_text = dir.display().to_string();
                self.current = dir;
            }
            Err(e) => self.error = Some(format!("{}: {e}", dir.display())),
        }
    }

    pub fn show(&mut self, ctx: &egui::Context) -> Option<BrowserAction> {
        let title = match self.mode {
            BrowseMode::File => "Open FITS File",
            BrowseMode::Directory => "Open Directory",
        };
        let mut action = None;
        let mut go_to = None;

        egui::Window::new(title)
            .collapsible(false)
            .default_width(420.0)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("⬆").on_hover_text("Parent directory").clicked() {
                        go_to = self.current.parent().map(Path::to_path_buf);
                    }
                    let edit = ui.add(
                        egui::TextEdit::singleline(&mut self.path_text).desired_width(320.0),
                    );
                    let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("Go").clicked() || submitted {
                        let typed = PathBuf::from(self.path_text.trim());
                        if typed.is_file() && self.mode == BrowseMode::File {
                            action = Some(BrowserAction::OpenFile(typed));
                        } else {
                            go_to = Some(typed);
                        }
                    }
                });
                if let Some(err) = &self.error {
                    ui.label(egui::RichText::new(err).color(egui::Color32::RED));
                }
                ui.separator();

                egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                    for dir in &self.listing.dirs {
                        let name = dir.file_name().unwrap_or_default().to_string_lossy();
                        if ui.selectable_label(false, format!("📁 {name}")).clicked() {
                            go_to = Some(dir.clone());
                        }
                    }
                    for file in &self.listing.files {
                        let name = file.file_name().unwrap_or_default().to_string_lossy();
                        let enabled = self.mode == BrowseMode::File;
                        if ui.add_enabled(enabled, egui::SelectableLabel::new(false, name.to_string())).clicked() {
                            action = Some(BrowserAction::OpenFile(file.clone()));
                        }
                    }
                    if self.listing.dirs.is_empty() && self.listing.files.is_empty() {
                        ui.label("(empty)");
                    }
                });
                ui.separator();

                ui.horizontal(|ui| {
                    if self.mode == BrowseMode::Directory && ui.button("Open this directory").clicked() {
                        action = Some(BrowserAction::OpenDirectory(self.current.clone()));
                    }
                    if ui.button("Cancel").clicked() {
                        action = Some(BrowserAction::Cancel);
                    }
                    ui.label(format!("{} FITS files", self.listing.files.len()));
                });
            });

        if let Some(dir) = go_to {
            self.navigate(dir);
        }
        action
    }
}
