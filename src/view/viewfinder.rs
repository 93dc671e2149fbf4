use crate::model::DisplayImage;
use crate::viewmodel::Source;
use egui::TextureHandle;

/// Magnified crop of the region under the pointer.
pub struct ViewfinderWindow {
    pub open: bool,
    pub source: Source,
    crop: Option<DisplayImage>,
    texture: Option<TextureHandle>,
}

impl ViewfinderWindow {
    pub fn new() -> Self {
        ViewfinderWindow { open: false, source: Source::First, crop: None, texture: None }
    }

    pub fn set_crop(&mut self, source: Source, crop: DisplayImage) {
        if self.crop.as_ref() == Some(&crop) && self.source == source {
            return;
        }
        self.source = source;
        self.crop = Some(crop);
        self.texture = None;
    }

    pub fn clear(&mut self) {
        self.crop = None;
        self.texture = None;
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let mut open = self.open;
        let mut selected = self.source;
        egui::Window::new("Viewfinder")
            .open(&mut open)
            .fixed_size([300.0, 300.0])
            .show(ctx, |ui| {
                egui::ComboBox::from_id_source("viewfinder_source")
                    .selected_text(selected.label())
                    .show_ui(ui, |ui| {
                        for source in Source::ALL {
                            ui.selectable_value(&mut selected, source, source.label());
                        }
                    });

                if self.texture.is_none() {
                    if let Some(crop) = &self.crop {
                        let color = egui::ColorImage::from_rgba_unmultiplied(
                            [crop.width, crop.height],
                            &crop.to_rgba(),
                        );
                        self.texture = Some(ctx.load_texture("viewfinder", color, egui::TextureOptions::NEAREST));
                    }
                }
                match &self.texture {
                    Some(texture) => {
                        let size = texture.size_vec2();
                        let scale = (ui.available_width() / size.x).min(ui.available_height() / size.y);
                        ui.image((texture.id(), size * scale.max(0.0)));
                    }
                    None => {
                        ui.label(format!("Hover over {} to inspect it.", selected.label()));
                    }
                }
            });
        if selected != self.source {
            self.source = selected;
            self.clear();
        }
        self.open = open;
    }
}

impl Default for ViewfinderWindow {
    fn default() -> Self {
        Self::new()
    }
}
