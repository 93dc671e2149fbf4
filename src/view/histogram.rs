use crate::model::stats::{Histogram, MAX_BINS};
use crate::viewmodel::HistogramSource;
use egui::{Color32, FontId, Pos2, Rect, Stroke, Vec2};

/// Colour of position `t` (0..=1) on the viridis ramp.
fn viridis(t: f32) -> Color32 {
    const STOPS: [[f32; 3]; 5] = [
        [68.0, 1.0, 84.0],
        [59.0, 82.0, 139.0],
        [33.0, 145.0, 140.0],
        [94.0, 201.0, 98.0],
        [253.0, 231.0, 37.0],
    ];
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (STOPS.len() - 1) as f32;
    let i = (scaled.floor() as usize).min(STOPS.len() - 2);
    let f = scaled - i as f32;
    let lerp = |c: usize| (STOPS[i][c] + (STOPS[i + 1][c] - STOPS[i][c]) * f).round() as u8;
    Color32::from_rgb(lerp(0), lerp(1), lerp(2))
}

/// Histogram of the loaded images and the subtraction result, one at a time.
pub struct HistogramWindow {
    pub open: bool,
    sources: Vec<HistogramSource>,
    index: usize,
    bins: usize,
    /// `(index, bins)` the cached histogram was computed for.
    cached: Option<(usize, usize, Histogram)>,
}

impl HistogramWindow {
    pub fn new(bins: usize) -> Self {
        HistogramWindow {
            open: false,
            sources: Vec::new(),
            index: 0,
            bins: bins.clamp(1, MAX_BINS),
            cached: None,
        }
    }

    pub fn set_sources(&mut self, sources: Vec<HistogramSource>) {
        self.sources = sources;
        self.index = self.index.min(self.sources.len().saturating_sub(1));
        self.cached = None;
    }

    fn histogram(&mut self) -> Option<&Histogram> {
        let source = self.sources.get(self.index)?;
        let stale = !matches!(&self.cached, Some((i, b, _)) if *i == self.index && *b == self.bins);
        if stale {
            self.cached = Some((self.index, self.bins, Histogram::compute(&source.samples, self.bins)));
        }
        self.cached.as_ref().map(|(_, _, h)| h)
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let mut open = self.open;
        egui::Window::new("Image Histograms")
            .open(&mut open)
            .default_size([640.0, 480.0])
            .show(ctx, |ui| {
                if self.sources.is_empty() {
                    ui.label("No images available for histogram.");
                    return;
                }
                ui.label(egui::RichText::new(&self.sources[self.index].label).strong());
                if let Some(hist) = self.histogram().cloned() {
                    draw(ui, &hist);
                }

                ui.add(egui::Slider::new(&mut self.bins, 1..=MAX_BINS).show_value(false));
                ui.label(format!("Number of Bins: {}", self.bins));

                ui.horizontal(|ui| {
                    let last = self.sources.len() - 1;
                    if ui.add_enabled(self.index > 0, egui::Button::new("Previous")).clicked() {
                        self.index -= 1;
                    }
                    if ui.add_enabled(self.index < last, egui::Button::new("Next")).clicked() {
                        self.index += 1;
                    }
                    ui.label(format!("{} / {}", self.index + 1, self.sources.len()));
                });
            });
        self.open = open;
    }
}

fn draw(ui: &mut egui::Ui, hist: &Histogram) {
    let size = Vec2::new(ui.available_width().max(320.0), 300.0);
    let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
    let outer = response.rect;
    let text = ui.visuals().text_color();
    let font = FontId::proportional(12.0);

    painter.text(
        Pos2::new(outer.center().x, outer.top()),
        egui::Align2::CENTER_TOP,
        "Histogram of Pixel Intensities",
        FontId::proportional(14.0),
        text,
    );
    let plot = Rect::from_min_max(
        Pos2::new(outer.left() + 56.0, outer.top() + 24.0),
        Pos2::new(outer.right() - 12.0, outer.bottom() - 36.0),
    );

    let max_count = hist.max_count().max(1) as f32;
    let grid = Stroke::new(1.0, ui.visuals().weak_text_color().gamma_multiply(0.4));
    for step in 0..=4 {
        let frac = step as f32 / 4.0;
        let y = plot.bottom() - frac * plot.height();
        painter.line_segment([Pos2::new(plot.left(), y), Pos2::new(plot.right(), y)], grid);
        painter.text(
            Pos2::new(plot.left() - 4.0, y),
            egui::Align2::RIGHT_CENTER,
            format!("{:.0}", frac * max_count),
            font.clone(),
            text,
        );
    }

    let bins = hist.bins();
    let bar_width = plot.width() / bins as f32;
    for (i, &count) in hist.counts.iter().enumerate() {
        let height = count as f32 / max_count * plot.height();
        let x = plot.left() + i as f32 * bar_width;
        let bar = Rect::from_min_max(
            Pos2::new(x, plot.bottom() - height),
            Pos2::new(x + bar_width, plot.bottom()),
        );
        let t = if bins > 1 { i as f32 / (bins - 1) as f32 } else { 0.0 };
        painter.rect_filled(bar, 0.0, viridis(t));
        if bar_width >= 3.0 {
            painter.rect_stroke(bar, 0.0, Stroke::new(0.5, Color32::BLACK));
        }
    }
    painter.rect_stroke(plot, 0.0, Stroke::new(1.0, text));

    let (lo, hi) = (hist.edges[0], hist.edges[bins]);
    painter.text(plot.left_bottom() + Vec2::new(0.0, 4.0), egui::Align2::LEFT_TOP, format!("{lo:.1}"), font.clone(), text);
    painter.text(plot.right_bottom() + Vec2::new(0.0, 4.0), egui::Align2::RIGHT_TOP, format!("{hi:.1}"), font.clone(), text);
    painter.text(
        Pos2::new(plot.center().x, outer.bottom()),
        egui::Align2::CENTER_BOTTOM,
        "Pixel Intensity",
        font.clone(),
        text,
    );
    painter.text(
        Pos2::new(outer.left(), plot.top() - 4.0),
        egui::Align2::LEFT_BOTTOM,
        "Frequency",
        font,
        text,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viridis_endpoints() {
        assert_eq!(viridis(0.0), Color32::from_rgb(68, 1, 84));
        assert_eq!(viridis(1.0), Color32::from_rgb(253, 231, 37));
        assert_eq!(viridis(f32::NAN), viridis(0.0));
        assert_eq!(viridis(0.5), Color32::from_rgb(33, 145, 140));
    }

    #[test]
    fn sources_clamp_index() {
        let mut w = HistogramWindow::new(1000);
        assert_eq!(w.bins, MAX_BINS);
        w.set_sources(vec![
            HistogramSource { label: "a".into(), samples: vec![1.0, 2.0] },
            HistogramSource { label: "b".into(), samples: vec![3.0] },
        ]);
        w.index = 1;
        w.set_sources(vec![HistogramSource { label: "a".into(), samples: vec![1.0] }]);
        assert_eq!(w.index, 0);
        assert_eq!(w.histogram().unwrap().total(), 1);
    }
}
