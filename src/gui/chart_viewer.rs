//! Chart Viewer Widget
//! Grouped bar chart and summary table, or the no-data notice.

use crate::charts::ChartPlotter;
use crate::pipeline::NO_DATA_MESSAGE;
use crate::stats::Summary;
use egui::RichText;

#[derive(Default)]
pub struct ChartViewer {
    pub summary: Summary,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.summary = Summary::default();
    }

    pub fn set_summary(&mut self, summary: Summary) {
        self.summary = summary;
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        if self.summary.is_empty() {
            ui.label(RichText::new(NO_DATA_MESSAGE).size(14.0));
            return;
        }

        ui.add_space(6.0);
        ChartPlotter::draw_bar_chart(ui, &self.summary);

        ui.add_space(12.0);
        ui.label(RichText::new("Totals by AC").size(14.0).strong());
        ui.add_space(4.0);
        ChartPlotter::draw_summary_table(ui, &self.summary);
    }
}
