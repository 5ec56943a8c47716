//! Table View Widget
//! Scrollable listing of the filtered rows.

use crate::charts::format_number;
use crate::data::{from_epoch_days, FilteredData};
use egui::{RichText, ScrollArea};
use polars::prelude::*;

const TABLE_HEIGHT: f32 = 380.0;

/// Display text for one cell. Missing values are blank.
pub fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Date(days) => from_epoch_days(*days)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        AnyValue::Float64(v) => format_number(*v),
        AnyValue::Float32(v) => format_number(f64::from(*v)),
        other => other.to_string(),
    }
}

/// Filtered rows pre-rendered as text so frames only lay out labels.
#[derive(Default)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.headers.clear();
        self.rows.clear();
    }

    pub fn set_data(&mut self, data: &FilteredData) {
        let df = data.dataframe();
        self.headers = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.rows = (0..df.height())
            .map(|i| {
                df.get_columns()
                    .iter()
                    .map(|col| col.get(i).map(|v| cell_text(&v)).unwrap_or_default())
                    .collect()
            })
            .collect();
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new(format!("{} rows", self.rows.len()))
                .size(11.0)
                .color(egui::Color32::GRAY),
        );
        ui.add_space(4.0);

        ScrollArea::both()
            .id_salt("filtered_table")
            .max_height(TABLE_HEIGHT)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                egui::Grid::new("filtered_rows")
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for header in &self.headers {
                            ui.label(RichText::new(header).strong().size(12.0));
                        }
                        ui.end_row();

                        for row in &self.rows {
                            for cell in row {
                                ui.label(RichText::new(cell).size(12.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}
