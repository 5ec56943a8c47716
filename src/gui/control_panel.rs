//! Control Panel Widget
//! Left side panel with the data source, filters and export buttons.

use crate::data::{CategoryFilter, FilterCriteria, ALL_SENTINEL};
use chrono::{Local, NaiveDate};
use egui::{Color32, ComboBox, RichText};
use egui_extras::DatePickerButton;

/// Current filter selection
#[derive(Clone, PartialEq)]
pub struct FilterSettings {
    pub selection: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for FilterSettings {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            selection: ALL_SENTINEL.to_string(),
            start: today,
            end: today,
        }
    }
}

impl FilterSettings {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(
            CategoryFilter::from_selection(&self.selection),
            self.start,
            self.end,
        )
    }
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: FilterSettings,
    pub options: Vec<String>,
    pub source: String,
    pub loaded_at: Option<String>,
    pub status: String,
    pub has_rows: bool,
    pub has_chart: bool,
    pub busy: bool,
}

impl ControlPanel {
    pub fn new(source: &str) -> Self {
        Self {
            settings: FilterSettings::default(),
            options: vec![ALL_SENTINEL.to_string()],
            source: source.to_string(),
            loaded_at: None,
            status: "Ready".to_string(),
            has_rows: false,
            has_chart: false,
            busy: false,
        }
    }

    /// Reset the selector and date range for a freshly loaded dataset.
    pub fn update_options(&mut self, options: Vec<String>, bounds: Option<(NaiveDate, NaiveDate)>) {
        if !options.contains(&self.settings.selection) {
            self.settings.selection = ALL_SENTINEL.to_string();
        }
        self.options = options;

        if let Some((min, max)) = bounds {
            self.settings.start = min;
            self.settings.end = max;
        }
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let before = self.settings.clone();

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Sales Tracker")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new("Google Sheets export").size(12.0))
                    .on_hover_text(&self.source);
                let loaded = self
                    .loaded_at
                    .as_deref()
                    .map(|t| format!("Loaded {}", t))
                    .unwrap_or_else(|| "Not loaded".to_string());
                ui.horizontal(|ui| {
                    ui.label(RichText::new(loaded).size(11.0).color(Color32::GRAY));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.busy, |ui| {
                            if ui.button("🔄 Refresh").clicked() {
                                action = ControlPanelAction::Refresh;
                            }
                        });
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters Section =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 90.0;
        let combo_width = 170.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("AC Name:"));
            ComboBox::from_id_salt("ac_name")
                .width(combo_width)
                .selected_text(&self.settings.selection)
                .show_ui(ui, |ui| {
                    for option in &self.options {
                        ui.selectable_value(&mut self.settings.selection, option.clone(), option);
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Start Date:"));
            ui.push_id("start_date", |ui| {
                ui.add(DatePickerButton::new(&mut self.settings.start));
            });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("End Date:"));
            ui.push_id("end_date", |ui| {
                ui.add(DatePickerButton::new(&mut self.settings.end));
            });
        });

        if self.settings.start > self.settings.end {
            ui.add_space(5.0);
            ui.label(
                RichText::new("Start date is after end date")
                    .size(11.0)
                    .color(Color32::from_rgb(220, 53, 69)),
            );
        }

        if self.settings != before {
            action = ControlPanelAction::FiltersChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.has_rows && !self.busy, |ui| {
                let button = egui::Button::new(RichText::new("⬇ Download CSV").size(15.0))
                    .min_size(egui::vec2(200.0, 32.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::DownloadCsv;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(self.has_chart && !self.busy, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Save Chart PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::SaveChart;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("Status").size(14.0).strong());
        ui.add_space(5.0);

        let status_color = if self.status.contains("Failed") || self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Exported") || self.status.contains("Saved") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Refresh,
    FiltersChanged,
    DownloadCsv,
    SaveChart,
}
