//! Chart Plotter Module
//! Grouped bar chart and summary table drawn with egui_plot / egui.

use crate::data::Metric;
use crate::stats::Summary;
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Plot};

pub const CHART_TITLE: &str = "Performance Metrics by AC";

/// One color per charted series, in [`Metric::CHARTED`] order.
pub const SERIES_COLORS: [Color32; 3] = [
    Color32::from_rgb(99, 110, 250), // Blue
    Color32::from_rgb(239, 85, 59),  // Red
    Color32::from_rgb(0, 204, 150),  // Green
];

/// Horizontal width of a single bar; a group spans three of them.
pub const BAR_WIDTH: f64 = 0.25;

/// X position of series `series` inside group `group`.
pub fn bar_position(group: usize, series: usize) -> f64 {
    group as f64 + (series as f64 - 1.0) * BAR_WIDTH
}

/// Axis label for `x`, only at whole group positions.
pub fn group_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Draws the summary views with egui.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Grouped bars keyed by AC name, one series per charted metric.
    /// Callers must not pass an empty summary.
    pub fn draw_bar_chart(ui: &mut egui::Ui, summary: &Summary) {
        let labels: Vec<String> = summary.groups.iter().map(|g| g.name.clone()).collect();

        Plot::new("performance_metrics")
            .height(360.0)
            .legend(Legend::default())
            .allow_scroll(false)
            .include_y(0.0)
            .x_axis_label("AC Name")
            .y_axis_label("value")
            .x_axis_formatter(move |mark, _range| group_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                for (series, metric) in Metric::CHARTED.iter().enumerate() {
                    let color = SERIES_COLORS[series];
                    let bars: Vec<Bar> = summary
                        .groups
                        .iter()
                        .enumerate()
                        .map(|(group, totals)| {
                            Bar::new(bar_position(group, series), totals.get(*metric))
                                .width(BAR_WIDTH)
                                .name(format!("{} · {}", totals.name, metric.column_name()))
                        })
                        .collect();

                    plot_ui.bar_chart(
                        BarChart::new(bars)
                            .color(color)
                            .name(metric.column_name()),
                    );
                }
            });
    }

    /// All six sums per AC, plus a total row.
    pub fn draw_summary_table(ui: &mut egui::Ui, summary: &Summary) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("summary_table")
                    .striped(true)
                    .min_col_width(70.0)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("AC Name").strong().size(12.0));
                        for metric in Metric::ALL {
                            ui.label(RichText::new(metric.column_name()).strong().size(12.0));
                        }
                        ui.end_row();

                        for group in &summary.groups {
                            ui.label(RichText::new(&group.name).size(12.0));
                            for metric in Metric::ALL {
                                ui.label(RichText::new(format_number(group.get(metric))).size(12.0));
                            }
                            ui.end_row();
                        }

                        ui.label(RichText::new("Total").strong().size(12.0));
                        for metric in Metric::ALL {
                            ui.label(
                                RichText::new(format_number(summary.total(metric)))
                                    .strong()
                                    .size(12.0),
                            );
                        }
                        ui.end_row();
                    });
            });
    }
}

/// Whole numbers without a fraction, everything else with two decimals.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
