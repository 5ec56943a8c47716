//! Sales Dashboard Main Application
//! Main window with control panel, filtered table and performance chart.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::data::{category_options, load_dataset, Dataset, DatasetCache};
use crate::export;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, TableView};
use crate::pipeline::{self, PipelineOutput};
use anyhow::Context;
use egui::{Color32, RichText, SidePanel};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

const LOAD_FAILED: &str =
    "Failed to load data. Please check the Google Sheet link and ensure it is publicly accessible.";

const LOADER_STOPPED: &str = "loader thread stopped without a result";

const PNG_WIDTH: u32 = 1200;
const PNG_HEIGHT: u32 = 700;

/// Dataset loading result from background thread
enum LoadResult {
    Complete(Dataset),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    cache: DatasetCache,
    dataset: Option<Arc<Dataset>>,
    control_panel: ControlPanel,
    table_view: TableView,
    chart_viewer: ChartViewer,
    output: Option<PipelineOutput>,
    error: Option<String>,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let control_panel = ControlPanel::new(&config.source_url);
        let mut app = Self {
            config,
            cache: DatasetCache::new(),
            dataset: None,
            control_panel,
            table_view: TableView::new(),
            chart_viewer: ChartViewer::new(),
            output: None,
            error: None,
            load_rx: None,
            is_loading: false,
        };
        app.start_loading();
        app
    }

    /// Use the cached dataset if there is one, otherwise fetch it.
    fn start_loading(&mut self) {
        match self.cache.get(&self.config.source_url) {
            Some(dataset) => self.set_dataset(dataset),
            None => self.spawn_load(),
        }
    }

    /// Fetch the source in a background thread, bypassing the cache.
    fn spawn_load(&mut self) {
        if self.is_loading {
            return;
        }

        self.is_loading = true;
        self.control_panel.busy = true;
        self.control_panel
            .set_status("Loading data from Google Sheets...");

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let config = self.config.clone();

        thread::spawn(move || {
            let result = match load_dataset(&config) {
                Ok(dataset) => LoadResult::Complete(dataset),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match poll_load(&rx) {
            None => self.load_rx = Some(rx),
            Some(LoadResult::Complete(dataset)) => {
                let dataset = self.cache.insert(dataset);
                self.finish_loading();
                self.set_dataset(dataset);
            }
            Some(LoadResult::Error(error)) => {
                log::error!("{} ({})", LOAD_FAILED, error);
                self.finish_loading();
                self.dataset = None;
                self.output = None;
                self.table_view.clear();
                self.chart_viewer.clear();
                self.error = Some(format!("{}\n{}", LOAD_FAILED, error));
                self.control_panel.set_status("Failed to load data");
                self.control_panel.has_rows = false;
                self.control_panel.has_chart = false;
            }
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.busy = false;
    }

    fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.control_panel
            .update_options(category_options(&dataset), dataset.date_bounds());
        self.control_panel.loaded_at = Some(dataset.loaded_at().format("%Y-%m-%d %H:%M").to_string());
        self.control_panel.set_status(&format!(
            "Data successfully loaded! {} rows",
            dataset.row_count()
        ));
        self.dataset = Some(dataset);
        self.recompute();
    }

    /// Re-run filter and aggregation for the current selection.
    fn recompute(&mut self) {
        let Some(dataset) = self.dataset.clone() else {
            return;
        };

        let criteria = self.control_panel.settings.criteria();
        match pipeline::run(&dataset, &criteria) {
            Ok(output) => {
                self.table_view.set_data(&output.filtered);
                self.chart_viewer.set_summary(output.summary.clone());
                self.control_panel.has_rows = !output.filtered.is_empty();
                self.control_panel.has_chart = !output.summary.is_empty();
                self.output = Some(output);
                self.error = None;
            }
            Err(e) => {
                log::error!("{}", e);
                self.table_view.clear();
                self.chart_viewer.clear();
                self.control_panel.has_rows = false;
                self.control_panel.has_chart = false;
                self.output = None;
                self.error = Some(e.to_string());
            }
        }
    }

    /// Handle CSV download
    fn handle_download_csv(&mut self) {
        let Some(output) = &self.output else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(&self.config.export_file_name)
            .save_file()
        else {
            return; // User cancelled
        };

        let status = match save_csv(output, &path) {
            Ok(()) => format!("Exported {} rows to {}", output.filtered.row_count(), path.display()),
            Err(e) => {
                log::error!("{:#}", e);
                format!("Error: {:#}", e)
            }
        };
        self.control_panel.set_status(&status);
    }

    /// Handle chart PNG export
    fn handle_save_chart(&mut self) {
        let Some(output) = &self.output else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(&self.config.chart_file_name)
            .save_file()
        else {
            return;
        };

        let status = match save_chart(output, &path) {
            Ok(()) => format!("Saved chart to {}", path.display()),
            Err(e) => {
                log::error!("{:#}", e);
                format!("Error: {:#}", e)
            }
        };
        self.control_panel.set_status(&status);
    }
}

/// Non-blocking check of the loader channel. A sender dropped without a
/// result (the thread panicked) counts as a failed load.
fn poll_load(rx: &Receiver<LoadResult>) -> Option<LoadResult> {
    match rx.try_recv() {
        Ok(result) => Some(result),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => Some(LoadResult::Error(LOADER_STOPPED.to_string())),
    }
}

fn save_csv(output: &PipelineOutput, path: &Path) -> anyhow::Result<()> {
    export::write_csv(&output.filtered, path)
        .with_context(|| format!("could not export {}", path.display()))
}

fn save_chart(output: &PipelineOutput, path: &Path) -> anyhow::Result<()> {
    let png = StaticChartRenderer::render_png(&output.summary, PNG_WIDTH, PNG_HEIGHT)?;
    std::fs::write(path, png).with_context(|| format!("could not write {}", path.display()))?;
    log::info!("Saved chart to {}", path.display());
    Ok(())
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::Refresh => self.spawn_load(),
                        ControlPanelAction::FiltersChanged => self.recompute(),
                        ControlPanelAction::DownloadCsv => self.handle_download_csv(),
                        ControlPanelAction::SaveChart => self.handle_save_chart(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - table and chart
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(RichText::new(&self.config.window_title).size(24.0).strong());
            ui.add_space(8.0);

            if let Some(error) = &self.error {
                ui.label(RichText::new(error).color(Color32::from_rgb(220, 53, 69)));
                return;
            }

            if self.dataset.is_none() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading data from Google Sheets...");
                });
                return;
            }

            egui::ScrollArea::vertical()
                .id_salt("dashboard_body")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.label(RichText::new("Filtered Data").size(18.0).strong());
                    ui.add_space(4.0);
                    self.table_view.show(ui);

                    ui.add_space(16.0);
                    ui.separator();
                    ui.label(RichText::new("Performance Metrics by AC").size(18.0).strong());
                    ui.add_space(4.0);
                    self.chart_viewer.show(ui);
                });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::tests::sample_dataset;

    #[test]
    fn pending_load_keeps_waiting() {
        let (_tx, rx) = channel::<LoadResult>();
        assert!(poll_load(&rx).is_none());
    }

    #[test]
    fn finished_load_is_delivered() {
        let (tx, rx) = channel();
        tx.send(LoadResult::Complete(sample_dataset())).unwrap();
        match poll_load(&rx) {
            Some(LoadResult::Complete(dataset)) => assert_eq!(dataset.row_count(), 3),
            _ => panic!("expected a completed load"),
        }
    }

    #[test]
    fn panicked_loader_is_reported_as_failure() {
        let (tx, rx) = channel::<LoadResult>();
        let handle = thread::spawn(move || {
            let _tx = tx;
            panic!("loader blew up");
        });
        assert!(handle.join().is_err());

        match poll_load(&rx) {
            Some(LoadResult::Error(message)) => assert_eq!(message, LOADER_STOPPED),
            _ => panic!("expected a load error"),
        }
    }
}
