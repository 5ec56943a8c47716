//! Static Chart Renderer
//! Renders the grouped bar chart to PNG bytes for "Save Chart PNG".

use super::plotter::{bar_position, group_label, BAR_WIDTH, CHART_TITLE};
use crate::data::Metric;
use crate::stats::Summary;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

const SERIES_COLORS: [RGBColor; 3] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("No data available for the selected filters.")]
    NoData,
    #[error("Failed to generate visualization: {0}")]
    Render(String),
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render `summary` as a PNG of `width` x `height` pixels.
    pub fn render_png(summary: &Summary, width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
        if summary.is_empty() {
            return Err(ChartError::NoData);
        }

        let mut rgb = vec![0u8; (width as usize) * (height as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            let n = summary.len();
            let y_max = summary.max_charted_value().max(1.0) * 1.1;
            let y_min = summary.min_charted_value() * 1.1;
            let labels: Vec<String> = summary.groups.iter().map(|g| g.name.clone()).collect();
            let x_fmt = |x: &f64| group_label(&labels, *x);
            // One tick per AC so every group gets its name
            let ticks: Vec<f64> = (0..n).map(|i| i as f64).collect();

            let mut chart = ChartBuilder::on(&root)
                .caption(CHART_TITLE, ("sans-serif", 28).into_font())
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d(
                    (-0.5f64..(n as f64 - 0.5)).with_key_points(ticks),
                    y_min..y_max,
                )
                .map_err(render_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_label_formatter(&x_fmt)
                .x_desc("AC Name")
                .y_desc("value")
                .draw()
                .map_err(render_err)?;

            for (series, metric) in Metric::CHARTED.iter().enumerate() {
                let color = SERIES_COLORS[series];
                chart
                    .draw_series(summary.groups.iter().enumerate().map(|(group, totals)| {
                        let x = bar_position(group, series);
                        Rectangle::new(
                            [(x - BAR_WIDTH / 2.0, 0.0), (x + BAR_WIDTH / 2.0, totals.get(*metric))],
                            color.filled(),
                        )
                    }))
                    .map_err(render_err)?
                    .label(metric.column_name())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_err)?;

            root.present().map_err(render_err)?;
        }

        let img = RgbImage::from_raw(width, height, rgb)
            .ok_or_else(|| ChartError::Render("pixel buffer size mismatch".to_string()))?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::GroupTotals;

    fn summary_of(groups: &[(&str, f64)]) -> Summary {
        Summary {
            groups: groups
                .iter()
                .map(|(name, cash)| GroupTotals {
                    name: name.to_string(),
                    totals: [*cash, 2.0, 1.0, 5.0, 3.0, 8.0],
                })
                .collect(),
        }
    }

    #[test]
    fn renders_png_of_requested_size() {
        let summary = summary_of(&[("X", 150.0), ("Y", 30.0)]);
        let png = StaticChartRenderer::render_png(&summary, 640, 400).unwrap();

        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (640, 400));
    }

    #[test]
    fn renders_many_groups_and_negative_totals() {
        let names: Vec<String> = (0..12).map(|i| format!("AC {i}")).collect();
        let groups: Vec<(&str, f64)> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), if i % 3 == 0 { -40.0 } else { 90.0 }))
            .collect();
        let summary = summary_of(&groups);
        assert_eq!(summary.min_charted_value(), -40.0);

        let png = StaticChartRenderer::render_png(&summary, 1200, 700).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (1200, 700));
    }

    #[test]
    fn empty_summary_is_never_rendered() {
        assert!(matches!(
            StaticChartRenderer::render_png(&Summary::default(), 800, 600),
            Err(ChartError::NoData)
        ));
    }
}
