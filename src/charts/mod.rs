//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{format_number, ChartPlotter};
pub use renderer::StaticChartRenderer;
