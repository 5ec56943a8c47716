//! One render pass: filter the cached dataset, then aggregate it.

use crate::data::{filter, Dataset, FilterCriteria, FilterError, FilteredData};
use crate::stats::{AggregationError, Aggregator, Summary};
use thiserror::Error;

pub const NO_DATA_MESSAGE: &str = "No data available for the selected filters.";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub filtered: FilteredData,
    pub summary: Summary,
}

impl PipelineOutput {
    /// Informational text shown in place of the chart, if any.
    pub fn chart_message(&self) -> Option<&'static str> {
        self.summary.is_empty().then_some(NO_DATA_MESSAGE)
    }
}

pub fn run(dataset: &Dataset, criteria: &FilterCriteria) -> Result<PipelineOutput, PipelineError> {
    let filtered = filter(dataset, criteria)?;
    let summary = Aggregator::aggregate(&filtered)?;
    Ok(PipelineOutput { filtered, summary })
}
