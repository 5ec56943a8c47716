//! Stats module - per-AC aggregation

mod aggregator;

pub use aggregator::{AggregationError, Aggregator, Summary};
#[cfg(test)]
pub(crate) use aggregator::GroupTotals;
