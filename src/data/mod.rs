//! Data module - loading, normalization and filtering

mod columns;
mod dates;
mod filter;
pub(crate) mod loader;

pub use columns::{Metric, AC_NAME_COL};
pub use dates::{from_epoch_days, DatePolicy};
pub use filter::{
    category_options, filter, CategoryFilter, FilterCriteria, FilterError, FilteredData,
    ALL_SENTINEL,
};
pub use loader::{load_dataset, Dataset, DatasetCache};

#[cfg(test)]
pub(crate) use dates::date_values;
