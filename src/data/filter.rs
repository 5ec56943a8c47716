//! Filter Engine
//! AC selection plus inclusive date range, sorted by date.

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

use super::columns::{AC_NAME_COL, DATE_COL};
use super::dates::{parse_date, to_epoch_days};
use super::loader::Dataset;

/// Selector value meaning "no AC restriction".
pub const ALL_SENTINEL: &str = "All";

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Failed to filter data by date range: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Invalid date {0:?}; expected a date such as 2024-01-31")]
    InvalidDate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(String),
}

impl CategoryFilter {
    /// Map a selector value to a filter. A real AC literally named "All"
    /// is shadowed by the sentinel here; use `Only` to reach it.
    pub fn from_selection(selection: &str) -> Self {
        if selection == ALL_SENTINEL {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(selection.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub category: CategoryFilter,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FilterCriteria {
    pub fn new(category: CategoryFilter, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            category,
            start,
            end,
        }
    }

    /// Build criteria from typed-in dates.
    pub fn parse(selection: &str, start: &str, end: &str) -> Result<Self, FilterError> {
        let start = parse_date(start).ok_or_else(|| FilterError::InvalidDate(start.to_string()))?;
        let end = parse_date(end).ok_or_else(|| FilterError::InvalidDate(end.to_string()))?;
        Ok(Self::new(CategoryFilter::from_selection(selection), start, end))
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

/// Rows of a [`Dataset`] that satisfy a [`FilterCriteria`].
#[derive(Debug, Clone)]
pub struct FilteredData {
    df: DataFrame,
}

impl FilteredData {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}

/// Selector options: the sentinel followed by every AC name.
pub fn category_options(dataset: &Dataset) -> Vec<String> {
    let mut options = vec![ALL_SENTINEL.to_string()];
    options.extend(dataset.ac_names());
    options
}

/// Apply `criteria`. Rows without a date never match. An inverted range
/// yields no rows. Output is stable-sorted ascending by date.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Result<FilteredData, FilterError> {
    let df = dataset.dataframe();

    if criteria.is_inverted() {
        log::warn!(
            "Start date {} is after end date {}; nothing matches",
            criteria.start,
            criteria.end
        );
        return Ok(FilteredData::new(df.clear()));
    }

    let days = col(DATE_COL).cast(DataType::Int32);
    let mut predicate = col(DATE_COL)
        .is_not_null()
        .and(days.clone().gt_eq(lit(to_epoch_days(criteria.start))))
        .and(days.lt_eq(lit(to_epoch_days(criteria.end))));

    if let CategoryFilter::Only(name) = &criteria.category {
        predicate = predicate.and(col(AC_NAME_COL).eq(lit(name.as_str())));
    }

    let filtered = df
        .clone()
        .lazy()
        .filter(predicate)
        .sort(
            [DATE_COL],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    log::debug!(
        "Filter {:?} {}..={} kept {} of {} rows",
        criteria.category,
        criteria.start,
        criteria.end,
        filtered.height(),
        df.height()
    );

    Ok(FilteredData::new(filtered))
}
