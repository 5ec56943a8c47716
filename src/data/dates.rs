//! Date Normalizer
//! Converts the text `Date` column into a polars `Date` column.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::columns::DATE_COL;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Month-first wins for ambiguous slash dates.
const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Any date format may carry one of these after a space.
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

const ISO_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// What to do with a value that is not a recognizable date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePolicy {
    /// Unparseable values become missing.
    #[default]
    Lenient,
    /// The first unparseable value fails the whole column.
    Strict,
}

#[derive(Error, Debug)]
pub enum DateParseError {
    #[error("Failed to convert 'Date' column to a date: {value:?} at row {row}")]
    Unparseable { row: usize, value: String },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

pub fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Parse one cell. Time-of-day parts are dropped.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| parse_datetime(text, ISO_DATETIME_FORMAT))
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|date_fmt| {
                TIME_FORMATS
                    .iter()
                    .find_map(|time_fmt| parse_datetime(text, &format!("{date_fmt} {time_fmt}")))
            })
        })
}

fn parse_datetime(text: &str, fmt: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(text, fmt)
        .ok()
        .map(|dt| dt.date())
}

/// Replace `column` with a polars `Date` column parsed from its text form.
pub fn normalize_dates(
    df: &DataFrame,
    column: &str,
    policy: DatePolicy,
) -> Result<DataFrame, DateParseError> {
    let raw = df.column(column)?.cast(&DataType::String)?;
    let raw = raw.str()?;

    let mut days: Vec<Option<i32>> = Vec::with_capacity(raw.len());
    let mut coerced = 0usize;

    for (row, value) in raw.into_iter().enumerate() {
        let parsed = match value.map(str::trim) {
            None | Some("") => None,
            Some(text) => match parse_date(text) {
                Some(date) => Some(to_epoch_days(date)),
                None if policy == DatePolicy::Strict => {
                    return Err(DateParseError::Unparseable {
                        row,
                        value: text.to_string(),
                    });
                }
                None => {
                    coerced += 1;
                    None
                }
            },
        };
        days.push(parsed);
    }

    if coerced > 0 {
        log::warn!(
            "{} value(s) in '{}' could not be parsed as dates and were treated as missing",
            coerced,
            column
        );
    }

    let dates = Column::new(column.into(), days).cast(&DataType::Date)?;
    let mut out = df.clone();
    out.with_column(dates)?;
    Ok(out)
}

/// Earliest and latest non-missing `Date`, used as the default range.
pub fn date_bounds(df: &DataFrame) -> Option<(NaiveDate, NaiveDate)> {
    let days = df.column(DATE_COL).ok()?.cast(&DataType::Int32).ok()?;
    let days = days.i32().ok()?;
    let min = from_epoch_days(days.min()?)?;
    let max = from_epoch_days(days.max()?)?;
    Some((min, max))
}

/// Dates of a normalized column, row by row.
pub fn date_values(df: &DataFrame) -> Result<Vec<Option<NaiveDate>>, PolarsError> {
    let days = df.column(DATE_COL)?.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|d| d.and_then(from_epoch_days))
        .collect())
}
