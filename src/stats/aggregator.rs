//! Aggregator Module
//! Per-AC sums of the metric columns.

use crate::data::{FilteredData, Metric, AC_NAME_COL};
use polars::prelude::*;
use thiserror::Error;

/// Group label for rows whose AC name is missing.
pub const MISSING_GROUP_LABEL: &str = "(blank)";

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("Failed to aggregate data: missing column '{0}'")]
    MissingColumn(String),
    #[error("Failed to aggregate data: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Sums for one AC, indexed by [`Metric::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotals {
    pub name: String,
    pub totals: [f64; 6],
}

impl GroupTotals {
    pub fn get(&self, metric: Metric) -> f64 {
        self.totals[metric.index()]
    }
}

/// Groups in order of first appearance in the filtered rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub groups: Vec<GroupTotals>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, name: &str) -> Option<&GroupTotals> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Sum of `metric` across every group.
    pub fn total(&self, metric: Metric) -> f64 {
        self.groups.iter().map(|g| g.get(metric)).sum()
    }

    /// Largest value among the charted series, for axis scaling.
    pub fn max_charted_value(&self) -> f64 {
        self.groups
            .iter()
            .flat_map(|g| Metric::CHARTED.into_iter().map(move |m| g.get(m)))
            .fold(0.0, f64::max)
    }

    /// Smallest charted value, never above zero.
    pub fn min_charted_value(&self) -> f64 {
        self.groups
            .iter()
            .flat_map(|g| Metric::CHARTED.into_iter().map(move |m| g.get(m)))
            .fold(0.0, f64::min)
    }
}

/// Computes [`Summary`] values with a stable polars group-by.
pub struct Aggregator;

impl Aggregator {
    /// Group by AC name and sum each metric; missing values count as zero.
    pub fn aggregate(data: &FilteredData) -> Result<Summary, AggregationError> {
        let df = data.dataframe();

        let required =
            std::iter::once(AC_NAME_COL).chain(Metric::ALL.into_iter().map(Metric::column_name));
        for name in required {
            if df.column(name).is_err() {
                return Err(AggregationError::MissingColumn(name.to_string()));
            }
        }

        if df.height() == 0 {
            return Ok(Summary::default());
        }

        let sums: Vec<Expr> = Metric::ALL
            .iter()
            .map(|m| {
                col(m.column_name())
                    .cast(DataType::Float64)
                    .fill_null(lit(0.0))
                    .sum()
            })
            .collect();

        let grouped = df
            .clone()
            .lazy()
            .with_column(
                col(AC_NAME_COL)
                    .cast(DataType::String)
                    .fill_null(lit(MISSING_GROUP_LABEL)),
            )
            .group_by_stable([col(AC_NAME_COL)])
            .agg(sums)
            .collect()?;

        let names = grouped.column(AC_NAME_COL)?.str()?.clone();
        let mut metric_values = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let values = grouped.column(metric.column_name())?.cast(&DataType::Float64)?;
            metric_values.push(values.f64()?.clone());
        }

        let groups = (0..grouped.height())
            .map(|i| {
                let mut totals = [0.0; 6];
                for (slot, values) in totals.iter_mut().zip(&metric_values) {
                    *slot = values.get(i).unwrap_or(0.0);
                }
                GroupTotals {
                    name: names.get(i).unwrap_or(MISSING_GROUP_LABEL).to_string(),
                    totals,
                }
            })
            .collect::<Vec<_>>();

        log::debug!("Aggregated {} rows into {} groups", df.height(), groups.len());
        Ok(Summary { groups })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::tests::sample_dataset;
    use crate::data::{filter, CategoryFilter, Dataset, DatePolicy, FilterCriteria};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn january_scenario_sums_per_ac() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::new(CategoryFilter::All, ymd(2024, 1, 1), ymd(2024, 1, 31));
        let summary = Aggregator::aggregate(&filter(&ds, &criteria).unwrap()).unwrap();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary.groups[0].name, "X");
        assert_eq!(summary.groups[1].name, "Y");
        assert_eq!(summary.group("X").unwrap().get(Metric::CashIn), 100.0);
        assert_eq!(summary.group("Y").unwrap().get(Metric::CashIn), 30.0);
        // Y's blank SGR Leads counts as zero
        assert_eq!(summary.group("Y").unwrap().get(Metric::SgrLeads), 0.0);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::new(
            CategoryFilter::Only("Z".into()),
            ymd(2024, 1, 1),
            ymd(2024, 12, 31),
        );
        let filtered = filter(&ds, &criteria).unwrap();
        let summary = Aggregator::aggregate(&filtered).unwrap();
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.max_charted_value(), 0.0);
        assert_eq!(summary.min_charted_value(), 0.0);
    }

    #[test]
    fn missing_names_get_their_own_group() {
        let csv = "\
AC Name,Date,Cash-in,Enrl,SGR Conversion,Fresh Leads,SGR Leads,Overall Leads
,2024-01-01,10,1,1,1,1,1
X,2024-01-02,5,1,1,1,1,1
";
        let ds = Dataset::from_csv_bytes(csv.as_bytes().to_vec(), "t", DatePolicy::Lenient).unwrap();
        let criteria = FilterCriteria::new(CategoryFilter::All, ymd(2024, 1, 1), ymd(2024, 1, 2));
        let summary = Aggregator::aggregate(&filter(&ds, &criteria).unwrap()).unwrap();

        assert_eq!(summary.group(MISSING_GROUP_LABEL).unwrap().get(Metric::CashIn), 10.0);
        assert_eq!(summary.total(Metric::CashIn), 15.0);
    }

    #[test]
    fn missing_metric_column_is_reported() {
        let df = DataFrame::new(vec![
            Column::new(AC_NAME_COL.into(), vec!["X"]),
            Column::new("Cash-in".into(), vec![1.0]),
        ])
        .unwrap();
        match Aggregator::aggregate(&FilteredData::new(df)) {
            Err(AggregationError::MissingColumn(name)) => assert_eq!(name, "Enrl"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn totals_are_conserved(rows in prop::collection::vec((0usize..4, 1u32..=28, prop::option::of(0u32..500)), 0..50)) {
            let mut csv = String::from(
                "AC Name,Date,Cash-in,Enrl,SGR Conversion,Fresh Leads,SGR Leads,Overall Leads\n",
            );
            let mut expected = 0.0;
            for (ac, day, cash) in &rows {
                let cash_text = cash.map(|c| c.to_string()).unwrap_or_default();
                expected += cash.unwrap_or(0) as f64;
                csv.push_str(&format!("{},2024-03-{:02},{},1,1,1,1,1\n", ["A", "B", "C", "D"][*ac], day, cash_text));
            }
            let ds = Dataset::from_csv_bytes(csv.into_bytes(), "p", DatePolicy::Lenient).unwrap();
            let criteria = FilterCriteria::new(CategoryFilter::All, ymd(2024, 3, 1), ymd(2024, 3, 31));
            let filtered = filter(&ds, &criteria).unwrap();
            let summary = Aggregator::aggregate(&filtered).unwrap();

            prop_assert_eq!(summary.total(Metric::CashIn), expected);
            prop_assert_eq!(summary.total(Metric::Enrl), rows.len() as f64);
            prop_assert_eq!(summary.is_empty(), rows.is_empty());
        }
    }
}
