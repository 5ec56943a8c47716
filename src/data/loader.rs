//! CSV Data Loader Module
//! Fetches the sheet export over HTTP and parses it with Polars.

use chrono::{DateTime, Local, NaiveDate};
use polars::prelude::*;
use reqwest::blocking::Client;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::columns::{required_columns, Metric, AC_NAME_COL, DATE_COL};
use super::dates::{date_bounds, normalize_dates, DateParseError, DatePolicy};
use crate::config::DashboardConfig;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to fetch data: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Source responded with HTTP {0}")]
    Status(u16),
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error(transparent)]
    Date(#[from] DateParseError),
}

/// A normalized copy of the sheet, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    source: String,
    loaded_at: DateTime<Local>,
}

impl Dataset {
    /// Parse, validate and normalize raw CSV bytes.
    pub fn from_csv_bytes(
        bytes: Vec<u8>,
        source: &str,
        policy: DatePolicy,
    ) -> Result<Self, LoadError> {
        let df = parse_csv(bytes)?;
        let df = normalize_dates(&df, DATE_COL, policy)?;
        let df = normalize_metrics(&df)?;

        let mut df = df;
        let names = df.column(AC_NAME_COL)?.cast(&DataType::String)?;
        df.with_column(names)?;

        Ok(Self {
            df,
            source: source.to_string(),
            loaded_at: Local::now(),
        })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        date_bounds(&self.df)
    }

    /// Distinct non-missing AC names in order of first appearance.
    pub fn ac_names(&self) -> Vec<String> {
        let Ok(column) = self.df.column(AC_NAME_COL) else {
            return Vec::new();
        };
        let Ok(names) = column.str() else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        names
            .into_iter()
            .flatten()
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect()
    }
}

/// Loaded datasets keyed by source URL. Nothing is ever evicted.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<String, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Arc<Dataset>> {
        self.entries.get(url).cloned()
    }

    /// Store a freshly loaded dataset, replacing any earlier copy.
    pub fn insert(&mut self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        self.entries
            .insert(dataset.source().to_string(), Arc::clone(&dataset));
        dataset
    }
}

pub fn http_client(timeout: Duration) -> Result<Client, LoadError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// GET the export URL and return the raw body.
pub fn fetch_csv(client: &Client, url: &str) -> Result<Vec<u8>, LoadError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status(status.as_u16()));
    }
    Ok(response.bytes()?.to_vec())
}

/// Parse CSV bytes with a header row and check for the required columns.
///
/// Every column is read as text; typing happens in the normalizers so a
/// formatted cell deep in the sheet is never nulled by schema inference.
pub fn parse_csv(bytes: Vec<u8>) -> Result<DataFrame, LoadError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_ignore_errors(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    // Sheet headers often carry stray spaces
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    df.set_column_names(names)?;

    let present: HashSet<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let missing: Vec<String> = required_columns()
        .into_iter()
        .filter(|c| !present.contains(*c))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    Ok(df)
}

/// Coerce the metric columns to `Float64`. Text cells lose thousands
/// separators and currency symbols first; anything else becomes missing.
pub fn normalize_metrics(df: &DataFrame) -> Result<DataFrame, PolarsError> {
    let mut out = df.clone();

    for metric in Metric::ALL {
        let name = metric.column_name();
        let column = df.column(name)?;
        let values = match column.dtype() {
            DataType::String => {
                let parsed: Vec<Option<f64>> = column
                    .str()?
                    .into_iter()
                    .map(|v| v.and_then(parse_number))
                    .collect();
                Column::new(name.into(), parsed)
            }
            _ => column.cast(&DataType::Float64)?,
        };
        out.with_column(values)?;
    }

    Ok(out)
}

fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '₹' | '$' | '€' | '£') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok()
}

/// Fetch and normalize the configured source.
pub fn load_dataset(config: &DashboardConfig) -> Result<Dataset, LoadError> {
    log::info!("Loading data from {}", config.source_url);

    let client = http_client(config.request_timeout())?;
    let bytes = fetch_csv(&client, &config.source_url)?;
    let dataset = Dataset::from_csv_bytes(bytes, &config.source_url, config.date_policy)?;

    log::info!(
        "Loaded {} rows, {} columns",
        dataset.row_count(),
        dataset.dataframe().width()
    );
    Ok(dataset)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    pub(crate) const SAMPLE_CSV: &str = "\
AC Name,Date,Cash-in,Enrl,SGR Conversion,Fresh Leads,SGR Leads,Overall Leads
X,2024-02-01,50,1,0,3,1,4
X,2024-01-01,100,2,1,5,2,7
Y,2024-01-15,30,1,1,2,,2
";

    pub(crate) fn sample_dataset() -> Dataset {
        Dataset::from_csv_bytes(SAMPLE_CSV.as_bytes().to_vec(), "test://sample", DatePolicy::Lenient)
            .unwrap()
    }

    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "{status_line}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/export?format=csv")
    }

    #[test]
    fn loads_sample_sheet() {
        let ds = sample_dataset();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.dataframe().column(DATE_COL).unwrap().dtype(), &DataType::Date);
        assert_eq!(
            ds.dataframe().column("Cash-in").unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(ds.ac_names(), vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(
            ds.date_bounds(),
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
            ))
        );
    }

    #[test]
    fn missing_columns_are_listed() {
        let csv = "AC Name,Date,Cash-in\nX,2024-01-01,5\n";
        match parse_csv(csv.as_bytes().to_vec()) {
            Err(LoadError::MissingColumns(missing)) => {
                assert_eq!(missing.len(), 5);
                assert!(missing.contains(&"Enrl".to_string()));
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn empty_document_fails() {
        assert!(parse_csv(Vec::new()).is_err());
    }

    #[test]
    fn header_whitespace_is_trimmed() {
        let csv = " AC Name ,Date,Cash-in,Enrl,SGR Conversion,Fresh Leads,SGR Leads,Overall Leads \n\
                   X,2024-01-01,1,1,1,1,1,1\n";
        let df = parse_csv(csv.as_bytes().to_vec()).unwrap();
        assert!(df.column(AC_NAME_COL).is_ok());
        assert!(df.column("Overall Leads").is_ok());
    }

    #[test]
    fn formatted_numbers_are_cleaned() {
        assert_eq!(parse_number("1,250"), Some(1250.0));
        assert_eq!(parse_number("₹ 3,000.50"), Some(3000.5));
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("n/a"), None);

        let csv = "\
AC Name,Date,Cash-in,Enrl,SGR Conversion,Fresh Leads,SGR Leads,Overall Leads
X,2024-01-01,\"1,000\",1,1,1,1,1
X,2024-01-02,oops,1,1,1,1,1
";
        let ds = Dataset::from_csv_bytes(csv.as_bytes().to_vec(), "t", DatePolicy::Lenient).unwrap();
        let cash = ds.dataframe().column("Cash-in").unwrap();
        let cash = cash.f64().unwrap();
        assert_eq!(cash.get(0), Some(1000.0));
        assert_eq!(cash.get(1), None);
    }

    #[test]
    fn formatted_numbers_past_the_first_rows_are_kept() {
        let mut csv = String::from(
            "AC Name,Date,Cash-in,Enrl,SGR Conversion,Fresh Leads,SGR Leads,Overall Leads\n",
        );
        for _ in 0..10_050 {
            csv.push_str("X,2024-01-01,1,1,1,1,1,1\n");
        }
        csv.push_str("X,2024-01-02,\"1,250\",1,1,1,1,1\n");

        let ds = Dataset::from_csv_bytes(csv.into_bytes(), "t", DatePolicy::Lenient).unwrap();
        let cash = ds.dataframe().column("Cash-in").unwrap();
        let cash = cash.f64().unwrap();
        assert_eq!(cash.len(), 10_051);
        assert_eq!(cash.get(0), Some(1.0));
        assert_eq!(cash.get(10_050), Some(1250.0));
    }

    #[test]
    fn strict_policy_rejects_bad_dates() {
        let csv = "\
AC Name,Date,Cash-in,Enrl,SGR Conversion,Fresh Leads,SGR Leads,Overall Leads
X,someday,1,1,1,1,1,1
";
        let result = Dataset::from_csv_bytes(csv.as_bytes().to_vec(), "t", DatePolicy::Strict);
        assert!(matches!(result, Err(LoadError::Date(_))));

        let lenient = Dataset::from_csv_bytes(csv.as_bytes().to_vec(), "t", DatePolicy::Lenient);
        assert_eq!(lenient.unwrap().date_bounds(), None);
    }

    #[test]
    fn fetches_over_http() {
        let url = serve_once("HTTP/1.1 200 OK", SAMPLE_CSV);
        let client = http_client(Duration::from_secs(5)).unwrap();
        let bytes = fetch_csv(&client, &url).unwrap();
        assert_eq!(bytes, SAMPLE_CSV.as_bytes());
    }

    #[test]
    fn load_dataset_uses_configured_source() {
        let url = serve_once("HTTP/1.1 200 OK", SAMPLE_CSV);
        let config = DashboardConfig {
            source_url: url.clone(),
            request_timeout_secs: 5,
            ..DashboardConfig::default()
        };
        let ds = load_dataset(&config).unwrap();
        assert_eq!(ds.source(), url);
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn http_error_status_is_reported() {
        let url = serve_once("HTTP/1.1 404 Not Found", "");
        let client = http_client(Duration::from_secs(5)).unwrap();
        assert!(matches!(fetch_csv(&client, &url), Err(LoadError::Status(404))));
    }

    #[test]
    fn cache_replaces_on_insert() {
        let mut cache = DatasetCache::new();
        assert!(cache.get("test://sample").is_none());

        let first = cache.insert(sample_dataset());
        let cached = cache.get("test://sample").unwrap();
        assert!(Arc::ptr_eq(&first, &cached));

        let second = cache.insert(sample_dataset());
        assert!(!Arc::ptr_eq(&first, &cache.get("test://sample").unwrap()));
        assert!(Arc::ptr_eq(&second, &cache.get("test://sample").unwrap()));
    }
}
