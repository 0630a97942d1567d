use crate::error::LoadError;
use crate::model::PriceObservation;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// Something that can hand back the raw price log text.
pub trait PriceSource: Send {
    fn fetch_text(&self) -> Result<String, LoadError>;

    /// Where the data comes from, for log lines.
    fn describe(&self) -> String;
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceSource for FileSource {
    fn fetch_text(&self) -> Result<String, LoadError> {
        std::fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct HttpSource {
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl PriceSource for HttpSource {
    fn fetch_text(&self) -> Result<String, LoadError> {
        let response = reqwest::blocking::get(&self.url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// HTTP for `http://` and `https://` locations, a local file otherwise.
pub fn source_for(location: &str) -> Box<dyn PriceSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(location))
    } else {
        Box::new(FileSource::new(location))
    }
}

/// Runs the fetch on a worker thread. The receiver yields exactly one result.
pub fn spawn_load(source: Box<dyn PriceSource>) -> Receiver<Result<String, LoadError>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        log::info!("loading price data from {}", source.describe());
        let result = source.fetch_text();
        // the UI may already be gone
        let _ = tx.send(result);
    });
    rx
}

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parses the `date` column. Accepts `YYYY-MM-DD HH:MM:SS`, the ISO `T`
/// variant and a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Splits delimited text into observations, one per line after the header.
///
/// Columns are found by header name. There is no quoting: a delimiter inside
/// a value shifts the remaining columns, and short rows leave fields `None`.
pub fn parse_records(text: &str, delimiter: char) -> Vec<PriceObservation> {
    let mut lines = text.trim().lines();
    let header = match lines.next() {
        Some(h) if !h.trim().is_empty() => h,
        _ => return Vec::new(),
    };

    let headers: Vec<&str> = header.split(delimiter).map(str::trim).collect();
    let column = |name: &str| headers.iter().position(|h| *h == name);
    let (date_col, product_col, price_col) = (column("date"), column("product"), column("price"));

    if date_col.is_none() || product_col.is_none() || price_col.is_none() {
        log::warn!("header '{}' lacks one of date, product, price", header.trim());
    }

    let records: Vec<PriceObservation> = lines
        .map(|line| {
            let values: Vec<&str> = line.split(delimiter).map(str::trim).collect();
            let field = |col: Option<usize>| col.and_then(|i| values.get(i)).map(|v| v.to_string());

            let date = field(date_col);
            let timestamp = date.as_deref().and_then(parse_timestamp);
            PriceObservation {
                product: field(product_col),
                date,
                timestamp,
                price: field(price_col),
            }
        })
        .collect();

    let short = records
        .iter()
        .filter(|r| r.product.is_none() || r.date.is_none() || r.price.is_none())
        .count();
    if short > 0 {
        log::debug!("{} of {} rows are missing fields", short, records.len());
    }

    records
}

/// Stable ascending sort by timestamp; rows without one go first.
pub fn sort_by_timestamp(records: &mut [PriceObservation]) {
    records.sort_by_key(|r| r.timestamp);
}
