use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};

/// One data row of the price log. Fields are `None` when the row was
/// shorter than the header.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub product: Option<String>,
    pub date: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestPriceEntry {
    pub date: String,
    pub timestamp: Option<NaiveDateTime>,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub product: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection {
    All,
    Product(String),
}

impl Selection {
    pub fn matches(&self, product: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Product(p) => p == product,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    pub selection: Selection,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesColor(pub [u8; 3]);

impl SeriesColor {
    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(SeriesColor([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }
}

impl Serialize for SeriesColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Plotted line for one product. Points are `[epoch millis, price]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDataset {
    pub label: String,
    pub points: Vec<[f64; 2]>,
    pub color: SeriesColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    Month,
}

impl TimeUnit {
    /// Nominal length in milliseconds, used for grid spacing.
    pub fn millis(self) -> f64 {
        const HOUR: f64 = 3_600_000.0;
        match self {
            TimeUnit::Hour => HOUR,
            TimeUnit::Day => 24.0 * HOUR,
            TimeUnit::Week => 7.0 * 24.0 * HOUR,
            TimeUnit::Month => 30.0 * 24.0 * HOUR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    pub unit: TimeUnit,
    pub step: u32,
    pub label_format: String,
}

impl Default for TimeAxis {
    fn default() -> Self {
        TimeAxis {
            unit: TimeUnit::Day,
            step: 7,
            label_format: "%b %-d, %Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueAxis {
    pub min: f64,
    pub max: f64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TooltipMode {
    /// One value per series, taken at the x closest to the pointer.
    NearestAtSharedX,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tooltip {
    pub mode: TooltipMode,
    pub crosshair: bool,
}

/// Everything the chart widget needs for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub datasets: Vec<SeriesDataset>,
    pub time_axis: TimeAxis,
    pub value_axis: ValueAxis,
    pub tooltip: Tooltip,
}
