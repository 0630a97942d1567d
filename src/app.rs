use crate::chart::chart_config;
use crate::config::AppConfig;
use crate::error::LoadError;
use crate::loader::{parse_records, sort_by_timestamp};
use crate::model::{ChartConfig, FilterEntry, PriceObservation, Selection, SeriesColor, TableRow};
use crate::stats::{distinct_products, latest_prices, table_rows};

pub const ALL_PRODUCTS_LABEL: &str = "All Products";

/// The chart currently on screen. `revision` counts in-place updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartHandle {
    pub config: ChartConfig,
    pub revision: u32,
}

pub struct LoadedData {
    /// Sorted ascending by timestamp.
    pub records: Vec<PriceObservation>,
    pub table: Vec<TableRow>,
    pub filter: Vec<FilterEntry>,
    pub selection: Selection,
}

pub enum LoadState {
    Unloaded { failed: bool },
    Loaded(LoadedData),
}

/// Drives load -> table/filter/chart and re-renders on selection change.
pub struct Orchestrator {
    config: AppConfig,
    palette: Vec<SeriesColor>,
    state: LoadState,
    current_chart: Option<ChartHandle>,
}

impl Orchestrator {
    pub fn new(config: AppConfig) -> Self {
        let palette = config.series_palette();
        Self {
            config,
            palette,
            state: LoadState::Unloaded { failed: false },
            current_chart: None,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    pub fn chart(&self) -> Option<&ChartHandle> {
        self.current_chart.as_ref()
    }

    /// Consumes the single fetch result. Failures are logged and leave
    /// nothing rendered.
    pub fn on_load(&mut self, result: Result<String, LoadError>) {
        if self.is_loaded() {
            log::warn!("price data already loaded, ignoring another load result");
            return;
        }

        let text = match result {
            Ok(text) => text,
            Err(e) => {
                log::error!("error fetching or parsing price data: {}", e);
                self.state = LoadState::Unloaded { failed: true };
                return;
            }
        };

        let mut records = parse_records(&text, self.config.delimiter);
        sort_by_timestamp(&mut records);

        let latest = latest_prices(&records, self.config.latest_policy);
        let table = table_rows(&latest);
        let products = distinct_products(&records);

        let selection = products
            .first()
            .map(|p| Selection::Product(p.clone()))
            .unwrap_or(Selection::All);

        let filter = std::iter::once(FilterEntry {
            selection: Selection::All,
            label: ALL_PRODUCTS_LABEL.to_string(),
        })
        .chain(products.into_iter().map(|p| FilterEntry {
            selection: Selection::Product(p.clone()),
            label: p,
        }))
        .collect();

        log::info!(
            "loaded {} records, {} products in table",
            records.len(),
            table.len()
        );

        self.state = LoadState::Loaded(LoadedData {
            records,
            table,
            filter,
            selection,
        });
        self.render();
    }

    /// Selection change from the product filter. Re-renders the chart only.
    pub fn select(&mut self, selection: Selection) {
        let LoadState::Loaded(data) = &mut self.state else {
            log::debug!("selection change before load ignored");
            return;
        };
        data.selection = selection;
        self.render();
    }

    fn render(&mut self) {
        let LoadState::Loaded(data) = &self.state else {
            return;
        };

        let config = chart_config(
            &data.records,
            &data.selection,
            &self.palette,
            &self.config.time_axis,
            &self.config.value_axis_label,
        );
        log::debug!(
            "rendering {:?}: {} series, axis {:.2}..{:.2}",
            data.selection,
            config.datasets.len(),
            config.value_axis.min,
            config.value_axis.max
        );

        match &mut self.current_chart {
            Some(chart) => {
                chart.config = config;
                chart.revision += 1;
            }
            None => self.current_chart = Some(ChartHandle { config, revision: 0 }),
        }
    }
}
