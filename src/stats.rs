use crate::model::{AxisRange, LatestPriceEntry, PriceObservation, TableRow};
use crate::validate::{is_valid_price, parse_price};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Whether invalid prices are dropped before or after picking the latest
/// observation of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatestPolicy {
    /// Only valid prices can become latest.
    #[default]
    FilterFirst,
    /// Latest is picked from all rows; a product whose latest row is
    /// invalid gets no table row.
    AggregateThenFilter,
}

/// Latest observation per product, keyed in first-seen order.
///
/// Running max over `records` as given, so callers sort by timestamp first.
/// A strictly later timestamp replaces the entry; on a tie the row seen last
/// wins. Rows missing a product are skipped; under `FilterFirst` so are rows
/// without a valid price. Under `AggregateThenFilter` a row missing its price
/// still becomes latest, with an empty price that `table_rows` drops.
pub fn latest_prices(
    records: &[PriceObservation],
    policy: LatestPolicy,
) -> IndexMap<String, LatestPriceEntry> {
    let mut latest: IndexMap<String, LatestPriceEntry> = IndexMap::new();

    for record in records {
        let Some(product) = &record.product else {
            continue;
        };
        let price = record.price.as_deref().unwrap_or_default();
        if policy == LatestPolicy::FilterFirst && !is_valid_price(price) {
            continue;
        }

        let replace = match latest.get(product) {
            None => true,
            Some(current) => record.timestamp >= current.timestamp,
        };
        if replace {
            latest.insert(
                product.clone(),
                LatestPriceEntry {
                    date: record.date.clone().unwrap_or_default(),
                    timestamp: record.timestamp,
                    price: price.to_string(),
                },
            );
        }
    }

    latest
}

/// Summary table rows: products whose latest price is valid, price to 2 decimals.
pub fn table_rows(latest: &IndexMap<String, LatestPriceEntry>) -> Vec<TableRow> {
    latest
        .iter()
        .filter_map(|(product, entry)| {
            parse_price(&entry.price).map(|value| TableRow {
                product: product.clone(),
                price: format!("{:.2}", value),
            })
        })
        .collect()
}

/// Distinct product names in first-seen order.
pub fn distinct_products(records: &[PriceObservation]) -> Vec<String> {
    let seen: IndexSet<&str> = records.iter().filter_map(|r| r.product.as_deref()).collect();
    seen.into_iter().map(str::to_string).collect()
}

/// Value-axis bounds padded by 10% of the spread.
///
/// No prices gives `[0, 1]`. A constant series is padded by 0.1 when it is
/// zero and by 1 otherwise so the axis never collapses.
pub fn compute_range(prices: &[f64]) -> AxisRange {
    if prices.is_empty() {
        return AxisRange { min: 0.0, max: 1.0 };
    }

    let raw_min = Statistics::min(prices);
    let raw_max = Statistics::max(prices);

    let buffer = if raw_min == raw_max {
        if raw_min == 0.0 {
            0.1
        } else {
            1.0
        }
    } else {
        (raw_max - raw_min) * 0.1
    };

    AxisRange {
        min: raw_min - buffer,
        max: raw_max + buffer,
    }
}
