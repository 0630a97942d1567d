use crate::model::{
    AxisRange, ChartConfig, PriceObservation, Selection, SeriesColor, SeriesDataset, TimeAxis,
    Tooltip, TooltipMode, ValueAxis,
};
use crate::stats::compute_range;
use crate::validate::parse_price;
use chrono::{DateTime, NaiveDateTime};
use indexmap::IndexMap;

pub fn to_millis(timestamp: NaiveDateTime) -> f64 {
    timestamp.and_utc().timestamp_millis() as f64
}

/// Formats an x value (epoch millis) with a chrono format string.
pub fn format_time_label(millis: f64, format: &str) -> String {
    DateTime::from_timestamp_millis(millis as i64)
        .map(|t| t.naive_utc().format(format).to_string())
        .unwrap_or_default()
}

/// One dataset per product in `selection`, in first-seen order.
///
/// Only valid prices with a parseable date become points. Colors come from
/// `palette` by series position, so equal input always gets equal colors.
pub fn build_series(
    records: &[PriceObservation],
    selection: &Selection,
    palette: &[SeriesColor],
) -> Vec<SeriesDataset> {
    let mut groups: IndexMap<&str, Vec<&PriceObservation>> = IndexMap::new();
    for record in records {
        if let Some(product) = record.product.as_deref() {
            if selection.matches(product) {
                groups.entry(product).or_default().push(record);
            }
        }
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(index, (product, rows))| {
            let points = rows
                .iter()
                .filter_map(|r| {
                    let price = parse_price(r.price.as_deref()?)?;
                    Some([to_millis(r.timestamp?), price])
                })
                .collect();

            SeriesDataset {
                label: product.to_string(),
                points,
                color: palette_color(palette, index),
            }
        })
        .collect()
}

fn palette_color(palette: &[SeriesColor], index: usize) -> SeriesColor {
    if palette.is_empty() {
        return SeriesColor([0x80, 0x80, 0x80]);
    }
    palette[index % palette.len()]
}

/// Value-axis bounds over every valid price in `selection`, dated or not.
pub fn range_for(records: &[PriceObservation], selection: &Selection) -> AxisRange {
    let prices: Vec<f64> = records
        .iter()
        .filter(|r| r.product.as_deref().is_some_and(|p| selection.matches(p)))
        .filter_map(|r| parse_price(r.price.as_deref()?))
        .collect();
    compute_range(&prices)
}

/// Exact plot rectangle `([x_min, y_min], [x_max, y_max])` for a render.
///
/// y is the value axis as computed; x spans the plotted points, widened by
/// one time unit on each side when there are fewer than two distinct x values.
pub fn plot_bounds(config: &ChartConfig) -> ([f64; 2], [f64; 2]) {
    let xs = config.datasets.iter().flat_map(|d| d.points.iter().map(|p| p[0]));
    let (x_min, x_max) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
        (lo.min(x), hi.max(x))
    });

    let unit = config.time_axis.unit.millis();
    let (x_min, x_max) = if !x_min.is_finite() {
        (0.0, unit)
    } else if x_min == x_max {
        (x_min - unit, x_max + unit)
    } else {
        (x_min, x_max)
    };

    (
        [x_min, config.value_axis.min],
        [x_max, config.value_axis.max],
    )
}

pub fn chart_config(
    records: &[PriceObservation],
    selection: &Selection,
    palette: &[SeriesColor],
    time_axis: &TimeAxis,
    value_label: &str,
) -> ChartConfig {
    let datasets = build_series(records, selection, palette);
    let range = range_for(records, selection);

    ChartConfig {
        datasets,
        time_axis: time_axis.clone(),
        value_axis: ValueAxis {
            min: range.min,
            max: range.max,
            label: value_label.to_string(),
        },
        tooltip: Tooltip {
            mode: TooltipMode::NearestAtSharedX,
            crosshair: true,
        },
    }
}

/// For each dataset, the point whose x is nearest to `x`.
/// Datasets without points are left out.
pub fn nearest_at(datasets: &[SeriesDataset], x: f64) -> Vec<(&str, [f64; 2])> {
    datasets
        .iter()
        .filter_map(|d| {
            let point = d
                .points
                .iter()
                .min_by(|a, b| (a[0] - x).abs().total_cmp(&(b[0] - x).abs()))?;
            Some((d.label.as_str(), *point))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PALETTE;
    use crate::loader::{parse_records, sort_by_timestamp};

    const DATA: &str = "date,product,price\n\
        2024-01-01 08:00:00,Coffee,10\n\
        2024-01-01 08:00:00,Tea,4\n\
        2024-01-02 08:00:00,Coffee,broken\n\
        2024-01-03 08:00:00,Coffee,12\n\
        2024-01-03 08:00:00,Tea,5\n\
        2024-01-04 08:00:00,Milk,2\n";

    fn records() -> Vec<PriceObservation> {
        let mut records = parse_records(DATA, ',');
        sort_by_timestamp(&mut records);
        records
    }

    #[test]
    fn all_products_in_first_seen_order() {
        let series = build_series(&records(), &Selection::All, &DEFAULT_PALETTE);
        let labels: Vec<_> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Coffee", "Tea", "Milk"]);
        assert_eq!(series[0].color, DEFAULT_PALETTE[0]);
        assert_eq!(series[2].color, DEFAULT_PALETTE[2]);
    }

    #[test]
    fn invalid_prices_are_not_plotted() {
        let series = build_series(&records(), &Selection::Product("Coffee".into()), &DEFAULT_PALETTE);
        assert_eq!(series.len(), 1);
        let prices: Vec<f64> = series[0].points.iter().map(|p| p[1]).collect();
        assert_eq!(prices, vec![10.0, 12.0]);
        assert!(series[0].points[0][0] < series[0].points[1][0]);
    }

    #[test]
    fn colors_cycle_through_palette() {
        let palette = [SeriesColor([1, 1, 1]), SeriesColor([2, 2, 2])];
        let series = build_series(&records(), &Selection::All, &palette);
        assert_eq!(series[2].color, palette[0]);
    }

    #[test]
    fn repeated_builds_are_identical() {
        let data = records();
        let first = build_series(&data, &Selection::All, &DEFAULT_PALETTE);
        let second = build_series(&data, &Selection::All, &DEFAULT_PALETTE);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn undated_rows_are_not_plotted() {
        let data = parse_records("date,product,price\nsoon,A,3\n2024-01-01,A,4\n", ',');
        let series = build_series(&data, &Selection::All, &DEFAULT_PALETTE);
        assert_eq!(series[0].points.len(), 1);
        assert_eq!(series[0].points[0][1], 4.0);
    }

    #[test]
    fn range_ignores_invalid_prices() {
        let config = chart_config(
            &records(),
            &Selection::Product("Coffee".into()),
            &DEFAULT_PALETTE,
            &TimeAxis::default(),
            "Price",
        );
        assert!((config.value_axis.min - 9.8).abs() < 1e-9);
        assert!((config.value_axis.max - 12.2).abs() < 1e-9);
        assert_eq!(config.value_axis.label, "Price");
        assert!(config.tooltip.crosshair);
    }

    #[test]
    fn undated_valid_price_still_widens_range() {
        let data = parse_records(
            "date,product,price\n\
             2024-01-01,A,10\n\
             2024-01-02,A,12\n\
             soon,A,20\n\
             2024-01-03,B,1\n",
            ',',
        );
        let config = chart_config(
            &data,
            &Selection::Product("A".into()),
            &DEFAULT_PALETTE,
            &TimeAxis::default(),
            "Price",
        );

        assert_eq!(config.datasets[0].points.len(), 2);
        assert!((config.value_axis.min - 9.0).abs() < 1e-9);
        assert!((config.value_axis.max - 21.0).abs() < 1e-9);
    }

    #[test]
    fn plot_bounds_use_value_axis_exactly() {
        let config = chart_config(
            &parse_records("date,product,price\n2024-01-01,A,5\n2024-01-02,A,5\n", ','),
            &Selection::All,
            &DEFAULT_PALETTE,
            &TimeAxis::default(),
            "Price",
        );
        let (min, max) = plot_bounds(&config);

        assert_eq!((min[1], max[1]), (4.0, 6.0));
        assert_eq!(min[0], config.datasets[0].points[0][0]);
        assert_eq!(max[0], config.datasets[0].points[1][0]);
    }

    #[test]
    fn plot_bounds_widen_a_single_instant() {
        let config = chart_config(
            &parse_records("date,product,price\n2024-01-01,A,5\n", ','),
            &Selection::All,
            &DEFAULT_PALETTE,
            &TimeAxis::default(),
            "Price",
        );
        let (min, max) = plot_bounds(&config);
        let x = config.datasets[0].points[0][0];

        assert_eq!(min[0], x - 86_400_000.0);
        assert_eq!(max[0], x + 86_400_000.0);

        let empty = chart_config(&[], &Selection::All, &DEFAULT_PALETTE, &TimeAxis::default(), "Price");
        assert_eq!(plot_bounds(&empty), ([0.0, 0.0], [86_400_000.0, 1.0]));
    }

    #[test]
    fn nearest_point_per_series() {
        let series = build_series(&records(), &Selection::All, &DEFAULT_PALETTE);
        let jan_2 = series[0].points[0][0] + 86_400_000.0 * 1.2;
        let hits = nearest_at(&series, jan_2);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0], ("Coffee", series[0].points[1]));
        assert_eq!(hits[1].1[1], 5.0);
        assert_eq!(hits[2].0, "Milk");
    }

    #[test]
    fn time_labels_use_format() {
        let millis = to_millis(
            NaiveDateTime::parse_from_str("2024-03-05 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
        );
        assert_eq!(format_time_label(millis, "%b %-d, %Y"), "Mar 5, 2024");
    }
}
