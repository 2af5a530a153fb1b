use crate::data_structures::PriceRange;
use crate::table::{LongRecord, VALUE_LABEL};
use serde_json::{json, Value};

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
const LINE_OPACITY: f64 = 0.8;

/// Vega-Lite line chart of price over time, one series per company.
///
/// Prices outside `range` stay in the data and are clipped visually by the
/// mark. Dates are written as ISO days so the temporal scale parses them
/// without locale guessing.
pub fn line_chart(records: &[LongRecord], range: PriceRange) -> Value {
    let values: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "Date": r.date.iso(),
                "Name": r.name,
                VALUE_LABEL: r.price,
            })
        })
        .collect();

    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "width": "container",
        "data": { "values": values },
        "mark": { "type": "line", "opacity": LINE_OPACITY, "clip": true },
        "encoding": {
            "x": { "field": "Date", "type": "temporal" },
            "y": {
                "field": VALUE_LABEL,
                "type": "quantitative",
                "stack": null,
                "scale": { "domain": [range.min, range.max] },
            },
            "color": { "field": "Name", "type": "nominal" },
        },
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data_structures::TradingDay;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    /// Distinct series names present in a chart's inline data.
    pub(crate) fn series_names(chart: &Value) -> BTreeSet<String> {
        chart["data"]["values"]
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v["Name"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn record(d: u32, name: &str, price: Option<f64>) -> LongRecord {
        LongRecord {
            date: TradingDay(NaiveDate::from_ymd_opt(2024, 3, d).unwrap()),
            name: name.to_string(),
            price,
        }
    }

    #[test]
    fn test_chart_encoding() {
        let records = vec![
            record(4, "google", Some(133.0)),
            record(4, "amazon", Some(4000.0)),
            record(5, "google", None),
        ];
        let chart = line_chart(&records, PriceRange::new(100.0, 200.0).unwrap());

        assert_eq!(chart["mark"]["type"], "line");
        assert_eq!(chart["mark"]["opacity"], 0.8);
        assert_eq!(chart["mark"]["clip"], true);
        assert_eq!(chart["encoding"]["x"]["type"], "temporal");
        assert_eq!(chart["encoding"]["y"]["field"], "Stock Prices(USD)");
        assert!(chart["encoding"]["y"]["stack"].is_null());
        assert_eq!(chart["encoding"]["y"]["scale"]["domain"], json!([100.0, 200.0]));
        assert_eq!(chart["encoding"]["color"]["field"], "Name");

        // out-of-range prices are clipped, not dropped
        let values = chart["data"]["values"].as_array().unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[1]["Stock Prices(USD)"], 4000.0);
        assert_eq!(values[0]["Date"], "2024-03-04");
        assert!(values[2]["Stock Prices(USD)"].is_null());
    }

    #[test]
    fn test_series_names() {
        let records = vec![
            record(4, "google", Some(1.0)),
            record(4, "amazon", Some(2.0)),
            record(5, "google", Some(3.0)),
        ];
        let chart = line_chart(&records, PriceRange::default());
        let names: Vec<_> = series_names(&chart).into_iter().collect();
        assert_eq!(names, vec!["amazon", "google"]);
    }
}
