//! Wide and long views of closing prices.
//!
//! The wide [`PriceTable`] has one row per company and one column per trading
//! day. [`PriceTable::melt`] turns it into [`LongRecord`]s, one per cell, which
//! is what the chart consumes.

use crate::data_structures::{ClosePoint, TradingDay};
use crate::error::{ReshapeError, ValidationError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Label of the price column in the long table and on the chart's y axis.
pub const VALUE_LABEL: &str = "Stock Prices(USD)";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceRow {
    pub name: String,
    /// Aligned with [`PriceTable::dates`]; `None` marks a gap in the series.
    pub prices: Vec<Option<f64>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PriceTable {
    pub dates: Vec<TradingDay>,
    pub rows: Vec<PriceRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LongRecord {
    #[serde(rename = "Date")]
    pub date: TradingDay,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Stock Prices(USD)")]
    pub price: Option<f64>,
}

impl PriceTable {
    /// Builds the wide table from per-company series. Columns are the sorted
    /// union of every series' days; rows keep the order they were given in.
    pub fn from_series(series: Vec<(String, Vec<ClosePoint>)>) -> Self {
        let dates: Vec<TradingDay> = series
            .iter()
            .flat_map(|(_, points)| points.iter().map(|p| p.day))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = series
            .into_iter()
            .map(|(name, points)| {
                let by_day: BTreeMap<TradingDay, f64> =
                    points.into_iter().map(|p| (p.day, p.close)).collect();
                PriceRow {
                    name,
                    prices: dates.iter().map(|d| by_day.get(d).copied()).collect(),
                }
            })
            .collect();

        Self { dates, rows }
    }

    pub fn names(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.name.clone()).collect()
    }

    pub fn row(&self, name: &str) -> Option<&PriceRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn cell_count(&self) -> usize {
        self.rows.len() * self.dates.len()
    }

    /// Projects the table onto `selection`, sorted by company name. Repeated
    /// names collapse to one row.
    pub fn select(&self, selection: &[String]) -> Result<PriceTable, ValidationError> {
        if selection.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        let wanted: BTreeSet<&str> = selection.iter().map(String::as_str).collect();
        let mut rows = Vec::with_capacity(wanted.len());
        for name in wanted {
            let row = self
                .row(name)
                .ok_or_else(|| ValidationError::UnknownCompany(name.to_string()))?;
            rows.push(row.clone());
        }

        Ok(PriceTable {
            dates: self.dates.clone(),
            rows,
        })
    }

    /// Wide → long. Emits one record per cell, date-major, so the record
    /// count is always `rows × dates`.
    pub fn melt(&self) -> Result<Vec<LongRecord>, ReshapeError> {
        for row in &self.rows {
            if row.prices.len() != self.dates.len() {
                return Err(ReshapeError::RaggedRow {
                    company: row.name.clone(),
                    expected: self.dates.len(),
                    found: row.prices.len(),
                });
            }
        }

        let mut records = Vec::with_capacity(self.cell_count());
        for (col, date) in self.dates.iter().enumerate() {
            for row in &self.rows {
                records.push(LongRecord {
                    date: *date,
                    name: row.name.clone(),
                    price: row.prices[col],
                });
            }
        }
        Ok(records)
    }
}
