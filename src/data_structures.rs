use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// --- Bounds of the user controls ---

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 50;
pub const DEFAULT_DAYS: u32 = 20;
pub const PRICE_FLOOR: f64 = 0.0;
pub const PRICE_CEILING: f64 = 3500.0;

// --- Ticker Registry ---

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyTicker {
    pub name: String,
    pub ticker: String,
}

/// Display name → ticker symbol, in display order. Hashable so a snapshot of
/// it can key the price table cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickerRegistry(pub Vec<CompanyTicker>);

impl TickerRegistry {
    pub fn from_pairs<N, T>(pairs: impl IntoIterator<Item = (N, T)>) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(name, ticker)| CompanyTicker {
                    name: name.into(),
                    ticker: ticker.into(),
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompanyTicker> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|c| c.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c.name == name)
    }

    /// Returns the first name that appears twice, if any.
    pub fn duplicate_name(&self) -> Option<&str> {
        self.0.iter().enumerate().find_map(|(i, c)| {
            self.0[..i]
                .iter()
                .any(|earlier| earlier.name == c.name)
                .then_some(c.name.as_str())
        })
    }
}

impl Default for TickerRegistry {
    fn default() -> Self {
        Self::from_pairs([
            ("apple", "AAPL"),
            ("facebook", "META"),
            ("google", "GOOGL"),
            ("microsoft", "MSFT"),
            ("netflix", "NFLX"),
            ("amazon", "AMZN"),
        ])
    }
}

pub fn default_selection() -> Vec<String> {
    ["google", "amazon", "facebook", "apple"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// --- Trading days and prices ---

/// A calendar day in the exchange's local time. Tables show it as
/// `05 March 2024`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradingDay(pub NaiveDate);

impl TradingDay {
    pub const DISPLAY_FORMAT: &'static str = "%d %B %Y";

    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for TradingDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::DISPLAY_FORMAT))
    }
}

impl Serialize for TradingDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClosePoint {
    pub day: TradingDay,
    pub close: f64,
}

// --- Validated control values ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Days(u32);

impl Days {
    pub fn new(days: u32) -> Result<Self, ValidationError> {
        if (MIN_DAYS..=MAX_DAYS).contains(&days) {
            Ok(Self(days))
        } else {
            Err(ValidationError::DaysOutOfRange(days))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for Days {
    fn default() -> Self {
        Self(DEFAULT_DAYS)
    }
}

/// Visual clip domain of the chart's price axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        let in_bounds = |v: f64| v.is_finite() && (PRICE_FLOOR..=PRICE_CEILING).contains(&v);
        if in_bounds(min) && in_bounds(max) && min <= max {
            Ok(Self { min, max })
        } else {
            Err(ValidationError::InvalidPriceRange { min, max })
        }
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: PRICE_FLOOR,
            max: PRICE_CEILING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl TickerRegistry {
        pub(crate) fn ticker_for(&self, name: &str) -> Option<&str> {
            self.0
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.ticker.as_str())
        }
    }

    #[test]
    fn test_trading_day_display_format() {
        let day = TradingDay(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(day.to_string(), "05 March 2024");
        assert_eq!(day.iso(), "2024-03-05");
        assert_eq!(serde_json::to_string(&day).unwrap(), "\"05 March 2024\"");
    }

    #[test]
    fn test_days_bounds() {
        assert!(Days::new(0).is_err());
        assert_eq!(Days::new(1).unwrap().get(), 1);
        assert_eq!(Days::new(50).unwrap().get(), 50);
        assert_eq!(Days::new(51), Err(ValidationError::DaysOutOfRange(51)));
        assert_eq!(Days::default().get(), 20);
    }

    #[test]
    fn test_price_range_bounds() {
        assert!(PriceRange::new(0.0, 3500.0).is_ok());
        assert!(PriceRange::new(100.0, 100.0).is_ok());
        assert!(PriceRange::new(200.0, 100.0).is_err());
        assert!(PriceRange::new(-1.0, 100.0).is_err());
        assert!(PriceRange::new(0.0, 3500.5).is_err());
        assert!(PriceRange::new(f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_registry_lookup_and_duplicates() {
        let registry = TickerRegistry::default();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.ticker_for("facebook"), Some("META"));
        assert!(registry.duplicate_name().is_none());

        let dup = TickerRegistry::from_pairs([("apple", "AAPL"), ("apple", "AAPL")]);
        assert_eq!(dup.duplicate_name(), Some("apple"));
    }
}
