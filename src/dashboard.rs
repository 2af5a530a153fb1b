use crate::chart;
use crate::config::AppConfig;
use crate::data_structures::{Days, PriceRange, TickerRegistry};
use crate::error::{Result, ValidationError};
use crate::retrieval::PriceTableCache;
use crate::table::PriceTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

pub const TITLE: &str = "US Stock Price Visualizer";
pub const INSTRUCTIONS: &str = "Closing prices of large US technology companies. \
Choose how many trading days to show, narrow the price axis, and pick the companies to compare.";

/// One interaction with the dashboard. Absent fields fall back to the
/// configured defaults; an explicitly empty `companies` list is a
/// validation error.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DashboardRequest {
    pub days: Option<u32>,
    #[serde(rename = "min")]
    pub price_min: Option<f64>,
    #[serde(rename = "max")]
    pub price_max: Option<f64>,
    pub companies: Option<Vec<String>>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct DashboardResponse {
    pub title: &'static str,
    pub instructions: &'static str,
    pub heading: String,
    pub days: Days,
    pub price_range: PriceRange,
    /// Every company the table offers, in registry order.
    pub companies: Vec<String>,
    pub selected: Vec<String>,
    pub table: PriceTable,
    pub chart: Value,
}

/// Answers dashboard requests against one registry and one cache.
#[derive(Clone)]
pub struct Dashboard {
    registry: Arc<TickerRegistry>,
    default_days: Days,
    default_companies: Vec<String>,
    cache: PriceTableCache,
}

impl Dashboard {
    pub fn new(config: &AppConfig, cache: PriceTableCache) -> Self {
        Self {
            registry: config.registry.clone(),
            default_days: config.default_days,
            default_companies: config.default_companies.clone(),
            cache,
        }
    }

    pub fn registry(&self) -> &TickerRegistry {
        &self.registry
    }

    pub fn default_days(&self) -> Days {
        self.default_days
    }

    pub fn default_companies(&self) -> &[String] {
        &self.default_companies
    }

    pub async fn price_table(&self, days: Days, refresh: bool) -> Result<Arc<PriceTable>> {
        let table = if refresh {
            self.cache.refresh(days, &self.registry).await?
        } else {
            self.cache.get_or_fetch(days, &self.registry).await?
        };
        Ok(table)
    }

    // Must run before any provider call
    fn check_selection(&self, selection: &[String]) -> std::result::Result<(), ValidationError> {
        if selection.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        match selection.iter().find(|name| !self.registry.contains(name)) {
            Some(unknown) => Err(ValidationError::UnknownCompany(unknown.clone())),
            None => Ok(()),
        }
    }

    /// Runs the whole pipeline: validate controls, retrieve (memoized),
    /// select, reshape, chart.
    #[instrument(skip(self, request), fields(days = ?request.days, refresh = request.refresh))]
    pub async fn handle(&self, request: DashboardRequest) -> Result<DashboardResponse> {
        let days = match request.days {
            Some(d) => Days::new(d)?,
            None => self.default_days,
        };
        let defaults = PriceRange::default();
        let price_range = PriceRange::new(
            request.price_min.unwrap_or(defaults.min),
            request.price_max.unwrap_or(defaults.max),
        )?;
        let selection = request
            .companies
            .unwrap_or_else(|| self.default_companies.clone());
        self.check_selection(&selection)?;

        let full = self.price_table(days, request.refresh).await?;

        // The raw table ignores the price range; only the chart is clipped
        let table = full.select(&selection)?;
        let records = table.melt()?;
        let chart = chart::line_chart(&records, price_range);

        info!(
            selected = table.rows.len(),
            dates = table.dates.len(),
            records = records.len(),
            "Rendered dashboard"
        );

        Ok(DashboardResponse {
            title: TITLE,
            instructions: INSTRUCTIONS,
            heading: format!("Stock prices over the past {} days", days.get()),
            days,
            price_range,
            companies: full.names(),
            selected: table.names(),
            table,
            chart,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::retrieval::tests::FakeSource;
    use std::collections::BTreeSet;

    fn dashboard_with(registry: TickerRegistry, defaults: &[&str]) -> (Dashboard, Arc<FakeSource>) {
        let source = Arc::new(FakeSource::new());
        let config = AppConfig {
            registry: Arc::new(registry),
            default_companies: defaults.iter().map(|s| s.to_string()).collect(),
            ..AppConfig::default()
        };
        (Dashboard::new(&config, PriceTableCache::new(source.clone())), source)
    }

    fn three_company_dashboard() -> (Dashboard, Arc<FakeSource>) {
        dashboard_with(
            TickerRegistry::from_pairs([
                ("google", "GOOGL"),
                ("amazon", "AMZN"),
                ("apple", "AAPL"),
            ]),
            &["google", "amazon", "apple"],
        )
    }

    fn companies(names: &[&str]) -> Option<Vec<String>> {
        Some(names.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_two_company_selection_with_defaults() {
        let (dashboard, _) = three_company_dashboard();
        let response = dashboard
            .handle(DashboardRequest {
                days: Some(20),
                companies: companies(&["google", "amazon"]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(response.table.rows.len(), 2);
        assert_eq!(response.selected, vec!["amazon", "google"]);
        assert_eq!(response.companies, vec!["google", "amazon", "apple"]);
        assert_eq!(response.table.dates.len(), 20);

        let series = chart::tests::series_names(&response.chart);
        let expected: BTreeSet<String> =
            ["google", "amazon"].iter().map(|s| s.to_string()).collect();
        assert_eq!(series, expected);
        assert_eq!(
            response.chart["encoding"]["y"]["scale"]["domain"],
            serde_json::json!([0.0, 3500.0])
        );
        assert_eq!(response.chart["data"]["values"].as_array().unwrap().len(), 40);
    }

    #[tokio::test]
    async fn test_empty_selection_is_validation_error() {
        let (dashboard, _) = three_company_dashboard();
        let err = dashboard
            .handle(DashboardRequest {
                companies: Some(Vec::new()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::EmptySelection)));
    }

    #[tokio::test]
    async fn test_selection_is_validated_before_fetching() {
        let (broken, source) =
            dashboard_with(TickerRegistry::from_pairs([("broken", "FAIL")]), &["broken"]);

        let err = broken
            .handle(DashboardRequest {
                companies: Some(Vec::new()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::EmptySelection)));

        let err = broken
            .handle(DashboardRequest {
                companies: companies(&["tesla"]),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::UnknownCompany(ref name)) if name == "tesla"
        ));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_selection_uses_configured_default() {
        let (dashboard, _) = three_company_dashboard();
        let response = dashboard.handle(DashboardRequest::default()).await.unwrap();
        assert_eq!(response.selected, vec!["amazon", "apple", "google"]);
        assert_eq!(response.days.get(), 20);
    }

    #[tokio::test]
    async fn test_price_range_only_clips_chart() {
        let (dashboard, _) = three_company_dashboard();
        let wide = dashboard
            .handle(DashboardRequest {
                days: Some(5),
                companies: companies(&["apple"]),
                ..Default::default()
            })
            .await
            .unwrap();
        let narrow = dashboard
            .handle(DashboardRequest {
                days: Some(5),
                price_min: Some(0.0),
                price_max: Some(10.0),
                companies: companies(&["apple"]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(wide.table, narrow.table);
        assert_eq!(wide.chart["data"], narrow.chart["data"]);
        assert_eq!(
            narrow.chart["encoding"]["y"]["scale"]["domain"],
            serde_json::json!([0.0, 10.0])
        );
    }

    #[tokio::test]
    async fn test_controls_are_validated_before_fetching() {
        let (dashboard, source) = three_company_dashboard();

        let err = dashboard
            .handle(DashboardRequest { days: Some(0), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::DaysOutOfRange(0))));

        let err = dashboard
            .handle(DashboardRequest {
                price_min: Some(500.0),
                price_max: Some(100.0),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::InvalidPriceRange { .. })));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_company_and_retrieval_failure_are_distinct() {
        let (dashboard, _) = three_company_dashboard();
        let err = dashboard
            .handle(DashboardRequest {
                companies: companies(&["tesla"]),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::UnknownCompany(_))));

        let (broken, _) =
            dashboard_with(TickerRegistry::from_pairs([("broken", "FAIL")]), &["broken"]);
        let err = broken.handle(DashboardRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
    }

    #[tokio::test]
    async fn test_repeated_requests_reuse_cached_table() {
        let (dashboard, source) = three_company_dashboard();
        for min in [0.0, 50.0, 100.0] {
            dashboard
                .handle(DashboardRequest {
                    days: Some(10),
                    price_min: Some(min),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        assert_eq!(source.calls(), 3);

        dashboard
            .handle(DashboardRequest {
                days: Some(10),
                refresh: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(source.calls(), 6);
    }
}
