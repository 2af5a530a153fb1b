use crate::data_structures::{ClosePoint, Days, TickerRegistry};
use crate::error::RetrievalError;
use crate::table::PriceTable;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Anything that can answer "daily closes for this ticker over the last N
/// days".
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn daily_closes(
        &self,
        ticker: &str,
        days: Days,
    ) -> Result<Vec<ClosePoint>, RetrievalError>;
}

/// Fetches every registry entry in order and assembles the wide table. The
/// first failing ticker aborts the whole table.
#[instrument(skip(source, days, registry), fields(days = days.get(), tickers = registry.len()))]
pub async fn fetch_price_table(
    source: &dyn PriceSource,
    days: Days,
    registry: &TickerRegistry,
) -> Result<PriceTable, RetrievalError> {
    let mut series = Vec::with_capacity(registry.len());
    for company in registry.iter() {
        let points = source.daily_closes(&company.ticker, days).await?;
        debug!(
            company = %company.name,
            ticker = %company.ticker,
            points = points.len(),
            "Fetched closing prices"
        );
        series.push((company.name.clone(), points));
    }

    let table = PriceTable::from_series(series);
    info!(rows = table.rows.len(), dates = table.dates.len(), "Built price table");
    Ok(table)
}

pub type CacheKey = (Days, TickerRegistry);

/// Memoized price tables keyed by (day count, registry snapshot). Entries are
/// never evicted; [`PriceTableCache::refresh`] overwrites one.
#[derive(Clone)]
pub struct PriceTableCache {
    source: Arc<dyn PriceSource>,
    entries: Arc<Mutex<HashMap<CacheKey, Arc<PriceTable>>>>,
}

impl PriceTableCache {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self {
            source,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get_or_fetch(
        &self,
        days: Days,
        registry: &TickerRegistry,
    ) -> Result<Arc<PriceTable>, RetrievalError> {
        let key = (days, registry.clone());
        if let Some(table) = self.entries.lock().await.get(&key) {
            debug!(days = days.get(), "Price table cache hit");
            return Ok(table.clone());
        }

        debug!(days = days.get(), "Price table cache miss");
        self.fetch_and_store(key).await
    }

    /// Bypasses any cached entry and replaces it with a fresh fetch.
    pub async fn refresh(
        &self,
        days: Days,
        registry: &TickerRegistry,
    ) -> Result<Arc<PriceTable>, RetrievalError> {
        info!(days = days.get(), "Refreshing price table");
        self.fetch_and_store((days, registry.clone())).await
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    // Lock is released while the provider is being called
    async fn fetch_and_store(&self, key: CacheKey) -> Result<Arc<PriceTable>, RetrievalError> {
        let table = Arc::new(fetch_price_table(self.source.as_ref(), key.0, &key.1).await?);
        self.entries.lock().await.insert(key, table.clone());
        Ok(table)
    }
}
