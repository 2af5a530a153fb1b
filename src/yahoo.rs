use crate::data_structures::{ClosePoint, Days, TradingDay};
use crate::error::RetrievalError;
use crate::retrieval::PriceSource;
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::{America::New_York, Tz};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// `chart` endpoint schema; only the fields we read are declared
#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Deserialize, Debug)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    pub meta: Option<ChartMeta>,
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub exchange_timezone_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    pub quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

/// Daily-history client for the Yahoo Finance chart API.
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(YahooClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, ticker: &str, days: Days) -> String {
        let tckr = ticker.to_uppercase();
        format!(
            "{}/v8/finance/chart/{tckr}?range={}d&interval=1d",
            self.base_url,
            days.get()
        )
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    #[instrument(skip(self, days), fields(days = days.get()))]
    async fn daily_closes(
        &self,
        ticker: &str,
        days: Days,
    ) -> Result<Vec<ClosePoint>, RetrievalError> {
        let url = self.url(ticker, days);
        let http_err = |source| RetrievalError::Http {
            ticker: ticker.to_string(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(http_err)?;
        let status = response.status();
        let body = response.text().await.map_err(http_err)?;
        debug!(%status, bytes = body.len(), "Received chart response");

        match serde_json::from_str::<ChartEnvelope>(&body) {
            Ok(envelope) => extract_closes(ticker, status, envelope),
            Err(_) if !status.is_success() => Err(RetrievalError::Status {
                ticker: ticker.to_string(),
                status,
            }),
            Err(source) => Err(RetrievalError::Decode {
                ticker: ticker.to_string(),
                source,
            }),
        }
    }
}

/// Pulls the closing series out of a chart envelope. Null closes are gaps and
/// are skipped. A non-2xx status is an error even when the body decodes.
pub fn extract_closes(
    ticker: &str,
    status: StatusCode,
    envelope: ChartEnvelope,
) -> Result<Vec<ClosePoint>, RetrievalError> {
    if let Some(error) = envelope.chart.error {
        return Err(RetrievalError::Provider {
            ticker: ticker.to_string(),
            message: format!("{}: {}", error.code, error.description),
        });
    }
    if !status.is_success() {
        return Err(RetrievalError::Status {
            ticker: ticker.to_string(),
            status,
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        warn!(ticker, "Chart response carried no result; treating as empty series");
        return Ok(Vec::new());
    };

    let tz: Tz = result
        .meta
        .and_then(|m| m.exchange_timezone_name)
        .and_then(|name| name.parse().ok())
        .unwrap_or(New_York);

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    if closes.len() != timestamps.len() {
        return Err(RetrievalError::Provider {
            ticker: ticker.to_string(),
            message: format!(
                "{} timestamps but {} closing prices",
                timestamps.len(),
                closes.len()
            ),
        });
    }

    let mut points = Vec::with_capacity(timestamps.len());
    for (timestamp, close) in timestamps.into_iter().zip(closes) {
        let Some(close) = close else { continue };
        let time =
            DateTime::from_timestamp(timestamp, 0).ok_or_else(|| RetrievalError::Provider {
                ticker: ticker.to_string(),
                message: format!("timestamp {} is out of range", timestamp),
            })?;
        points.push(ClosePoint {
            day: TradingDay(time.with_timezone(&tz).date_naive()),
            close,
        });
    }

    points.sort_by_key(|p| p.day);
    // Intraday bars on the current session can repeat the last day; keep the latest
    points.dedup_by(|later, earlier| {
        if later.day == earlier.day {
            earlier.close = later.close;
            true
        } else {
            false
        }
    });

    debug!(ticker, points = points.len(), "Extracted closing prices");
    Ok(points)
}
