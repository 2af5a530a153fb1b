use crate::dashboard::{Dashboard, DashboardRequest, DashboardResponse};
use crate::data_structures::{CompanyTicker, Days};
use crate::error::Result;
use crate::page;
use crate::table::PriceTable;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use axum_extra::extract::Query;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Query form of [`DashboardRequest`]. `companies` may repeat; a lone empty
/// `companies=` means "nothing selected", absence means "use the defaults".
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub days: Option<u32>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub companies: Vec<String>,
    #[serde(default)]
    pub refresh: bool,
}

impl From<DashboardQuery> for DashboardRequest {
    fn from(query: DashboardQuery) -> Self {
        let companies = if query.companies.is_empty() {
            None
        } else {
            Some(
                query
                    .companies
                    .into_iter()
                    .filter(|c| !c.trim().is_empty())
                    .collect(),
            )
        };
        DashboardRequest {
            days: query.days,
            price_min: query.min,
            price_max: query.max,
            companies,
            refresh: query.refresh,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PricesQuery {
    pub days: Option<u32>,
    #[serde(default)]
    pub refresh: bool,
}

#[instrument(skip(state))]
pub async fn dashboard_handler(
    State(state): State<Dashboard>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>> {
    debug!("Received dashboard request");
    respond(&state, query.into()).await
}

#[instrument(skip(state))]
pub async fn dashboard_post_handler(
    State(state): State<Dashboard>,
    Json(request): Json<DashboardRequest>,
) -> Result<Json<DashboardResponse>> {
    debug!("Received dashboard request body");
    respond(&state, request).await
}

async fn respond(state: &Dashboard, request: DashboardRequest) -> Result<Json<DashboardResponse>> {
    match state.handle(request).await {
        Ok(response) => {
            info!(selected = ?response.selected, days = response.days.get(), "Returning dashboard");
            Ok(Json(response))
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "Dashboard request failed");
            Err(e)
        }
    }
}

#[instrument(skip(state))]
pub async fn get_prices_handler(
    State(state): State<Dashboard>,
    Query(query): Query<PricesQuery>,
) -> Result<Json<PriceTable>> {
    let days = match query.days {
        Some(d) => Days::new(d)?,
        None => state.default_days(),
    };
    let table = state.price_table(days, query.refresh).await?;
    info!(days = days.get(), rows = table.rows.len(), "Returning price table");
    Ok(Json(table.as_ref().clone()))
}

#[instrument(skip(state))]
pub async fn get_companies_handler(State(state): State<Dashboard>) -> Json<Vec<CompanyTicker>> {
    let companies: Vec<CompanyTicker> = state.registry().iter().cloned().collect();
    debug!(company_count = companies.len(), "Returning ticker registry");
    Json(companies)
}

pub async fn index_handler(State(state): State<Dashboard>) -> Html<String> {
    Html(page::render(state.registry(), state.default_days(), state.default_companies()))
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
