//! # stockviz
//!
//! Daily closing prices of a fixed set of large US technology companies,
//! served as a small dashboard: the raw price table for a chosen subset and a
//! Vega-Lite line chart of price over time.
//!
//! The pipeline is fetch → reshape → filter → chart:
//! - [`retrieval`] pulls trailing-N-day closes per ticker (memoized per day
//!   count and registry),
//! - [`table`] holds the wide table and melts it into long records,
//! - [`chart`] turns long records into a Vega-Lite chart,
//! - [`dashboard`] ties one request to one response.

pub mod api;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod data_structures;
pub mod error;
pub mod page;
pub mod retrieval;
pub mod table;
pub mod yahoo;

use crate::config::GovernorSettings;
use crate::dashboard::Dashboard;
use crate::error::{AppError, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;

/// Builds the HTTP surface. With `governor` set, `/api` routes are limited
/// per client IP, which requires serving with connect info.
pub fn router(dashboard: Dashboard, governor: Option<&GovernorSettings>) -> Result<Router> {
    let mut api_routes = Router::new()
        .route("/companies", get(api::get_companies_handler))
        .route("/prices", get(api::get_prices_handler))
        .route(
            "/dashboard",
            get(api::dashboard_handler).post(api::dashboard_post_handler),
        );

    if let Some(settings) = governor {
        let governor_conf = GovernorConfigBuilder::default()
            .per_second(settings.per_second)
            .burst_size(settings.burst_size)
            .finish()
            .ok_or_else(|| AppError::Config("invalid governor settings".to_string()))?;
        api_routes = api_routes.layer(GovernorLayer::new(Arc::new(governor_conf)));
    }

    Ok(Router::new()
        .route("/", get(api::index_handler))
        .route("/health", get(api::health_handler))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(dashboard))
}
