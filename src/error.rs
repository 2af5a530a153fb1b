use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error as ThisError;

/// Rejections of caller input. Nothing is fetched or charted once one of
/// these is raised.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("select at least one company")]
    EmptySelection,

    #[error("unknown company: {0}")]
    UnknownCompany(String),

    #[error("day count {0} is outside 1..=50")]
    DaysOutOfRange(u32),

    #[error("invalid price range [{min}, {max}]")]
    InvalidPriceRange { min: f64, max: f64 },
}

/// Failures talking to the market-data provider, tagged with the ticker that
/// failed.
#[derive(ThisError, Debug)]
pub enum RetrievalError {
    #[error("request for {ticker} failed: {source}")]
    Http {
        ticker: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("provider answered {status} for {ticker}")]
    Status {
        ticker: String,
        status: reqwest::StatusCode,
    },

    #[error("provider error for {ticker}: {message}")]
    Provider { ticker: String, message: String },

    #[error("cannot decode response for {ticker}: {source}")]
    Decode {
        ticker: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum ReshapeError {
    #[error("row {company} has {found} cells, table has {expected} dates")]
    RaggedRow {
        company: String,
        expected: usize,
        found: usize,
    },
}

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Reshape(#[from] ReshapeError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Retrieval(_) => "retrieval",
            AppError::Reshape(_) => "reshape",
            AppError::Config(_) => "config",
            AppError::Server(_) => "server",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Retrieval(_) => StatusCode::BAD_GATEWAY,
            AppError::Reshape(_) | AppError::Config(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
