use std::net::SocketAddr;

use anyhow::Context;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use heightlines::GridError;
use heightlines::config::Settings;
use heightlines::report::Report;

#[derive(Deserialize)]
struct ContourRequest {
    /// Persisted grid state; damaged input goes through recovery.
    grid: Value,
    step: Option<f64>,
    grouping_decimals: Option<u32>,
    corner_tolerance: Option<f64>,
}

#[derive(Serialize)]
struct ContourResponse {
    report: Report,
    timings: Vec<TimingEntry>,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<GridError> for ApiError {
    fn from(e: GridError) -> Self {
        match e {
            GridError::InvalidArgument(_) | GridError::InvalidGrid(_) => {
                ApiError::BadRequest(e.to_string())
            }
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

async fn contour_handler(
    Json(req): Json<ContourRequest>,
) -> Result<Json<ContourResponse>, ApiError> {
    let defaults = Settings::default();
    let settings = Settings {
        step: req.step.unwrap_or(defaults.step),
        grouping_decimals: req.grouping_decimals.unwrap_or(defaults.grouping_decimals),
        corner_tolerance: req.corner_tolerance.unwrap_or(defaults.corner_tolerance),
        ..defaults
    };
    settings.validate()?;

    let grid = req.grid;
    let (report, timings) = tokio::task::spawn_blocking(move || heightlines::contour(&grid, &settings))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .inspect_err(|e| warn!("contour request failed: {e}"))?;

    info!(
        "contoured {}x{} grid, {} lines",
        report.width,
        report.height,
        report.line_count()
    );

    let timings = timings
        .iter()
        .map(|t| TimingEntry {
            name: t.name.to_string(),
            ms: t.ms,
        })
        .collect();

    Ok(Json(ContourResponse { report, timings }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/contours", post(contour_handler))
        .fallback_service(frontend)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("heightlines server at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
