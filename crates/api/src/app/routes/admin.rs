//! Operator endpoints: manual sweep and job listing.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::info;

use stockdate_infra::jobs::JobStore;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/stock-sweep", post(run_stock_sweep))
        .route("/jobs", get(list_jobs))
}

/// Run a sweep now, outside the schedule.
pub async fn run_stock_sweep(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    info!("manual stock sweep requested");
    match services.reconciler.sweep() {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_jobs(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.jobs.list() {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
    }
}
