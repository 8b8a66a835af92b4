//! Per-product stock schedule: the admin metabox and its save action.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Extension, Path},
    response::{Html, IntoResponse},
    routing::get,
};

use stockdate_infra::admin_form::FormSubmission;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id/stock-schedule", get(get_schedule).post(save_schedule))
        .route("/:id/stock-schedule/form", get(get_schedule_form))
}

/// Current directive plus a fresh form token.
pub async fn get_schedule(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.admin_form.render(product_id) {
        Ok(form) => Json(form).into_response(),
        Err(e) => errors::admin_form_error_to_response(e),
    }
}

pub async fn get_schedule_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.admin_form.render_html(product_id) {
        Ok(html) => Html(html).into_response(),
        Err(e) => errors::admin_form_error_to_response(e),
    }
}

/// A submission with a missing or bad token is answered with `saved: false`
/// and the unchanged directive.
pub async fn save_schedule(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Form(submission): Form<FormSubmission>,
) -> axum::response::Response {
    let product_id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.admin_form.save(product_id, &submission) {
        Ok(outcome) => Json(dto::SaveScheduleResponse {
            saved: outcome.was_saved(),
            directive: dto::DirectiveResponse::from(outcome.directive()),
        })
        .into_response(),
        Err(e) => errors::admin_form_error_to_response(e),
    }
}
