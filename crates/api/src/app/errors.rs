use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockdate_infra::{
    admin_form::AdminFormError, catalog::CatalogError, command_dispatcher::DispatchError,
};

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DispatchError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DispatchError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        DispatchError::Catalog(e) => catalog_error_to_response(e),
    }
}

pub fn admin_form_error_to_response(err: AdminFormError) -> axum::response::Response {
    match err {
        AdminFormError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        AdminFormError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AdminFormError::Meta(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        AdminFormError::Catalog(e) => catalog_error_to_response(e),
    }
}

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_product_id(raw: &str) -> Result<stockdate_core::ProductId, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"))
}
