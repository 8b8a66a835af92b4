use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use stockdate_core::ProductId;
use stockdate_infra::catalog::ProductCatalog;
use stockdate_products::{CreateProduct, ProductCommand, SetStockStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/stock-status", put(set_stock_status))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let product_id = ProductId::new();
    let cmd = ProductCommand::CreateProduct(CreateProduct {
        product_id,
        sku: body.sku,
        name: body.name,
        occurred_at: Utc::now(),
    });

    let committed = match services.dispatcher.dispatch(product_id, cmd) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": product_id.to_string(),
            "events_committed": committed.len(),
        })),
    )
        .into_response()
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let ids = match services.catalog.list_ids() {
        Ok(ids) => ids,
        Err(e) => return errors::catalog_error_to_response(e),
    };

    let mut products = Vec::with_capacity(ids.len());
    for id in ids {
        match services.catalog.load(id) {
            Ok(Some(p)) => products.push(dto::ProductResponse::from(&p)),
            // Deleted between listing and loading.
            Ok(None) => {}
            Err(e) => return errors::catalog_error_to_response(e),
        }
    }

    Json(products).into_response()
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.load(product_id) {
        Ok(Some(p)) => Json(dto::ProductResponse::from(&p)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn set_stock_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetStockStatusRequest>,
) -> axum::response::Response {
    let product_id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = ProductCommand::SetStockStatus(SetStockStatus {
        product_id,
        stock_status: body.stock_status,
        occurred_at: Utc::now(),
    });

    match services.dispatcher.dispatch(product_id, cmd) {
        Ok(committed) => Json(serde_json::json!({
            "id": product_id.to_string(),
            "stock_status": body.stock_status,
            "events_committed": committed.len(),
        }))
        .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
