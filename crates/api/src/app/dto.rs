use serde::{Deserialize, Serialize};

use stockdate_core::{AggregateRoot, ProductId};
use stockdate_products::{Product, StockDirective, StockStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetStockStatusRequest {
    pub stock_status: StockStatus,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub stock_status: StockStatus,
    pub version: u64,
}

impl From<&Product> for ProductResponse {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id_typed(),
            sku: p.sku().to_string(),
            name: p.name().to_string(),
            stock_status: p.stock_status(),
            version: p.version(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DirectiveResponse {
    pub target_date: String,
    pub enabled: bool,
}

impl From<&StockDirective> for DirectiveResponse {
    fn from(d: &StockDirective) -> Self {
        Self {
            target_date: d
                .target_date
                .as_ref()
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            enabled: d.enabled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveScheduleResponse {
    pub saved: bool,
    pub directive: DirectiveResponse,
}
