//! Products domain module.
//!
//! Business rules for catalog products and their scheduled out-of-stock
//! directives, implemented purely as deterministic domain logic (no IO, no
//! HTTP, no storage).

pub mod directive;
pub mod product;
pub mod sanitize;

pub use directive::{DateInputPolicy, DirectiveDecision, StockDirective, TargetDate};
pub use product::{
    ChangeSource, CreateProduct, MarkOutOfStock, Product, ProductCommand, ProductCreated,
    ProductEvent, SetStockStatus, StockStatus, StockStatusChanged,
};
pub use sanitize::sanitize_text_field;
