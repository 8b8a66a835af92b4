use axum::Router;

pub mod admin;
pub mod products;
pub mod stock_schedule;
pub mod system;

/// Router for every endpoint behind the optional admin token.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router().merge(stock_schedule::router()))
        .nest("/admin", admin::router())
}
