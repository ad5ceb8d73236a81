use std::sync::Arc;

use axum::{middleware::from_fn, routing::get, Router};

use crate::handlers::{
    driver::{get_driver, get_home},
    middleware::driver_memo_middleware,
};
use crate::utils::state::AppState;

pub fn driver_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/driver", get(get_driver))
        .route("/home", get(get_home))
        .layer(from_fn(driver_memo_middleware))
}
