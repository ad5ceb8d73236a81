use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::IntoResponse};
use tokio::sync::OnceCell;

use crate::{models::driver::DriverData, utils::driver_stats::DriverStatsProvider};

/// Resolves driver data at most once per request; every handler or helper
/// that reads it within the same request sees the same snapshot.
#[derive(Clone, Default)]
pub struct DriverDataMemo(Arc<OnceCell<DriverData>>);

impl DriverDataMemo {
    pub async fn resolve(&self, provider: &DriverStatsProvider) -> DriverData {
        self.0
            .get_or_init(|| provider.get_driver_data())
            .await
            .clone()
    }
}

pub async fn driver_memo_middleware(mut req: Request, next: Next) -> impl IntoResponse {
    req.extensions_mut().insert(DriverDataMemo::default());
    next.run(req).await
}
