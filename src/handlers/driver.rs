use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Extension, Json};
use http::StatusCode;
use serde_json::json;

use crate::{handlers::middleware::DriverDataMemo, utils::state::AppState};

/// Always 200; a degraded snapshot carries `error`.
pub async fn get_driver(
    State(state): State<Arc<AppState>>,
    Extension(memo): Extension<DriverDataMemo>,
) -> impl IntoResponse {
    let driver = memo.resolve(&state.driver_stats).await;
    (StatusCode::OK, Json(driver)).into_response()
}

pub async fn get_home(
    State(state): State<Arc<AppState>>,
    Extension(memo): Extension<DriverDataMemo>,
) -> impl IntoResponse {
    let (driver, next_race, team_stats) = tokio::join!(
        memo.resolve(&state.driver_stats),
        state.bot_api.next_race(),
        state.bot_api.team_stats(),
    );
    (
        StatusCode::OK,
        Json(json!({
            "driver": driver,
            "nextRace": next_race,
            "teamStats": team_stats,
        })),
    )
        .into_response()
}
