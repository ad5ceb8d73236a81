use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    models::{
        error::Error,
        team::{RecruitmentForm, TeamRaceResult},
    },
    utils::{
        bot_api::{DEFAULT_RESULTS_LIMIT, DEFAULT_UPCOMING_LIMIT},
        race_utils::{format_race_date, format_race_date_time, position_label, time_until},
        state::AppState,
    },
};

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultView {
    #[serde(flatten)]
    result: TeamRaceResult,
    position_label: &'static str,
    race_date_label: String,
}

pub async fn get_next_race(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let race = state.bot_api.next_race().await;
    let countdown = race.as_ref().map(|r| time_until(&r.date, Utc::now()));
    let starts_at = race.as_ref().map(|r| format_race_date_time(&r.date));
    (
        StatusCode::OK,
        Json(json!({"race": race, "countdown": countdown, "startsAt": starts_at})),
    )
        .into_response()
}

pub async fn get_upcoming_races(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> impl IntoResponse {
    let races = state
        .bot_api
        .upcoming_races(query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT))
        .await;
    (StatusCode::OK, Json(json!({"races": races}))).into_response()
}

pub async fn get_results(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> impl IntoResponse {
    let results: Vec<ResultView> = state
        .bot_api
        .race_results(query.limit.unwrap_or(DEFAULT_RESULTS_LIMIT))
        .await
        .into_iter()
        .map(|result| ResultView {
            position_label: position_label(result.position),
            race_date_label: format_race_date(&result.race_date),
            result,
        })
        .collect();
    (StatusCode::OK, Json(json!({"results": results}))).into_response()
}

pub async fn get_roster(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let drivers = state.bot_api.roster().await;
    (StatusCode::OK, Json(json!({"drivers": drivers}))).into_response()
}

pub async fn get_team_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.bot_api.team_stats().await;
    (StatusCode::OK, Json(json!({"stats": stats}))).into_response()
}

pub async fn submit_recruitment(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RecruitmentForm>,
) -> Result<impl IntoResponse, Error> {
    if !form.has_required_fields() {
        return Err((StatusCode::BAD_REQUEST, "Please fill in all required fields").into());
    }
    let reply = state.bot_api.submit_recruitment(&form).await;
    Ok((StatusCode::OK, Json(reply)).into_response())
}
