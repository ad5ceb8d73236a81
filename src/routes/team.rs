use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::team::{
    get_next_race, get_results, get_roster, get_team_stats, get_upcoming_races,
    submit_recruitment,
};
use crate::utils::state::AppState;

pub fn team_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/races/next", get(get_next_race))
        .route("/races/upcoming", get(get_upcoming_races))
        .route("/results", get(get_results))
        .route("/roster", get(get_roster))
        .route("/stats", get(get_team_stats))
        .route("/recruitment", post(submit_recruitment))
}
