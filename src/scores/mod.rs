use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scores", post(handlers::submit_score))
        .route("/scores/:game", get(handlers::game_leaderboard))
        .route("/user/scores", get(handlers::my_scores))
}
