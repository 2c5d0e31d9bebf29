use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::AuthUser,
    error::internal,
    games::Game,
    state::AppState,
};

use super::dto::{LeaderboardEntry, ScoreResponse, SubmitScoreRequest};

/// Leaderboards are capped; history queries are not.
pub const LEADERBOARD_LIMIT: i64 = 100;

#[instrument(skip(state, payload))]
pub async fn submit_score(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SubmitScoreRequest>,
) -> Result<Json<ScoreResponse>, (StatusCode, String)> {
    let game: Game = payload.game.parse().map_err(|e: crate::games::UnknownGame| {
        warn!(user_id = %user_id, game = %e.0, "score for unknown game");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    if payload.score < 0 {
        warn!(user_id = %user_id, score = payload.score, "negative score rejected");
        return Err((StatusCode::BAD_REQUEST, "score must be non-negative".into()));
    }

    let record = state
        .store
        .create_score(user_id, game, payload.score)
        .await
        .map_err(internal)?;

    info!(
        user_id = %user_id,
        game = %record.game,
        score = record.score,
        "score recorded"
    );
    Ok(Json(record.into()))
}

#[instrument(skip(state))]
pub async fn game_leaderboard(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(game): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>, (StatusCode, String)> {
    let game: Game = game.parse().map_err(|e: crate::games::UnknownGame| {
        warn!(game = %e.0, "leaderboard for unknown game");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let rows = state
        .store
        .game_leaderboard(game, LEADERBOARD_LIMIT)
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn my_scores(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ScoreResponse>>, (StatusCode, String)> {
    let scores = state.store.user_scores(user_id).await.map_err(internal)?;
    Ok(Json(scores.into_iter().map(Into::into).collect()))
}
