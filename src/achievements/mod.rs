use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::internal,
    games::Game,
    state::AppState,
    storage::{Achievement, CriteriaKind},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/achievements", get(list_achievements))
}

#[derive(Debug, Serialize)]
pub struct AchievementCriteria {
    #[serde(rename = "type")]
    pub kind: CriteriaKind,
    pub value: i32,
}

#[derive(Debug, Serialize)]
pub struct AchievementResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub game: Game,
    pub criteria: AchievementCriteria,
}

impl From<Achievement> for AchievementResponse {
    fn from(a: Achievement) -> Self {
        Self {
            id: a.id,
            name: a.name,
            description: a.description,
            game: a.game,
            criteria: AchievementCriteria {
                kind: a.criteria_kind,
                value: a.criteria_value,
            },
        }
    }
}

#[instrument(skip(state))]
pub async fn list_achievements(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<AchievementResponse>>, (StatusCode, String)> {
    let achievements = state.store.list_achievements().await.map_err(internal)?;
    Ok(Json(achievements.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_serializes_with_type_key() {
        let response = AchievementResponse::from(Achievement {
            id: Uuid::new_v4(),
            name: "Snake Charmer".into(),
            description: "Score 100 in Snake".into(),
            game: Game::Snake,
            criteria_kind: CriteriaKind::Score,
            criteria_value: 100,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["criteria"]["type"], "score");
        assert_eq!(json["criteria"]["value"], 100);
        assert_eq!(json["game"], "snake");
    }
}
