use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::games::Game;
use crate::storage::{GameScore, LeaderboardRow};

/// Request body for score submission. The game arrives as a string and is
/// parsed in the handler so an unknown name is a 400, not a decode error.
#[derive(Debug, Deserialize)]
pub struct SubmitScoreRequest {
    pub game: String,
    pub score: i64,
}

/// A stored score, as returned to the client.
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game: Game,
    pub score: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub played_at: OffsetDateTime,
}

impl From<GameScore> for ScoreResponse {
    fn from(s: GameScore) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            game: s.game,
            score: s.score,
            played_at: s.played_at,
        }
    }
}

/// One ranked leaderboard entry with the submitter's display name.
#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub score: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub played_at: OffsetDateTime,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(r: LeaderboardRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            username: r.username,
            score: r.score,
            played_at: r.played_at,
        }
    }
}
