use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::games::Game;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub achievements: Vec<Uuid>,
    pub friends: Vec<Uuid>,
    pub created_at: OffsetDateTime,
}

/// Fields required to create a user; everything else is store-assigned.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Server-side login session, keyed by the opaque cookie token.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

/// A stored score record.
#[derive(Debug, Clone)]
pub struct GameScore {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game: Game,
    pub score: i64,
    pub played_at: OffsetDateTime,
}

/// One leaderboard entry: a score annotated with its submitter's username.
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub score: i64,
    pub played_at: OffsetDateTime,
}

/// What an achievement is awarded for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaKind {
    Score,
    GamesPlayed,
    WinStreak,
}

impl CriteriaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriteriaKind::Score => "score",
            CriteriaKind::GamesPlayed => "games_played",
            CriteriaKind::WinStreak => "win_streak",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "score" => Some(CriteriaKind::Score),
            "games_played" => Some(CriteriaKind::GamesPlayed),
            "win_streak" => Some(CriteriaKind::WinStreak),
            _ => None,
        }
    }
}

/// Achievement catalog entry.
#[derive(Debug, Clone)]
pub struct Achievement {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub game: Game,
    pub criteria_kind: CriteriaKind,
    pub criteria_value: i32,
}

// The `game`/`criteria_type` columns are plain TEXT, so rows come out of
// sqlx as strings and are converted at the storage boundary.

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ScoreRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game: String,
    pub score: i64,
    pub played_at: OffsetDateTime,
}

impl TryFrom<ScoreRow> for GameScore {
    type Error = anyhow::Error;

    fn try_from(r: ScoreRow) -> Result<Self, Self::Error> {
        let game = r.game.parse::<Game>()?;
        Ok(GameScore {
            id: r.id,
            user_id: r.user_id,
            game,
            score: r.score,
            played_at: r.played_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AchievementRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub game: String,
    pub criteria_type: String,
    pub criteria_value: i32,
}

impl TryFrom<AchievementRow> for Achievement {
    type Error = anyhow::Error;

    fn try_from(r: AchievementRow) -> Result<Self, Self::Error> {
        let game = r.game.parse::<Game>()?;
        let criteria_kind = CriteriaKind::parse(&r.criteria_type)
            .ok_or_else(|| anyhow::anyhow!("unknown criteria type: {}", r.criteria_type))?;
        Ok(Achievement {
            id: r.id,
            name: r.name,
            description: r.description,
            game,
            criteria_kind,
            criteria_value: r.criteria_value,
        })
    }
}
