//! Storage behind the API: a small trait so handlers don't care whether
//! records live in Postgres or in memory (tests, local hacking).

use async_trait::async_trait;
use time::Duration;
use uuid::Uuid;

use crate::games::Game;

mod memory;
mod postgres;
mod types;

pub use memory::MemStorage;
pub use postgres::PgStorage;
pub use types::{
    Achievement, CriteriaKind, GameScore, LeaderboardRow, NewUser, Session, User,
};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A unique column collided; names the offending field.
    #[error("{0} already taken")]
    Duplicate(&'static str),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    // users
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn create_user(&self, new: NewUser) -> Result<User>;

    // sessions
    async fn create_session(&self, token: &str, user_id: Uuid, ttl: Duration) -> Result<Session>;
    /// Returns the session only if it exists and has not expired.
    async fn get_session(&self, token: &str) -> Result<Option<Session>>;
    async fn delete_session(&self, token: &str) -> Result<()>;
    async fn delete_expired_sessions(&self) -> Result<u64>;

    // scores
    async fn create_score(&self, user_id: Uuid, game: Game, score: i64) -> Result<GameScore>;
    async fn game_leaderboard(&self, game: Game, limit: i64) -> Result<Vec<LeaderboardRow>>;
    async fn user_scores(&self, user_id: Uuid) -> Result<Vec<GameScore>>;

    // achievements
    async fn list_achievements(&self) -> Result<Vec<Achievement>>;
}
