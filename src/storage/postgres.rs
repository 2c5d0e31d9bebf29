use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::games::Game;

use super::types::{AchievementRow, ScoreRow};
use super::{
    Achievement, GameScore, LeaderboardRow, NewUser, Result, Session, Storage, StorageError, User,
};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

fn db_err(e: sqlx::Error) -> StorageError {
    StorageError::Other(e.into())
}

/// Map unique-index collisions on users to the offending field.
fn user_insert_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(c) if c.contains("email") => "email",
                _ => "username",
            };
            return StorageError::Duplicate(field);
        }
    }
    db_err(e)
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, achievements, friends, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, achievements, friends, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, achievements, friends, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn create_user(&self, new: NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, achievements, friends, created_at
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(user_insert_err)
    }

    async fn create_session(&self, token: &str, user_id: Uuid, ttl: Duration) -> Result<Session> {
        let expires_at = OffsetDateTime::now_utc() + ttl;
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, created_at, expires_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT token, user_id, created_at, expires_at
            FROM sessions
            WHERE token = $1 AND expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64> {
        let done = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(done.rows_affected())
    }

    async fn create_score(&self, user_id: Uuid, game: Game, score: i64) -> Result<GameScore> {
        let row = sqlx::query_as::<_, ScoreRow>(
            r#"
            INSERT INTO game_scores (user_id, game, score)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, game, score, played_at
            "#,
        )
        .bind(user_id)
        .bind(game.as_str())
        .bind(score)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(GameScore::try_from(row)?)
    }

    async fn game_leaderboard(&self, game: Game, limit: i64) -> Result<Vec<LeaderboardRow>> {
        sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT s.id, s.user_id, u.username, s.score, s.played_at
            FROM game_scores s
            JOIN users u ON u.id = s.user_id
            WHERE s.game = $1
            ORDER BY s.score DESC, s.played_at ASC
            LIMIT $2
            "#,
        )
        .bind(game.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn user_scores(&self, user_id: Uuid) -> Result<Vec<GameScore>> {
        let rows = sqlx::query_as::<_, ScoreRow>(
            r#"
            SELECT id, user_id, game, score, played_at
            FROM game_scores
            WHERE user_id = $1
            ORDER BY played_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter()
            .map(|r| GameScore::try_from(r).map_err(StorageError::Other))
            .collect()
    }

    async fn list_achievements(&self) -> Result<Vec<Achievement>> {
        let rows = sqlx::query_as::<_, AchievementRow>(
            r#"
            SELECT id, name, description, game, criteria_type, criteria_value
            FROM achievements
            ORDER BY game, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter()
            .map(|r| Achievement::try_from(r).map_err(StorageError::Other))
            .collect()
    }
}
