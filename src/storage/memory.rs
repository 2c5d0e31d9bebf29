use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::games::Game;

use super::{
    Achievement, GameScore, LeaderboardRow, NewUser, Result, Session, Storage, StorageError, User,
};

/// Everything-in-a-Mutex store. Backs the integration tests and is handy
/// for running the server without a database.
#[derive(Default)]
pub struct MemStorage {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    scores: Vec<GameScore>,
    sessions: HashMap<String, Session>,
    achievements: Vec<Achievement>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load the achievement catalog (there is no write endpoint for it).
    pub fn with_achievements(achievements: Vec<Achievement>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                achievements,
                ..Inner::default()
            }),
        }
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.username == new.username) {
            return Err(StorageError::Duplicate("username"));
        }
        if inner.users.iter().any(|u| u.email == new.email) {
            return Err(StorageError::Duplicate("email"));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            achievements: Vec::new(),
            friends: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn create_session(&self, token: &str, user_id: Uuid, ttl: Duration) -> Result<Session> {
        let mut inner = self.inner.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let session = Session {
            token: token.to_string(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        };
        inner.sessions.insert(token.to_string(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sessions
            .get(token)
            .filter(|s| s.expires_at > OffsetDateTime::now_utc())
            .cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - inner.sessions.len()) as u64)
    }

    async fn create_score(&self, user_id: Uuid, game: Game, score: i64) -> Result<GameScore> {
        let mut inner = self.inner.lock().unwrap();
        let record = GameScore {
            id: Uuid::new_v4(),
            user_id,
            game,
            score,
            played_at: OffsetDateTime::now_utc(),
        };
        inner.scores.push(record.clone());
        Ok(record)
    }

    async fn game_leaderboard(&self, game: Game, limit: i64) -> Result<Vec<LeaderboardRow>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<LeaderboardRow> = inner
            .scores
            .iter()
            .filter(|s| s.game == game)
            .map(|s| {
                let username = inner
                    .users
                    .iter()
                    .find(|u| u.id == s.user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default();
                LeaderboardRow {
                    id: s.id,
                    user_id: s.user_id,
                    username,
                    score: s.score,
                    played_at: s.played_at,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.played_at.cmp(&b.played_at))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn user_scores(&self, user_id: Uuid) -> Result<Vec<GameScore>> {
        let inner = self.inner.lock().unwrap();
        let mut scores: Vec<GameScore> = inner
            .scores
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        scores.sort_by(|a, b| b.played_at.cmp(&a.played_at));
        Ok(scores)
    }

    async fn list_achievements(&self) -> Result<Vec<Achievement>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.achievements.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemStorage::new();
        let new = NewUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
        };
        store.create_user(new.clone()).await.unwrap();

        let err = store
            .create_user(NewUser {
                email: "other@example.com".into(),
                ..new
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate("username")));
    }

    #[tokio::test]
    async fn leaderboard_orders_by_score_descending() {
        let store = MemStorage::new();
        let user = store
            .create_user(NewUser {
                username: "bob".into(),
                email: "bob@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        for score in [100, 300, 200] {
            store
                .create_score(user.id, Game::Snake, score)
                .await
                .unwrap();
        }

        let rows = store.game_leaderboard(Game::Snake, 100).await.unwrap();
        let scores: Vec<i64> = rows.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![300, 200, 100]);
        assert!(rows.iter().all(|r| r.username == "bob"));
    }

    #[tokio::test]
    async fn expired_sessions_are_invisible_and_swept() {
        let store = MemStorage::new();
        let user_id = Uuid::new_v4();
        store
            .create_session("dead", user_id, Duration::seconds(-5))
            .await
            .unwrap();
        store
            .create_session("live", user_id, Duration::days(14))
            .await
            .unwrap();

        assert!(store.get_session("dead").await.unwrap().is_none());
        assert!(store.get_session("live").await.unwrap().is_some());

        assert_eq!(store.delete_expired_sessions().await.unwrap(), 1);
        assert!(store.get_session("live").await.unwrap().is_some());
    }
}
