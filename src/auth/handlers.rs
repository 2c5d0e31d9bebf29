use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        password::{hash_password, verify_password},
        session::{self, AuthUser, SESSION_COOKIE},
    },
    error::internal,
    state::AppState,
    storage::{NewUser, StorageError},
};

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Create a session for the user and build its Set-Cookie header.
async fn start_session(
    state: &AppState,
    user_id: Uuid,
) -> Result<HeaderMap, (StatusCode, String)> {
    let token = session::generate_token();
    let ttl = state.config.session_ttl();
    state
        .store
        .create_session(&token, user_id, ttl)
        .await
        .map_err(internal)?;

    let cookie = session::session_cookie(&state.config.session.secret, &token, ttl);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        cookie.parse().expect("cookie is valid ascii"),
    );
    Ok(headers)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<PublicUser>), (StatusCode, String)> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.len() < 3 || payload.username.len() > 32 {
        warn!(username = %payload.username, "rejected username length");
        return Err((
            StatusCode::BAD_REQUEST,
            "username must be 3-32 characters".into(),
        ));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err((
            StatusCode::BAD_REQUEST,
            "password must be at least 8 characters".into(),
        ));
    }

    if let Ok(Some(_)) = state.store.get_user_by_username(&payload.username).await {
        warn!(username = %payload.username, "username already taken");
        return Err((StatusCode::BAD_REQUEST, "username already taken".into()));
    }
    if let Ok(Some(_)) = state.store.get_user_by_email(&payload.email).await {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::BAD_REQUEST, "email already registered".into()));
    }

    let password_hash = hash_password(&payload.password).map_err(internal)?;

    let user = match state
        .store
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await
    {
        Ok(u) => u,
        // Lost a race with a concurrent registration.
        Err(StorageError::Duplicate(field)) => {
            return Err((StatusCode::BAD_REQUEST, format!("{field} already taken")))
        }
        Err(e) => return Err(internal(e)),
    };

    let headers = start_session(&state, user.id).await?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, headers, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<PublicUser>), (StatusCode, String)> {
    payload.username = payload.username.trim().to_string();

    let user = match state.store.get_user_by_username(&payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %payload.username, "login unknown username");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => return Err(internal(e)),
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(internal)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let headers = start_session(&state, user.id).await?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok((headers, Json(user.into())))
}

/// Destroys the server-side session when the request carries a valid one;
/// always clears the cookie and answers 200.
#[instrument(skip(state, req_headers))]
pub async fn logout(
    State(state): State<AppState>,
    req_headers: HeaderMap,
) -> (HeaderMap, StatusCode) {
    let token = req_headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|c| session::cookie_from_header(c, SESSION_COOKIE))
        .and_then(|v| session::verify_cookie_value(&state.config.session.secret, &v));

    if let Some(token) = token {
        match state.store.delete_session(&token).await {
            Ok(()) => info!("user logged out"),
            Err(e) => error!(error = %e, "failed to delete session"),
        }
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session::clear_session_cookie()
            .parse()
            .expect("cookie is valid ascii"),
    );
    (headers, StatusCode::OK)
}

#[instrument(skip(state))]
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = state
        .store
        .get_user(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            warn!(user_id = %user_id, "session references missing user");
            (StatusCode::UNAUTHORIZED, "user not found".to_string())
        })?;
    Ok(Json(user.into()))
}
