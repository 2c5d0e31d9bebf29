//! Cookie-session plumbing: opaque server-side tokens, an HMAC-signed
//! cookie carrying them, and the extractor that turns a valid cookie into
//! an authenticated user id.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "gamehub_sid";

/// 32 random bytes, hex-encoded. The token itself is the session key in
/// the store; it never encodes any user data.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn mac(secret: &str) -> HmacSha256 {
    // HMAC takes keys of any length.
    HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key")
}

/// Cookie value format: `<token>.<hex hmac-sha256(token)>`.
pub fn sign_token(secret: &str, token: &str) -> String {
    let mut m = mac(secret);
    m.update(token.as_bytes());
    format!("{}.{}", token, hex::encode(m.finalize().into_bytes()))
}

/// Recover the token from a cookie value. `None` on any structural or
/// signature mismatch; the comparison is constant-time.
pub fn verify_cookie_value(secret: &str, value: &str) -> Option<String> {
    let (token, sig_hex) = value.split_once('.')?;
    let sig = hex::decode(sig_hex).ok()?;
    let mut m = mac(secret);
    m.update(token.as_bytes());
    m.verify_slice(&sig).ok()?;
    Some(token.to_string())
}

pub fn session_cookie(secret: &str, token: &str, max_age: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        sign_token(secret, token),
        max_age.whole_seconds()
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    )
}

/// Find a named cookie in a `Cookie` header value.
pub fn cookie_from_header(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

/// Extracts the calling user's id from the session cookie, rejecting the
/// request with 401 before the handler runs otherwise.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing session cookie".into()))?;

        let value = cookie_from_header(cookies, SESSION_COOKIE)
            .ok_or((StatusCode::UNAUTHORIZED, "missing session cookie".into()))?;

        let token =
            verify_cookie_value(&state.config.session.secret, &value).ok_or_else(|| {
                warn!("session cookie failed signature check");
                (StatusCode::UNAUTHORIZED, "invalid session cookie".into())
            })?;

        let session = state
            .store
            .get_session(&token)
            .await
            .map_err(|e| {
                error!(error = %e, "session lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".into(),
                )
            })?
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "session expired or revoked".into(),
            ))?;

        Ok(AuthUser(session.user_id))
    }
}
