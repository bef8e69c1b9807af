//! Identity tokens, the session cookie and the middleware that resolves the caller.

use super::AppState;
use crate::{
    config::IdentityConfig,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

/// Name of the cookie carrying the identity token.
pub const SESSION_COOKIE: &str = "session";

/// Lifetime of the session cookie (five days).
const SESSION_MAX_AGE_SECS: u64 = 5 * 24 * 60 * 60;

/// The authenticated caller, available to handlers via request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    /// The caller's user id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Maps identity tokens to user ids.
#[derive(Debug, Default)]
pub struct IdentityVerifier {
    identities: Vec<IdentityConfig>,
}

impl IdentityVerifier {
    /// Builds a verifier from the configured identities, skipping entries with an empty
    /// token or user id.
    #[must_use]
    pub fn new(identities: &[IdentityConfig]) -> Self {
        let identities = identities
            .iter()
            .filter(|i| !i.token.is_empty() && !i.user_id.trim().is_empty())
            .cloned()
            .collect();
        Self { identities }
    }

    /// Number of usable identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Whether no identity is configured, in which case every request is rejected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Returns the user id for `token`, comparing against every entry in constant time.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<&str> {
        self.identities
            .iter()
            .find(|entry| entry.token.as_bytes().ct_eq(token.as_bytes()).into())
            .map(|entry| entry.user_id.as_str())
    }
}

/// Pulls the token from `Authorization: Bearer` or, failing that, the session cookie.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    bearer.or_else(|| session_cookie(headers))
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}

/// Rejects requests without a valid identity token and attaches [`CurrentUser`] to the
/// rest.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = extract_token(req.headers()).ok_or_else(|| Error::Unauthorized {
        message: "Missing identity token. Provide Authorization: Bearer <token> or a session cookie"
            .to_string(),
    })?;

    let Some(user_id) = state.identities.verify(token) else {
        warn!("Invalid identity token presented");
        return Err(Error::Unauthorized {
            message: "Invalid identity token".to_string(),
        });
    };

    debug!(user_id, "Authenticated request");
    let user = CurrentUser(user_id.to_string());
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Body of `POST /api/auth/session`.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    /// Identity token to exchange for a session cookie
    pub id_token: String,
}

/// Response of `POST /api/auth/session`.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The verified user
    pub user_id: String,
}

fn cookie_header(value: &str, max_age: u64) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={value}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}"
    ))
    .map_err(|_| Error::Validation {
        field: "id_token",
        message: "token contains characters not allowed in a cookie".to_string(),
    })
}

/// `POST /api/auth/session`: verifies the identity token and stores it in an HttpOnly
/// cookie.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<SessionRequest>,
) -> Result<Response> {
    let user_id = state
        .identities
        .verify(body.id_token.trim())
        .ok_or_else(|| Error::Unauthorized {
            message: "Invalid identity token".to_string(),
        })?
        .to_string();

    let cookie = cookie_header(body.id_token.trim(), SESSION_MAX_AGE_SECS)?;
    info!(%user_id, "session created");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse { user_id }),
    )
        .into_response())
}

/// `DELETE /api/auth/session`: expires the session cookie.
pub async fn delete_session() -> Result<Response> {
    let cookie = cookie_header("", 0)?;
    Ok(([(header::SET_COOKIE, cookie)], axum::http::StatusCode::NO_CONTENT).into_response())
}
