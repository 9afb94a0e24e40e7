//! Session cookie handling and the request-scoped auth context.
//!
//! `load_session` runs on every route and is fail-open: a missing, unknown
//! or expired token just leaves the request anonymous. The gates
//! (`require_auth`, `require_admin`) are what turn "anonymous" into 401.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use std::sync::Arc;
use tracing::warn;

use super::{ApiError, AppState};
use crate::config::Config;
use crate::entities::users::{self, Role};

pub const COOKIE_NAME: &str = "sid";

/// Resolved session attached to the request extensions for downstream
/// handlers.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: users::Model,
    pub token: String,
}

/// Optional auth context for handlers on open routes (audit actor lookup).
pub struct MaybeUser(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthSession>().cloned()))
    }
}

/// Requester metadata recorded alongside audit entries.
pub struct ClientMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_str = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        let ip = header_str("x-forwarded-for")
            .map(|v| v.split(',').next().unwrap_or("").trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            ip,
            user_agent: header_str("user-agent"),
        })
    }
}

/// Pull the session token out of the Cookie header(s).
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for cookie in Cookie::split_parse(raw.to_string()).flatten() {
            if cookie.name() == COOKIE_NAME && !cookie.value().is_empty() {
                return Some(cookie.value().to_string());
            }
        }
    }
    None
}

fn same_site_from_config(config: &Config) -> SameSite {
    match config.session.cookie_same_site.as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

/// Secure is only set when the policy asks for it AND the request actually
/// came in over HTTPS (directly or via a trusting proxy header).
#[must_use]
pub fn request_is_https(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

#[must_use]
pub fn build_session_cookie(config: &Config, token: &str, is_https: bool) -> Cookie<'static> {
    let max_age = CookieDuration::days(config.session.cookie_max_age_days as i64);

    Cookie::build((COOKIE_NAME, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(same_site_from_config(config))
        .secure(config.session.cookie_secure && is_https)
        .max_age(max_age)
        .build()
}

/// Expired cookie that makes the browser drop the session token.
#[must_use]
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::seconds(0))
        .build()
}

/// Resolve the `sid` cookie into an `AuthSession` extension.
///
/// Never blocks the request: unauthenticated routes must keep working with
/// no cookie, a stale cookie, or even a session-store hiccup.
pub async fn load_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = token_from_headers(request.headers()) else {
        return next.run(request).await;
    };

    let looked_up = match state.store().get_session_with_user(&token).await {
        Ok(row) => row,
        Err(e) => {
            warn!("Session lookup failed: {e}");
            return next.run(request).await;
        }
    };

    let Some((session, user)) = looked_up else {
        return next.run(request).await;
    };

    let now = Utc::now();

    // Hard expiry: delete lazily and proceed anonymous.
    if session.expires_at < now {
        if let Err(e) = state.store().delete_session(&token).await {
            warn!("Failed to delete expired session: {e}");
        }
        return next.run(request).await;
    }

    // Sliding renewal, but only inside the trailing window and only when an
    // idle timeout is configured. Best-effort: the request never waits on
    // or fails with this update.
    if let Some(idle) = state.config().idle_timeout() {
        let remaining = session.expires_at - now;
        if remaining < state.config().renewal_window() {
            let store = state.store().clone();
            let token = token.clone();
            let new_expiry = now + idle;
            tokio::spawn(async move {
                if let Err(e) = store.extend_session(&token, new_expiry).await {
                    warn!("Failed to extend session: {e}");
                }
            });
        }
    }

    request.extensions_mut().insert(AuthSession { user, token });

    next.run(request).await
}

/// 401 without a resolved user, 403 when the account is disabled.
pub async fn require_auth(request: Request, next: Next) -> Response {
    let rejection = match request.extensions().get::<AuthSession>() {
        None => Some(ApiError::Unauthorized("Not authenticated".to_string())),
        Some(auth) if auth.user.disabled => {
            Some(ApiError::Forbidden("Account disabled".to_string()))
        }
        Some(_) => None,
    };

    match rejection {
        Some(err) => err.into_response(),
        None => next.run(request).await,
    }
}

/// 401 without a resolved user, 403 unless the user is an admin.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let rejection = match request.extensions().get::<AuthSession>() {
        None => Some(ApiError::Unauthorized("Not authenticated".to_string())),
        Some(auth) if auth.user.role != Role::Admin => {
            Some(ApiError::Forbidden("Admin required".to_string()))
        }
        Some(_) => None,
    };

    match rejection {
        Some(err) => err.into_response(),
        None => next.run(request).await,
    }
}
