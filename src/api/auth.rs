use axum::{
    Extension, Json,
    body::{Body, to_bytes},
    extract::{Query, Request, State},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    Form,
    cookie::{Cookie, CookieJar, SameSite},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use super::validation::validate_redirect_target;
use super::{ApiError, ApiResponse, AppState, LoginView};
use crate::constants::auth::{COOKIE_NAME, CSRF_FIELD};
use crate::constants::limits::MAX_FORM_BYTES;
use crate::db::SessionInfo;
use crate::db::repositories::user::constant_time_eq;
use crate::services::{AuthError, LoginResult};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub failed: Option<String>,
    #[serde(default, rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default, rename = "redirectTo")]
    pub redirect_to: String,
}

/// The session resolved once per request by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: String,
    pub info: SessionInfo,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the session cookie. Requests without a live session are sent to
/// the login page with the original path as `redirectTo`.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(current) = resolve_session(&state, &jar).await? {
        tracing::Span::current().record("user_id", current.info.user_id);
        request.extensions_mut().insert(current);
        return Ok(next.run(request).await);
    }

    let target = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
        .to_string();

    Ok(Redirect::to(&login_url(&target, false)).into_response())
}

/// Rejects POST requests whose url-encoded body lacks the session's CSRF token.
pub async fn verify_csrf(
    Extension(current): Extension<CurrentSession>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() != Method::POST {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|_| ApiError::validation("Form body too large"))?;

    let submitted = url::form_urlencoded::parse(&bytes)
        .find(|(key, _)| key == CSRF_FIELD)
        .map(|(_, value)| value.into_owned());

    let valid = submitted.is_some_and(|token| {
        constant_time_eq(token.as_bytes(), current.info.csrf_token.as_bytes())
    });

    if !valid {
        warn!(
            user_id = current.info.user_id,
            path = %parts.uri.path(),
            "Rejected request with missing or invalid CSRF token"
        );
        return Err(ApiError::forbidden("Invalid CSRF token"));
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

async fn resolve_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<CurrentSession>, ApiError> {
    let Some(token) = jar.get(COOKIE_NAME).map(|c| c.value().to_string()) else {
        return Ok(None);
    };

    let info = state.auth().session(&token).await?;
    Ok(info.map(|info| CurrentSession { token, info }))
}

/// API key from `Authorization: Bearer <key>`, falling back to the
/// bookmarklet's `auth` parameter when that is allowed.
pub fn extract_api_key(
    headers: &HeaderMap,
    fallback: Option<&str>,
    allow_fallback: bool,
) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    if allow_fallback {
        return fallback
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(ToString::to_string);
    }

    None
}

/// Resolves the API key to its name.
///
/// # Errors
///
/// Missing keys are a validation error, unknown keys are forbidden.
pub async fn authorize_api_key(state: &AppState, key: Option<String>) -> Result<String, ApiError> {
    let key = key.ok_or_else(|| ApiError::validation("Missing API key"))?;

    match state.auth().verify_api_key(&key).await? {
        Some(name) => {
            tracing::Span::current().record("user_id", name.as_str());
            Ok(name)
        }
        None => {
            warn!("Rejected request with unknown API key");
            Err(ApiError::forbidden("Invalid API key"))
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /login
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Result<Response, ApiError> {
    if resolve_session(&state, &jar).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let view = LoginView {
        message: query
            .failed
            .filter(|f| !f.is_empty())
            .map(|_| "Login failed".to_string()),
        redirect_to: query.redirect_to.unwrap_or_default(),
    };

    Ok(Json(ApiResponse::success(view)).into_response())
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    match state.auth().login(&form.username, &form.password).await {
        Ok(result) => {
            let cookie = session_cookie(&result, state.config().server.secure_cookies);
            let target = validate_redirect_target(&form.redirect_to);
            Ok((jar.add(cookie), Redirect::to(target)).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            Ok(Redirect::to(&login_url(&form.redirect_to, true)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentSession>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    state.auth().logout(&current.token).await?;
    tracing::info!(user_id = current.info.user_id, "User logged out");

    let jar = jar.remove(Cookie::build(COOKIE_NAME).path("/"));
    Ok((jar, Redirect::to("/login")).into_response())
}

// ============================================================================
// Helpers
// ============================================================================

fn session_cookie(result: &LoginResult, secure: bool) -> Cookie<'static> {
    let expires = time::OffsetDateTime::from_unix_timestamp(result.expires_at.timestamp()).ok();

    Cookie::build((COOKIE_NAME, result.token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .expires(expires)
        .build()
}

fn login_url(redirect_to: &str, failed: bool) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    if failed {
        serializer.append_pair("failed", "1");
    }
    serializer.append_pair("redirectTo", redirect_to);
    format!("/login?{}", serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn login_url_encodes_target() {
        assert_eq!(
            login_url("/bookmarks?page=2", false),
            "/login?redirectTo=%2Fbookmarks%3Fpage%3D2"
        );
        assert_eq!(login_url("/", true), "/login?failed=1&redirectTo=%2F");
    }

    #[test]
    fn bearer_header_wins_over_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(
            extract_api_key(&headers, Some("def"), true).as_deref(),
            Some("abc")
        );

        let empty = HeaderMap::new();
        assert_eq!(extract_api_key(&empty, Some("def"), true).as_deref(), Some("def"));
        assert_eq!(extract_api_key(&empty, Some("def"), false), None);
        assert_eq!(extract_api_key(&empty, Some("  "), true), None);
    }

    #[test]
    fn session_cookie_attributes() {
        let result = LoginResult {
            user_id: 1,
            username: "alice".to_string(),
            token: "tok".to_string(),
            csrf_token: "csrf".to_string(),
            expires_at: chrono::Utc::now() + chrono::Duration::days(30),
        };
        let cookie = session_cookie(&result, true);
        assert_eq!(cookie.name(), COOKIE_NAME);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert!(cookie.expires_datetime().is_some());
    }
}
