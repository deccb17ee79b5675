use axum::{body::Bytes, extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    api::AppState,
    error::AppResult,
    middleware::{AuthUser, SESSION_COOKIE},
    models::User,
    services::IssuedSession,
};

use super::{parse_body, success};

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

/// Builds the session cookie; it expires together with the session
fn session_cookie(session: &IssuedSession, secure: bool) -> Cookie<'static> {
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);

    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .secure(secure)
        .build()
}

fn respond_with_session(
    state: &AppState,
    jar: CookieJar,
    session: IssuedSession,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let cookie = session_cookie(&session, state.secure_cookies);
    let response = SessionResponse {
        user: session.user,
        token: session.token,
    };
    Ok((jar.add(cookie), Json(response)))
}

/// Handler creating an account and signing it in
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let request: CredentialsRequest = parse_body(&body)?;
    let session = state
        .auth
        .register(&request.username, &request.password)
        .await?;
    respond_with_session(&state, jar, session)
}

/// Handler signing in with username and password
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let request: CredentialsRequest = parse_body(&body)?;
    let session = state.auth.login(&request.username, &request.password).await?;
    tracing::info!(user_id = %session.user.id, "User logged in");
    respond_with_session(&state, jar, session)
}

/// Handler ending the current session
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    state.auth.logout(&auth.token).await?;
    tracing::info!(user_id = %auth.id(), "User logged out");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, success()))
}
