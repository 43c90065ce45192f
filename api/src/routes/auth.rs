use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use shared::entity::users;
use tracing::{error, info, warn};

use crate::auth::session::{removal_cookie, session_cookie};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::account_service::{
    ForgotPasswordInput, LoginInput, ResetPasswordInput, SignupInput, RESET_TOKEN_VALID_MINUTES,
};
use crate::services::email::{render_password_reset, render_welcome};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(input): Json<SignupInput>,
) -> AppResult<(StatusCode, CookieJar, Json<users::Model>)> {
    let user = state.accounts.signup(input).await?;
    let token = state.sessions.create(user.id).await?;

    // the account exists either way; a failed welcome email is only logged
    match (&state.mailer, render_welcome(&user.name, &state.config.app_base_url)) {
        (Some(mailer), Ok(html)) => mailer.spawn_send(user.email.clone(), "Welcome to TradeLog", html),
        (Some(_), Err(e)) => error!("Could not render welcome email: {:?}", e),
        (None, _) => {}
    }

    let jar = jar.add(session_cookie(token, state.config.cookie_secure));
    Ok((StatusCode::CREATED, jar, Json(user)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> AppResult<(CookieJar, Json<users::Model>)> {
    let user = state.accounts.login(input).await?;
    let token = state.sessions.create(user.id).await?;
    info!("Account {} logged in", user.id);

    let jar = jar.add(session_cookie(token, state.config.cookie_secure));
    Ok((jar, Json(user)))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    if let Some(user) = user {
        state.sessions.revoke(user.id, &user.token).await?;
    }
    Ok((jar.remove(removal_cookie()), Json(json!({ "success": true }))))
}

/// Always answers the same way so the endpoint cannot be used to probe for
/// registered emails.
async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ForgotPasswordInput>,
) -> AppResult<Json<Value>> {
    if let Some((user, token)) = state.accounts.request_password_reset(input).await? {
        match &state.mailer {
            Some(mailer) => {
                let html = render_password_reset(
                    &user.name,
                    &state.config.app_base_url,
                    &token,
                    RESET_TOKEN_VALID_MINUTES,
                )?;
                mailer.spawn_send(user.email.clone(), "Reset your TradeLog password", html);
            }
            None => warn!("Password reset requested for account {} but SMTP is not configured", user.id),
        }
    }

    Ok(Json(json!({
        "message": "If an account exists for that email, a reset link has been sent"
    })))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ResetPasswordInput>,
) -> AppResult<Json<Value>> {
    let user = state.accounts.reset_password(input).await?;
    state.sessions.revoke_all(user.id).await?;
    info!("Password reset for account {}", user.id);
    Ok(Json(json!({ "success": true })))
}
