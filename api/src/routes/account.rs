use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use shared::entity::users;

use crate::auth::session::{removal_cookie, session_cookie};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::account_service::{ChangePasswordInput, ProfileInput};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(me).put(update_profile).delete(delete_account))
        .route("/password", put(change_password))
}

async fn me(State(state): State<Arc<AppState>>, user: CurrentUser) -> AppResult<Json<users::Model>> {
    Ok(Json(state.accounts.get(user.id).await?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<ProfileInput>,
) -> AppResult<Json<users::Model>> {
    Ok(Json(state.accounts.update_profile(user.id, input).await?))
}

/// Signs out every other device and issues a fresh session for this one.
async fn change_password(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    jar: CookieJar,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<(CookieJar, Json<Value>)> {
    state.accounts.change_password(user.id, input).await?;
    state.sessions.revoke_all(user.id).await?;
    let token = state.sessions.create(user.id).await?;

    let jar = jar.add(session_cookie(token, state.config.cookie_secure));
    Ok((jar, Json(json!({ "success": true }))))
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    state.accounts.delete(user.id).await?;
    state.sessions.revoke_all(user.id).await?;
    Ok((jar.remove(removal_cookie()), Json(json!({ "success": true }))))
}
