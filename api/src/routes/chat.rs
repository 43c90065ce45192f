use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::chat_service::{self, ChatInput, ChatMessageView};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(history).post(send))
}

async fn history(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<ChatMessageView>>> {
    Ok(Json(chat_service::recent_messages(&state.db).await?))
}

async fn send(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<ChatInput>,
) -> AppResult<(StatusCode, Json<ChatMessageView>)> {
    let message = chat_service::post_message(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
