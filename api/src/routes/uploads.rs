use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::services::storage::StoredFile;
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_TYPES: [&str; 5] = ["image/png", "image/jpeg", "image/gif", "image/webp", "application/pdf"];

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
}

/// Takes the multipart field named `file` and stores it.
async fn upload(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<StoredFile>)> {
    let storage = state
        .storage
        .as_ref()
        .ok_or(AppError::Unavailable("File storage"))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        if !content_type
            .as_deref()
            .is_some_and(|ct| ALLOWED_TYPES.contains(&ct))
        {
            return Err(AppError::validation("Only images and PDF files can be uploaded"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Invalid upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::validation("File must be at most 10 MB"));
        }

        let stored = storage
            .upload(user.id, file_name, content_type, bytes.to_vec())
            .await?;
        info!("Account {} uploaded {}", user.id, stored.public_id);
        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(AppError::validation("Missing 'file' field"))
}
