use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::entity::notes;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::note_service::{self, NoteInput, NoteQuery, Taxonomy};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/taxonomy", get(taxonomy))
        .route("/:id", get(show).put(update).delete(remove))
        .route("/:id/pin", post(pin))
        .route("/:id/archive", post(archive))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<NoteQuery>,
) -> AppResult<Json<Vec<notes::Model>>> {
    Ok(Json(note_service::list_notes(&state.db, user.id, query).await?))
}

async fn taxonomy(State(state): State<Arc<AppState>>, user: CurrentUser) -> AppResult<Json<Taxonomy>> {
    Ok(Json(note_service::taxonomy(&state.db, user.id).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<NoteInput>,
) -> AppResult<(StatusCode, Json<notes::Model>)> {
    let note = note_service::create_note(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<Json<notes::Model>> {
    Ok(Json(note_service::get_note(&state.db, user.id, id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(input): Json<NoteInput>,
) -> AppResult<Json<notes::Model>> {
    Ok(Json(note_service::update_note(&state.db, user.id, id, input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    note_service::delete_note(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn pin(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<Json<notes::Model>> {
    Ok(Json(note_service::toggle_pin(&state.db, user.id, id).await?))
}

async fn archive(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<Json<notes::Model>> {
    Ok(Json(note_service::toggle_archive(&state.db, user.id, id).await?))
}
