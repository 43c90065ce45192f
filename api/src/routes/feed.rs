use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::feed_service::{
    self, CommentInput, CommentView, LikeState, PostInput, PostView,
};
use crate::services::{Page, PageQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct FeedQuery {
    author_id: Option<i64>,
    page: Option<u64>,
    limit: Option<u64>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", delete(delete_post))
        .route("/posts/:id/like", post(toggle_like))
        .route("/posts/:id/comments", get(list_comments).post(add_comment))
        .route("/comments/:id", delete(delete_comment))
}

/// Public; a signed-in viewer additionally sees their own like state.
async fn list_posts(
    State(state): State<Arc<AppState>>,
    viewer: Option<CurrentUser>,
    Query(query): Query<FeedQuery>,
) -> AppResult<Json<Page<PostView>>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let posts =
        feed_service::list_posts(&state.db, viewer.map(|v| v.id), query.author_id, page).await?;
    Ok(Json(posts))
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<PostInput>,
) -> AppResult<(StatusCode, Json<PostView>)> {
    let post = feed_service::create_post(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    feed_service::delete_post(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_like(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<Json<LikeState>> {
    Ok(Json(feed_service::toggle_like(&state.db, user.id, id).await?))
}

async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<Json<Vec<CommentView>>> {
    Ok(Json(feed_service::list_comments(&state.db, id).await?))
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(input): Json<CommentInput>,
) -> AppResult<(StatusCode, Json<CommentView>)> {
    let comment = feed_service::add_comment(&state.db, user.id, id, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    feed_service::delete_comment(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
