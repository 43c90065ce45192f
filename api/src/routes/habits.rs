use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::extract::OptionalJson;
use crate::services::habit_service::{self, today_in, CompleteHabitInput, HabitInput, HabitView};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
        .route("/:id/complete", post(complete))
}

/// "Today" for the caller, in their account timezone.
async fn caller_today(state: &AppState, user_id: i64) -> AppResult<NaiveDate> {
    let account = state.accounts.get(user_id).await?;
    Ok(today_in(account.timezone.as_deref()))
}

async fn list(State(state): State<Arc<AppState>>, user: CurrentUser) -> AppResult<Json<Vec<HabitView>>> {
    let today = caller_today(&state, user.id).await?;
    let habits = habit_service::list_habits(&state.db, user.id).await?;
    Ok(Json(habits.into_iter().map(|h| HabitView::new(h, today)).collect()))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<HabitInput>,
) -> AppResult<(StatusCode, Json<HabitView>)> {
    let today = caller_today(&state, user.id).await?;
    let habit = habit_service::create_habit(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(HabitView::new(habit, today))))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<Json<HabitView>> {
    let today = caller_today(&state, user.id).await?;
    let habit = habit_service::get_habit(&state.db, user.id, id).await?;
    Ok(Json(HabitView::new(habit, today)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(input): Json<HabitInput>,
) -> AppResult<Json<HabitView>> {
    let today = caller_today(&state, user.id).await?;
    let habit = habit_service::update_habit(&state.db, user.id, id, input).await?;
    Ok(Json(HabitView::new(habit, today)))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    habit_service::delete_habit(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn complete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
    OptionalJson(input): OptionalJson<CompleteHabitInput>,
) -> AppResult<Json<HabitView>> {
    let today = caller_today(&state, user.id).await?;
    let habit = habit_service::complete_habit(&state.db, user.id, id, input, today).await?;
    Ok(Json(HabitView::new(habit, today)))
}
