//! Habits and their daily streaks.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use shared::entity::habits;
use shared::{HabitCompletion, HabitLog};

use crate::error::{owned_by, AppError, AppResult};

pub const MAX_COMPLETIONS_PER_CALL: u32 = 1000;

/// The parts of a habit the streak rules touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakState {
    pub completions: HabitLog,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Records `count` completions for `today`.
///
/// The first completion of a day appends an entry and either extends the
/// streak (yesterday was completed, or there was no streak) or restarts it at
/// one. Later completions on the same day only add to that day's count.
/// Returns true when a new day entry was created.
pub fn apply_completion(
    state: &mut StreakState,
    today: NaiveDate,
    count: u32,
    note: Option<String>,
) -> AppResult<bool> {
    if let Some(entry) = state.completions.on_mut(today) {
        entry.count = entry
            .count
            .checked_add(count)
            .ok_or_else(|| AppError::validation("Completion count is too large"))?;
        if note.is_some() {
            entry.note = note;
        }
        return Ok(false);
    }

    state.completions.0.push(HabitCompletion {
        date: today,
        count,
        note,
    });

    let yesterday_done = today
        .pred_opt()
        .map(|d| state.completions.on(d).is_some())
        .unwrap_or(false);

    state.current_streak = if yesterday_done || state.current_streak == 0 {
        state.current_streak + 1
    } else {
        1
    };
    state.longest_streak = state.longest_streak.max(state.current_streak);
    Ok(true)
}

/// The streak as it stands today: the stored counter only survives while the
/// last completion is today or yesterday.
pub fn active_streak(state: &StreakState, today: NaiveDate) -> u32 {
    let alive = state.completions.on(today).is_some()
        || today
            .pred_opt()
            .map(|d| state.completions.on(d).is_some())
            .unwrap_or(false);
    if alive {
        state.current_streak
    } else {
        0
    }
}

/// Today's date in the account's timezone, UTC when unset or unknown.
pub fn today_in(timezone: Option<&str>) -> NaiveDate {
    let now = Utc::now();
    match timezone.and_then(|tz| tz.parse::<Tz>().ok()) {
        Some(tz) => now.with_timezone(&tz).date_naive(),
        None => now.date_naive(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitView {
    #[serde(flatten)]
    pub habit: habits::Model,
    pub today_count: u32,
    pub completed_today: bool,
    pub active_streak: u32,
    pub streak_at_risk: bool,
}

impl HabitView {
    pub fn new(habit: habits::Model, today: NaiveDate) -> Self {
        let state = StreakState {
            completions: habit.completions.clone(),
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
        };
        let today_count = state.completions.on(today).map(|c| c.count).unwrap_or(0);
        let active = active_streak(&state, today);
        Self {
            today_count,
            completed_today: today_count > 0,
            active_streak: active,
            streak_at_risk: active > 0 && today_count == 0,
            habit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HabitInput {
    pub name: String,
    pub description: Option<String>,
    pub target_per_day: Option<u32>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteHabitInput {
    pub count: Option<u32>,
    pub note: Option<String>,
}

fn validate(input: &HabitInput) -> AppResult<()> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Habit name is required"));
    }
    if name.chars().count() > 100 {
        return Err(AppError::validation("Habit name must be at most 100 characters"));
    }
    if input.target_per_day == Some(0) {
        return Err(AppError::validation("Daily target must be at least 1"));
    }
    Ok(())
}

pub async fn list_habits(db: &DatabaseConnection, user_id: i64) -> AppResult<Vec<habits::Model>> {
    let list = habits::Entity::find()
        .filter(habits::Column::UserId.eq(user_id))
        .order_by_asc(habits::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(list)
}

pub async fn get_habit(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<habits::Model> {
    let habit = habits::Entity::find_by_id(id).one(db).await?;
    owned_by(habit, user_id, |h| h.user_id, "habit")
}

pub async fn create_habit(
    db: &DatabaseConnection,
    user_id: i64,
    input: HabitInput,
) -> AppResult<habits::Model> {
    validate(&input)?;
    let now = Utc::now();
    let habit = habits::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        name: ActiveValue::Set(input.name.trim().to_string()),
        description: ActiveValue::Set(input.description),
        target_per_day: ActiveValue::Set(input.target_per_day.unwrap_or(1)),
        color: ActiveValue::Set(input.color),
        completions: ActiveValue::Set(HabitLog::default()),
        current_streak: ActiveValue::Set(0),
        longest_streak: ActiveValue::Set(0),
        created_at: ActiveValue::Set(Some(now)),
        updated_at: ActiveValue::Set(Some(now)),
        ..Default::default()
    };
    Ok(habit.insert(db).await?)
}

pub async fn update_habit(
    db: &DatabaseConnection,
    user_id: i64,
    id: u64,
    input: HabitInput,
) -> AppResult<habits::Model> {
    validate(&input)?;
    let habit = get_habit(db, user_id, id).await?;

    let mut update: habits::ActiveModel = habit.into();
    update.name = ActiveValue::Set(input.name.trim().to_string());
    update.description = ActiveValue::Set(input.description);
    if let Some(target) = input.target_per_day {
        update.target_per_day = ActiveValue::Set(target);
    }
    update.color = ActiveValue::Set(input.color);
    update.updated_at = ActiveValue::Set(Some(Utc::now()));
    Ok(update.update(db).await?)
}

pub async fn delete_habit(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<()> {
    let habit = get_habit(db, user_id, id).await?;
    habit.delete(db).await?;
    Ok(())
}

pub async fn complete_habit(
    db: &DatabaseConnection,
    user_id: i64,
    id: u64,
    input: CompleteHabitInput,
    today: NaiveDate,
) -> AppResult<habits::Model> {
    let count = input.count.unwrap_or(1);
    if count == 0 {
        return Err(AppError::validation("Completion count must be positive"));
    }
    if count > MAX_COMPLETIONS_PER_CALL {
        return Err(AppError::validation(format!(
            "Completion count must be at most {}",
            MAX_COMPLETIONS_PER_CALL
        )));
    }
    let habit = get_habit(db, user_id, id).await?;

    let mut state = StreakState {
        completions: habit.completions.clone(),
        current_streak: habit.current_streak,
        longest_streak: habit.longest_streak,
    };
    let note = input.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    apply_completion(&mut state, today, count, note)?;

    let mut update: habits::ActiveModel = habit.into();
    update.completions = ActiveValue::Set(state.completions);
    update.current_streak = ActiveValue::Set(state.current_streak);
    update.longest_streak = ActiveValue::Set(state.longest_streak);
    update.updated_at = ActiveValue::Set(Some(Utc::now()));
    Ok(update.update(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(n as u64)
    }

    #[test]
    fn consecutive_days_extend_the_streak() {
        let mut state = StreakState::default();
        for n in 0..4 {
            assert!(apply_completion(&mut state, day(n), 1, None).unwrap());
        }
        assert_eq!(state.current_streak, 4);
        assert_eq!(state.longest_streak, 4);
    }

    #[test]
    fn gap_resets_to_one_and_keeps_longest() {
        let mut state = StreakState::default();
        apply_completion(&mut state, day(0), 1, None).unwrap();
        apply_completion(&mut state, day(1), 1, None).unwrap();
        apply_completion(&mut state, day(2), 1, None).unwrap();
        apply_completion(&mut state, day(5), 1, None).unwrap();
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 3);
    }

    #[test]
    fn same_day_accumulates_without_touching_streak() {
        let mut state = StreakState::default();
        apply_completion(&mut state, day(0), 1, None).unwrap();
        apply_completion(&mut state, day(1), 1, None).unwrap();
        let before = state.current_streak;

        let new_day = apply_completion(&mut state, day(1), 2, Some("evening review".to_string())).unwrap();
        assert!(!new_day);
        assert_eq!(state.current_streak, before);
        let entry = state.completions.on(day(1)).unwrap();
        assert_eq!(entry.count, 3);
        assert_eq!(entry.note.as_deref(), Some("evening review"));
        assert_eq!(state.completions.0.len(), 2);
    }

    #[test]
    fn longest_is_monotonic_and_bounds_current() {
        // deterministic pseudo-random day gaps and repeat counts
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..50 {
            let mut state = StreakState::default();
            let mut offset = 0u32;
            let mut last_longest = 0;
            for _ in 0..40 {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                offset += (seed % 3) as u32; // 0 = same day, 1 = next day, 2 = gap
                apply_completion(&mut state, day(offset), 1 + (seed % 2) as u32, None).unwrap();
                assert!(state.longest_streak >= last_longest);
                assert!(state.longest_streak >= state.current_streak);
                last_longest = state.longest_streak;
            }
        }
    }

    #[test]
    fn active_streak_expires_after_a_missed_day() {
        let mut state = StreakState::default();
        apply_completion(&mut state, day(0), 1, None).unwrap();
        apply_completion(&mut state, day(1), 1, None).unwrap();
        assert_eq!(active_streak(&state, day(1)), 2);
        assert_eq!(active_streak(&state, day(2)), 2);
        assert_eq!(active_streak(&state, day(3)), 0);
    }

    #[test]
    fn same_day_overflow_is_rejected_and_count_kept() {
        let mut state = StreakState::default();
        apply_completion(&mut state, day(0), u32::MAX, None).unwrap();

        let result = apply_completion(&mut state, day(0), 1, None);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(state.completions.on(day(0)).map(|c| c.count), Some(u32::MAX));
        assert_eq!(state.current_streak, 1);
    }

    #[tokio::test]
    async fn oversized_completion_count_is_rejected_before_lookup() {
        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::MySql).into_connection();
        let input = CompleteHabitInput {
            count: Some(MAX_COMPLETIONS_PER_CALL + 1),
            note: None,
        };
        let result = complete_habit(&db, 1, 40, input, day(0)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(db.into_transaction_log().is_empty());
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        assert_eq!(today_in(Some("Not/AZone")), Utc::now().date_naive());
        let _ = today_in(Some("America/New_York"));
    }
}
