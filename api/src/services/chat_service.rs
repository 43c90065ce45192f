//! The global chat room.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use shared::entity::{chat_messages, users};

use super::feed_service::Author;
use crate::error::{AppError, AppResult};

pub const HISTORY_LIMIT: u64 = 50;
pub const MAX_MESSAGE_LENGTH: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatInput {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageView {
    pub id: u64,
    pub content: String,
    pub author: Author,
    pub created_at: Option<DateTime<Utc>>,
}

fn validate(input: &ChatInput) -> AppResult<String> {
    let content = input.content.trim();
    if content.is_empty() {
        return Err(AppError::validation("Message cannot be empty"));
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::validation(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_LENGTH
        )));
    }
    Ok(content.to_string())
}

/// The latest messages, oldest first.
pub async fn recent_messages(db: &DatabaseConnection) -> AppResult<Vec<ChatMessageView>> {
    let mut list = chat_messages::Entity::find()
        .order_by_desc(chat_messages::Column::Id)
        .limit(HISTORY_LIMIT)
        .all(db)
        .await?;
    list.reverse();

    let ids: Vec<i64> = list
        .iter()
        .map(|m| m.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let authors: HashMap<i64, users::Model> = if ids.is_empty() {
        HashMap::new()
    } else {
        users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };

    Ok(list
        .into_iter()
        .map(|m| ChatMessageView {
            id: m.id,
            author: Author::of(m.user_id, authors.get(&m.user_id)),
            content: m.content,
            created_at: m.created_at,
        })
        .collect())
}

pub async fn post_message(
    db: &DatabaseConnection,
    user_id: i64,
    input: ChatInput,
) -> AppResult<ChatMessageView> {
    let content = validate(&input)?;
    let message = chat_messages::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        content: ActiveValue::Set(content),
        created_at: ActiveValue::Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let account = users::Entity::find_by_id(user_id).one(db).await?;
    Ok(ChatMessageView {
        id: message.id,
        author: Author::of(user_id, account.as_ref()),
        content: message.content,
        created_at: message.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_length_is_bounded() {
        let ok = ChatInput { content: " hello ".to_string() };
        assert_eq!(validate(&ok).unwrap(), "hello");

        let long = ChatInput { content: "a".repeat(MAX_MESSAGE_LENGTH + 1) };
        assert!(matches!(validate(&long), Err(AppError::Validation(_))));

        let empty = ChatInput { content: "\n".to_string() };
        assert!(matches!(validate(&empty), Err(AppError::Validation(_))));
    }
}
