//! Journal notes: rich documents and freeform canvases.

use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::entity::notes;
use shared::StringList;

use super::trade_service;
use crate::error::{owned_by, AppError, AppResult};

pub const NOTE_KINDS: [&str; 2] = ["document", "canvas"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteInput {
    pub title: String,
    pub kind: Option<String>,
    pub blocks: Option<Value>,
    pub canvas: Option<Value>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub trade_id: Option<u64>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteQuery {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub pinned: Option<bool>,
    pub archived: Option<bool>,
    pub trade_id: Option<u64>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyEntry {
    pub name: String,
    pub count: usize,
}

/// Categories and tags in use across the account's active notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Taxonomy {
    pub categories: Vec<TaxonomyEntry>,
    pub tags: Vec<TaxonomyEntry>,
}

fn validate(input: &NoteInput) -> AppResult<&'static str> {
    if input.title.trim().is_empty() {
        return Err(AppError::validation("Note title is required"));
    }
    let kind = match input.kind.as_deref().map(str::trim) {
        None | Some("") => "document",
        Some(kind) => NOTE_KINDS
            .iter()
            .copied()
            .find(|k| *k == kind)
            .ok_or_else(|| AppError::validation("Note kind must be 'document' or 'canvas'"))?,
    };
    if input.blocks.as_ref().is_some_and(|b| !b.is_array()) {
        return Err(AppError::validation("Note blocks must be an array"));
    }
    Ok(kind)
}

fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn apply_input(active: &mut notes::ActiveModel, input: NoteInput, kind: &str) {
    active.title = ActiveValue::Set(input.title.trim().to_string());
    active.kind = ActiveValue::Set(kind.to_string());
    active.blocks = ActiveValue::Set(input.blocks.unwrap_or_else(|| Value::Array(vec![])));
    active.canvas = ActiveValue::Set(input.canvas);
    active.category = ActiveValue::Set(normalize_category(input.category));
    active.tags = ActiveValue::Set(StringList::normalized(&input.tags));
    active.trade_id = ActiveValue::Set(input.trade_id);
    if let Some(pinned) = input.is_pinned {
        active.is_pinned = ActiveValue::Set(pinned);
    }
    active.updated_at = ActiveValue::Set(Some(Utc::now()));
}

pub fn build_taxonomy(list: &[notes::Model]) -> Taxonomy {
    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    let mut tags: BTreeMap<&str, usize> = BTreeMap::new();
    for note in list.iter().filter(|n| !n.is_archived) {
        if let Some(category) = note.category.as_deref() {
            *categories.entry(category).or_default() += 1;
        }
        for tag in &note.tags.0 {
            *tags.entry(tag.as_str()).or_default() += 1;
        }
    }
    let to_entries = |map: BTreeMap<&str, usize>| {
        let mut entries: Vec<TaxonomyEntry> = map
            .into_iter()
            .map(|(name, count)| TaxonomyEntry {
                name: name.to_string(),
                count,
            })
            .collect();
        // most used first, ties alphabetical
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    };
    Taxonomy {
        categories: to_entries(categories),
        tags: to_entries(tags),
    }
}

pub async fn list_notes(
    db: &DatabaseConnection,
    user_id: i64,
    query: NoteQuery,
) -> AppResult<Vec<notes::Model>> {
    let mut select = notes::Entity::find()
        .filter(notes::Column::UserId.eq(user_id))
        .filter(notes::Column::IsArchived.eq(query.archived.unwrap_or(false)));

    if let Some(category) = normalize_category(query.category) {
        select = select.filter(notes::Column::Category.eq(category));
    }
    if let Some(tag) = query.tag.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()) {
        let needle = Value::String(tag).to_string();
        select = select.filter(Expr::cust_with_values("JSON_CONTAINS(tags, ?)", [needle]));
    }
    if let Some(pinned) = query.pinned {
        select = select.filter(notes::Column::IsPinned.eq(pinned));
    }
    if let Some(trade_id) = query.trade_id {
        select = select.filter(notes::Column::TradeId.eq(trade_id));
    }
    if let Some(q) = query.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()) {
        select = select.filter(notes::Column::Title.contains(&q));
    }

    let list = select
        .order_by_desc(notes::Column::IsPinned)
        .order_by_desc(notes::Column::UpdatedAt)
        .all(db)
        .await?;
    Ok(list)
}

pub async fn taxonomy(db: &DatabaseConnection, user_id: i64) -> AppResult<Taxonomy> {
    let list = notes::Entity::find()
        .filter(notes::Column::UserId.eq(user_id))
        .filter(notes::Column::IsArchived.eq(false))
        .all(db)
        .await?;
    Ok(build_taxonomy(&list))
}

pub async fn get_note(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<notes::Model> {
    let note = notes::Entity::find_by_id(id).one(db).await?;
    owned_by(note, user_id, |n| n.user_id, "note")
}

pub async fn create_note(
    db: &DatabaseConnection,
    user_id: i64,
    input: NoteInput,
) -> AppResult<notes::Model> {
    let kind = validate(&input)?;
    if let Some(trade_id) = input.trade_id {
        trade_service::get_trade(db, user_id, trade_id).await?;
    }

    let mut active = notes::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        is_pinned: ActiveValue::Set(false),
        is_archived: ActiveValue::Set(false),
        created_at: ActiveValue::Set(Some(Utc::now())),
        ..Default::default()
    };
    apply_input(&mut active, input, kind);
    Ok(active.insert(db).await?)
}

pub async fn update_note(
    db: &DatabaseConnection,
    user_id: i64,
    id: u64,
    input: NoteInput,
) -> AppResult<notes::Model> {
    let kind = validate(&input)?;
    let note = get_note(db, user_id, id).await?;
    if let Some(trade_id) = input.trade_id.filter(|t| note.trade_id != Some(*t)) {
        trade_service::get_trade(db, user_id, trade_id).await?;
    }

    let mut active: notes::ActiveModel = note.into();
    apply_input(&mut active, input, kind);
    Ok(active.update(db).await?)
}

pub async fn delete_note(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<()> {
    let note = get_note(db, user_id, id).await?;
    note.delete(db).await?;
    Ok(())
}

pub async fn toggle_pin(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<notes::Model> {
    let note = get_note(db, user_id, id).await?;
    let pinned = !note.is_pinned;
    let mut active: notes::ActiveModel = note.into();
    active.is_pinned = ActiveValue::Set(pinned);
    active.updated_at = ActiveValue::Set(Some(Utc::now()));
    Ok(active.update(db).await?)
}

/// Archiving also unpins, so archived notes never float to the top.
pub async fn toggle_archive(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<notes::Model> {
    let note = get_note(db, user_id, id).await?;
    let archived = !note.is_archived;
    let mut active: notes::ActiveModel = note.into();
    active.is_archived = ActiveValue::Set(archived);
    if archived {
        active.is_pinned = ActiveValue::Set(false);
    }
    active.updated_at = ActiveValue::Set(Some(Utc::now()));
    Ok(active.update(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(category: Option<&str>, tags: &[&str], archived: bool) -> notes::Model {
        notes::Model {
            id: 1,
            user_id: 1,
            trade_id: None,
            title: "Morning prep".to_string(),
            kind: "document".to_string(),
            blocks: Value::Array(vec![]),
            canvas: None,
            category: category.map(str::to_string),
            tags: StringList::normalized(tags),
            is_pinned: false,
            is_archived: archived,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn kind_defaults_to_document() {
        let input = NoteInput {
            title: "Plan".to_string(),
            ..Default::default()
        };
        assert_eq!(validate(&input).unwrap(), "document");

        let canvas = NoteInput {
            title: "Board".to_string(),
            kind: Some("canvas".to_string()),
            ..Default::default()
        };
        assert_eq!(validate(&canvas).unwrap(), "canvas");
    }

    #[test]
    fn rejects_unknown_kind_and_non_array_blocks() {
        let input = NoteInput {
            title: "Plan".to_string(),
            kind: Some("video".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate(&input), Err(AppError::Validation(_))));

        let input = NoteInput {
            title: "Plan".to_string(),
            blocks: Some(serde_json::json!({ "type": "text" })),
            ..Default::default()
        };
        assert!(matches!(validate(&input), Err(AppError::Validation(_))));
    }

    #[test]
    fn taxonomy_counts_active_notes_only() {
        let list = vec![
            note(Some("Review"), &["fomo", "breakout"], false),
            note(Some("Review"), &["breakout"], false),
            note(Some("Psychology"), &["fomo"], true),
            note(None, &["breakout"], false),
        ];
        let tax = build_taxonomy(&list);
        assert_eq!(
            tax.categories,
            vec![TaxonomyEntry { name: "Review".to_string(), count: 2 }]
        );
        assert_eq!(tax.tags[0], TaxonomyEntry { name: "breakout".to_string(), count: 3 });
        assert_eq!(tax.tags[1], TaxonomyEntry { name: "fomo".to_string(), count: 1 });
    }
}
