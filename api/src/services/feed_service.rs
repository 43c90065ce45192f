//! Social feed: posts, likes and comments.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use serde::{Deserialize, Serialize};
use shared::entity::{comments, post_likes, posts, trades, users};

use super::leaderboard_service::{PLACEHOLDER_AVATAR, PLACEHOLDER_NAME, PLACEHOLDER_USERNAME};
use super::{trade_service, Page, PageQuery};
use crate::error::{AppError, AppResult};

pub const MAX_POST_LENGTH: usize = 2000;
pub const MAX_COMMENT_LENGTH: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub content: String,
    pub trade_id: Option<u64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub avatar_url: String,
}

impl Author {
    pub fn of(user_id: i64, account: Option<&users::Model>) -> Self {
        Author {
            id: user_id,
            name: account
                .map(|a| a.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_NAME.to_string()),
            username: account
                .map(|a| a.username.clone())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_USERNAME.to_string()),
            avatar_url: account
                .and_then(|a| a.avatar_url.clone())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
        }
    }
}

/// The shared trade as it appears under a post.
#[derive(Debug, Clone, Serialize)]
pub struct TradeSummary {
    pub id: u64,
    pub symbol: String,
    pub direction: String,
    pub status: String,
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
    pub r_multiple: Option<Decimal>,
}

impl From<trades::Model> for TradeSummary {
    fn from(t: trades::Model) -> Self {
        TradeSummary {
            id: t.id,
            symbol: t.symbol,
            direction: t.direction,
            status: t.status,
            pnl: t.pnl,
            pnl_percent: t.pnl_percent,
            r_multiple: t.r_multiple,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: u64,
    pub content: String,
    pub image_url: Option<String>,
    pub author: Author,
    pub trade: Option<TradeSummary>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
    pub created_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: u64,
    pub post_id: u64,
    pub content: String,
    pub author: Author,
    pub created_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Debug, FromQueryResult)]
struct PostCount {
    post_id: u64,
    total: i64,
}

fn validate_text(content: &str, max: usize, what: &str) -> AppResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::validation(format!("{} content is required", what)));
    }
    if content.chars().count() > max {
        return Err(AppError::validation(format!(
            "{} content must be at most {} characters",
            what, max
        )));
    }
    Ok(content.to_string())
}

async fn accounts_by_id(db: &DatabaseConnection, ids: Vec<i64>) -> AppResult<HashMap<i64, users::Model>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let accounts = users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(accounts.into_iter().map(|u| (u.id, u)).collect())
}

async fn counts_by_post<E, C>(db: &DatabaseConnection, post_column: C, ids: &[u64]) -> AppResult<HashMap<u64, i64>>
where
    E: EntityTrait,
    C: ColumnTrait + Copy,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = E::find()
        .select_only()
        .column_as(post_column, "post_id")
        .column_as(post_column.count(), "total")
        .filter(post_column.is_in(ids.iter().copied()))
        .group_by(post_column)
        .into_model::<PostCount>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| (r.post_id, r.total)).collect())
}

/// Attaches author, trade, counters and the viewer's like state to each post.
async fn hydrate(
    db: &DatabaseConnection,
    list: Vec<posts::Model>,
    viewer: Option<i64>,
) -> AppResult<Vec<PostView>> {
    let post_ids: Vec<u64> = list.iter().map(|p| p.id).collect();
    let author_ids: Vec<i64> = list
        .iter()
        .map(|p| p.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let trade_ids: Vec<u64> = list.iter().filter_map(|p| p.trade_id).collect();

    let authors = accounts_by_id(db, author_ids).await?;
    let likes = counts_by_post::<post_likes::Entity, _>(db, post_likes::Column::PostId, &post_ids).await?;
    let comment_counts =
        counts_by_post::<comments::Entity, _>(db, comments::Column::PostId, &post_ids).await?;

    let mut shared_trades: HashMap<u64, trades::Model> = HashMap::new();
    if !trade_ids.is_empty() {
        for trade in trades::Entity::find()
            .filter(trades::Column::Id.is_in(trade_ids))
            .all(db)
            .await?
        {
            shared_trades.insert(trade.id, trade);
        }
    }

    let liked: HashSet<u64> = match viewer {
        Some(user_id) if !post_ids.is_empty() => post_likes::Entity::find()
            .filter(post_likes::Column::UserId.eq(user_id))
            .filter(post_likes::Column::PostId.is_in(post_ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|l| l.post_id)
            .collect(),
        _ => HashSet::new(),
    };

    Ok(list
        .into_iter()
        .map(|post| PostView {
            id: post.id,
            author: Author::of(post.user_id, authors.get(&post.user_id)),
            trade: post
                .trade_id
                .and_then(|id| shared_trades.get(&id).cloned())
                .map(TradeSummary::from),
            like_count: likes.get(&post.id).copied().unwrap_or(0),
            comment_count: comment_counts.get(&post.id).copied().unwrap_or(0),
            liked_by_me: liked.contains(&post.id),
            content: post.content,
            image_url: post.image_url,
            created_at: post.created_at,
        })
        .collect())
}

async fn find_post(db: &DatabaseConnection, id: u64) -> AppResult<posts::Model> {
    posts::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("post"))
}

/// Newest first; optionally one author's posts.
pub async fn list_posts(
    db: &DatabaseConnection,
    viewer: Option<i64>,
    author_id: Option<i64>,
    page: PageQuery,
) -> AppResult<Page<PostView>> {
    let mut select = posts::Entity::find();
    if let Some(author_id) = author_id {
        select = select.filter(posts::Column::UserId.eq(author_id));
    }
    let (page, limit) = page.resolve();
    let paginator = select
        .order_by_desc(posts::Column::CreatedAt)
        .order_by_desc(posts::Column::Id)
        .paginate(db, limit);
    let total = paginator.num_items().await?;
    let list = paginator.fetch_page(page - 1).await?;
    let items = hydrate(db, list, viewer).await?;
    Ok(Page::new(items, total, page, limit))
}

pub async fn create_post(db: &DatabaseConnection, user_id: i64, input: PostInput) -> AppResult<PostView> {
    let content = validate_text(&input.content, MAX_POST_LENGTH, "Post")?;
    if let Some(trade_id) = input.trade_id {
        trade_service::get_trade(db, user_id, trade_id).await?;
    }

    let now = Utc::now();
    let post = posts::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        trade_id: ActiveValue::Set(input.trade_id),
        content: ActiveValue::Set(content),
        image_url: ActiveValue::Set(input.image_url.filter(|u| !u.trim().is_empty())),
        created_at: ActiveValue::Set(Some(now)),
        updated_at: ActiveValue::Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let mut views = hydrate(db, vec![post], Some(user_id)).await?;
    views.pop().ok_or(AppError::NotFound("post"))
}

pub async fn delete_post(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<()> {
    let post = find_post(db, id).await?;
    if post.user_id != user_id {
        return Err(AppError::Forbidden("post"));
    }
    post.delete(db).await?;
    Ok(())
}

/// Likes the post, or removes the caller's like when one exists.
pub async fn toggle_like(db: &DatabaseConnection, user_id: i64, post_id: u64) -> AppResult<LikeState> {
    find_post(db, post_id).await?;

    let existing = post_likes::Entity::find()
        .filter(post_likes::Column::PostId.eq(post_id))
        .filter(post_likes::Column::UserId.eq(user_id))
        .one(db)
        .await?;

    let liked = match existing {
        Some(like) => {
            like.delete(db).await?;
            false
        }
        None => {
            let insert = post_likes::ActiveModel {
                post_id: ActiveValue::Set(post_id),
                user_id: ActiveValue::Set(user_id),
                created_at: ActiveValue::Set(Some(Utc::now())),
                ..Default::default()
            }
            .insert(db)
            .await;
            match insert {
                Ok(_) => true,
                // a concurrent like already landed
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => true,
                Err(err) => return Err(err.into()),
            }
        }
    };

    let like_count = post_likes::Entity::find()
        .filter(post_likes::Column::PostId.eq(post_id))
        .count(db)
        .await?;
    Ok(LikeState { liked, like_count })
}

pub async fn list_comments(db: &DatabaseConnection, post_id: u64) -> AppResult<Vec<CommentView>> {
    find_post(db, post_id).await?;
    let list = comments::Entity::find()
        .filter(comments::Column::PostId.eq(post_id))
        .order_by_asc(comments::Column::CreatedAt)
        .order_by_asc(comments::Column::Id)
        .all(db)
        .await?;

    let author_ids: Vec<i64> = list
        .iter()
        .map(|c| c.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let authors = accounts_by_id(db, author_ids).await?;

    Ok(list
        .into_iter()
        .map(|c| CommentView {
            id: c.id,
            post_id: c.post_id,
            author: Author::of(c.user_id, authors.get(&c.user_id)),
            content: c.content,
            created_at: c.created_at,
        })
        .collect())
}

pub async fn add_comment(
    db: &DatabaseConnection,
    user_id: i64,
    post_id: u64,
    input: CommentInput,
) -> AppResult<CommentView> {
    let content = validate_text(&input.content, MAX_COMMENT_LENGTH, "Comment")?;
    find_post(db, post_id).await?;

    let comment = comments::ActiveModel {
        post_id: ActiveValue::Set(post_id),
        user_id: ActiveValue::Set(user_id),
        content: ActiveValue::Set(content),
        created_at: ActiveValue::Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let account = users::Entity::find_by_id(user_id).one(db).await?;
    Ok(CommentView {
        id: comment.id,
        post_id: comment.post_id,
        author: Author::of(user_id, account.as_ref()),
        content: comment.content,
        created_at: comment.created_at,
    })
}

/// The comment's author or the post's author may remove a comment.
pub async fn delete_comment(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<()> {
    let comment = comments::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    if comment.user_id != user_id {
        let post = find_post(db, comment.post_id).await?;
        if post.user_id != user_id {
            return Err(AppError::Forbidden("comment"));
        }
    }
    comment.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_bounded() {
        assert_eq!(validate_text("  gm  ", 10, "Post").unwrap(), "gm");
        assert!(matches!(validate_text("   ", 10, "Post"), Err(AppError::Validation(_))));
        let long = "x".repeat(11);
        assert!(matches!(validate_text(&long, 10, "Comment"), Err(AppError::Validation(_))));
    }

    #[test]
    fn missing_author_uses_placeholders() {
        let author = Author::of(42, None);
        assert_eq!(author.id, 42);
        assert_eq!(author.name, PLACEHOLDER_NAME);
        assert_eq!(author.username, PLACEHOLDER_USERNAME);
        assert_eq!(author.avatar_url, PLACEHOLDER_AVATAR);
    }
}
