//! Integration tests for the public leaderboard

use api::services::leaderboard_service::{self, PLACEHOLDER_NAME};
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, MockDatabase, Value};
use shared::entity::users;
use std::collections::BTreeMap;

fn totals_row(user_id: i64, pnl: i64, trades: i64, wins: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("user_id", Value::from(user_id)),
        ("total_pnl", Value::from(Decimal::from(pnl))),
        ("trade_count", Value::from(trades)),
        ("win_count", Value::from(wins)),
    ])
}

fn account(id: i64, name: &str, username: &str) -> users::Model {
    users::Model {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", username),
        username: username.to_string(),
        bio: None,
        avatar_url: None,
        timezone: None,
        password_hash: String::new(),
        reset_token_hash: None,
        reset_token_expires: None,
        created_at: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn test_leaderboard_ranks_and_decorates() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![
            totals_row(1, 130, 3, 2),
            totals_row(2, 900, 10, 7),
            totals_row(3, -40, 2, 0),
        ]])
        .append_query_results([vec![account(1, "Ada", "ada"), account(2, "Grace", "grace")]])
        .into_connection();

    let board = leaderboard_service::leaderboard(&db).await.unwrap();
    let order: Vec<i64> = board.iter().map(|e| e.user_id).collect();
    assert_eq!(order, vec![2, 1, 3]);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[0].username, "grace");
    assert!((board[1].score - 134.453).abs() < 0.001);
    assert_eq!(board[2].win_rate, 0.0);
    assert_eq!(board[2].name, PLACEHOLDER_NAME);
    assert!(board.iter().all(|e| (0.0..=1.0).contains(&e.win_rate)));
}

#[tokio::test]
async fn test_empty_leaderboard_skips_account_lookup() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<BTreeMap<&'static str, Value>>::new()])
        .into_connection();

    let board = leaderboard_service::leaderboard(&db).await.unwrap();
    assert!(board.is_empty());
    assert_eq!(db.into_transaction_log().len(), 1);
}
