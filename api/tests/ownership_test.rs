//! Integration tests for per-account ownership checks

use api::error::AppError;
use api::services::{habit_service, note_service, portfolio_service, trade_service, watchlist_service};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
use shared::entity::{habits, notes, portfolios, trades};
use shared::{HabitLog, StringList};
use std::collections::BTreeMap;

fn trade_owned_by(user_id: i64) -> trades::Model {
    let at = Utc.with_ymd_and_hms(2024, 5, 2, 14, 30, 0).unwrap();
    trades::Model {
        id: 10,
        user_id,
        portfolio_id: None,
        strategy_id: None,
        symbol: "AAPL".to_string(),
        direction: "long".to_string(),
        status: "closed".to_string(),
        entry_price: Decimal::from(100),
        exit_price: Some(Decimal::from(110)),
        quantity: Decimal::from(10),
        fees: Decimal::ZERO,
        pnl: Decimal::from(100),
        pnl_percent: Decimal::from(10),
        stop_loss: None,
        take_profit: None,
        risk_amount: None,
        risk_reward: None,
        r_multiple: None,
        tags: StringList::default(),
        setup: None,
        notes: None,
        screenshot_url: None,
        entry_date: at,
        exit_date: Some(at),
        created_at: Some(at),
        updated_at: Some(at),
    }
}

fn note_owned_by(user_id: i64) -> notes::Model {
    notes::Model {
        id: 20,
        user_id,
        trade_id: None,
        title: "Weekly review".to_string(),
        kind: "document".to_string(),
        blocks: serde_json::json!([]),
        canvas: None,
        category: None,
        tags: StringList::default(),
        is_pinned: false,
        is_archived: false,
        created_at: None,
        updated_at: None,
    }
}

fn portfolio_owned_by(user_id: i64, balance: i64) -> portfolios::Model {
    portfolios::Model {
        id: 30,
        user_id,
        name: "Swing".to_string(),
        description: None,
        currency: "USD".to_string(),
        initial_balance: Decimal::from(balance),
        current_balance: Decimal::from(balance),
        total_deposits: Decimal::ZERO,
        total_withdrawals: Decimal::ZERO,
        goal: None,
        created_at: None,
        updated_at: None,
    }
}

fn habit_owned_by(user_id: i64) -> habits::Model {
    habits::Model {
        id: 40,
        user_id,
        name: "Pre-market checklist".to_string(),
        description: None,
        target_per_day: 1,
        color: None,
        completions: HabitLog::default(),
        current_streak: 0,
        longest_streak: 0,
        created_at: None,
        updated_at: None,
    }
}

fn db_returning<M>(rows: Vec<M>) -> DatabaseConnection
where
    M: sea_orm::IntoMockRow,
{
    MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([rows])
        .into_connection()
}

#[tokio::test]
async fn test_trade_of_another_account_is_forbidden() {
    let db = db_returning(vec![trade_owned_by(2)]);
    let result = trade_service::get_trade(&db, 1, 10).await;
    assert!(matches!(result, Err(AppError::Forbidden("trade"))));
}

#[tokio::test]
async fn test_missing_trade_is_not_found() {
    let db = db_returning(Vec::<trades::Model>::new());
    let result = trade_service::get_trade(&db, 1, 10).await;
    assert!(matches!(result, Err(AppError::NotFound("trade"))));
}

#[tokio::test]
async fn test_own_trade_is_returned() {
    let db = db_returning(vec![trade_owned_by(1)]);
    let trade = trade_service::get_trade(&db, 1, 10).await.unwrap();
    assert_eq!(trade.symbol, "AAPL");
}

#[tokio::test]
async fn test_foreign_trade_cannot_be_updated_or_deleted() {
    let input = trade_service::TradeInput {
        symbol: "AAPL".to_string(),
        direction: "long".to_string(),
        entry_price: Decimal::from(100),
        quantity: Decimal::ONE,
        ..Default::default()
    };
    let db = db_returning(vec![trade_owned_by(2)]);
    let result = trade_service::update_trade(&db, 1, 10, input).await;
    assert!(matches!(result, Err(AppError::Forbidden("trade"))));

    // only the lookup ran; no DELETE was issued
    let db = db_returning(vec![trade_owned_by(2)]);
    let result = trade_service::delete_trade(&db, 1, 10).await;
    assert!(matches!(result, Err(AppError::Forbidden("trade"))));
    assert_eq!(db.into_transaction_log().len(), 1);
}

#[tokio::test]
async fn test_trade_cannot_link_foreign_portfolio() {
    let input = trade_service::TradeInput {
        symbol: "MSFT".to_string(),
        direction: "short".to_string(),
        entry_price: Decimal::from(300),
        quantity: Decimal::ONE,
        portfolio_id: Some(30),
        ..Default::default()
    };
    let db = db_returning(vec![portfolio_owned_by(2, 1000)]);
    let result = trade_service::create_trade(&db, 1, input).await;
    assert!(matches!(result, Err(AppError::Forbidden("portfolio"))));
}

#[tokio::test]
async fn test_note_of_another_account_is_forbidden() {
    let db = db_returning(vec![note_owned_by(2)]);
    assert!(matches!(
        note_service::get_note(&db, 1, 20).await,
        Err(AppError::Forbidden("note"))
    ));

    let db = db_returning(vec![note_owned_by(2)]);
    assert!(matches!(
        note_service::toggle_pin(&db, 1, 20).await,
        Err(AppError::Forbidden("note"))
    ));

    let db = db_returning(Vec::<notes::Model>::new());
    assert!(matches!(
        note_service::delete_note(&db, 1, 20).await,
        Err(AppError::NotFound("note"))
    ));
}

#[tokio::test]
async fn test_portfolio_of_another_account_is_forbidden() {
    let db = db_returning(vec![portfolio_owned_by(2, 1000)]);
    assert!(matches!(
        portfolio_service::deposit(&db, 1, 30, Decimal::from(50)).await,
        Err(AppError::Forbidden("portfolio"))
    ));

    let db = db_returning(Vec::<portfolios::Model>::new());
    assert!(matches!(
        portfolio_service::get_portfolio(&db, 1, 30).await,
        Err(AppError::NotFound("portfolio"))
    ));
}

#[tokio::test]
async fn test_withdrawal_above_balance_is_rejected() {
    let db = db_returning(vec![portfolio_owned_by(1, 100)]);
    let result = portfolio_service::withdraw(&db, 1, 30, Decimal::from(150)).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_habit_of_another_account_is_forbidden() {
    let today = Utc::now().date_naive();
    let db = db_returning(vec![habit_owned_by(2)]);
    let result = habit_service::complete_habit(&db, 1, 40, Default::default(), today).await;
    assert!(matches!(result, Err(AppError::Forbidden("habit"))));

    let db = db_returning(Vec::<habits::Model>::new());
    assert!(matches!(
        habit_service::delete_habit(&db, 1, 40).await,
        Err(AppError::NotFound("habit"))
    ));
}

#[tokio::test]
async fn test_duplicate_watchlist_symbol_conflicts() {
    let count_row = BTreeMap::from([("num_items", Value::from(1i32))]);
    let db = db_returning(vec![count_row]);
    let input = watchlist_service::WatchlistInput {
        symbol: "btcusdt".to_string(),
        target_price: None,
        notes: None,
    };
    let result = watchlist_service::add_symbol(&db, 1, input).await;
    assert!(matches!(result, Err(AppError::Conflict(ref msg)) if msg.contains("BTCUSDT")));
}
