//! Integration tests for account signup conflicts

use std::sync::Arc;

use api::error::AppError;
use api::services::account_service::{AccountService, SignupInput};
use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
use shared::entity::users;

fn signup_input() -> SignupInput {
    SignupInput {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        username: "ada".to_string(),
        password: "correct horse".to_string(),
        timezone: None,
    }
}

fn existing_account() -> users::Model {
    users::Model {
        id: 1,
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        username: "ada".to_string(),
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
async fn test_signup_with_taken_email_conflicts() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![existing_account()]])
        .into_connection();
    let accounts = AccountService::new(Arc::new(db));

    let result = accounts.signup(signup_input()).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_signup_insert_failure_is_classified() {
    // both lookups miss, then the insert itself fails
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<users::Model>::new(), Vec::<users::Model>::new()])
        .append_exec_errors([DbErr::Custom("connection reset".to_string())])
        .into_connection();
    let accounts = AccountService::new(Arc::new(db));

    let result = accounts.signup(signup_input()).await;
    assert!(matches!(result, Err(AppError::Internal(_))));
}
