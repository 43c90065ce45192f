//! Accounts: signup, login, profile and password management.

use std::sync::Arc;

use chrono::{Duration, Utc};
use chrono_tz::Tz;
use sea_orm::{prelude::DatabaseConnection, ActiveValue, DbErr, SqlErr};
use serde::Deserialize;
use shared::entity::users;
use tracing::info;

use crate::auth::{generate_token, hash_password, hash_token, verify_password};
use crate::error::{AppError, AppResult};
use crate::repositories::user_repository::UserRepository;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const RESET_TOKEN_VALID_MINUTES: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordInput {
    pub token: String,
    pub password: String,
}

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid {
        return Err(AppError::validation("A valid email address is required"));
    }
    Ok(email)
}

pub fn normalize_username(username: &str) -> AppResult<String> {
    let username = username.trim().to_lowercase();
    let len = username.chars().count();
    if !(3..=30).contains(&len) {
        return Err(AppError::validation("Username must be 3 to 30 characters"));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::validation(
            "Username may only contain letters, digits and underscores",
        ));
    }
    Ok(username)
}

pub fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn check_timezone(timezone: Option<String>) -> AppResult<Option<String>> {
    match timezone.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        None => Ok(None),
        Some(tz) if tz.parse::<Tz>().is_ok() => Ok(Some(tz)),
        Some(_) => Err(AppError::validation("Unknown timezone")),
    }
}

/// A unique-index hit from a concurrent request reads as the same conflict
/// the lookup before the write would have reported.
pub fn duplicate_as_conflict(err: anyhow::Error, message: &str) -> AppError {
    match err.downcast_ref::<DbErr>().and_then(DbErr::sql_err) {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.to_string()),
        _ => AppError::Internal(err),
    }
}

pub struct AccountService {
    repo: UserRepository,
}

impl AccountService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let repo = UserRepository::new(db);
        Self { repo }
    }

    pub async fn get(&self, user_id: i64) -> AppResult<users::Model> {
        self.repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("account"))
    }

    pub async fn signup(&self, input: SignupInput) -> AppResult<users::Model> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        let email = normalize_email(&input.email)?;
        let username = normalize_username(&input.username)?;
        check_password(&input.password)?;
        let timezone = check_timezone(input.timezone)?;

        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("An account with this email already exists".to_string()));
        }
        if self.repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("This username is taken".to_string()));
        }

        let now = Utc::now();
        let user = self
            .repo
            .create(users::ActiveModel {
                name: ActiveValue::Set(name),
                email: ActiveValue::Set(email),
                username: ActiveValue::Set(username),
                bio: ActiveValue::Set(None),
                avatar_url: ActiveValue::Set(None),
                timezone: ActiveValue::Set(timezone),
                password_hash: ActiveValue::Set(hash_password(&input.password)),
                reset_token_hash: ActiveValue::Set(None),
                reset_token_expires: ActiveValue::Set(None),
                created_at: ActiveValue::Set(Some(now)),
                updated_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            })
            .await
            .map_err(|e| duplicate_as_conflict(e, "An account with this email or username already exists"))?;

        info!("Account {} created", user.id);
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, input: LoginInput) -> AppResult<users::Model> {
        let email = input.email.trim().to_lowercase();
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if !verify_password(&input.password, &user.password_hash) {
            return Err(AppError::Unauthorized);
        }
        Ok(user)
    }

    pub async fn update_profile(&self, user_id: i64, input: ProfileInput) -> AppResult<users::Model> {
        let user = self.get(user_id).await?;

        let username = match input.username {
            Some(raw) => {
                let username = normalize_username(&raw)?;
                if username != user.username {
                    if let Some(other) = self.repo.find_by_username(&username).await? {
                        if other.id != user_id {
                            return Err(AppError::Conflict("This username is taken".to_string()));
                        }
                    }
                }
                Some(username)
            }
            None => None,
        };
        let timezone = match input.timezone {
            Some(tz) => Some(check_timezone(Some(tz))?),
            None => None,
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::validation("Name cannot be empty"));
            }
            active.name = ActiveValue::Set(name);
        }
        if let Some(username) = username {
            active.username = ActiveValue::Set(username);
        }
        if let Some(bio) = input.bio {
            active.bio = ActiveValue::Set(Some(bio).filter(|b| !b.trim().is_empty()));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = ActiveValue::Set(Some(avatar_url).filter(|u| !u.trim().is_empty()));
        }
        if let Some(timezone) = timezone {
            active.timezone = ActiveValue::Set(timezone);
        }
        active.updated_at = ActiveValue::Set(Some(Utc::now()));

        self.repo
            .update(active)
            .await
            .map_err(|e| duplicate_as_conflict(e, "This username is taken"))
    }

    pub async fn change_password(&self, user_id: i64, input: ChangePasswordInput) -> AppResult<()> {
        let user = self.get(user_id).await?;
        if !verify_password(&input.current_password, &user.password_hash) {
            return Err(AppError::validation("Current password is incorrect"));
        }
        check_password(&input.new_password)?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = ActiveValue::Set(hash_password(&input.new_password));
        active.updated_at = ActiveValue::Set(Some(Utc::now()));
        self.repo.update(active).await?;
        Ok(())
    }

    /// Stores a fresh reset token for the account, if there is one. Returns the
    /// account and the plain token to email.
    pub async fn request_password_reset(
        &self,
        input: ForgotPasswordInput,
    ) -> AppResult<Option<(users::Model, String)>> {
        let email = input.email.trim().to_lowercase();
        let Some(user) = self.repo.find_by_email(&email).await? else {
            return Ok(None);
        };

        let token = generate_token();
        let mut active: users::ActiveModel = user.into();
        active.reset_token_hash = ActiveValue::Set(Some(hash_token(&token)));
        active.reset_token_expires =
            ActiveValue::Set(Some(Utc::now() + Duration::minutes(RESET_TOKEN_VALID_MINUTES)));
        let user = self.repo.update(active).await?;
        Ok(Some((user, token)))
    }

    /// Consumes a reset token. Returns the account whose password changed.
    pub async fn reset_password(&self, input: ResetPasswordInput) -> AppResult<users::Model> {
        check_password(&input.password)?;
        let invalid = || AppError::validation("Reset link is invalid or has expired");

        let user = self
            .repo
            .find_by_reset_token_hash(&hash_token(input.token.trim()))
            .await?
            .ok_or_else(invalid)?;
        if user.reset_token_expires.map_or(true, |at| at < Utc::now()) {
            return Err(invalid());
        }

        let mut active: users::ActiveModel = user.into();
        active.password_hash = ActiveValue::Set(hash_password(&input.password));
        active.reset_token_hash = ActiveValue::Set(None);
        active.reset_token_expires = ActiveValue::Set(None);
        active.updated_at = ActiveValue::Set(Some(Utc::now()));
        Ok(self.repo.update(active).await?)
    }

    pub async fn delete(&self, user_id: i64) -> AppResult<()> {
        let user = self.get(user_id).await?;
        self.repo.delete(user).await?;
        info!("Account {} deleted", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lowercased_and_checked() {
        assert_eq!(normalize_email(" Trader@Example.COM ").unwrap(), "trader@example.com");
        for bad in ["", "trader", "@example.com", "trader@localhost", "trader@.com"] {
            assert!(normalize_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn username_rules() {
        assert_eq!(normalize_username("Swing_Trader").unwrap(), "swing_trader");
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username("has space").is_err());
        assert!(normalize_username(&"x".repeat(31)).is_err());
    }

    #[test]
    fn timezone_must_be_known() {
        assert_eq!(check_timezone(None).unwrap(), None);
        assert_eq!(check_timezone(Some(" ".to_string())).unwrap(), None);
        assert_eq!(
            check_timezone(Some("Europe/Berlin".to_string())).unwrap().as_deref(),
            Some("Europe/Berlin")
        );
        assert!(check_timezone(Some("Mars/Olympus".to_string())).is_err());
    }

    #[test]
    fn other_database_errors_stay_internal() {
        let err = anyhow::Error::from(DbErr::Custom("connection reset".to_string()));
        assert!(matches!(duplicate_as_conflict(err, "taken"), AppError::Internal(_)));

        let err = anyhow::anyhow!("not a database error");
        assert!(matches!(duplicate_as_conflict(err, "taken"), AppError::Internal(_)));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_password("short").is_err());
        assert!(check_password("long enough").is_ok());
    }
}
