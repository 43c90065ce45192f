use anyhow::Result;
use sea_orm::prelude::*;
use sea_orm::{ActiveModelTrait, ModelTrait};
use std::sync::Arc;
use shared::entity::users;

pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<users::Model>> {
        let user = users::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    pub async fn find_by_reset_token_hash(&self, token_hash: &str) -> Result<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::ResetTokenHash.eq(token_hash))
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    pub async fn create(&self, active_model: users::ActiveModel) -> Result<users::Model> {
        let user = active_model.insert(self.db.as_ref()).await?;
        Ok(user)
    }

    pub async fn update(&self, active_model: users::ActiveModel) -> Result<users::Model> {
        let user = active_model.update(self.db.as_ref()).await?;
        Ok(user)
    }

    /// Owned rows go with the account through `ON DELETE CASCADE`.
    pub async fn delete(&self, user: users::Model) -> Result<()> {
        user.delete(self.db.as_ref()).await?;
        Ok(())
    }
}
