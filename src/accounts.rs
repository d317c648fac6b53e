use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::{
    auth,
    entities::user,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct Accounts {
    db: DatabaseConnection,
}

impl Accounts {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    /// Expects an already validated username and password.
    pub async fn register(&self, username: &str, password: &str) -> AppResult<user::Model> {
        if self.find_by_username(username).await?.is_some() {
            return Err(AppError::field("username", "A user with that username already exists."));
        }

        let password_hash = auth::hash_password(password)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;

        let model = user::ActiveModel {
            id: Default::default(),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(jiff::Timestamp::now().as_second()),
        };
        let created = user::Entity::insert(model).exec_with_returning(&self.db).await?;
        tracing::info!(user_id = created.id, username = %created.username, "user registered");
        Ok(created)
    }

    /// `None` for an unknown username or a wrong password alike.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<Option<user::Model>> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };
        let valid = auth::verify_password(password, &user.password_hash)
            .map_err(|e| anyhow::anyhow!("password verification failed: {e}"))?;
        Ok(valid.then_some(user))
    }
}
