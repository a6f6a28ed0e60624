use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{entity::prelude::*, error::MissingRecord, ids::UserId};

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("user not found")]
    UserNotFound,

    #[error("username already taken")]
    UsernameTaken,
}

impl MissingRecord for UsersServiceError {
    fn is_missing(&self) -> bool {
        matches!(self, UsersServiceError::UserNotFound)
    }
}

/// Accounts are provisioned by the upstream auth system; this service only
/// records and resolves them.
#[derive(Clone)]
pub struct UsersService {
    db: DatabaseConnection,
}

impl UsersService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, username: &str) -> Result<UserModel, UsersServiceError> {
        if self.find_by_username(username).await?.is_some() {
            return Err(UsersServiceError::UsernameTaken);
        }

        let user = UserActiveModel {
            id: Set(UserId::new()),
            username: Set(username.to_string()),
            created_at: Set(chrono::Utc::now()),
        };

        let user = User::insert(user).exec_with_returning(&self.db).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "created user");
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, DbErr> {
        User::find()
            .filter(UserColumn::Username.eq(username))
            .one(&self.db)
            .await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<UserModel, UsersServiceError> {
        self.find_by_username(username)
            .await?
            .ok_or(UsersServiceError::UserNotFound)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<UserModel, UsersServiceError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(UsersServiceError::UserNotFound)
    }
}
