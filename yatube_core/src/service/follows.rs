use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{
    entity::prelude::*,
    ids::{FollowId, UserId},
};

#[derive(Debug, Error)]
pub enum FollowsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),
}

#[derive(Clone)]
pub struct FollowsService {
    db: DatabaseConnection,
}

impl FollowsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Idempotent follow; returns true if a new row was inserted.
    ///
    /// Following yourself is silently ignored.
    pub async fn follow(
        &self,
        user_id: UserId,
        author_id: UserId,
    ) -> Result<bool, FollowsServiceError> {
        if user_id == author_id {
            return Ok(false);
        }

        if self.is_following(user_id, author_id).await? {
            return Ok(false);
        }

        let follow = FollowActiveModel {
            id: Set(FollowId::new()),
            user_id: Set(user_id),
            author_id: Set(author_id),
        };
        Follow::insert(follow).exec(&self.db).await?;

        tracing::info!(user_id = %user_id, author_id = %author_id, "followed author");
        Ok(true)
    }

    /// Idempotent unfollow; returns true if a row was removed.
    pub async fn unfollow(
        &self,
        user_id: UserId,
        author_id: UserId,
    ) -> Result<bool, FollowsServiceError> {
        let result = Follow::delete_many()
            .filter(FollowColumn::UserId.eq(user_id))
            .filter(FollowColumn::AuthorId.eq(author_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = %user_id, author_id = %author_id, "unfollowed author");
        }

        Ok(result.rows_affected > 0)
    }

    pub async fn is_following(
        &self,
        user_id: UserId,
        author_id: UserId,
    ) -> Result<bool, FollowsServiceError> {
        let count = Follow::find()
            .filter(FollowColumn::UserId.eq(user_id))
            .filter(FollowColumn::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    pub async fn count_follows(&self) -> Result<u64, FollowsServiceError> {
        Ok(Follow::find().count(&self.db).await?)
    }
}
