use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{entity::prelude::*, error::MissingRecord, ids::GroupId};

#[derive(Debug, Error)]
pub enum GroupsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("group not found")]
    GroupNotFound,

    #[error("slug already taken")]
    SlugTaken,
}

impl MissingRecord for GroupsServiceError {
    fn is_missing(&self) -> bool {
        matches!(self, GroupsServiceError::GroupNotFound)
    }
}

#[derive(Clone)]
pub struct GroupsService {
    db: DatabaseConnection,
}

impl GroupsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a group. The slug is its permanent public key.
    pub async fn create_group(
        &self,
        slug: &str,
        title: &str,
        description: &str,
    ) -> Result<GroupModel, GroupsServiceError> {
        let taken = Group::find()
            .filter(GroupColumn::Slug.eq(slug))
            .one(&self.db)
            .await?
            .is_some();

        if taken {
            return Err(GroupsServiceError::SlugTaken);
        }

        let group = GroupActiveModel {
            id: Set(GroupId::new()),
            slug: Set(slug.to_string()),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
        };

        let group = Group::insert(group).exec_with_returning(&self.db).await?;
        tracing::info!(group_id = %group.id, slug = %group.slug, "created group");
        Ok(group)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<GroupModel, GroupsServiceError> {
        Group::find()
            .filter(GroupColumn::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(GroupsServiceError::GroupNotFound)
    }

    /// All groups, alphabetical by title. These are the choices offered by the post form.
    pub async fn list_groups(&self) -> Result<Vec<GroupModel>, GroupsServiceError> {
        let groups = Group::find()
            .order_by_asc(GroupColumn::Title)
            .all(&self.db)
            .await?;

        Ok(groups)
    }
}
