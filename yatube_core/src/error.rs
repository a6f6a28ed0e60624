use sea_orm::DbErr;
use thiserror::Error;

use crate::{
    config::ConfigError,
    feed::FeedError,
    service::{FollowsServiceError, GroupsServiceError, PostsServiceError, UsersServiceError},
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("data store unavailable")]
    Database(#[from] DbErr),
}

/// Failures a view cannot turn into a page or a redirect.
///
/// Missing records never end up here; views answer those with `View::NotFound`.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),
    #[error(transparent)]
    Users(#[from] UsersServiceError),
    #[error(transparent)]
    Groups(#[from] GroupsServiceError),
    #[error(transparent)]
    Posts(#[from] PostsServiceError),
    #[error(transparent)]
    Follows(#[from] FollowsServiceError),
    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Service errors that mean "the identifier did not resolve".
pub trait MissingRecord {
    fn is_missing(&self) -> bool;
}

/// Splits a lookup into found / missing / failed.
pub fn found<T, E>(result: Result<T, E>) -> Result<Option<T>, ViewError>
where
    E: MissingRecord + Into<ViewError>,
{
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_missing() => Ok(None),
        Err(e) => Err(e.into()),
    }
}
