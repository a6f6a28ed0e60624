pub mod entity;
pub mod ids;
pub mod models;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    cache::{MemoryPageCache, PageCache},
    config::YatubeConfig,
    error::StartupError,
    feed::FeedService,
    service::{FollowsService, GroupsService, PostsService, UsersService},
};

pub mod service;

pub mod error;

pub mod config;

pub mod cache;
pub mod feed;
pub mod forms;
pub mod paginator;
pub mod urls;
pub mod views;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Main runtime handle for Yatube. Cheap to clone; every handler gets one.
#[derive(Clone)]
pub struct Yatube {
    pub config: YatubeConfig,

    pub db: DatabaseConnection,

    /// Rendered index pages, shared by every worker.
    pub cache: Arc<dyn PageCache>,

    pub users: UsersService,
    pub groups: GroupsService,
    pub posts: PostsService,
    pub follows: FollowsService,
    pub feed: FeedService,
}

impl Yatube {
    pub async fn start(config: YatubeConfig) -> Result<Self, StartupError> {
        // DB + migrations
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        Ok(Self::with_connection(
            config,
            db,
            Arc::new(MemoryPageCache::new()),
        ))
    }

    pub fn with_connection(
        config: YatubeConfig,
        db: DatabaseConnection,
        cache: Arc<dyn PageCache>,
    ) -> Self {
        Self {
            users: UsersService::new(db.clone()),
            groups: GroupsService::new(db.clone()),
            posts: PostsService::new(db.clone()),
            follows: FollowsService::new(db.clone()),
            feed: FeedService::new(db.clone(), config.posts_per_page),
            config,
            db,
            cache,
        }
    }

    pub async fn shutdown(self) -> Result<(), StartupError> {
        self.db.close().await?;
        tracing::info!("database closed");
        Ok(())
    }
}

pub mod prelude {
    pub use super::ids;
    pub use super::entity;
    pub use super::models;

    pub use super::service;

    pub use super::error;

    pub use super::config;

    pub use super::{cache, feed, forms, paginator, urls, views};

    pub use super::Yatube;
}
