//! Fixtures shared by the unit tests here and the HTTP tests of the web crate.

use std::{path::Path, sync::Arc};

use sea_orm_migration::MigratorTrait;

use crate::{
    cache::MemoryPageCache, config::YatubeConfig, entity::prelude::*, ids::{GroupId, UserId},
    models::migrator::Migrator, Yatube,
};

/// Fresh in-memory SQLite database with all migrations applied.
/// Each call is an isolated instance.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn test_config() -> YatubeConfig {
    YatubeConfig::new(Path::new(":memory:"))
}

/// A complete application over an in-memory database and an empty page cache.
pub async fn test_app() -> Yatube {
    Yatube::with_connection(test_config(), setup_test_db().await, Arc::new(MemoryPageCache::new()))
}

pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> UserModel {
    let user = UserActiveModel {
        id: Set(UserId::new()),
        username: Set(username.to_string()),
        created_at: Set(chrono::Utc::now()),
    };
    User::insert(user).exec_with_returning(db).await.unwrap()
}

pub async fn create_test_group(db: &DatabaseConnection, slug: &str) -> GroupModel {
    let group = GroupActiveModel {
        id: Set(GroupId::new()),
        slug: Set(slug.to_string()),
        title: Set(format!("Group {slug}")),
        description: Set("Test description".to_string()),
    };
    Group::insert(group).exec_with_returning(db).await.unwrap()
}
