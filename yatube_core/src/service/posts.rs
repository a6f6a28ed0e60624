use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::{
    entity::prelude::*,
    error::MissingRecord,
    forms::ValidPost,
    ids::{CommentId, PostId, UserId},
};

#[derive(Debug, Error)]
pub enum PostsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("post not found")]
    PostNotFound,

    #[error("unauthorized: not post author")]
    Unauthorized,
}

impl MissingRecord for PostsServiceError {
    fn is_missing(&self) -> bool {
        matches!(self, PostsServiceError::PostNotFound)
    }
}

#[derive(Clone)]
pub struct PostsService {
    db: DatabaseConnection,
}

impl PostsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Publish a post. The author is whoever is signed in, never form input.
    pub async fn create_post(
        &self,
        author_id: UserId,
        fields: ValidPost,
    ) -> Result<PostModel, PostsServiceError> {
        let post = PostActiveModel {
            id: Set(PostId::new()),
            text: Set(fields.text),
            pub_date: Set(chrono::Utc::now()),
            author_id: Set(author_id),
            group_id: Set(fields.group),
            image: Set(fields.image),
        };

        let post = Post::insert(post).exec_with_returning(&self.db).await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "created post");
        Ok(post)
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<PostModel, PostsServiceError> {
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(PostsServiceError::PostNotFound)
    }

    /// Replace a post's text and group (only by author).
    ///
    /// An absent image keeps the one already attached.
    pub async fn update_post(
        &self,
        post_id: PostId,
        editor_id: UserId,
        fields: ValidPost,
    ) -> Result<PostModel, PostsServiceError> {
        let post = self.get_post(post_id).await?;

        if post.author_id != editor_id {
            tracing::warn!(post_id = %post_id, editor_id = %editor_id, "rejected edit by non-author");
            return Err(PostsServiceError::Unauthorized);
        }

        let mut post_active: PostActiveModel = post.into();
        post_active.text = Set(fields.text);
        post_active.group_id = Set(fields.group);

        if let Some(image) = fields.image {
            post_active.image = Set(Some(image));
        }

        let updated = post_active.update(&self.db).await?;
        tracing::info!(post_id = %post_id, "updated post");
        Ok(updated)
    }

    /// Remove a post outright. No page exposes this.
    pub async fn delete_post(&self, post_id: PostId) -> Result<(), PostsServiceError> {
        let result = Post::delete_by_id(post_id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(PostsServiceError::PostNotFound);
        }

        Ok(())
    }

    pub async fn count_posts(&self) -> Result<u64, PostsServiceError> {
        Ok(Post::find().count(&self.db).await?)
    }

    pub async fn add_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        text: String,
    ) -> Result<CommentModel, PostsServiceError> {
        let post_exists = Post::find_by_id(post_id).one(&self.db).await?.is_some();

        if !post_exists {
            return Err(PostsServiceError::PostNotFound);
        }

        let comment = CommentActiveModel {
            id: Set(CommentId::new()),
            post_id: Set(post_id),
            author_id: Set(author_id),
            text: Set(text),
            created: Set(chrono::Utc::now()),
        };

        let comment = Comment::insert(comment).exec_with_returning(&self.db).await?;
        tracing::info!(comment_id = %comment.id, post_id = %post_id, "added comment");
        Ok(comment)
    }

    /// Comments on a post with their authors, oldest first (conversation order)
    pub async fn list_comments(
        &self,
        post_id: PostId,
    ) -> Result<Vec<(CommentModel, Option<UserModel>)>, PostsServiceError> {
        let comments = Comment::find()
            .filter(CommentColumn::PostId.eq(post_id))
            .find_also_related(User)
            .order_by_asc(CommentColumn::Created)
            .order_by_asc(CommentColumn::Id)
            .all(&self.db)
            .await?;

        Ok(comments)
    }
}
