use std::collections::HashMap;

use sea_orm::{sea_query::Query, DatabaseConnection, SelectTwo};
use serde::Serialize;
use thiserror::Error;

use crate::{
    entity::prelude::*,
    error::MissingRecord,
    ids::{GroupId, UserId},
    paginator::{paginate_query, Page, PageRequest},
    service::{
        FollowsService, FollowsServiceError, GroupsService, GroupsServiceError, UsersService,
        UsersServiceError,
    },
};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error(transparent)]
    Groups(#[from] GroupsServiceError),

    #[error(transparent)]
    Users(#[from] UsersServiceError),

    #[error(transparent)]
    Follows(#[from] FollowsServiceError),
}

impl MissingRecord for FeedError {
    fn is_missing(&self) -> bool {
        match self {
            FeedError::Groups(e) => e.is_missing(),
            FeedError::Users(e) => e.is_missing(),
            FeedError::DbError(_) | FeedError::Follows(_) => false,
        }
    }
}

/// Which posts a feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    Global,
    Group(GroupId),
    Author(UserId),
    /// Posts by everyone this user follows
    FollowedBy(UserId),
}

impl FeedScope {
    /// Posts in scope with their authors, newest first.
    pub fn select(self) -> SelectTwo<Post, User> {
        let query = match self {
            FeedScope::Global => Post::find(),
            FeedScope::Group(group_id) => Post::find().filter(PostColumn::GroupId.eq(group_id)),
            FeedScope::Author(author_id) => {
                Post::find().filter(PostColumn::AuthorId.eq(author_id))
            }
            FeedScope::FollowedBy(user_id) => Post::find().filter(
                PostColumn::AuthorId.in_subquery(
                    Query::select()
                        .column(FollowColumn::AuthorId)
                        .from(Follow)
                        .and_where(FollowColumn::UserId.eq(user_id))
                        .to_owned(),
                ),
            ),
        };

        query
            .find_also_related(User)
            .order_by_desc(PostColumn::PubDate)
            .order_by_desc(PostColumn::Id)
    }
}

/// A post as listed in a feed, with the records its summary shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    #[serde(flatten)]
    pub post: PostModel,
    pub summary: String,
    pub author: Option<UserModel>,
    pub group: Option<GroupModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub author: UserModel,
    pub page: Page<PostCard>,
    pub following: bool,
}

#[derive(Clone)]
pub struct FeedService {
    db: DatabaseConnection,
    per_page: u64,
    users: UsersService,
    groups: GroupsService,
    follows: FollowsService,
}

impl FeedService {
    pub fn new(db: DatabaseConnection, per_page: u64) -> Self {
        Self {
            users: UsersService::new(db.clone()),
            groups: GroupsService::new(db.clone()),
            follows: FollowsService::new(db.clone()),
            db,
            per_page,
        }
    }

    pub async fn posts(
        &self,
        scope: FeedScope,
        request: PageRequest,
    ) -> Result<Page<PostCard>, FeedError> {
        let page = paginate_query(scope.select(), request, self.per_page, &self.db).await?;
        self.attach_groups(page).await
    }

    pub async fn global(&self, request: PageRequest) -> Result<Page<PostCard>, FeedError> {
        self.posts(FeedScope::Global, request).await
    }

    pub async fn group(
        &self,
        slug: &str,
        request: PageRequest,
    ) -> Result<(GroupModel, Page<PostCard>), FeedError> {
        let group = self.groups.get_by_slug(slug).await?;

        let page = self.posts(FeedScope::Group(group.id), request).await?;
        Ok((group, page))
    }

    /// An author's posts, plus whether `viewer` follows them. Anonymous
    /// viewers and authors viewing themselves never count as following.
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<&UserModel>,
        request: PageRequest,
    ) -> Result<ProfileFeed, FeedError> {
        let author = self.users.get_by_username(username).await?;

        let following = match viewer {
            Some(viewer) if viewer.id != author.id => {
                self.follows.is_following(viewer.id, author.id).await?
            }
            _ => false,
        };

        let page = self.posts(FeedScope::Author(author.id), request).await?;
        Ok(ProfileFeed {
            author,
            page,
            following,
        })
    }

    pub async fn following(
        &self,
        user: &UserModel,
        request: PageRequest,
    ) -> Result<Page<PostCard>, FeedError> {
        self.posts(FeedScope::FollowedBy(user.id), request).await
    }

    /// Single post with its author and group, as shown on the detail page.
    pub async fn card(&self, post: PostModel) -> Result<PostCard, FeedError> {
        let author = post.find_related(User).one(&self.db).await?;
        let group = match post.group_id {
            Some(_) => post.find_related(Group).one(&self.db).await?,
            None => None,
        };

        Ok(PostCard {
            summary: post.summary().to_string(),
            post,
            author,
            group,
        })
    }

    /// Load the groups of one page in a single query.
    pub async fn attach_groups(
        &self,
        page: Page<(PostModel, Option<UserModel>)>,
    ) -> Result<Page<PostCard>, FeedError> {
        let group_ids: Vec<GroupId> = page.items.iter().filter_map(|(p, _)| p.group_id).collect();

        let groups: HashMap<GroupId, GroupModel> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            Group::find()
                .filter(GroupColumn::Id.is_in(group_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|g| (g.id, g))
                .collect()
        };

        Ok(page.map(|(post, author)| {
            let group = post.group_id.and_then(|id| groups.get(&id).cloned());
            PostCard {
                summary: post.summary().to_string(),
                post,
                author,
                group,
            }
        }))
    }
}
