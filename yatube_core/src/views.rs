//! Request handlers.
//!
//! Every handler starts with its guard clauses (authentication, lookups,
//! ownership) and ends in exactly one [`View`] outcome. Turning outcomes
//! into responses is the web layer's job.

use serde::Serialize;

use crate::{
    entity::prelude::*,
    error::{found, ViewError},
    feed::PostCard,
    forms::{validate_comment, validate_post, CommentFormData, FormState, PostFormData},
    ids::PostId,
    paginator::{Page, PageRequest},
    service::PostsServiceError,
    urls, Yatube,
};

/// Signed-in user, if any.
pub type Viewer<'a> = Option<&'a UserModel>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentCard {
    #[serde(flatten)]
    pub comment: CommentModel,
    pub author: Option<UserModel>,
}

/// A page to render: template name plus its context.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "template", content = "context")]
pub enum Template {
    #[serde(rename = "posts/index.html")]
    Index { page_obj: Page<PostCard> },

    #[serde(rename = "posts/group_list.html")]
    GroupList {
        group: GroupModel,
        page_obj: Page<PostCard>,
    },

    #[serde(rename = "posts/profile.html")]
    Profile {
        author: UserModel,
        page_obj: Page<PostCard>,
        following: bool,
    },

    #[serde(rename = "posts/post_detail.html")]
    PostDetail {
        post: PostCard,
        comments: Vec<CommentCard>,
        form: FormState<CommentFormData>,
    },

    /// Shared by create and edit; `is_edit` tells them apart.
    #[serde(rename = "posts/create_post.html")]
    PostForm {
        form: FormState<PostFormData>,
        groups: Vec<GroupModel>,
        is_edit: bool,
    },

    #[serde(rename = "posts/follow.html")]
    Follow { page_obj: Page<PostCard> },
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Template::Index { .. } => "posts/index.html",
            Template::GroupList { .. } => "posts/group_list.html",
            Template::Profile { .. } => "posts/profile.html",
            Template::PostDetail { .. } => "posts/post_detail.html",
            Template::PostForm { .. } => "posts/create_post.html",
            Template::Follow { .. } => "posts/follow.html",
        }
    }
}

#[derive(Debug, Clone)]
pub enum View {
    Render(Template),
    Redirect(String),
    NotFound,
    /// Anonymous visitor on a protected page; `next` is where to resume after login.
    AuthRequired { next: String },
}

fn login_required(next: impl Into<String>) -> View {
    View::AuthRequired { next: next.into() }
}

pub async fn index(app: &Yatube, page: PageRequest) -> Result<View, ViewError> {
    let page_obj = app.feed.global(page).await?;
    Ok(View::Render(Template::Index { page_obj }))
}

pub async fn group_posts(app: &Yatube, slug: &str, page: PageRequest) -> Result<View, ViewError> {
    let Some((group, page_obj)) = found(app.feed.group(slug, page).await)? else {
        return Ok(View::NotFound);
    };

    Ok(View::Render(Template::GroupList { group, page_obj }))
}

pub async fn profile(
    app: &Yatube,
    viewer: Viewer<'_>,
    username: &str,
    page: PageRequest,
) -> Result<View, ViewError> {
    let Some(feed) = found(app.feed.profile(username, viewer, page).await)? else {
        return Ok(View::NotFound);
    };

    Ok(View::Render(Template::Profile {
        author: feed.author,
        page_obj: feed.page,
        following: feed.following,
    }))
}

/// Shows the comment form but never processes it; see [`add_comment`].
pub async fn post_detail(app: &Yatube, post_id: PostId) -> Result<View, ViewError> {
    let Some(post) = found(app.posts.get_post(post_id).await)? else {
        return Ok(View::NotFound);
    };

    let comments = app
        .posts
        .list_comments(post.id)
        .await?
        .into_iter()
        .map(|(comment, author)| CommentCard { comment, author })
        .collect();
    let post = app.feed.card(post).await?;

    Ok(View::Render(Template::PostDetail {
        post,
        comments,
        form: FormState::unbound(),
    }))
}

/// `submission` is `None` for GET. Any submitted form is bound, even with every field blank.
pub async fn post_create(
    app: &Yatube,
    viewer: Viewer<'_>,
    submission: Option<PostFormData>,
) -> Result<View, ViewError> {
    let Some(user) = viewer else {
        return Ok(login_required(urls::POST_CREATE));
    };

    let groups = app.groups.list_groups().await?;

    let Some(data) = submission else {
        return Ok(View::Render(Template::PostForm {
            form: FormState::unbound(),
            groups,
            is_edit: false,
        }));
    };

    match validate_post(&data, &groups) {
        Ok(fields) => {
            app.posts.create_post(user.id, fields).await?;
            Ok(View::Redirect(urls::profile(&user.username)))
        }
        Err(errors) => Ok(View::Render(Template::PostForm {
            form: FormState::invalid(data, errors),
            groups,
            is_edit: false,
        })),
    }
}

/// Anyone but the author is quietly sent back to the post.
pub async fn post_edit(
    app: &Yatube,
    viewer: Viewer<'_>,
    post_id: PostId,
    submission: Option<PostFormData>,
) -> Result<View, ViewError> {
    let Some(user) = viewer else {
        return Ok(login_required(urls::post_edit(post_id)));
    };

    let Some(post) = found(app.posts.get_post(post_id).await)? else {
        return Ok(View::NotFound);
    };

    if post.author_id != user.id {
        return Ok(View::Redirect(urls::post_detail(post.id)));
    }

    let groups = app.groups.list_groups().await?;

    let Some(data) = submission else {
        return Ok(View::Render(Template::PostForm {
            form: FormState::initial(PostFormData::from_post(&post)),
            groups,
            is_edit: true,
        }));
    };

    match validate_post(&data, &groups) {
        Ok(fields) => match app.posts.update_post(post.id, user.id, fields).await {
            Ok(_) | Err(PostsServiceError::Unauthorized) => {
                Ok(View::Redirect(urls::post_detail(post.id)))
            }
            Err(PostsServiceError::PostNotFound) => Ok(View::NotFound),
            Err(e) => Err(e.into()),
        },
        Err(errors) => Ok(View::Render(Template::PostForm {
            form: FormState::invalid(data, errors),
            groups,
            is_edit: true,
        })),
    }
}

/// Always lands back on the post. Validation errors are dropped, not shown.
pub async fn add_comment(
    app: &Yatube,
    viewer: Viewer<'_>,
    post_id: PostId,
    submission: Option<CommentFormData>,
) -> Result<View, ViewError> {
    let Some(user) = viewer else {
        return Ok(login_required(urls::add_comment(post_id)));
    };

    let Some(post) = found(app.posts.get_post(post_id).await)? else {
        return Ok(View::NotFound);
    };

    match submission.as_ref().map(validate_comment) {
        Some(Ok(text)) => {
            let added = app.posts.add_comment(post.id, user.id, text).await;
            if found(added)?.is_none() {
                return Ok(View::NotFound);
            }
        }
        Some(Err(errors)) => {
            tracing::debug!(post_id = %post.id, ?errors, "discarding invalid comment");
        }
        None => {}
    }

    Ok(View::Redirect(urls::post_detail(post.id)))
}

pub async fn follow_index(
    app: &Yatube,
    viewer: Viewer<'_>,
    page: PageRequest,
) -> Result<View, ViewError> {
    let Some(user) = viewer else {
        return Ok(login_required(urls::FOLLOW_INDEX));
    };

    let page_obj = app.feed.following(user, page).await?;
    Ok(View::Render(Template::Follow { page_obj }))
}

pub async fn profile_follow(
    app: &Yatube,
    viewer: Viewer<'_>,
    username: &str,
) -> Result<View, ViewError> {
    let Some(user) = viewer else {
        return Ok(login_required(urls::profile_follow(username)));
    };

    let Some(author) = found(app.users.get_by_username(username).await)? else {
        return Ok(View::NotFound);
    };

    app.follows.follow(user.id, author.id).await?;
    Ok(View::Redirect(urls::FOLLOW_INDEX.to_string()))
}

pub async fn profile_unfollow(
    app: &Yatube,
    viewer: Viewer<'_>,
    username: &str,
) -> Result<View, ViewError> {
    let Some(user) = viewer else {
        return Ok(login_required(urls::profile_unfollow(username)));
    };

    let Some(author) = found(app.users.get_by_username(username).await)? else {
        return Ok(View::NotFound);
    };

    app.follows.unfollow(user.id, author.id).await?;
    Ok(View::Redirect(urls::FOLLOW_INDEX.to_string()))
}
