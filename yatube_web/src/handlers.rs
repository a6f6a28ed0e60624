use actix_web::{
    http::{header, Method},
    web, HttpRequest, HttpResponse,
};
use serde::Deserialize;
use yatube_core::{
    cache::index_key,
    entity::prelude::UserModel,
    forms::{CommentFormData, PostFormData},
    ids::PostId,
    paginator::PageRequest,
    views::{self, View},
    Yatube,
};

use crate::{error::WebError, respond::respond};

pub type AppState = web::Data<Yatube>;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

/// The signed-in user named by the configured header. A missing header or
/// an unknown username is an anonymous visitor.
pub async fn viewer(req: &HttpRequest, app: &Yatube) -> Result<Option<UserModel>, WebError> {
    let username = req
        .headers()
        .get(app.config.remote_user_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|username| !username.is_empty());

    match username {
        Some(username) => Ok(app.users.find_by_username(username).await?),
        None => Ok(None),
    }
}

/// Only non-empty POST bodies count as submissions. A body that fails to
/// decode is treated as no submission. Blank fields still make a bound form.
fn submission<T>(req: &HttpRequest, form: Option<web::Form<T>>) -> Option<T> {
    if req.method() != Method::POST || body_is_empty(req) {
        return None;
    }

    form.map(web::Form::into_inner)
}

fn body_is_empty(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|length| length.trim() == "0")
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}

pub async fn default_service() -> HttpResponse {
    not_found()
}

/// Whole rendered pages are cached, so a hit skips the database entirely.
pub async fn index(app: AppState, query: web::Query<PageQuery>) -> Result<HttpResponse, WebError> {
    let page = query.request();
    let key = index_key(page);

    if let Some(cached) = app.cache.get(&key).await {
        return Ok(crate::respond::page(cached));
    }

    match views::index(&app, page).await? {
        View::Render(template) => {
            let rendered = crate::respond::render(&template)?;
            app.cache
                .set(&key, rendered.clone(), app.config.index_cache_ttl())
                .await;
            Ok(crate::respond::page(rendered))
        }
        other => respond(other, &app.config),
    }
}

pub async fn group_posts(
    app: AppState,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, WebError> {
    let view = views::group_posts(&app, &slug, query.request()).await?;
    respond(view, &app.config)
}

pub async fn profile(
    req: HttpRequest,
    app: AppState,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, WebError> {
    let viewer = viewer(&req, &app).await?;
    let view = views::profile(&app, viewer.as_ref(), &username, query.request()).await?;
    respond(view, &app.config)
}

pub async fn post_detail(
    app: AppState,
    post_id: web::Path<String>,
) -> Result<HttpResponse, WebError> {
    let Ok(post_id) = PostId::parse_str(&post_id) else {
        return Ok(not_found());
    };

    let view = views::post_detail(&app, post_id).await?;
    respond(view, &app.config)
}

pub async fn post_create(
    req: HttpRequest,
    app: AppState,
    form: Option<web::Form<PostFormData>>,
) -> Result<HttpResponse, WebError> {
    let viewer = viewer(&req, &app).await?;
    let view = views::post_create(&app, viewer.as_ref(), submission(&req, form)).await?;
    respond(view, &app.config)
}

pub async fn post_edit(
    req: HttpRequest,
    app: AppState,
    post_id: web::Path<String>,
    form: Option<web::Form<PostFormData>>,
) -> Result<HttpResponse, WebError> {
    let Ok(post_id) = PostId::parse_str(&post_id) else {
        return Ok(not_found());
    };

    let viewer = viewer(&req, &app).await?;
    let view = views::post_edit(&app, viewer.as_ref(), post_id, submission(&req, form)).await?;
    respond(view, &app.config)
}

pub async fn add_comment(
    req: HttpRequest,
    app: AppState,
    post_id: web::Path<String>,
    form: Option<web::Form<CommentFormData>>,
) -> Result<HttpResponse, WebError> {
    let Ok(post_id) = PostId::parse_str(&post_id) else {
        return Ok(not_found());
    };

    let viewer = viewer(&req, &app).await?;
    let view = views::add_comment(&app, viewer.as_ref(), post_id, submission(&req, form)).await?;
    respond(view, &app.config)
}

pub async fn follow_index(
    req: HttpRequest,
    app: AppState,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, WebError> {
    let viewer = viewer(&req, &app).await?;
    let view = views::follow_index(&app, viewer.as_ref(), query.request()).await?;
    respond(view, &app.config)
}

pub async fn profile_follow(
    req: HttpRequest,
    app: AppState,
    username: web::Path<String>,
) -> Result<HttpResponse, WebError> {
    let viewer = viewer(&req, &app).await?;
    let view = views::profile_follow(&app, viewer.as_ref(), &username).await?;
    respond(view, &app.config)
}

pub async fn profile_unfollow(
    req: HttpRequest,
    app: AppState,
    username: web::Path<String>,
) -> Result<HttpResponse, WebError> {
    let viewer = viewer(&req, &app).await?;
    let view = views::profile_unfollow(&app, viewer.as_ref(), &username).await?;
    respond(view, &app.config)
}
