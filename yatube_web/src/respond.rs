//! Turns view outcomes into HTTP responses.

use actix_web::{http::header, HttpResponse};
use yatube_core::{
    cache::CachedPage,
    config::YatubeConfig,
    views::{Template, View},
};

use crate::error::WebError;

/// Serialises a template and its context as the response body.
pub fn render(template: &Template) -> Result<CachedPage, WebError> {
    Ok(CachedPage {
        content_type: "application/json".to_string(),
        body: serde_json::to_string(template)?,
    })
}

pub fn page(page: CachedPage) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, page.content_type))
        .body(page.body)
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// `<login_url>?next=<path>`, keeping slashes readable in `next`.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let next = urlencoding::encode(next).replace("%2F", "/");
    format!("{login_url}?next={next}")
}

pub fn respond(view: View, config: &YatubeConfig) -> Result<HttpResponse, WebError> {
    match view {
        View::Render(template) => Ok(page(render(&template)?)),
        View::Redirect(location) => Ok(redirect(&location)),
        View::NotFound => Ok(HttpResponse::NotFound().finish()),
        View::AuthRequired { next } => Ok(redirect(&login_redirect(&config.login_url, &next))),
    }
}
