pub mod error;
pub mod handlers;
pub mod respond;

use actix_web::web;

pub use handlers::AppState;

/// Registers every Yatube route. Expects an [`AppState`] in the app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/group/{slug}/", web::get().to(handlers::group_posts))
        .route("/profile/{username}/", web::get().to(handlers::profile))
        .service(
            web::resource("/profile/{username}/follow/")
                .route(web::get().to(handlers::profile_follow))
                .route(web::post().to(handlers::profile_follow)),
        )
        .service(
            web::resource("/profile/{username}/unfollow/")
                .route(web::get().to(handlers::profile_unfollow))
                .route(web::post().to(handlers::profile_unfollow)),
        )
        .route("/posts/{post_id}/", web::get().to(handlers::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(handlers::post_edit))
                .route(web::post().to(handlers::post_edit)),
        )
        .service(
            web::resource("/posts/{post_id}/comment/")
                .route(web::get().to(handlers::add_comment))
                .route(web::post().to(handlers::add_comment)),
        )
        .service(
            web::resource("/create/")
                .route(web::get().to(handlers::post_create))
                .route(web::post().to(handlers::post_create)),
        )
        .route("/follow/", web::get().to(handlers::follow_index))
        .default_service(web::to(handlers::default_service));
}
