use actix_web::{
    http::{header, StatusCode},
    test, web, App,
};
use serde_json::Value;
use yatube_core::{
    entity::prelude::*,
    forms::{CommentFormData, PostFormData, ValidPost},
    ids::PostId,
    test_utils::{create_test_group, create_test_user, test_app},
    Yatube,
};

const USER_HEADER: &str = "x-remote-user";

macro_rules! service {
    ($app:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($app.clone()))
                .configure(yatube_web::configure),
        )
        .await
    };
}

async fn publish(app: &Yatube, author: &UserModel, text: &str, group: Option<&GroupModel>) -> PostModel {
    app.posts
        .create_post(
            author.id,
            ValidPost {
                text: text.to_string(),
                group: group.map(|g| g.id),
                image: None,
            },
        )
        .await
        .unwrap()
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("redirect without location")
        .to_str()
        .unwrap()
        .to_string()
}

async fn json(resp: actix_web::dev::ServiceResponse) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).expect("body is not json")
}

fn item_texts(page: &Value) -> Vec<String> {
    page["context"]["page_obj"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["text"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn test_public_pages_render_their_templates() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    let group = create_test_group(&app.db, "test_slug").await;
    let post = publish(&app, &author, "Test post text", Some(&group)).await;
    let service = service!(app);

    let pages = [
        ("/".to_string(), "posts/index.html"),
        ("/group/test_slug/".to_string(), "posts/group_list.html"),
        ("/profile/auth/".to_string(), "posts/profile.html"),
        (format!("/posts/{}/", post.id), "posts/post_detail.html"),
    ];

    for (uri, template) in pages {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let body = json(resp).await;
        assert_eq!(body["template"], template, "{uri}");
    }
}

#[actix_web::test]
async fn test_authorized_pages_render_forms() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    let post = publish(&app, &author, "Test post text", None).await;
    let service = service!(app);

    let req = test::TestRequest::get()
        .uri("/create/")
        .insert_header((USER_HEADER, "auth"))
        .to_request();
    let body = json(test::call_service(&service, req).await).await;
    assert_eq!(body["template"], "posts/create_post.html");
    assert_eq!(body["context"]["is_edit"], false);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header((USER_HEADER, "auth"))
        .to_request();
    let body = json(test::call_service(&service, req).await).await;
    assert_eq!(body["template"], "posts/create_post.html");
    assert_eq!(body["context"]["is_edit"], true);
    assert_eq!(body["context"]["form"]["data"]["text"], "Test post text");

    let req = test::TestRequest::get()
        .uri("/follow/")
        .insert_header((USER_HEADER, "auth"))
        .to_request();
    let body = json(test::call_service(&service, req).await).await;
    assert_eq!(body["template"], "posts/follow.html");
}

#[actix_web::test]
async fn test_anonymous_is_sent_to_login() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    let post = publish(&app, &author, "Test post text", None).await;
    let service = service!(app);

    let protected = [
        "/create/".to_string(),
        "/follow/".to_string(),
        format!("/posts/{}/edit/", post.id),
        format!("/posts/{}/comment/", post.id),
        "/profile/auth/follow/".to_string(),
        "/profile/auth/unfollow/".to_string(),
    ];

    for uri in protected {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(location(&resp), format!("/auth/login/?next={uri}"));
    }
}

#[actix_web::test]
async fn test_unknown_user_header_is_anonymous() {
    let app = test_app().await;
    let service = service!(app);

    let req = test::TestRequest::get()
        .uri("/create/")
        .insert_header((USER_HEADER, "ghost"))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}

#[actix_web::test]
async fn test_non_author_edit_redirects_to_detail() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    create_test_user(&app.db, "other").await;
    let post = publish(&app, &author, "Original", None).await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header((USER_HEADER, "other"))
        .set_form(PostFormData {
            text: "Hijacked".to_string(),
            ..PostFormData::default()
        })
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(app.posts.get_post(post.id).await.unwrap().text, "Original");
}

#[actix_web::test]
async fn test_unknown_pages_are_not_found() {
    let app = test_app().await;
    create_test_user(&app.db, "auth").await;
    let service = service!(app);

    let missing = [
        "/unexisting_page/".to_string(),
        "/group/missing/".to_string(),
        "/profile/ghost/".to_string(),
        "/posts/not-an-id/".to_string(),
        format!("/posts/{}/", PostId::new()),
    ];
    for uri in missing {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let req = test::TestRequest::get()
        .uri("/posts/not-an-id/edit/")
        .insert_header((USER_HEADER, "auth"))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_post_redirects_to_profile() {
    let app = test_app().await;
    create_test_user(&app.db, "auth").await;
    let group = create_test_group(&app.db, "test_slug").await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header((USER_HEADER, "auth"))
        .set_form(PostFormData {
            text: "Test text".to_string(),
            group: group.id.to_string(),
            image: "posts/small.gif".to_string(),
        })
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");

    assert_eq!(app.posts.count_posts().await.unwrap(), 1);
    let post = Post::find().one(&app.db).await.unwrap().unwrap();
    assert_eq!(post.text, "Test text");
    assert_eq!(post.group_id, Some(group.id));
    assert_eq!(post.image.as_deref(), Some("posts/small.gif"));
}

#[actix_web::test]
async fn test_invalid_create_rerenders_form() {
    let app = test_app().await;
    create_test_user(&app.db, "auth").await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header((USER_HEADER, "auth"))
        .set_form(PostFormData {
            text: String::new(),
            group: "bogus".to_string(),
            image: String::new(),
        })
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json(resp).await;
    let errors = &body["context"]["form"]["errors"];
    assert_eq!(errors["text"][0], "This field is required.");
    assert!(errors["group"].is_array());
    assert_eq!(body["context"]["form"]["data"]["group"], "bogus");
    assert_eq!(app.posts.count_posts().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_blank_fields_are_a_bound_form() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    let post = publish(&app, &author, "Original", None).await;
    let service = service!(app);

    for uri in ["/create/".to_string(), format!("/posts/{}/edit/", post.id)] {
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header((USER_HEADER, "auth"))
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload("text=&group=&image=")
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");

        let form = json(resp).await["context"]["form"].clone();
        assert_eq!(form["is_bound"], true, "{uri}");
        assert_eq!(form["errors"]["text"][0], "This field is required.", "{uri}");
    }

    assert_eq!(app.posts.count_posts().await.unwrap(), 1);
    assert_eq!(app.posts.get_post(post.id).await.unwrap().text, "Original");
}

#[actix_web::test]
async fn test_post_without_body_is_unbound() {
    let app = test_app().await;
    create_test_user(&app.db, "auth").await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header((USER_HEADER, "auth"))
        .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .insert_header((header::CONTENT_LENGTH, "0"))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let form = json(resp).await["context"]["form"].clone();
    assert_eq!(form["is_bound"], false);
    assert!(form["errors"].as_object().unwrap().is_empty());
}

#[actix_web::test]
async fn test_author_edit_changes_text() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    let post = publish(&app, &author, "Original", None).await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .insert_header((USER_HEADER, "auth"))
        .set_form(PostFormData {
            text: "Changed".to_string(),
            ..PostFormData::default()
        })
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    assert_eq!(app.posts.get_post(post.id).await.unwrap().text, "Changed");
    assert_eq!(app.posts.count_posts().await.unwrap(), 1);
}

#[actix_web::test]
async fn test_comment_appears_on_detail() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    create_test_user(&app.db, "reader").await;
    let post = publish(&app, &author, "Post", None).await;
    let service = service!(app);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header((USER_HEADER, "reader"))
        .set_form(CommentFormData {
            text: "Test comment".to_string(),
        })
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(Comment::find().count(&app.db).await.unwrap(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let body = json(test::call_service(&service, req).await).await;
    let comments = body["context"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "Test comment");
    assert_eq!(comments[0]["author"]["username"], "reader");
}

#[actix_web::test]
async fn test_follow_feed_tracks_follows() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    create_test_user(&app.db, "follower").await;
    create_test_user(&app.db, "stranger").await;
    publish(&app, &author, "Followed post", None).await;
    let service = service!(app);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/profile/auth/follow/")
            .insert_header((USER_HEADER, "follower"))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/follow/");
    }
    assert_eq!(app.follows.count_follows().await.unwrap(), 1);

    let feed_for = |username: &'static str| {
        test::TestRequest::get()
            .uri("/follow/")
            .insert_header((USER_HEADER, username))
            .to_request()
    };

    let body = json(test::call_service(&service, feed_for("follower")).await).await;
    assert_eq!(item_texts(&body), vec!["Followed post"]);

    let body = json(test::call_service(&service, feed_for("stranger")).await).await;
    assert!(item_texts(&body).is_empty());

    let req = test::TestRequest::get()
        .uri("/profile/auth/")
        .insert_header((USER_HEADER, "follower"))
        .to_request();
    let body = json(test::call_service(&service, req).await).await;
    assert_eq!(body["context"]["following"], true);

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/profile/auth/unfollow/")
            .insert_header((USER_HEADER, "follower"))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(location(&resp), "/follow/");
    }
    assert_eq!(app.follows.count_follows().await.unwrap(), 0);

    let body = json(test::call_service(&service, feed_for("follower")).await).await;
    assert!(item_texts(&body).is_empty());
}

#[actix_web::test]
async fn test_index_is_cached_until_cleared() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    let post = publish(&app, &author, "Cached post", None).await;
    let service = service!(app);

    let req = test::TestRequest::get().uri("/").to_request();
    let before = test::read_body(test::call_service(&service, req).await).await;

    app.posts.delete_post(post.id).await.unwrap();

    let req = test::TestRequest::get().uri("/").to_request();
    let stale = test::read_body(test::call_service(&service, req).await).await;
    assert_eq!(before, stale);

    app.cache.clear().await;

    let req = test::TestRequest::get().uri("/").to_request();
    let fresh = test::read_body(test::call_service(&service, req).await).await;
    assert_ne!(before, fresh);

    let fresh: Value = serde_json::from_slice(&fresh).unwrap();
    assert!(item_texts(&fresh).is_empty());
}

#[actix_web::test]
async fn test_feeds_paginate_by_ten() {
    let app = test_app().await;
    let author = create_test_user(&app.db, "auth").await;
    let group = create_test_group(&app.db, "test_slug").await;
    for i in 0..13 {
        publish(&app, &author, &format!("Post {i}"), Some(&group)).await;
    }
    let service = service!(app);

    for uri in ["/", "/group/test_slug/", "/profile/auth/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let body = json(test::call_service(&service, req).await).await;
        assert_eq!(item_texts(&body).len(), 10, "{uri}");
        assert_eq!(body["context"]["page_obj"]["has_next"], true);

        let req = test::TestRequest::get().uri(&format!("{uri}?page=2")).to_request();
        let body = json(test::call_service(&service, req).await).await;
        assert_eq!(item_texts(&body).len(), 3, "{uri}");
        assert_eq!(body["context"]["page_obj"]["number"], 2);

        let req = test::TestRequest::get().uri(&format!("{uri}?page=last")).to_request();
        let body = json(test::call_service(&service, req).await).await;
        assert_eq!(body["context"]["page_obj"]["number"], 1, "{uri}");
    }
}
