//! Canonical paths, used for redirects and as the `next` target after login.

use crate::ids::PostId;

pub const INDEX: &str = "/";
pub const POST_CREATE: &str = "/create/";
pub const FOLLOW_INDEX: &str = "/follow/";

pub fn profile(username: &str) -> String {
    format!("/profile/{username}/")
}

pub fn profile_follow(username: &str) -> String {
    format!("/profile/{username}/follow/")
}

pub fn profile_unfollow(username: &str) -> String {
    format!("/profile/{username}/unfollow/")
}

pub fn post_detail(post_id: PostId) -> String {
    format!("/posts/{post_id}/")
}

pub fn post_edit(post_id: PostId) -> String {
    format!("/posts/{post_id}/edit/")
}

pub fn add_comment(post_id: PostId) -> String {
    format!("/posts/{post_id}/comment/")
}
