use axum::{
    Router,
    routing::{get, post},
};

use crate::App;

use super::comment::{
    create::create_comment,
    resolve::get_comments,
    vote::{downvote_comment, unvote_comment, upvote_comment},
};

pub fn route() -> Router<App> {
    // TODO rate limit these public endpoints
    Router::<App>::new()
        .route("/{id}/comments", get(get_comments).post(create_comment))
        .route("/{id}/comments/{comment_id}/upvote", post(upvote_comment))
        .route(
            "/{id}/comments/{comment_id}/downvote",
            post(downvote_comment),
        )
        .route("/{id}/comments/{comment_id}/unvote", post(unvote_comment))
}
