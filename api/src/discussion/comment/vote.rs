use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::{App, error::AppError, identity::AuthUser};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub up_votes: i32,
    pub down_votes: i32,
    pub score: i32,
}

#[debug_handler]
pub async fn upvote_comment(
    State(ctx): State<App>,
    Path((discussion_id, comment_id)): Path<(i32, i32)>,
    AuthUser(auth_user): AuthUser,
) -> Result<Json<VoteResult>, AppError> {
    apply_vote(&ctx.pool, discussion_id, comment_id, auth_user.id, Some(1)).await
}

#[debug_handler]
pub async fn downvote_comment(
    State(ctx): State<App>,
    Path((discussion_id, comment_id)): Path<(i32, i32)>,
    AuthUser(auth_user): AuthUser,
) -> Result<Json<VoteResult>, AppError> {
    apply_vote(&ctx.pool, discussion_id, comment_id, auth_user.id, Some(-1)).await
}

#[debug_handler]
pub async fn unvote_comment(
    State(ctx): State<App>,
    Path((discussion_id, comment_id)): Path<(i32, i32)>,
    AuthUser(auth_user): AuthUser,
) -> Result<Json<VoteResult>, AppError> {
    apply_vote(&ctx.pool, discussion_id, comment_id, auth_user.id, None).await
}

/// One vote per (comment, user); voting again replaces the previous vote,
/// `None` removes it. The denormalized counters on the comment row are
/// refreshed in the same round.
async fn apply_vote(
    pool: &Pool<Postgres>,
    discussion_id: i32,
    comment_id: i32,
    user_id: i32,
    vote: Option<i16>,
) -> Result<Json<VoteResult>, AppError> {
    let exists = sqlx::query_as::<_, (bool,)>(
        "
        SELECT EXISTS (
            SELECT id FROM comments WHERE id = $1 AND discussion_id = $2
        );
        ",
    )
    .bind(comment_id)
    .bind(discussion_id)
    .fetch_one(pool)
    .await?;

    if !exists.0 {
        return Err(("Comment not found in this discussion", StatusCode::NOT_FOUND))?;
    }

    match vote {
        Some(value) => {
            sqlx::query(
                "
                INSERT INTO comment_votes (comment_id, user_id, vote)
                VALUES ($1, $2, $3)
                ON CONFLICT (comment_id, user_id) DO UPDATE SET vote = EXCLUDED.vote;
                ",
            )
            .bind(comment_id)
            .bind(user_id)
            .bind(value)
            .execute(pool)
            .await?;
        }
        None => {
            sqlx::query(
                "
                DELETE FROM comment_votes WHERE comment_id = $1 AND user_id = $2;
                ",
            )
            .bind(comment_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        }
    }

    let (up_votes, down_votes) = sqlx::query_as::<_, (i32, i32)>(
        "
        UPDATE comments SET
            up_votes = (
                SELECT COUNT(*) FROM comment_votes WHERE comment_id = $1 AND vote = 1
            )::int,
            down_votes = (
                SELECT COUNT(*) FROM comment_votes WHERE comment_id = $1 AND vote = -1
            )::int
        WHERE id = $1
        RETURNING up_votes, down_votes;
        ",
    )
    .bind(comment_id)
    .fetch_one(pool)
    .await?;

    Ok(Json(VoteResult {
        up_votes,
        down_votes,
        score: up_votes - down_votes,
    }))
}
