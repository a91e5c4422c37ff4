use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::FromRow;

use crate::{App, error::AppError, identity::AuthUser};

use crate::discussion::store::CommentRecord;

#[debug_handler]
pub async fn create_comment(
    State(ctx): State<App>,
    Path(discussion_id): Path<i32>,
    AuthUser(auth_user): AuthUser,
    crate::json::Json(mut comment): crate::json::Json<CommentSubmission>,
) -> Result<Json<CommentRecord>, AppError> {
    comment
        .validate()
        .map_err(|e| (e, StatusCode::BAD_REQUEST))?;

    let exists = sqlx::query_as::<_, (bool,)>(
        "
        SELECT EXISTS (
            SELECT id FROM discussions WHERE id = $1
        );
        ",
    )
    .bind(discussion_id)
    .fetch_one(&ctx.pool)
    .await?;

    if !exists.0 {
        return Err(("Discussion not found", StatusCode::NOT_FOUND))?;
    }

    // check if the parent comment actually belongs to the discussion
    if let Some(parent_id) = comment.parent_id {
        let exists = sqlx::query_as::<_, (bool,)>(
            "
            SELECT EXISTS (
                SELECT id FROM comments WHERE id = $1 AND discussion_id = $2
            );
            ",
        )
        .bind(parent_id)
        .bind(discussion_id)
        .fetch_one(&ctx.pool)
        .await?;

        if !exists.0 {
            return Err((
                "You're replying to a comment that does not belong to this discussion",
                StatusCode::BAD_REQUEST,
            ))?;
        }
    }

    let row = sqlx::query_as::<_, InsertedRow>(
        "
        INSERT INTO comments (discussion_id, parent_id, user_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING
            id,
            parent_id,
            discussion_id,
            user_id,
            content,
            published,
            admin_unpublished,
            up_votes,
            down_votes,
            hotness,
            created_at;
        ",
    )
    .bind(discussion_id)
    .bind(comment.parent_id)
    .bind(auth_user.id)
    .bind(&comment.content)
    .fetch_one(&ctx.pool)
    .await?;

    Ok(Json(row.into()))
}

#[derive(FromRow)]
struct InsertedRow {
    id: i32,
    parent_id: Option<i32>,
    discussion_id: i32,
    user_id: i32,
    content: String,
    published: bool,
    admin_unpublished: bool,
    up_votes: i32,
    down_votes: i32,
    hotness: f64,
    created_at: NaiveDateTime,
}

impl From<InsertedRow> for CommentRecord {
    fn from(row: InsertedRow) -> Self {
        CommentRecord {
            id: row.id,
            parent_id: row.parent_id,
            discussion_id: row.discussion_id,
            user_id: row.user_id,
            content: row.content,
            published: row.published,
            admin_unpublished: row.admin_unpublished,
            up_votes: row.up_votes,
            down_votes: row.down_votes,
            hotness: row.hotness,
            created_at: row.created_at,
            votes: vec![],
        }
    }
}

#[derive(Deserialize)]
pub struct CommentSubmission {
    content: String,
    parent_id: Option<i32>,
}

impl CommentSubmission {
    fn validate(&mut self) -> Result<(), &'static str> {
        self.content = self.content.trim().to_string();

        if self.content.is_empty() {
            return Err("No content provided");
        }

        if self.content.len() > 5000 {
            return Err("Content too long (max 5000 characters)");
        }

        Ok(())
    }
}
