use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, Pool, Postgres, types::Json};

use super::store::{
    CommentRecord, CommentStore, CommentVote, Credential, DiscussionPreference, PublicUser,
    StoreError,
};

/// `CommentStore` backed by the Postgres pool the rest of the server uses.
#[derive(Clone)]
pub struct PgCommentStore {
    pool: Pool<Postgres>,
}

impl PgCommentStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CommentRow {
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
    votes: Json<Vec<CommentVote>>,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
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
            votes: row.votes.0,
        }
    }
}

#[derive(FromRow)]
struct PreferenceRow {
    user_id: i32,
    discussion_id: i32,
    anonymous: bool,
    credential_id: Option<i32>,
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn find_comments(&self, discussion_id: i32) -> Result<Vec<CommentRecord>, StoreError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "
            SELECT
                c.id,
                c.parent_id,
                c.discussion_id,
                c.user_id,
                c.content,
                c.published,
                c.admin_unpublished,
                c.up_votes,
                c.down_votes,
                c.hotness,
                c.created_at,
                COALESCE(v.votes, '[]'::json) AS votes
            FROM comments c
            LEFT JOIN (
                SELECT
                    comment_id,
                    json_agg(json_build_object('userId', user_id, 'vote', vote)) AS votes
                FROM comment_votes
                GROUP BY comment_id
            ) v ON v.comment_id = c.id
            WHERE c.discussion_id = $1;
            ",
        )
        .bind(discussion_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn find_users(&self, ids: &[i32]) -> Result<Vec<PublicUser>, StoreError> {
        let rows = sqlx::query_as::<_, (i32, String)>(
            "
            SELECT id, name FROM users WHERE id = ANY($1);
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| PublicUser { id, name })
            .collect())
    }

    async fn find_discussion_preferences(
        &self,
        user_ids: &[i32],
        discussion_id: i32,
    ) -> Result<Vec<DiscussionPreference>, StoreError> {
        let rows = sqlx::query_as::<_, PreferenceRow>(
            "
            SELECT user_id, discussion_id, anonymous, credential_id
            FROM discussion_preferences
            WHERE discussion_id = $1 AND user_id = ANY($2);
            ",
        )
        .bind(discussion_id)
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DiscussionPreference {
                user_id: r.user_id,
                discussion_id: r.discussion_id,
                anonymous: r.anonymous,
                credential_id: r.credential_id,
            })
            .collect())
    }

    async fn find_credentials(&self, ids: &[i32]) -> Result<Vec<Credential>, StoreError> {
        let rows = sqlx::query_as::<_, (i32, String, bool)>(
            "
            SELECT id, description, verified FROM credentials WHERE id = ANY($1);
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, description, verified)| Credential {
                id,
                description,
                verified,
            })
            .collect())
    }
}
