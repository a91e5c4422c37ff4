use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A single vote a user cast on a comment. `vote` is either `1` or `-1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentVote {
    pub user_id: i32,
    pub vote: i16,
}

/// The flat comment row as it comes out of storage. The tree engine turns a
/// discussion's worth of these into a nested, windowed response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub discussion_id: i32,
    pub user_id: i32,
    pub content: String,
    pub published: bool,
    pub admin_unpublished: bool,
    pub up_votes: i32,
    pub down_votes: i32,
    /// Ranking score, precomputed on write. Opaque to the read path.
    pub hotness: f64,
    pub created_at: NaiveDateTime,
    pub votes: Vec<CommentVote>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
}

/// Per (user, discussion) presentation settings.
#[derive(Debug, Clone)]
pub struct DiscussionPreference {
    pub user_id: i32,
    pub discussion_id: i32,
    pub anonymous: bool,
    pub credential_id: Option<i32>,
}

/// A badge a user can attach to their display identity, e.g. "Journalist".
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: i32,
    pub description: String,
    pub verified: bool,
}

/// Read access to the reference data the comment engine needs. Everything is
/// fetched in batches, one round trip per table, so decorating a tree never
/// fans out into per-node queries.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Every comment of one discussion, unordered.
    async fn find_comments(&self, discussion_id: i32) -> Result<Vec<CommentRecord>, StoreError>;

    async fn find_users(&self, ids: &[i32]) -> Result<Vec<PublicUser>, StoreError>;

    async fn find_discussion_preferences(
        &self,
        user_ids: &[i32],
        discussion_id: i32,
    ) -> Result<Vec<DiscussionPreference>, StoreError>;

    async fn find_credentials(&self, ids: &[i32]) -> Result<Vec<Credential>, StoreError>;
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// In-memory store for engine tests.
    #[derive(Default)]
    pub struct MemoryStore {
        pub comments: Vec<CommentRecord>,
        pub users: Vec<PublicUser>,
        pub preferences: Vec<DiscussionPreference>,
        pub credentials: Vec<Credential>,
    }

    #[async_trait]
    impl CommentStore for MemoryStore {
        async fn find_comments(
            &self,
            discussion_id: i32,
        ) -> Result<Vec<CommentRecord>, StoreError> {
            Ok(self
                .comments
                .iter()
                .filter(|c| c.discussion_id == discussion_id)
                .cloned()
                .collect())
        }

        async fn find_users(&self, ids: &[i32]) -> Result<Vec<PublicUser>, StoreError> {
            Ok(self
                .users
                .iter()
                .filter(|u| ids.contains(&u.id))
                .cloned()
                .collect())
        }

        async fn find_discussion_preferences(
            &self,
            user_ids: &[i32],
            discussion_id: i32,
        ) -> Result<Vec<DiscussionPreference>, StoreError> {
            Ok(self
                .preferences
                .iter()
                .filter(|p| p.discussion_id == discussion_id && user_ids.contains(&p.user_id))
                .cloned()
                .collect())
        }

        async fn find_credentials(&self, ids: &[i32]) -> Result<Vec<Credential>, StoreError> {
            Ok(self
                .credentials
                .iter()
                .filter(|c| ids.contains(&c.id))
                .cloned()
                .collect())
        }
    }
}
