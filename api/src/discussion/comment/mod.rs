pub mod create;
pub mod cursor;
pub mod decorate;
pub mod order;
pub mod resolve;
pub mod tree;
pub mod vote;

use chrono::NaiveDateTime;
use serde::Serialize;

use self::order::SortKey;
use super::store::{CommentRecord, CommentVote, Credential, PublicUser};

/// The direction of the requesting viewer's own vote on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserVote {
    Up,
    Down,
}

/// The identity shown next to a comment. Falls back to a fixed anonymous
/// label when the commenter opted out of being named in this discussion.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One level of a comment tree as returned to the client.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentConnection {
    pub total_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_total_count: Option<i32>,
    pub page_info: PageInfo,
    pub nodes: Vec<CommentNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Box<CommentNode>>,
}

// The model that will be returned to the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: i32,
    pub discussion_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub published: bool,
    pub admin_unpublished: bool,
    pub up_votes: i32,
    pub down_votes: i32,
    pub score: i32,
    pub hotness: f64,
    pub created_at: NaiveDateTime,
    pub depth: i32,
    /// The real author, only populated for editors and admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<PublicUser>,
    pub display_author: Option<DisplayAuthor>,
    pub user_vote: Option<UserVote>,
    pub user_can_edit: Option<bool>,
    pub comments: CommentConnection,

    // Never serialized: the raw votes and the author id stay server-side so
    // anonymity can't be undone by reading the payload.
    #[serde(skip)]
    pub user_id: i32,
    #[serde(skip)]
    pub votes: Vec<CommentVote>,
}

impl CommentNode {
    pub fn from_record(record: CommentRecord, depth: i32) -> Self {
        CommentNode {
            id: record.id,
            discussion_id: record.discussion_id,
            parent_id: record.parent_id,
            content: record.content,
            published: record.published,
            admin_unpublished: record.admin_unpublished,
            up_votes: record.up_votes,
            down_votes: record.down_votes,
            score: record.up_votes - record.down_votes,
            hotness: record.hotness,
            created_at: record.created_at,
            depth,
            author: None,
            display_author: None,
            user_vote: None,
            user_can_edit: None,
            comments: CommentConnection::default(),
            user_id: record.user_id,
            votes: record.votes,
        }
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey {
            created_at: self.created_at,
            score: self.score,
            hotness: self.hotness,
            id: self.id,
        }
    }
}
