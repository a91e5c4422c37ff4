use std::collections::HashMap;

use futures::try_join;

use super::tree::{CoveredComment, Tree};
use super::{CommentNode, DisplayAuthor, UserVote};
use crate::discussion::store::{
    CommentStore, Credential, DiscussionPreference, PublicUser, StoreError,
};
use crate::identity::Viewer;

/// What unpublished comments show instead of their content.
pub const REMOVED_PLACEHOLDER: &str = "This comment has been removed.";

/// Display name for commenters who opted into anonymity, and fallback when
/// the author can't be resolved at all.
pub const ANONYMOUS_NAME: &str = "Anonymous";

struct Decoration<'a> {
    users: HashMap<i32, PublicUser>,
    preferences: HashMap<i32, DiscussionPreference>,
    credentials: HashMap<i32, Credential>,
    show_real_author: bool,
    viewer: Option<&'a Viewer>,
}

/// Rewrites every surviving node with viewer-specific, privacy-aware
/// presentation data. This is the only stage that touches the store: three
/// batched lookups over the covered list (taken before pruning, so the batch
/// shape doesn't depend on how much windowing removed), never per node.
pub async fn decorate<S: CommentStore + ?Sized>(
    store: &S,
    tree: &mut Tree,
    covered: &[CoveredComment],
    discussion_id: i32,
    viewer: Option<&Viewer>,
) -> Result<(), StoreError> {
    if covered.is_empty() {
        return Ok(());
    }

    let mut user_ids: Vec<i32> = covered.iter().map(|c| c.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let (users, preferences) = try_join!(
        store.find_users(&user_ids),
        store.find_discussion_preferences(&user_ids, discussion_id),
    )?;

    let mut credential_ids: Vec<i32> = preferences.iter().filter_map(|p| p.credential_id).collect();
    credential_ids.sort_unstable();
    credential_ids.dedup();
    let credentials = if credential_ids.is_empty() {
        Vec::new()
    } else {
        store.find_credentials(&credential_ids).await?
    };

    let decoration = Decoration {
        users: users.into_iter().map(|u| (u.id, u)).collect(),
        preferences: preferences.into_iter().map(|p| (p.user_id, p)).collect(),
        credentials: credentials.into_iter().map(|c| (c.id, c)).collect(),
        show_real_author: viewer.is_some_and(|v| v.role.is_elevated()),
        viewer,
    };
    for node in &mut tree.comments.nodes {
        decoration.decorate_node(node);
    }
    Ok(())
}

impl Decoration<'_> {
    fn decorate_node(&self, node: &mut CommentNode) {
        if !node.published || node.admin_unpublished {
            node.content = REMOVED_PLACEHOLDER.to_string();
        }

        let user = self.users.get(&node.user_id);
        if user.is_none() {
            // inconsistent reference data must not take the discussion down
            tracing::warn!(
                comment_id = node.id,
                user_id = node.user_id,
                "comment author has no matching user row"
            );
        }
        if self.show_real_author {
            node.author = user.cloned();
        }

        let preference = self.preferences.get(&node.user_id);
        let anonymous = preference.is_some_and(|p| p.anonymous);
        let credential = preference
            .and_then(|p| p.credential_id)
            .and_then(|id| self.credentials.get(&id))
            .cloned();
        let name = if anonymous {
            ANONYMOUS_NAME.to_string()
        } else {
            user.map(|u| u.name.clone())
                .unwrap_or_else(|| ANONYMOUS_NAME.to_string())
        };
        node.display_author = Some(DisplayAuthor { name, credential });

        if let Some(viewer) = self.viewer {
            node.user_vote = node
                .votes
                .iter()
                .find(|v| v.user_id == viewer.id)
                .and_then(|v| match v.vote {
                    1 => Some(UserVote::Up),
                    -1 => Some(UserVote::Down),
                    _ => None,
                });
            node.user_can_edit = Some(node.user_id == viewer.id);
        }

        for child in &mut node.comments.nodes {
            self.decorate_node(child);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::discussion::comment::order::{CommentOrder, OrderBy, OrderDirection};
    use crate::discussion::comment::tree;
    use crate::discussion::store::testing::MemoryStore;
    use crate::discussion::store::{CommentRecord, CommentVote};
    use crate::identity::Role;
    use chrono::NaiveDate;

    fn record(id: i32, parent_id: Option<i32>, user_id: i32) -> CommentRecord {
        CommentRecord {
            id,
            parent_id,
            discussion_id: 1,
            user_id,
            content: format!("comment {id}"),
            published: true,
            admin_unpublished: false,
            up_votes: 0,
            down_votes: 0,
            hotness: 0.0,
            created_at: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + chrono::Duration::minutes(id as i64),
            votes: vec![],
        }
    }

    fn user(id: i32, name: &str) -> PublicUser {
        PublicUser {
            id,
            name: name.into(),
        }
    }

    fn viewer(id: i32, role: Role) -> Viewer {
        Viewer {
            id,
            name: format!("viewer {id}"),
            role,
        }
    }

    async fn decorated(
        store: &MemoryStore,
        rows: Vec<CommentRecord>,
        viewer: Option<&Viewer>,
    ) -> Tree {
        let order = CommentOrder {
            by: OrderBy::Date,
            direction: OrderDirection::Asc,
        };
        let (mut tree, covered) = tree::assemble(None, rows, None, &order);
        tree::measure(&mut tree);
        tree::sort(&mut tree, &order);
        decorate(store, &mut tree, &covered, 1, viewer).await.unwrap();
        tree
    }

    #[tokio::test]
    async fn unpublished_content_is_replaced_for_everyone() {
        // scenario D: redaction happens regardless of viewer
        let store = MemoryStore {
            users: vec![user(10, "Alice")],
            ..Default::default()
        };
        let mut row = record(1, None, 10);
        row.published = false;

        let admin = viewer(99, Role::Admin);
        let tree = decorated(&store, vec![row], Some(&admin)).await;

        let node = &tree.comments.nodes[0];
        assert_eq!(node.content, REMOVED_PLACEHOLDER);
        // display author is still computed normally
        assert_eq!(node.display_author.as_ref().unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn admin_unpublished_is_redacted_too() {
        let store = MemoryStore {
            users: vec![user(10, "Alice")],
            ..Default::default()
        };
        let mut row = record(1, None, 10);
        row.admin_unpublished = true;

        let tree = decorated(&store, vec![row], None).await;
        assert_eq!(tree.comments.nodes[0].content, REMOVED_PLACEHOLDER);
    }

    #[tokio::test]
    async fn anonymous_preference_hides_the_name_but_keeps_the_credential() {
        let store = MemoryStore {
            users: vec![user(10, "Alice")],
            preferences: vec![DiscussionPreference {
                user_id: 10,
                discussion_id: 1,
                anonymous: true,
                credential_id: Some(5),
            }],
            credentials: vec![Credential {
                id: 5,
                description: "Journalist".into(),
                verified: true,
            }],
            ..Default::default()
        };

        let tree = decorated(&store, vec![record(1, None, 10)], None).await;
        let author = tree.comments.nodes[0].display_author.as_ref().unwrap();
        assert_eq!(author.name, ANONYMOUS_NAME);
        assert_eq!(
            author.credential.as_ref().map(|c| c.description.as_str()),
            Some("Journalist")
        );
    }

    #[tokio::test]
    async fn missing_user_row_defaults_to_non_anonymous_without_failing() {
        // no user rows at all: decoration still succeeds
        let store = MemoryStore::default();
        let tree = decorated(&store, vec![record(1, None, 10)], None).await;
        let author = tree.comments.nodes[0].display_author.as_ref().unwrap();
        assert_eq!(author.name, ANONYMOUS_NAME);
        assert_eq!(author.credential, None);
    }

    #[tokio::test]
    async fn real_author_is_only_visible_to_elevated_roles() {
        let store = MemoryStore {
            users: vec![user(10, "Alice")],
            ..Default::default()
        };
        let rows = vec![record(1, None, 10)];

        let member = viewer(50, Role::Member);
        let tree = decorated(&store, rows.clone(), Some(&member)).await;
        assert_eq!(tree.comments.nodes[0].author, None);

        let editor = viewer(51, Role::Editor);
        let tree = decorated(&store, rows, Some(&editor)).await;
        assert_eq!(tree.comments.nodes[0].author, Some(user(10, "Alice")));
    }

    #[tokio::test]
    async fn user_vote_reflects_the_viewers_own_vote() {
        let store = MemoryStore {
            users: vec![user(10, "Alice")],
            ..Default::default()
        };
        let mut row = record(1, None, 10);
        row.votes = vec![
            CommentVote { user_id: 50, vote: 1 },
            CommentVote {
                user_id: 51,
                vote: -1,
            },
        ];

        let upvoter = viewer(50, Role::Member);
        let tree = decorated(&store, vec![row.clone()], Some(&upvoter)).await;
        assert_eq!(tree.comments.nodes[0].user_vote, Some(UserVote::Up));

        let downvoter = viewer(51, Role::Member);
        let tree = decorated(&store, vec![row.clone()], Some(&downvoter)).await;
        assert_eq!(tree.comments.nodes[0].user_vote, Some(UserVote::Down));

        let bystander = viewer(52, Role::Member);
        let tree = decorated(&store, vec![row], Some(&bystander)).await;
        assert_eq!(tree.comments.nodes[0].user_vote, None);
    }

    #[tokio::test]
    async fn a_corrupt_vote_value_counts_as_no_vote() {
        let store = MemoryStore {
            users: vec![user(10, "Alice")],
            ..Default::default()
        };
        let mut row = record(1, None, 10);
        row.votes = vec![CommentVote { user_id: 50, vote: 0 }];

        let voter = viewer(50, Role::Member);
        let tree = decorated(&store, vec![row], Some(&voter)).await;
        assert_eq!(tree.comments.nodes[0].user_vote, None);
    }

    #[tokio::test]
    async fn only_the_author_can_edit_and_decoration_recurses() {
        let store = MemoryStore {
            users: vec![user(10, "Alice"), user(11, "Bob")],
            ..Default::default()
        };
        let rows = vec![record(1, None, 10), record(2, Some(1), 11)];

        let alice = viewer(10, Role::Member);
        let tree = decorated(&store, rows, Some(&alice)).await;

        let top = &tree.comments.nodes[0];
        assert_eq!(top.user_can_edit, Some(true));
        let reply = &top.comments.nodes[0];
        assert_eq!(reply.user_can_edit, Some(false));
        assert_eq!(reply.display_author.as_ref().unwrap().name, "Bob");
    }
}
