use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use super::cursor::Cursor;
use super::decorate;
use super::order::{CommentOrder, OrderBy, OrderDirection};
use super::tree;
use super::{CommentConnection, CommentNode};
use crate::App;
use crate::discussion::pg::PgCommentStore;
use crate::discussion::store::{CommentStore, StoreError};
use crate::error::AppError;
use crate::identity::{MaybeAuthUser, Viewer};

/// How many comments a request gets when it doesn't say otherwise.
pub const DEFAULT_FIRST: usize = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentQueryArgs {
    pub order_by: Option<OrderBy>,
    pub order_direction: Option<OrderDirection>,
    pub first: Option<usize>,
    /// Opaque cursor from a previous response. Overrides ordering, scope and
    /// focus with whatever it encodes.
    pub after: Option<String>,
    pub focus_id: Option<i32>,
    pub parent_id: Option<i32>,
    /// How many nesting levels the caller can render, computed at the API
    /// boundary from its field selection. The engine only sees the number.
    pub flat_depth: Option<usize>,
}

/// The full read pipeline for one request: assemble, measure, sort, window,
/// truncate, decorate. Everything up to decoration is pure in-memory work on
/// this request's own copy of the rows.
pub async fn resolve_comments<S: CommentStore + ?Sized>(
    store: &S,
    discussion_id: i32,
    args: CommentQueryArgs,
    viewer: Option<&Viewer>,
) -> Result<CommentConnection, StoreError> {
    let cursor = args.after.as_deref().and_then(Cursor::decode);

    let (order, parent_id, after_id, focus_id) = match cursor {
        Some(c) => (
            CommentOrder {
                by: c.order_by,
                direction: c.order_direction,
            },
            c.parent_id,
            Some(c.after_id),
            None,
        ),
        None => (
            CommentOrder {
                by: args.order_by.unwrap_or_default(),
                direction: args.order_direction.unwrap_or_default(),
            },
            args.parent_id,
            None,
            args.focus_id,
        ),
    };

    let rows = store.find_comments(discussion_id).await?;

    let (mut tree, covered) = tree::assemble(parent_id, rows, after_id, &order);
    tree::measure(&mut tree);
    tree::sort(&mut tree, &order);
    tree.comments.direct_total_count = Some(tree.comments.nodes.len() as i32);

    let visible: HashSet<i32> = match focus_id {
        Some(focus) => tree::focus_window(&covered, &order, focus),
        None => tree::page_window(
            &covered,
            &order,
            args.first.unwrap_or(DEFAULT_FIRST),
            args.flat_depth,
        ),
    }
    .into_iter()
    .collect();
    tree::prune(&mut tree, &visible, &order);

    if let Some(depth) = args.flat_depth {
        tree::cut(&mut tree, depth);
    }

    decorate::decorate(store, &mut tree, &covered, discussion_id, viewer).await?;

    if let Some(focus) = focus_id {
        let focus_node = find_node(&tree.comments.nodes, focus).cloned();
        tree.comments.focus = focus_node.map(Box::new);
    }

    Ok(tree.comments)
}

fn find_node(nodes: &[CommentNode], id: i32) -> Option<&CommentNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.comments.nodes, id) {
            return Some(found);
        }
    }
    None
}

pub async fn get_comments(
    State(ctx): State<App>,
    Path(discussion_id): Path<i32>,
    Query(args): Query<CommentQueryArgs>,
    MaybeAuthUser(auth_user): MaybeAuthUser,
) -> Result<Json<CommentConnection>, AppError> {
    let store = PgCommentStore::new(ctx.pool.clone());
    let viewer = auth_user.ok();
    let connection = resolve_comments(&store, discussion_id, args, viewer.as_ref()).await?;
    Ok(Json(connection))
}
