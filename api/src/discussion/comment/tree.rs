use std::collections::{HashMap, HashSet};

use super::cursor::Cursor;
use super::order::{CommentOrder, SortKey};
use super::{CommentConnection, CommentNode};
use crate::discussion::store::CommentRecord;

/// One assembled request-scoped comment tree. The root itself is synthetic
/// (the discussion, or the parent comment a subtree was requested under) and
/// never part of the response, only its connection is.
#[derive(Debug)]
pub struct Tree {
    pub root_id: Option<i32>,
    pub comments: CommentConnection,
}

/// Flat summary of every comment that made it into the assembled tree,
/// recorded before any pruning. Windowing and the batched decoration lookups
/// work off this list so they are independent of tree shape.
#[derive(Debug, Clone)]
pub struct CoveredComment {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub depth: i32,
    pub user_id: i32,
    pub key: SortKey,
}

impl CoveredComment {
    fn of(record: &CommentRecord, depth: i32) -> Self {
        CoveredComment {
            id: record.id,
            parent_id: record.parent_id,
            depth,
            user_id: record.user_id,
            key: record_key(record),
        }
    }
}

fn record_key(record: &CommentRecord) -> SortKey {
    SortKey {
        created_at: record.created_at,
        score: record.up_votes - record.down_votes,
        hotness: record.hotness,
        id: record.id,
    }
}

/// Turns the flat rows of one discussion into a nested tree rooted at
/// `root_id` (`None` = discussion root), assigning depths top-down.
///
/// Every row is indexed by its parent once and consumed at most once, so
/// malformed rows whose parent chain cycles simply never get attached and
/// nothing is ever duplicated.
///
/// `after_id` resumes a previous page: the top-level sibling list is sorted
/// and sliced to start right after that id before recursing, deeper levels
/// are untouched. An `after_id` that doesn't exist at this scope yields an
/// empty tree.
pub fn assemble(
    root_id: Option<i32>,
    rows: Vec<CommentRecord>,
    after_id: Option<i32>,
    order: &CommentOrder,
) -> (Tree, Vec<CoveredComment>) {
    let mut index: HashMap<Option<i32>, Vec<CommentRecord>> = HashMap::new();
    for row in rows {
        index.entry(row.parent_id).or_default().push(row);
    }

    let mut top = index.remove(&root_id).unwrap_or_default();
    if let Some(after) = after_id {
        top.sort_by(|a, b| order.compare(&record_key(a), &record_key(b)));
        match top.iter().position(|c| c.id == after) {
            Some(i) => {
                top.drain(..=i);
            }
            None => top.clear(),
        }
    }

    let mut covered = Vec::new();
    let nodes = attach(top, &mut index, 0, &mut covered);

    let tree = Tree {
        root_id,
        comments: CommentConnection {
            nodes,
            ..Default::default()
        },
    };
    (tree, covered)
}

fn attach(
    rows: Vec<CommentRecord>,
    index: &mut HashMap<Option<i32>, Vec<CommentRecord>>,
    depth: i32,
    covered: &mut Vec<CoveredComment>,
) -> Vec<CommentNode> {
    rows.into_iter()
        .map(|record| {
            let children = index.remove(&Some(record.id)).unwrap_or_default();
            covered.push(CoveredComment::of(&record, depth));
            let mut node = CommentNode::from_record(record, depth);
            node.comments.nodes = attach(children, index, depth + 1, covered);
            node
        })
        .collect()
}

/// Bottom-up descendant counts. Runs on the fresh tree, before any pruning,
/// so "there is more" signals stay truthful after nodes are removed.
pub fn measure(tree: &mut Tree) {
    let total: i32 = tree.comments.nodes.iter_mut().map(measure_node).sum();
    tree.comments.total_count = total;
}

fn measure_node(node: &mut CommentNode) -> i32 {
    let descendants: i32 = node.comments.nodes.iter_mut().map(measure_node).sum();
    node.comments.total_count = descendants;
    descendants + 1
}

/// Recursively orders every sibling list with the active comparator.
pub fn sort(tree: &mut Tree, order: &CommentOrder) {
    sort_nodes(&mut tree.comments.nodes, order);
}

fn sort_nodes(nodes: &mut Vec<CommentNode>, order: &CommentOrder) {
    nodes.sort_by(|a, b| order.compare(&a.sort_key(), &b.sort_key()));
    for node in nodes {
        sort_nodes(&mut node.comments.nodes, order);
    }
}

/// Page mode: the first `first` comments in comparator order, restricted to
/// depths the caller's selection can actually render.
pub fn page_window(
    covered: &[CoveredComment],
    order: &CommentOrder,
    first: usize,
    max_depth: Option<usize>,
) -> Vec<i32> {
    let mut candidates: Vec<&CoveredComment> = covered
        .iter()
        .filter(|c| match max_depth {
            Some(d) => c.depth <= d as i32,
            None => true,
        })
        .collect();
    candidates.sort_by(|a, b| order.compare(&a.key, &b.key));
    candidates.into_iter().take(first).map(|c| c.id).collect()
}

/// Focus mode: the focus comment, its neighbouring sibling on each side and
/// its first child, so one comment is always shown in context no matter
/// where it sorts. An unknown focus id yields an empty window.
pub fn focus_window(covered: &[CoveredComment], order: &CommentOrder, focus_id: i32) -> Vec<i32> {
    let Some(focus) = covered.iter().find(|c| c.id == focus_id) else {
        return Vec::new();
    };

    let mut siblings: Vec<&CoveredComment> = covered
        .iter()
        .filter(|c| c.parent_id == focus.parent_id && c.depth == focus.depth)
        .collect();
    siblings.sort_by(|a, b| order.compare(&a.key, &b.key));

    let idx = siblings
        .iter()
        .position(|c| c.id == focus_id)
        .unwrap_or_default();
    let start = idx.saturating_sub(1);
    let end = (idx + 2).min(siblings.len());
    let mut ids: Vec<i32> = siblings[start..end].iter().map(|c| c.id).collect();

    let mut children: Vec<&CoveredComment> = covered
        .iter()
        .filter(|c| c.parent_id == Some(focus_id))
        .collect();
    children.sort_by(|a, b| order.compare(&a.key, &b.key));
    if let Some(child) = children.first() {
        ids.push(child.id);
    }

    ids
}

/// Prunes the tree down to the visible id set while keeping every ancestor
/// of a visible node. Wherever siblings got dropped the page info reports
/// more, and a non-empty truncated list gets a resume cursor scoped to its
/// parent.
pub fn prune(tree: &mut Tree, visible: &HashSet<i32>, order: &CommentOrder) {
    prune_connection(&mut tree.comments, tree.root_id, visible, order);
}

fn prune_connection(
    conn: &mut CommentConnection,
    parent_id: Option<i32>,
    visible: &HashSet<i32>,
    order: &CommentOrder,
) {
    let before = conn.nodes.len();
    conn.nodes.retain_mut(|child| {
        prune_connection(&mut child.comments, Some(child.id), visible, order);
        !child.comments.nodes.is_empty() || visible.contains(&child.id)
    });
    if conn.nodes.len() < before {
        conn.page_info.has_next_page = true;
        if let Some(last) = conn.nodes.last() {
            conn.page_info.end_cursor = Some(
                Cursor {
                    order_by: order.by,
                    order_direction: order.direction,
                    parent_id,
                    after_id: last.id,
                }
                .encode(),
            );
        }
    }
}

/// Cuts the tree at the nesting depth the caller's selection reaches. Nodes
/// sitting exactly at that depth lose their children and signal "re-query me
/// as parentId" through `has_next_page` instead.
pub fn cut(tree: &mut Tree, max_depth: usize) {
    cut_connection(&mut tree.comments, -1, max_depth as i32);
}

fn cut_connection(conn: &mut CommentConnection, depth: i32, max_depth: i32) {
    if depth == max_depth {
        conn.nodes.clear();
        if conn.total_count > 0 {
            conn.page_info.has_next_page = true;
        }
    } else {
        for node in &mut conn.nodes {
            cut_connection(&mut node.comments, depth + 1, max_depth);
        }
    }
}
