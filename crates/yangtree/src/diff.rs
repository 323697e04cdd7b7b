//! Differences between two data trees of the same schema.
//!
//! [`diff`] returns a lazy [`Diff`]: nothing is compared until the first
//! entry is pulled. Entries come in four groups, each in document order:
//!
//! 1. [`DiffEntry::Changed`] for leaves whose value differs (before-tree order),
//! 2. [`DiffEntry::Deleted`] for subtrees only in the before tree,
//! 3. [`DiffEntry::Created`] for subtrees only in the after tree,
//! 4. move hints for user-ordered lists and leaf-lists.
//!
//! The sequence always ends with one [`DiffEntry::End`]. Reordering the
//! entries of a system-ordered list is not a change.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use yangtree_data::{DataTree, NodeId};
use yangtree_schema::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("trees belong to different schemas")]
    SchemaMismatch,
}

/// One record of a diff.
///
/// `before` ids refer to the before tree, `after` ids to the after tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffEntry {
    /// A leaf present in both trees with different values.
    Changed { before: NodeId, after: NodeId },
    /// A subtree only in the before tree.
    Deleted { before: NodeId },
    /// A subtree only in the after tree.
    Created { after: NodeId },
    /// An entry of a user-ordered collection present in both trees that now
    /// follows `preceding` (an after-tree entry), or comes first when
    /// `preceding` is `None`.
    MovedAfter1 {
        before: NodeId,
        after: NodeId,
        preceding: Option<NodeId>,
    },
    /// A created entry of a user-ordered collection, placed after
    /// `preceding` or first.
    MovedAfter2 {
        after: NodeId,
        preceding: Option<NodeId>,
    },
    End,
}

/// Kind of a [`DiffRecord`]. The numeric codes are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    Created,
    Modified,
    Removed,
    Moved,
}

impl DiffKind {
    pub fn code(self) -> u8 {
        match self {
            DiffKind::Created => 1,
            DiffKind::Modified => 2,
            DiffKind::Removed => 3,
            DiffKind::Moved => 4,
        }
    }
}

/// A flattened view of one changed terminal node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub path: String,
    pub old: Option<String>,
    pub new: Option<String>,
    pub kind: DiffKind,
}

impl DiffRecord {
    fn new(path: String, old: Option<String>, new: Option<String>, kind: DiffKind) -> Self {
        Self { path, old, new, kind }
    }
}

/// Compares `before` with `after`.
///
/// # Example
///
/// ```
/// use yangtree::{diff, DiffEntry};
/// use yangtree_data::DataTree;
/// use yangtree_schema::{LeafType, SchemaBuilder};
///
/// let mut b = SchemaBuilder::new();
/// let m = b.module("m", "m");
/// let top = b.container(m, "top");
/// b.leaf(top, "a", LeafType::string());
/// let schema = b.build().unwrap();
///
/// let mut before = DataTree::new(&schema);
/// before.set("/m:top/a", "a").unwrap();
/// let mut after = DataTree::new(&schema);
/// after.set("/m:top/a", "b").unwrap();
///
/// let entries: Vec<_> = diff(&before, &after).unwrap().collect();
/// assert!(matches!(entries[0], DiffEntry::Changed { .. }));
/// assert_eq!(entries[1], DiffEntry::End);
/// assert_eq!(entries.len(), 2);
/// ```
pub fn diff<'a, 's>(before: &'a DataTree<'s>, after: &'a DataTree<'s>) -> Result<Diff<'a, 's>, DiffError> {
    if !before.same_schema(after) {
        return Err(DiffError::SchemaMismatch);
    }
    Ok(Diff {
        before,
        after,
        entries: None,
        ended: false,
    })
}

/// The entries between two trees; see the [module docs](self).
///
/// Single pass: once [`DiffEntry::End`] is returned the iterator is
/// exhausted.
pub struct Diff<'a, 's> {
    before: &'a DataTree<'s>,
    after: &'a DataTree<'s>,
    entries: Option<std::vec::IntoIter<DiffEntry>>,
    ended: bool,
}

impl<'a, 's> Iterator for Diff<'a, 's> {
    type Item = DiffEntry;

    fn next(&mut self) -> Option<DiffEntry> {
        if self.ended {
            return None;
        }
        let (before, after) = (self.before, self.after);
        let entries = self
            .entries
            .get_or_insert_with(|| compute(before, after).into_iter());
        match entries.next() {
            Some(entry) => Some(entry),
            None => {
                self.ended = true;
                Some(DiffEntry::End)
            }
        }
    }
}

impl<'a, 's> Diff<'a, 's> {
    /// Renders the remaining entries as one record per terminal node.
    ///
    /// Created and deleted subtrees are expanded to the leaves and leaf-list
    /// entries they contain. `MovedAfter1` becomes a [`DiffKind::Moved`]
    /// record whose `new` is the path of the entry it now follows; the
    /// positions of created entries are not reported separately.
    pub fn records(self) -> Vec<DiffRecord> {
        let (before, after) = (self.before, self.after);
        let mut out = Vec::new();
        for entry in self {
            match entry {
                DiffEntry::Changed { before: b, after: a } => {
                    if let Some(path) = before.path(b) {
                        out.push(DiffRecord::new(
                            path,
                            value_text(before, b),
                            value_text(after, a),
                            DiffKind::Modified,
                        ));
                    }
                }
                DiffEntry::Deleted { before: b } => {
                    for t in terminals(before, b) {
                        if let Some(path) = before.path(t) {
                            out.push(DiffRecord::new(path, value_text(before, t), None, DiffKind::Removed));
                        }
                    }
                }
                DiffEntry::Created { after: a } => {
                    for t in terminals(after, a) {
                        if let Some(path) = after.path(t) {
                            out.push(DiffRecord::new(path, None, value_text(after, t), DiffKind::Created));
                        }
                    }
                }
                DiffEntry::MovedAfter1 { after: a, preceding, .. } => {
                    if let Some(path) = after.path(a) {
                        let new = preceding.and_then(|p| after.path(p));
                        out.push(DiffRecord::new(path, None, new, DiffKind::Moved));
                    }
                }
                DiffEntry::MovedAfter2 { .. } | DiffEntry::End => {}
            }
        }
        out
    }
}

fn value_text(tree: &DataTree<'_>, id: NodeId) -> Option<String> {
    tree.value(id).map(ToString::to_string)
}

fn terminals(tree: &DataTree<'_>, id: NodeId) -> Vec<NodeId> {
    tree.dfs(id)
        .into_iter()
        .filter(|&n| tree.kind(n).is_some_and(NodeKind::is_terminal))
        .collect()
}

// ── Comparison ────────────────────────────────────────────────────────────

fn compute(before: &DataTree<'_>, after: &DataTree<'_>) -> Vec<DiffEntry> {
    let mut changed = Vec::new();
    let mut deleted = Vec::new();
    walk_before(before, after, None, None, &mut changed, &mut deleted);

    let mut created = Vec::new();
    let mut moves = Vec::new();
    walk_after(before, after, None, None, &mut created, &mut moves);

    log::debug!(
        "diff: {} changed, {} deleted, {} created, {} moved",
        changed.len(),
        deleted.len(),
        created.len(),
        moves.len()
    );
    changed
        .into_iter()
        .chain(deleted)
        .chain(created)
        .chain(moves)
        .collect()
}

fn walk_before(
    before: &DataTree<'_>,
    after: &DataTree<'_>,
    before_parent: Option<NodeId>,
    after_parent: Option<NodeId>,
    changed: &mut Vec<DiffEntry>,
    deleted: &mut Vec<DiffEntry>,
) {
    for &b in before.siblings(before_parent) {
        let Some(a) = after.find_instance(after_parent, before, b) else {
            deleted.push(DiffEntry::Deleted { before: b });
            continue;
        };
        match before.kind(b) {
            Some(NodeKind::Leaf) => {
                if before.value(b) != after.value(a) {
                    changed.push(DiffEntry::Changed { before: b, after: a });
                }
            }
            Some(NodeKind::LeafList) => {}
            _ => walk_before(before, after, Some(b), Some(a), changed, deleted),
        }
    }
}

fn walk_after(
    before: &DataTree<'_>,
    after: &DataTree<'_>,
    before_parent: Option<NodeId>,
    after_parent: Option<NodeId>,
    created: &mut Vec<DiffEntry>,
    moves: &mut Vec<DiffEntry>,
) {
    let siblings = after.siblings(after_parent);
    let mut matched: Vec<(NodeId, Option<NodeId>)> = Vec::with_capacity(siblings.len());
    for &a in siblings {
        let counterpart = before.find_instance(before_parent, after, a);
        matched.push((a, counterpart));
        match counterpart {
            None => created.push(DiffEntry::Created { after: a }),
            Some(b) => {
                if !after.kind(a).is_some_and(NodeKind::is_terminal) {
                    walk_after(before, after, Some(b), Some(a), created, moves);
                }
            }
        }
    }
    user_order_moves(before, after, before_parent, &matched, moves);
}

/// Move hints for the user-ordered collections among one parent's children.
///
/// The entries present in both trees are replayed in before-tree order and
/// moved one at a time until they follow after-tree order; each move is one
/// `MovedAfter1`. Created entries get a `MovedAfter2` with their position.
fn user_order_moves(
    before: &DataTree<'_>,
    after: &DataTree<'_>,
    before_parent: Option<NodeId>,
    matched: &[(NodeId, Option<NodeId>)],
    moves: &mut Vec<DiffEntry>,
) {
    let mut seen = Vec::new();
    for &(first, _) in matched {
        let Some(schema_id) = after.schema_id(first) else {
            continue;
        };
        if seen.contains(&schema_id) {
            continue;
        }
        seen.push(schema_id);
        let user_ordered = after
            .schema_node(first)
            .is_some_and(|n| n.kind.is_repeated() && n.ordered_by_user);
        if !user_ordered {
            continue;
        }

        let collection: Vec<(NodeId, Option<NodeId>)> = matched
            .iter()
            .copied()
            .filter(|&(a, _)| after.schema_id(a) == Some(schema_id))
            .collect();

        // Common entries as (before, after) pairs, in after order.
        let target: Vec<(NodeId, NodeId)> = collection
            .iter()
            .filter_map(|&(a, b)| b.map(|b| (b, a)))
            .collect();
        // The same entries in before order.
        let mut current: Vec<NodeId> = before
            .siblings(before_parent)
            .iter()
            .copied()
            .filter(|b| target.iter().any(|&(tb, _)| tb == *b))
            .collect();

        for (i, &(b, a)) in target.iter().enumerate() {
            if current.get(i) == Some(&b) {
                continue;
            }
            if let Some(pos) = current.iter().position(|&c| c == b) {
                current.remove(pos);
                current.insert(i, b);
            }
            let preceding = i.checked_sub(1).map(|p| target[p].1);
            moves.push(DiffEntry::MovedAfter1 {
                before: b,
                after: a,
                preceding,
            });
        }

        let mut previous = None;
        for &(a, b) in &collection {
            if b.is_none() {
                moves.push(DiffEntry::MovedAfter2 {
                    after: a,
                    preceding: previous,
                });
            }
            previous = Some(a);
        }
    }
}
