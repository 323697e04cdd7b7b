//! Path queries over a data tree.

use indexmap::IndexSet;
use yangtree_path::{NodeTest, Path, Predicate, Segment};

use crate::tree::{DataTree, NodeId};
use crate::value::Value;

/// An ordered, duplicate-free set of nodes returned by a path query.
///
/// Nodes appear in document order. The set holds plain ids and does not keep
/// the nodes alive; freeing a node leaves a stale id behind.
#[derive(Debug, Clone, Default)]
pub struct PathSet {
    nodes: IndexSet<NodeId>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Adds a node. Returns false if it was already present.
    pub fn insert(&mut self, id: NodeId) -> bool {
        self.nodes.insert(id)
    }

    /// Appends the nodes of `other` that are not already present.
    pub fn merge(&mut self, other: PathSet) {
        self.nodes.extend(other.nodes);
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.nodes.get_index(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.iter().collect()
    }
}

impl PartialEq for PathSet {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.iter().eq(other.nodes.iter())
    }
}

impl Eq for PathSet {}

impl FromIterator<NodeId> for PathSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl Extend<NodeId> for PathSet {
    fn extend<I: IntoIterator<Item = NodeId>>(&mut self, iter: I) {
        self.nodes.extend(iter);
    }
}

impl IntoIterator for PathSet {
    type Item = NodeId;
    type IntoIter = indexmap::set::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a NodeId;
    type IntoIter = indexmap::set::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl<'s> DataTree<'s> {
    /// Evaluates an absolute path and returns the matching nodes.
    ///
    /// A path that does not parse matches nothing.
    pub fn find_path(&self, path: &str) -> PathSet {
        match yangtree_path::parse_path(path) {
            Ok(parsed) => self.find(&parsed),
            Err(err) => {
                log::debug!("path {path:?} does not parse: {err}");
                PathSet::new()
            }
        }
    }

    /// Evaluates a parsed path.
    pub fn find(&self, path: &Path) -> PathSet {
        let mut contexts: Vec<Option<NodeId>> = vec![None];
        let mut module: Option<&str> = None;

        for segment in &path.segments {
            if let Some(m) = &segment.module {
                module = Some(m.as_str());
            }
            let mut next = Vec::new();
            for &context in &contexts {
                let mut matched: Vec<NodeId> = self
                    .siblings(context)
                    .iter()
                    .copied()
                    .filter(|&c| self.segment_matches(c, segment, module))
                    .collect();
                for predicate in &segment.predicates {
                    matched = match predicate {
                        Predicate::Position(n) => {
                            matched.get(n - 1).copied().into_iter().collect()
                        }
                        Predicate::Key { name, value } => matched
                            .into_iter()
                            .filter(|&c| self.key_matches(c, name, value))
                            .collect(),
                        Predicate::Value(value) => matched
                            .into_iter()
                            .filter(|&c| self.value_matches(c, value))
                            .collect(),
                    };
                }
                next.extend(matched.into_iter().map(Some));
            }
            contexts = next;
            if contexts.is_empty() {
                break;
            }
        }

        contexts.into_iter().flatten().collect()
    }

    fn segment_matches(&self, id: NodeId, segment: &Segment, module: Option<&str>) -> bool {
        let Some(node) = self.schema_node(id) else {
            return false;
        };
        let module_matches = |m: &str| self.schema().main_module_name(node.module) == Some(m);
        match &segment.node {
            NodeTest::Name(name) => node.name == *name && module.map_or(true, module_matches),
            NodeTest::Wildcard => segment.module.as_deref().map_or(true, module_matches),
        }
    }

    fn key_matches(&self, id: NodeId, name: &str, literal: &str) -> bool {
        self.children(id)
            .iter()
            .any(|&c| self.name(c) == Some(name) && self.value_matches(c, literal))
    }

    /// Compares a terminal node's value with a literal, parsing the literal
    /// with the node's type when possible so `+5` matches `5`.
    pub(crate) fn value_matches(&self, id: NodeId, literal: &str) -> bool {
        let Some(value) = self.value(id) else {
            return false;
        };
        match self.leaf_type(id).map(|ty| Value::parse(ty, literal)) {
            Some(Ok(parsed)) => *value == parsed,
            _ => value.to_string() == literal,
        }
    }

    /// The value of the first node matching `path`.
    pub fn value_at(&self, path: &str) -> Option<&Value> {
        self.find_path(path).iter().find_map(|id| self.value(id))
    }

    /// Canonical values of every terminal node matching `path`.
    pub fn values(&self, path: &str) -> Vec<String> {
        self.find_path(path)
            .iter()
            .filter_map(|id| self.value(id).map(Value::to_string))
            .collect()
    }

    /// Instance paths of every node matching `path`.
    pub fn paths(&self, path: &str) -> Vec<String> {
        self.find_path(path)
            .iter()
            .filter_map(|id| self.path(id))
            .collect()
    }

    /// Number of nodes matching `path`.
    pub fn count(&self, path: &str) -> usize {
        self.find_path(path).len()
    }
}
