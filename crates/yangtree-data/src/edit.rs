//! Path-based editing of a data tree.

use yangtree_path::{Predicate, Segment};
use yangtree_schema::{BaseType, ModuleId, NodeKind, SchemaId};

use crate::tree::{DataTree, NodeId};
use crate::value::Value;
use crate::DataError;

impl<'s> DataTree<'s> {
    /// Creates the node addressed by `path`, with any missing ancestors, and
    /// sets its value.
    ///
    /// Existing nodes are updated in place. Returns the first node created,
    /// or the terminal node whose value changed, or `None` when the tree
    /// already held this exact data. List entries are created with their key
    /// leaves; a key leaf never changes value. Creating data in one case of
    /// a choice removes the data of the other cases.
    ///
    /// # Example
    ///
    /// ```
    /// use yangtree_data::DataTree;
    /// use yangtree_schema::{LeafType, SchemaBuilder};
    ///
    /// let mut b = SchemaBuilder::new();
    /// let m = b.module("m", "m");
    /// let top = b.container(m, "top");
    /// b.leaf(top, "name", LeafType::string());
    /// let schema = b.build().unwrap();
    ///
    /// let mut tree = DataTree::new(&schema);
    /// let created = tree.new_path("/m:top/name", Some("a")).unwrap();
    /// assert_eq!(created, tree.roots().first().copied());
    /// assert!(tree.new_path("/m:top/name", Some("a")).unwrap().is_none());
    /// assert!(tree.new_path("/m:top/name", Some("b")).unwrap().is_some());
    /// ```
    pub fn new_path(&mut self, path: &str, value: Option<&str>) -> Result<Option<NodeId>, DataError> {
        let parsed = yangtree_path::parse_path(path)?;
        if parsed.is_pattern() {
            return Err(DataError::UnsupportedPath(path.to_string()));
        }

        let schema = self.schema();
        let mut parent: Option<NodeId> = None;
        let mut schema_parent: Option<SchemaId> = None;
        let mut module: Option<ModuleId> = None;
        let mut first_created: Option<NodeId> = None;
        let last = parsed.len() - 1;

        for (i, segment) in parsed.segments.iter().enumerate() {
            if let Some(name) = &segment.module {
                module = Some(
                    schema
                        .find_module(name)
                        .ok_or_else(|| DataError::UnknownModule(name.clone()))?,
                );
            }
            let name = segment
                .name()
                .ok_or_else(|| DataError::UnsupportedPath(path.to_string()))?;
            let sid = schema
                .find_data_child(schema_parent, module, name)
                .ok_or_else(|| DataError::UnknownNode(path.to_string()))?;
            let kind = schema
                .kind(sid)
                .ok_or_else(|| DataError::UnknownNode(path.to_string()))?;
            let is_last = i == last;

            match kind {
                NodeKind::Container | NodeKind::Rpc => {
                    if !segment.predicates.is_empty() {
                        return Err(DataError::UnexpectedPredicate(path.to_string()));
                    }
                    let node = match self.find_child(parent, sid) {
                        Some(existing) => existing,
                        None => {
                            let created = self.create_inner(parent, sid)?;
                            first_created.get_or_insert(created);
                            created
                        }
                    };
                    parent = Some(node);
                }
                NodeKind::List => {
                    let node = self.upsert_list_entry(parent, sid, segment, path, &mut first_created)?;
                    parent = Some(node);
                }
                NodeKind::Leaf => {
                    if !is_last {
                        return Err(DataError::UnknownNode(path.to_string()));
                    }
                    if !segment.predicates.is_empty() {
                        return Err(DataError::UnexpectedPredicate(path.to_string()));
                    }
                    let value = self.parse_value(sid, value, path)?;
                    return match self.find_child(parent, sid) {
                        Some(existing) if self.value(existing) == Some(&value) => Ok(first_created),
                        Some(_) if schema.is_key(sid) => Err(DataError::KeyChange(path.to_string())),
                        Some(existing) => {
                            self.set_value(existing, value)?;
                            Ok(Some(first_created.unwrap_or(existing)))
                        }
                        None => {
                            let created = self.create_term(parent, sid, value)?;
                            Ok(Some(first_created.unwrap_or(created)))
                        }
                    };
                }
                NodeKind::LeafList => {
                    if !is_last {
                        return Err(DataError::UnknownNode(path.to_string()));
                    }
                    let predicate_value = leaf_list_predicate(segment, path)?;
                    let value = match (value, predicate_value) {
                        (Some(v), Some(p)) => {
                            let v = self.parse_value(sid, Some(v), path)?;
                            if v != self.parse_value(sid, Some(p), path)? {
                                return Err(DataError::UnexpectedPredicate(path.to_string()));
                            }
                            v
                        }
                        (Some(v), None) | (None, Some(v)) => self.parse_value(sid, Some(v), path)?,
                        (None, None) => return Err(DataError::MissingValue(path.to_string())),
                    };
                    let exists = self
                        .siblings(parent)
                        .iter()
                        .any(|&c| self.schema_id(c) == Some(sid) && self.value(c) == Some(&value));
                    if exists {
                        return Ok(first_created);
                    }
                    let created = self.create_term(parent, sid, value)?;
                    return Ok(Some(first_created.unwrap_or(created)));
                }
                _ => return Err(DataError::UnknownNode(path.to_string())),
            }
            schema_parent = Some(sid);
        }

        Ok(first_created)
    }

    /// Sets the value at `path`, creating the node if needed.
    ///
    /// Unlike [`DataTree::new_path`], an unchanged value is not reported;
    /// the call fails only if the path still matches nothing afterwards.
    pub fn set(&mut self, path: &str, value: &str) -> Result<(), DataError> {
        let node = self.new_path(path, Some(value))?;
        if node.is_none() && self.count(path) == 0 {
            return Err(DataError::NotSet {
                path: path.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// Deletes the single node matching `path` with its subtree.
    ///
    /// Returns false when nothing matches. Deleting more than one node at
    /// once is refused.
    pub fn delete(&mut self, path: &str) -> Result<bool, DataError> {
        let parsed = yangtree_path::parse_path(path)?;
        let matches = self.find(&parsed);
        match matches.len() {
            0 => Ok(false),
            1 => Ok(matches.first().is_some_and(|id| self.free(id))),
            count => Err(DataError::Ambiguous {
                path: path.to_string(),
                count,
            }),
        }
    }

    fn parse_value(&self, sid: SchemaId, text: Option<&str>, path: &str) -> Result<Value, DataError> {
        let ty = self
            .schema()
            .node(sid)
            .and_then(|n| n.leaf_type.as_ref())
            .ok_or_else(|| DataError::NotTerminal(path.to_string()))?;
        let text = match text {
            Some(text) => text,
            None if ty.base == BaseType::Empty => "",
            None => return Err(DataError::MissingValue(path.to_string())),
        };
        Value::parse(ty, text).map_err(|source| DataError::InvalidValue {
            path: path.to_string(),
            source,
        })
    }

    fn upsert_list_entry(
        &mut self,
        parent: Option<NodeId>,
        sid: SchemaId,
        segment: &Segment,
        path: &str,
        first_created: &mut Option<NodeId>,
    ) -> Result<NodeId, DataError> {
        let schema = self.schema();
        let list = schema
            .node(sid)
            .ok_or_else(|| DataError::UnknownNode(path.to_string()))?;

        if list.keyless {
            if !segment.predicates.is_empty() {
                return Err(DataError::UnexpectedPredicate(path.to_string()));
            }
            let created = self.create_inner(parent, sid)?;
            first_created.get_or_insert(created);
            return Ok(created);
        }

        for predicate in &segment.predicates {
            let known = match predicate {
                Predicate::Key { name, .. } => list
                    .keys
                    .iter()
                    .any(|&k| schema.node(k).is_some_and(|n| &n.name == name)),
                _ => false,
            };
            if !known {
                return Err(DataError::UnexpectedPredicate(path.to_string()));
            }
        }

        let mut keys = Vec::with_capacity(list.keys.len());
        for &key in &list.keys {
            let key_name = schema
                .node(key)
                .map(|n| n.name.as_str())
                .ok_or_else(|| DataError::UnknownNode(path.to_string()))?;
            let text = segment
                .predicates
                .iter()
                .find_map(|p| match p {
                    Predicate::Key { name, value } if name == key_name => Some(value.as_str()),
                    _ => None,
                })
                .ok_or_else(|| DataError::MissingKeys(path.to_string()))?;
            keys.push((key, self.parse_value(key, Some(text), path)?));
        }

        let existing = self.siblings(parent).iter().copied().find(|&c| {
            self.schema_id(c) == Some(sid)
                && self
                    .list_keys(c)
                    .into_iter()
                    .eq(keys.iter().map(|(_, v)| v))
        });
        if let Some(entry) = existing {
            return Ok(entry);
        }

        let entry = self.create_inner(parent, sid)?;
        first_created.get_or_insert(entry);
        for (key, value) in keys {
            self.new_term(Some(entry), key, value)?;
        }
        Ok(entry)
    }

    fn create_inner(&mut self, parent: Option<NodeId>, sid: SchemaId) -> Result<NodeId, DataError> {
        self.clear_other_cases(parent, sid);
        self.new_inner(parent, sid)
    }

    fn create_term(&mut self, parent: Option<NodeId>, sid: SchemaId, value: Value) -> Result<NodeId, DataError> {
        self.clear_other_cases(parent, sid);
        self.new_term(parent, sid, value)
    }

    /// Frees the children of `parent` that instantiate a different case of
    /// a choice `sid` belongs to.
    pub fn clear_other_cases(&mut self, parent: Option<NodeId>, sid: SchemaId) {
        let schema = self.schema();
        let chain = schema.case_chain(sid);
        if chain.is_empty() {
            return;
        }
        let doomed: Vec<NodeId> = self
            .siblings(parent)
            .iter()
            .copied()
            .filter(|&sibling| {
                let Some(other) = self.schema_id(sibling) else {
                    return false;
                };
                let other_chain = schema.case_chain(other);
                chain.iter().any(|&(choice, branch)| {
                    other_chain
                        .iter()
                        .any(|&(c, b)| c == choice && b != branch)
                })
            })
            .collect();
        for node in doomed {
            log::debug!("removing {:?} from another case of a choice", self.path(node));
            self.free(node);
        }
    }
}

/// The `[.='v']` predicate of a leaf-list segment, if present.
fn leaf_list_predicate<'p>(segment: &'p Segment, path: &str) -> Result<Option<&'p str>, DataError> {
    match segment.predicates.as_slice() {
        [] => Ok(None),
        [Predicate::Value(v)] => Ok(Some(v.as_str())),
        _ => Err(DataError::UnexpectedPredicate(path.to_string())),
    }
}
