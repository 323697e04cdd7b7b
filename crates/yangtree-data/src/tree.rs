//! Data tree storage.
//!
//! Nodes live in a generational arena owned by the tree. A [`NodeId`] names
//! a slot and the generation it was allocated in; freeing a node bumps the
//! slot's generation, so ids of freed nodes never alias nodes allocated
//! later.

use std::fmt;

use yangtree_schema::{LeafType, NodeKind, Schema, SchemaId, SchemaNode};

use crate::value::Value;
use crate::DataError;

/// Identifier of a node inside one [`DataTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(&self) -> u32 {
        self.index
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

/// A name/value annotation carried by a data node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub module: Option<String>,
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            module: None,
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn in_module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }
}

/// Children of an inner node, or the value of a terminal node.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Inner(Vec<NodeId>),
    Term(Value),
}

/// A node of a data tree.
#[derive(Debug, Clone)]
pub struct DataNode {
    schema: SchemaId,
    parent: Option<NodeId>,
    payload: Payload,
    attributes: Vec<Attribute>,
}

impl DataNode {
    pub fn schema(&self) -> SchemaId {
        self.schema
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.payload {
            Payload::Inner(children) => children,
            Payload::Term(_) => &[],
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Term(value) => Some(value),
            Payload::Inner(_) => None,
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    node: Option<DataNode>,
    generation: u32,
}

/// An instance tree of a [`Schema`].
///
/// The tree may hold several top-level nodes, one sequence of siblings per
/// module. Cloning a tree copies every node; ids stay valid in the clone.
#[derive(Debug, Clone)]
pub struct DataTree<'s> {
    schema: &'s Schema,
    slots: Vec<Slot>,
    free: Vec<u32>,
    roots: Vec<NodeId>,
    len: usize,
}

impl<'s> DataTree<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            slots: Vec::new(),
            free: Vec::new(),
            roots: Vec::new(),
            len: 0,
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// True if both trees were instantiated against the same schema.
    pub fn same_schema(&self, other: &DataTree<'_>) -> bool {
        std::ptr::eq(self.schema, other.schema)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // ── Node access ───────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&DataNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut DataNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(DataNode::children).unwrap_or(&[])
    }

    /// Children of `parent`, or the top-level nodes for `None`.
    pub fn siblings(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(p) => self.children(p),
            None => &self.roots,
        }
    }

    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.node(id)?.value()
    }

    pub fn schema_id(&self, id: NodeId) -> Option<SchemaId> {
        self.node(id).map(|n| n.schema)
    }

    pub fn schema_node(&self, id: NodeId) -> Option<&'s SchemaNode> {
        let schema = self.schema;
        schema.node(self.node(id)?.schema)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.schema_node(id).map(|n| n.kind)
    }

    pub fn name(&self, id: NodeId) -> Option<&'s str> {
        self.schema_node(id).map(|n| n.name.as_str())
    }

    pub(crate) fn leaf_type(&self, id: NodeId) -> Option<&'s LeafType> {
        self.schema_node(id)?.leaf_type.as_ref()
    }

    /// Follows parent links to the top-level ancestor.
    ///
    /// An id that is not live in this tree is returned unchanged.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Depth below the top level (top-level nodes are at depth 0).
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// True if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    /// Pre-order traversal of the subtree rooted at `id`.
    pub fn dfs(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Pre-order traversal of the whole tree.
    pub fn preorder(&self) -> Vec<NodeId> {
        self.roots.iter().flat_map(|&root| self.dfs(root)).collect()
    }

    // ── Attributes ────────────────────────────────────────────────────────

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        self.node(id)?.attribute(name)
    }

    /// Adds an attribute, replacing one with the same name and module.
    pub fn add_attribute(&mut self, id: NodeId, attribute: Attribute) -> Result<(), DataError> {
        let node = self.node_mut(id).ok_or(DataError::StaleNode(id))?;
        match node
            .attributes
            .iter_mut()
            .find(|a| a.name == attribute.name && a.module == attribute.module)
        {
            Some(existing) => existing.value = attribute.value,
            None => node.attributes.push(attribute),
        }
        Ok(())
    }

    /// Removes the first attribute named `name`.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        let node = self.node_mut(id)?;
        let pos = node.attributes.iter().position(|a| a.name == name)?;
        Some(node.attributes.remove(pos))
    }

    // ── Construction ──────────────────────────────────────────────────────

    fn alloc(&mut self, node: DataNode) -> NodeId {
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    node: Some(node),
                    generation: 0,
                });
                NodeId::new(index, 0)
            }
        }
    }

    /// Checks that `schema` may be instantiated directly under `parent`.
    fn check_placement(&self, parent: Option<NodeId>, schema: SchemaId) -> Result<(), DataError> {
        let expected = self.schema.data_parent(schema);
        let actual = match parent {
            Some(p) => Some(self.node(p).ok_or(DataError::StaleNode(p))?.schema),
            None => None,
        };
        if self.schema.node(schema).is_none() || expected != actual {
            return Err(DataError::InvalidParent(
                self.schema
                    .qualified_name(schema)
                    .unwrap_or_else(|| format!("#{}", schema.index())),
            ));
        }
        Ok(())
    }

    fn insert(&mut self, parent: Option<NodeId>, schema: SchemaId, payload: Payload) -> NodeId {
        let id = self.alloc(DataNode {
            schema,
            parent,
            payload,
            attributes: Vec::new(),
        });
        self.link(parent, id, schema);
        id
    }

    /// Links `id` after the last sibling of the same schema node, or at the
    /// end of the sibling list.
    fn link(&mut self, parent: Option<NodeId>, id: NodeId, schema: SchemaId) {
        let siblings = self.siblings(parent);
        let pos = siblings
            .iter()
            .rposition(|&s| self.schema_id(s) == Some(schema))
            .map_or(siblings.len(), |p| p + 1);
        match parent {
            Some(p) => {
                if let Some(DataNode {
                    payload: Payload::Inner(children),
                    ..
                }) = self.node_mut(p)
                {
                    children.insert(pos, id);
                }
            }
            None => self.roots.insert(pos, id),
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let parent = self.parent(id);
        match parent {
            Some(p) => {
                if let Some(DataNode {
                    payload: Payload::Inner(children),
                    ..
                }) = self.node_mut(p)
                {
                    children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
    }

    /// Creates a container, list entry or rpc node.
    pub fn new_inner(&mut self, parent: Option<NodeId>, schema: SchemaId) -> Result<NodeId, DataError> {
        self.check_placement(parent, schema)?;
        if self.schema.kind(schema).is_some_and(NodeKind::is_terminal) {
            return Err(DataError::NotInner(self.describe(schema)));
        }
        Ok(self.insert(parent, schema, Payload::Inner(Vec::new())))
    }

    /// Creates a leaf or leaf-list entry holding `value`.
    pub fn new_term(
        &mut self,
        parent: Option<NodeId>,
        schema: SchemaId,
        value: Value,
    ) -> Result<NodeId, DataError> {
        self.check_placement(parent, schema)?;
        if !self.schema.kind(schema).is_some_and(NodeKind::is_terminal) {
            return Err(DataError::NotTerminal(self.describe(schema)));
        }
        Ok(self.insert(parent, schema, Payload::Term(value)))
    }

    /// Creates a terminal node from the text form of its value.
    pub fn new_term_str(
        &mut self,
        parent: Option<NodeId>,
        schema: SchemaId,
        text: &str,
    ) -> Result<NodeId, DataError> {
        let schemas = self.schema;
        let ty = schemas
            .node(schema)
            .and_then(|n| n.leaf_type.as_ref())
            .ok_or_else(|| DataError::NotTerminal(self.describe(schema)))?;
        let value = Value::parse(ty, text).map_err(|source| DataError::InvalidValue {
            path: self.describe(schema),
            source,
        })?;
        self.new_term(parent, schema, value)
    }

    /// Replaces the value of a terminal node. Returns whether it changed.
    pub fn set_value(&mut self, id: NodeId, value: Value) -> Result<bool, DataError> {
        let node = self.node_mut(id).ok_or(DataError::StaleNode(id))?;
        match &mut node.payload {
            Payload::Term(current) if *current == value => Ok(false),
            Payload::Term(current) => {
                *current = value;
                Ok(true)
            }
            Payload::Inner(_) => Err(DataError::NotTerminal(format!("{id:?}"))),
        }
    }

    /// Records the node a leafref or instance-identifier value resolves to.
    pub fn set_reference_target(&mut self, id: NodeId, target: Option<NodeId>) {
        if let Some(DataNode {
            payload: Payload::Term(value),
            ..
        }) = self.node_mut(id)
        {
            value.set_target(target);
        }
    }

    /// Unlinks and frees `id` with its whole subtree. Returns false for an id
    /// that is no longer live.
    pub fn free(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.unlink(id);
        for node in self.dfs(id) {
            let Some(slot) = self.slots.get_mut(node.index as usize) else {
                continue;
            };
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
            self.len -= 1;
        }
        true
    }

    /// Frees every node.
    pub fn clear(&mut self) {
        for root in self.roots.clone() {
            self.free(root);
        }
    }

    /// Deep-copies `source_id` from another tree of the same schema under
    /// `parent`. Reference targets are cleared in the copy.
    pub fn import_subtree(
        &mut self,
        source: &DataTree<'_>,
        source_id: NodeId,
        parent: Option<NodeId>,
    ) -> Result<NodeId, DataError> {
        if !self.same_schema(source) {
            return Err(DataError::SchemaMismatch);
        }
        let node = source.node(source_id).ok_or(DataError::StaleNode(source_id))?;
        self.check_placement(parent, node.schema)?;
        Ok(self.copy_from(source, source_id, parent))
    }

    fn copy_from(&mut self, source: &DataTree<'_>, source_id: NodeId, parent: Option<NodeId>) -> NodeId {
        let Some(node) = source.node(source_id) else {
            return source_id;
        };
        let payload = match &node.payload {
            Payload::Inner(_) => Payload::Inner(Vec::new()),
            Payload::Term(value) => {
                let mut value = value.clone();
                value.set_target(None);
                Payload::Term(value)
            }
        };
        let id = self.alloc(DataNode {
            schema: node.schema,
            parent,
            payload,
            attributes: node.attributes.clone(),
        });
        self.link(parent, id, node.schema);
        for &child in node.children() {
            self.copy_from(source, child, Some(id));
        }
        id
    }

    // ── Instance identity ─────────────────────────────────────────────────

    /// Key leaf values of a list entry, in key order.
    pub fn list_keys(&self, id: NodeId) -> Vec<&Value> {
        let Some(schema_node) = self.schema_node(id) else {
            return Vec::new();
        };
        schema_node
            .keys
            .iter()
            .filter_map(|&key| {
                self.children(id)
                    .iter()
                    .find(|&&c| self.schema_id(c) == Some(key))
                    .and_then(|&c| self.value(c))
            })
            .collect()
    }

    /// Finds the child of `schema` under `parent` with no regard to keys.
    pub fn find_child(&self, parent: Option<NodeId>, schema: SchemaId) -> Option<NodeId> {
        self.siblings(parent)
            .iter()
            .copied()
            .find(|&c| self.schema_id(c) == Some(schema))
    }

    /// Finds the counterpart of `other_id` (a node of `other`) among the
    /// children of `parent` in this tree.
    ///
    /// Containers and leaves match by schema node, list entries by key
    /// values, leaf-list entries by value. Entries of keyless lists match by
    /// position among their siblings.
    pub fn find_instance(&self, parent: Option<NodeId>, other: &DataTree<'_>, other_id: NodeId) -> Option<NodeId> {
        let other_node = other.node(other_id)?;
        let schema_id = other_node.schema;
        let schema_node = self.schema.node(schema_id)?;
        let candidates = self
            .siblings(parent)
            .iter()
            .copied()
            .filter(|&c| self.schema_id(c) == Some(schema_id));

        match schema_node.kind {
            NodeKind::List if schema_node.keyless => {
                let position = other
                    .siblings(other_node.parent)
                    .iter()
                    .filter(|&&s| other.schema_id(s) == Some(schema_id))
                    .position(|&s| s == other_id)?;
                candidates.into_iter().nth(position)
            }
            NodeKind::List => {
                let keys = other.list_keys(other_id);
                candidates.into_iter().find(|&c| self.list_keys(c) == keys)
            }
            NodeKind::LeafList => {
                let value = other_node.value()?;
                candidates.into_iter().find(|&c| self.value(c) == Some(value))
            }
            _ => candidates.into_iter().next(),
        }
    }

    // ── Paths ─────────────────────────────────────────────────────────────

    /// The instance path of a node.
    ///
    /// Segments are module-qualified on the first level and on module
    /// changes; list entries carry their keys as `[k='v']`, leaf-list
    /// entries their value as `[.='v']`, keyless list entries their
    /// 1-based position.
    pub fn path(&self, id: NodeId) -> Option<String> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }

        let mut out = String::new();
        let mut prev_module = None;
        for &node_id in chain.iter().rev() {
            let node = self.node(node_id)?;
            let schema_node = self.schema.node(node.schema)?;
            let module = self.schema.main_module(schema_node.module);
            out.push('/');
            if prev_module != Some(module) {
                out.push_str(self.schema.main_module_name(module)?);
                out.push(':');
                prev_module = Some(module);
            }
            out.push_str(&schema_node.name);
            match schema_node.kind {
                NodeKind::List if schema_node.keyless => {
                    let position = self
                        .siblings(node.parent)
                        .iter()
                        .filter(|&&s| self.schema_id(s) == Some(node.schema))
                        .position(|&s| s == node_id)?;
                    out.push_str(&format!("[{}]", position + 1));
                }
                NodeKind::List => {
                    for &key in &schema_node.keys {
                        let key_name = &self.schema.node(key)?.name;
                        let value = node
                            .children()
                            .iter()
                            .find(|&&c| self.schema_id(c) == Some(key))
                            .and_then(|&c| self.value(c));
                        if let Some(value) = value {
                            out.push_str(&format!(
                                "[{key_name}={}]",
                                yangtree_path::quote_literal(&value.to_string())
                            ));
                        }
                    }
                }
                NodeKind::LeafList => {
                    if let Some(value) = node.value() {
                        out.push_str(&format!(
                            "[.={}]",
                            yangtree_path::quote_literal(&value.to_string())
                        ));
                    }
                }
                _ => {}
            }
        }
        Some(out)
    }

    pub(crate) fn describe(&self, schema: SchemaId) -> String {
        self.schema
            .qualified_name(schema)
            .unwrap_or_else(|| format!("#{}", schema.index()))
    }
}
