//! Programmatic schema construction.
//!
//! ```
//! use yangtree_schema::{LeafType, NodeKind, SchemaBuilder};
//!
//! let mut b = SchemaBuilder::new();
//! let m = b.module("example", "ex");
//! let top = b.container(m, "top");
//! let item = b.list(top, "item", &["name"]);
//! b.leaf(item, "name", LeafType::string());
//! b.leaf(item, "mtu", LeafType::new(yangtree_schema::BaseType::Uint16));
//!
//! let schema = b.build().unwrap();
//! let list = schema.node(item).unwrap();
//! assert_eq!(list.kind, NodeKind::List);
//! assert_eq!(list.keys.len(), 1);
//! ```

use crate::schema::{
    ExtensionDef, ExtensionId, ExtensionInstance, Module, ModuleId, NodeKind, Schema, SchemaId,
    SchemaNode,
};
use crate::types::{BaseType, LeafType};
use crate::SchemaError;

/// Where a new node is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// Top level of a module.
    Module(ModuleId),
    /// Child of a node, in the node's module.
    Node(SchemaId),
    /// Child of a node, contributed by another module.
    Augment(SchemaId, ModuleId),
}

impl From<ModuleId> for Parent {
    fn from(module: ModuleId) -> Self {
        Parent::Module(module)
    }
}

impl From<SchemaId> for Parent {
    fn from(node: SchemaId) -> Self {
        Parent::Node(node)
    }
}

/// Builder for a [`Schema`].
///
/// Node constructors never fail; structural problems (unknown parents,
/// missing keys, misplaced cases) are reported by [`SchemaBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    modules: Vec<Module>,
    nodes: Vec<SchemaNode>,
    extensions: Vec<ExtensionDef>,
    roots: Vec<SchemaId>,
    pending_keys: Vec<(SchemaId, Vec<String>)>,
    errors: Vec<SchemaError>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Modules

    pub fn module(&mut self, name: &str, prefix: &str) -> ModuleId {
        self.add_module(Module::new(name, prefix))
    }

    pub fn submodule(&mut self, name: &str, prefix: &str, belongs_to: ModuleId) -> ModuleId {
        self.add_module(Module::new(name, prefix).belonging_to(belongs_to))
    }

    pub fn add_module(&mut self, module: Module) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(module);
        id
    }

    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.name == name)
            .map(|i| ModuleId(i as u32))
    }

    pub(crate) fn find_module_by_prefix(&self, prefix: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.prefix == prefix)
            .map(|i| ModuleId(i as u32))
    }

    pub(crate) fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id.index())
    }

    // ------------------------------------------------------------------
    // Nodes

    pub fn container(&mut self, parent: impl Into<Parent>, name: &str) -> SchemaId {
        self.add_node(parent.into(), name, NodeKind::Container)
    }

    /// A list identified by the named key leaves, in order.
    ///
    /// The key leaves are added separately as children; they are resolved
    /// when the schema is built.
    pub fn list(&mut self, parent: impl Into<Parent>, name: &str, keys: &[&str]) -> SchemaId {
        let id = self.add_node(parent.into(), name, NodeKind::List);
        self.pending_keys
            .push((id, keys.iter().map(|k| k.to_string()).collect()));
        id
    }

    pub fn keyless_list(&mut self, parent: impl Into<Parent>, name: &str) -> SchemaId {
        let id = self.add_node(parent.into(), name, NodeKind::List);
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.keyless = true;
        }
        id
    }

    pub fn leaf(&mut self, parent: impl Into<Parent>, name: &str, ty: LeafType) -> SchemaId {
        let id = self.add_node(parent.into(), name, NodeKind::Leaf);
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.leaf_type = Some(ty);
        }
        id
    }

    pub fn leaf_list(&mut self, parent: impl Into<Parent>, name: &str, ty: LeafType) -> SchemaId {
        let id = self.add_node(parent.into(), name, NodeKind::LeafList);
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.leaf_type = Some(ty);
        }
        id
    }

    pub fn choice(&mut self, parent: impl Into<Parent>, name: &str) -> SchemaId {
        self.add_node(parent.into(), name, NodeKind::Choice)
    }

    pub fn case(&mut self, choice: SchemaId, name: &str) -> SchemaId {
        self.add_node(Parent::Node(choice), name, NodeKind::Case)
    }

    pub fn rpc(&mut self, module: ModuleId, name: &str) -> SchemaId {
        self.add_node(Parent::Module(module), name, NodeKind::Rpc)
    }

    pub fn input(&mut self, rpc: SchemaId) -> SchemaId {
        self.add_node(Parent::Node(rpc), "input", NodeKind::Input)
    }

    pub fn output(&mut self, rpc: SchemaId) -> SchemaId {
        self.add_node(Parent::Node(rpc), "output", NodeKind::Output)
    }

    /// Direct access to a node under construction.
    pub fn node_mut(&mut self, id: SchemaId) -> Option<&mut SchemaNode> {
        self.nodes.get_mut(id.index())
    }

    pub(crate) fn node(&self, id: SchemaId) -> Option<&SchemaNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn roots(&self) -> &[SchemaId] {
        &self.roots
    }

    pub fn mandatory(&mut self, id: SchemaId) -> &mut Self {
        self.update(id, |n| n.mandatory = true)
    }

    pub fn presence(&mut self, id: SchemaId) -> &mut Self {
        self.update(id, |n| n.presence = true)
    }

    pub fn min_elements(&mut self, id: SchemaId, min: u32) -> &mut Self {
        self.update(id, |n| n.min_elements = min)
    }

    pub fn max_elements(&mut self, id: SchemaId, max: u32) -> &mut Self {
        self.update(id, |n| n.max_elements = Some(max))
    }

    pub fn ordered_by_user(&mut self, id: SchemaId) -> &mut Self {
        self.update(id, |n| n.ordered_by_user = true)
    }

    pub fn default_value(&mut self, id: SchemaId, value: &str) -> &mut Self {
        self.update(id, |n| n.default = Some(value.to_string()))
    }

    pub fn config(&mut self, id: SchemaId, config: bool) -> &mut Self {
        self.update(id, |n| n.config = config)
    }

    fn update(&mut self, id: SchemaId, f: impl FnOnce(&mut SchemaNode)) -> &mut Self {
        match self.nodes.get_mut(id.index()) {
            Some(node) => f(node),
            None => self.errors.push(SchemaError::UnknownNode(id.index())),
        }
        self
    }

    fn add_node(&mut self, parent: Parent, name: &str, kind: NodeKind) -> SchemaId {
        let id = SchemaId(self.nodes.len() as u32);
        let (module, parent_id) = match parent {
            Parent::Module(m) => (m, None),
            Parent::Node(p) => match self.nodes.get(p.index()) {
                Some(node) => (node.module, Some(p)),
                None => {
                    self.errors.push(SchemaError::UnknownNode(p.index()));
                    (ModuleId(0), None)
                }
            },
            Parent::Augment(p, m) => (m, Some(p)),
        };
        if module.index() >= self.modules.len() {
            self.errors
                .push(SchemaError::UnknownModule(format!("#{}", module.index())));
        }

        self.nodes.push(SchemaNode::new(name, module, kind, parent_id));
        match parent_id {
            Some(p) => match self.nodes.get_mut(p.index()) {
                Some(node) => node.children.push(id),
                None => self.errors.push(SchemaError::UnknownNode(p.index())),
            },
            None => self.roots.push(id),
        }
        id
    }

    // ------------------------------------------------------------------
    // Extensions

    pub fn extension(&mut self, module: ModuleId, name: &str, argument: Option<&str>) -> ExtensionId {
        let id = ExtensionId(self.extensions.len() as u32);
        self.extensions.push(ExtensionDef {
            name: name.to_string(),
            module,
            argument: argument.map(str::to_string),
        });
        id
    }

    pub(crate) fn find_extension(&self, module: ModuleId, name: &str) -> Option<ExtensionId> {
        self.extensions
            .iter()
            .position(|e| e.module == module && e.name == name)
            .map(|i| ExtensionId(i as u32))
    }

    /// Attaches an extension instance to a node.
    pub fn use_extension(&mut self, node: SchemaId, ext: ExtensionId, arg: Option<&str>) -> &mut Self {
        if ext.index() >= self.extensions.len() {
            self.errors
                .push(SchemaError::UnknownExtension(format!("#{}", ext.index())));
            return self;
        }
        self.update(node, |n| {
            n.extensions.push(ExtensionInstance {
                def: ext,
                arg_value: arg.map(str::to_string),
            })
        })
    }

    // ------------------------------------------------------------------
    // Build

    /// Resolves list keys, checks the tree structure and freezes the schema.
    pub fn build(mut self) -> Result<Schema, SchemaError> {
        if !self.errors.is_empty() {
            return Err(self.errors.swap_remove(0));
        }

        for node in &self.nodes {
            check_placement(node, &self.nodes)?;
        }

        for (list, names) in std::mem::take(&mut self.pending_keys) {
            let mut keys = Vec::with_capacity(names.len());
            let list_node = self
                .nodes
                .get(list.index())
                .ok_or(SchemaError::UnknownNode(list.index()))?;
            for name in &names {
                let key = list_node
                    .children
                    .iter()
                    .copied()
                    .find(|&c| {
                        self.nodes
                            .get(c.index())
                            .is_some_and(|n| n.kind == NodeKind::Leaf && &n.name == name)
                    })
                    .ok_or_else(|| SchemaError::MissingKey {
                        list: list_node.name.clone(),
                        key: name.clone(),
                    })?;
                keys.push(key);
            }
            if let Some(node) = self.nodes.get_mut(list.index()) {
                node.keys = keys;
            }
        }

        for node in &self.nodes {
            if node.kind == NodeKind::List && !node.keyless && node.keys.is_empty() {
                return Err(SchemaError::MissingKeys(node.name.clone()));
            }
            if node.kind.is_terminal() && node.leaf_type.is_none() {
                return Err(SchemaError::MissingType(node.name.clone()));
            }
            if let Some(ty) = &node.leaf_type {
                if ty.base == BaseType::Decimal64 && !(1..=18).contains(&ty.fraction_digits) {
                    return Err(SchemaError::InvalidRestriction(format!(
                        "fraction-digits {} of \"{}\"",
                        ty.fraction_digits, node.name
                    )));
                }
            }
        }

        let schema = Schema {
            modules: self.modules,
            nodes: self.nodes,
            extensions: self.extensions,
            roots: self.roots,
        };
        check_unique_names(&schema, None)?;
        for i in 0..schema.len() {
            let id = SchemaId(i as u32);
            // rpc input and output may share names
            if schema
                .kind(id)
                .is_some_and(|k| matches!(k, NodeKind::Container | NodeKind::List))
            {
                check_unique_names(&schema, Some(id))?;
            }
        }

        log::debug!(
            "built schema: {} modules, {} nodes, {} extensions",
            schema.modules.len(),
            schema.nodes.len(),
            schema.extensions.len()
        );
        Ok(schema)
    }
}

fn check_placement(node: &SchemaNode, nodes: &[SchemaNode]) -> Result<(), SchemaError> {
    let parent_kind = node
        .parent
        .and_then(|p| nodes.get(p.index()))
        .map(|p| p.kind);
    let ok = match (node.kind, parent_kind) {
        (_, Some(NodeKind::Leaf | NodeKind::LeafList)) => false,
        (NodeKind::Case, parent) => parent == Some(NodeKind::Choice),
        (NodeKind::Input | NodeKind::Output, parent) => parent == Some(NodeKind::Rpc),
        (NodeKind::Rpc, parent) => parent.is_none(),
        (_, Some(NodeKind::Rpc)) => false,
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(SchemaError::InvalidParent {
            node: node.name.clone(),
            kind: node.kind,
            parent: parent_kind,
        })
    }
}

fn check_unique_names(schema: &Schema, parent: Option<SchemaId>) -> Result<(), SchemaError> {
    let children = schema.data_children(parent);
    for (i, &a) in children.iter().enumerate() {
        for &b in &children[i + 1..] {
            let (Some(na), Some(nb)) = (schema.node(a), schema.node(b)) else {
                continue;
            };
            if na.name == nb.name && schema.main_module(na.module) == schema.main_module(nb.module) {
                return Err(SchemaError::DuplicateNode(na.name.clone()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_resolve_in_declared_order() {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let l = b.list(m, "l", &["b", "a"]);
        let a = b.leaf(l, "a", LeafType::string());
        let bb = b.leaf(l, "b", LeafType::new(BaseType::Uint8));
        let schema = b.build().unwrap();
        assert_eq!(schema.node(l).unwrap().keys, vec![bb, a]);
        assert!(schema.is_key(a));
    }

    #[test]
    fn missing_key_leaf() {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        b.list(m, "l", &["id"]);
        assert_eq!(
            b.build().unwrap_err(),
            SchemaError::MissingKey {
                list: "l".into(),
                key: "id".into()
            }
        );
    }

    #[test]
    fn list_without_keys_must_be_keyless() {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        b.list(m, "l", &[]);
        assert_eq!(b.build().unwrap_err(), SchemaError::MissingKeys("l".into()));

        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let l = b.keyless_list(m, "l");
        b.leaf(l, "v", LeafType::string());
        assert!(b.build().is_ok());
    }

    #[test]
    fn case_outside_choice_is_rejected() {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let c = b.container(m, "c");
        b.case(c, "oops");
        assert!(matches!(
            b.build(),
            Err(SchemaError::InvalidParent { kind: NodeKind::Case, .. })
        ));
    }

    #[test]
    fn duplicate_names_through_choices() {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let top = b.container(m, "top");
        b.leaf(top, "x", LeafType::string());
        let ch = b.choice(top, "ch");
        let case = b.case(ch, "a");
        b.leaf(case, "x", LeafType::string());
        assert_eq!(b.build().unwrap_err(), SchemaError::DuplicateNode("x".into()));
    }

    #[test]
    fn augmenting_module_may_reuse_names() {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let aug = b.module("aug", "a");
        let top = b.container(m, "top");
        b.leaf(top, "x", LeafType::string());
        let x2 = b.leaf(Parent::Augment(top, aug), "x", LeafType::string());
        let schema = b.build().unwrap();
        assert_eq!(schema.node(x2).unwrap().module, aug);
        assert_eq!(schema.find_data_child(Some(top), Some(aug), "x"), Some(x2));
    }

    #[test]
    fn decimal_fraction_digits_must_be_1_to_18() {
        for digits in [0, 19, 20] {
            let mut b = SchemaBuilder::new();
            let m = b.module("m", "m");
            let top = b.container(m, "top");
            b.leaf(top, "d", LeafType::decimal64(digits));
            assert!(
                matches!(b.build(), Err(SchemaError::InvalidRestriction(_))),
                "fraction-digits {digits}"
            );
        }

        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let top = b.container(m, "top");
        b.leaf(top, "d", LeafType::decimal64(18));
        assert!(b.build().is_ok());
    }
}
