//! The immutable schema arena.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::LeafType;

/// Index of a module in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) u32);

/// Index of a schema node in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) u32);

/// Index of an extension definition in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionId(pub(crate) u32);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SchemaId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ExtensionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A module or submodule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub prefix: String,
    pub namespace: Option<String>,
    pub revision: Option<String>,
    /// The module this submodule belongs to.
    pub belongs_to: Option<ModuleId>,
}

impl Module {
    pub fn new(name: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            namespace: None,
            revision: None,
            belongs_to: None,
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_revision(mut self, revision: &str) -> Self {
        self.revision = Some(revision.to_string());
        self
    }

    pub fn belonging_to(mut self, module: ModuleId) -> Self {
        self.belongs_to = Some(module);
        self
    }

    pub fn is_submodule(&self) -> bool {
        self.belongs_to.is_some()
    }
}

/// Kind of a schema node. Never changes once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    Rpc,
    Input,
    Output,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::List => "list",
            Self::Leaf => "leaf",
            Self::LeafList => "leaf-list",
            Self::Choice => "choice",
            Self::Case => "case",
            Self::Rpc => "rpc",
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    /// Kinds that are instantiated as data nodes.
    pub fn is_data(self) -> bool {
        matches!(
            self,
            Self::Container | Self::List | Self::Leaf | Self::LeafList | Self::Rpc
        )
    }

    /// Kinds that hold a typed value instead of children.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Leaf | Self::LeafList)
    }

    /// Kinds that never appear in data paths.
    pub fn is_transparent(self) -> bool {
        matches!(self, Self::Choice | Self::Case | Self::Input | Self::Output)
    }

    /// Kinds whose instances can repeat under one parent.
    pub fn is_repeated(self) -> bool {
        matches!(self, Self::List | Self::LeafList)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extension statement definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDef {
    pub name: String,
    pub module: ModuleId,
    /// Name of the argument, if the extension takes one.
    pub argument: Option<String>,
}

/// A use of an extension on a schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInstance {
    pub def: ExtensionId,
    pub arg_value: Option<String>,
}

/// A node of the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub name: String,
    pub module: ModuleId,
    pub kind: NodeKind,
    pub parent: Option<SchemaId>,
    pub children: Vec<SchemaId>,
    /// Key leaves of a list, in declared order.
    pub keys: Vec<SchemaId>,
    pub leaf_type: Option<LeafType>,
    pub mandatory: bool,
    pub presence: bool,
    pub config: bool,
    pub min_elements: u32,
    pub max_elements: Option<u32>,
    pub ordered_by_user: bool,
    pub keyless: bool,
    pub default: Option<String>,
    pub extensions: Vec<ExtensionInstance>,
}

impl SchemaNode {
    pub(crate) fn new(name: &str, module: ModuleId, kind: NodeKind, parent: Option<SchemaId>) -> Self {
        Self {
            name: name.to_string(),
            module,
            kind,
            parent,
            children: Vec::new(),
            keys: Vec::new(),
            leaf_type: None,
            mandatory: false,
            presence: false,
            config: true,
            min_elements: 0,
            max_elements: None,
            ordered_by_user: false,
            keyless: false,
            default: None,
            extensions: Vec::new(),
        }
    }
}

/// A set of loaded modules and their schema trees.
///
/// Built once through [`crate::SchemaBuilder`] or [`crate::load_modules`]
/// and never mutated afterwards. Data trees borrow it.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub(crate) modules: Vec<Module>,
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) extensions: Vec<ExtensionDef>,
    pub(crate) roots: Vec<SchemaId>,
}

impl Schema {
    // ── Modules ───────────────────────────────────────────────────────────

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m))
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index())
    }

    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.name == name)
            .map(|i| ModuleId(i as u32))
    }

    /// Follows `belongs-to` links to the owning module.
    ///
    /// A module that is not a submodule is its own main module.
    pub fn main_module(&self, id: ModuleId) -> ModuleId {
        let mut current = id;
        for _ in 0..self.modules.len() {
            match self.module(current).and_then(|m| m.belongs_to) {
                Some(owner) => current = owner,
                None => break,
            }
        }
        current
    }

    pub fn main_module_name(&self, id: ModuleId) -> Option<&str> {
        self.module(self.main_module(id)).map(|m| m.name.as_str())
    }

    // ── Nodes ─────────────────────────────────────────────────────────────

    pub fn node(&self, id: SchemaId) -> Option<&SchemaNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level schema nodes of every module, in load order.
    pub fn roots(&self) -> &[SchemaId] {
        &self.roots
    }

    pub fn children(&self, id: SchemaId) -> &[SchemaId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn kind(&self, id: SchemaId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// True if `id` is a key leaf of its parent list.
    pub fn is_key(&self, id: SchemaId) -> bool {
        self.node(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.node(p))
            .is_some_and(|p| p.kind == NodeKind::List && p.keys.contains(&id))
    }

    /// Renders `module:name` using the main module of the node's module.
    pub fn qualified_name(&self, id: SchemaId) -> Option<String> {
        let node = self.node(id)?;
        let module = self.main_module_name(node.module)?;
        Some(format!("{module}:{}", node.name))
    }

    /// The nearest ancestor that is instantiated in data (container, list or rpc).
    pub fn data_parent(&self, id: SchemaId) -> Option<SchemaId> {
        let mut current = self.node(id)?.parent;
        while let Some(p) = current {
            let node = self.node(p)?;
            if node.kind.is_data() {
                return Some(p);
            }
            current = node.parent;
        }
        None
    }

    /// Data children of `parent` (top-level data nodes for `None`), looking
    /// through choice, case, input and output nodes.
    pub fn data_children(&self, parent: Option<SchemaId>) -> Vec<SchemaId> {
        let direct = match parent {
            Some(p) => self.children(p),
            None => self.roots(),
        };
        let mut out = Vec::new();
        self.collect_data_children(direct, &mut out);
        out
    }

    fn collect_data_children(&self, ids: &[SchemaId], out: &mut Vec<SchemaId>) {
        for &id in ids {
            match self.node(id) {
                Some(node) if node.kind.is_transparent() => {
                    self.collect_data_children(&node.children, out)
                }
                Some(_) => out.push(id),
                None => {}
            }
        }
    }

    /// Finds a data child by name. With `module`, the child's main module
    /// must match; without it any module matches.
    pub fn find_data_child(
        &self,
        parent: Option<SchemaId>,
        module: Option<ModuleId>,
        name: &str,
    ) -> Option<SchemaId> {
        let module = module.map(|m| self.main_module(m));
        self.data_children(parent).into_iter().find(|&id| {
            self.node(id).is_some_and(|n| {
                n.name == name && module.map_or(true, |m| self.main_module(n.module) == m)
            })
        })
    }

    /// The choice/case branches enclosing a data node, innermost first.
    ///
    /// Each pair is `(choice, branch)` where `branch` is the direct child of
    /// the choice on the way to the node: a case, or the node itself for a
    /// shorthand case.
    pub fn case_chain(&self, id: SchemaId) -> Vec<(SchemaId, SchemaId)> {
        let mut chain = Vec::new();
        let mut branch = id;
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(p) = current {
            let Some(node) = self.node(p) else { break };
            if node.kind.is_data() {
                break;
            }
            if node.kind == NodeKind::Choice {
                chain.push((p, branch));
            }
            branch = p;
            current = node.parent;
        }
        chain
    }

    /// True if `ancestor` is `id` or one of its schema ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: SchemaId, id: SchemaId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.node(c).and_then(|n| n.parent);
        }
        false
    }

    // ── Extensions ────────────────────────────────────────────────────────

    pub fn extension(&self, id: ExtensionId) -> Option<&ExtensionDef> {
        self.extensions.get(id.index())
    }

    pub fn find_extension_def(&self, module: ModuleId, name: &str) -> Option<ExtensionId> {
        self.extensions
            .iter()
            .position(|e| e.module == module && e.name == name)
            .map(|i| ExtensionId(i as u32))
    }
}
