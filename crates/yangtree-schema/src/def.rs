//! Serde module descriptions.
//!
//! A module description is a JSON document listing a module's nodes, types
//! and extensions. It is an alternative to driving [`SchemaBuilder`] by hand:
//!
//! ```
//! use yangtree_schema::{load_json, NodeKind};
//!
//! let schema = load_json(r#"[{
//!     "name": "example",
//!     "prefix": "ex",
//!     "nodes": [{
//!         "kind": "container",
//!         "name": "top",
//!         "children": [
//!             {"kind": "leaf", "name": "mtu", "type": {"base": "uint16", "range": "68..9000"}}
//!         ]
//!     }]
//! }]"#).unwrap();
//!
//! let top = schema.find_data_child(None, None, "top").unwrap();
//! let mtu = schema.find_data_child(Some(top), None, "mtu").unwrap();
//! assert_eq!(schema.kind(mtu), Some(NodeKind::Leaf));
//! ```

use serde::{Deserialize, Serialize};

use crate::builder::{Parent, SchemaBuilder};
use crate::schema::{ModuleId, NodeKind, Schema, SchemaId};
use crate::types::{BaseType, LeafType, Pattern, RangeSet};
use crate::SchemaError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleDef {
    pub name: String,
    pub prefix: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
    /// Name of the module this submodule belongs to.
    #[serde(default)]
    pub belongs_to: Option<String>,
    #[serde(default)]
    pub extensions: Vec<ExtensionStmt>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub augments: Vec<AugmentDef>,
}

/// An `extension` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionStmt {
    pub name: String,
    #[serde(default)]
    pub argument: Option<String>,
}

/// Use of an extension on a node. `module` defaults to the node's own module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionUse {
    pub name: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub argument: Option<String>,
}

/// Nodes added to another module's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentDef {
    /// Schema path of the augmented node: `/prefix:top/inner`.
    pub target: String,
    pub nodes: Vec<NodeDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeDef {
    pub kind: NodeKind,
    pub name: String,
    #[serde(default)]
    pub children: Vec<NodeDef>,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(rename = "type", default)]
    pub leaf_type: Option<TypeDef>,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub presence: bool,
    #[serde(default)]
    pub config: Option<bool>,
    #[serde(default)]
    pub min_elements: u32,
    #[serde(default)]
    pub max_elements: Option<u32>,
    #[serde(default)]
    pub ordered_by_user: bool,
    #[serde(default)]
    pub keyless: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub extensions: Vec<ExtensionUse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypeDef {
    pub base: BaseType,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub enums: Vec<String>,
    #[serde(default)]
    pub fraction_digits: Option<u8>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub require_instance: Option<bool>,
}

impl TypeDef {
    pub fn to_leaf_type(&self) -> Result<LeafType, SchemaError> {
        let mut ty = LeafType::new(self.base);
        if self.base == BaseType::Decimal64 {
            ty.fraction_digits = self
                .fraction_digits
                .filter(|d| (1..=18).contains(d))
                .ok_or_else(|| SchemaError::InvalidRestriction("fraction-digits".into()))?;
        }
        if let Some(range) = &self.range {
            let scale = if self.base == BaseType::Decimal64 {
                ty.fraction_digits
            } else {
                0
            };
            ty.range = Some(RangeSet::parse(range, scale)?);
        }
        if let Some(length) = &self.length {
            ty.length = Some(RangeSet::parse(length, 0)?);
        }
        for pattern in &self.patterns {
            ty.patterns.push(Pattern::new(pattern)?);
        }
        ty.enums = self.enums.clone();
        ty.path = self.path.clone();
        if let Some(require) = self.require_instance {
            ty.require_instance = require;
        }
        Ok(ty)
    }
}

/// Parses a JSON array of module descriptions and builds a schema.
pub fn load_json(text: &str) -> Result<Schema, SchemaError> {
    let defs: Vec<ModuleDef> =
        serde_json::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))?;
    load_modules(&defs)
}

/// Builds a schema from module descriptions.
///
/// Modules are registered first so that `belongs-to`, extension uses and
/// augments may refer to modules later in the list.
pub fn load_modules(defs: &[ModuleDef]) -> Result<Schema, SchemaError> {
    let mut b = SchemaBuilder::new();

    let mut ids = Vec::with_capacity(defs.len());
    for def in defs {
        let mut module = crate::Module::new(&def.name, &def.prefix);
        module.namespace = def.namespace.clone();
        module.revision = def.revision.clone();
        ids.push(b.add_module(module));
    }

    for (def, &id) in defs.iter().zip(&ids) {
        if let Some(owner) = &def.belongs_to {
            let owner = b
                .find_module(owner)
                .ok_or_else(|| SchemaError::UnknownModule(owner.clone()))?;
            if let Some(module) = b.module_mut(id) {
                module.belongs_to = Some(owner);
            }
        }
        for ext in &def.extensions {
            b.extension(id, &ext.name, ext.argument.as_deref());
        }
    }

    for (def, &id) in defs.iter().zip(&ids) {
        for node in &def.nodes {
            add_node(&mut b, Parent::Module(id), id, node)?;
        }
    }

    for (def, &id) in defs.iter().zip(&ids) {
        for augment in &def.augments {
            let target = resolve_schema_path(&b, &augment.target)
                .ok_or_else(|| SchemaError::AugmentTarget(augment.target.clone()))?;
            for node in &augment.nodes {
                add_node(&mut b, Parent::Augment(target, id), id, node)?;
            }
        }
    }

    b.build()
}

fn add_node(
    b: &mut SchemaBuilder,
    parent: Parent,
    module: ModuleId,
    def: &NodeDef,
) -> Result<SchemaId, SchemaError> {
    let leaf_type = || -> Result<LeafType, SchemaError> {
        def.leaf_type
            .as_ref()
            .ok_or_else(|| SchemaError::MissingType(def.name.clone()))?
            .to_leaf_type()
    };

    let id = match def.kind {
        NodeKind::Container => b.container(parent, &def.name),
        NodeKind::List if def.keyless => b.keyless_list(parent, &def.name),
        NodeKind::List => {
            let keys: Vec<&str> = def.keys.iter().map(String::as_str).collect();
            b.list(parent, &def.name, &keys)
        }
        NodeKind::Leaf => b.leaf(parent, &def.name, leaf_type()?),
        NodeKind::LeafList => b.leaf_list(parent, &def.name, leaf_type()?),
        NodeKind::Choice => b.choice(parent, &def.name),
        NodeKind::Case => match parent {
            Parent::Node(choice) | Parent::Augment(choice, _) => b.case(choice, &def.name),
            Parent::Module(_) => {
                return Err(SchemaError::InvalidParent {
                    node: def.name.clone(),
                    kind: NodeKind::Case,
                    parent: None,
                })
            }
        },
        NodeKind::Rpc => b.rpc(module, &def.name),
        NodeKind::Input | NodeKind::Output => match parent {
            Parent::Node(rpc) if def.kind == NodeKind::Input => b.input(rpc),
            Parent::Node(rpc) => b.output(rpc),
            _ => {
                return Err(SchemaError::InvalidParent {
                    node: def.name.clone(),
                    kind: def.kind,
                    parent: None,
                })
            }
        },
    };

    if def.mandatory {
        b.mandatory(id);
    }
    if def.presence {
        b.presence(id);
    }
    if let Some(config) = def.config {
        b.config(id, config);
    }
    if def.min_elements > 0 {
        b.min_elements(id, def.min_elements);
    }
    if let Some(max) = def.max_elements {
        b.max_elements(id, max);
    }
    if def.ordered_by_user {
        b.ordered_by_user(id);
    }
    if let Some(default) = &def.default {
        b.default_value(id, default);
    }

    for ext in &def.extensions {
        let ext_module = match &ext.module {
            Some(name) => b
                .find_module(name)
                .ok_or_else(|| SchemaError::UnknownModule(name.clone()))?,
            None => module,
        };
        let ext_id = b
            .find_extension(ext_module, &ext.name)
            .ok_or_else(|| SchemaError::UnknownExtension(ext.name.clone()))?;
        b.use_extension(id, ext_id, ext.argument.as_deref());
    }

    for child in &def.children {
        add_node(b, Parent::Node(id), module, child)?;
    }
    Ok(id)
}

/// Resolves a schema path such as `/ex:top/inner` against the nodes added so
/// far. Choice and case nodes may be named explicitly or skipped.
fn resolve_schema_path(b: &SchemaBuilder, path: &str) -> Option<SchemaId> {
    let mut current: Option<SchemaId> = None;
    for step in path.strip_prefix('/')?.split('/') {
        let (module, name) = match step.split_once(':') {
            Some((prefix, name)) => {
                let module = b
                    .find_module_by_prefix(prefix)
                    .or_else(|| b.find_module(prefix))?;
                (Some(module), name)
            }
            None => (None, step),
        };
        let candidates = match current {
            Some(id) => b.node(id)?.children.clone(),
            None => b.roots().to_vec(),
        };
        current = Some(find_schema_child(b, &candidates, module, name)?);
    }
    current
}

fn find_schema_child(
    b: &SchemaBuilder,
    ids: &[SchemaId],
    module: Option<ModuleId>,
    name: &str,
) -> Option<SchemaId> {
    let matches = |id: SchemaId| {
        b.node(id)
            .is_some_and(|n| n.name == name && module.map_or(true, |m| n.module == m))
    };
    if let Some(&id) = ids.iter().find(|&&id| matches(id)) {
        return Some(id);
    }
    ids.iter().find_map(|&id| {
        let node = b.node(id)?;
        if node.kind.is_transparent() {
            find_schema_child(b, &node.children, module, name)
        } else {
            None
        }
    })
}
