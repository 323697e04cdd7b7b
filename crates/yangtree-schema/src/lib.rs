//! Schema model for config trees.
//!
//! A [`Schema`] is an immutable arena of modules and schema nodes
//! (containers, lists, leaves, leaf-lists, choices, cases, rpcs) with their
//! leaf types and extension instances. It is built once, either through
//! [`SchemaBuilder`] or from serde module descriptions ([`load_json`]), and
//! then borrowed by every data tree instantiated against it.
//!
//! Two lookups operate on the schema alone:
//!
//! - [`synthesize_path`] renders the data path pattern of a node, with a
//!   `[key='%s']` placeholder per list key;
//! - [`find_extension`] finds an extension instance by name, module and
//!   argument.

use thiserror::Error;

pub mod builder;
pub mod def;
pub mod extension;
pub mod path;
pub mod schema;
pub mod types;

pub use builder::{Parent, SchemaBuilder};
pub use def::{load_json, load_modules, ModuleDef, NodeDef, TypeDef};
pub use extension::{find_extension, ExtensionQuery};
pub use path::synthesize_path;
pub use schema::{
    ExtensionDef, ExtensionId, ExtensionInstance, Module, ModuleId, NodeKind, Schema, SchemaId,
    SchemaNode,
};
pub use types::{BaseType, Bound, LeafType, Pattern, RangeSet};

/// Errors raised while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown module: {0}")]
    UnknownModule(String),
    #[error("unknown schema node #{0}")]
    UnknownNode(usize),
    #[error("unknown extension: {0}")]
    UnknownExtension(String),
    #[error("{kind} \"{node}\" cannot be placed under {}", .parent.map_or("the module top level", |k| k.as_str()))]
    InvalidParent {
        node: String,
        kind: NodeKind,
        parent: Option<NodeKind>,
    },
    #[error("list \"{list}\" has no key leaf \"{key}\"")]
    MissingKey { list: String, key: String },
    #[error("list \"{0}\" declares no keys")]
    MissingKeys(String),
    #[error("leaf \"{0}\" has no type")]
    MissingType(String),
    #[error("duplicate node \"{0}\"")]
    DuplicateNode(String),
    #[error("invalid restriction: {0}")]
    InvalidRestriction(String),
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("augment target not found: {0}")]
    AugmentTarget(String),
    #[error("malformed module description: {0}")]
    Parse(String),
}
