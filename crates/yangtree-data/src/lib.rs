//! Config data trees bound to a [`yangtree_schema::Schema`].
//!
//! A [`DataTree`] holds instance data in a generational arena: containers,
//! list entries and rpc nodes own ordered children, leaves and leaf-list
//! entries hold a typed [`Value`]. Nodes carry out-of-band [`Attribute`]s.
//!
//! Trees are edited by path ([`DataTree::new_path`], [`DataTree::set`],
//! [`DataTree::delete`]) or node by node, and queried with the absolute
//! path subset of [`yangtree_path`] ([`DataTree::find_path`]).
//!
//! # Example
//!
//! ```
//! use yangtree_data::DataTree;
//! use yangtree_schema::{LeafType, SchemaBuilder};
//!
//! let mut b = SchemaBuilder::new();
//! let m = b.module("example", "ex");
//! let top = b.container(m, "interfaces");
//! let iface = b.list(top, "interface", &["name"]);
//! b.leaf(iface, "name", LeafType::string());
//! b.leaf(iface, "enabled", LeafType::boolean());
//! let schema = b.build().unwrap();
//!
//! let mut tree = DataTree::new(&schema);
//! tree.set("/example:interfaces/interface[name='eth0']/enabled", "true").unwrap();
//! tree.set("/example:interfaces/interface[name='eth1']/enabled", "false").unwrap();
//!
//! assert_eq!(tree.count("/example:interfaces/interface"), 2);
//! assert_eq!(
//!     tree.values("/example:interfaces/interface/enabled"),
//!     vec!["true", "false"]
//! );
//! assert_eq!(
//!     tree.paths("/example:interfaces/interface[name='eth1']/enabled"),
//!     vec!["/example:interfaces/interface[name='eth1']/enabled"]
//! );
//! ```

use thiserror::Error;
use yangtree_path::PathError;

mod edit;
pub mod query;
pub mod tree;
pub mod value;

pub use query::PathSet;
pub use tree::{Attribute, DataNode, DataTree, NodeId, Payload};
pub use value::{Value, ValueError};

/// Errors raised while editing a data tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("unknown module \"{0}\"")]
    UnknownModule(String),
    #[error("no schema node for {0}")]
    UnknownNode(String),
    #[error("wildcards and positions cannot create data: {0}")]
    UnsupportedPath(String),
    #[error("unexpected predicate in {0}")]
    UnexpectedPredicate(String),
    #[error("list keys missing in {0}")]
    MissingKeys(String),
    #[error("list key cannot change value: {0}")]
    KeyChange(String),
    #[error("a value is required for {0}")]
    MissingValue(String),
    #[error("invalid value for {path}: {source}")]
    InvalidValue {
        path: String,
        #[source]
        source: ValueError,
    },
    #[error("{0} cannot have children")]
    NotInner(String),
    #[error("{0} holds no value")]
    NotTerminal(String),
    #[error("{0} cannot be created here")]
    InvalidParent(String),
    #[error("node {0:?} is not in the tree")]
    StaleNode(NodeId),
    #[error("{count} nodes match {path}; refusing to delete more than one")]
    Ambiguous { path: String, count: usize },
    #[error("the value \"{value}\" was not set at {path}")]
    NotSet { path: String, value: String },
    #[error("trees belong to different schemas")]
    SchemaMismatch,
}
