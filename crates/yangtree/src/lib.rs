//! Patch, merge, validation and diff for schema-bound config trees.
//!
//! This crate ties the workspace together: a [`Context`] owns the schema
//! reference and the error chain, [`apply_patch`] applies an annotated
//! template tree onto a target tree, [`validate`] checks a tree against its
//! schema, and [`diff`] reports the changes between two trees.
//!
//! # Example
//!
//! ```
//! use yangtree::{apply_patch, Attribute, Context};
//! use yangtree_schema::{LeafType, SchemaBuilder};
//!
//! let mut b = SchemaBuilder::new();
//! let m = b.module("example", "ex");
//! let top = b.container(m, "system");
//! b.leaf(top, "hostname", LeafType::string());
//! b.leaf(top, "location", LeafType::string());
//! let schema = b.build().unwrap();
//!
//! let mut ctx = Context::new(&schema);
//! let mut running = ctx.new_tree();
//! running.set("/example:system/hostname", "old").unwrap();
//! running.set("/example:system/location", "lab").unwrap();
//!
//! let mut template = ctx.new_tree();
//! template.set("/example:system/hostname", "new").unwrap();
//! template.set("/example:system/location", "lab").unwrap();
//! let location = template.find_path("/example:system/location").first().unwrap();
//! template.add_attribute(location, Attribute::new("operation", "remove")).unwrap();
//!
//! apply_patch(&mut running, &mut ctx, template).unwrap();
//! assert_eq!(running.values("/example:system/hostname"), vec!["new"]);
//! assert_eq!(running.count("/example:system/location"), 0);
//! ```

pub mod context;
pub mod diff;
pub mod merge;
pub mod patch;
pub mod validate;

pub use context::{Context, ContextError, ErrorCode, ErrorRecord};
pub use diff::{diff, Diff, DiffEntry, DiffError, DiffKind, DiffRecord};
pub use merge::merge_explicit;
pub use patch::{apply_patch, apply_patch_with_options, PatchError, PatchOptions};
pub use validate::{validate, ValidateOptions, ValidationFailed};

pub use yangtree_data::{Attribute, DataError, DataTree, NodeId, PathSet, Value};
pub use yangtree_schema::{find_extension, synthesize_path, ExtensionQuery, Schema, SchemaBuilder};
