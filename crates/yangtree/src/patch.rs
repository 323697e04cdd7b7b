//! The patch engine: applies an annotated template tree onto a target tree.
//!
//! Template nodes may carry an `operation` attribute:
//!
//! * `remove` deletes the node's instance from the target; the template node
//!   itself is dropped.
//! * `replace` deletes the target's instance before the template content is
//!   merged in. On a list or leaf-list entry it deletes the whole collection
//!   of that name under the same parent, not only the matching entry, so the
//!   template's entries fully supersede the live ones.
//!
//! Any other value is ignored with a warning. Targets are collected into a
//! removal set during a walk over a snapshot of the template, and nothing is
//! freed until the walk is over. The template, stripped of its `operation`
//! attributes, is then merged into the target and the result validated.

use indexmap::IndexSet;
use thiserror::Error;
use yangtree_data::{DataError, DataTree, NodeId};
use yangtree_schema::NodeKind;

use crate::context::Context;
use crate::merge::merge_explicit;
use crate::validate::{validate, ValidateOptions, ValidationFailed};

/// Name of the attribute that carries patch directives.
pub const OPERATION: &str = "operation";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("target, template and context belong to different schemas")]
    SchemaMismatch,
    #[error("merge failed: {0}")]
    Merge(#[from] DataError),
    #[error(transparent)]
    Invalid(#[from] ValidationFailed),
}

impl PatchError {
    /// Integer status of a failed patch; a successful patch is status 0.
    pub fn status(&self) -> i32 {
        match self {
            PatchError::Invalid(_) => 1,
            PatchError::Merge(_) => 2,
            PatchError::SchemaMismatch => 3,
        }
    }
}

/// Options for [`apply_patch_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    /// Options for validating the merged target.
    pub validate: ValidateOptions,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            validate: ValidateOptions::STRICT_DATA,
        }
    }
}

/// Applies `template` onto `target` and validates the result.
///
/// The template is consumed. Validation errors are appended to `ctx`. A
/// failed validation does not roll the target back: callers that need the
/// previous state must clone the target first.
pub fn apply_patch<'s>(
    target: &mut DataTree<'s>,
    ctx: &mut Context<'s>,
    template: DataTree<'s>,
) -> Result<(), PatchError> {
    apply_patch_with_options(target, ctx, template, &PatchOptions::default())
}

pub fn apply_patch_with_options<'s>(
    target: &mut DataTree<'s>,
    ctx: &mut Context<'s>,
    mut template: DataTree<'s>,
    options: &PatchOptions,
) -> Result<(), PatchError> {
    if !target.same_schema(&template) || !ctx.owns(target) {
        return Err(PatchError::SchemaMismatch);
    }

    let plan = plan(target, &template);
    log::debug!(
        "patch: {} target node(s) to remove, {} template node(s) dropped, {} stripped",
        plan.remove.len(),
        plan.drop.len(),
        plan.strip.len(),
    );

    for &id in &plan.strip {
        while template.remove_attribute(id, OPERATION).is_some() {}
    }
    for &id in &plan.drop {
        template.free(id);
    }
    for &id in &plan.remove {
        // ids under an already freed ancestor are stale and skipped
        if !target.free(id) {
            log::trace!("patch: {id:?} already removed");
        }
    }

    merge_explicit(target, template)?;
    validate(target, ctx, options.validate)?;
    Ok(())
}

/// What a template asks for, computed before anything is mutated.
#[derive(Debug, Default)]
struct Plan {
    /// Target nodes to free.
    remove: IndexSet<NodeId>,
    /// Template nodes to free.
    drop: Vec<NodeId>,
    /// Template nodes whose `operation` attribute is stripped.
    strip: Vec<NodeId>,
}

fn plan(target: &DataTree<'_>, template: &DataTree<'_>) -> Plan {
    let mut plan = Plan::default();

    for id in template.preorder() {
        let Some(node) = template.node(id) else {
            continue;
        };
        let Some(operation) = node
            .attributes()
            .iter()
            .find(|a| a.name == OPERATION)
            .map(|a| a.value.as_str())
        else {
            continue;
        };

        match operation {
            "remove" => {
                if let Some(path) = instance_path(template, id) {
                    plan.remove.extend(target.find_path(&path));
                }
                plan.drop.push(id);
            }
            "replace" => {
                let path = match template.kind(id) {
                    Some(NodeKind::List | NodeKind::LeafList) => collection_path(template, id),
                    _ => instance_path(template, id),
                };
                if let Some(path) = path {
                    plan.remove.extend(target.find_path(&path));
                }
                plan.strip.push(id);
            }
            other => {
                log::warn!(
                    "patch: ignoring unknown operation {other:?} on {:?}",
                    template.path(id)
                );
                plan.strip.push(id);
            }
        }
    }
    plan
}

/// The path that selects `id`'s instance in another tree of the same schema.
///
/// Built from the schema node's path pattern with the key values of every
/// list entry on the way filled in, and the value predicate of a leaf-list
/// entry appended. Entries of keyless lists are only addressable by
/// position, so their own instance path is used instead.
pub fn instance_path(tree: &DataTree<'_>, id: NodeId) -> Option<String> {
    let schema = tree.schema();
    let schema_node = tree.schema_node(id)?;

    let mut chain = Vec::new();
    let mut current = Some(id);
    while let Some(c) = current {
        chain.push(c);
        current = tree.parent(c);
    }
    let mut keys = Vec::new();
    for &node in chain.iter().rev() {
        let list = tree.schema_node(node)?;
        if list.kind != NodeKind::List {
            continue;
        }
        if list.keyless {
            return tree.path(id);
        }
        keys.extend(tree.list_keys(node).iter().map(ToString::to_string));
    }

    let pattern = yangtree_schema::synthesize_path(schema, tree.schema_id(id)?)?;
    let mut path = match yangtree_path::fill_pattern(&pattern, keys.as_slice()) {
        Ok(path) => path,
        Err(err) => {
            log::warn!("patch: cannot address {:?}: {err}", tree.path(id));
            return None;
        }
    };
    if schema_node.kind == NodeKind::LeafList {
        let value = tree.value(id)?.to_string();
        path.push_str(&format!("[.={}]", yangtree_path::quote_literal(&value)));
    }
    Some(path)
}

/// The path of every entry of `id`'s list or leaf-list under its parent.
///
/// Only the parent's instance path is needed; the entry's own keys or value
/// never appear in it.
fn collection_path(tree: &DataTree<'_>, id: NodeId) -> Option<String> {
    let schema = tree.schema();
    let node = tree.schema_node(id)?;
    let module = schema.main_module(node.module);
    let (mut path, parent_module) = match tree.parent(id) {
        Some(parent) => (
            instance_path(tree, parent)?,
            tree.schema_node(parent).map(|p| schema.main_module(p.module)),
        ),
        None => (String::new(), None),
    };
    path.push('/');
    if parent_module != Some(module) {
        path.push_str(schema.main_module_name(module)?);
        path.push(':');
    }
    path.push_str(&node.name);
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yangtree_data::Attribute;
    use yangtree_schema::{LeafType, Schema, SchemaBuilder};

    fn schema() -> Schema {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let top = b.container(m, "top");
        let item = b.list(top, "item", &["id"]);
        b.leaf(item, "id", LeafType::string());
        b.leaf_list(item, "tags", LeafType::string());
        let log = b.keyless_list(top, "log");
        b.leaf(log, "line", LeafType::string());
        b.build().unwrap()
    }

    #[test]
    fn instance_paths_fill_keys_and_values() {
        let schema = schema();
        let mut tree = DataTree::new(&schema);
        tree.set("/m:top/item[id=\"it's\"]/tags", "t1").unwrap();
        tree.set("/m:top/log/line", "boot").unwrap();

        let tag = tree.find_path("/m:top/item/tags").first().unwrap();
        assert_eq!(
            instance_path(&tree, tag).as_deref(),
            Some("/m:top/item[id=\"it's\"]/tags[.='t1']")
        );
        assert_eq!(
            collection_path(&tree, tag).as_deref(),
            Some("/m:top/item[id=\"it's\"]/tags")
        );
        let line = tree.find_path("/m:top/log/line").first().unwrap();
        assert_eq!(instance_path(&tree, line).as_deref(), Some("/m:top/log[1]/line"));
    }

    #[test]
    fn values_with_both_quotes_stay_addressable() {
        let schema = schema();
        let mut tree = DataTree::new(&schema);
        tree.set("/m:top/item[id=concat('q', \"'\", '\"q')]/tags", "a'\"b")
            .unwrap();

        let tag = tree.find_path("/m:top/item/tags").first().unwrap();
        let path = instance_path(&tree, tag).unwrap();
        assert_eq!(
            path,
            "/m:top/item[id=concat('q', \"'\", '\"q')]/tags[.=concat('a', \"'\", '\"b')]"
        );
        assert_eq!(tree.find_path(&path).first(), Some(tag));
        assert_eq!(
            collection_path(&tree, tag).as_deref(),
            Some("/m:top/item[id=concat('q', \"'\", '\"q')]/tags")
        );

        let item = tree.parent(tag).unwrap();
        assert_eq!(collection_path(&tree, item).as_deref(), Some("/m:top/item"));
    }

    #[test]
    fn plan_collects_without_mutating() {
        let schema = schema();
        let mut target = DataTree::new(&schema);
        target.set("/m:top/item[id='a']/tags", "x").unwrap();
        target.set("/m:top/item[id='a']/tags", "y").unwrap();

        let mut template = DataTree::new(&schema);
        template.set("/m:top/item[id='a']/tags", "z").unwrap();
        let tag = template.find_path("/m:top/item/tags").first().unwrap();
        template
            .add_attribute(tag, Attribute::new(OPERATION, "replace"))
            .unwrap();

        let plan = plan(&target, &template);
        assert_eq!(plan.remove.len(), 2);
        assert_eq!(plan.strip, vec![tag]);
        assert!(plan.drop.is_empty());
        assert_eq!(target.count("/m:top/item/tags"), 2);
    }

    #[test]
    fn status_codes_are_nonzero() {
        assert_eq!(PatchError::Invalid(ValidationFailed { count: 1 }).status(), 1);
        assert_ne!(PatchError::SchemaMismatch.status(), 0);
    }
}
