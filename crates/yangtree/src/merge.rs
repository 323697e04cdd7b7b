//! Explicit merge of one data tree into another.

use yangtree_data::{DataError, DataTree, NodeId};
use yangtree_schema::NodeKind;

/// Merges `source` into `target`, consuming `source`.
///
/// Leaves present in `source` overwrite the same leaves in `target`;
/// containers and list entries are matched by schema node and keys and
/// merged recursively; leaf-list entries are matched by value. Content of
/// `target` without a counterpart in `source` is left alone. Attributes of
/// `source` nodes are copied onto their counterparts.
///
/// # Example
///
/// ```
/// use yangtree::merge_explicit;
/// use yangtree_data::DataTree;
/// use yangtree_schema::{LeafType, SchemaBuilder};
///
/// let mut b = SchemaBuilder::new();
/// let m = b.module("m", "m");
/// let top = b.container(m, "top");
/// b.leaf(top, "a", LeafType::string());
/// b.leaf(top, "b", LeafType::string());
/// let schema = b.build().unwrap();
///
/// let mut target = DataTree::new(&schema);
/// target.set("/m:top/a", "y").unwrap();
/// target.set("/m:top/b", "z").unwrap();
/// let mut source = DataTree::new(&schema);
/// source.set("/m:top/a", "x").unwrap();
///
/// merge_explicit(&mut target, source).unwrap();
/// assert_eq!(target.values("/m:top/*"), vec!["x", "z"]);
/// ```
pub fn merge_explicit<'s>(target: &mut DataTree<'s>, source: DataTree<'_>) -> Result<(), DataError> {
    if !target.same_schema(&source) {
        return Err(DataError::SchemaMismatch);
    }
    for &root in source.roots() {
        merge_node(target, None, &source, root)?;
    }
    Ok(())
}

fn merge_node(
    target: &mut DataTree<'_>,
    parent: Option<NodeId>,
    source: &DataTree<'_>,
    id: NodeId,
) -> Result<(), DataError> {
    let node = source.node(id).ok_or(DataError::StaleNode(id))?;

    let Some(existing) = target.find_instance(parent, source, id) else {
        target.clear_other_cases(parent, node.schema());
        let copied = target.import_subtree(source, id, parent)?;
        log::trace!("merge created {:?}", target.path(copied));
        return Ok(());
    };

    for attribute in node.attributes() {
        target.add_attribute(existing, attribute.clone())?;
    }

    match source.kind(id) {
        Some(NodeKind::Leaf) => {
            if let Some(value) = node.value() {
                if target.set_value(existing, value.clone())? {
                    // targets point into the source tree
                    if value.is_reference() {
                        target.set_reference_target(existing, None);
                    }
                    log::trace!("merge updated {:?}", target.path(existing));
                }
            }
        }
        Some(NodeKind::LeafList) => {}
        _ => {
            for &child in node.children() {
                merge_node(target, Some(existing), source, child)?;
            }
        }
    }
    Ok(())
}
