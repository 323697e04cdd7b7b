//! Data path patterns for schema nodes.

use crate::schema::{NodeKind, Schema, SchemaId};

/// Builds the data path pattern of a schema node.
///
/// The pattern lists the node and its container, list and rpc ancestors
/// from the root down; choice, case, input and output levels are omitted.
/// Each list level carries one `[key='%s']` predicate per key, in declared
/// order. A segment is prefixed with its main module name on the first
/// level and whenever the module changes from the previous segment.
///
/// Returns `None` for an id that does not belong to `schema`.
///
/// # Example
///
/// ```
/// use yangtree_schema::{synthesize_path, LeafType, SchemaBuilder};
///
/// let mut b = SchemaBuilder::new();
/// let m = b.module("example", "ex");
/// let top = b.container(m, "top");
/// let item = b.list(top, "item", &["name"]);
/// b.leaf(item, "name", LeafType::string());
/// let mtu = b.leaf(item, "mtu", LeafType::string());
/// let schema = b.build().unwrap();
///
/// assert_eq!(
///     synthesize_path(&schema, mtu).as_deref(),
///     Some("/example:top/item[name='%s']/mtu")
/// );
/// ```
pub fn synthesize_path(schema: &Schema, id: SchemaId) -> Option<String> {
    let mut chain = vec![id];
    let mut current = schema.node(id)?.parent;
    while let Some(p) = current {
        let node = schema.node(p)?;
        if matches!(node.kind, NodeKind::Container | NodeKind::List | NodeKind::Rpc) {
            chain.push(p);
        }
        current = node.parent;
    }

    let mut out = String::new();
    let mut prev_module = None;
    for &id in chain.iter().rev() {
        let node = schema.node(id)?;
        let module = schema.main_module(node.module);
        out.push('/');
        if prev_module != Some(module) {
            out.push_str(schema.main_module_name(module)?);
            out.push(':');
            prev_module = Some(module);
        }
        out.push_str(&node.name);
        if node.kind == NodeKind::List {
            for &key in &node.keys {
                let key = schema.node(key)?;
                out.push('[');
                out.push_str(&key.name);
                out.push_str("='%s']");
            }
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LeafType, SchemaBuilder};

    #[test]
    fn choice_and_case_levels_are_skipped() {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let top = b.container(m, "top");
        let ch = b.choice(top, "ch");
        let case = b.case(ch, "a");
        let leaf = b.leaf(case, "x", LeafType::string());
        let schema = b.build().unwrap();
        assert_eq!(synthesize_path(&schema, leaf).as_deref(), Some("/m:top/x"));
        assert_eq!(synthesize_path(&schema, case).as_deref(), Some("/m:top/a"));
    }

    #[test]
    fn unknown_id() {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let top = b.container(m, "top");
        let schema = b.build().unwrap();
        let other = SchemaId(top.0 + 10);
        assert_eq!(synthesize_path(&schema, other), None);
    }
}
