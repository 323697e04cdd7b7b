//! Remove, replace and merge semantics of `apply_patch`.

mod common;

use common::{mark, schema, server, types};
use proptest::prelude::*;
use yangtree::{
    apply_patch, apply_patch_with_options, Context, DataTree, ErrorCode, PatchError, PatchOptions,
    ValidateOptions, Value,
};
use yangtree_path::quote_literal;

fn no_operation_left(tree: &DataTree<'_>) -> bool {
    tree.preorder()
        .into_iter()
        .all(|id| tree.attribute(id, "operation").is_none())
}

#[test]
fn remove_deletes_the_leaf_and_nothing_else() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    target.set(&types("str1"), "a").unwrap();
    target.set(&types("str2"), "z").unwrap();

    let mut template = ctx.new_tree();
    template.set(&types("str1"), "a").unwrap();
    mark(&mut template, &types("str1"), "remove");

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert!(target.find_path(&types("str1")).is_empty());
    assert_eq!(target.values(&types("str2")), vec!["z"]);
    assert!(!ctx.has_errors());
}

#[test]
fn remove_without_a_match_is_not_an_error() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    target.set(&types("str1"), "a").unwrap();

    let mut template = ctx.new_tree();
    template.set(&types("str3"), "gone").unwrap();
    mark(&mut template, &types("str3"), "remove");

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.count(&types("*")), 1);
}

#[test]
fn replace_on_a_list_entry_supersedes_the_whole_collection() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    for key in ["a", "b", "c"] {
        target.set(&types(&format!("collection[x='{key}']/y")), "old").unwrap();
    }
    target.set(&types("str1"), "kept").unwrap();

    let mut template = ctx.new_tree();
    for key in ["d", "e"] {
        template.set(&types(&format!("collection[x='{key}']/y")), "new").unwrap();
    }
    mark(&mut template, &types("collection[x='d']"), "replace");

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("collection/x")), vec!["d", "e"]);
    assert_eq!(target.values(&types("collection/y")), vec!["new", "new"]);
    assert_eq!(target.values(&types("str1")), vec!["kept"]);
    assert!(no_operation_left(&target));
}

#[test]
fn replace_on_a_leaf_list_entry_supersedes_all_values() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    for v in ["a", "b"] {
        target.set(&types("simplecollection"), v).unwrap();
    }

    let mut template = ctx.new_tree();
    template.set(&types("simplecollection"), "c").unwrap();
    mark(&mut template, &types("simplecollection[.='c']"), "replace");

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("simplecollection")), vec!["c"]);
}

#[test]
fn remove_on_a_leaf_list_entry_removes_only_that_value() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    for v in ["a", "b", "c"] {
        target.set(&types("simplecollection"), v).unwrap();
    }

    let mut template = ctx.new_tree();
    template.set(&types("simplecollection"), "b").unwrap();
    mark(&mut template, &types("simplecollection[.='b']"), "remove");

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("simplecollection")), vec!["a", "c"]);
}

#[test]
fn replace_on_a_container_drops_its_old_content() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    server(&mut target, "a");
    server(&mut target, "b");

    let mut template = ctx.new_tree();
    server(&mut template, "c");
    mark(&mut template, &types("servers"), "replace");

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("servers/server/name")), vec!["c"]);
}

fn entry(key: &str) -> String {
    types(&format!("collection[x={}]", quote_literal(key)))
}

const AWKWARD_KEYS: [&str; 3] = ["it's", "say \"hi\"", "q'\"q"];

#[test]
fn replace_supersedes_collections_whatever_the_key_quoting() {
    for key in AWKWARD_KEYS {
        let schema = schema();
        let mut ctx = Context::new(&schema);
        let mut target = ctx.new_tree();
        for old in ["a", "b"] {
            target.set(&format!("{}/y", entry(old)), "old").unwrap();
        }

        let mut template = ctx.new_tree();
        template.set(&format!("{}/y", entry(key)), "new").unwrap();
        mark(&mut template, &entry(key), "replace");

        apply_patch(&mut target, &mut ctx, template).unwrap();
        assert_eq!(target.values(&types("collection/x")), vec![key], "key {key:?}");
        assert_eq!(target.values(&types("collection/y")), vec!["new"]);
    }
}

#[test]
fn remove_finds_entries_whatever_the_key_quoting() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    for key in AWKWARD_KEYS.iter().chain(&["plain"]) {
        target.set(&format!("{}/y", entry(key)), "old").unwrap();
    }

    let mut template = ctx.new_tree();
    for key in AWKWARD_KEYS {
        template.set(&format!("{}/y", entry(key)), "old").unwrap();
        mark(&mut template, &entry(key), "remove");
    }

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("collection/x")), vec!["plain"]);
}

#[test]
fn leaf_list_values_with_both_quotes() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    for v in ["it's", "q'\"q", "z"] {
        target.set(&types("simplecollection"), v).unwrap();
    }

    let mut template = ctx.new_tree();
    template.set(&types("simplecollection"), "q'\"q").unwrap();
    let value = format!("simplecollection[.={}]", quote_literal("q'\"q"));
    mark(&mut template, &types(&value), "remove");
    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("simplecollection")), vec!["it's", "z"]);

    let mut template = ctx.new_tree();
    template.set(&types("simplecollection"), "a\"'b").unwrap();
    let value = format!("simplecollection[.={}]", quote_literal("a\"'b"));
    mark(&mut template, &types(&value), "replace");
    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("simplecollection")), vec!["a\"'b"]);
}

#[test]
fn template_without_operations_is_a_deep_overlay() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    target.set(&types("str1"), "y").unwrap();
    target.set(&types("str2"), "z").unwrap();
    server(&mut target, "a");
    let before = target.len();

    let mut template = ctx.new_tree();
    template.set(&types("str1"), "x").unwrap();
    server(&mut template, "b");

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("str1")), vec!["x"]);
    assert_eq!(target.values(&types("str2")), vec!["z"]);
    assert_eq!(target.values(&types("servers/server/name")), vec!["a", "b"]);
    assert_eq!(target.len(), before + 3);
}

#[test]
fn nested_removals_are_freed_once() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    server(&mut target, "a");
    server(&mut target, "b");

    let mut template = ctx.new_tree();
    server(&mut template, "a");
    mark(&mut template, &types("servers/server[name='a']"), "remove");
    mark(&mut template, &types("servers/server[name='a']/address"), "remove");

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("servers/server/name")), vec!["b"]);
    assert_eq!(target.values(&types("servers/server/address")), vec!["10.0.0.1"]);
}

#[test]
fn unknown_operations_are_stripped_and_merged() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    target.set(&types("str1"), "old").unwrap();

    let mut template = ctx.new_tree();
    template.set(&types("str1"), "new").unwrap();
    mark(&mut template, &types("str1"), "merge");

    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("str1")), vec!["new"]);
    assert!(no_operation_left(&target));
}

#[test]
fn failed_validation_keeps_the_mutation() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    server(&mut target, "a");

    let mut template = ctx.new_tree();
    template
        .set(&types("servers/server[name='x']/name"), "x")
        .unwrap();

    let err = apply_patch(&mut target, &mut ctx, template).unwrap_err();
    assert_eq!(err.status(), 1);
    assert!(matches!(err, PatchError::Invalid(_)));
    assert_eq!(target.values(&types("servers/server/name")), vec!["a", "x"]);

    let errors = ctx.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ErrorCode::Mandatory);
    assert_eq!(
        errors[0].path.as_deref(),
        Some("/minimal-integrationtest:types/servers/server[name='x']/address")
    );

    let rendered = ctx.error("patch failed").to_string();
    assert!(rendered.starts_with("patch failed: /minimal-integrationtest:types/servers"));
    assert!(!ctx.has_errors());
}

#[test]
fn cardinality_is_checked_after_merge() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    for name in ["a", "b", "c"] {
        server(&mut target, name);
    }

    let mut template = ctx.new_tree();
    server(&mut template, "d");

    let err = apply_patch(&mut target, &mut ctx, template).unwrap_err();
    assert_eq!(err.status(), 1);
    let errors = ctx.take_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].app_tag.as_deref(), Some("too-many-elements"));

    // Replacing the collection instead keeps it within bounds.
    let mut template = ctx.new_tree();
    server(&mut template, "d");
    mark(&mut template, &types("servers/server[name='d']"), "replace");
    apply_patch(&mut target, &mut ctx, template).unwrap();
    assert_eq!(target.values(&types("servers/server/name")), vec!["d"]);
}

#[test]
fn leafrefs_resolve_after_patch() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    server(&mut target, "a");

    let mut template = ctx.new_tree();
    template.set(&types("primary"), "a").unwrap();
    apply_patch(&mut target, &mut ctx, template).unwrap();

    let name = target.find_path(&types("servers/server[name='a']/name")).first();
    assert_eq!(
        target.value_at(&types("primary")).and_then(Value::target),
        name
    );

    let mut template = ctx.new_tree();
    template.set(&types("primary"), "missing").unwrap();
    apply_patch(&mut target, &mut ctx, template).unwrap_err();
    assert_eq!(ctx.errors()[0].code, ErrorCode::Reference);
    assert_eq!(ctx.errors()[0].app_tag.as_deref(), Some("instance-required"));
}

#[test]
fn rpc_data_is_not_datastore_content() {
    let schema = schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    target.set(&types("str1"), "a").unwrap();

    let mut template = ctx.new_tree();
    template
        .set("/minimal-integrationtest:restart/delay", "5")
        .unwrap();
    let err = apply_patch(&mut target, &mut ctx, template).unwrap_err();
    assert_eq!(err.status(), 1);
    assert_eq!(ctx.take_errors()[0].code, ErrorCode::Placement);

    // Without data-only validation the same content passes.
    let mut template = ctx.new_tree();
    template
        .set("/minimal-integrationtest:restart/delay", "5")
        .unwrap();
    let options = PatchOptions {
        validate: ValidateOptions {
            data_only: false,
            ..ValidateOptions::STRICT_DATA
        },
    };
    target.delete("/minimal-integrationtest:restart").unwrap();
    apply_patch_with_options(&mut target, &mut ctx, template, &options).unwrap();
}

#[test]
fn trees_of_another_schema_are_rejected_untouched() {
    let schema = schema();
    let other = common::schema();
    let mut ctx = Context::new(&schema);
    let mut target = ctx.new_tree();
    target.set(&types("str1"), "a").unwrap();

    let mut template = DataTree::new(&other);
    template.set(&types("str1"), "b").unwrap();
    mark(&mut template, &types("str1"), "remove");

    let err = apply_patch(&mut target, &mut ctx, template).unwrap_err();
    assert_eq!(err, PatchError::SchemaMismatch);
    assert_ne!(err.status(), 0);
    assert_eq!(target.values(&types("str1")), vec!["a"]);
}

proptest! {
    #[test]
    fn replace_leaves_exactly_the_template_entries(
        old in prop::collection::btree_set("[a-z'\"]{1,4}", 0..6),
        new in prop::collection::btree_set("[a-z'\"]{1,4}", 1..6),
    ) {
        let schema = schema();
        let mut ctx = Context::new(&schema);
        let mut target = ctx.new_tree();
        for key in &old {
            target.set(&format!("{}/y", entry(key)), "old").unwrap();
        }

        let mut template = ctx.new_tree();
        for key in &new {
            template.set(&format!("{}/y", entry(key)), "new").unwrap();
        }
        let first = new.iter().next().unwrap();
        mark(&mut template, &entry(first), "replace");

        apply_patch(&mut target, &mut ctx, template).unwrap();
        let keys: Vec<String> = new.iter().cloned().collect();
        prop_assert_eq!(target.values(&types("collection/x")), keys);
        prop_assert_eq!(target.count(&types("collection[y='old']")), 0);
    }
}
