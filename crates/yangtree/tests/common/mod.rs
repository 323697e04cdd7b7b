use serde_json::json;
use yangtree::{Attribute, DataTree};
use yangtree_schema::{load_modules, ModuleDef, Schema};

pub const TYPES: &str = "/minimal-integrationtest:types";

/// Path of a node below the `types` container.
pub fn types(rest: &str) -> String {
    format!("{TYPES}/{rest}")
}

/// The integration schema: typed leaves, a keyed list, a leaf-list, a
/// user-ordered leaf-list, a constrained server list referenced by a
/// leafref, and an rpc.
pub fn schema() -> Schema {
    let defs: Vec<ModuleDef> = serde_json::from_value(json!([{
        "name": "minimal-integrationtest",
        "prefix": "mi",
        "nodes": [
            {"kind": "container", "name": "types", "children": [
                {"kind": "leaf", "name": "str1", "type": {"base": "string"}},
                {"kind": "leaf", "name": "str2", "type": {"base": "string"}},
                {"kind": "leaf", "name": "str3", "type": {"base": "string"}},
                {"kind": "leaf", "name": "int_8", "type": {"base": "int8"}},
                {"kind": "leaf", "name": "int_16", "type": {"base": "int16"}},
                {"kind": "leaf", "name": "u_int_8", "type": {"base": "uint8"}},
                {"kind": "leaf", "name": "u_int_16", "type": {"base": "uint16"}},
                {"kind": "leaf", "name": "u_int_32", "type": {"base": "uint32"}},
                {"kind": "leaf", "name": "u_int_64", "type": {"base": "uint64"}},
                {"kind": "list", "name": "collection", "keys": ["x"], "children": [
                    {"kind": "leaf", "name": "x", "type": {"base": "string"}},
                    {"kind": "leaf", "name": "y", "type": {"base": "string"}}
                ]},
                {"kind": "leaf-list", "name": "simplecollection", "type": {"base": "string"}},
                {"kind": "leaf-list", "name": "steps", "ordered-by-user": true, "type": {"base": "string"}},
                {"kind": "container", "name": "servers", "children": [
                    {"kind": "list", "name": "server", "keys": ["name"], "max-elements": 3, "children": [
                        {"kind": "leaf", "name": "name", "type": {"base": "string"}},
                        {"kind": "leaf", "name": "address", "mandatory": true, "type": {"base": "string"}}
                    ]}
                ]},
                {"kind": "leaf", "name": "primary", "type": {
                    "base": "leafref",
                    "path": "/minimal-integrationtest:types/servers/server/name"
                }}
            ]},
            {"kind": "rpc", "name": "restart", "children": [
                {"kind": "input", "name": "input", "children": [
                    {"kind": "leaf", "name": "delay", "type": {"base": "uint32"}}
                ]}
            ]}
        ]
    }]))
    .expect("fixture module description");
    load_modules(&defs).expect("fixture schema")
}

/// Attaches `operation=<op>` to the single node matching `path`.
pub fn mark(tree: &mut DataTree<'_>, path: &str, op: &str) {
    let node = tree
        .find_path(path)
        .first()
        .unwrap_or_else(|| panic!("no node at {path}"));
    tree.add_attribute(node, Attribute::new("operation", op))
        .expect("live node");
}

/// Adds a server entry with its mandatory address.
pub fn server(tree: &mut DataTree<'_>, name: &str) {
    tree.set(&types(&format!("servers/server[name='{name}']/address")), "10.0.0.1")
        .expect("server entry");
}
