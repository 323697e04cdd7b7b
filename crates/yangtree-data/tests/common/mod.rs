use serde_json::json;
use yangtree_schema::{load_modules, ModuleDef, Schema};

pub const TYPES: &str = "/minimal-integrationtest:types";

/// Path of a node below the `types` container.
pub fn types(rest: &str) -> String {
    format!("{TYPES}/{rest}")
}

/// One container holding a leaf of most base types, a keyed list, a keyless
/// list, a leaf-list and a choice.
pub fn minimal_schema() -> Schema {
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
                {"kind": "leaf", "name": "int_32", "type": {"base": "int32"}},
                {"kind": "leaf", "name": "int_64", "type": {"base": "int64"}},
                {"kind": "leaf", "name": "u_int_8", "type": {"base": "uint8"}},
                {"kind": "leaf", "name": "u_int_16", "type": {"base": "uint16"}},
                {"kind": "leaf", "name": "u_int_32", "type": {"base": "uint32"}},
                {"kind": "leaf", "name": "u_int_64", "type": {"base": "uint64"}},
                {"kind": "leaf", "name": "dec_64", "type": {"base": "decimal64", "fraction-digits": 3}},
                {"kind": "leaf", "name": "void", "type": {"base": "empty"}},
                {"kind": "leaf", "name": "bool", "type": {"base": "boolean"}},
                {"kind": "leaf", "name": "color", "type": {"base": "enumeration", "enums": ["red", "green"]}},
                {"kind": "list", "name": "collection", "keys": ["x"], "children": [
                    {"kind": "leaf", "name": "x", "type": {"base": "string"}},
                    {"kind": "leaf", "name": "y", "type": {"base": "string"}}
                ]},
                {"kind": "leaf-list", "name": "simplecollection", "type": {"base": "string"}},
                {"kind": "list", "name": "history", "keyless": true, "children": [
                    {"kind": "leaf", "name": "event", "type": {"base": "string"}}
                ]},
                {"kind": "choice", "name": "transport", "children": [
                    {"kind": "case", "name": "tcp", "children": [
                        {"kind": "leaf", "name": "port", "type": {"base": "uint16"}}
                    ]},
                    {"kind": "case", "name": "udp", "children": [
                        {"kind": "leaf", "name": "datagram-size", "type": {"base": "uint16"}}
                    ]}
                ]}
            ]}
        ]
    }]))
    .expect("fixture module description");
    load_modules(&defs).expect("fixture schema")
}
