use serde_json::json;
use yangtree_schema::{load_modules, ModuleDef, Schema};

/// Two modules and a submodule: `netconf-lite` defines the base tree and an
/// extension, `netconf-lite-types` belongs to it, and `vendor-ext` augments
/// the interface list.
pub fn network_schema() -> Schema {
    let defs: Vec<ModuleDef> = serde_json::from_value(json!([
        {
            "name": "netconf-lite",
            "prefix": "nl",
            "namespace": "urn:example:netconf-lite",
            "revision": "2024-01-01",
            "extensions": [
                {"name": "secret"},
                {"name": "alias", "argument": "name"}
            ],
            "nodes": [
                {"kind": "container", "name": "interfaces", "children": [
                    {"kind": "list", "name": "interface", "keys": ["name"], "children": [
                        {"kind": "leaf", "name": "name", "type": {"base": "string"}},
                        {"kind": "leaf", "name": "mtu", "type": {"base": "uint16"},
                         "extensions": [{"name": "alias", "argument": "max-transfer"}]},
                        {"kind": "container", "name": "ipv4", "children": [
                            {"kind": "list", "name": "address", "keys": ["ip", "prefix-length"], "children": [
                                {"kind": "leaf", "name": "ip", "type": {"base": "string"}},
                                {"kind": "leaf", "name": "prefix-length", "type": {"base": "uint8"}}
                            ]}
                        ]},
                        {"kind": "choice", "name": "mode", "children": [
                            {"kind": "case", "name": "access", "children": [
                                {"kind": "leaf", "name": "vlan", "type": {"base": "uint16"}}
                            ]},
                            {"kind": "leaf-list", "name": "trunk-vlans", "type": {"base": "uint16"}}
                        ]}
                    ]}
                ]},
                {"kind": "rpc", "name": "reset", "children": [
                    {"kind": "input", "name": "input", "children": [
                        {"kind": "leaf", "name": "delay", "type": {"base": "uint32"}}
                    ]},
                    {"kind": "output", "name": "output", "children": [
                        {"kind": "leaf", "name": "status", "type": {"base": "string"}}
                    ]}
                ]}
            ]
        },
        {
            "name": "netconf-lite-types",
            "prefix": "nl",
            "belongs-to": "netconf-lite",
            "nodes": [
                {"kind": "container", "name": "system", "children": [
                    {"kind": "leaf", "name": "hostname", "type": {"base": "string"},
                     "extensions": [{"name": "secret", "module": "netconf-lite"}]}
                ]}
            ]
        },
        {
            "name": "vendor-ext",
            "prefix": "vx",
            "augments": [
                {"target": "/nl:interfaces/interface", "nodes": [
                    {"kind": "container", "name": "vendor", "children": [
                        {"kind": "leaf", "name": "speed", "type": {"base": "uint32"}}
                    ]}
                ]}
            ]
        }
    ]))
    .expect("fixture module descriptions");
    load_modules(&defs).expect("fixture schema")
}
