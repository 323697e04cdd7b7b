//! Extension instance lookup.

use crate::schema::{ExtensionInstance, Schema};

/// Filter for [`find_extension`]. Omitted fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionQuery<'a> {
    pub name: Option<&'a str>,
    /// Main module name of the module defining the extension.
    pub module: Option<&'a str>,
    /// Compared only against instances that carry an argument.
    pub arg: Option<&'a str>,
}

impl<'a> ExtensionQuery<'a> {
    pub fn named(name: &'a str) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    pub fn in_module(mut self, module: &'a str) -> Self {
        self.module = Some(module);
        self
    }

    pub fn with_arg(mut self, arg: &'a str) -> Self {
        self.arg = Some(arg);
        self
    }
}

/// Returns the first extension instance matching `query`, scanning in order.
///
/// An instance without an argument passes the argument filter. If an
/// instance's definition or its module cannot be resolved, the search stops
/// with `None`.
///
/// # Example
///
/// ```
/// use yangtree_schema::{find_extension, ExtensionQuery, SchemaBuilder};
///
/// let mut b = SchemaBuilder::new();
/// let m = b.module("acme-ext", "ax");
/// let secret = b.extension(m, "secret", None);
/// let alias = b.extension(m, "alias", Some("name"));
/// let top = b.container(m, "top");
/// b.use_extension(top, secret, None).use_extension(top, alias, Some("t"));
/// let schema = b.build().unwrap();
///
/// let exts = &schema.node(top).unwrap().extensions;
/// let found = find_extension(&schema, exts, ExtensionQuery::named("alias").in_module("acme-ext"));
/// assert_eq!(found.and_then(|e| e.arg_value.as_deref()), Some("t"));
/// assert!(find_extension(&schema, exts, ExtensionQuery::named("other")).is_none());
/// ```
pub fn find_extension<'i>(
    schema: &Schema,
    instances: &'i [ExtensionInstance],
    query: ExtensionQuery<'_>,
) -> Option<&'i ExtensionInstance> {
    for inst in instances {
        let def = schema.extension(inst.def)?;
        if query.name.is_some_and(|name| def.name != name) {
            continue;
        }
        if let Some(module) = query.module {
            let main = schema.main_module_name(def.module)?;
            if main != module {
                continue;
            }
        }
        if let (Some(arg), Some(value)) = (query.arg, inst.arg_value.as_deref()) {
            if arg != value {
                continue;
            }
        }
        return Some(inst);
    }
    None
}
