//! The validation context: a schema reference plus the error chain.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use yangtree_data::DataTree;
use yangtree_schema::{Module, Schema, SchemaId};

/// Category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// A value violates its type or restrictions.
    Value,
    /// A mandatory leaf is missing.
    Mandatory,
    /// A list or leaf-list has too few or too many entries.
    Cardinality,
    /// A leafref or instance-identifier points at nothing.
    Reference,
    /// Two list entries share keys, or a leaf-list repeats a value.
    Duplicate,
    /// A list entry lacks one of its keys.
    MissingKey,
    /// Data that the validation options do not allow at all.
    Placement,
    /// An attribute the validator does not recognise.
    Attribute,
}

/// One constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorRecord {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_tag: Option<String>,
}

impl ErrorRecord {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            app_tag: None,
        }
    }

    pub fn at(mut self, path: Option<String>) -> Self {
        self.path = path;
        self
    }

    pub fn with_app_tag(mut self, tag: &str) -> Self {
        self.app_tag = Some(tag.to_string());
        self
    }
}

/// `path: message: app-tag`, leaving out the parts that are absent.
impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{path}: ")?;
        }
        f.write_str(&self.message)?;
        if let Some(tag) = &self.app_tag {
            write!(f, ": {tag}")?;
        }
        Ok(())
    }
}

/// A message followed by the error chain it was raised with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ContextError(pub String);

/// Shared state for validation and patching: the schema every tree is
/// built against and the errors accumulated by the last operations.
///
/// Errors are appended, never replaced. Callers drain them with
/// [`Context::take_errors`] or [`Context::clear_errors`] after inspecting a
/// failure, otherwise later failures report them again.
#[derive(Debug, Clone)]
pub struct Context<'s> {
    schema: &'s Schema,
    errors: Vec<ErrorRecord>,
}

impl<'s> Context<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            errors: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// An empty data tree of this context's schema.
    pub fn new_tree(&self) -> DataTree<'s> {
        DataTree::new(self.schema)
    }

    /// True if `tree` was built against this context's schema.
    pub fn owns(&self, tree: &DataTree<'_>) -> bool {
        std::ptr::eq(self.schema, tree.schema())
    }

    pub fn get_module(&self, name: &str) -> Option<&'s Module> {
        let schema = self.schema;
        schema.module(schema.find_module(name)?)
    }

    /// Resolves a schema path such as `/module:top/list/leaf`.
    ///
    /// Predicates are ignored; choice and case levels are skipped.
    pub fn find_path(&self, path: &str) -> Option<SchemaId> {
        let parsed = yangtree_path::parse_path(path).ok()?;
        let mut current = None;
        let mut module = None;
        for segment in &parsed.segments {
            if let Some(name) = &segment.module {
                module = Some(self.schema.find_module(name)?);
            }
            current = Some(self.schema.find_data_child(current, module, segment.name()?)?);
        }
        current
    }

    // ── Error chain ───────────────────────────────────────────────────────

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn push_error(&mut self, record: ErrorRecord) {
        log::debug!("validation error: {record}");
        self.errors.push(record);
    }

    pub fn take_errors(&mut self) -> Vec<ErrorRecord> {
        std::mem::take(&mut self.errors)
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Builds an error from `msg` and the pending error chain, then clears
    /// the chain.
    ///
    /// # Example
    ///
    /// ```
    /// use yangtree::{Context, ErrorCode, ErrorRecord};
    /// use yangtree_schema::SchemaBuilder;
    ///
    /// let schema = SchemaBuilder::new().build().unwrap();
    /// let mut ctx = Context::new(&schema);
    /// ctx.push_error(
    ///     ErrorRecord::new(ErrorCode::Cardinality, "too few entries")
    ///         .at(Some("/m:top/item".into()))
    ///         .with_app_tag("too-few-elements"),
    /// );
    /// let err = ctx.error("patch failed");
    /// assert_eq!(
    ///     err.to_string(),
    ///     "patch failed: /m:top/item: too few entries: too-few-elements"
    /// );
    /// assert!(!ctx.has_errors());
    /// ```
    pub fn error(&mut self, msg: &str) -> ContextError {
        let chain: Vec<String> = self.take_errors().iter().map(ToString::to_string).collect();
        if chain.is_empty() {
            ContextError(msg.to_string())
        } else {
            ContextError(format!("{msg}: {}", chain.join(" ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yangtree_schema::{LeafType, SchemaBuilder};

    #[test]
    fn error_without_chain_is_just_the_message() {
        let schema = SchemaBuilder::new().build().unwrap();
        let mut ctx = Context::new(&schema);
        assert_eq!(ctx.error("nothing").to_string(), "nothing");
    }

    #[test]
    fn records_serialize_without_absent_parts() {
        let record = ErrorRecord::new(ErrorCode::MissingKey, "key missing");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"code": "missing-key", "message": "key missing"})
        );
    }

    #[test]
    fn schema_paths_skip_choices() {
        let mut b = SchemaBuilder::new();
        let m = b.module("m", "m");
        let top = b.container(m, "top");
        let choice = b.choice(top, "kind");
        let case = b.case(choice, "a");
        let leaf = b.leaf(case, "value", LeafType::string());
        let schema = b.build().unwrap();

        let ctx = Context::new(&schema);
        assert_eq!(ctx.find_path("/m:top/value"), Some(leaf));
        assert_eq!(ctx.find_path("/m:top/kind"), None);
        assert_eq!(ctx.find_path("/x:top"), None);
        assert!(ctx.get_module("m").is_some());
        assert!(ctx.owns(&ctx.new_tree()));
    }
}
