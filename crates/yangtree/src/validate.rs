//! Schema validation of a data tree.
//!
//! The validator walks the tree once and reports every violation it finds
//! into the [`Context`] error chain:
//!
//! * values outside their type or restrictions,
//! * missing mandatory leaves, including those inside non-presence
//!   containers that do not exist yet,
//! * lists and leaf-lists outside `min-elements`/`max-elements`
//!   (`too-few-elements` / `too-many-elements`),
//! * duplicate list keys and leaf-list values, and list entries without keys,
//! * leafrefs and instance-identifiers with no target (`instance-required`),
//! * rpc data and unknown attributes, depending on [`ValidateOptions`].
//!
//! Leafref and instance-identifier targets that resolve are written back
//! into the tree.

use thiserror::Error;
use yangtree_data::{DataNode, DataTree, NodeId, Payload, Value};
use yangtree_schema::{NodeKind, SchemaId, SchemaNode};

use crate::context::{Context, ErrorCode, ErrorRecord};

/// What the validator treats as an error besides schema violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidateOptions {
    /// Attributes without a module are errors.
    pub strict: bool,
    /// The tree is datastore content: rpc, input and output data are errors.
    pub data_only: bool,
    /// Module-qualified attributes are not checked against the loaded
    /// modules.
    pub no_meta: bool,
}

impl ValidateOptions {
    /// The options used after a patch: strict datastore content, no
    /// metadata checks.
    pub const STRICT_DATA: Self = Self {
        strict: true,
        data_only: true,
        no_meta: true,
    };
}

/// Validation found at least one error; the records are in the context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed with {count} error(s)")]
pub struct ValidationFailed {
    pub count: usize,
}

/// Validates `tree` and appends every violation to `ctx`.
///
/// Earlier errors in the context are kept; only the errors of this call are
/// counted in the result.
pub fn validate(
    tree: &mut DataTree<'_>,
    ctx: &mut Context<'_>,
    options: ValidateOptions,
) -> Result<(), ValidationFailed> {
    let mut checker = Checker {
        tree,
        options,
        records: Vec::new(),
        targets: Vec::new(),
    };
    checker.check_children(None);
    for id in tree.preorder() {
        checker.check_node(id);
    }
    let Checker { records, targets, .. } = checker;

    for (id, target) in targets {
        tree.set_reference_target(id, target);
    }

    let count = records.len();
    log::debug!("validated {} nodes, {count} error(s)", tree.len());
    for record in records {
        ctx.push_error(record);
    }
    if count == 0 {
        Ok(())
    } else {
        Err(ValidationFailed { count })
    }
}

struct Checker<'t, 's> {
    tree: &'t DataTree<'s>,
    options: ValidateOptions,
    records: Vec<ErrorRecord>,
    targets: Vec<(NodeId, Option<NodeId>)>,
}

impl<'t, 's> Checker<'t, 's> {
    fn report(&mut self, code: ErrorCode, message: String, path: Option<String>) {
        self.records.push(ErrorRecord::new(code, message).at(path));
    }

    fn report_tagged(&mut self, code: ErrorCode, message: String, path: Option<String>, tag: &str) {
        self.records
            .push(ErrorRecord::new(code, message).at(path).with_app_tag(tag));
    }

    fn check_node(&mut self, id: NodeId) {
        let tree = self.tree;
        let (Some(node), Some(schema_node)) = (tree.node(id), tree.schema_node(id)) else {
            return;
        };

        if self.options.data_only && schema_node.kind == NodeKind::Rpc {
            self.report(
                ErrorCode::Placement,
                format!("rpc \"{}\" is not datastore content", schema_node.name),
                tree.path(id),
            );
        }
        self.check_attributes(id, node);

        match node.payload() {
            Payload::Term(value) => self.check_value(id, schema_node, value),
            Payload::Inner(_) => {
                if schema_node.kind == NodeKind::List
                    && !schema_node.keyless
                    && tree.list_keys(id).len() < schema_node.keys.len()
                {
                    self.report(
                        ErrorCode::MissingKey,
                        format!("list entry \"{}\" is missing a key", schema_node.name),
                        tree.path(id),
                    );
                }
                self.check_children(Some(id));
            }
        }
    }

    fn check_attributes(&mut self, id: NodeId, node: &DataNode) {
        let schema = self.tree.schema();
        for attribute in node.attributes() {
            match &attribute.module {
                None if self.options.strict => self.report(
                    ErrorCode::Attribute,
                    format!("unknown attribute \"{}\"", attribute.name),
                    self.tree.path(id),
                ),
                Some(module) if !self.options.no_meta && schema.find_module(module).is_none() => {
                    self.report(
                        ErrorCode::Attribute,
                        format!(
                            "attribute \"{module}:{}\" belongs to an unknown module",
                            attribute.name
                        ),
                        self.tree.path(id),
                    )
                }
                _ => {}
            }
        }
    }

    fn check_value(&mut self, id: NodeId, schema_node: &SchemaNode, value: &Value) {
        let Some(ty) = &schema_node.leaf_type else {
            return;
        };
        let tree = self.tree;
        let target = match value {
            Value::Leafref { text, .. } => {
                let Some(path) = &ty.path else {
                    return;
                };
                tree.find_path(path)
                    .iter()
                    .find(|&n| tree.value(n).is_some_and(|v| v.to_string() == *text))
            }
            Value::InstanceId { path, .. } => tree.find_path(path).first(),
            _ => {
                if let Err(err) = value.check(ty) {
                    self.report(ErrorCode::Value, err.to_string(), tree.path(id));
                }
                return;
            }
        };

        self.targets.push((id, target));
        if target.is_none() && ty.require_instance {
            self.report_tagged(
                ErrorCode::Reference,
                format!("required instance \"{value}\" does not exist"),
                tree.path(id),
                "instance-required",
            );
        }
    }

    /// Checks the children `parent` should have: mandatory leaves,
    /// cardinality and uniqueness of lists and leaf-lists.
    fn check_children(&mut self, parent: Option<NodeId>) {
        let tree = self.tree;
        let schema = tree.schema();
        let parent_schema = match parent {
            Some(p) => match tree.schema_id(p) {
                Some(sid) => Some(sid),
                None => return,
            },
            None => None,
        };

        for child in schema.data_children(parent_schema) {
            let Some(child_node) = schema.node(child) else {
                continue;
            };
            // Top-level constraints apply only to modules with data.
            if parent.is_none() && !self.module_has_data(child) {
                continue;
            }
            let instances: Vec<NodeId> = tree
                .siblings(parent)
                .iter()
                .copied()
                .filter(|&c| tree.schema_id(c) == Some(child))
                .collect();
            if instances.is_empty() && !self.case_active(parent, child) {
                continue;
            }

            match child_node.kind {
                NodeKind::Leaf if child_node.mandatory && instances.is_empty() => {
                    let path = self.expected_path(parent, child);
                    self.missing_mandatory(child_node, path);
                }
                NodeKind::Container if !child_node.presence && instances.is_empty() => {
                    let path = self.expected_path(parent, child);
                    self.check_absent(child, &path);
                }
                NodeKind::List | NodeKind::LeafList => {
                    self.check_cardinality(parent, child, child_node, &instances);
                    self.check_unique(&instances);
                }
                _ => {}
            }
        }
    }

    /// Constraints inside a non-presence container that has no instance.
    fn check_absent(&mut self, container: SchemaId, path: &str) {
        let schema = self.tree.schema();
        for child in schema.data_children(Some(container)) {
            let Some(node) = schema.node(child) else {
                continue;
            };
            if !schema.case_chain(child).is_empty() {
                continue;
            }
            let child_path = format!("{path}/{}", node.name);
            match node.kind {
                NodeKind::Leaf if node.mandatory => self.missing_mandatory(node, child_path),
                NodeKind::List | NodeKind::LeafList if node.min_elements > 0 => {
                    self.report_tagged(
                        ErrorCode::Cardinality,
                        format!("too few \"{}\" elements", node.name),
                        Some(child_path),
                        "too-few-elements",
                    );
                }
                NodeKind::Container if !node.presence => self.check_absent(child, &child_path),
                _ => {}
            }
        }
    }

    fn missing_mandatory(&mut self, node: &SchemaNode, path: String) {
        self.report(
            ErrorCode::Mandatory,
            format!("mandatory node \"{}\" is missing", node.name),
            Some(path),
        );
    }

    fn check_cardinality(
        &mut self,
        parent: Option<NodeId>,
        child: SchemaId,
        node: &SchemaNode,
        instances: &[NodeId],
    ) {
        let count = instances.len() as u32;
        if count < node.min_elements {
            let path = self.expected_path(parent, child);
            self.report_tagged(
                ErrorCode::Cardinality,
                format!("too few \"{}\" elements", node.name),
                Some(path),
                "too-few-elements",
            );
        }
        if let Some(max) = node.max_elements {
            if count > max {
                let path = instances.get(max as usize).and_then(|&id| self.tree.path(id));
                self.report_tagged(
                    ErrorCode::Cardinality,
                    format!("too many \"{}\" elements", node.name),
                    path,
                    "too-many-elements",
                );
            }
        }
    }

    fn check_unique(&mut self, instances: &[NodeId]) {
        let tree = self.tree;
        for (i, &id) in instances.iter().enumerate() {
            let duplicate = instances[..i].iter().any(|&earlier| match tree.kind(id) {
                Some(NodeKind::List) => {
                    let keys = tree.list_keys(id);
                    !keys.is_empty() && tree.list_keys(earlier) == keys
                }
                Some(NodeKind::LeafList) => tree.value(earlier) == tree.value(id),
                _ => false,
            });
            if duplicate {
                self.report(
                    ErrorCode::Duplicate,
                    "duplicate instance".to_string(),
                    tree.path(id),
                );
            }
        }
    }

    fn module_has_data(&self, child: SchemaId) -> bool {
        let schema = self.tree.schema();
        let Some(module) = schema.node(child).map(|n| schema.main_module(n.module)) else {
            return false;
        };
        self.tree.roots().iter().any(|&root| {
            self.tree
                .schema_node(root)
                .is_some_and(|n| schema.main_module(n.module) == module)
        })
    }

    /// A node inside a case is constrained only while its case holds data.
    fn case_active(&self, parent: Option<NodeId>, child: SchemaId) -> bool {
        let tree = self.tree;
        let schema = tree.schema();
        let Some(&(choice, branch)) = schema.case_chain(child).first() else {
            return true;
        };
        tree.siblings(parent).iter().any(|&sibling| {
            tree.schema_id(sibling)
                .is_some_and(|s| schema.case_chain(s).contains(&(choice, branch)))
        })
    }

    /// The path a missing child of `parent` would have.
    fn expected_path(&self, parent: Option<NodeId>, child: SchemaId) -> String {
        let tree = self.tree;
        let schema = tree.schema();
        let Some(node) = schema.node(child) else {
            return String::new();
        };
        let module = schema.main_module(node.module);
        let parent_module = parent
            .and_then(|p| tree.schema_node(p))
            .map(|p| schema.main_module(p.module));
        let prefix = parent.and_then(|p| tree.path(p)).unwrap_or_default();
        match schema.main_module_name(module) {
            Some(name) if parent_module != Some(module) => {
                format!("{prefix}/{name}:{}", node.name)
            }
            _ => format!("{prefix}/{}", node.name),
        }
    }
}
