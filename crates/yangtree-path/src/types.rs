//! Type definitions for instance paths.

use std::fmt;

use crate::quote_literal;

/// The node test of a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeTest {
    /// Matches nodes with this exact name: `interface`.
    Name(String),
    /// Matches every child node: `*`.
    Wildcard,
}

/// A predicate attached to a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Child leaf equality: `[name='eth0']`.
    Key { name: String, value: String },
    /// Value of the node itself (leaf-list entries): `[.='10']`.
    Value(String),
    /// 1-based position among the matched instances: `[2]`.
    Position(usize),
}

/// One `/`-separated step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Module name qualifying the node. `None` inherits the previous segment's module.
    pub module: Option<String>,
    pub node: NodeTest,
    pub predicates: Vec<Predicate>,
}

impl Segment {
    /// A plain named segment without predicates.
    pub fn named(module: Option<&str>, name: &str) -> Self {
        Self {
            module: module.map(str::to_string),
            node: NodeTest::Name(name.to_string()),
            predicates: Vec::new(),
        }
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// The node name, or `None` for a wildcard.
    pub fn name(&self) -> Option<&str> {
        match &self.node {
            NodeTest::Name(name) => Some(name),
            NodeTest::Wildcard => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.node == NodeTest::Wildcard
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{module}:")?;
        }
        match &self.node {
            NodeTest::Name(name) => f.write_str(name)?,
            NodeTest::Wildcard => f.write_str("*")?,
        }
        for predicate in &self.predicates {
            match predicate {
                Predicate::Key { name, value } => write!(f, "[{name}={}]", quote_literal(value))?,
                Predicate::Value(value) => write!(f, "[.={}]", quote_literal(value))?,
                Predicate::Position(pos) => write!(f, "[{pos}]")?,
            }
        }
        Ok(())
    }
}

/// An absolute instance path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    pub segments: Vec<Segment>,
}

impl Path {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut Segment> {
        self.segments.last_mut()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// The path without its last segment, or `None` for single-segment paths.
    pub fn parent(&self) -> Option<Path> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Path::new(self.segments[..self.segments.len() - 1].to_vec()))
    }

    /// True if any segment is a wildcard or carries a position predicate.
    pub fn is_pattern(&self) -> bool {
        self.segments.iter().any(|s| {
            s.is_wildcard()
                || s
                    .predicates
                    .iter()
                    .any(|p| matches!(p, Predicate::Position(_)))
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
