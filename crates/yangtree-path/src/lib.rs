//! Absolute instance paths over a config tree.
//!
//! Paths are the restricted subset used to address data nodes:
//! `/[module:]name[predicate]*` repeated, where a predicate is a key
//! equality (`[name='eth0']`), a leaf-list value (`[.='10']`), or a 1-based
//! position (`[2]`). Literals are single- or double-quoted, or built with
//! `concat('a', "'", 'b')` when they hold both quote characters. A segment
//! without a module prefix inherits the module of the previous segment. `*`
//! matches every child.
//!
//! # Example
//!
//! ```
//! use yangtree_path::{parse_path, fill_pattern, Predicate};
//!
//! let path = parse_path("/ietf-interfaces:interfaces/interface[name='eth0']/mtu").unwrap();
//! assert_eq!(path.len(), 3);
//! assert_eq!(path.segments[0].module.as_deref(), Some("ietf-interfaces"));
//! assert_eq!(
//!     path.segments[1].predicates,
//!     vec![Predicate::Key { name: "name".into(), value: "eth0".into() }]
//! );
//!
//! let filled = fill_pattern("/m:top/item[id='%s']", &["it's"]).unwrap();
//! assert_eq!(filled, "/m:top/item[id=\"it's\"]");
//! ```

use thiserror::Error;

mod parser;
pub mod pattern;
pub mod types;

pub use pattern::{count_placeholders, fill_pattern};
pub use types::{NodeTest, Path, Predicate, Segment};

/// Errors produced while parsing paths or filling path patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("path must start with '/'")]
    NotAbsolute,
    #[error("unexpected character {ch:?} at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unexpected end of path")]
    UnexpectedEnd,
    #[error("unclosed literal starting at position {0}")]
    UnclosedLiteral(usize),
    #[error("invalid position predicate: {0}")]
    InvalidPosition(String),
    #[error("pattern has {placeholders} placeholders but {values} values were given")]
    PlaceholderMismatch { placeholders: usize, values: usize },
}

/// Parses an absolute instance path.
///
/// # Example
///
/// ```
/// use yangtree_path::{parse_path, PathError};
///
/// assert!(parse_path("/a:b/c[.='x']").is_ok());
/// assert_eq!(parse_path("a/b"), Err(PathError::NotAbsolute));
/// assert_eq!(parse_path(""), Err(PathError::Empty));
/// ```
pub fn parse_path(input: &str) -> Result<Path, PathError> {
    parser::PathParser::parse(input)
}

/// Quotes a literal for use inside a predicate.
///
/// Single quotes are used unless the value itself contains one. A value
/// holding both quote characters is written as `concat(...)` of single-quoted
/// runs and `"'"` parts.
///
/// # Example
///
/// ```
/// use yangtree_path::quote_literal;
///
/// assert_eq!(quote_literal("eth0"), "'eth0'");
/// assert_eq!(quote_literal("it's"), "\"it's\"");
/// assert_eq!(quote_literal("q'\"q"), "concat('q', \"'\", '\"q')");
/// ```
pub fn quote_literal(value: &str) -> String {
    match (value.contains('\''), value.contains('"')) {
        (false, _) => format!("'{value}'"),
        (true, false) => format!("\"{value}\""),
        (true, true) => {
            let mut parts = Vec::new();
            for (i, run) in value.split('\'').enumerate() {
                if i > 0 {
                    parts.push("\"'\"".to_string());
                }
                if !run.is_empty() {
                    parts.push(format!("'{run}'"));
                }
            }
            format!("concat({})", parts.join(", "))
        }
    }
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_module_prefixes_and_inheritance() {
        let path = parse_path("/a:top/b:aug/leaf").unwrap();
        let modules: Vec<_> = path.segments.iter().map(|s| s.module.clone()).collect();
        assert_eq!(
            modules,
            vec![Some("a".to_string()), Some("b".to_string()), None]
        );
    }

    #[test]
    fn parses_all_predicate_kinds() {
        let path = parse_path("/m:l[k1='a'][k2=\"b'c\"]/ll[.='v']/x[3]").unwrap();
        assert_eq!(
            path.segments[0].predicates,
            vec![
                Predicate::Key {
                    name: "k1".into(),
                    value: "a".into()
                },
                Predicate::Key {
                    name: "k2".into(),
                    value: "b'c".into()
                },
            ]
        );
        assert_eq!(
            path.segments[1].predicates,
            vec![Predicate::Value("v".into())]
        );
        assert_eq!(path.segments[2].predicates, vec![Predicate::Position(3)]);
    }

    #[test]
    fn prefixed_key_names_are_stripped() {
        let path = parse_path("/m:l[m:k='1']").unwrap();
        assert_eq!(
            path.segments[0].predicates,
            vec![Predicate::Key {
                name: "k".into(),
                value: "1".into()
            }]
        );
    }

    #[test]
    fn whitespace_inside_predicates() {
        let path = parse_path("/m:l[ k = 'a b' ]").unwrap();
        assert_eq!(
            path.segments[0].predicates,
            vec![Predicate::Key {
                name: "k".into(),
                value: "a b".into()
            }]
        );
    }

    #[test]
    fn wildcards() {
        let path = parse_path("/m:top/*").unwrap();
        assert!(path.segments[1].is_wildcard());
        let path = parse_path("/m:*").unwrap();
        assert_eq!(path.segments[0].module.as_deref(), Some("m"));
        assert!(path.segments[0].is_wildcard());
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_path("/m:l[k='a"), Err(PathError::UnclosedLiteral(7)));
        assert_eq!(parse_path("/m:l[0]"), Err(PathError::InvalidPosition("0".into())));
        assert_eq!(parse_path("/m:l[k='a'"), Err(PathError::UnexpectedEnd));
        assert!(matches!(
            parse_path("/m:l/"),
            Err(PathError::UnexpectedEnd)
        ));
        assert!(matches!(
            parse_path("/1abc"),
            Err(PathError::UnexpectedChar { ch: '1', pos: 1 })
        ));
        assert!(matches!(
            parse_path("/a b"),
            Err(PathError::UnexpectedChar { ch: ' ', pos: 2 })
        ));
    }

    #[test]
    fn concat_literals_join_their_parts() {
        let path = parse_path("/m:l[k=concat('a', \"'\", '\"b')]").unwrap();
        assert_eq!(
            path.segments[0].predicates,
            vec![Predicate::Key {
                name: "k".into(),
                value: "a'\"b".into()
            }]
        );
        assert_eq!(parse_path("/m:l[k=concat( 'x' )]").unwrap().to_string(), "/m:l[k='x']");
        assert_eq!(parse_path("/m:l[k=concat('x',)]"), Err(PathError::UnexpectedChar { ch: ')', pos: 18 }));
        assert_eq!(parse_path("/m:l[k=concat('x'"), Err(PathError::UnexpectedEnd));
    }

    #[test]
    fn display_roundtrip_of_canonical_form() {
        let text = "/m:top/list[name='x'][id='1']/ll[.='v']";
        assert_eq!(parse_path(text).unwrap().to_string(), text);
    }
}
