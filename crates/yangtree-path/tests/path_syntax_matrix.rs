use proptest::prelude::*;
use yangtree_path::{fill_pattern, parse_path, quote_literal, NodeTest, PathError, Predicate};

#[test]
fn canonical_paths_roundtrip_matrix() {
    let cases = [
        "/m:top",
        "/m:top/inner/leaf",
        "/m:top/b:augmented/x",
        "/m:list[k='v']",
        "/m:list[a='1'][b='2']/value",
        "/m:list[k=\"it's\"]",
        "/m:list[k=concat('a', \"'\", '\"b')]",
        "/m:list[k=concat(\"'\", '\"')]",
        "/m:top/ll[.='x y']",
        "/m:top/*",
        "/m:top/item[2]",
    ];

    for text in cases {
        let path = parse_path(text).expect("valid path");
        assert_eq!(path.to_string(), text);
    }
}

#[test]
fn double_quoted_literals_normalize_to_single_quotes() {
    let path = parse_path("/m:list[k=\"v\"]").unwrap();
    assert_eq!(path.to_string(), "/m:list[k='v']");
}

#[test]
fn rejection_matrix() {
    let cases: [(&str, PathError); 5] = [
        ("", PathError::Empty),
        ("m:top", PathError::NotAbsolute),
        ("/m:top[", PathError::UnexpectedEnd),
        ("/m:top[k=v]", PathError::UnexpectedChar { ch: 'v', pos: 9 }),
        ("/m:top[-1]", PathError::UnexpectedChar { ch: '-', pos: 7 }),
    ];
    for (text, err) in cases {
        assert_eq!(parse_path(text), Err(err), "input {text:?}");
    }
}

#[test]
fn parent_and_last_segment() {
    let path = parse_path("/m:a/b[k='1']/c").unwrap();
    let parent = path.parent().unwrap();
    assert_eq!(parent.to_string(), "/m:a/b[k='1']");
    assert_eq!(path.last().and_then(|s| s.name()), Some("c"));
    assert_eq!(path.last().map(|s| &s.node), Some(&NodeTest::Name("c".into())));
}

#[test]
fn filled_pattern_parses_back_to_the_key_values() {
    let filled = fill_pattern("/m:top/item[name='%s'][id='%s']/v", &["a'b", "7"]).unwrap();
    let path = parse_path(&filled).unwrap();
    assert_eq!(
        path.segments[1].predicates,
        vec![
            Predicate::Key {
                name: "name".into(),
                value: "a'b".into()
            },
            Predicate::Key {
                name: "id".into(),
                value: "7".into()
            },
        ]
    );
}

proptest! {
    #[test]
    fn key_values_survive_quoting(value in "[a-zA-Z0-9 '\"._-]{0,16}") {
        let text = format!("/m:list[k={}]", quote_literal(&value));
        let path = parse_path(&text).unwrap();
        prop_assert_eq!(
            &path.segments[0].predicates,
            &vec![Predicate::Key { name: "k".into(), value: value.clone() }]
        );
        prop_assert_eq!(path.to_string(), text);
    }
}
