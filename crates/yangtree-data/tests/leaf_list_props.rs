//! Property tests for repeated edits.

mod common;

use common::{minimal_schema, types};
use proptest::prelude::*;
use yangtree_data::DataTree;

proptest! {
    #[test]
    fn leaf_list_keeps_first_occurrences(values in prop::collection::vec("[a-z]{1,3}", 0..12)) {
        let schema = minimal_schema();
        let mut tree = DataTree::new(&schema);
        let path = types("simplecollection");
        for value in &values {
            tree.set(&path, value).unwrap();
        }

        let mut expected: Vec<String> = Vec::new();
        for value in values {
            if !expected.contains(&value) {
                expected.push(value);
            }
        }
        prop_assert_eq!(tree.values(&path), expected);
    }

    #[test]
    fn uint8_values_render_canonically(n in any::<u8>(), plus in any::<bool>()) {
        let schema = minimal_schema();
        let mut tree = DataTree::new(&schema);
        let text = if plus { format!("+{n}") } else { n.to_string() };
        tree.set(&types("u_int_8"), &text).unwrap();
        prop_assert_eq!(tree.values(&types("u_int_8")), vec![n.to_string()]);
        prop_assert_eq!(tree.count(&types(&format!("u_int_8[.='{n}']"))), 1);
    }
}
