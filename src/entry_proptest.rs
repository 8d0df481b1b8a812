//! Property-based tests for entry-name derivation.
//!
//! These tests use proptest to generate source layouts and verify that the
//! naming invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::entry::entry_name;
    use crate::pattern::expand_braces;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z]{1,6}(-[a-z]{1,6}){0,2}"
    }

    fn source_file() -> impl Strategy<Value = (String, Vec<String>, String, String)> {
        (
            prop_oneof![Just("scripts"), Just("styles"), Just("client")].prop_map(String::from),
            prop::collection::vec(segment(), 0..3),
            segment(),
            prop_oneof![Just("js"), Just("ts"), Just("scss")].prop_map(String::from),
        )
    }

    fn path_of(category: &str, dirs: &[String], stem: &str, ext: &str) -> PathBuf {
        let mut path = PathBuf::from("/project/resources").join(category);
        for dir in dirs {
            path.push(dir);
        }
        path.push(format!("{}.{}", stem, ext));
        path
    }

    // ============================================================================
    // entry_name property tests
    // ============================================================================

    proptest! {
        /// Property: naming is deterministic
        #[test]
        fn entry_name_is_deterministic((category, dirs, stem, ext) in source_file()) {
            let file = path_of(&category, &dirs, &stem, &ext);
            prop_assert_eq!(
                entry_name("/project/resources", &file),
                entry_name("/project/resources", &file)
            );
        }

        /// Property: the name is `<category>/<tail>` with a clean hyphenated tail
        #[test]
        fn entry_name_has_category_and_clean_tail((category, dirs, stem, ext) in source_file()) {
            let file = path_of(&category, &dirs, &stem, &ext);
            let name = entry_name("/project/resources", &file).unwrap();

            let prefix = format!("{}/", category);
            prop_assert!(name.starts_with(&prefix), "{} lacks category", name);
            let tail = &name[prefix.len()..];
            prop_assert!(!tail.is_empty());
            prop_assert!(!tail.contains('/'), "{} has nested segments", name);
            prop_assert!(!tail.contains("--"), "{} has an empty token", name);
            prop_assert!(!tail.starts_with('-') && !tail.ends_with('-'));
            prop_assert!(!tail.contains('.'), "{} kept an extension", name);
        }

        /// Property: no two adjacent tokens of the tail are equal
        #[test]
        fn entry_name_collapses_repeated_tokens((category, dirs, stem, ext) in source_file()) {
            let file = path_of(&category, &dirs, &stem, &ext);
            let name = entry_name("/project/resources", &file).unwrap();
            let tail = name.split_once('/').unwrap().1;
            let tokens: Vec<&str> = tail.split('-').collect();
            for pair in tokens.windows(2) {
                prop_assert_ne!(pair[0], pair[1]);
            }
        }

        /// Property: an index file is named after its directory
        #[test]
        fn index_file_takes_directory_name(dir in "[a-z]{1,8}") {
            let file = path_of("client", std::slice::from_ref(&dir), "index", "js");
            prop_assert_eq!(
                entry_name("/project/resources", &file),
                Some(format!("client/{}", dir))
            );
        }

        /// Property: a stem repeating its directory prefix does not repeat it
        #[test]
        fn parent_prefix_is_not_repeated(parent in "[a-m]{3,6}", rest in "[n-z]{3,6}") {
            let stem = format!("{}-{}", parent, rest);
            let file = path_of("scripts", std::slice::from_ref(&parent), &stem, "js");
            prop_assert_eq!(
                entry_name("/project/resources", &file),
                Some(format!("scripts/{}-{}", parent, rest))
            );
        }

        /// Property: files outside the source root never get a name
        #[test]
        fn outside_root_has_no_name((category, dirs, stem, ext) in source_file()) {
            let file = path_of(&category, &dirs, &stem, &ext);
            prop_assert_eq!(entry_name("/elsewhere", &file), None);
        }
    }

    // ============================================================================
    // expand_braces property tests
    // ============================================================================

    proptest! {
        /// Property: one alternation yields one pattern per alternative, in order
        #[test]
        fn expand_braces_keeps_alternative_order(
            alternatives in prop::collection::vec("[a-z]{1,4}", 2..5)
        ) {
            let pattern = format!("scripts/*.{{{}}}", alternatives.join(","));
            let expanded = expand_braces(&pattern);
            let expected: Vec<String> = alternatives
                .iter()
                .map(|alt| format!("scripts/*.{}", alt))
                .collect();
            prop_assert_eq!(expanded, expected);
        }

        /// Property: patterns without braces are returned unchanged
        #[test]
        fn expand_braces_identity_without_braces(pattern in "[a-z/*?.]{0,20}") {
            prop_assert_eq!(expand_braces(&pattern), vec![pattern.clone()]);
        }
    }
}
