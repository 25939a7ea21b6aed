//! Property-based tests for the descriptor codec and store file naming.
//!
//! These tests use proptest to generate random descriptors and verify that
//! invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::descriptor::{name_from_origin, RepositoryDescriptor};
    use crate::store::{file_name, local_path_hash};
    use proptest::prelude::*;

    fn local_path() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z0-9_-]{1,10}", 1..5).prop_map(|segments| segments.join("/"))
    }

    fn origin_url() -> impl Strategy<Value = String> {
        prop_oneof![
            ("[a-z]{1,10}", "[a-zA-Z0-9_-]{1,12}")
                .prop_map(|(host, repo)| format!("https://{host}.com/team/{repo}.git")),
            ("[a-z]{1,10}", "[a-zA-Z0-9_-]{1,12}")
                .prop_map(|(host, repo)| format!("git@{host}.org:team/{repo}.git")),
        ]
    }

    fn descriptor() -> impl Strategy<Value = RepositoryDescriptor> {
        ("[a-zA-Z0-9_.-]{1,20}", local_path(), origin_url()).prop_map(|(name, local, origin)| {
            RepositoryDescriptor::new(name, local, origin).unwrap()
        })
    }

    fn same_fields(a: &RepositoryDescriptor, b: &RepositoryDescriptor) -> bool {
        a.name() == b.name() && a.local_path() == b.local_path() && a.origin_url() == b.origin_url()
    }

    // ============================================================================
    // codec property tests
    // ============================================================================

    proptest! {
        /// Property: decoding the encoded lines restores every field
        #[test]
        fn decode_restores_encoded_descriptor(original in descriptor()) {
            let decoded = RepositoryDescriptor::decode(original.encode()).unwrap();
            prop_assert!(same_fields(&original, &decoded), "{:?} != {:?}", original, decoded);
        }

        /// Property: lines without the separator never change the outcome
        #[test]
        fn decode_ignores_lines_without_separator(
            original in descriptor(),
            noise in prop::collection::vec("[a-z #]{0,20}", 0..5),
        ) {
            let mut lines: Vec<String> = noise.clone();
            lines.extend(original.encode());
            lines.extend(noise);
            let decoded = RepositoryDescriptor::decode(lines).unwrap();
            prop_assert!(same_fields(&original, &decoded));
        }

        /// Property: when a key repeats, the last value wins
        #[test]
        fn decode_last_value_wins(original in descriptor(), replacement in origin_url()) {
            let mut lines = original.encode().to_vec();
            lines.push(format!("origin: {replacement}"));
            let decoded = RepositoryDescriptor::decode(lines).unwrap();
            prop_assert_eq!(decoded.origin_url(), replacement.as_str());
            prop_assert_eq!(decoded.name(), original.name());
        }

        /// Property: a local path climbing out of the root is always rejected
        #[test]
        fn decode_rejects_parent_segments(prefix in local_path(), suffix in local_path()) {
            let lines = [
                "name: x".to_string(),
                format!("local: {prefix}/../../{suffix}"),
                "origin: u".to_string(),
            ];
            let err = RepositoryDescriptor::decode(lines).unwrap_err();
            prop_assert!(err.is_malformed_descriptor());
        }

        /// Property: derived names are a single path segment
        #[test]
        fn name_from_origin_is_one_segment(origin in origin_url()) {
            let name = name_from_origin(&origin);
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains('/'));
            prop_assert!(!name.ends_with(".git"));
        }
    }

    // ============================================================================
    // store file name property tests
    // ============================================================================

    proptest! {
        /// Property: the hash depends on the local path only
        #[test]
        fn hash_ignores_name_and_origin(
            a in descriptor(),
            name in "[a-z]{1,8}",
            origin in origin_url(),
        ) {
            let b = RepositoryDescriptor::new(&name, a.local_path(), &origin).unwrap();
            prop_assert_eq!(local_path_hash(&a), local_path_hash(&b));
            prop_assert_eq!(&a, &b);
        }

        /// Property: file names are `{name}_{decimal hash}.yaml`
        #[test]
        fn file_name_shape(d in descriptor()) {
            let file = file_name(&d);
            let expected = format!("{}_{}.yaml", d.name(), local_path_hash(&d));
            prop_assert_eq!(file, expected);
        }
    }
}
