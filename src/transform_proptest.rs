//! Property-based tests for the transformers.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use std::sync::Arc;

    use crate::regex_cache::RegexCache;
    use crate::transform::{
        escape_replacement, is_binary, Context, RepoTransformer, TemplateTransformer, Transformer,
    };
    use proptest::prelude::*;

    fn cache() -> Arc<RegexCache> {
        Arc::new(RegexCache::new())
    }

    // ============================================================================
    // is_binary property tests
    // ============================================================================

    proptest! {
        /// Property: classification never panics and is deterministic
        #[test]
        fn is_binary_is_deterministic(
            path in "[a-z]{1,8}(\\.[a-z]{1,4})?",
            content in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            prop_assert_eq!(is_binary(&path, &content), is_binary(&path, &content));
        }

        /// Property: a NUL byte in the sample always means binary
        #[test]
        fn nul_byte_is_binary(
            prefix in "[ -~]{0,100}",
            suffix in "[ -~]{0,100}",
        ) {
            let mut content = prefix.into_bytes();
            content.push(0);
            content.extend_from_slice(suffix.as_bytes());
            prop_assert!(is_binary("data", &content));
        }

        /// Property: printable ASCII with ordinary whitespace is never binary
        #[test]
        fn printable_ascii_is_text(content in "[ -~\t\r\n]{0,2000}") {
            prop_assert!(!is_binary("notes", content.as_bytes()));
        }
    }

    // ============================================================================
    // escape_replacement property tests
    // ============================================================================

    proptest! {
        /// Property: an escaped replacement is inserted byte for byte
        #[test]
        fn escaped_replacement_is_literal(value in "[a-z$0-9{}@.]{0,30}") {
            let regex = regex::bytes::Regex::new("X").unwrap();
            let escaped = escape_replacement(&value);
            let out = regex.replace_all(b"X", escaped.as_bytes());
            prop_assert_eq!(&out[..], value.as_bytes());
        }
    }

    // ============================================================================
    // TemplateTransformer property tests
    // ============================================================================

    proptest! {
        /// Property: content without placeholders is returned unchanged
        #[test]
        fn template_without_placeholders_is_unchanged(
            content in "[a-zA-Z0-9 .,\n]{0,200}",
            value in "[a-z]{0,10}",
        ) {
            let ctx = Context::new("org/a", "org/b", "README.md").with_variable("NAME", value);
            let out = TemplateTransformer::new(cache()).transform(content.as_bytes(), &ctx).unwrap();
            prop_assert_eq!(out, content.into_bytes());
        }

        /// Property: values containing placeholder syntax are never expanded again
        #[test]
        fn template_does_not_recurse(inner in "IN_[A-Z]{1,6}") {
            let value = format!("{{{{{}}}}}", inner);
            let ctx = Context::new("org/a", "org/b", "a.txt")
                .with_variable("OUTER", value.clone())
                .with_variable(inner, "expanded");
            let out = TemplateTransformer::new(cache())
                .transform(b"{{OUTER}}", &ctx)
                .unwrap();
            prop_assert_eq!(out, value.into_bytes());
        }

        /// Property: a variable that is a prefix of another never splits it
        #[test]
        fn template_prefers_longest_name(base in "[A-Z]{1,6}", suffix in "_[A-Z]{1,6}") {
            let long = format!("{}{}", base, suffix);
            let ctx = Context::new("org/a", "org/b", "a.txt")
                .with_variable(base.clone(), "short")
                .with_variable(long.clone(), "long");
            let input = format!("{{{{{}}}}} ${{{}}}", long, base);
            let out = TemplateTransformer::new(cache())
                .transform(input.as_bytes(), &ctx)
                .unwrap();
            prop_assert_eq!(out, b"long short".to_vec());
        }
    }

    // ============================================================================
    // RepoTransformer property tests
    // ============================================================================

    proptest! {
        /// Property: rewriting to the same repository is the identity
        #[test]
        fn repo_same_target_is_identity(
            repo in "[a-z]{1,8}/[a-z]{1,8}",
            content in "[ -~\n]{0,200}",
            ext in "(go|md|yaml|json|txt|sh)",
        ) {
            let ctx = Context::new(repo.clone(), repo, format!("file.{}", ext));
            let out = RepoTransformer::new(cache()).transform(content.as_bytes(), &ctx).unwrap();
            prop_assert_eq!(out, content.into_bytes());
        }

        /// Property: content that never mentions the source name is unchanged
        #[test]
        fn repo_unrelated_content_is_unchanged(content in "[0-9 .,:\n]{0,200}") {
            let ctx = Context::new("org/old", "acme/new", "README.md");
            let out = RepoTransformer::new(cache()).transform(content.as_bytes(), &ctx).unwrap();
            prop_assert_eq!(out, content.into_bytes());
        }

        /// Property: a target that extends the source name is written exactly once
        #[test]
        fn repo_extended_target_is_applied_once(
            name in "r[a-z]{2,7}",
            suffix in "-[a-z0-9]{1,4}",
            ext in "(md|txt|yml|json|sh)",
        ) {
            let source = format!("org/{}", name);
            let target = format!("{}{}", source, suffix);
            let ctx = Context::new(source, target, format!("file.{}", ext));
            let input = format!("https://github.com/org/{0} org/{0} {0}\n", name);
            let out = RepoTransformer::new(cache()).transform(input.as_bytes(), &ctx).unwrap();
            let expected = format!("https://github.com/org/{0}{1} org/{0}{1} {0}{1}\n", name, suffix);
            prop_assert_eq!(out, expected.into_bytes());
        }
    }
}
