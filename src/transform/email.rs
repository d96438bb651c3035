//! Security and support email rewriting

use std::sync::Arc;

use super::{escape_replacement, Context, Rewriter, Rule, Transformer};
use crate::error::Result;
use crate::regex_cache::RegexCache;

/// Rewrites the configured security and support addresses.
///
/// Each address is rewritten only when both the source and the target value
/// are set and differ. An address is only rewritten where it stands alone:
/// `team-security@src.com` and `security@src.com.au` are different addresses
/// and are left alone. Must run before [`RepoTransformer`](super::RepoTransformer)
/// in a chain; see the [module docs](super).
#[derive(Debug, Clone)]
pub struct EmailTransformer {
    cache: Arc<RegexCache>,
}

impl EmailTransformer {
    pub fn new(cache: Arc<RegexCache>) -> Self {
        Self { cache }
    }
}

/// The (source, target) pair when it should be rewritten
fn pair<'a>(source: &'a Option<String>, target: &'a Option<String>) -> Option<(&'a str, &'a str)> {
    match (source.as_deref(), target.as_deref()) {
        (Some(source), Some(target)) if !source.is_empty() && !target.is_empty() && source != target => {
            Some((source, target))
        }
        _ => None,
    }
}

impl Transformer for EmailTransformer {
    fn name(&self) -> &str {
        "email"
    }

    fn transform(&self, content: &[u8], ctx: &Context) -> Result<Vec<u8>> {
        let pairs = [
            pair(&ctx.source_security_email, &ctx.target_security_email),
            pair(&ctx.source_support_email, &ctx.target_support_email),
        ];
        if pairs.iter().all(Option::is_none) {
            return Ok(content.to_vec());
        }

        let extension = ctx.extension();
        let rules: Vec<Rule> = pairs
            .into_iter()
            .flatten()
            .flat_map(|(source, target)| match extension.as_str() {
                "md" | "markdown" => markdown_rules(source, target),
                "yaml" | "yml" => yaml_rules(source, target),
                "json" => json_rules(source, target),
                "html" | "htm" => html_rules(source, target),
                _ => vec![bare_address(source, target)],
            })
            .collect();

        let mut rewriter = Rewriter::new(&self.cache, self.name(), content);
        rewriter.rewrite(&rules);
        Ok(rewriter.finish())
    }
}

/// Bytes that may appear in the local part or domain of an address
fn is_address_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'%' | b'+' | b'-')
}

/// `content[start..end]` is a whole address.
///
/// It must not be the tail of a longer local part (`team-security@...`) or be
/// followed by another domain label (`...@src.com.au`). A trailing `.` that
/// ends a sentence is allowed.
fn whole_address(content: &[u8], start: usize, end: usize) -> bool {
    let starts_clean = start == 0 || !is_address_byte(content[start - 1]);
    let ends_clean = match content.get(end) {
        None => true,
        Some(b'.') => !content
            .get(end + 1)
            .is_some_and(|b| b.is_ascii_alphanumeric()),
        Some(&b) => !(b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'@')),
    };
    starts_clean && ends_clean
}

fn bare_address(source: &str, target: &str) -> Rule {
    Rule::new(regex::escape(source), escape_replacement(target)).guarded(whole_address)
}

fn mailto(source: &str, target: &str) -> Rule {
    bare_address(source, target).keeping("mailto:")
}

fn quoted(quote: char, source: &str, target: &str) -> Rule {
    Rule::new(
        format!("{0}{1}{0}", quote, regex::escape(source)),
        format!("{0}{1}{0}", quote, escape_replacement(target)),
    )
}

fn markdown_rules(source: &str, target: &str) -> Vec<Rule> {
    let escaped = regex::escape(source);
    let replacement = escape_replacement(target);

    vec![
        // [addr](mailto:addr)
        Rule::new(
            format!(r"\[{0}\]\(mailto:{0}\)", escaped),
            format!("[{0}](mailto:{0})", replacement),
        ),
        // [text](mailto:addr)
        Rule::new(format!(r"{}\)", escaped), format!("{})", replacement))
            .keeping(r"\[[^\]]*\]\(mailto:"),
        // [addr](...): link text that is the address itself
        Rule::new(format!(r"\[{}\]\(", escaped), format!("[{}](", replacement)),
        mailto(source, target),
        bare_address(source, target),
    ]
}

fn yaml_rules(source: &str, target: &str) -> Vec<Rule> {
    vec![
        quoted('"', source, target),
        quoted('\'', source, target),
        bare_address(source, target).keeping(r":[ \t]+"),
    ]
}

fn json_rules(source: &str, target: &str) -> Vec<Rule> {
    vec![quoted('"', source, target)]
}

fn html_rules(source: &str, target: &str) -> Vec<Rule> {
    vec![
        bare_address(source, target).keeping(r#"<a\s[^>]*?href=["']mailto:"#),
        mailto(source, target),
        bare_address(source, target),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(path: &str, input: &str) -> String {
        let ctx = Context::new("org/src", "org/dst", path)
            .with_security_email("security@src.com", "security@dst.com")
            .with_support_email("support@src.com", "help@dst.com");
        run_ctx(&ctx, input)
    }

    fn run_ctx(ctx: &Context, input: &str) -> String {
        let transformer = EmailTransformer::new(Arc::new(RegexCache::new()));
        String::from_utf8(transformer.transform(input.as_bytes(), ctx).unwrap()).unwrap()
    }

    #[test]
    fn test_unconfigured_is_a_no_op() {
        let ctx = Context::new("org/src", "org/dst", "SECURITY.md");
        assert_eq!(run_ctx(&ctx, "mail security@src.com"), "mail security@src.com");
    }

    #[test]
    fn test_same_or_partial_pair_is_skipped() {
        let ctx = Context::new("org/src", "org/dst", "a.txt")
            .with_security_email("security@src.com", "security@src.com")
            .with_support_email("support@src.com", "");
        let input = "security@src.com support@src.com";
        assert_eq!(run_ctx(&ctx, input), input);
    }

    #[test]
    fn test_markdown_links_and_bare_addresses() {
        let input = "[Report](mailto:security@src.com)\n\
                     [security@src.com](mailto:security@src.com)\n\
                     Write to mailto:support@src.com or support@src.com.\n";
        assert_eq!(
            run("SECURITY.md", input),
            "[Report](mailto:security@dst.com)\n\
             [security@dst.com](mailto:security@dst.com)\n\
             Write to mailto:help@dst.com or help@dst.com.\n"
        );
    }

    #[test]
    fn test_yaml_forms() {
        let input = "a: \"security@src.com\"\nb: 'security@src.com'\nc: security@src.com\n";
        assert_eq!(
            run("config.yml", input),
            "a: \"security@dst.com\"\nb: 'security@dst.com'\nc: security@dst.com\n"
        );
    }

    #[test]
    fn test_yaml_leaves_unrelated_positions() {
        let input = "# contact security@src.com\n";
        assert_eq!(run("config.yaml", input), input);
    }

    #[test]
    fn test_json_only_quoted() {
        let input = r#"{"security": "security@src.com", "note": "mail security@src.com"}"#;
        assert_eq!(
            run("package.json", input),
            r#"{"security": "security@dst.com", "note": "mail security@src.com"}"#
        );
    }

    #[test]
    fn test_html() {
        let input = r#"<a class="x" href="mailto:security@src.com">security@src.com</a> mailto:support@src.com"#;
        assert_eq!(
            run("index.html", input),
            r#"<a class="x" href="mailto:security@dst.com">security@dst.com</a> mailto:help@dst.com"#
        );
    }

    #[test]
    fn test_default_bare_address_is_word_bounded() {
        let input = "security@src.com xsecurity@src.community";
        assert_eq!(run("NOTICE", input), "security@dst.com xsecurity@src.community");
    }

    #[test]
    fn test_dollar_in_target_is_literal() {
        let ctx = Context::new("org/src", "org/dst", "README.md")
            .with_security_email("security@src.com", "user$1@co.com");
        let out = run_ctx(&ctx, "[mail](mailto:security@src.com) security@src.com");
        assert_eq!(out, "[mail](mailto:user$1@co.com) user$1@co.com");
    }

    #[test]
    fn test_longer_local_part_is_not_rewritten() {
        let ctx = Context::new("org/src", "org/dst", "NOTICE")
            .with_security_email("security@src.com", "sec@dst.com");
        let input = "team-security@src.com security@src.com.au";
        assert_eq!(run_ctx(&ctx, input), input);
    }

    #[test]
    fn test_address_boundaries_in_every_format() {
        let input = "a.security@src.com, security@src.com.au, <security@src.com>.\n";
        let expected = "a.security@src.com, security@src.com.au, <security@dst.com>.\n";
        for path in ["NOTICE", "README.md", "index.html"] {
            assert_eq!(run(path, input), expected, "{}", path);
        }
    }

    #[test]
    fn test_mailto_longer_domain_is_not_rewritten() {
        let input = "mailto:security@src.com.au mailto:security@src.com";
        assert_eq!(
            run("SECURITY.md", input),
            "mailto:security@src.com.au mailto:security@dst.com"
        );
    }

    #[test]
    fn test_yaml_unquoted_longer_address_is_not_rewritten() {
        let input = "a: team-security@src.com\nb: security@src.com.au\nc: security@src.com\n";
        assert_eq!(
            run("config.yml", input),
            "a: team-security@src.com\nb: security@src.com.au\nc: security@dst.com\n"
        );
    }

    #[test]
    fn test_target_extending_source_is_applied_once() {
        let ctx = Context::new("org/src", "org/dst", "README.md")
            .with_security_email("security@src.com", "security@src.com.au");
        let out = run_ctx(&ctx, "[security@src.com](mailto:security@src.com) security@src.com\n");
        assert_eq!(
            out,
            "[security@src.com.au](mailto:security@src.com.au) security@src.com.au\n"
        );
    }

    #[test]
    fn test_whole_address_edges() {
        let content = b"x security@src.com.";
        assert!(whole_address(content, 2, 18));
        assert!(!whole_address(b"team-security@src.com", 5, 21));
        assert!(!whole_address(b"security@src.com.au", 0, 16));
        assert!(whole_address(b"security@src.com", 0, 16));
    }
}
