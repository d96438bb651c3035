//! Content transformation pipeline
//!
//! A [`Transformer`] rewrites one file's bytes for one target repository. The
//! transformers in this module are:
//!
//! - [`BinaryTransformer`]: classifies binary files and passes them through untouched.
//! - [`EmailTransformer`]: rewrites the configured security and support addresses.
//! - [`RepoTransformer`]: rewrites `org/repo` references, branching on file type.
//! - [`TemplateTransformer`]: substitutes `{{VAR}}` and `${VAR}` placeholders.
//!
//! A [`Chain`] applies transformers in registration order. The email rewriter
//! must be registered before the repository rewriter: an address such as
//! `go-broadcast@example.com` contains the repository name, and rewriting the
//! name first leaves an address the email rewriter no longer recognizes.
//! [`standard_chain`] always registers them in that order.
//!
//! Patterns built from repository names, addresses and variable names are
//! compiled through the shared [`RegexCache`](crate::regex_cache::RegexCache).
//! Replacement text is user-controlled, so it is always passed through
//! [`escape_replacement`] before it reaches the substitution engine. The
//! email and repository rewriters apply all of their rules for a file in one
//! pass, so a target value that contains the source value is never rewritten
//! twice.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use regex::bytes::{Captures, Regex};

use crate::error::Result;
use crate::regex_cache::RegexCache;

pub mod binary;
pub mod cancel;
pub mod chain;
pub mod email;
pub mod repo;
pub mod template;

pub use binary::{is_binary, BinaryTransformer};
pub use cancel::CancelToken;
pub use chain::{standard_chain, Chain, Stages};
pub use email::EmailTransformer;
pub use repo::RepoTransformer;
pub use template::TemplateTransformer;

/// A single-responsibility content rewriter.
///
/// Implementations may hold immutable configuration but must not keep state
/// between calls. `transform` returns a new buffer and never mutates `ctx`, so
/// one context can be shared across concurrent calls.
pub trait Transformer: Send + Sync {
    /// Short name used in logs and in errors raised by a [`Chain`].
    fn name(&self) -> &str;

    /// Rewrite `content` for the target described by `ctx`.
    fn transform(&self, content: &[u8], ctx: &Context) -> Result<Vec<u8>>;
}

/// Per-file transformation context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Source repository, `org/name`
    pub source_repo: String,
    /// Target repository, `org/name`
    pub target_repo: String,
    /// Destination-relative path; its extension selects the rewrite rules
    pub file_path: String,
    /// Template variables, name -> replacement value
    pub variables: HashMap<String, String>,
    pub source_security_email: Option<String>,
    pub target_security_email: Option<String>,
    pub source_support_email: Option<String>,
    pub target_support_email: Option<String>,
}

impl Context {
    pub fn new(
        source_repo: impl Into<String>,
        target_repo: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            source_repo: source_repo.into(),
            target_repo: target_repo.into(),
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_security_email(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.source_security_email = Some(source.into());
        self.target_security_email = Some(target.into());
        self
    }

    pub fn with_support_email(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.source_support_email = Some(source.into());
        self.target_support_email = Some(target.into());
        self
    }

    /// Lowercased extension of `file_path`, without the dot
    pub fn extension(&self) -> String {
        Path::new(&self.file_path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// Double every `$` so the substitution engine inserts `replacement` literally.
///
/// Repository names and addresses come from configuration; without this a
/// value such as `user$1@co.com` would be read as a capture-group reference.
pub fn escape_replacement(replacement: &str) -> Cow<'_, str> {
    if replacement.contains('$') {
        Cow::Owned(replacement.replace('$', "$$"))
    } else {
        Cow::Borrowed(replacement)
    }
}

/// ASCII word boundary, matching on raw bytes
pub(crate) const WORD_BOUNDARY: &str = r"(?-u:\b)";

/// Regex for `literal` anchored at word boundaries.
///
/// A boundary is only added on a side where the literal starts or ends with
/// a word character; `\b` next to punctuation would require a word character
/// on the other side and never match the intended text.
pub(crate) fn word_bounded(literal: &str) -> String {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let leading = literal.chars().next().is_some_and(is_word);
    let trailing = literal.chars().last().is_some_and(is_word);

    format!(
        "{}{}{}",
        if leading { WORD_BOUNDARY } else { "" },
        regex::escape(literal),
        if trailing { WORD_BOUNDARY } else { "" }
    )
}

/// Guard over the bytes around a candidate match.
///
/// Called with the whole buffer and the `start..end` range a [`Rule`] would
/// replace; returning `false` leaves the match as it was.
pub(crate) type Guard = fn(&[u8], usize, usize) -> bool;

/// One alternative of a single-pass rewrite
#[derive(Debug, Clone)]
pub(crate) struct Rule {
    keep: Option<String>,
    pattern: String,
    replacement: String,
    guard: Option<Guard>,
}

impl Rule {
    /// Replace matches of `pattern` with `replacement`.
    ///
    /// `replacement` is a regex replacement template, so any user-supplied
    /// part of it must already have been through [`escape_replacement`].
    pub(crate) fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            keep: None,
            pattern: pattern.into(),
            replacement: replacement.into(),
            guard: None,
        }
    }

    /// Require `prefix` before the pattern and copy it to the output unchanged
    pub(crate) fn keeping(mut self, prefix: impl Into<String>) -> Self {
        self.keep = Some(prefix.into());
        self
    }

    pub(crate) fn guarded(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }
}

/// Regex rewrites over one buffer.
///
/// Each call to [`rewrite`](Rewriter::rewrite) joins its rules into one
/// alternation and substitutes in a single left-to-right pass, so replaced
/// text is never matched again. Where several rules match at the same
/// position the earlier rule wins. Patterns come from the shared cache; a
/// set of rules that fails to compile is logged and skipped.
pub(crate) struct Rewriter<'a> {
    cache: &'a RegexCache,
    transformer: &'a str,
    content: Vec<u8>,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(cache: &'a RegexCache, transformer: &'a str, content: &[u8]) -> Self {
        Self {
            cache,
            transformer,
            content: content.to_vec(),
        }
    }

    /// Apply `rules` as alternatives in one pass.
    pub(crate) fn rewrite(&mut self, rules: &[Rule]) -> &mut Self {
        if rules.is_empty() {
            return self;
        }

        let groups: Vec<(String, String)> = (0..rules.len())
            .map(|i| (format!("r{}", i), format!("k{}", i)))
            .collect();
        let pattern = rules
            .iter()
            .zip(&groups)
            .map(|(rule, (whole, kept))| match &rule.keep {
                Some(prefix) => format!("(?P<{}>(?P<{}>{}){})", whole, kept, prefix, rule.pattern),
                None => format!("(?P<{}>{})", whole, rule.pattern),
            })
            .collect::<Vec<_>>()
            .join("|");
        let Some(regex) = self.regex(&pattern) else {
            return self;
        };

        let content = &self.content;
        let replaced = regex.replace_all(content, |caps: &Captures<'_>| {
            let hit = rules
                .iter()
                .zip(&groups)
                .find_map(|(rule, (whole, kept))| {
                    caps.name(whole).map(|m| (rule, m, caps.name(kept)))
                });
            let Some((rule, whole, kept)) = hit else {
                return caps[0].to_vec();
            };

            let start = kept.map_or(whole.start(), |k| k.end());
            if rule.guard.is_some_and(|guard| !guard(content, start, whole.end())) {
                return caps[0].to_vec();
            }

            let mut out = kept.map(|k| k.as_bytes().to_vec()).unwrap_or_default();
            caps.expand(rule.replacement.as_bytes(), &mut out);
            out
        });
        let replaced = match replaced {
            Cow::Owned(replaced) => Some(replaced),
            Cow::Borrowed(_) => None,
        };
        if let Some(replaced) = replaced {
            self.content = replaced;
        }
        self
    }

    fn regex(&self, pattern: &str) -> Option<std::sync::Arc<Regex>> {
        match self.cache.compile_regex(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                log::warn!(
                    "{}: skipping replacement rules {:?}: {}",
                    self.transformer,
                    pattern,
                    err
                );
                None
            }
        }
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_replacement_doubles_dollars() {
        assert_eq!(escape_replacement("user$1@co.com"), "user$$1@co.com");
        assert_eq!(escape_replacement("$$"), "$$$$");
        assert!(matches!(escape_replacement("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_escaped_replacement_is_inserted_literally() {
        let regex = Regex::new("old").unwrap();
        let replacement = escape_replacement("new$1${2}$$");
        let out = regex.replace_all(b"say old", replacement.as_bytes());
        assert_eq!(&out[..], b"say new$1${2}$$");
    }

    #[test]
    fn test_word_bounded_respects_edges() {
        let regex = Regex::new(&word_bounded("old")).unwrap();
        assert!(regex.is_match(b"the old repo"));
        assert!(!regex.is_match(b"golden"));

        // No boundary before a leading dot, so ".github" still matches after a space
        let dotted = Regex::new(&word_bounded(".github")).unwrap();
        assert!(dotted.is_match(b"see .github/workflows"));
        assert!(!dotted.is_match(b"see .githubx"));
    }

    #[test]
    fn test_context_extension_is_lowercased() {
        let ctx = Context::new("org/a", "org/b", "docs/README.MD");
        assert_eq!(ctx.extension(), "md");
        let ctx = Context::new("org/a", "org/b", "Makefile");
        assert_eq!(ctx.extension(), "");
    }

    #[test]
    fn test_context_builders() {
        let ctx = Context::new("org/a", "org/b", "x.yml")
            .with_variable("NAME", "b")
            .with_security_email("sec@a.com", "sec@b.com")
            .with_support_email("help@a.com", "help@b.com");
        assert_eq!(ctx.variables.get("NAME").map(String::as_str), Some("b"));
        assert_eq!(ctx.target_security_email.as_deref(), Some("sec@b.com"));
        assert_eq!(ctx.source_support_email.as_deref(), Some("help@a.com"));
    }

    #[test]
    fn test_rewriter_skips_invalid_rules() {
        let cache = RegexCache::new();
        let mut rewriter = Rewriter::new(&cache, "test", b"abc abc");
        rewriter
            .rewrite(&[Rule::new("(unclosed", "x")])
            .rewrite(&[Rule::new("abc", "xyz")]);
        assert_eq!(rewriter.finish(), b"xyz xyz");
    }

    #[test]
    fn test_rewriter_never_rematches_replaced_text() {
        let cache = RegexCache::new();
        let mut rewriter = Rewriter::new(&cache, "test", b"app org/app");
        rewriter.rewrite(&[
            Rule::new(word_bounded("org/app"), "org/app-v2"),
            Rule::new(word_bounded("app"), "app-v2"),
        ]);
        assert_eq!(rewriter.finish(), b"app-v2 org/app-v2");
    }

    #[test]
    fn test_rewriter_earlier_rule_wins_at_same_position() {
        let cache = RegexCache::new();
        let mut rewriter = Rewriter::new(&cache, "test", b"abc");
        rewriter.rewrite(&[Rule::new("abc", "first"), Rule::new("abc", "second")]);
        assert_eq!(rewriter.finish(), b"first");
    }

    #[test]
    fn test_rewriter_keeps_prefix_and_checks_guard() {
        fn before_space(content: &[u8], start: usize, _end: usize) -> bool {
            start > 0 && content[start - 1] == b' '
        }

        let cache = RegexCache::new();
        let mut rewriter = Rewriter::new(&cache, "test", b"key: a x:a");
        rewriter.rewrite(&[Rule::new("a", "b").keeping(":[ ]*").guarded(before_space)]);
        assert_eq!(rewriter.finish(), b"key: b x:a");
    }
}
