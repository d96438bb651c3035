//! Repository reference rewriting

use std::sync::Arc;

use super::{escape_replacement, word_bounded, Context, Rewriter, Rule, Transformer};
use crate::error::{Error, Result};
use crate::regex_cache::RegexCache;

/// An `org/name` repository identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoName<'a> {
    pub org: &'a str,
    pub name: &'a str,
}

impl<'a> RepoName<'a> {
    /// Split `org/name`; anything other than two non-empty parts is an error
    pub fn parse(repo: &'a str) -> Result<Self> {
        let mut parts = repo.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(org), Some(name), None) if !org.is_empty() && !name.is_empty() => {
                Ok(Self { org, name })
            }
            _ => Err(Error::InvalidRepoFormat {
                repo: repo.to_string(),
            }),
        }
    }

    fn full(&self) -> String {
        format!("{}/{}", self.org, self.name)
    }
}

/// Rewrites references to the source repository so they point at the target.
///
/// The rules depend on the file type:
///
/// | Extension | Rewrites |
/// |---|---|
/// | `go`, `mod` | `module` declarations and import paths under `github.com/org/repo` |
/// | `md`, `txt`, `rst` | GitHub URLs, `github.com/org/repo`, `org/repo`, bare repo name |
/// | `yaml`, `yml`, `json` | `org/repo`, quoted repo name, bare repo name |
/// | anything else | `org/repo`, bare repo name |
///
/// The rules for a file are tried as alternatives in the order above and
/// applied in one pass, so a target such as `org/repo-v2` is never extended
/// a second time.
#[derive(Debug, Clone)]
pub struct RepoTransformer {
    cache: Arc<RegexCache>,
}

impl RepoTransformer {
    pub fn new(cache: Arc<RegexCache>) -> Self {
        Self { cache }
    }
}

impl Transformer for RepoTransformer {
    fn name(&self) -> &str {
        "repo"
    }

    fn transform(&self, content: &[u8], ctx: &Context) -> Result<Vec<u8>> {
        if ctx.source_repo == ctx.target_repo {
            return Ok(content.to_vec());
        }

        let source = RepoName::parse(&ctx.source_repo)?;
        let target = RepoName::parse(&ctx.target_repo)?;

        let rules = match ctx.extension().as_str() {
            "go" | "mod" => go_rules(source, target),
            "md" | "txt" | "rst" => docs_rules(source, target),
            "yaml" | "yml" | "json" => config_rules(source, target),
            _ => default_rules(source, target),
        };
        let mut rewriter = Rewriter::new(&self.cache, self.name(), content);
        rewriter.rewrite(&rules);
        Ok(rewriter.finish())
    }
}

/// `github.com/org/repo` with both parts escaped for use in a pattern
fn github_path(repo: RepoName<'_>) -> String {
    format!(
        r"github\.com/{}/{}",
        regex::escape(repo.org),
        regex::escape(repo.name)
    )
}

/// A Go path must end at `/`, a quote or whitespace, so `old-extra` is not
/// mistaken for `old`.
fn ends_go_path(content: &[u8], _start: usize, end: usize) -> bool {
    match content.get(end) {
        None => true,
        Some(&b) => b == b'/' || b == b'"' || b == b'`' || b.is_ascii_whitespace(),
    }
}

fn go_rules(source: RepoName<'_>, target: RepoName<'_>) -> Vec<Rule> {
    let path = github_path(source);
    let replacement = format!("github.com/{}", escape_replacement(&target.full()));

    vec![
        Rule::new(path.clone(), replacement.clone())
            .keeping(r"(?m:^)\s*module\s+")
            .guarded(ends_go_path),
        Rule::new(path, replacement).guarded(ends_go_path),
    ]
}

fn docs_rules(source: RepoName<'_>, target: RepoName<'_>) -> Vec<Rule> {
    let url = format!("{}{}", github_path(source), trailing_boundary(source.name));
    let github = format!("github.com/{}", escape_replacement(&target.full()));

    vec![
        Rule::new(url.clone(), github.clone()).keeping("https?://"),
        Rule::new(url, github),
        Rule::new(word_bounded(&source.full()), escape_replacement(&target.full())),
        Rule::new(word_bounded(source.name), escape_replacement(target.name)),
    ]
}

fn config_rules(source: RepoName<'_>, target: RepoName<'_>) -> Vec<Rule> {
    vec![
        Rule::new(word_bounded(&source.full()), escape_replacement(&target.full())),
        Rule::new(
            format!("\"{}\"", regex::escape(source.name)),
            format!("\"{}\"", escape_replacement(target.name)),
        ),
        Rule::new(word_bounded(source.name), escape_replacement(target.name)),
    ]
}

fn default_rules(source: RepoName<'_>, target: RepoName<'_>) -> Vec<Rule> {
    vec![
        Rule::new(word_bounded(&source.full()), escape_replacement(&target.full())),
        Rule::new(word_bounded(source.name), escape_replacement(target.name)),
    ]
}

/// Word boundary after `literal` when it ends in a word character
fn trailing_boundary(literal: &str) -> &'static str {
    if literal
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        super::WORD_BOUNDARY
    } else {
        ""
    }
}
