//! `{{VAR}}` / `${VAR}` placeholder substitution

use std::collections::BTreeSet;
use std::sync::Arc;

use regex::bytes::Captures;

use super::{Context, Transformer};
use crate::error::Result;
use crate::regex_cache::{RegexCache, UNREPLACED_VARIABLE_PATTERN};

/// Substitutes template variables from [`Context::variables`].
///
/// Names are matched longest first, so `SERVICE` can never eat into
/// `{{SERVICE_NAME}}`. All placeholders are replaced in a single pass over the
/// input: a value that itself contains `{{OTHER}}` is inserted literally and
/// not expanded again.
#[derive(Debug, Clone)]
pub struct TemplateTransformer {
    cache: Arc<RegexCache>,
}

impl TemplateTransformer {
    pub fn new(cache: Arc<RegexCache>) -> Self {
        Self { cache }
    }

    /// Distinct `{{UPPER_SNAKE}}` / `${UPPER_SNAKE}` placeholders left in `content`
    pub fn unreplaced(&self, content: &[u8]) -> Vec<String> {
        let regex = match self.cache.compile_regex(UNREPLACED_VARIABLE_PATTERN) {
            Ok(regex) => regex,
            Err(err) => {
                log::warn!("template: cannot scan for unreplaced variables: {}", err);
                return Vec::new();
            }
        };

        regex
            .find_iter(content)
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Variable names sorted by descending length, ties alphabetically
fn ordered_names(ctx: &Context) -> Vec<&str> {
    let mut names: Vec<&str> = ctx
        .variables
        .keys()
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names
}

impl Transformer for TemplateTransformer {
    fn name(&self) -> &str {
        "template"
    }

    fn transform(&self, content: &[u8], ctx: &Context) -> Result<Vec<u8>> {
        let names = ordered_names(ctx);
        if names.is_empty() {
            return Ok(content.to_vec());
        }

        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"\{{\{{({0})\}}\}}|\$\{{({0})\}}", alternation);

        let output = match self.cache.compile_regex(&pattern) {
            Ok(regex) => regex
                .replace_all(content, |caps: &Captures<'_>| {
                    let name = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_bytes());
                    name.and_then(|name| std::str::from_utf8(name).ok())
                        .and_then(|name| ctx.variables.get(name))
                        .map(|value| value.as_bytes().to_vec())
                        .unwrap_or_else(|| caps[0].to_vec())
                })
                .into_owned(),
            Err(err) => {
                log::warn!(
                    "template: skipping substitution for {}: {}",
                    ctx.file_path,
                    err
                );
                content.to_vec()
            }
        };

        let leftover = self.unreplaced(&output);
        if !leftover.is_empty() {
            log::warn!(
                "template: unreplaced variables in {}: {}",
                ctx.file_path,
                leftover.join(", ")
            );
        }

        Ok(output)
    }
}
