//! Secret redaction for diagnostic output
//!
//! Log lines can carry URLs and configuration values. Before they are
//! written, [`Redactor`] masks anything shaped like a GitHub token, a bearer
//! token or credentials embedded in a URL, using the seed patterns of the
//! shared [`RegexCache`].

use std::borrow::Cow;
use std::sync::Arc;

use crate::regex_cache::{
    RegexCache, BEARER_TOKEN_PATTERN, GITHUB_PAT_PATTERN, GITHUB_TOKEN_PATTERN,
    URL_CREDENTIALS_PATTERN,
};

/// Replacement text for a masked secret
pub const REDACTED: &str = "[REDACTED]";

/// (pattern, replacement) pairs applied in order
const RULES: &[(&str, &str)] = &[
    (URL_CREDENTIALS_PATTERN, "${1}[REDACTED]@"),
    (GITHUB_PAT_PATTERN, REDACTED),
    (GITHUB_TOKEN_PATTERN, REDACTED),
    (BEARER_TOKEN_PATTERN, "Bearer [REDACTED]"),
];

/// Masks token and credential shapes in free text
#[derive(Debug, Clone)]
pub struct Redactor {
    cache: Arc<RegexCache>,
}

impl Redactor {
    pub fn new(cache: Arc<RegexCache>) -> Self {
        Self { cache }
    }

    /// Return `text` with every secret replaced; borrows when nothing matched.
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut current: Cow<'a, [u8]> = Cow::Borrowed(text.as_bytes());

        for (pattern, replacement) in RULES {
            let regex = match self.cache.compile_regex(pattern) {
                Ok(regex) => regex,
                Err(_) => continue,
            };
            let replaced = match regex.replace_all(&current, replacement.as_bytes()) {
                Cow::Owned(replaced) => Some(replaced),
                Cow::Borrowed(_) => None,
            };
            if let Some(replaced) = replaced {
                current = Cow::Owned(replaced);
            }
        }

        match current {
            Cow::Borrowed(_) => Cow::Borrowed(text),
            Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}
