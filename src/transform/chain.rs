//! Ordered, thread-safe sequence of transformers

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use super::{
    BinaryTransformer, CancelToken, Context, EmailTransformer, RepoTransformer,
    TemplateTransformer, Transformer,
};
use crate::error::{Error, Result};
use crate::regex_cache::RegexCache;

/// Transformers applied one after another to a file's content.
///
/// `add` and `transform` may run concurrently. Each `transform` call works on
/// a snapshot of the list taken under the read lock, so it sees one fixed
/// ordering even if transformers are appended while it runs.
#[derive(Default)]
pub struct Chain {
    transformers: RwLock<Vec<Arc<dyn Transformer>>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer; returns `self` for chaining calls.
    pub fn add<T: Transformer + 'static>(&self, transformer: T) -> &Self {
        self.add_shared(Arc::new(transformer))
    }

    /// Append a transformer that is shared with other chains
    pub fn add_shared(&self, transformer: Arc<dyn Transformer>) -> &Self {
        self.transformers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(transformer);
        self
    }

    /// Copy of the current transformer list, in registration order
    pub fn transformers(&self) -> Vec<Arc<dyn Transformer>> {
        self.transformers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.transformers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the registered transformers, in order
    pub fn names(&self) -> Vec<String> {
        self.transformers()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Run every transformer over `content`, feeding each one the previous output.
    ///
    /// Stops at the first failure, returning it wrapped with the transformer's
    /// name and the file path. `cancel` is checked before each transformer.
    pub fn transform(
        &self,
        cancel: &CancelToken,
        content: &[u8],
        ctx: &Context,
    ) -> Result<Vec<u8>> {
        let snapshot = self
            .transformers
            .read()
            .map_err(|_| Error::LockPoisoned {
                context: "transformer chain".to_string(),
            })?
            .clone();

        let mut current = content.to_vec();
        for transformer in &snapshot {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    transformer: transformer.name().to_string(),
                    path: ctx.file_path.clone(),
                });
            }

            let next = transformer
                .transform(&current, ctx)
                .map_err(|err| Error::Transform {
                    transformer: transformer.name().to_string(),
                    path: ctx.file_path.clone(),
                    source: Box::new(err),
                })?;

            if next != current {
                debug!("{}: rewrote {}", transformer.name(), ctx.file_path);
            } else {
                debug!("{}: no changes to {}", transformer.name(), ctx.file_path);
            }
            current = next;
        }

        Ok(current)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("transformers", &self.names())
            .finish()
    }
}

/// Which optional stages a standard chain includes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stages {
    /// Rewrite security/support addresses
    pub emails: bool,
    /// Rewrite repository references
    pub repo_name: bool,
    /// Substitute template variables
    pub variables: bool,
}

impl Stages {
    pub fn all() -> Self {
        Self {
            emails: true,
            repo_name: true,
            variables: true,
        }
    }
}

/// Build a chain in the canonical order: binary, email, repo, template.
///
/// Email always precedes repo so addresses containing the repository name are
/// rewritten before the name itself changes. Template runs last so
/// substituted values are never mistaken for repository references.
pub fn standard_chain(cache: &Arc<RegexCache>, stages: Stages) -> Chain {
    let chain = Chain::new();
    chain.add(BinaryTransformer::new());
    if stages.emails {
        chain.add(EmailTransformer::new(Arc::clone(cache)));
    }
    if stages.repo_name {
        chain.add(RepoTransformer::new(Arc::clone(cache)));
    }
    if stages.variables {
        chain.add(TemplateTransformer::new(Arc::clone(cache)));
    }
    chain
}
