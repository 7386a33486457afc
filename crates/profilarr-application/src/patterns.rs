// SPDX-License-Identifier: GPL-3.0-or-later

//! Named-pattern resolution seam.
//!
//! Title, release-group and edition conditions reference patterns by name.
//! The engine never compiles a pattern; it asks a [`PatternRegistry`] for an
//! already compiled matcher and treats any lookup failure as a non-match.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Why a named pattern could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternLookupError {
    #[error("pattern '{0}' is not registered")]
    NotFound(String),

    #[error("pattern '{name}' failed to compile: {reason}")]
    Invalid { name: String, reason: String },
}

/// A matcher handed out by a registry.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
}

impl CompiledPattern {
    pub fn new(regex: Regex) -> Self {
        Self { regex }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    /// Byte range of the leftmost-first match.
    pub fn find(&self, haystack: &str) -> Option<(usize, usize)> {
        self.regex.find(haystack).map(|m| (m.start(), m.end()))
    }
}

/// Resolves pattern names to compiled matchers. Lookups are synchronous and
/// must not block a batch; failures come back as [`PatternLookupError`].
pub trait PatternRegistry: Send + Sync {
    fn resolve(&self, name: &str) -> Result<Arc<CompiledPattern>, PatternLookupError>;
}

impl<T: PatternRegistry + ?Sized> PatternRegistry for Arc<T> {
    fn resolve(&self, name: &str) -> Result<Arc<CompiledPattern>, PatternLookupError> {
        (**self).resolve(name)
    }
}

/// Fixed set of patterns compiled up front. Compile failures are kept and
/// reported as [`PatternLookupError::Invalid`] on lookup.
#[derive(Debug, Default, Clone)]
pub struct StaticPatternRegistry {
    patterns: HashMap<String, Result<Arc<CompiledPattern>, String>>,
}

impl StaticPatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source` case-insensitively and register it under `name`.
    pub fn with_pattern(mut self, name: impl Into<String>, source: &str) -> Self {
        self.insert_source(name, source, true);
        self
    }

    pub fn insert_source(&mut self, name: impl Into<String>, source: &str, case_insensitive: bool) {
        let compiled = RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .build()
            .map(|regex| Arc::new(CompiledPattern::new(regex)))
            .map_err(|e| e.to_string());
        self.patterns.insert(name.into(), compiled);
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl PatternRegistry for StaticPatternRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<CompiledPattern>, PatternLookupError> {
        match self.patterns.get(name) {
            Some(Ok(pattern)) => Ok(pattern.clone()),
            Some(Err(reason)) => Err(PatternLookupError::Invalid {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(PatternLookupError::NotFound(name.to_string())),
        }
    }
}
