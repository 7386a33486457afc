// SPDX-License-Identifier: GPL-3.0-or-later

//! Pattern registry backed by regex sources, compiled lazily on first lookup
//! and cached.

use moka::sync::Cache;
use profilarr_application::{CompiledPattern, PatternLookupError, PatternRegistry};
use profilarr_config::PatternConfig;
use regex::RegexBuilder;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

type Resolved = Result<Arc<CompiledPattern>, PatternLookupError>;

pub struct RegexPatternRegistry {
    sources: RwLock<HashMap<String, String>>,
    compiled: Cache<String, Resolved>,
    config: PatternConfig,
}

impl RegexPatternRegistry {
    pub fn new(config: PatternConfig) -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
            compiled: Cache::new(config.cache_capacity),
            config,
        }
    }

    pub fn from_sources<I, K, V>(config: PatternConfig, sources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let registry = Self::new(config);
        for (name, source) in sources {
            registry.register(name, source);
        }
        registry
    }

    /// Add or replace a named pattern. A replaced pattern is recompiled on
    /// its next lookup.
    pub fn register(&self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        // invalidate under the write guard so no lookup can cache the old source
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        sources.insert(name.clone(), source.into());
        self.compiled.invalidate(&name);
    }

    pub fn unregister(&self, name: &str) -> Option<String> {
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        let removed = sources.remove(name);
        self.compiled.invalidate(name);
        removed
    }

    pub fn len(&self) -> usize {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn compile(&self, name: &str, source: &str) -> Resolved {
        RegexBuilder::new(source)
            .case_insensitive(self.config.case_insensitive)
            .size_limit(self.config.size_limit_bytes)
            .build()
            .map(|regex| {
                debug!(target: "patterns", pattern = name, "pattern compiled");
                Arc::new(CompiledPattern::new(regex))
            })
            .map_err(|e| {
                warn!(target: "patterns", pattern = name, error = %e, "pattern failed to compile");
                PatternLookupError::Invalid {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            })
    }
}

impl PatternRegistry for RegexPatternRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<CompiledPattern>, PatternLookupError> {
        if let Some(cached) = self.compiled.get(name) {
            return cached;
        }

        // the read guard is held until the result is cached, so register()
        // cannot swap the source in between
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        // unknown names are not cached so a later register() is picked up
        let source = sources
            .get(name)
            .ok_or_else(|| PatternLookupError::NotFound(name.to_string()))?;

        let resolved = self.compile(name, source);
        self.compiled.insert(name.to_string(), resolved.clone());
        resolved
    }
}
