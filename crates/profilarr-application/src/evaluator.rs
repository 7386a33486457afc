// SPDX-License-Identifier: GPL-3.0-or-later

//! Single-condition evaluation against a release descriptor.
//!
//! Evaluation is total and fails closed: an unset condition value, an absent
//! descriptor field, or an unresolvable pattern all produce a non-match. Only
//! pattern lookup failures are recorded as diagnostics.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::patterns::{PatternLookupError, PatternRegistry};
use profilarr_domain::{Condition, ConditionKind, ReleaseDescriptor};
use serde::Serialize;
use tracing::{trace, warn};

/// Matched substring, in character offsets of the evaluated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    fn from_byte_range(haystack: &str, start: usize, end: usize) -> Self {
        let start_chars = haystack[..start].chars().count();
        let len_chars = haystack[start..end].chars().count();
        Self {
            start: start_chars,
            end: start_chars + len_chars,
        }
    }
}

/// Result of evaluating one condition, before and after `negate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionOutcome {
    pub matched: bool,
    pub negate: bool,
    /// Present only for a matching pattern-based condition.
    pub span: Option<MatchSpan>,
}

impl ConditionOutcome {
    fn unmatched(negate: bool) -> Self {
        Self {
            matched: false,
            negate,
            span: None,
        }
    }

    /// `matched XOR negate`, the value the combinator consumes.
    pub fn signed(&self) -> bool {
        self.matched != self.negate
    }
}

/// Evaluates conditions using patterns from a registry.
#[derive(Clone, Copy)]
pub struct ConditionEvaluator<'r> {
    registry: &'r dyn PatternRegistry,
}

impl<'r> ConditionEvaluator<'r> {
    pub fn new(registry: &'r dyn PatternRegistry) -> Self {
        Self { registry }
    }

    /// Signed result of `condition` against `release`.
    pub fn evaluate(
        &self,
        condition: &Condition,
        release: &ReleaseDescriptor,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        self.evaluate_detailed(condition, release, diagnostics).signed()
    }

    pub fn evaluate_detailed(
        &self,
        condition: &Condition,
        release: &ReleaseDescriptor,
        diagnostics: &mut Diagnostics,
    ) -> ConditionOutcome {
        let outcome = match &condition.kind {
            ConditionKind::ReleaseTitle { pattern } => self.match_pattern(
                condition,
                pattern.as_deref(),
                Some(release.title.as_str()),
                diagnostics,
            ),
            ConditionKind::ReleaseGroup { pattern } => self.match_pattern(
                condition,
                pattern.as_deref(),
                Some(release.release_group.as_str()),
                diagnostics,
            ),
            ConditionKind::Edition { pattern } => self.match_pattern(
                condition,
                pattern.as_deref(),
                release.edition.as_deref(),
                diagnostics,
            ),
            ConditionKind::Language {
                language,
                except_language,
            } => {
                let matched = match language.as_deref().map(str::trim) {
                    Some(code) if !code.is_empty() => {
                        let present = release
                            .languages
                            .iter()
                            .any(|l| l.eq_ignore_ascii_case(code));
                        present != *except_language
                    }
                    _ => false,
                };
                ConditionOutcome {
                    matched,
                    negate: condition.negate,
                    span: None,
                }
            }
            ConditionKind::IndexerFlag { flag } => self.plain(
                condition,
                flag.map_or(false, |flag| release.indexer_flags.contains(&flag)),
            ),
            ConditionKind::Source { source } => {
                self.plain(condition, source.is_some() && *source == release.source)
            }
            ConditionKind::Resolution { resolution } => self.plain(
                condition,
                resolution.is_some() && *resolution == release.resolution,
            ),
            ConditionKind::QualityModifier { modifier } => self.plain(
                condition,
                modifier.is_some() && *modifier == release.quality_modifier,
            ),
            ConditionKind::ReleaseType { release_type } => self.plain(
                condition,
                release_type.is_some() && *release_type == release.release_type,
            ),
            ConditionKind::Size {
                min_size,
                max_size,
                unit,
            } => {
                let matched = match (release.size_bytes, min_size, max_size) {
                    (_, None, None) | (None, _, _) => false,
                    (Some(size), min, max) => {
                        min.map_or(true, |min| size >= unit.to_bytes(min))
                            && max.map_or(true, |max| size <= unit.to_bytes(max))
                    }
                };
                self.plain(condition, matched)
            }
            ConditionKind::Year { min_year, max_year } => {
                let matched = match (release.year, min_year, max_year) {
                    (_, None, None) | (None, _, _) => false,
                    (Some(year), min, max) => {
                        min.map_or(true, |min| year >= min) && max.map_or(true, |max| year <= max)
                    }
                };
                self.plain(condition, matched)
            }
        };

        trace!(
            target: "evaluator",
            condition = %condition.name,
            condition_type = condition.kind.type_name(),
            matched = outcome.matched,
            negate = outcome.negate,
            "condition evaluated"
        );

        outcome
    }

    fn plain(&self, condition: &Condition, matched: bool) -> ConditionOutcome {
        ConditionOutcome {
            matched,
            negate: condition.negate,
            span: None,
        }
    }

    fn match_pattern(
        &self,
        condition: &Condition,
        pattern_name: Option<&str>,
        haystack: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> ConditionOutcome {
        let Some(pattern_name) = pattern_name.filter(|name| !name.trim().is_empty()) else {
            return ConditionOutcome::unmatched(condition.negate);
        };

        let pattern = match self.registry.resolve(pattern_name) {
            Ok(pattern) => pattern,
            Err(error) => {
                warn!(
                    target: "evaluator",
                    condition = %condition.name,
                    pattern = pattern_name,
                    error = %error,
                    "pattern lookup failed; condition treated as unmatched"
                );
                let kind = match error {
                    PatternLookupError::NotFound(_) => DiagnosticKind::UnknownPattern,
                    PatternLookupError::Invalid { reason, .. } => {
                        DiagnosticKind::InvalidPattern { reason }
                    }
                };
                diagnostics.push(Diagnostic {
                    format: None,
                    condition: condition.name.clone(),
                    pattern: pattern_name.to_string(),
                    kind,
                });
                return ConditionOutcome::unmatched(condition.negate);
            }
        };

        let Some(haystack) = haystack.filter(|h| !h.is_empty()) else {
            return ConditionOutcome::unmatched(condition.negate);
        };

        match pattern.find(haystack) {
            Some((start, end)) => ConditionOutcome {
                matched: true,
                negate: condition.negate,
                span: Some(MatchSpan::from_byte_range(haystack, start, end)),
            },
            None => ConditionOutcome::unmatched(condition.negate),
        }
    }
}
