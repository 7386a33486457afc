// SPDX-License-Identifier: GPL-3.0-or-later

//! Reduces per-condition results of a custom format to a single "applies".
//!
//! Required conditions are hard gates: every one must hold. Optional
//! conditions form one alternative group: at least one must hold, unless
//! there are none. A format without conditions never applies.

use crate::diagnostics::Diagnostics;
use crate::evaluator::{ConditionEvaluator, MatchSpan};
use profilarr_domain::{CustomFormat, ReleaseDescriptor};
use serde::Serialize;
use tracing::debug;

/// Per-condition detail kept for authoring surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionResult {
    pub name: String,
    pub condition_type: &'static str,
    pub required: bool,
    pub negate: bool,
    /// Raw match before `negate`.
    pub matched: bool,
    /// Signed result (`matched XOR negate`).
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<MatchSpan>,
    #[serde(skip)]
    pub title_pattern: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatEvaluation {
    pub applies: bool,
    pub conditions: Vec<ConditionResult>,
}

/// Combine `(required, signed)` pairs. The whole sequence is consumed even
/// once the outcome is known.
pub fn combine<I>(signed_results: I) -> bool
where
    I: IntoIterator<Item = (bool, bool)>,
{
    let mut seen_any = false;
    let mut required_hold = true;
    let mut has_optional = false;
    let mut optional_hold = false;

    for (required, signed) in signed_results {
        seen_any = true;
        if required {
            required_hold &= signed;
        } else {
            has_optional = true;
            optional_hold |= signed;
        }
    }

    seen_any && required_hold && (!has_optional || optional_hold)
}

/// Evaluate every condition of `format` and combine the results.
pub fn evaluate_format(
    evaluator: &ConditionEvaluator<'_>,
    format: &CustomFormat,
    release: &ReleaseDescriptor,
    diagnostics: &mut Diagnostics,
) -> FormatEvaluation {
    let mut local = Diagnostics::new();
    let conditions: Vec<ConditionResult> = format
        .conditions
        .iter()
        .map(|condition| {
            let outcome = evaluator.evaluate_detailed(condition, release, &mut local);
            ConditionResult {
                name: condition.name.clone(),
                condition_type: condition.kind.type_name(),
                required: condition.required,
                negate: condition.negate,
                matched: outcome.matched,
                passed: outcome.signed(),
                span: outcome.span,
                title_pattern: condition.kind.is_title_pattern(),
            }
        })
        .collect();
    diagnostics.absorb(&format.name, local);

    let applies = combine(conditions.iter().map(|c| (c.required, c.passed)));

    debug!(
        target: "combinator",
        format = %format.name,
        conditions = conditions.len(),
        applies,
        "format evaluated"
    );

    FormatEvaluation {
        applies,
        conditions,
    }
}

/// Whether `format` applies to `release`.
pub fn applies(
    evaluator: &ConditionEvaluator<'_>,
    format: &CustomFormat,
    release: &ReleaseDescriptor,
    diagnostics: &mut Diagnostics,
) -> bool {
    evaluate_format(evaluator, format, release, diagnostics).applies
}
