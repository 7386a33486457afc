// SPDX-License-Identifier: GPL-3.0-or-later

//! Custom format matching and scoring engine.
//!
//! Release descriptor → condition evaluator → format combinator → scoring →
//! upgrade decision. The test harness drives the same evaluator and
//! combinator from stored fixtures. Every stage is a pure function of its
//! inputs; callers may fan work out across threads freely.

pub mod combinator;
pub mod diagnostics;
pub mod evaluator;
pub mod harness;
pub mod patterns;
pub mod scoring;
pub mod upgrade;

pub use combinator::{applies, combine, evaluate_format, ConditionResult, FormatEvaluation};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use evaluator::{ConditionEvaluator, ConditionOutcome, MatchSpan};
pub use harness::{HarnessError, HarnessReport, TestHarness, TestResult};
pub use patterns::{CompiledPattern, PatternLookupError, PatternRegistry, StaticPatternRegistry};
pub use scoring::{ScoreBreakdown, ScoringEngine};
pub use upgrade::{decide, explain_decision, DecisionReason, UpgradeDecision};
