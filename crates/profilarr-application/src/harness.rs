// SPDX-License-Identifier: GPL-3.0-or-later

//! Regression runner for authored custom formats.
//!
//! Each test case input is treated as the title of an otherwise empty
//! release, so only title-pattern conditions can match it; every other
//! condition sees unset fields and contributes `false` unless negated.

use crate::combinator::{evaluate_format, ConditionResult};
use crate::diagnostics::Diagnostics;
use crate::evaluator::{ConditionEvaluator, MatchSpan};
use crate::patterns::PatternRegistry;
use profilarr_domain::{CustomFormat, ReleaseDescriptor, TestCase, TestCaseId};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HarnessError {
    #[error("test case id {id} appears more than once in format '{format}'")]
    DuplicateTestCaseId { format: String, id: TestCaseId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub id: TestCaseId,
    pub input: String,
    pub expected: bool,
    /// Whether the format applied to the input.
    pub actual: bool,
    pub passed: bool,
    pub conditions: Vec<ConditionResult>,
    /// Match of the first title-pattern condition, when it matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<MatchSpan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessReport {
    pub format: String,
    pub results: Vec<TestResult>,
    pub diagnostics: Diagnostics,
}

impl HarnessReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}

pub struct TestHarness<'r> {
    evaluator: ConditionEvaluator<'r>,
}

impl<'r> TestHarness<'r> {
    pub fn new(registry: &'r dyn PatternRegistry) -> Self {
        Self {
            evaluator: ConditionEvaluator::new(registry),
        }
    }

    /// Run `cases` against one snapshot of `format`.
    ///
    /// Fails only when test case ids collide, which makes the batch
    /// ambiguous; pattern problems are reported as diagnostics instead.
    pub fn run(
        &self,
        format: &CustomFormat,
        cases: &[TestCase],
    ) -> Result<HarnessReport, HarnessError> {
        let mut seen = HashSet::with_capacity(cases.len());
        if let Some(duplicate) = cases.iter().find(|case| !seen.insert(case.id)) {
            return Err(HarnessError::DuplicateTestCaseId {
                format: format.name.clone(),
                id: duplicate.id,
            });
        }

        let mut diagnostics = Diagnostics::new();
        let results: Vec<TestResult> = cases
            .iter()
            .map(|case| self.run_case(format, case, &mut diagnostics))
            .collect();

        let report = HarnessReport {
            format: format.name.clone(),
            results,
            diagnostics,
        };

        info!(
            target: "harness",
            format = %format.name,
            total = report.results.len(),
            passed = report.passed(),
            failed = report.failed(),
            diagnostics = report.diagnostics.len(),
            "test run complete"
        );

        Ok(report)
    }

    /// Run the test cases stored on `format` itself.
    pub fn run_stored(&self, format: &CustomFormat) -> Result<HarnessReport, HarnessError> {
        self.run(format, &format.tests)
    }

    fn run_case(
        &self,
        format: &CustomFormat,
        case: &TestCase,
        diagnostics: &mut Diagnostics,
    ) -> TestResult {
        let release = ReleaseDescriptor::from_title(case.input.as_str());
        let evaluation = evaluate_format(&self.evaluator, format, &release, diagnostics);

        let span = evaluation
            .conditions
            .iter()
            .find(|c| c.title_pattern)
            .and_then(|c| c.span);

        let passed = evaluation.applies == case.expected;
        debug!(
            target: "harness",
            format = %format.name,
            test_id = case.id,
            expected = case.expected,
            actual = evaluation.applies,
            passed,
            "test case evaluated"
        );

        TestResult {
            id: case.id,
            input: case.input.clone(),
            expected: case.expected,
            actual: evaluation.applies,
            passed,
            conditions: evaluation.conditions,
            span,
        }
    }
}
