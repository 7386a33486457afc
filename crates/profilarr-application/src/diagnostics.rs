// SPDX-License-Identifier: GPL-3.0-or-later

//! Side-channel problems found while evaluating, surfaced to format authors.
//! Recording a diagnostic never changes an evaluation result.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnknownPattern,
    InvalidPattern { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Owning custom format, once known.
    pub format: Option<String>,
    pub condition: String,
    pub pattern: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(format) = &self.format {
            write!(f, "[{format}] ")?;
        }
        match &self.kind {
            DiagnosticKind::UnknownPattern => write!(
                f,
                "condition '{}' references unknown pattern '{}'",
                self.condition, self.pattern
            ),
            DiagnosticKind::InvalidPattern { reason } => write!(
                f,
                "condition '{}' references invalid pattern '{}': {}",
                self.condition, self.pattern, reason
            ),
        }
    }
}

/// Deduplicated, insertion-ordered diagnostic list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if !self.0.contains(&diagnostic) {
            self.0.push(diagnostic);
        }
    }

    /// Move `other` into `self`, attributing unowned entries to `format`.
    pub fn absorb(&mut self, format: &str, other: Diagnostics) {
        for mut diagnostic in other.0 {
            diagnostic.format.get_or_insert_with(|| format.to_string());
            self.push(diagnostic);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
