//! Shared data models: checkers, issues, and report diagnostics.

pub mod issue_model;
pub mod results;

pub use issue_model::{IssueModel, SourceLocation};
pub use results::{AnalysisResults, CurrentResults};

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// A named analysis rule scoped to one file type.
pub struct Checker {
    pub file_type: String,
    pub name: String,
    pub description: String,
    pub explanation: String,
}

impl Checker {
    pub fn new(file_type: &str, name: &str, description: &str) -> Self {
        Self {
            file_type: file_type.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            explanation: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
/// Index of a checker inside the `AnalysisResults` that registered it.
pub struct CheckerId(pub(crate) usize);

impl CheckerId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single reported finding.
pub struct Issue {
    pub checker: CheckerId,
    pub file_name: String,
    /// 1-based; 0 when the report carried no usable line number.
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Report content did not have the expected shape; parsing continued.
    MalformedReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A non-fatal problem noticed while parsing a report.
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::MalformedReport,
            message: message.into(),
        }
    }
}
