//! Row/column view over the displayed results.

use super::{AnalysisResults, Issue};
use std::sync::Arc;

/// Columns shown for every issue, in display order.
pub const COLUMNS: [&str; 4] = ["Checker", "Message", "File", "Line"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where to open an issue in an editor. `line` is 0-based.
pub struct SourceLocation {
    pub file_name: String,
    pub line: u32,
}

#[derive(Debug, Default)]
/// Table model exposing one row per issue.
pub struct IssueModel {
    results: Option<Arc<AnalysisResults>>,
}

impl IssueModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analysis_results(&self) -> Option<&Arc<AnalysisResults>> {
        self.results.as_ref()
    }

    /// Show `results`, returning the set shown before.
    pub fn set_analysis_results(
        &mut self,
        results: Arc<AnalysisResults>,
    ) -> Option<Arc<AnalysisResults>> {
        self.results.replace(results)
    }

    pub fn row_count(&self) -> usize {
        self.results.as_ref().map_or(0, |r| r.issues().len())
    }

    pub fn column_count(&self) -> usize {
        COLUMNS.len()
    }

    pub fn header(&self, column: usize) -> Option<&'static str> {
        COLUMNS.get(column).copied()
    }

    pub fn issue_for_row(&self, row: usize) -> Option<&Issue> {
        self.results.as_ref()?.issues().get(row)
    }

    pub fn data(&self, row: usize, column: usize) -> Option<String> {
        let results = self.results.as_ref()?;
        let issue = results.issues().get(row)?;
        match column {
            0 => results.checker(issue.checker).map(|c| c.name.clone()),
            1 => Some(issue.message.clone()),
            2 => Some(issue.file_name.clone()),
            3 => Some(issue.line.to_string()),
            _ => None,
        }
    }

    /// Location to open when a row is activated.
    pub fn location_for_row(&self, row: usize) -> Option<SourceLocation> {
        let issue = self.issue_for_row(row)?;
        Some(SourceLocation {
            file_name: issue.file_name.clone(),
            line: issue.line.saturating_sub(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Checker;

    fn sample() -> Arc<AnalysisResults> {
        let mut res = AnalysisResults::new();
        let id = res.add_checker(Checker::new("cpp", "qclasses", "Check for Q classes"));
        res.add_issue(Issue {
            checker: id,
            file_name: "/home/user/project/main.cpp".into(),
            line: 12,
            message: "QSortedList".into(),
        });
        Arc::new(res)
    }

    #[test]
    fn test_empty_model_has_no_rows() {
        let model = IssueModel::new();
        assert_eq!(model.row_count(), 0);
        assert_eq!(model.column_count(), 4);
        assert!(model.data(0, 0).is_none());
        assert!(model.location_for_row(0).is_none());
    }

    #[test]
    fn test_data_and_location_for_row() {
        let mut model = IssueModel::new();
        assert!(model.set_analysis_results(sample()).is_none());
        assert_eq!(model.row_count(), 1);
        assert_eq!(model.header(2), Some("File"));
        assert_eq!(model.data(0, 0).as_deref(), Some("qclasses"));
        assert_eq!(model.data(0, 1).as_deref(), Some("QSortedList"));
        assert_eq!(model.data(0, 3).as_deref(), Some("12"));
        assert!(model.data(0, 4).is_none());
        assert_eq!(
            model.location_for_row(0),
            Some(SourceLocation {
                file_name: "/home/user/project/main.cpp".into(),
                line: 11,
            })
        );
    }

    #[test]
    fn test_set_analysis_results_returns_previous() {
        let mut model = IssueModel::new();
        let first = sample();
        model.set_analysis_results(Arc::clone(&first));
        let previous = model.set_analysis_results(Arc::new(AnalysisResults::new()));
        assert!(Arc::ptr_eq(&previous.unwrap(), &first));
        assert_eq!(model.row_count(), 0);
    }
}
