//! Results of one analysis run and the slot holding the displayed run.

use super::{Checker, CheckerId, Issue};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
/// All checkers and issues produced by one analysis run.
///
/// Checkers live in a registry keyed by `(file_type, name)`; issues refer to
/// them through `CheckerId`.
pub struct AnalysisResults {
    checkers: Vec<Checker>,
    by_key: HashMap<(String, String), CheckerId>,
    issues: Vec<Issue>,
}

impl AnalysisResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a checker. If one with the same file type and name exists,
    /// the existing id is returned and `checker` is dropped.
    pub fn add_checker(&mut self, checker: Checker) -> CheckerId {
        let key = (checker.file_type.clone(), checker.name.clone());
        if let Some(id) = self.by_key.get(&key) {
            return *id;
        }
        let id = CheckerId(self.checkers.len());
        self.checkers.push(checker);
        self.by_key.insert(key, id);
        id
    }

    pub fn find_checker(&self, file_type: &str, name: &str) -> Option<CheckerId> {
        self.by_key
            .get(&(file_type.to_string(), name.to_string()))
            .copied()
    }

    pub fn checker(&self, id: CheckerId) -> Option<&Checker> {
        self.checkers.get(id.0)
    }

    pub(crate) fn checker_mut(&mut self, id: CheckerId) -> Option<&mut Checker> {
        self.checkers.get_mut(id.0)
    }

    pub fn checkers(&self) -> &[Checker] {
        &self.checkers
    }

    pub fn add_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Issues reported by one checker, in report order.
    pub fn issues_for(&self, id: CheckerId) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.checker == id)
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty() && self.issues.is_empty()
    }
}

#[derive(Debug, Default)]
/// Holds the results currently on display.
///
/// Only complete, immutable sets are installed. Readers get an `Arc` clone,
/// so a set replaced by `install` stays alive until its last reader lets go.
pub struct CurrentResults {
    slot: RwLock<Option<Arc<AnalysisResults>>>,
}

impl CurrentResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<AnalysisResults>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the displayed set and hand back the previous one.
    pub fn install(&self, results: Arc<AnalysisResults>) -> Option<Arc<AnalysisResults>> {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        guard.replace(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(checker: CheckerId, line: u32) -> Issue {
        Issue {
            checker,
            file_name: "/src/a.cpp".into(),
            line,
            message: "msg".into(),
        }
    }

    #[test]
    fn test_checker_registry_dedups_by_file_type_and_name() {
        let mut res = AnalysisResults::new();
        let a = res.add_checker(Checker::new("cpp", "spelling", "Check spelling"));
        let b = res.add_checker(Checker::new("cpp", "spelling", "Other text"));
        let c = res.add_checker(Checker::new("desktop", "spelling", "Check spelling"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(res.checkers().len(), 2);
        assert_eq!(res.find_checker("desktop", "spelling"), Some(c));
        assert_eq!(res.find_checker("qml", "spelling"), None);
        assert_eq!(res.checker(a).unwrap().description, "Check spelling");
    }

    #[test]
    fn test_issues_for_filters_by_checker() {
        let mut res = AnalysisResults::new();
        let a = res.add_checker(Checker::new("cpp", "a", "A"));
        let b = res.add_checker(Checker::new("cpp", "b", "B"));
        res.add_issue(issue(a, 1));
        res.add_issue(issue(b, 2));
        res.add_issue(issue(a, 3));
        let lines: Vec<u32> = res.issues_for(a).map(|i| i.line).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn test_install_keeps_previous_alive_for_readers() {
        let slot = CurrentResults::new();
        assert!(slot.current().is_none());

        let mut first = AnalysisResults::new();
        let id = first.add_checker(Checker::new("cpp", "a", "A"));
        first.add_issue(issue(id, 7));
        assert!(slot.install(Arc::new(first)).is_none());

        let reader = slot.current().unwrap();
        let previous = slot.install(Arc::new(AnalysisResults::new()));
        drop(previous);

        // The old set is still fully readable through the reader's handle.
        assert_eq!(reader.issues().len(), 1);
        assert_eq!(reader.issues()[0].line, 7);
        assert!(slot.current().unwrap().is_empty());
    }
}
