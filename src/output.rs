//! Output rendering for progress replays and analysis results.
//!
//! Supports `human` (default) and `json` outputs. The JSON form of results
//! lists checkers, issues, diagnostics, and a top-level summary.

use crate::models::{AnalysisResults, Diagnostic, IssueModel};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::utils::use_colors;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

fn describe_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Progress { value, .. } => format!("[{value:>3}%]"),
        ProgressEvent::StatusMessage(text) => text.clone(),
        ProgressEvent::ClearMessage => "(status cleared)".to_string(),
        ProgressEvent::Completed => "completed".to_string(),
    }
}

/// Live progress on stderr while a run is replayed.
pub struct ProgressPrinter {
    enabled: bool,
}

impl ProgressPrinter {
    /// Progress is shown only for human output and when `replaying` a log.
    pub fn new(output: &str, replaying: bool) -> Self {
        Self {
            enabled: replaying && output != "json",
        }
    }
}

impl ProgressSink for ProgressPrinter {
    fn on_event(&mut self, event: ProgressEvent) {
        if self.enabled {
            eprintln!("{}", describe_event(&event));
        }
    }
}

/// Print the events produced by a progress replay.
pub fn print_progress(events: &[ProgressEvent], output: &str) {
    match output {
        "json" => println!("{:#}", compose_progress_json(events)),
        _ => {
            let color = use_colors(output);
            for event in events {
                let line = describe_event(event);
                match event {
                    ProgressEvent::Progress { .. } if color => println!("{}", line.green()),
                    ProgressEvent::Completed if color => println!("{}", line.bold()),
                    _ => println!("{}", line),
                }
            }
        }
    }
}

/// Compose progress JSON (pure) for testing/snapshot purposes.
pub fn compose_progress_json(events: &[ProgressEvent]) -> JsonVal {
    let items: Vec<_> = events
        .iter()
        .map(|e| match e {
            ProgressEvent::Progress { min, max, value } => {
                json!({"event": "progress", "min": min, "max": max, "value": value})
            }
            ProgressEvent::StatusMessage(text) => json!({"event": "status", "message": text}),
            ProgressEvent::ClearMessage => json!({"event": "clear"}),
            ProgressEvent::Completed => json!({"event": "completed"}),
        })
        .collect();
    json!({ "events": items })
}

fn display_path(file: &str, repo_root: &Path) -> String {
    match pathdiff::diff_paths(file, repo_root) {
        Some(rel) if !rel.starts_with("..") && Path::new(file).is_absolute() => {
            rel.to_string_lossy().to_string()
        }
        _ => file.to_string(),
    }
}

/// Print the displayed results as an issue table.
pub fn print_results(
    results: &Arc<AnalysisResults>,
    diagnostics: &[Diagnostic],
    repo_root: &Path,
    output: &str,
) {
    match output {
        "json" => println!("{:#}", compose_results_json(results, diagnostics)),
        _ => {
            let color = use_colors(output);
            let mut model = IssueModel::new();
            model.set_analysis_results(Arc::clone(results));
            for row in 0..model.row_count() {
                let cell = |column| model.data(row, column).unwrap_or_default();
                let location = format!(
                    "{}:{}",
                    display_path(&cell(2), repo_root),
                    cell(3)
                );
                let checker = format!("❲{}❳", cell(0));
                if color {
                    println!("{} {} {}", location.bold(), checker.yellow(), cell(1));
                } else {
                    println!("{} {} {}", location, checker, cell(1));
                }
            }
            for d in diagnostics {
                if color {
                    eprintln!("{} {}", "malformed report:".yellow().bold(), d.message);
                } else {
                    eprintln!("malformed report: {}", d.message);
                }
            }
            let summary = format!(
                "— Summary — checkers={} issues={} files={}",
                results.checkers().len(),
                results.issues().len(),
                distinct_files(results)
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

fn distinct_files(results: &AnalysisResults) -> usize {
    results
        .issues()
        .iter()
        .map(|i| i.file_name.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Compose results JSON object (pure) for testing/snapshot purposes.
pub fn compose_results_json(results: &AnalysisResults, diagnostics: &[Diagnostic]) -> JsonVal {
    let issues: Vec<_> = results
        .issues()
        .iter()
        .map(|i| {
            let checker = results.checker(i.checker);
            json!({
                "checker": checker.map(|c| c.name.as_str()),
                "fileType": checker.map(|c| c.file_type.as_str()),
                "file": i.file_name,
                "line": i.line,
                "message": i.message,
            })
        })
        .collect();
    let summary = json!({
        "checkers": results.checkers().len(),
        "issues": results.issues().len(),
        "files": distinct_files(results),
        "diagnostics": diagnostics.len(),
    });
    json!({
        "checkers": results.checkers(),
        "issues": issues,
        "diagnostics": diagnostics,
        "summary": summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Checker, Issue};

    #[test]
    fn test_compose_results_json_shape() {
        let mut res = AnalysisResults::new();
        let id = res.add_checker(Checker::new("cpp", "spelling", "Check spelling"));
        for line in [3, 9] {
            res.add_issue(Issue {
                checker: id,
                file_name: "/p/a.cpp".into(),
                line,
                message: "recieve".into(),
            });
        }
        let diags = vec![Diagnostic::malformed("line number 'x' is not a number")];
        let out = compose_results_json(&res, &diags);
        assert_eq!(out["summary"]["issues"], 2);
        assert_eq!(out["summary"]["files"], 1);
        assert_eq!(out["summary"]["diagnostics"], 1);
        assert_eq!(out["checkers"][0]["file_type"], "cpp");
        assert_eq!(out["issues"][1]["checker"], "spelling");
        assert_eq!(out["issues"][1]["line"], 9);
        assert_eq!(out["diagnostics"][0]["kind"], "malformedReport");
    }

    #[test]
    fn test_compose_progress_json_events() {
        let events = vec![
            ProgressEvent::percent(0),
            ProgressEvent::StatusMessage("Running spelling".into()),
            ProgressEvent::Completed,
        ];
        let out = compose_progress_json(&events);
        assert_eq!(out["events"][0]["value"], 0);
        assert_eq!(out["events"][1]["message"], "Running spelling");
        assert_eq!(out["events"][2]["event"], "completed");
    }

    #[test]
    fn test_display_path_relative_to_repo_root() {
        let root = Path::new("/home/user/project");
        assert_eq!(display_path("/home/user/project/src/a.cpp", root), "src/a.cpp");
        assert_eq!(display_path("/elsewhere/b.cpp", root), "/elsewhere/b.cpp");
        assert_eq!(display_path("rel/c.cpp", root), "rel/c.cpp");
    }
}
