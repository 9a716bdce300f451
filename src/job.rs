//! One analysis run: progress tracking while krazy2 runs, report parsing once
//! it is done, and installing the finished results for display.
//!
//! The run does not launch krazy2 itself; whoever owns the process feeds the
//! status stream and the report text in as they arrive.

use crate::error::Result;
use crate::models::{AnalysisResults, CurrentResults, Diagnostic};
use crate::progress::{ProgressParser, ProgressSink};
use crate::report::ResultParser;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a finished run.
#[derive(Debug)]
pub struct RunOutcome {
    /// The installed results, or `None` when the run failed.
    pub results: Option<Arc<AnalysisResults>>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct AnalysisRun {
    progress: ProgressParser,
    report: ResultParser,
}

impl AnalysisRun {
    /// Prepare a run over `working_dir` with `checkers` checkers.
    pub fn new(working_dir: &str, checkers: usize) -> Result<Self> {
        let mut progress = ProgressParser::new();
        progress.configure(checkers)?;
        let mut report = ResultParser::new();
        report.set_working_directory(working_dir);
        Ok(Self { progress, report })
    }

    pub fn status_name(&self) -> &'static str {
        self.progress.status_name()
    }

    pub fn start(&mut self, sink: &mut dyn ProgressSink) {
        self.progress.start(sink);
    }

    pub fn feed_progress(&mut self, chunk: &[u8], sink: &mut dyn ProgressSink) -> Result<()> {
        self.progress.feed(chunk, sink)
    }

    pub fn feed_report(&mut self, chunk: &str) {
        self.report.feed(chunk);
    }

    /// End the run. A successful run reports 100%, and its results replace
    /// the displayed ones in `current`; the replaced set is released after
    /// the swap. A failed run leaves `current` untouched.
    pub fn finish(
        mut self,
        success: bool,
        sink: &mut dyn ProgressSink,
        current: &CurrentResults,
    ) -> RunOutcome {
        if !success {
            warn!("analysis failed; discarding partial results");
            return RunOutcome {
                results: None,
                diagnostics: self.report.diagnostics().to_vec(),
            };
        }

        self.report.finish();
        self.progress.finish(sink);
        let diagnostics = self.report.diagnostics().to_vec();
        let results = Arc::new(self.report.into_results());
        info!(
            checkers = results.checkers().len(),
            issues = results.issues().len(),
            "installing analysis results"
        );
        let previous = current.install(Arc::clone(&results));
        drop(previous);

        RunOutcome {
            results: Some(results),
            diagnostics,
        }
    }
}
