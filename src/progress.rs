//! Progress tracking from the live krazy2 status stream.
//!
//! krazy2 prints one line per checker, e.g.
//! `=>cpp/spelling test in-progress.......done`, and announces skipped
//! inputs with `Cannot access file ...` / `Unsupported file type ... skipping`
//! lines. The stream arrives in arbitrary chunks; `ProgressParser` keeps the
//! unconsumed tail between feeds and turns recognized pieces into
//! `ProgressEvent`s.
//!
//! Dots give sub-checker progress only once a file type has completed a
//! checker in this run: the dot count of that first checker becomes the
//! expected count for later checkers of the same type.

use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, trace};

const CANNOT_ACCESS: &[u8] = b"Cannot access file ";
const UNSUPPORTED: &[u8] = b"Unsupported file type ";
const SKIPPING: &[u8] = b"skipping\n";
const FILE_TYPE_MARK: &[u8] = b"=>";
const IN_PROGRESS: &[u8] = b" test in-progress";
const DONE: &[u8] = b"done\n";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Events emitted while tracking a run.
pub enum ProgressEvent {
    Progress { min: usize, max: usize, value: usize },
    StatusMessage(String),
    ClearMessage,
    Completed,
}

impl ProgressEvent {
    /// Progress on the fixed 0..=100 scale.
    pub fn percent(value: usize) -> Self {
        Self::Progress {
            min: 0,
            max: 100,
            value,
        }
    }
}

/// Receiver of progress events.
pub trait ProgressSink {
    fn on_event(&mut self, event: ProgressEvent);
}

impl ProgressSink for Vec<ProgressEvent> {
    fn on_event(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn on_event(&mut self, event: ProgressEvent) {
        self(event)
    }
}

#[derive(Debug, Default)]
/// Incremental parser for the krazy2 status stream.
pub struct ProgressParser {
    buffer: Vec<u8>,
    head: usize,
    file_type: String,
    file_type_dots: HashMap<String, usize>,
    current_dots: usize,
    checkers_run: usize,
    checkers: Option<usize>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label for the whole job.
    pub fn status_name(&self) -> &'static str {
        "Running krazy2"
    }

    /// Set the number of checkers krazy2 will run. Must be called once,
    /// before the first `feed`.
    pub fn configure(&mut self, number_of_checkers: usize) -> Result<()> {
        if number_of_checkers == 0 {
            return Err(Error::InvalidCheckerCount(number_of_checkers));
        }
        if let Some(n) = self.checkers {
            return Err(Error::InvalidState(format!(
                "progress parser already configured for {n} checkers"
            )));
        }
        self.checkers = Some(number_of_checkers);
        Ok(())
    }

    pub fn start(&mut self, sink: &mut dyn ProgressSink) {
        sink.on_event(ProgressEvent::percent(0));
    }

    /// Append `chunk` and consume every complete piece of output in it.
    pub fn feed(&mut self, chunk: &[u8], sink: &mut dyn ProgressSink) -> Result<()> {
        let total = self.checkers.ok_or_else(|| {
            Error::InvalidState("number of checkers must be configured before parsing".into())
        })?;

        self.buffer.extend_from_slice(chunk);

        loop {
            let mut changed = self.discard_cannot_access_file();
            changed |= self.discard_unsupported_file_type();
            changed |= self.parse_file_type();
            changed |= self.parse_checker_name(sink);
            changed |= self.parse_dot(total, sink);
            changed |= self.parse_done(total, sink);
            if !changed {
                break;
            }
        }

        self.buffer.drain(..self.head);
        self.head = 0;
        Ok(())
    }

    /// Report the run as complete, whatever state the parser is in.
    pub fn finish(&mut self, sink: &mut dyn ProgressSink) {
        sink.on_event(ProgressEvent::ClearMessage);
        sink.on_event(ProgressEvent::percent(100));
        sink.on_event(ProgressEvent::Completed);
    }

    /// Dots counted for the first completed checker of `file_type`.
    pub fn expected_dots(&self, file_type: &str) -> Option<usize> {
        self.file_type_dots.get(file_type).copied()
    }

    pub fn current_file_type(&self) -> &str {
        &self.file_type
    }

    pub fn checkers_run(&self) -> usize {
        self.checkers_run
    }

    /// Output received but not consumed yet, decoded one char per byte.
    pub fn pending(&self) -> String {
        latin1(&self.buffer[self.head..])
    }

    fn rest(&self) -> &[u8] {
        &self.buffer[self.head..]
    }

    fn discard_cannot_access_file(&mut self) -> bool {
        self.discard_line(CANNOT_ACCESS, b"\n")
    }

    fn discard_unsupported_file_type(&mut self) -> bool {
        self.discard_line(UNSUPPORTED, SKIPPING)
    }

    fn discard_line(&mut self, prefix: &[u8], terminator: &[u8]) -> bool {
        let rest = self.rest();
        if !rest.starts_with(prefix) || find(rest, terminator).is_none() {
            return false;
        }
        let Some(newline) = find(rest, b"\n") else {
            return false;
        };
        trace!(line = %latin1(&rest[..newline]), "discarding filtered-out file message");
        self.head += newline + 1;
        true
    }

    fn parse_file_type(&mut self) -> bool {
        let rest = self.rest();
        if !rest.starts_with(FILE_TYPE_MARK) {
            return false;
        }
        let Some(slash) = find(rest, b"/") else {
            return false;
        };
        self.file_type = latin1(&rest[FILE_TYPE_MARK.len()..slash]);
        trace!(file_type = %self.file_type, "file type");
        // The slash stays; it opens the checker name.
        self.head += slash;
        true
    }

    fn parse_checker_name(&mut self, sink: &mut dyn ProgressSink) -> bool {
        let rest = self.rest();
        if !rest.starts_with(b"/") || find(rest, IN_PROGRESS).is_none() {
            return false;
        }
        let Some(space) = find(rest, b" ") else {
            return false;
        };
        let name = latin1(&rest[1..space]);
        let consumed = (space + IN_PROGRESS.len()).min(rest.len());
        self.head += consumed;
        trace!(checker = %name, "checker started");
        sink.on_event(ProgressEvent::StatusMessage(format!("Running {name}")));
        true
    }

    fn parse_dot(&mut self, total: usize, sink: &mut dyn ProgressSink) -> bool {
        if !self.rest().starts_with(b".") {
            return false;
        }
        let expected = self.expected_dots(&self.file_type).unwrap_or(0);
        // Not capped: a checker printing more dots than `expected` pushes the
        // value past 100.
        if self.current_dots > 0 && expected > 0 {
            let checker_range = 100 / total;
            let checker_progress = checker_range * self.current_dots / expected;
            let progress = 100 * self.checkers_run / total;
            sink.on_event(ProgressEvent::percent(progress + checker_progress));
        }
        self.head += 1;
        self.current_dots += 1;
        true
    }

    fn parse_done(&mut self, total: usize, sink: &mut dyn ProgressSink) -> bool {
        if !self.rest().starts_with(DONE) {
            return false;
        }
        self.head += DONE.len();

        let expected = self
            .file_type_dots
            .entry(self.file_type.clone())
            .or_insert(0);
        if *expected == 0 {
            *expected = self.current_dots;
        }

        self.checkers_run += 1;
        self.current_dots = 0;
        debug!(
            file_type = %self.file_type,
            run = self.checkers_run,
            total,
            "checker done"
        );
        sink.on_event(ProgressEvent::percent(100 * self.checkers_run / total));
        true
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// One char per byte; good enough for status text.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn configured(n: usize) -> ProgressParser {
        let mut parser = ProgressParser::new();
        parser.configure(n).unwrap();
        parser
    }

    fn feed_all(parser: &mut ProgressParser, chunks: &[&str]) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        for chunk in chunks {
            parser.feed(chunk.as_bytes(), &mut events).unwrap();
        }
        events
    }

    #[test]
    fn test_feed_before_configure_is_invalid_state() {
        let mut parser = ProgressParser::new();
        let mut events = Vec::new();
        let err = parser.feed(b"=>cpp/", &mut events).unwrap_err();
        assert!(err.is_invalid_state());
        assert!(events.is_empty());
    }

    #[test]
    fn test_configure_rejects_zero_and_second_call() {
        let mut parser = ProgressParser::new();
        assert!(matches!(
            parser.configure(0),
            Err(Error::InvalidCheckerCount(0))
        ));
        parser.configure(3).unwrap();
        assert!(parser.configure(4).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_status_name_labels_the_job() {
        assert_eq!(ProgressParser::new().status_name(), "Running krazy2");
    }

    #[test]
    fn test_closure_sink_collects_events() {
        let mut parser = configured(1);
        let mut seen = Vec::new();
        let mut sink = |event: ProgressEvent| seen.push(event);
        parser.start(&mut sink);
        parser
            .feed(b"=>cpp/foo test in-progress..done\n", &mut sink)
            .unwrap();
        parser.finish(&mut sink);
        assert_eq!(
            seen,
            vec![
                ProgressEvent::percent(0),
                ProgressEvent::StatusMessage("Running foo".into()),
                ProgressEvent::percent(100),
                ProgressEvent::ClearMessage,
                ProgressEvent::percent(100),
                ProgressEvent::Completed,
            ]
        );
    }

    #[test]
    fn test_extra_dots_overshoot_the_scale() {
        let mut parser = configured(2);
        let events = feed_all(
            &mut parser,
            &["=>cpp/a test in-progress.done\n=>cpp/b test in-progress.....done\n"],
        );
        let values: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        // base 50, range 50, expected 1 dot: every extra dot adds 50.
        assert_eq!(values, vec![50, 100, 150, 200, 250, 100]);
    }

    #[test]
    fn test_start_and_finish_sequences() {
        let mut parser = ProgressParser::new();
        let mut events = Vec::new();
        parser.start(&mut events);
        parser.finish(&mut events);
        assert_eq!(
            events,
            vec![
                ProgressEvent::percent(0),
                ProgressEvent::ClearMessage,
                ProgressEvent::percent(100),
                ProgressEvent::Completed,
            ]
        );
    }

    #[test]
    fn test_single_checker_records_expected_dots() {
        let mut parser = configured(1);
        let events = feed_all(&mut parser, &["=>cpp/bar test in-progress", "...", "done\n"]);
        assert_eq!(
            events,
            vec![
                ProgressEvent::StatusMessage("Running bar".into()),
                ProgressEvent::percent(100),
            ]
        );
        assert_eq!(parser.expected_dots("cpp"), Some(3));
        assert_eq!(parser.current_file_type(), "cpp");
        assert_eq!(parser.pending(), "");
    }

    #[test]
    fn test_second_checker_of_same_type_reports_dots() {
        let mut parser = configured(2);
        let events = feed_all(
            &mut parser,
            &["=>cpp/foo test in-progress...done\n=>cpp/bar test in-progress...done\n"],
        );
        assert_eq!(
            events,
            vec![
                ProgressEvent::StatusMessage("Running foo".into()),
                ProgressEvent::percent(50),
                ProgressEvent::StatusMessage("Running bar".into()),
                // base 50, checker range 50, 1/3 and 2/3 of it
                ProgressEvent::percent(66),
                ProgressEvent::percent(83),
                ProgressEvent::percent(100),
            ]
        );
    }

    #[test]
    fn test_new_file_type_has_no_dot_progress() {
        let mut parser = configured(2);
        let events = feed_all(
            &mut parser,
            &["=>cpp/foo test in-progress..done\n=>desktop/foo test in-progress..done\n"],
        );
        assert_eq!(
            events,
            vec![
                ProgressEvent::StatusMessage("Running foo".into()),
                ProgressEvent::percent(50),
                ProgressEvent::StatusMessage("Running foo".into()),
                ProgressEvent::percent(100),
            ]
        );
        assert_eq!(parser.expected_dots("desktop"), Some(2));
    }

    #[test]
    fn test_filtered_out_file_messages_are_discarded() {
        let mut parser = configured(1);
        let events = feed_all(
            &mut parser,
            &[
                "Cannot access file /tmp/gone.cpp\n",
                "Unsupported file type /tmp/x.bin, skipping\n",
                "=>cpp/foo test in-progress.done\n",
            ],
        );
        assert_eq!(events.len(), 2);
        assert_eq!(parser.checkers_run(), 1);
        assert_eq!(parser.pending(), "");
    }

    #[test]
    fn test_partial_input_waits_for_more() {
        let mut parser = configured(1);
        let events = feed_all(&mut parser, &["=>cpp/foo test in-prog"]);
        assert!(events.is_empty());
        assert_eq!(parser.pending(), "/foo test in-prog");

        let events = feed_all(&mut parser, &["ress.do"]);
        assert_eq!(events, vec![ProgressEvent::StatusMessage("Running foo".into())]);
        assert_eq!(parser.pending(), "do");

        let events = feed_all(&mut parser, &["ne\n"]);
        assert_eq!(events, vec![ProgressEvent::percent(100)]);
    }

    #[test]
    fn test_unrecognized_output_stays_buffered() {
        let mut parser = configured(1);
        let events = feed_all(&mut parser, &["garbage\n=>cpp/foo test in-progress"]);
        assert!(events.is_empty());
        assert_eq!(parser.pending(), "garbage\n=>cpp/foo test in-progress");
    }

    #[test]
    fn test_chunking_does_not_change_events() {
        let input = "Cannot access file a\n=>cpp/a test in-progress....done\n\
                     =>cpp/b test in-progress....done\n=>cpp/c test in-progress....done\n";

        let mut whole = configured(3);
        let expected = feed_all(&mut whole, &[input]);

        for size in 1..8 {
            let mut parser = configured(3);
            let mut events = Vec::new();
            for chunk in input.as_bytes().chunks(size) {
                parser.feed(chunk, &mut events).unwrap();
            }
            assert_eq!(events, expected, "chunk size {size}");
        }
    }
}
