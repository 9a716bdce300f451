//! Incremental parser for the krazy2 XML report.
//!
//! The report arrives as text chunks. Each `feed` appends to a buffer and
//! reads as many complete XML events as the buffer holds; markup cut at the
//! end of a chunk, and text that could still grow, stay buffered for the next
//! feed. Feeding a report in pieces therefore builds exactly what a single
//! feed of the whole text builds.
//!
//! Recognized shape (other elements are ignored):
//!
//! ```xml
//! <file-type value="cpp">
//!   <check desc="Check for foo [foo]...">
//!     <explanation>Why foo matters.</explanation>
//!     <file name="src/a.cpp">
//!       <message>default message</message>
//!       <issues><line issue="context [short message]">42</line></issues>
//!     </file>
//!   </check>
//! </file-type>
//! ```

use crate::models::{AnalysisResults, Checker, CheckerId, Diagnostic, Issue};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

static CHECK_DESC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(.*) \[(.*)\]\.\.\.").expect("valid check desc regex"));
static BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[(.*)\]").expect("valid brackets regex"));

#[derive(Debug, Default)]
/// Streaming builder of `AnalysisResults` from report XML.
pub struct ResultParser {
    buffer: String,
    working_dir: String,
    results: AnalysisResults,
    file_type: String,
    checker: Option<CheckerId>,
    checker_is_new: bool,
    file_name: String,
    message: String,
    text: String,
    diagnostics: Vec<Diagnostic>,
}

impl ResultParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory relative file names in the report are resolved against.
    pub fn set_working_directory(&mut self, working_dir: &str) {
        self.working_dir = working_dir.to_string();
        if !self.working_dir.is_empty() && !self.working_dir.ends_with('/') {
            self.working_dir.push('/');
        }
    }

    pub fn working_directory(&self) -> &str {
        &self.working_dir
    }

    /// Bind the collection to fill, returning the one bound before.
    pub fn set_analysis_results(&mut self, results: AnalysisResults) -> AnalysisResults {
        std::mem::replace(&mut self.results, results)
    }

    pub fn results(&self) -> &AnalysisResults {
        &self.results
    }

    pub fn into_results(self) -> AnalysisResults {
        self.results
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Append `chunk` and process every event it completes.
    pub fn feed(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
        let buffer = std::mem::take(&mut self.buffer);
        let consumed = self.process(&buffer);
        self.buffer = buffer;
        self.buffer.drain(..consumed);
    }

    /// Flag input left over once the report is complete.
    pub fn finish(&mut self) {
        let rest = self.buffer.trim();
        if !rest.is_empty() {
            let preview: String = rest.chars().take(40).collect();
            self.malformed(format!("report ends with unparsable input: '{preview}'"));
        }
        debug!(
            checkers = self.results.checkers().len(),
            issues = self.results.issues().len(),
            "report parsed"
        );
    }

    /// Handle the complete events at the head of `input`; returns how many
    /// bytes were consumed.
    fn process(&mut self, input: &str) -> usize {
        let mut reader = Reader::from_str(input);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut committed = 0;
        let mut pending_text: Option<String> = None;
        loop {
            let event = reader.read_event();
            let position = reader.buffer_position() as usize;
            match event {
                Ok(Event::Eof) | Err(_) => break,
                Ok(Event::Text(e)) => {
                    let text = match e.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(_) => String::from_utf8_lossy(&e).into_owned(),
                    };
                    // Complete only once the next markup has been read.
                    pending_text = Some(text);
                    continue;
                }
                Ok(event) => {
                    if let Some(text) = pending_text.take() {
                        self.text = text;
                    }
                    self.handle(event);
                }
            }
            committed = position;
        }
        committed
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(e) => {
                self.start_element(&e);
                self.text.clear();
            }
            Event::Empty(e) => {
                self.start_element(&e);
                self.text.clear();
                self.end_element(e.local_name().as_ref());
                self.text.clear();
            }
            Event::End(e) => {
                self.end_element(e.local_name().as_ref());
                self.text.clear();
            }
            Event::CData(e) => {
                self.text = String::from_utf8_lossy(&e).into_owned();
            }
            _ => {}
        }
    }

    fn start_element(&mut self, element: &BytesStart<'_>) {
        match element.local_name().as_ref() {
            b"file-type" => {
                self.file_type = attribute(element, "value").unwrap_or_default();
            }
            b"check" => {
                let desc = attribute(element, "desc").unwrap_or_default();
                self.start_check(&desc);
            }
            b"file" => {
                let name = attribute(element, "name").unwrap_or_default();
                self.file_name = resolve_file_name(&self.working_dir, &name);
            }
            b"line" => {
                if let Some(issue) = attribute(element, "issue") {
                    self.message = match BRACKETS.captures(&issue) {
                        Some(caps) => caps[1].to_string(),
                        None => issue,
                    };
                }
            }
            _ => {}
        }
    }

    fn end_element(&mut self, name: &[u8]) {
        match name {
            b"explanation" => {
                if !self.checker_is_new {
                    return;
                }
                let explanation = self.text.clone();
                if let Some(checker) = self.checker.and_then(|id| self.results.checker_mut(id)) {
                    checker.explanation = explanation;
                }
            }
            b"message" => self.message = self.text.clone(),
            b"line" => self.end_line(),
            _ => {}
        }
    }

    fn start_check(&mut self, desc: &str) {
        let (description, name) = match CHECK_DESC.captures(desc) {
            Some(caps) => (caps[1].to_string(), caps[2].to_string()),
            None => {
                self.malformed(format!(
                    "check description '{desc}' is not '<description> [<name>]...'"
                ));
                (String::new(), String::new())
            }
        };

        match self.results.find_checker(&self.file_type, &name) {
            Some(id) => {
                self.checker = Some(id);
                self.checker_is_new = false;
            }
            None => {
                debug!(file_type = %self.file_type, checker = %name, "new checker");
                let checker = Checker::new(&self.file_type, &name, &description);
                self.checker = Some(self.results.add_checker(checker));
                self.checker_is_new = true;
            }
        }
    }

    fn end_line(&mut self) {
        let line = match self.text.trim().parse::<u32>() {
            Ok(line) => line,
            Err(_) => {
                self.malformed(format!("line number '{}' is not a number", self.text));
                0
            }
        };
        let Some(checker) = self.checker else {
            self.malformed(format!(
                "issue at {}:{} appears outside any check",
                self.file_name, line
            ));
            return;
        };
        self.results.add_issue(Issue {
            checker,
            file_name: self.file_name.clone(),
            line,
            message: self.message.clone(),
        });
    }

    fn malformed(&mut self, message: String) {
        warn!(%message, "malformed krazy2 report");
        self.diagnostics.push(Diagnostic::malformed(message));
    }
}

/// Attribute value with literal line breaks and tabs folded to spaces, as
/// XML attribute-value normalization requires, then unescaped.
fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    let attr = element.try_get_attribute(name).ok().flatten()?;
    let raw: String = String::from_utf8_lossy(&attr.value)
        .replace("\r\n", "\n")
        .chars()
        .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
        .collect();
    Some(match unescape(&raw) {
        Ok(value) => value.into_owned(),
        Err(_) => raw,
    })
}

/// Resolve a report file name against a working directory ending in `/`.
///
/// Absolute names, and any name when the working directory is empty, are
/// returned unchanged.
pub fn resolve_file_name(working_dir: &str, name: &str) -> String {
    if working_dir.is_empty() || name.starts_with('/') || Path::new(name).is_absolute() {
        return name.to_string();
    }
    remove_dot_segments(&format!("{working_dir}{name}"))
}

fn remove_dot_segments(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "." => {}
            ".." => {
                if segments.len() > usize::from(absolute) {
                    segments.pop();
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
