mod sink;

use std::ops::Range;

pub use codespan_reporting::diagnostic::LabelStyle;
pub use codespan_reporting::diagnostic::Severity;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::ColorChoice;
use codespan_reporting::term::termcolor::StandardStream;
pub use sink::*;

use crate::source::{SourceFileId, SourceFileSet, Span};

#[derive(Debug)]
pub struct Label {
    pub style: LabelStyle,
    pub span: Span,
    pub message: String,
    pub file: Option<SourceFileId>,
}

impl Label {
    pub fn new<O, M>(style: LabelStyle, span: Span, message: O) -> Self
    where
        O: Into<Option<M>>,
        M: Into<String>,
    {
        let message = message.into();
        let message = message.map(|x| x.into());
        Self {
            style,
            span,
            message: message.unwrap_or_default(),
            file: None,
        }
    }

    pub fn primary<O, M>(span: Span, message: O) -> Self
    where
        O: Into<Option<M>>,
        M: Into<String>,
    {
        Self::new(LabelStyle::Primary, span, message)
    }

    pub fn secondary<O, M>(span: Span, message: O) -> Self
    where
        O: Into<Option<M>>,
        M: Into<String>,
    {
        Self::new(LabelStyle::Secondary, span, message)
    }

    /// Points the label into a file other than the diagnostic's own.
    /// Needed for errors that cite both sides of a cross-file conflict.
    pub fn in_file(mut self, file: SourceFileId) -> Self {
        self.file = Some(file);
        self
    }
}

#[derive(Debug)]
pub struct ReplacementSuggestion {
    pub span: Span,
    pub replacement: String,
}

#[derive(Debug)]
pub struct Note {
    pub text: String,
    pub suggestion: Option<ReplacementSuggestion>,
}

impl From<String> for Note {
    fn from(text: String) -> Self {
        Self {
            text,
            suggestion: None,
        }
    }
}

impl From<&str> for Note {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl From<(String, ReplacementSuggestion)> for Note {
    fn from((text, suggestion): (String, ReplacementSuggestion)) -> Self {
        Self {
            text,
            suggestion: Some(suggestion),
        }
    }
}

impl From<(&str, ReplacementSuggestion)> for Note {
    fn from((text, suggestion): (&str, ReplacementSuggestion)) -> Self {
        Self::from((text.to_string(), suggestion))
    }
}

/// A single compiler message: severity, location, labeled spans, notes.
///
/// Diagnostics are collected into sinks rather than returned as `Err`s, so a
/// single compile surfaces as many problems as it can find.
#[derive(Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub source_file: SourceFileId,
    pub labels: Vec<Label>,
    pub notes: Vec<Note>,
}

impl Diagnostic {
    pub fn new(severity: Severity, source_file: SourceFileId, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            source_file,
            labels: vec![],
            notes: vec![],
        }
    }

    pub fn bug(file: SourceFileId, error: impl ToString) -> Self {
        Self::new(Severity::Bug, file, error.to_string())
    }

    pub fn error(file: SourceFileId, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, file, message)
    }

    pub fn warning(file: SourceFileId, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, file, message)
    }

    pub fn note(file: SourceFileId, message: impl Into<String>) -> Self {
        Self::new(Severity::Note, file, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<Note>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn emit_to_stderr(
        self,
        files: &SourceFileSet,
    ) -> Result<(), codespan_reporting::files::Error> {
        term::emit(
            &mut StandardStream::stderr(ColorChoice::Auto),
            &term::Config::default(),
            files,
            &self.into(),
        )
    }

    /// `file:line:col: severity: message` on one line, for hosts that do not
    /// want full source excerpts.
    pub fn to_terse_string(&self, files: &SourceFileSet) -> String {
        use codespan_reporting::files::Files;

        let file = files.get(self.source_file);
        let position = self
            .labels
            .iter()
            .find(|label| label.style == LabelStyle::Primary)
            .map(|label| label.span.start)
            .unwrap_or(0);
        let line = files.line_index(self.source_file, position).unwrap_or(0);
        let Range { start, .. } = files.line_range(self.source_file, line).unwrap_or(0..0);
        let severity = match self.severity {
            Severity::Bug => "bug",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
        };
        format!(
            "{}:{}:{}: {}: {}",
            file.filename,
            line + 1,
            position - start + 1,
            severity,
            self.message
        )
    }
}

impl From<Diagnostic> for codespan_reporting::diagnostic::Diagnostic<SourceFileId> {
    fn from(diag: Diagnostic) -> Self {
        Self {
            severity: diag.severity,
            code: diag.code,
            message: diag.message,
            labels: diag
                .labels
                .into_iter()
                .map(|label| codespan_reporting::diagnostic::Label {
                    style: label.style,
                    file_id: label.file.unwrap_or(diag.source_file),
                    range: label.span.to_range(),
                    message: label.message,
                })
                .collect(),
            notes: diag
                .notes
                .into_iter()
                .map(|note| {
                    if let Some(sug) = note.suggestion {
                        format!("{}: `{}`", note.text, sug.replacement)
                    } else {
                        note.text
                    }
                })
                .collect(),
        }
    }
}
