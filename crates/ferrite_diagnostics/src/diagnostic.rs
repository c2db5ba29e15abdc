//! Structured diagnostic messages with severity, codes, and design objects.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message about the design being repaired.
///
/// Each diagnostic includes:
/// - A severity level and stable code
/// - A primary message
/// - The hierarchical name of the instance, net, or pin it concerns, if any
/// - Optional notes and help text
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The stable code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Name of the design object the diagnostic refers to.
    pub object: Option<String>,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, code: DiagnosticCode, message: String) -> Self {
        Self {
            severity,
            code,
            message,
            object: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new error diagnostic with the given code and message.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, message.into())
    }

    /// Creates a new warning diagnostic with the given code and message.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, message.into())
    }

    /// Creates a new informational diagnostic with the given code and message.
    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Info, code, message.into())
    }

    /// Attaches the name of the design object this diagnostic concerns.
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_error() {
        let code = DiagnosticCode::new(Category::Error, 22);
        let diag = Diagnostic::error(code, "no buffers found");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "no buffers found");
        assert_eq!(format!("{}", diag.code), "E022");
        assert!(diag.object.is_none());
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Warning, 85);
        let diag = Diagnostic::warning(code, "input in1 has a don't-touch fanout")
            .with_object("u7")
            .with_note("the port was not buffered")
            .with_help("clear the don't-touch flag on u7");
        assert_eq!(diag.object.as_deref(), Some("u7"));
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn info_severity() {
        let diag = Diagnostic::info(DiagnosticCode::new(Category::Info, 26), "Removed 3 buffers.");
        assert_eq!(diag.severity, Severity::Info);
    }
}
