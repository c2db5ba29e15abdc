//! Diagnostic rendering backends.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// warning[W085]: input port in1 drives a don't-touch instance, skipping
///   --> u7
///    = note: ...
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn severity_text(&self, severity: Severity) -> String {
        if !self.color {
            return severity.to_string();
        }
        let ansi = match severity {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
            Severity::Info => "1;32",
            Severity::Note | Severity::Help => "1;36",
        };
        format!("\x1b[{ansi}m{severity}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = format!(
            "{}[{}]: {}\n",
            self.severity_text(diag.severity),
            diag.code,
            diag.message
        );
        if let Some(object) = &diag.object {
            out.push_str(&format!("  --> {object}\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    #[test]
    fn render_warning_with_object_and_notes() {
        let diag = Diagnostic::warning(DiagnosticCode::new(Category::Warning, 97), "cannot remove buffer")
            .with_object("buf12")
            .with_note("it sits between two top-level ports")
            .with_help("remove it manually");
        let output = TerminalRenderer::new(false).render(&diag);
        assert!(output.contains("warning[W097]: cannot remove buffer"));
        assert!(output.contains("--> buf12"));
        assert!(output.contains("= note: it sits between two top-level ports"));
        assert!(output.contains("= help: remove it manually"));
    }

    #[test]
    fn render_without_object() {
        let diag = Diagnostic::info(DiagnosticCode::new(Category::Info, 26), "Removed 2 buffers.");
        let output = TerminalRenderer::new(false).render(&diag);
        assert_eq!(output, "info[I026]: Removed 2 buffers.\n");
    }

    #[test]
    fn render_with_color() {
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 22), "no buffers found");
        let output = TerminalRenderer::new(true).render(&diag);
        assert!(output.starts_with("\x1b[1;31merror\x1b[0m[E022]"));
    }
}
