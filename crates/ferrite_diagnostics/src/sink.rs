//! Thread-safe diagnostic accumulator.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for diagnostics emitted during a command.
///
/// The error and warning counts are tracked atomically for fast checks
/// without locking the diagnostic vector.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
    warning_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
            warning_count: AtomicUsize::new(0),
        }
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Warning => {
                self.warning_count.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        let mut diagnostics = self.diagnostics.lock().unwrap_or_else(|e| e.into_inner());
        diagnostics.push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Returns the number of warning-severity diagnostics emitted so far.
    pub fn warning_count(&self) -> usize {
        self.warning_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *diagnostics)
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostics = self.diagnostics.lock().unwrap_or_else(|e| e.into_inner());
        diagnostics.clone()
    }

    /// Returns `true` if a diagnostic with the given code text (e.g. `"W085"`)
    /// has been emitted.
    pub fn contains_code(&self, code: &str) -> bool {
        let diagnostics = self.diagnostics.lock().unwrap_or_else(|e| e.into_inner());
        diagnostics.iter().any(|d| d.code.to_string() == code)
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    fn make_error() -> Diagnostic {
        Diagnostic::error(DiagnosticCode::new(Category::Error, 22), "no buffers found")
    }

    fn make_warning() -> Diagnostic {
        Diagnostic::warning(DiagnosticCode::new(Category::Warning, 97), "cannot remove u3")
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn counts_by_severity() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error());
        sink.emit(make_warning());
        sink.emit(make_warning());
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 2);
        assert!(sink.contains_code("W097"));
        assert!(!sink.contains_code("W085"));
    }

    #[test]
    fn take_all_drains() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error());
        sink.emit(make_warning());
        assert_eq!(sink.take_all().len(), 2);
        assert!(sink.take_all().is_empty());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let sink = Arc::clone(&sink);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    sink.emit(make_warning());
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.warning_count(), 200);
        assert_eq!(sink.diagnostics().len(), 200);
    }
}
