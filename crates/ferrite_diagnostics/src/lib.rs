//! Diagnostic creation, severity management, and terminal rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels,
//! stable codes and the design object they refer to. The thread-safe
//! [`DiagnosticSink`] accumulates diagnostics during a command, and
//! [`DiagnosticRenderer`] implementations format them for the terminal.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
