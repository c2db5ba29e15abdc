//! Diagnostic codes with category prefixes for structured message identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
///
/// Numbers are stable across releases so scripts can match on them, e.g.
/// `W085` is always "don't-touch fanout skipped during input buffering".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
    /// Informational reports such as edit counts, prefixed with `I`.
    Info,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Info => 'I',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `E022`, `W085`, `I026`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Error.prefix(), 'E');
        assert_eq!(Category::Warning.prefix(), 'W');
        assert_eq!(Category::Info.prefix(), 'I');
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", DiagnosticCode::new(Category::Error, 22)), "E022");
        assert_eq!(format!("{}", DiagnosticCode::new(Category::Warning, 85)), "W085");
        assert_eq!(format!("{}", DiagnosticCode::new(Category::Info, 142)), "I142");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Warning, 97);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
