//! Accumulation and merging of diagnostics.

use crate::{Diagnostic, Severity};

/// Ordered accumulator for one compilation's diagnostics.
///
/// With `warnings_as_errors` set, warnings are recorded as errors at insert
/// time, so `has_errors` and downstream abort checks need no special case.
#[derive(Clone, Debug)]
pub struct DiagnosticSet {
    items: Vec<Diagnostic>,
    warnings_as_errors: bool,
}

impl DiagnosticSet {
    pub fn new(warnings_as_errors: bool) -> DiagnosticSet {
        DiagnosticSet {
            items: Vec::new(),
            warnings_as_errors,
        }
    }

    pub fn warnings_as_errors(&self) -> bool {
        self.warnings_as_errors
    }

    pub fn record(&mut self, mut diagnostic: Diagnostic) {
        if self.warnings_as_errors && diagnostic.severity == Severity::Warning {
            diagnostic.severity = Severity::Error;
        }
        self.items.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Set-union: appends the other set's diagnostics, skipping exact
    /// duplicates already present. Both sets must have been created under
    /// the same `warnings_as_errors` setting.
    ///
    /// # Panics
    /// Panics if the settings differ; merging across options is a caller
    /// defect, not a user error.
    pub fn merge(&mut self, other: DiagnosticSet) {
        assert_eq!(
            self.warnings_as_errors, other.warnings_as_errors,
            "merged diagnostic sets must share the warnings-as-errors setting"
        );
        for diagnostic in other.items {
            if !self.items.contains(&diagnostic) {
                self.items.push(diagnostic);
            }
        }
    }
}
