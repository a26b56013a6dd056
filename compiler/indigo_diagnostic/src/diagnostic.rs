//! Core diagnostic types.
//!
//! Every reported problem carries the phase that found it, a severity, a
//! message, and the origin it points at.

use std::fmt;

use indigo_ir::Origin;

/// Which stage of compilation produced a diagnostic.
///
/// Parser-phase and Compiler-phase diagnostics accumulate independently;
/// a file that fails to parse never reaches the compiler passes, so the
/// split tells a reader where to start looking.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Phase {
    Parser,
    Compiler,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Parser => write!(f, "parser"),
            Phase::Compiler => write!(f, "compiler"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    /// Informational, e.g. byte counts from the reordering pass. Never
    /// fails a compile.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    pub origin: Origin,
}

impl Diagnostic {
    pub fn error(phase: Phase, message: impl Into<String>, origin: Origin) -> Diagnostic {
        Diagnostic {
            phase,
            severity: Severity::Error,
            message: message.into(),
            origin,
        }
    }

    pub fn warning(phase: Phase, message: impl Into<String>, origin: Origin) -> Diagnostic {
        Diagnostic {
            phase,
            severity: Severity::Warning,
            message: message.into(),
            origin,
        }
    }

    pub fn info(message: impl Into<String>, origin: Origin) -> Diagnostic {
        Diagnostic {
            phase: Phase::Compiler,
            severity: Severity::Info,
            message: message.into(),
            origin,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.phase, self.severity, self.message)
    }
}
