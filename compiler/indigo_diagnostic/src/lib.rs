//! Diagnostics for the Indigo compiler.
//!
//! Two phases accumulate independently — Parser and Compiler — so a report
//! always says which stage rejected the input. Warnings can be promoted to
//! errors at record time; rendering groups by file with one-line snippets.

mod diagnostic;
mod render;
mod set;

pub use diagnostic::{Diagnostic, Phase, Severity};
pub use render::Renderer;
pub use set::DiagnosticSet;
