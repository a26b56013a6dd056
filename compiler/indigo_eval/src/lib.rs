//! Scope and value semantics for the Indigo compiler.
//!
//! This crate owns the language's meaning between parse and write: the
//! lexical scope chain, the reference-verification pass that rejects
//! forward references, mixin binding and expansion, and the expression
//! reduction engine the evaluation stage loops over.
//!
//! The passes here consume and produce plain block sequences; they record
//! recoverable problems on the [`CompileContext`](indigo_session::CompileContext)
//! and reserve `Err` for conditions that must stop the whole compile, such
//! as duplicate top-level names.

mod expand;
mod operators;
mod reduce;
mod scope;
mod verify;

pub use expand::bind_and_expand;
pub use operators::{apply_binary, EvalError};
pub use reduce::evaluate;
pub use scope::Scope;
pub use verify::verify_references;
