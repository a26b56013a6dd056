//! Recursive-descent parser for Indigo source.
//!
//! [`parse`] turns one file's text into a block list. Errors are recorded
//! on the [`CompileContext`] and the whole file yields `None`: there is no
//! recovery inside a file, so downstream passes only ever see trees that
//! parsed completely.

mod blocks;
mod media;
mod reader;
mod values;

use std::path::Path;
use std::sync::Arc;

use indigo_ir::Block;
use indigo_session::CompileContext;

/// Local stop-parsing signal. Raising it unwinds to [`parse`], which maps
/// it to `None`.
#[derive(Debug)]
pub(crate) struct Abort;

pub(crate) type PResult<T> = Result<T, Abort>;

/// Parse one file. `None` means at least one Parser-phase error was
/// recorded on `ctx`.
pub fn parse(file: &Path, source: &str, ctx: &mut CompileContext) -> Option<Vec<Block>> {
    tracing::debug!(file = %file.display(), bytes = source.len(), "parsing");
    let file = Arc::new(file.to_path_buf());
    let mut parser = blocks::Parser::new(source, file, ctx);
    match parser.parse_document() {
        Ok(blocks) => Some(blocks),
        Err(Abort) => None,
    }
}
