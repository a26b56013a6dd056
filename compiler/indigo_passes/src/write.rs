//! Final stage: render the block tree and write the stylesheet.

use std::io::Write;
use std::path::Path;

use indigo_emit::{write_document, WriteMode};
use indigo_ir::Block;
use indigo_session::{CompileContext, FatalError};

/// Render `blocks` in the mode the options ask for and write the text
/// through the session's file lookup. The produced path is recorded on the
/// context so the dependency graph can map sources to outputs.
pub fn write_output(
    blocks: &[Block],
    path: &Path,
    ctx: &mut CompileContext,
) -> Result<(), FatalError> {
    let mode = if ctx.options().minify() {
        WriteMode::Minimal
    } else {
        WriteMode::Pretty
    };
    let css = write_document(blocks, mode);
    let mut sink = ctx
        .lookup()
        .open_write(path)
        .map_err(|error| FatalError::io(path, error))?;
    sink.write_all(css.as_bytes())
        .map_err(|error| FatalError::io(path, error))?;
    sink.flush().map_err(|error| FatalError::io(path, error))?;
    drop(sink);
    ctx.record_produced(path.to_path_buf());
    tracing::debug!(path = %path.display(), bytes = css.len(), "stylesheet written");
    Ok(())
}
