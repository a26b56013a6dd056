//! Charset validation.
//!
//! A document may declare at most one distinct `@charset`. Conflicting
//! values abort the compile with an error naming both spellings; duplicate
//! declarations of the surviving value collapse into one, moved to the
//! front of the sequence.

use indigo_diagnostic::Phase;
use indigo_ir::{Block, BlockKind};
use indigo_session::{CompileContext, FatalError};

pub fn validate(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut first: Option<(String, Block)> = None;
    let mut conflicted = false;
    let mut rest = Vec::with_capacity(blocks.len());
    for block in blocks {
        let BlockKind::Charset { name } = &block.kind else {
            rest.push(block);
            continue;
        };
        let name = name.clone();
        match &first {
            None => first = Some((name, block)),
            Some((kept, _)) if kept.eq_ignore_ascii_case(&name) => {}
            Some((kept, _)) => {
                ctx.error(
                    Phase::Compiler,
                    format!("@charset \"{name}\" conflicts with @charset \"{kept}\""),
                    block.origin.clone(),
                );
                conflicted = true;
            }
        }
    }
    if conflicted {
        return Err(FatalError::StoppedCompiling);
    }
    let mut out = Vec::with_capacity(rest.len() + 1);
    if let Some((_, block)) = first {
        out.push(block);
    }
    out.extend(rest);
    Ok(out)
}
