//! The Indigo compilation pipeline.
//!
//! After `@using` resolution flattens a root file and its imports into one
//! block sequence, [`run`] pushes that sequence through every stage in
//! [`PIPELINE`] order. Stages share one shape: consume the blocks, build a
//! replacement, record recoverable problems on the context. The driver
//! checks the context between stages and stops at the first stage that
//! recorded an error; structurally unrecoverable problems short-circuit
//! through [`FatalError`] instead.
//!
//! Optional stages (minification, cache breakers, vendor prefixes,
//! compression-aware reordering) check their flag themselves and pass the
//! blocks through untouched when disabled, so the table never changes
//! shape.

mod cache_breakers;
mod charset;
mod cleanup;
mod evaluate;
mod fonts;
mod important;
mod imports;
mod include;
mod media;
mod minify;
mod prefix;
mod reorder;
mod reset;
mod sprites;
mod unroll;
mod write;

pub use write::write_output;

use indigo_ir::Block;
use indigo_session::{CompileContext, FatalError};

/// One pipeline stage.
pub type Pass = fn(Vec<Block>, &mut CompileContext) -> Result<Vec<Block>, FatalError>;

/// Every stage between `@using` resolution and the final write, in order.
/// Each stage's postcondition is the next stage's precondition.
pub const PIPELINE: &[(&str, Pass)] = &[
    ("verify-references", verify_references),
    ("validate-charsets", charset::validate),
    ("hoist-imports", imports::hoist),
    ("unroll-resets", reset::unroll),
    ("render-sprites", sprites::render),
    ("expand-mixins", indigo_eval::bind_and_expand),
    ("unroll-nested-rules", unroll::nested_rules),
    ("unroll-inner-media", unroll::inner_media),
    ("check-unrolled", unroll::check),
    ("merge-media", media::merge),
    ("resolve-includes", include::resolve),
    ("resolve-resets", reset::resolve),
    ("evaluate-values", evaluate::reduce),
    ("resolve-important", important::resolve),
    ("drop-noops", cleanup::drop_noops),
    ("check-font-faces", fonts::check),
    ("minify", minify::shorten),
    ("collapse-rules", cleanup::collapse_rules),
    ("write-sprites", sprites::write),
    ("cache-breakers", cache_breakers::append),
    ("vendor-prefixes", prefix::synthesize),
    ("reorder-for-compression", reorder::optimize),
];

/// Run every pass over one resolved document.
///
/// Returns the final block sequence ready for [`write_output`], or the
/// fatal error that stopped the pipeline. Recoverable errors recorded
/// during a pass stop the pipeline at that pass boundary.
pub fn run(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut blocks = blocks;
    for &(name, pass) in PIPELINE {
        tracing::debug!(pass = name, blocks = blocks.len(), "pass start");
        blocks = pass(blocks, ctx)?;
        if ctx.has_errors() {
            tracing::debug!(pass = name, "stopping after recorded errors");
            return Err(FatalError::StoppedCompiling);
        }
    }
    Ok(blocks)
}

/// Adapter: reference verification reads the tree without rebuilding it.
fn verify_references(
    blocks: Vec<Block>,
    ctx: &mut CompileContext,
) -> Result<Vec<Block>, FatalError> {
    indigo_eval::verify_references(&blocks, ctx);
    Ok(blocks)
}
