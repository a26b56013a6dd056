//! `@using` resolution.
//!
//! The first stage of a compile: the root file and everything reachable
//! from it through `@using` are parsed exactly once via the shared
//! [`FileCache`](indigo_session::FileCache), then spliced into one flat
//! block sequence in source order. Every file is included at its first
//! `@using` site; later references to an already-included file splice
//! nothing, so shared imports land once and cycles terminate. A file
//! imported under a media query is wrapped in a `@media` block and must
//! not contain `@media` itself.
//!
//! When several roots compile in parallel, each context walks its own
//! import set but the cache hands every file to exactly one loader, so
//! sibling compiles block on the winner instead of re-parsing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indigo_diagnostic::Phase;
use indigo_ir::{Block, BlockKind, MediaBlock, Origin, Span};
use indigo_session::{CompileContext, FatalError, ParsedFile};
use rustc_hash::{FxHashMap, FxHashSet};

/// The flattened document plus the `@using` edges that built it.
pub(crate) struct Resolution {
    pub blocks: Vec<Block>,
    /// `(dependency, dependent)` pairs, one per `@using` reference.
    pub edges: Vec<(PathBuf, PathBuf)>,
}

/// Parse the entry file and its transitive imports, then splice them into
/// one document. Parse failures are recorded against the failing file and
/// resolution keeps going, so one broken import does not hide the others.
pub(crate) fn resolve_usings(ctx: &mut CompileContext) -> Result<Resolution, FatalError> {
    let entry = ctx.entry_file().to_path_buf();
    let cache = Arc::clone(ctx.cache());

    let mut parsed: FxHashMap<PathBuf, ParsedFile> = FxHashMap::default();
    let mut edges: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut known: FxHashSet<PathBuf> = FxHashSet::default();
    known.insert(entry.clone());
    // Files discovered through `@using` but not yet parsed.
    let mut pending: Vec<PathBuf> = Vec::new();

    let mut loaded_here = false;
    let root = cache.demand(&entry, || {
        loaded_here = true;
        load(&entry, ctx)
    })?;
    if root.is_none() && !loaded_here {
        report_cached_failure(&entry, ctx);
    }
    queue_targets(&entry, root.as_deref(), ctx, &mut edges, &mut known, &mut pending);
    parsed.insert(entry.clone(), root);

    while !pending.is_empty() {
        let mut loaded_here = false;
        let outcome = cache.first_available(&pending, |path| {
            loaded_here = true;
            load(path, ctx)
        })?;
        let Some((chosen, blocks)) = outcome else {
            break;
        };
        if blocks.is_none() && !loaded_here {
            report_cached_failure(&chosen, ctx);
        }
        pending.retain(|path| path != &chosen);
        queue_targets(&chosen, blocks.as_deref(), ctx, &mut edges, &mut known, &mut pending);
        parsed.insert(chosen, blocks);
    }

    let mut included: FxHashSet<PathBuf> = FxHashSet::default();
    included.insert(entry.clone());
    let blocks = splice(&entry, &parsed, &mut included, ctx)?;
    ctx.set_current_file(entry);

    Ok(Resolution { blocks, edges })
}

/// Read and parse one file, recording any problem against it.
fn load(path: &Path, ctx: &mut CompileContext) -> Option<Vec<Block>> {
    ctx.set_current_file(path.to_path_buf());
    let lookup = Arc::clone(ctx.lookup());
    let source = match lookup.open_text(path) {
        Ok(source) => source,
        Err(error) => {
            ctx.error(
                Phase::Parser,
                format!("cannot read `{}`: {error}", path.display()),
                file_origin(path),
            );
            return None;
        }
    };
    indigo_parse::parse(path, &source, ctx)
}

/// A sibling compile already parsed `path` and failed. That context holds
/// the detailed diagnostics; this one still has to fail, so note why.
fn report_cached_failure(path: &Path, ctx: &mut CompileContext) {
    ctx.error(
        Phase::Parser,
        format!("`{}` failed to parse", path.display()),
        file_origin(path),
    );
}

fn file_origin(path: &Path) -> Origin {
    Origin::new(Arc::new(path.to_path_buf()), Span::new(0, 0))
}

/// Record the `@using` edges of a freshly parsed file and queue targets
/// this resolution has not met before.
fn queue_targets(
    file: &Path,
    blocks: Option<&Vec<Block>>,
    ctx: &CompileContext,
    edges: &mut Vec<(PathBuf, PathBuf)>,
    known: &mut FxHashSet<PathBuf>,
    pending: &mut Vec<PathBuf>,
) {
    let Some(blocks) = blocks else { return };
    for block in blocks {
        if let BlockKind::Using { path, .. } = &block.kind {
            let target = ctx.resolve(path);
            edges.push((target.clone(), file.to_path_buf()));
            if known.insert(target.clone()) {
                pending.push(target);
            }
        }
    }
}

/// Replace each first-seen `@using` with the target file's spliced blocks.
/// Files that failed to parse contribute nothing; their diagnostics stop
/// the compile after this stage.
fn splice(
    file: &Path,
    parsed: &FxHashMap<PathBuf, ParsedFile>,
    included: &mut FxHashSet<PathBuf>,
    ctx: &mut CompileContext,
) -> Result<Vec<Block>, FatalError> {
    let Some(Some(blocks)) = parsed.get(file).cloned() else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks.iter() {
        let BlockKind::Using { path, media } = &block.kind else {
            out.push(block.clone());
            continue;
        };
        let target = ctx.resolve(path);
        if !included.insert(target.clone()) {
            continue;
        }
        let inner = splice(&target, parsed, included, ctx)?;
        match media {
            Some(query) => {
                if inner.iter().any(|candidate| matches!(candidate.kind, BlockKind::Media(_))) {
                    ctx.error(
                        Phase::Compiler,
                        format!(
                            "`{}` is imported under a media query but contains `@media`",
                            target.display()
                        ),
                        block.origin.clone(),
                    );
                    return Err(FatalError::StoppedCompiling);
                }
                out.push(Block::new(
                    BlockKind::Media(MediaBlock {
                        query: query.clone(),
                        blocks: inner,
                    }),
                    block.origin.clone(),
                ));
            }
            None => out.extend(inner),
        }
    }
    Ok(out)
}
