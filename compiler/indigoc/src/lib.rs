//! The Indigo compiler driver.
//!
//! Ties the stages together for one or many root files: `@using`
//! resolution through the shared file cache, the transformation pipeline,
//! and stylesheet write-out. Independent roots compile in parallel with
//! one [`CompileContext`] per root; the per-root outcomes merge into a
//! single [`CompileReport`] once every worker is done.
//!
//! The dependency graph is filled in after each root that compiles
//! cleanly, from its `@using` edges, its sprite source images, and the
//! local files its `url(...)` values point at. A watch loop feeds changed
//! paths to [`DependencyGraph::needs_recompilation`] and hands the
//! returned roots back to [`compile_many`].

mod resolve;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indigo_diagnostic::Phase;
use indigo_ir::{visit, Block, BlockKind, Origin, Value};
use indigo_session::{
    CompileContext, CompileOptions, DependencyGraph, FatalError, FileCache, FileLookup,
};
use rayon::prelude::*;

/// Merged outcome of a [`compile_many`] run.
pub struct CompileReport {
    pub context: CompileContext,
    pub graph: DependencyGraph,
}

impl CompileReport {
    pub fn success(&self) -> bool {
        !self.context.has_errors()
    }
}

/// Compile every root and merge the outcomes. Returns `None` when `roots`
/// is empty.
///
/// Workers share nothing but the file cache, so a file imported by
/// several roots is parsed once and every other worker blocks until the
/// parse is published. `jobs` bounds the worker count; `None` leaves the
/// choice to rayon.
pub fn compile_many(
    roots: &[PathBuf],
    options: CompileOptions,
    lookup: &Arc<dyn FileLookup>,
    out_dir: Option<&Path>,
    jobs: Option<usize>,
) -> Option<CompileReport> {
    let cache = Arc::new(FileCache::new());
    let compile = |root: &PathBuf| compile_root(root, options, &cache, lookup, out_dir);
    let outcomes: Vec<(CompileContext, DependencyGraph)> = match rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or(0))
        .build()
    {
        Ok(pool) => pool.install(|| roots.par_iter().map(compile).collect()),
        Err(error) => {
            tracing::warn!(%error, "no worker pool; compiling serially");
            roots.iter().map(compile).collect()
        }
    };

    let mut outcomes = outcomes.into_iter();
    let (context, graph) = outcomes.next()?;
    let mut report = CompileReport { context, graph };
    for (context, graph) in outcomes {
        report.context.merge(context);
        report.graph.merge(graph);
    }
    Some(report)
}

/// Compile a single root file. Problems land in the returned context
/// rather than an `Err`; dependency edges are recorded only when the
/// whole compile, including the write, went through.
pub fn compile_root(
    root: &Path,
    options: CompileOptions,
    cache: &Arc<FileCache>,
    lookup: &Arc<dyn FileLookup>,
    out_dir: Option<&Path>,
) -> (CompileContext, DependencyGraph) {
    let mut ctx = CompileContext::new(
        root.to_path_buf(),
        options,
        Arc::clone(cache),
        Arc::clone(lookup),
    );
    let mut graph = DependencyGraph::new();
    graph.record_file(root);
    match run_root(root, out_dir, &mut ctx, &mut graph) {
        // The diagnostics already say why the compile stopped.
        Ok(()) | Err(FatalError::StoppedCompiling) => {}
        Err(fatal) => {
            let message = fatal.to_string();
            ctx.error(Phase::Compiler, message, Origin::synthetic());
        }
    }
    (ctx, graph)
}

fn run_root(
    root: &Path,
    out_dir: Option<&Path>,
    ctx: &mut CompileContext,
    graph: &mut DependencyGraph,
) -> Result<(), FatalError> {
    let resolution = resolve::resolve_usings(ctx)?;
    if ctx.has_errors() {
        return Err(FatalError::StoppedCompiling);
    }
    // Collected before the pipeline rewrites sprites away and stamps urls.
    let assets = asset_edges(&resolution.blocks, ctx);

    let blocks = indigo_passes::run(resolution.blocks, ctx)?;
    let output = output_path(root, out_dir);
    indigo_passes::write_output(&blocks, &output, ctx)?;

    for (dependency, dependent) in resolution.edges.iter().chain(assets.iter()) {
        graph.record(dependency, dependent);
    }
    tracing::info!(root = %root.display(), output = %output.display(), "compiled");
    Ok(())
}

/// Sprite source images and local `url(...)` targets of the resolved
/// document, as `(dependency, dependent)` pairs. Sprite images count even
/// before they exist; url targets only when they name a real file, which
/// keeps remote and generated urls out of the graph.
fn asset_edges(blocks: &[Block], ctx: &CompileContext) -> Vec<(PathBuf, PathBuf)> {
    let mut edges = Vec::new();
    for block in blocks {
        let dependent = block.origin.path().to_path_buf();
        if dependent.as_os_str().is_empty() {
            continue;
        }
        if let BlockKind::Sprite(sprite) = &block.kind {
            for image in &sprite.images {
                edges.push((ctx.resolve(&image.path), dependent.clone()));
            }
        }
        visit::visit_values(std::slice::from_ref(block), &mut |value| {
            if let Value::Url(target) = value {
                if let Some(resolved) = local_target(target, ctx) {
                    edges.push((resolved, dependent.clone()));
                }
            }
        });
    }
    edges
}

/// Resolve a url target to a path when it names an existing local file.
fn local_target(target: &str, ctx: &CompileContext) -> Option<PathBuf> {
    let trimmed = target.trim_matches(|quote| quote == '"' || quote == '\'');
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.starts_with("http:")
        || lowered.starts_with("https:")
        || lowered.starts_with("//")
        || lowered.starts_with("data:")
    {
        return None;
    }
    let file = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    let resolved = ctx.resolve(file);
    ctx.lookup().exists(&resolved).then_some(resolved)
}

/// `<out_dir>/<stem>.css`, or next to the root when no directory is given.
fn output_path(root: &Path, out_dir: Option<&Path>) -> PathBuf {
    match out_dir {
        Some(dir) => {
            let stem = root.file_stem().unwrap_or_else(|| OsStr::new("out"));
            dir.join(Path::new(stem).with_extension("css"))
        }
        None => root.with_extension("css"),
    }
}
