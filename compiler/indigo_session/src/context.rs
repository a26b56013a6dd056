//! Per-compilation state.
//!
//! One context per top-level compile. Parallel root compiles each own a
//! context; the driver merges them afterwards for reporting. The shared
//! file cache is the only structure crossing thread boundaries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indigo_diagnostic::{Diagnostic, DiagnosticSet, Phase};
use indigo_ir::Origin;

use crate::{CompileOptions, FileCache, FileLookup, FixedGridBackend, SpriteBackend, SpriteExport};

pub struct CompileContext {
    working_dir: PathBuf,
    entry_file: PathBuf,
    current_file: PathBuf,
    options: CompileOptions,
    diagnostics: DiagnosticSet,
    produced: Vec<PathBuf>,
    sprites: Vec<SpriteExport>,
    cache: Arc<FileCache>,
    lookup: Arc<dyn FileLookup>,
    sprite_backend: Arc<dyn SpriteBackend>,
}

impl CompileContext {
    pub fn new(
        entry_file: PathBuf,
        options: CompileOptions,
        cache: Arc<FileCache>,
        lookup: Arc<dyn FileLookup>,
    ) -> CompileContext {
        let working_dir = entry_file
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        CompileContext {
            working_dir,
            current_file: entry_file.clone(),
            entry_file,
            options,
            diagnostics: DiagnosticSet::new(options.warnings_as_errors()),
            produced: Vec::new(),
            sprites: Vec::new(),
            cache,
            lookup,
            sprite_backend: Arc::new(FixedGridBackend::default()),
        }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    pub fn entry_file(&self) -> &Path {
        &self.entry_file
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The file whose statements are being processed right now. Follows
    /// `@using` targets as they are parsed.
    pub fn current_file(&self) -> &Path {
        &self.current_file
    }

    pub fn set_current_file(&mut self, file: PathBuf) {
        self.current_file = file;
    }

    /// Resolve a source-relative path against the working directory.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let candidate = Path::new(relative);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.working_dir.join(candidate)
        }
    }

    pub fn cache(&self) -> &Arc<FileCache> {
        &self.cache
    }

    pub fn lookup(&self) -> &Arc<dyn FileLookup> {
        &self.lookup
    }

    pub fn sprite_backend(&self) -> &Arc<dyn SpriteBackend> {
        &self.sprite_backend
    }

    /// Swap in a real packing backend; the default is the fixed-grid test
    /// backend.
    pub fn set_sprite_backend(&mut self, backend: Arc<dyn SpriteBackend>) {
        self.sprite_backend = backend;
    }

    pub fn error(&mut self, phase: Phase, message: impl Into<String>, origin: Origin) {
        self.diagnostics.record(Diagnostic::error(phase, message, origin));
    }

    pub fn warning(&mut self, phase: Phase, message: impl Into<String>, origin: Origin) {
        self.diagnostics
            .record(Diagnostic::warning(phase, message, origin));
    }

    pub fn info(&mut self, message: impl Into<String>, origin: Origin) {
        self.diagnostics.record(Diagnostic::info(message, origin));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn diagnostics(&self) -> &DiagnosticSet {
        &self.diagnostics
    }

    pub fn record_produced(&mut self, path: PathBuf) {
        if !self.produced.contains(&path) {
            self.produced.push(path);
        }
    }

    pub fn produced_files(&self) -> &[PathBuf] {
        &self.produced
    }

    pub fn queue_sprite(&mut self, export: SpriteExport) {
        self.sprites.push(export);
    }

    pub fn take_sprites(&mut self) -> Vec<SpriteExport> {
        std::mem::take(&mut self.sprites)
    }

    /// Fold another thread's context into this one: diagnostics set-union,
    /// produced files dedup-union, sprite queues appended.
    ///
    /// # Panics
    /// Panics if the contexts were compiled under different options;
    /// combining a minified compile with a pretty one is a driver defect.
    pub fn merge(&mut self, other: CompileContext) {
        assert_eq!(
            self.options, other.options,
            "merged compile contexts must share options"
        );
        self.diagnostics.merge(other.diagnostics);
        for path in other.produced {
            self.record_produced(path);
        }
        self.sprites.extend(other.sprites);
    }
}
