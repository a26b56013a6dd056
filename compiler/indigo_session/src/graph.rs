//! Dependency graph for incremental recompilation.
//!
//! An inverted index: for each file, the set of files that depend on it.
//! Populated after a successful compile from `@using` edges, sprite image
//! edges, and `url(...)` references that resolve to a file on disk. The
//! watch loop feeds changed files back in through
//! [`DependencyGraph::needs_recompilation`].

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct DependencyGraph {
    /// dependency -> files that depend on it (directly).
    dependents: FxHashMap<PathBuf, FxHashSet<PathBuf>>,
}

impl DependencyGraph {
    pub fn new() -> DependencyGraph {
        DependencyGraph::default()
    }

    /// Record that `dependent` depends on `dependency`. Every file also
    /// depends on itself, so an edit to a root recompiles that root.
    pub fn record(&mut self, dependency: &Path, dependent: &Path) {
        self.dependents
            .entry(dependency.to_path_buf())
            .or_default()
            .insert(dependent.to_path_buf());
        self.record_file(dependent);
    }

    /// Enter a file into the graph with just its self-edge.
    pub fn record_file(&mut self, file: &Path) {
        self.dependents
            .entry(file.to_path_buf())
            .or_default()
            .insert(file.to_path_buf());
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Direct dependents of `file`, if known.
    pub fn dependents_of(&self, file: &Path) -> Option<&FxHashSet<PathBuf>> {
        self.dependents.get(file)
    }

    /// Union with a graph built on another thread.
    pub fn merge(&mut self, other: DependencyGraph) {
        for (dependency, dependents) in other.dependents {
            self.dependents
                .entry(dependency)
                .or_default()
                .extend(dependents);
        }
    }

    /// The subset of `roots` that transitively depend on any changed file:
    /// the minimal set of entry points to recompile after an edit.
    pub fn needs_recompilation(
        &self,
        changed: &FxHashSet<PathBuf>,
        roots: &FxHashSet<PathBuf>,
    ) -> FxHashSet<PathBuf> {
        let mut affected = FxHashSet::default();
        let mut queue: VecDeque<&Path> = changed.iter().map(PathBuf::as_path).collect();
        let mut seen: FxHashSet<&Path> = queue.iter().copied().collect();

        while let Some(file) = queue.pop_front() {
            if roots.contains(file) {
                affected.insert(file.to_path_buf());
            }
            if let Some(dependents) = self.dependents.get(file) {
                for dependent in dependents {
                    if seen.insert(dependent.as_path()) {
                        queue.push_back(dependent.as_path());
                    }
                }
            }
        }
        affected
    }
}
