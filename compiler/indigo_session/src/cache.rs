//! Concurrent per-file parse cache.
//!
//! `demand` memoizes "parse file X" across however many threads and
//! `@using` edges ask for it. The map holds an entry per path: in-progress
//! or ready. Losers of a race block on the condvar until the winner
//! publishes, so no file is ever parsed twice and no reader sees a
//! half-built entry. A panicking loader poisons the whole cache; every
//! later call fails fast instead of serving state the crash may have left
//! inconsistent.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indigo_ir::Block;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::FatalError;

/// A cached parse: `None` records "this file failed to parse".
pub type ParsedFile = Option<Arc<Vec<Block>>>;

enum Entry {
    InProgress,
    Ready(ParsedFile),
}

#[derive(Default)]
struct State {
    entries: FxHashMap<PathBuf, Entry>,
    poisoned: bool,
}

#[derive(Default)]
pub struct FileCache {
    state: Mutex<State>,
    ready: Condvar,
}

impl FileCache {
    pub fn new() -> FileCache {
        FileCache::default()
    }

    /// The cached parse of `path`, or run `loader` exactly once across all
    /// concurrent callers and cache its result. Concurrent callers for the
    /// same path block until the load completes.
    pub fn demand<F>(&self, path: &Path, loader: F) -> Result<ParsedFile, FatalError>
    where
        F: FnOnce() -> Option<Vec<Block>>,
    {
        {
            let mut state = self.state.lock();
            loop {
                if state.poisoned {
                    return Err(FatalError::PoisonedCache);
                }
                match state.entries.get(path) {
                    Some(Entry::Ready(parsed)) => return Ok(parsed.clone()),
                    Some(Entry::InProgress) => {
                        self.ready.wait(&mut state);
                    }
                    None => {
                        state
                            .entries
                            .insert(path.to_path_buf(), Entry::InProgress);
                        break;
                    }
                }
            }
        }
        debug!(path = %path.display(), "loading");
        self.run_loader(path, loader)
    }

    /// For a group of sibling imports that are all eligible next: returns
    /// whichever path is already cached, or claims and loads the first
    /// path nobody has started. Only blocks when every given path is
    /// mid-load on another thread. `Ok(None)` for an empty group.
    pub fn first_available<F>(
        &self,
        paths: &[PathBuf],
        loader: F,
    ) -> Result<Option<(PathBuf, ParsedFile)>, FatalError>
    where
        F: FnOnce(&Path) -> Option<Vec<Block>>,
    {
        if paths.is_empty() {
            return Ok(None);
        }
        let claimed: PathBuf;
        {
            let mut state = self.state.lock();
            loop {
                if state.poisoned {
                    return Err(FatalError::PoisonedCache);
                }
                let cached = paths.iter().find_map(|path| match state.entries.get(path) {
                    Some(Entry::Ready(parsed)) => Some((path.clone(), parsed.clone())),
                    _ => None,
                });
                if let Some(hit) = cached {
                    return Ok(Some(hit));
                }
                if let Some(path) = paths.iter().find(|p| !state.entries.contains_key(*p)) {
                    claimed = path.clone();
                    state.entries.insert(claimed.clone(), Entry::InProgress);
                    break;
                }
                self.ready.wait(&mut state);
            }
        }
        debug!(path = %claimed.display(), "loading first available");
        let parsed = self.run_loader(&claimed, || loader(&claimed))?;
        Ok(Some((claimed, parsed)))
    }

    fn run_loader<F>(&self, path: &Path, loader: F) -> Result<ParsedFile, FatalError>
    where
        F: FnOnce() -> Option<Vec<Block>>,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(loader));
        let mut state = self.state.lock();
        match outcome {
            Ok(parsed) => {
                let parsed = parsed.map(Arc::new);
                state
                    .entries
                    .insert(path.to_path_buf(), Entry::Ready(parsed.clone()));
                self.ready.notify_all();
                Ok(parsed)
            }
            Err(payload) => {
                state.poisoned = true;
                self.ready.notify_all();
                drop(state);
                panic::resume_unwind(payload)
            }
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.state.lock().poisoned
    }
}
