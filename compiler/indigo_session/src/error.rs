//! Fatal errors that abort a compilation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Unwinds straight to the driver. The diagnostics accumulated so far on
/// the context remain valid and are reported; no further pass runs.
#[derive(Debug, Error)]
pub enum FatalError {
    /// A structurally unrecoverable user error was recorded (duplicate
    /// names, conflicting charsets, illegal media nesting, ambiguous
    /// override). The details are on the context.
    #[error("compilation stopped")]
    StoppedCompiling,

    /// A parse loader panicked mid-flight. The shared cache can no longer
    /// vouch for its contents, so every subsequent compile in this process
    /// fails fast.
    #[error("file cache poisoned by a crashed load")]
    PoisonedCache,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FatalError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> FatalError {
        FatalError::Io {
            path: path.into(),
            source,
        }
    }
}
