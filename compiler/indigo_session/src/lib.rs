//! Session state for the Indigo compiler.
//!
//! Everything a compile threads through its passes lives here: the option
//! bit-set, the per-compilation context, the concurrent file cache, the
//! file and sprite collaborator interfaces, the dependency graph, and the
//! fatal-error type that aborts a compile.

mod cache;
mod context;
mod error;
mod graph;
mod lookup;
mod options;
mod sprite;

pub use cache::{FileCache, ParsedFile};
pub use context::CompileContext;
pub use error::FatalError;
pub use graph::DependencyGraph;
pub use lookup::{DiskLookup, FileLookup, MemoryLookup};
pub use options::CompileOptions;
pub use sprite::{
    FixedGridBackend, PackResult, PackedImage, Placement, SpriteBackend, SpriteExport, SpriteInput,
};
