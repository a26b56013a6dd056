//! Compile options.

use bitflags::bitflags;

bitflags! {
    /// Option bit-set carried by every [`crate::CompileContext`].
    ///
    /// Contexts compiled under different options must never be merged;
    /// the merge asserts on this.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct CompileOptions: u8 {
        /// Shorten values and collapse shorthands; write minimal CSS.
        const MINIFY = 1 << 0;
        /// Record every warning as an error.
        const WARNINGS_AS_ERRORS = 1 << 1;
        /// Reorder independent rules for better gzip compression.
        const OPTIMIZE_COMPRESSION = 1 << 2;
        /// Append content-hash query strings to URL values.
        const CACHE_BREAKERS = 1 << 3;
        /// Synthesize vendor-prefixed declarations.
        const AUTO_PREFIX = 1 << 4;
    }
}

impl CompileOptions {
    pub fn minify(self) -> bool {
        self.contains(CompileOptions::MINIFY)
    }

    pub fn warnings_as_errors(self) -> bool {
        self.contains(CompileOptions::WARNINGS_AS_ERRORS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_compose() {
        let options = CompileOptions::MINIFY | CompileOptions::CACHE_BREAKERS;
        assert!(options.minify());
        assert!(!options.warnings_as_errors());
        assert!(options.contains(CompileOptions::CACHE_BREAKERS));
    }
}
