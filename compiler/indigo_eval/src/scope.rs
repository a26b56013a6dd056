//! The lexical scope chain.
//!
//! One frame holds the document-level variables and mixins; `@media` and
//! `@keyframes` bodies push a child frame for their local variables. Frames
//! are immutable once built and children share their parent, so a scope is
//! cheap to clone and hand down through the expansion walk.

use std::sync::Arc;

use indigo_ir::{MixinDeclaration, Value};
use rustc_hash::FxHashMap;

#[derive(Clone, Debug, Default)]
pub struct Scope {
    frame: Arc<Frame>,
}

#[derive(Debug, Default)]
struct Frame {
    variables: FxHashMap<String, Value>,
    mixins: FxHashMap<String, Arc<MixinDeclaration>>,
    parent: Option<Scope>,
}

impl Scope {
    /// The document scope, holding every top-level variable and mixin.
    pub fn root(
        variables: FxHashMap<String, Value>,
        mixins: FxHashMap<String, Arc<MixinDeclaration>>,
    ) -> Scope {
        Scope {
            frame: Arc::new(Frame {
                variables,
                mixins,
                parent: None,
            }),
        }
    }

    /// Pushes a child frame carrying block-local variables. Mixins cannot be
    /// declared inside nested bodies, so children only add variables.
    #[must_use]
    pub fn child(&self, variables: FxHashMap<String, Value>) -> Scope {
        Scope {
            frame: Arc::new(Frame {
                variables,
                mixins: FxHashMap::default(),
                parent: Some(self.clone()),
            }),
        }
    }

    /// The innermost binding of `@name`, walking outwards through parents.
    pub fn var(&self, name: &str) -> Option<&Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.frame.variables.get(name) {
                return Some(value);
            }
            match &scope.frame.parent {
                Some(parent) => scope = parent,
                None => return None,
            }
        }
    }

    /// The innermost declaration of the mixin `@name(...)`.
    pub fn mixin(&self, name: &str) -> Option<&Arc<MixinDeclaration>> {
        let mut scope = self;
        loop {
            if let Some(mixin) = scope.frame.mixins.get(name) {
                return Some(mixin);
            }
            match &scope.frame.parent {
                Some(parent) => scope = parent,
                None => return None,
            }
        }
    }
}
