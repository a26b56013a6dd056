//! Properties: the statements inside a rule body.

use std::fmt;

use crate::media::MediaQuery;
use crate::selector::Selector;
use crate::span::Origin;
use crate::value::Value;

/// One statement inside a `selector { ... }` body (or a frame, or a
/// `@font-face`). Carries its origin for diagnostics.
#[derive(Clone, PartialEq)]
pub struct Property {
    pub kind: PropertyKind,
    pub origin: Origin,
}

impl Property {
    pub fn new(kind: PropertyKind, origin: Origin) -> Property {
        Property { kind, origin }
    }

    /// Plain `name: value` declaration.
    pub fn name_value(name: impl Into<String>, value: Value, origin: Origin) -> Property {
        Property {
            kind: PropertyKind::NameValue {
                name: name.into(),
                value,
                important: false,
            },
            origin,
        }
    }

    /// The declared name if this is a `NameValue`, lowercased for
    /// duplicate checks.
    pub fn name_key(&self) -> Option<String> {
        match &self.kind {
            PropertyKind::NameValue { name, .. } => Some(name.to_ascii_lowercase()),
            _ => None,
        }
    }

    pub fn is_name_value(&self) -> bool {
        matches!(self.kind, PropertyKind::NameValue { .. })
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.origin)
    }
}

/// Argument to a mixin application: positional, or named via `name: expr`.
#[derive(Clone, Debug, PartialEq)]
pub struct MixinArg {
    pub name: Option<String>,
    pub value: Value,
}

impl MixinArg {
    pub fn positional(value: Value) -> MixinArg {
        MixinArg { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Value) -> MixinArg {
        MixinArg {
            name: Some(name.into()),
            value,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKind {
    /// `color: red` / `color: red !important`.
    NameValue {
        name: String,
        value: Value,
        important: bool,
    },
    /// `@accent = #803bd0;` — scope-local binding, never emitted.
    VariableAssignment { name: String, value: Value },
    /// `@rounded(4px)` / `@rounded?(4px)` / `@rounded(4px)!`.
    MixinApplication {
        name: String,
        args: Vec<MixinArg>,
        /// `@name?()` — silently skipped when no such mixin exists.
        optional: bool,
        /// `@name()!` — expanded declarations replace same-named ones.
        override_existing: bool,
    },
    /// `@(selector)` / `@(selector)!` — copy declarations from the rule
    /// with a matching selector.
    IncludeSelector {
        selector: Selector,
        override_existing: bool,
    },
    /// `nested-selector { ... }` before unrolling.
    NestedBlock {
        selector: Selector,
        properties: Vec<Property>,
    },
    /// `@media query { ... }` inside a rule, before unrolling.
    InnerMedia {
        query: MediaQuery,
        properties: Vec<Property>,
    },
    /// `@reset()` / `@reset(selector)`.
    ResetReference { selector: Option<Selector> },
}
