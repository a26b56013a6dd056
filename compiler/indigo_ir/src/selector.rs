//! Selectors and selector combination.
//!
//! A selector is one or more comma-separated alternatives, each stored as a
//! whitespace-normalized string. Equality is by canonical written form,
//! case-insensitive — that is the matching rule for `@(selector)` includes
//! and `@reset(selector)` references.

use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

/// A selector: one alternative, or several joined by commas.
#[derive(Clone, Debug, Eq)]
pub struct Selector {
    parts: SmallVec<[String; 2]>,
}

impl Selector {
    /// Build from raw text, splitting on top-level commas and collapsing
    /// interior whitespace runs to single spaces.
    pub fn parse(text: &str) -> Selector {
        let parts = text
            .split(',')
            .map(normalize_part)
            .filter(|part| !part.is_empty())
            .collect();
        Selector { parts }
    }

    /// A selector with a single pre-normalized alternative.
    pub fn simple(part: impl Into<String>) -> Selector {
        let mut parts = SmallVec::new();
        parts.push(normalize_part(&part.into()));
        Selector { parts }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Comma alternatives in written order.
    pub fn alternatives(&self) -> &[String] {
        &self.parts
    }

    /// True when the selector has more than one alternative.
    pub fn is_multi(&self) -> bool {
        self.parts.len() > 1
    }

    /// Canonical written form: alternatives joined by `", "`.
    pub fn canonical(&self) -> String {
        self.parts.join(", ")
    }

    /// Case-insensitive match against another selector's canonical form.
    pub fn matches(&self, other: &Selector) -> bool {
        self == other
    }

    /// Combine a nested selector under this parent.
    ///
    /// Each `parent × child` pair produces one alternative: a child
    /// containing `&` has the parent spliced in at every `&`; otherwise the
    /// descendant combination `parent child` applies.
    #[must_use]
    pub fn combine(&self, child: &Selector) -> Selector {
        let mut parts = SmallVec::new();
        for parent in &self.parts {
            for nested in &child.parts {
                if nested.contains('&') {
                    parts.push(normalize_part(&nested.replace('&', parent)));
                } else {
                    parts.push(format!("{parent} {nested}"));
                }
            }
        }
        Selector { parts }
    }

    /// Copy with alternatives sorted, for order-insensitive comparison.
    #[must_use]
    pub fn sorted(&self) -> Selector {
        let mut parts = self.parts.clone();
        parts.sort();
        Selector { parts }
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.parts.len() == other.parts.len()
            && self
                .parts
                .iter()
                .zip(&other.parts)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Hash for Selector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for part in &self.parts {
            part.to_ascii_lowercase().hash(state);
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(part)?;
        }
        Ok(())
    }
}

fn normalize_part(part: &str) -> String {
    part.split_whitespace().collect::<Vec<_>>().join(" ")
}
