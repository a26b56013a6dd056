//! Media queries.
//!
//! A query is a comma-list of terms, each `[only|not] [type] [and (feature)]*`.
//! Structural equality is what the merging stage groups by: case-insensitive,
//! whitespace-normalized, and insensitive to term order.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Qualifier {
    Only,
    Not,
}

impl Qualifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Qualifier::Only => "only",
            Qualifier::Not => "not",
        }
    }
}

/// One parenthesized clause, e.g. `(min-width: 768px)` or `(color)`.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaFeature {
    pub name: String,
    pub value: Option<Value>,
}

impl fmt::Display for MediaFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "({}: {value})", self.name),
            None => write!(f, "({})", self.name),
        }
    }
}

/// One comma-alternative of a media query.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaQueryTerm {
    pub qualifier: Option<Qualifier>,
    pub media_type: Option<String>,
    pub features: Vec<MediaFeature>,
}

impl MediaQueryTerm {
    fn canonical(&self) -> String {
        self.to_string().to_ascii_lowercase()
    }
}

impl fmt::Display for MediaQueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(qualifier) = self.qualifier {
            f.write_str(qualifier.keyword())?;
            wrote = true;
        }
        if let Some(media_type) = &self.media_type {
            if wrote {
                f.write_str(" ")?;
            }
            f.write_str(media_type)?;
            wrote = true;
        }
        for feature in &self.features {
            if wrote {
                f.write_str(" and ")?;
            }
            write!(f, "{feature}")?;
            wrote = true;
        }
        Ok(())
    }
}

/// The predicate after `@media`, or attached to `@using "file" <query>;`.
#[derive(Clone, Debug)]
pub struct MediaQuery {
    pub terms: Vec<MediaQueryTerm>,
}

impl Eq for MediaQuery {}

impl MediaQuery {
    pub fn new(terms: Vec<MediaQueryTerm>) -> MediaQuery {
        MediaQuery { terms }
    }

    /// A query with a bare media type and no features, e.g. `print`.
    pub fn of_type(media_type: impl Into<String>) -> MediaQuery {
        MediaQuery {
            terms: vec![MediaQueryTerm {
                qualifier: None,
                media_type: Some(media_type.into()),
                features: Vec::new(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Lowercased term texts, sorted. Equality and hashing go through this
    /// so `screen, print` groups with `print, screen`.
    fn canonical_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.terms.iter().map(MediaQueryTerm::canonical).collect();
        terms.sort();
        terms
    }
}

impl PartialEq for MediaQuery {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_terms() == other.canonical_terms()
    }
}

impl Hash for MediaQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_terms().hash(state);
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}
