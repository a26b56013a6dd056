//! Top-level and nested statement blocks.
//!
//! Blocks are immutable value trees. A pass that wants to change one builds
//! a replacement; intermediate trees stay valid for diagnostics that hold
//! references into them.

use std::fmt;

use crate::media::MediaQuery;
use crate::property::Property;
use crate::selector::Selector;
use crate::span::Origin;
use crate::value::Value;

#[derive(Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub origin: Origin,
}

impl Block {
    pub fn new(kind: BlockKind, origin: Origin) -> Block {
        Block { kind, origin }
    }

    pub fn rule(selector: Selector, properties: Vec<Property>, origin: Origin) -> Block {
        Block {
            kind: BlockKind::SelectorRule(SelectorRule {
                selector,
                properties,
                from_reset: false,
            }),
            origin,
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(self.kind, BlockKind::Import { .. })
    }

    pub fn is_charset(&self) -> bool {
        matches!(self.kind, BlockKind::Charset { .. })
    }

    pub fn as_rule(&self) -> Option<&SelectorRule> {
        match &self.kind {
            BlockKind::SelectorRule(rule) => Some(rule),
            _ => None,
        }
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.origin)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    SelectorRule(SelectorRule),
    Media(MediaBlock),
    KeyFrames(KeyFramesBlock),
    FontFace(FontFaceBlock),
    /// `@import <value>;` — emitted, reordered to the front.
    Import { value: Value },
    /// `@using "path" [media];` — source-only, resolved away before any
    /// other pass runs.
    Using {
        path: String,
        media: Option<MediaQuery>,
    },
    /// `@charset "NAME";`
    Charset { name: String },
    /// Top-level `@name = value;`
    VariableDeclaration { name: String, value: Value },
    MixinDeclaration(MixinDeclaration),
    Sprite(SpriteDeclaration),
    /// `@reset { ... }` — feeds `@reset()` references, never emitted.
    Reset(ResetBlock),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectorRule {
    pub selector: Selector,
    pub properties: Vec<Property>,
    /// Rule was unrolled out of a `@reset` body. Such rules are copy
    /// sources for `@reset()` references and are dropped before write.
    pub from_reset: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaBlock {
    pub query: MediaQuery,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyFramesBlock {
    pub name: String,
    /// Vendor prefix including hyphens, e.g. `-webkit-`, for the
    /// `@-webkit-keyframes` spelling. Empty for the standard form.
    pub prefix: String,
    /// Local `@name = value;` declarations preceding the frames.
    pub variables: Vec<Property>,
    pub frames: Vec<KeyFrame>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyFrame {
    /// Frame stops as written: `from`, `to`, `0%`, `50%`, ...
    pub stops: Vec<String>,
    pub properties: Vec<Property>,
    pub origin: Origin,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FontFaceBlock {
    pub properties: Vec<Property>,
}

/// Parameter of a mixin declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct MixinParam {
    pub name: String,
    pub default: Option<Value>,
    /// `name?` — bound in scope but not emitted as a declaration.
    pub hidden: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MixinDeclaration {
    pub name: String,
    pub params: Vec<MixinParam>,
    pub properties: Vec<Property>,
}

impl MixinDeclaration {
    pub fn param(&self, name: &str) -> Option<&MixinParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// One named source image of a sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteImage {
    pub name: String,
    pub path: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpriteDeclaration {
    /// Path of the packed image to produce.
    pub output: String,
    pub images: Vec<SpriteImage>,
}

impl SpriteDeclaration {
    /// Sprite name: the output file stem with non-identifier characters
    /// replaced by `-`. `img/all.png` with image `logo` yields the hidden
    /// mixin `all-logo`.
    pub fn name(&self) -> String {
        let stem = self
            .output
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.output);
        let stem = stem.split('.').next().unwrap_or(stem);
        stem.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }

    pub fn mixin_name(&self, image: &str) -> String {
        format!("{}-{image}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResetBlock {
    pub blocks: Vec<Block>,
}
