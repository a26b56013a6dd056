//! Indigo IR - the block/property/value model
//!
//! This crate contains the data structures shared by the Indigo compiler:
//! - Spans and file origins for diagnostics
//! - Blocks (rules, media, keyframes, directives) and their properties
//! - The value expression language (numbers, colors, operators, references)
//! - Selectors and media queries with their canonical-equality rules
//! - Generic traversal over declaration-bearing nodes
//!
//! Trees are immutable: every pass consumes a `Vec<Block>` and builds a new
//! one. Nothing here touches the filesystem or records errors; that belongs
//! to the session and pass crates.

mod block;
mod color;
mod media;
mod property;
mod selector;
mod span;
mod unit;
mod value;
pub mod visit;

pub use block::{
    Block, BlockKind, FontFaceBlock, KeyFrame, KeyFramesBlock, MediaBlock, MixinDeclaration,
    MixinParam, ResetBlock, SelectorRule, SpriteDeclaration, SpriteImage,
};
pub use color::{keyword_color, keyword_of, Rgba};
pub use media::{MediaFeature, MediaQuery, MediaQueryTerm, Qualifier};
pub use property::{MixinArg, Property, PropertyKind};
pub use selector::Selector;
pub use span::{Origin, Span};
pub use unit::{Unit, UnitGroup};
pub use value::{format_number, BinOp, Value};
