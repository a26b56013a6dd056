//! Indigo CSS writer
//!
//! Pure serialization of a finished block sequence to CSS text. Two modes:
//!
//! - **Pretty**: two-space indentation, one declaration per line, a blank
//!   line between top-level blocks.
//! - **Minimal**: no structural whitespace, declarations separated by `;`
//!   with the final `;` of each body omitted.
//!
//! The writer has no decision logic of its own: it spells out whatever the
//! pipeline hands it. Source-only kinds (`@using`, declarations, sprite and
//! reset blocks, rules unrolled out of `@reset`) have no CSS form and
//! serialize to nothing; the pipeline drops them before write, so seeing one
//! here is harmless.

use std::fmt::Write as _;

use indigo_ir::{
    Block, BlockKind, FontFaceBlock, KeyFramesBlock, MediaBlock, MediaQuery, Property,
    PropertyKind, Selector, SelectorRule, Value,
};

/// Output layout for the serializer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Pretty,
    Minimal,
}

impl WriteMode {
    fn is_minimal(self) -> bool {
        self == WriteMode::Minimal
    }
}

/// Serialize a whole document.
pub fn write_document(blocks: &[Block], mode: WriteMode) -> String {
    let mut writer = CssWriter::new(mode);
    writer.document(blocks);
    writer.finish()
}

/// Serialize a single block, e.g. for length comparison during reordering.
pub fn write_block(block: &Block, mode: WriteMode) -> String {
    let mut writer = CssWriter::new(mode);
    writer.block(block, 0);
    writer.finish()
}

/// Serialize a declaration list without the surrounding rule, e.g. for the
/// shorter-wins check in shorthand collapsing.
pub fn write_declarations(properties: &[Property], mode: WriteMode) -> String {
    let mut writer = CssWriter::new(mode);
    writer.declarations(properties, 0);
    writer.finish()
}

/// Incremental CSS writer over a growing string buffer.
pub struct CssWriter {
    out: String,
    mode: WriteMode,
}

impl CssWriter {
    pub fn new(mode: WriteMode) -> CssWriter {
        CssWriter {
            out: String::new(),
            mode,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    /// Write all blocks, blank-line separated in pretty mode.
    pub fn document(&mut self, blocks: &[Block]) {
        let mut first = true;
        for block in blocks {
            if !emits_css(block) {
                continue;
            }
            if !first && !self.mode.is_minimal() {
                self.out.push('\n');
            }
            self.block(block, 0);
            first = false;
        }
    }

    /// Write one block at the given indentation depth.
    pub fn block(&mut self, block: &Block, depth: usize) {
        match &block.kind {
            BlockKind::SelectorRule(rule) => self.rule(rule, depth),
            BlockKind::Media(media) => self.media(media, depth),
            BlockKind::KeyFrames(frames) => self.keyframes(frames, depth),
            BlockKind::FontFace(font) => self.font_face(font, depth),
            BlockKind::Import { value } => {
                self.indent(depth);
                self.out.push_str("@import ");
                self.value(value);
                self.out.push(';');
                self.newline();
            }
            BlockKind::Charset { name } => {
                self.indent(depth);
                write!(self.out, "@charset \"{name}\";").ok();
                self.newline();
            }
            BlockKind::Using { .. }
            | BlockKind::VariableDeclaration { .. }
            | BlockKind::MixinDeclaration(_)
            | BlockKind::Sprite(_)
            | BlockKind::Reset(_) => {}
        }
    }

    fn rule(&mut self, rule: &SelectorRule, depth: usize) {
        if rule.from_reset {
            return;
        }
        self.indent(depth);
        self.selector(&rule.selector);
        self.open_brace();
        self.declarations(&rule.properties, depth + 1);
        self.close_brace(depth);
    }

    fn media(&mut self, media: &MediaBlock, depth: usize) {
        self.indent(depth);
        self.out.push_str("@media ");
        self.query(&media.query);
        self.open_brace();
        for inner in &media.blocks {
            if emits_css(inner) {
                self.block(inner, depth + 1);
            }
        }
        self.close_brace(depth);
    }

    fn keyframes(&mut self, frames: &KeyFramesBlock, depth: usize) {
        self.indent(depth);
        write!(self.out, "@{}keyframes ", frames.prefix).ok();
        self.out.push_str(&frames.name);
        self.open_brace();
        for frame in &frames.frames {
            self.indent(depth + 1);
            let separator = if self.mode.is_minimal() { "," } else { ", " };
            for (i, stop) in frame.stops.iter().enumerate() {
                if i > 0 {
                    self.out.push_str(separator);
                }
                self.out.push_str(stop);
            }
            self.open_brace();
            self.declarations(&frame.properties, depth + 2);
            self.close_brace(depth + 1);
        }
        self.close_brace(depth);
    }

    fn font_face(&mut self, font: &FontFaceBlock, depth: usize) {
        self.indent(depth);
        self.out.push_str("@font-face");
        self.open_brace();
        self.declarations(&font.properties, depth + 1);
        self.close_brace(depth);
    }

    /// Write the `name: value` declarations of a body. Non-declaration
    /// property kinds are pipeline-internal and spell out to nothing.
    pub fn declarations(&mut self, properties: &[Property], depth: usize) {
        let minimal = self.mode.is_minimal();
        let mut pending_separator = false;
        for property in properties {
            let PropertyKind::NameValue {
                name,
                value,
                important,
            } = &property.kind
            else {
                continue;
            };
            if pending_separator {
                self.out.push(';');
            }
            self.indent(depth);
            self.out.push_str(name);
            self.out.push(':');
            if !minimal {
                self.out.push(' ');
            }
            self.value(value);
            if *important {
                if minimal {
                    self.out.push_str("!important");
                } else {
                    self.out.push_str(" !important");
                }
            }
            if minimal {
                pending_separator = true;
            } else {
                self.out.push(';');
                self.newline();
            }
        }
    }

    fn selector(&mut self, selector: &Selector) {
        let separator = if self.mode.is_minimal() { "," } else { ", " };
        for (i, part) in selector.alternatives().iter().enumerate() {
            if i > 0 {
                self.out.push_str(separator);
            }
            self.out.push_str(part);
        }
    }

    fn query(&mut self, query: &MediaQuery) {
        let separator = if self.mode.is_minimal() { "," } else { ", " };
        for (i, term) in query.terms.iter().enumerate() {
            if i > 0 {
                self.out.push_str(separator);
            }
            let mut wrote = false;
            if let Some(qualifier) = term.qualifier {
                self.out.push_str(qualifier.keyword());
                wrote = true;
            }
            if let Some(media_type) = &term.media_type {
                if wrote {
                    self.out.push(' ');
                }
                self.out.push_str(media_type);
                wrote = true;
            }
            for feature in &term.features {
                if wrote {
                    self.out.push_str(" and ");
                }
                self.out.push('(');
                self.out.push_str(&feature.name);
                if let Some(value) = &feature.value {
                    self.out.push(':');
                    if !self.mode.is_minimal() {
                        self.out.push(' ');
                    }
                    self.value(value);
                }
                self.out.push(')');
                wrote = true;
            }
        }
    }

    /// Write a value. Leaf kinds defer to their canonical [`std::fmt::Display`]
    /// form; sequence kinds get mode-dependent separators.
    pub fn value(&mut self, value: &Value) {
        match value {
            Value::Compound(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push(' ');
                    }
                    self.value(item);
                }
            }
            Value::List(items) => {
                let separator = if self.mode.is_minimal() { "," } else { ", " };
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(separator);
                    }
                    self.value(item);
                }
            }
            Value::Call { name, args } => {
                self.out.push_str(name);
                self.out.push('(');
                let separator = if self.mode.is_minimal() { "," } else { ", " };
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(separator);
                    }
                    self.value(arg);
                }
                self.out.push(')');
            }
            other => {
                write!(self.out, "{other}").ok();
            }
        }
    }

    fn open_brace(&mut self) {
        if self.mode.is_minimal() {
            self.out.push('{');
        } else {
            self.out.push_str(" {\n");
        }
    }

    fn close_brace(&mut self, depth: usize) {
        if self.mode.is_minimal() {
            self.out.push('}');
        } else {
            self.indent(depth);
            self.out.push_str("}\n");
        }
    }

    fn indent(&mut self, depth: usize) {
        if !self.mode.is_minimal() {
            for _ in 0..depth * 2 {
                self.out.push(' ');
            }
        }
    }

    fn newline(&mut self) {
        if !self.mode.is_minimal() {
            self.out.push('\n');
        }
    }
}

/// True when the block has a CSS spelling at all.
fn emits_css(block: &Block) -> bool {
    match &block.kind {
        BlockKind::SelectorRule(rule) => !rule.from_reset,
        BlockKind::Media(_)
        | BlockKind::KeyFrames(_)
        | BlockKind::FontFace(_)
        | BlockKind::Import { .. }
        | BlockKind::Charset { .. } => true,
        BlockKind::Using { .. }
        | BlockKind::VariableDeclaration { .. }
        | BlockKind::MixinDeclaration(_)
        | BlockKind::Sprite(_)
        | BlockKind::Reset(_) => false,
    }
}
