//! Statement and property parsing.
//!
//! The top-level loop dispatches on the identifier after `@`; anything else
//! is a `selector { ... }` rule. Inside a rule body the same dispatch picks
//! apart assignments, mixin applications, selector includes, `@reset()`
//! references, nested blocks, and inner `@media` blocks.
//!
//! A single malformed statement invalidates the whole file: sub-parsers
//! record a diagnostic and return [`Abort`], which unwinds to the entry
//! point in `lib.rs`.

use std::path::PathBuf;
use std::sync::Arc;

use indigo_diagnostic::Phase;
use indigo_ir::{
    Block, BlockKind, FontFaceBlock, KeyFrame, KeyFramesBlock, MediaBlock, MixinArg,
    MixinDeclaration, MixinParam, Origin, Property, PropertyKind, ResetBlock, Selector, Span,
    SpriteDeclaration, SpriteImage, Value,
};
use indigo_session::CompileContext;
use indigo_stack::ensure_sufficient_stack;

use crate::media::parse_media_query;
use crate::reader::{is_ident_byte, Reader};
use crate::values::parse_value;
use crate::{Abort, PResult};

/// Names that may not be declared as variables, mixins, or parameters.
const RESERVED_NAMES: [&str; 6] = [
    "arguments",
    "reset",
    "keyframes",
    "using",
    "import",
    "charset",
];

fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
}

pub(crate) struct Parser<'src, 'ctx> {
    reader: Reader<'src>,
    file: Arc<PathBuf>,
    ctx: &'ctx mut CompileContext,
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    pub(crate) fn new(
        source: &'src str,
        file: Arc<PathBuf>,
        ctx: &'ctx mut CompileContext,
    ) -> Parser<'src, 'ctx> {
        Parser {
            reader: Reader::new(source),
            file,
            ctx,
        }
    }

    pub(crate) fn parse_document(&mut self) -> PResult<Vec<Block>> {
        let mut blocks = Vec::new();
        loop {
            while self.reader.eat(b';') {}
            if self.reader.at_end() {
                break;
            }
            blocks.push(self.parse_statement()?);
        }
        self.warn_late_imports(&blocks);
        Ok(blocks)
    }

    fn origin(&self, start: u32) -> Origin {
        Origin::new(
            Arc::clone(&self.file),
            Span::new(start, self.reader.offset().max(start)),
        )
    }

    fn error(&mut self, at: u32, message: String) -> Abort {
        let origin = self.origin(at);
        self.ctx.error(Phase::Parser, message, origin);
        Abort
    }

    fn error_at(&mut self, origin: Origin, message: String) -> Abort {
        self.ctx.error(Phase::Parser, message, origin);
        Abort
    }

    fn parse_statement(&mut self) -> PResult<Block> {
        ensure_sufficient_stack(|| self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> PResult<Block> {
        self.reader.skip_trivia();
        let start = self.reader.offset();
        if self.reader.peek() == Some(b'@') {
            self.parse_directive(start)
        } else {
            self.parse_selector_rule(start)
        }
    }

    fn parse_directive(&mut self, start: u32) -> PResult<Block> {
        self.reader.bump();
        let name = self.reader.read_ident().to_string();
        if name.is_empty() {
            return Err(self.error(start, "expected a name after `@`".to_string()));
        }
        if name.eq_ignore_ascii_case("import") {
            return self.parse_import(start);
        }
        if name.eq_ignore_ascii_case("using") {
            return self.parse_using(start);
        }
        if name.eq_ignore_ascii_case("charset") {
            return self.parse_charset(start);
        }
        if name.eq_ignore_ascii_case("media") {
            return self.parse_media_block(start);
        }
        if name.eq_ignore_ascii_case("font-face") {
            return self.parse_font_face(start);
        }
        if name.eq_ignore_ascii_case("reset") {
            return self.parse_reset(start);
        }
        if name.eq_ignore_ascii_case("sprite") {
            return self.parse_sprite(start);
        }
        if let Some(prefix) = keyframes_prefix(&name) {
            return self.parse_keyframes(start, prefix);
        }
        self.parse_declaration(start, name)
    }

    /// `@import <target>;`
    fn parse_import(&mut self, start: u32) -> PResult<Block> {
        self.reader.skip_trivia();
        let value_base = self.reader.offset();
        let Some((text, _)) = self.reader.scan_until(&[b';']) else {
            return Err(self.error(start, "unterminated `@import`".to_string()));
        };
        if text.trim().is_empty() {
            return Err(self.error(start, "expected an import target".to_string()));
        }
        let value = parse_value(text, value_base, &self.file, self.ctx)?;
        Ok(Block::new(BlockKind::Import { value }, self.origin(start)))
    }

    /// `@using "path" [media-query];`
    fn parse_using(&mut self, start: u32) -> PResult<Block> {
        let path = self.parse_quoted(start, "`@using`")?;
        self.reader.skip_trivia();
        let media_base = self.reader.offset();
        let Some((media_text, _)) = self.reader.scan_until(&[b';']) else {
            return Err(self.error(start, "unterminated `@using`".to_string()));
        };
        let media = if media_text.trim().is_empty() {
            None
        } else {
            Some(parse_media_query(media_text, media_base, &self.file, self.ctx)?)
        };
        Ok(Block::new(
            BlockKind::Using { path, media },
            self.origin(start),
        ))
    }

    /// `@charset "NAME";`
    fn parse_charset(&mut self, start: u32) -> PResult<Block> {
        let name = self.parse_quoted(start, "`@charset`")?;
        if !self.reader.eat(b';') {
            return Err(self.error(start, "expected `;` after `@charset`".to_string()));
        }
        Ok(Block::new(BlockKind::Charset { name }, self.origin(start)))
    }

    fn parse_quoted(&mut self, start: u32, after: &str) -> PResult<String> {
        self.reader.skip_trivia();
        let quote = match self.reader.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(self.error(start, format!("expected a quoted string after {after}")));
            }
        };
        self.reader.bump();
        match self.reader.read_quoted(quote) {
            Some(text) => Ok(text.to_string()),
            None => Err(self.error(start, "unterminated string".to_string())),
        }
    }

    /// `@media <query> { <rules and variable declarations> }`
    fn parse_media_block(&mut self, start: u32) -> PResult<Block> {
        self.reader.skip_trivia();
        let query_base = self.reader.offset();
        let Some((query_text, _)) = self.reader.scan_until(&[b'{']) else {
            return Err(self.error(start, "expected `{` after `@media`".to_string()));
        };
        let query = parse_media_query(query_text, query_base, &self.file, self.ctx)?;
        let blocks = self.parse_block_body(start, "@media")?;
        Ok(Block::new(
            BlockKind::Media(MediaBlock { query, blocks }),
            self.origin(start),
        ))
    }

    /// `@reset { <rules> }`
    fn parse_reset(&mut self, start: u32) -> PResult<Block> {
        if !self.reader.eat(b'{') {
            return Err(self.error(start, "expected `{` after `@reset`".to_string()));
        }
        let blocks = self.parse_block_body(start, "@reset")?;
        Ok(Block::new(
            BlockKind::Reset(ResetBlock { blocks }),
            self.origin(start),
        ))
    }

    /// Shared body loop for `@media` and `@reset`: rules and variable
    /// declarations only. The opening `{` is already consumed.
    fn parse_block_body(&mut self, start: u32, inside: &str) -> PResult<Vec<Block>> {
        let mut blocks = Vec::new();
        loop {
            while self.reader.eat(b';') {}
            self.reader.skip_trivia();
            match self.reader.peek() {
                None => {
                    return Err(self.error(start, format!("unterminated `{inside}` block")));
                }
                Some(b'}') => {
                    self.reader.bump();
                    return Ok(blocks);
                }
                _ => {
                    let block = self.parse_statement()?;
                    match &block.kind {
                        BlockKind::SelectorRule(_) | BlockKind::VariableDeclaration { .. } => {
                            blocks.push(block);
                        }
                        _ => {
                            let origin = block.origin.clone();
                            return Err(self.error_at(
                                origin,
                                format!(
                                    "only rules and variable declarations can appear inside `{inside}`"
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }

    /// `@keyframes name { @x = v; from { ... } 50%, 75% { ... } }`
    fn parse_keyframes(&mut self, start: u32, prefix: String) -> PResult<Block> {
        self.reader.skip_trivia();
        let at = self.reader.offset();
        let name = self.reader.read_ident().to_string();
        if name.is_empty() {
            return Err(self.error(at, "expected a name after `@keyframes`".to_string()));
        }
        if !self.reader.eat(b'{') {
            return Err(self.error(start, "expected `{` after `@keyframes`".to_string()));
        }

        let mut variables = Vec::new();
        let mut frames = Vec::new();
        loop {
            while self.reader.eat(b';') {}
            self.reader.skip_trivia();
            let item_start = self.reader.offset();
            match self.reader.peek() {
                None => {
                    return Err(self.error(start, "unterminated `@keyframes` block".to_string()));
                }
                Some(b'}') => {
                    self.reader.bump();
                    break;
                }
                Some(b'@') => {
                    self.reader.bump();
                    let var_name = self.reader.read_ident().to_string();
                    self.check_declared_name(item_start, &var_name)?;
                    self.reader.skip_trivia();
                    if !self.reader.eat(b'=') {
                        return Err(
                            self.error(item_start, format!("expected `=` after `@{var_name}`"))
                        );
                    }
                    let value = self.parse_value_to_semicolon(item_start)?;
                    variables.push(Property::new(
                        PropertyKind::VariableAssignment {
                            name: var_name,
                            value,
                        },
                        self.origin(item_start),
                    ));
                }
                _ => {
                    let Some((stops_text, _)) = self.reader.scan_until(&[b'{']) else {
                        return Err(
                            self.error(item_start, "expected `{` after frame stops".to_string())
                        );
                    };
                    let mut stops = Vec::new();
                    for stop in stops_text.split(',') {
                        let stop = stop.trim();
                        if stop.is_empty() {
                            return Err(
                                self.error(item_start, "expected a frame stop".to_string())
                            );
                        }
                        stops.push(stop.to_string());
                    }
                    let properties = self.parse_rule_body()?;
                    frames.push(KeyFrame {
                        stops,
                        properties,
                        origin: self.origin(item_start),
                    });
                }
            }
        }

        Ok(Block::new(
            BlockKind::KeyFrames(KeyFramesBlock {
                name,
                prefix,
                variables,
                frames,
            }),
            self.origin(start),
        ))
    }

    /// `@font-face { declarations }`
    fn parse_font_face(&mut self, start: u32) -> PResult<Block> {
        if !self.reader.eat(b'{') {
            return Err(self.error(start, "expected `{` after `@font-face`".to_string()));
        }
        let properties = self.parse_rule_body()?;
        Ok(Block::new(
            BlockKind::FontFace(FontFaceBlock { properties }),
            self.origin(start),
        ))
    }

    /// `@sprite("out.png") { name: "image.png"; ... }`
    fn parse_sprite(&mut self, start: u32) -> PResult<Block> {
        if !self.reader.eat(b'(') {
            return Err(self.error(start, "expected `(` after `@sprite`".to_string()));
        }
        let output = self.parse_quoted(start, "`@sprite(`")?;
        if !self.reader.eat(b')') {
            return Err(self.error(start, "expected `)` after the sprite output path".to_string()));
        }
        if !self.reader.eat(b'{') {
            return Err(self.error(start, "expected `{` after `@sprite(...)`".to_string()));
        }

        let mut images = Vec::new();
        loop {
            while self.reader.eat(b';') {}
            self.reader.skip_trivia();
            let item_start = self.reader.offset();
            match self.reader.peek() {
                None => {
                    return Err(self.error(start, "unterminated `@sprite` block".to_string()));
                }
                Some(b'}') => {
                    self.reader.bump();
                    break;
                }
                _ => {
                    let name = self.reader.read_ident().to_string();
                    if name.is_empty() {
                        return Err(
                            self.error(item_start, "expected a sprite image name".to_string())
                        );
                    }
                    if !self.reader.eat(b':') {
                        return Err(
                            self.error(item_start, format!("expected `:` after `{name}`"))
                        );
                    }
                    let path = self.parse_quoted(item_start, "the sprite image name")?;
                    self.finish_property(item_start)?;
                    images.push(SpriteImage { name, path });
                }
            }
        }

        Ok(Block::new(
            BlockKind::Sprite(SpriteDeclaration { output, images }),
            self.origin(start),
        ))
    }

    /// Top-level `@name = value;` or `@name(params) { declarations }`.
    fn parse_declaration(&mut self, start: u32, name: String) -> PResult<Block> {
        self.check_declared_name(start, &name)?;
        self.reader.skip_trivia();
        match self.reader.peek() {
            Some(b'=') => {
                self.reader.bump();
                let value = self.parse_value_to_semicolon(start)?;
                Ok(Block::new(
                    BlockKind::VariableDeclaration { name, value },
                    self.origin(start),
                ))
            }
            Some(b'(') => {
                self.reader.bump();
                let params = self.parse_mixin_params(start)?;
                if !self.reader.eat(b'{') {
                    return Err(
                        self.error(start, format!("expected `{{` after `@{name}(...)`"))
                    );
                }
                let properties = self.parse_rule_body()?;
                Ok(Block::new(
                    BlockKind::MixinDeclaration(MixinDeclaration {
                        name,
                        params,
                        properties,
                    }),
                    self.origin(start),
                ))
            }
            _ => Err(self.error(start, format!("expected `=` or `(` after `@{name}`"))),
        }
    }

    fn check_declared_name(&mut self, at: u32, name: &str) -> PResult<()> {
        if name.is_empty() {
            return Err(self.error(at, "expected a name after `@`".to_string()));
        }
        if is_reserved(name) {
            return Err(self.error(at, format!("`{name}` is a reserved name")));
        }
        Ok(())
    }

    /// Parameter list of a mixin declaration. The reader sits after `(`.
    fn parse_mixin_params(&mut self, start: u32) -> PResult<Vec<MixinParam>> {
        let mut params = Vec::new();
        if self.reader.eat(b')') {
            return Ok(params);
        }
        loop {
            self.reader.skip_trivia();
            let at = self.reader.offset();
            let name = self.reader.read_ident().to_string();
            self.check_declared_name(at, &name)?;
            let hidden = self.reader.peek() == Some(b'?');
            if hidden {
                self.reader.bump();
            }
            self.reader.skip_trivia();
            match self.reader.peek() {
                Some(b':') => {
                    self.reader.bump();
                    self.reader.skip_trivia();
                    let value_base = self.reader.offset();
                    let Some((raw, stop)) = self.reader.scan_until(&[b',', b')']) else {
                        return Err(self.error(start, "unbalanced `(`".to_string()));
                    };
                    if raw.trim().is_empty() {
                        return Err(
                            self.error(at, format!("expected a default value for `{name}`"))
                        );
                    }
                    let default = parse_value(raw, value_base, &self.file, self.ctx)?;
                    params.push(MixinParam {
                        name,
                        default: Some(default),
                        hidden,
                    });
                    if stop == b')' {
                        break;
                    }
                }
                Some(b',') => {
                    self.reader.bump();
                    params.push(MixinParam {
                        name,
                        default: None,
                        hidden,
                    });
                }
                Some(b')') => {
                    self.reader.bump();
                    params.push(MixinParam {
                        name,
                        default: None,
                        hidden,
                    });
                    break;
                }
                _ => {
                    return Err(self.error(at, "expected `,` or `)` in parameter list".to_string()));
                }
            }
        }
        Ok(params)
    }

    /// `selector { properties }`
    fn parse_selector_rule(&mut self, start: u32) -> PResult<Block> {
        let Some((selector_text, _)) = self.reader.scan_until(&[b'{']) else {
            return Err(self.error(start, "expected `{` after a selector".to_string()));
        };
        let selector_text = selector_text.trim();
        if selector_text.is_empty() {
            return Err(self.error(start, "expected a selector".to_string()));
        }
        let properties = self.parse_rule_body()?;
        Ok(Block::rule(
            Selector::parse(selector_text),
            properties,
            self.origin(start),
        ))
    }

    /// Declarations between `{` and `}`. The opening brace is already
    /// consumed; the closing one is consumed here.
    fn parse_rule_body(&mut self) -> PResult<Vec<Property>> {
        ensure_sufficient_stack(|| self.parse_rule_body_inner())
    }

    fn parse_rule_body_inner(&mut self) -> PResult<Vec<Property>> {
        let mut properties = Vec::new();
        loop {
            self.reader.skip_trivia();
            match self.reader.peek() {
                None => {
                    let at = self.reader.offset();
                    return Err(self.error(at, "unterminated block".to_string()));
                }
                Some(b'}') => {
                    self.reader.bump();
                    return Ok(properties);
                }
                Some(b'@') => properties.push(self.parse_at_property()?),
                _ => {
                    let start = self.reader.offset();
                    let Some((raw, stop)) = self.reader.scan_until(&[b';', b'{', b'}']) else {
                        return Err(self.error(start, "unterminated block".to_string()));
                    };
                    match stop {
                        b'{' => {
                            let selector = raw.trim();
                            if selector.is_empty() {
                                return Err(self.error(start, "expected a selector".to_string()));
                            }
                            let selector = Selector::parse(selector);
                            let nested = self.parse_rule_body()?;
                            properties.push(Property::new(
                                PropertyKind::NestedBlock {
                                    selector,
                                    properties: nested,
                                },
                                self.origin(start),
                            ));
                        }
                        _ => {
                            if !raw.trim().is_empty() {
                                properties.push(self.parse_declaration_text(raw, start)?);
                            }
                            if stop == b'}' {
                                return Ok(properties);
                            }
                        }
                    }
                }
            }
        }
    }

    /// `name: value [!important]` — `raw` starts at file offset `start`.
    fn parse_declaration_text(&mut self, raw: &str, start: u32) -> PResult<Property> {
        let Some(colon) = top_level_colon(raw) else {
            return Err(self.error(start, "expected `:` in a declaration".to_string()));
        };
        let name = raw[..colon].trim();
        if name.is_empty() {
            return Err(self.error(start, "expected a declaration name".to_string()));
        }
        let value_text = &raw[colon + 1..];
        let (value_text, important) = strip_important(value_text);
        if value_text.trim().is_empty() {
            return Err(self.error(start, format!("expected a value for `{name}`")));
        }
        let value_base = start + colon as u32 + 1;
        let value = parse_value(value_text, value_base, &self.file, self.ctx)?;
        Ok(Property::new(
            PropertyKind::NameValue {
                name: name.to_string(),
                value,
                important,
            },
            self.origin(start),
        ))
    }

    /// Rule-body statements that start with `@`.
    fn parse_at_property(&mut self) -> PResult<Property> {
        let start = self.reader.offset();
        self.reader.bump();

        // `@(selector)` / `@(selector)!`
        if self.reader.peek() == Some(b'(') {
            self.reader.bump();
            let Some(text) = self.reader.scan_parenthesized() else {
                return Err(self.error(start, "unterminated `@(`".to_string()));
            };
            if text.trim().is_empty() {
                return Err(self.error(start, "expected a selector inside `@()`".to_string()));
            }
            let selector = Selector::parse(text);
            let override_existing = self.reader.eat(b'!');
            self.finish_property(start)?;
            return Ok(Property::new(
                PropertyKind::IncludeSelector {
                    selector,
                    override_existing,
                },
                self.origin(start),
            ));
        }

        let name = self.reader.read_ident().to_string();
        if name.is_empty() {
            return Err(self.error(start, "expected a name after `@`".to_string()));
        }
        if name.eq_ignore_ascii_case("media") {
            return self.parse_inner_media(start);
        }
        if name.eq_ignore_ascii_case("reset") {
            return self.parse_reset_reference(start);
        }

        let optional = self.reader.peek() == Some(b'?');
        if optional {
            self.reader.bump();
        }
        self.reader.skip_trivia();
        match self.reader.peek() {
            Some(b'(') => {
                self.reader.bump();
                self.parse_application(start, name, optional)
            }
            Some(b'=') if optional => {
                Err(self.error(start, format!("expected `(` after `@{name}?`")))
            }
            Some(b'=') => {
                self.reader.bump();
                self.check_declared_name(start, &name)?;
                let value = self.parse_value_to_semicolon(start)?;
                Ok(Property::new(
                    PropertyKind::VariableAssignment { name, value },
                    self.origin(start),
                ))
            }
            _ => Err(self.error(start, format!("expected `=` or `(` after `@{name}`"))),
        }
    }

    /// `@media <query> { declarations }` inside a rule body.
    fn parse_inner_media(&mut self, start: u32) -> PResult<Property> {
        self.reader.skip_trivia();
        let query_base = self.reader.offset();
        let Some((query_text, _)) = self.reader.scan_until(&[b'{']) else {
            return Err(self.error(start, "expected `{` after `@media`".to_string()));
        };
        let query = parse_media_query(query_text, query_base, &self.file, self.ctx)?;
        let properties = self.parse_rule_body()?;
        Ok(Property::new(
            PropertyKind::InnerMedia { query, properties },
            self.origin(start),
        ))
    }

    /// `@reset();` or `@reset(selector);`
    fn parse_reset_reference(&mut self, start: u32) -> PResult<Property> {
        if !self.reader.eat(b'(') {
            return Err(self.error(start, "expected `(` after `@reset`".to_string()));
        }
        let Some(text) = self.reader.scan_parenthesized() else {
            return Err(self.error(start, "unbalanced `(` after `@reset`".to_string()));
        };
        let selector = match text.trim() {
            "" => None,
            sel => Some(Selector::parse(sel)),
        };
        self.finish_property(start)?;
        Ok(Property::new(
            PropertyKind::ResetReference { selector },
            self.origin(start),
        ))
    }

    /// Mixin application args after `(`, then `!` and the terminator.
    fn parse_application(
        &mut self,
        start: u32,
        name: String,
        optional: bool,
    ) -> PResult<Property> {
        let mut args = Vec::new();
        if !self.reader.eat(b')') {
            loop {
                self.reader.skip_trivia();
                let arg_start = self.reader.offset();
                let Some((raw, stop)) = self.reader.scan_until(&[b',', b')']) else {
                    return Err(self.error(start, format!("unbalanced `(` in `@{name}(`")));
                };
                if raw.trim().is_empty() {
                    return Err(self.error(arg_start, "expected an argument".to_string()));
                }
                args.push(self.parse_mixin_arg(raw, arg_start)?);
                if stop == b')' {
                    break;
                }
            }
        }
        let override_existing = self.reader.eat(b'!');
        self.finish_property(start)?;
        Ok(Property::new(
            PropertyKind::MixinApplication {
                name,
                args,
                optional,
                override_existing,
            },
            self.origin(start),
        ))
    }

    /// One application argument: `value` or `name: value`.
    fn parse_mixin_arg(&mut self, raw: &str, base: u32) -> PResult<MixinArg> {
        if let Some(colon) = top_level_colon(raw) {
            let name = raw[..colon].trim();
            if !name.is_empty() && name.bytes().all(is_ident_byte) {
                let value_base = base + colon as u32 + 1;
                let value = parse_value(&raw[colon + 1..], value_base, &self.file, self.ctx)?;
                return Ok(MixinArg::named(name, value));
            }
        }
        let value = parse_value(raw, base, &self.file, self.ctx)?;
        Ok(MixinArg::positional(value))
    }

    /// Value text between `=` (or a directive keyword) and `;`.
    fn parse_value_to_semicolon(&mut self, start: u32) -> PResult<Value> {
        self.reader.skip_trivia();
        let value_base = self.reader.offset();
        let Some((raw, _)) = self.reader.scan_until(&[b';']) else {
            return Err(self.error(start, "expected `;` after the value".to_string()));
        };
        if raw.trim().is_empty() {
            return Err(self.error(start, "expected a value".to_string()));
        }
        parse_value(raw, value_base, &self.file, self.ctx)
    }

    /// A property ends with `;`, or implicitly right before the body's `}`.
    fn finish_property(&mut self, start: u32) -> PResult<()> {
        if self.reader.eat(b';') {
            return Ok(());
        }
        self.reader.skip_trivia();
        if self.reader.peek() == Some(b'}') {
            return Ok(());
        }
        Err(self.error(start, "expected `;`".to_string()))
    }

    /// One warning per file when an `@import` follows a statement the
    /// reordering stage will hoist it above.
    fn warn_late_imports(&mut self, blocks: &[Block]) {
        let mut seen_other = false;
        for block in blocks {
            match &block.kind {
                BlockKind::Charset { .. } => {}
                BlockKind::Import { .. } if seen_other => {
                    self.ctx.warning(
                        Phase::Parser,
                        "`@import` appears after other statements and will be moved to the top of the output",
                        block.origin.clone(),
                    );
                    return;
                }
                BlockKind::Import { .. } => {}
                _ => seen_other = true,
            }
        }
    }
}

fn keyframes_prefix(name: &str) -> Option<String> {
    let lower = name.to_ascii_lowercase();
    if lower == "keyframes" {
        return Some(String::new());
    }
    lower
        .strip_suffix("keyframes")
        .filter(|prefix| prefix.len() > 2 && prefix.starts_with('-') && prefix.ends_with('-'))
        .map(str::to_string)
}

/// Index of the first `:` outside quotes, parentheses, brackets, and
/// comments.
fn top_level_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 2;
                continue;
            }
            b':' if depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split a trailing `!important` off a declaration value.
fn strip_important(text: &str) -> (&str, bool) {
    let trimmed = text.trim_end();
    let len = trimmed.len();
    if len < 9 || !trimmed.is_char_boundary(len - 9) {
        return (text, false);
    }
    if !trimmed[len - 9..].eq_ignore_ascii_case("important") {
        return (text, false);
    }
    let head = trimmed[..len - 9].trim_end();
    match head.strip_suffix('!') {
        Some(value) => (value, true),
        None => (text, false),
    }
}
