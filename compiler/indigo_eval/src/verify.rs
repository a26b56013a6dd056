//! Reference verification.
//!
//! Simulates declaration order without evaluating anything: walking the
//! document top to bottom, a `@name` reference is legal only when a variable
//! of that name has already been declared in an enclosing scope or earlier
//! in the same local scope. Mixin bodies are checked at their declaration
//! site, so a body may use its own parameters and anything declared above
//! the mixin, but nothing declared below it.
//!
//! Every violation is recorded and the walk continues; the driver stops the
//! pipeline afterwards if anything was found.

use indigo_diagnostic::Phase;
use indigo_ir::{Block, BlockKind, MediaQuery, MixinDeclaration, Origin, Property, PropertyKind, Value};
use indigo_session::CompileContext;
use indigo_stack::ensure_sufficient_stack;
use rustc_hash::FxHashSet;

pub fn verify_references(blocks: &[Block], ctx: &mut CompileContext) {
    let mut verifier = Verifier {
        ctx,
        document: FxHashSet::default(),
    };
    verifier.blocks(blocks, None);
}

struct Verifier<'a> {
    ctx: &'a mut CompileContext,
    /// Document-level variable names declared so far.
    document: FxHashSet<String>,
}

impl Verifier<'_> {
    /// Walk one block sequence. `container` carries the local names of an
    /// enclosing `@media` body, if any.
    fn blocks(&mut self, blocks: &[Block], container: Option<&FxHashSet<String>>) {
        // @media bodies accumulate their own declarations in walk order.
        let mut local = container.cloned().unwrap_or_default();
        for block in blocks {
            match &block.kind {
                BlockKind::VariableDeclaration { name, value } => {
                    self.check(value, &local, &block.origin);
                    if container.is_some() {
                        local.insert(name.clone());
                    } else {
                        self.document.insert(name.clone());
                    }
                }
                BlockKind::MixinDeclaration(mixin) => self.mixin(mixin, &block.origin),
                BlockKind::SelectorRule(rule) => {
                    self.properties(&rule.properties, local.clone());
                }
                BlockKind::Media(media) => {
                    self.query(&media.query, &local, &block.origin);
                    self.blocks(&media.blocks, Some(&local));
                }
                BlockKind::KeyFrames(keyframes) => {
                    let mut frame_locals = local.clone();
                    for variable in &keyframes.variables {
                        if let PropertyKind::VariableAssignment { name, value } = &variable.kind {
                            self.check(value, &frame_locals, &variable.origin);
                            frame_locals.insert(name.clone());
                        }
                    }
                    for frame in &keyframes.frames {
                        self.properties(&frame.properties, frame_locals.clone());
                    }
                }
                BlockKind::FontFace(font_face) => {
                    self.properties(&font_face.properties, local.clone());
                }
                BlockKind::Import { value } => self.check(value, &local, &block.origin),
                BlockKind::Using { media, .. } => {
                    if let Some(query) = media {
                        self.query(query, &local, &block.origin);
                    }
                }
                // Reset bodies unroll in place later, so their declarations
                // join the document scope at this position.
                BlockKind::Reset(reset) => self.blocks(&reset.blocks, container),
                BlockKind::Charset { .. } | BlockKind::Sprite(_) => {}
            }
        }
    }

    fn mixin(&mut self, mixin: &MixinDeclaration, origin: &Origin) {
        let mut local = FxHashSet::default();
        for param in &mixin.params {
            if let Some(default) = &param.default {
                // Defaults may reference earlier parameters.
                self.check(default, &local, origin);
            }
            local.insert(param.name.clone());
        }
        local.insert("arguments".to_string());
        self.properties(&mixin.properties, local);
    }

    fn properties(&mut self, properties: &[Property], mut local: FxHashSet<String>) {
        for property in properties {
            match &property.kind {
                PropertyKind::NameValue { value, .. } => {
                    self.check(value, &local, &property.origin);
                }
                PropertyKind::VariableAssignment { name, value } => {
                    self.check(value, &local, &property.origin);
                    local.insert(name.clone());
                }
                PropertyKind::MixinApplication { args, .. } => {
                    for arg in args {
                        self.check(&arg.value, &local, &property.origin);
                    }
                }
                PropertyKind::NestedBlock { properties, .. } => {
                    let snapshot = local.clone();
                    ensure_sufficient_stack(|| self.properties(properties, snapshot));
                }
                PropertyKind::InnerMedia { query, properties } => {
                    self.query(query, &local, &property.origin);
                    let snapshot = local.clone();
                    ensure_sufficient_stack(|| self.properties(properties, snapshot));
                }
                PropertyKind::IncludeSelector { .. } | PropertyKind::ResetReference { .. } => {}
            }
        }
    }

    fn query(&mut self, query: &MediaQuery, local: &FxHashSet<String>, origin: &Origin) {
        for term in &query.terms {
            for feature in &term.features {
                if let Some(value) = &feature.value {
                    self.check(value, local, origin);
                }
            }
        }
    }

    fn check(&mut self, value: &Value, local: &FxHashSet<String>, origin: &Origin) {
        let mut names = Vec::new();
        value.collect_vars(&mut names);
        let mut reported: FxHashSet<&str> = FxHashSet::default();
        for name in names {
            if local.contains(name) || self.document.contains(name) {
                continue;
            }
            if reported.insert(name) {
                self.ctx.error(
                    Phase::Compiler,
                    format!("@{name} has not been defined"),
                    origin.clone(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use indigo_ir::Selector;
    use indigo_session::{CompileOptions, FileCache, MemoryLookup};

    fn context() -> CompileContext {
        CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::empty(),
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new()),
        )
    }

    fn declaration(name: &str, value: Value) -> Block {
        Block::new(
            BlockKind::VariableDeclaration {
                name: name.to_string(),
                value,
            },
            Origin::synthetic(),
        )
    }

    fn rule(properties: Vec<Property>) -> Block {
        Block::rule(Selector::parse(".a"), properties, Origin::synthetic())
    }

    #[test]
    fn declaration_before_use_is_fine() {
        let blocks = vec![
            declaration("accent", Value::ident("red")),
            rule(vec![Property::name_value(
                "color",
                Value::Var("accent".to_string()),
                Origin::synthetic(),
            )]),
        ];
        let mut ctx = context();
        verify_references(&blocks, &mut ctx);
        assert!(!ctx.has_errors());
    }

    #[test]
    fn use_before_declaration_is_an_error() {
        let blocks = vec![
            rule(vec![Property::name_value(
                "color",
                Value::Var("c".to_string()),
                Origin::synthetic(),
            )]),
            declaration("c", Value::ident("red")),
        ];
        let mut ctx = context();
        verify_references(&blocks, &mut ctx);
        assert_eq!(ctx.diagnostics().error_count(), 1);
        let message = ctx
            .diagnostics()
            .iter()
            .next()
            .map(|d| d.message.clone())
            .unwrap_or_default();
        assert_eq!(message, "@c has not been defined");
    }

    #[test]
    fn rule_local_assignments_cover_later_siblings_only() {
        let early = Property::name_value(
            "margin",
            Value::Var("gap".to_string()),
            Origin::synthetic(),
        );
        let assign = Property::new(
            PropertyKind::VariableAssignment {
                name: "gap".to_string(),
                value: Value::number(4.0),
            },
            Origin::synthetic(),
        );
        let late = Property::name_value(
            "padding",
            Value::Var("gap".to_string()),
            Origin::synthetic(),
        );
        let mut ctx = context();
        verify_references(&[rule(vec![early, assign, late])], &mut ctx);
        assert_eq!(ctx.diagnostics().error_count(), 1);
    }

    #[test]
    fn mixin_bodies_may_reference_parameters() {
        let mixin = Block::new(
            BlockKind::MixinDeclaration(MixinDeclaration {
                name: "pad".to_string(),
                params: vec![indigo_ir::MixinParam {
                    name: "amount".to_string(),
                    default: Some(Value::number(4.0)),
                    hidden: false,
                }],
                properties: vec![Property::name_value(
                    "padding",
                    Value::Var("amount".to_string()),
                    Origin::synthetic(),
                )],
            }),
            Origin::synthetic(),
        );
        let mut ctx = context();
        verify_references(&[mixin], &mut ctx);
        assert!(!ctx.has_errors());
    }

    #[test]
    fn mixin_bodies_cannot_see_later_declarations() {
        let mixin = Block::new(
            BlockKind::MixinDeclaration(MixinDeclaration {
                name: "tint".to_string(),
                params: Vec::new(),
                properties: vec![Property::name_value(
                    "color",
                    Value::Var("base".to_string()),
                    Origin::synthetic(),
                )],
            }),
            Origin::synthetic(),
        );
        let blocks = vec![mixin, declaration("base", Value::ident("red"))];
        let mut ctx = context();
        verify_references(&blocks, &mut ctx);
        assert_eq!(ctx.diagnostics().error_count(), 1);
    }

    #[test]
    fn media_locals_stay_inside_the_media_block() {
        let media = Block::new(
            BlockKind::Media(indigo_ir::MediaBlock {
                query: MediaQuery::of_type("print"),
                blocks: vec![
                    declaration("ink", Value::ident("black")),
                    rule(vec![Property::name_value(
                        "color",
                        Value::Var("ink".to_string()),
                        Origin::synthetic(),
                    )]),
                ],
            }),
            Origin::synthetic(),
        );
        let outside = rule(vec![Property::name_value(
            "color",
            Value::Var("ink".to_string()),
            Origin::synthetic(),
        )]);
        let mut ctx = context();
        verify_references(&[media, outside], &mut ctx);
        assert_eq!(ctx.diagnostics().error_count(), 1);
    }
}
