//! Mixin binding and expansion.
//!
//! Builds the document scope from top-level declarations, pushes child
//! frames for `@media` and `@keyframes` bodies, and rewrites every property
//! list so that no `MixinApplication` or `VariableAssignment` survives.
//!
//! Variable references are substituted eagerly: a binding's value is
//! resolved against the scope at its declaration point before it is stored,
//! so stored values never contain `Var` nodes and substitution at a use
//! site is a single rewrite. Reference verification has already rejected
//! forward references, which is what makes the eager strategy sound.
//!
//! A mixin application emits its non-hidden parameters as `name: value`
//! declarations, in parameter order, ahead of the expanded body. Hidden
//! (`name?`) parameters and parameters that reduce to `Excluded` only exist
//! in scope; the synthesized sprite mixins rely on that to pass packed
//! offsets through without emitting them.

use std::sync::Arc;

use indigo_diagnostic::Phase;
use indigo_ir::{
    Block, BlockKind, KeyFrame, MediaBlock, MediaQuery, MixinArg, MixinDeclaration, Origin,
    Property, PropertyKind, SelectorRule, Value,
};
use indigo_session::{CompileContext, FatalError};
use indigo_stack::ensure_sufficient_stack;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::scope::Scope;

/// Expand every mixin application and resolve every variable. Consumes
/// variable and mixin declarations; duplicate names among them stop the
/// compile.
pub fn bind_and_expand(
    blocks: Vec<Block>,
    ctx: &mut CompileContext,
) -> Result<Vec<Block>, FatalError> {
    let mut expander = Expander {
        ctx,
        applying: Vec::new(),
    };
    expander.document(blocks)
}

struct Expander<'a> {
    ctx: &'a mut CompileContext,
    /// Mixins currently being expanded; re-entry means self-application.
    applying: Vec<String>,
}

/// One `@name(args)` use, carried as a unit through binding.
struct MixinCall {
    name: String,
    args: Vec<MixinArg>,
    optional: bool,
    override_existing: bool,
    origin: Origin,
}

impl Expander<'_> {
    fn document(&mut self, blocks: Vec<Block>) -> Result<Vec<Block>, FatalError> {
        let scope = self.collect_scope(&blocks, None)?;
        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            let Block { kind, origin } = block;
            match kind {
                BlockKind::VariableDeclaration { .. } | BlockKind::MixinDeclaration(_) => {}
                BlockKind::SelectorRule(rule) => {
                    out.push(Block {
                        kind: BlockKind::SelectorRule(self.rule(rule, &scope)?),
                        origin,
                    });
                }
                BlockKind::Media(media) => {
                    out.push(Block {
                        kind: BlockKind::Media(self.media(media, &scope)?),
                        origin,
                    });
                }
                BlockKind::KeyFrames(keyframes) => {
                    out.push(Block {
                        kind: BlockKind::KeyFrames(self.keyframes(keyframes, &scope)?),
                        origin,
                    });
                }
                BlockKind::FontFace(mut font_face) => {
                    let mut locals = FxHashMap::default();
                    font_face.properties =
                        self.expand_list(font_face.properties, &mut locals, &scope)?;
                    out.push(Block {
                        kind: BlockKind::FontFace(font_face),
                        origin,
                    });
                }
                BlockKind::Import { value } => {
                    let value = substitute(value, &FxHashMap::default(), &scope);
                    out.push(Block {
                        kind: BlockKind::Import { value },
                        origin,
                    });
                }
                other => out.push(Block { kind: other, origin }),
            }
        }
        Ok(out)
    }

    fn rule(&mut self, rule: SelectorRule, scope: &Scope) -> Result<SelectorRule, FatalError> {
        let SelectorRule {
            selector,
            properties,
            from_reset,
        } = rule;
        let mut locals = FxHashMap::default();
        let properties = self.expand_list(properties, &mut locals, scope)?;
        Ok(SelectorRule {
            selector,
            properties,
            from_reset,
        })
    }

    fn media(&mut self, media: MediaBlock, scope: &Scope) -> Result<MediaBlock, FatalError> {
        // The query is written outside the body, so it resolves against the
        // outer scope; body-local declarations only cover the body.
        let query = substitute_query(media.query, &FxHashMap::default(), scope);
        let local = self.collect_scope(&media.blocks, Some(scope))?;
        let mut blocks = Vec::with_capacity(media.blocks.len());
        for child in media.blocks {
            let Block { kind, origin } = child;
            match kind {
                BlockKind::VariableDeclaration { .. } | BlockKind::MixinDeclaration(_) => {}
                BlockKind::SelectorRule(rule) => {
                    blocks.push(Block {
                        kind: BlockKind::SelectorRule(self.rule(rule, &local)?),
                        origin,
                    });
                }
                other => blocks.push(Block { kind: other, origin }),
            }
        }
        Ok(MediaBlock { query, blocks })
    }

    fn keyframes(
        &mut self,
        mut keyframes: indigo_ir::KeyFramesBlock,
        scope: &Scope,
    ) -> Result<indigo_ir::KeyFramesBlock, FatalError> {
        let mut locals = FxHashMap::default();
        for variable in keyframes.variables.drain(..) {
            if let PropertyKind::VariableAssignment { name, value } = variable.kind {
                let value = substitute(value, &locals, scope);
                locals.insert(name, value);
            }
        }
        let mut frames = Vec::with_capacity(keyframes.frames.len());
        for frame in keyframes.frames {
            let KeyFrame {
                stops,
                properties,
                origin,
            } = frame;
            let mut frame_locals = locals.clone();
            let properties = self.expand_list(properties, &mut frame_locals, scope)?;
            frames.push(KeyFrame {
                stops,
                properties,
                origin,
            });
        }
        keyframes.frames = frames;
        Ok(keyframes)
    }

    /// Build a scope frame from the declarations in `blocks`. Initializers
    /// resolve eagerly against earlier siblings and the parent chain.
    fn collect_scope(
        &mut self,
        blocks: &[Block],
        parent: Option<&Scope>,
    ) -> Result<Scope, FatalError> {
        let mut variable_counts: FxHashMap<&str, usize> = FxHashMap::default();
        let mut mixin_counts: FxHashMap<&str, usize> = FxHashMap::default();
        for block in blocks {
            match &block.kind {
                BlockKind::VariableDeclaration { name, .. } => {
                    *variable_counts.entry(name).or_insert(0) += 1;
                }
                BlockKind::MixinDeclaration(mixin) => {
                    *mixin_counts.entry(&mixin.name).or_insert(0) += 1;
                }
                _ => {}
            }
        }

        let mut variables: FxHashMap<String, Value> = FxHashMap::default();
        let mut mixins: FxHashMap<String, Arc<MixinDeclaration>> = FxHashMap::default();
        let mut reported: FxHashSet<&str> = FxHashSet::default();
        let mut failed = false;
        for block in blocks {
            match &block.kind {
                BlockKind::VariableDeclaration { name, value } => {
                    let count = variable_counts.get(name.as_str()).copied().unwrap_or(0);
                    if count > 1 && reported.insert(name) {
                        self.ctx.error(
                            Phase::Compiler,
                            format!("@{name} is defined {count} times"),
                            block.origin.clone(),
                        );
                        failed = true;
                    }
                    let resolve = |n: &str| {
                        variables
                            .get(n)
                            .cloned()
                            .or_else(|| parent.and_then(|scope| scope.var(n).cloned()))
                    };
                    let value = substitute_with(value.clone(), &resolve);
                    variables.insert(name.clone(), value);
                }
                BlockKind::MixinDeclaration(mixin) => {
                    let count = mixin_counts.get(mixin.name.as_str()).copied().unwrap_or(0);
                    if count > 1 && reported.insert(&mixin.name) {
                        self.ctx.error(
                            Phase::Compiler,
                            format!("@{} is defined {count} times", mixin.name),
                            block.origin.clone(),
                        );
                        failed = true;
                    }
                    mixins.insert(mixin.name.clone(), Arc::new(mixin.clone()));
                }
                _ => {}
            }
        }
        if failed {
            return Err(FatalError::StoppedCompiling);
        }
        Ok(match parent {
            Some(parent) => parent.child(variables),
            None => Scope::root(variables, mixins),
        })
    }

    fn expand_list(
        &mut self,
        properties: Vec<Property>,
        locals: &mut FxHashMap<String, Value>,
        scope: &Scope,
    ) -> Result<Vec<Property>, FatalError> {
        let mut out = Vec::with_capacity(properties.len());
        for property in properties {
            let Property { kind, origin } = property;
            match kind {
                PropertyKind::NameValue {
                    name,
                    value,
                    important,
                } => {
                    let value = substitute(value, locals, scope);
                    out.push(Property {
                        kind: PropertyKind::NameValue {
                            name,
                            value,
                            important,
                        },
                        origin,
                    });
                }
                PropertyKind::VariableAssignment { name, value } => {
                    let value = substitute(value, locals, scope);
                    locals.insert(name, value);
                }
                PropertyKind::MixinApplication {
                    name,
                    args,
                    optional,
                    override_existing,
                } => {
                    let call = MixinCall {
                        name,
                        args,
                        optional,
                        override_existing,
                        origin,
                    };
                    self.apply(call, locals, scope, &mut out)?;
                }
                PropertyKind::NestedBlock {
                    selector,
                    properties,
                } => {
                    let mut nested = locals.clone();
                    let properties = ensure_sufficient_stack(|| {
                        self.expand_list(properties, &mut nested, scope)
                    })?;
                    out.push(Property {
                        kind: PropertyKind::NestedBlock {
                            selector,
                            properties,
                        },
                        origin,
                    });
                }
                PropertyKind::InnerMedia { query, properties } => {
                    let query = substitute_query(query, locals, scope);
                    let mut nested = locals.clone();
                    let properties = ensure_sufficient_stack(|| {
                        self.expand_list(properties, &mut nested, scope)
                    })?;
                    out.push(Property {
                        kind: PropertyKind::InnerMedia { query, properties },
                        origin,
                    });
                }
                passthrough @ (PropertyKind::IncludeSelector { .. }
                | PropertyKind::ResetReference { .. }) => {
                    out.push(Property {
                        kind: passthrough,
                        origin,
                    });
                }
            }
        }
        Ok(out)
    }

    fn apply(
        &mut self,
        call: MixinCall,
        locals: &FxHashMap<String, Value>,
        scope: &Scope,
        out: &mut Vec<Property>,
    ) -> Result<(), FatalError> {
        let Some(mixin) = scope.mixin(&call.name).cloned() else {
            if !call.optional {
                self.ctx.error(
                    Phase::Compiler,
                    format!("mixin @{} has not been defined", call.name),
                    call.origin,
                );
            }
            return Ok(());
        };
        if self.applying.iter().any(|name| name == &call.name) {
            self.ctx.error(
                Phase::Compiler,
                format!("mixin @{} applies itself recursively", call.name),
                call.origin,
            );
            return Ok(());
        }

        // Named arguments claim their parameter; positional ones fill the
        // remaining parameters in declaration order.
        let mut named: FxHashMap<String, Value> = FxHashMap::default();
        let mut positional = Vec::new();
        for arg in call.args {
            let value = substitute(arg.value, locals, scope);
            match arg.name {
                Some(name) => {
                    if mixin.param(&name).is_none() {
                        self.ctx.error(
                            Phase::Compiler,
                            format!("mixin @{} has no parameter `{name}`", call.name),
                            call.origin.clone(),
                        );
                        continue;
                    }
                    named.insert(name, value);
                }
                None => positional.push(value),
            }
        }
        if positional.len() > mixin.params.len() {
            self.ctx.error(
                Phase::Compiler,
                format!(
                    "mixin @{} takes {} parameter(s), got {}",
                    call.name,
                    mixin.params.len(),
                    positional.len()
                ),
                call.origin.clone(),
            );
            positional.truncate(mixin.params.len());
        }
        let mut positional = positional.into_iter();

        let mut bound: Vec<(String, Value, bool)> = Vec::with_capacity(mixin.params.len());
        for param in &mixin.params {
            let value = if let Some(value) = named.remove(&param.name) {
                value
            } else if let Some(value) = positional.next() {
                value
            } else if let Some(default) = &param.default {
                // Defaults may reference parameters bound before them.
                let resolve = |name: &str| {
                    bound
                        .iter()
                        .find(|(bound_name, _, _)| bound_name == name)
                        .map(|(_, value, _)| value.clone())
                        .or_else(|| locals.get(name).cloned())
                        .or_else(|| scope.var(name).cloned())
                };
                substitute_with(default.clone(), &resolve)
            } else {
                Value::Excluded
            };
            bound.push((param.name.clone(), value, param.hidden));
        }

        let actuals: Vec<Value> = bound
            .iter()
            .filter(|(_, value, _)| !value.is_excluded())
            .map(|(_, value, _)| value.clone())
            .collect();
        let arguments = match actuals.len() {
            0 => Value::Excluded,
            1 => actuals.into_iter().next().unwrap_or(Value::Excluded),
            _ => Value::Compound(actuals),
        };

        let mut body_locals: FxHashMap<String, Value> = bound
            .iter()
            .map(|(name, value, _)| (name.clone(), value.clone()))
            .collect();
        body_locals.insert("arguments".to_string(), arguments);

        let mut expanded: Vec<Property> = bound
            .iter()
            .filter(|(_, _, hidden)| !hidden)
            .map(|(name, value, _)| {
                Property::name_value(name.clone(), value.clone(), call.origin.clone())
            })
            .collect();

        self.applying.push(call.name.clone());
        let body = ensure_sufficient_stack(|| {
            self.expand_list(mixin.properties.clone(), &mut body_locals, scope)
        });
        self.applying.pop();
        expanded.extend(body?);

        if call.override_existing {
            let replaced: FxHashSet<String> =
                expanded.iter().filter_map(Property::name_key).collect();
            out.retain(|existing| {
                existing
                    .name_key()
                    .is_none_or(|key| !replaced.contains(&key))
            });
        }
        out.extend(expanded);
        Ok(())
    }
}

/// Replace every `Var` with its binding; unresolved names stay in place for
/// the evaluation stage to report.
fn substitute(value: Value, locals: &FxHashMap<String, Value>, scope: &Scope) -> Value {
    let resolve =
        |name: &str| locals.get(name).cloned().or_else(|| scope.var(name).cloned());
    substitute_with(value, &resolve)
}

fn substitute_with(value: Value, resolve: &dyn Fn(&str) -> Option<Value>) -> Value {
    value.map(&mut |node| match node {
        Value::Var(name) => match resolve(&name) {
            Some(found) => found,
            None => Value::Var(name),
        },
        other => other,
    })
}

fn substitute_query(
    mut query: MediaQuery,
    locals: &FxHashMap<String, Value>,
    scope: &Scope,
) -> MediaQuery {
    for term in &mut query.terms {
        for feature in &mut term.features {
            if let Some(value) = feature.value.take() {
                feature.value = Some(substitute(value, locals, scope));
            }
        }
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use indigo_ir::{MixinParam, Selector, Unit};
    use indigo_session::{CompileOptions, FileCache, MemoryLookup};
    use pretty_assertions::assert_eq;

    fn context() -> CompileContext {
        CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::empty(),
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new()),
        )
    }

    fn mixin_block(name: &str, params: Vec<MixinParam>, properties: Vec<Property>) -> Block {
        Block::new(
            BlockKind::MixinDeclaration(MixinDeclaration {
                name: name.to_string(),
                params,
                properties,
            }),
            Origin::synthetic(),
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

    fn apply_property(name: &str) -> Property {
        Property::new(
            PropertyKind::MixinApplication {
                name: name.to_string(),
                args: Vec::new(),
                optional: false,
                override_existing: false,
            },
            Origin::synthetic(),
        )
    }

    fn rule(properties: Vec<Property>) -> Block {
        Block::rule(Selector::parse(".a"), properties, Origin::synthetic())
    }

    fn declarations(block: &Block) -> Vec<(String, Value)> {
        let rule = block.as_rule().expect("selector rule");
        rule.properties
            .iter()
            .map(|p| match &p.kind {
                PropertyKind::NameValue { name, value, .. } => (name.clone(), value.clone()),
                other => panic!("unexpected property {other:?}"),
            })
            .collect()
    }

    #[test]
    fn paramless_mixin_expands_in_place() {
        let blocks = vec![
            mixin_block(
                "bold",
                Vec::new(),
                vec![Property::name_value(
                    "font-weight",
                    Value::ident("bold"),
                    Origin::synthetic(),
                )],
            ),
            rule(vec![
                apply_property("bold"),
                Property::name_value("color", Value::ident("red"), Origin::synthetic()),
            ]),
        ];
        let mut ctx = context();
        let out = bind_and_expand(blocks, &mut ctx).expect("expansion");
        assert!(!ctx.has_errors());
        assert_eq!(out.len(), 1);
        assert_eq!(
            declarations(&out[0]),
            vec![
                ("font-weight".to_string(), Value::ident("bold")),
                ("color".to_string(), Value::ident("red")),
            ]
        );
    }

    #[test]
    fn parameters_emit_before_the_body() {
        let blocks = vec![
            mixin_block(
                "rounded",
                vec![MixinParam {
                    name: "border-radius".to_string(),
                    default: Some(Value::dimension(4.0, Unit::Px)),
                    hidden: false,
                }],
                vec![Property::name_value(
                    "-moz-border-radius",
                    Value::Var("border-radius".to_string()),
                    Origin::synthetic(),
                )],
            ),
            rule(vec![apply_property("rounded")]),
        ];
        let mut ctx = context();
        let out = bind_and_expand(blocks, &mut ctx).expect("expansion");
        assert_eq!(
            declarations(&out[0]),
            vec![
                (
                    "border-radius".to_string(),
                    Value::dimension(4.0, Unit::Px)
                ),
                (
                    "-moz-border-radius".to_string(),
                    Value::dimension(4.0, Unit::Px)
                ),
            ]
        );
    }

    #[test]
    fn positional_and_named_arguments_bind() {
        let mixin = mixin_block(
            "box",
            vec![
                MixinParam {
                    name: "width".to_string(),
                    default: None,
                    hidden: false,
                },
                MixinParam {
                    name: "height".to_string(),
                    default: Some(Value::Var("width".to_string())),
                    hidden: false,
                },
            ],
            Vec::new(),
        );
        let application = Property::new(
            PropertyKind::MixinApplication {
                name: "box".to_string(),
                args: vec![MixinArg::positional(Value::dimension(10.0, Unit::Px))],
                optional: false,
                override_existing: false,
            },
            Origin::synthetic(),
        );
        let mut ctx = context();
        let out = bind_and_expand(vec![mixin, rule(vec![application])], &mut ctx)
            .expect("expansion");
        // height defaults to the width parameter.
        assert_eq!(
            declarations(&out[0]),
            vec![
                ("width".to_string(), Value::dimension(10.0, Unit::Px)),
                ("height".to_string(), Value::dimension(10.0, Unit::Px)),
            ]
        );
    }

    #[test]
    fn hidden_parameters_do_not_emit() {
        let mixin = mixin_block(
            "icon",
            vec![MixinParam {
                name: "offset".to_string(),
                default: Some(Value::dimension(-32.0, Unit::Px)),
                hidden: true,
            }],
            vec![Property::name_value(
                "background-position",
                Value::Var("offset".to_string()),
                Origin::synthetic(),
            )],
        );
        let mut ctx = context();
        let out = bind_and_expand(vec![mixin, rule(vec![apply_property("icon")])], &mut ctx)
            .expect("expansion");
        assert_eq!(
            declarations(&out[0]),
            vec![(
                "background-position".to_string(),
                Value::dimension(-32.0, Unit::Px)
            )]
        );
    }

    #[test]
    fn optional_application_of_missing_mixin_is_silent() {
        let application = Property::new(
            PropertyKind::MixinApplication {
                name: "ghost".to_string(),
                args: Vec::new(),
                optional: true,
                override_existing: false,
            },
            Origin::synthetic(),
        );
        let mut ctx = context();
        let out = bind_and_expand(vec![rule(vec![application])], &mut ctx).expect("expansion");
        assert!(!ctx.has_errors());
        assert_eq!(declarations(&out[0]), Vec::new());
    }

    #[test]
    fn missing_mixin_is_reported() {
        let mut ctx = context();
        bind_and_expand(vec![rule(vec![apply_property("ghost")])], &mut ctx)
            .expect("expansion continues");
        assert_eq!(ctx.diagnostics().error_count(), 1);
    }

    #[test]
    fn override_application_replaces_existing_declarations() {
        let mixin = mixin_block(
            "accent",
            Vec::new(),
            vec![Property::name_value(
                "color",
                Value::ident("teal"),
                Origin::synthetic(),
            )],
        );
        let application = Property::new(
            PropertyKind::MixinApplication {
                name: "accent".to_string(),
                args: Vec::new(),
                optional: false,
                override_existing: true,
            },
            Origin::synthetic(),
        );
        let blocks = vec![
            mixin,
            rule(vec![
                Property::name_value("color", Value::ident("red"), Origin::synthetic()),
                application,
            ]),
        ];
        let mut ctx = context();
        let out = bind_and_expand(blocks, &mut ctx).expect("expansion");
        assert_eq!(
            declarations(&out[0]),
            vec![("color".to_string(), Value::ident("teal"))]
        );
    }

    #[test]
    fn duplicate_top_level_names_stop_the_compile() {
        let blocks = vec![
            declaration("accent", Value::ident("red")),
            declaration("accent", Value::ident("blue")),
        ];
        let mut ctx = context();
        let result = bind_and_expand(blocks, &mut ctx);
        assert!(matches!(result, Err(FatalError::StoppedCompiling)));
        let message = ctx
            .diagnostics()
            .iter()
            .next()
            .map(|d| d.message.clone())
            .unwrap_or_default();
        assert_eq!(message, "@accent is defined 2 times");
    }

    #[test]
    fn later_siblings_see_rule_local_assignments() {
        let assign = Property::new(
            PropertyKind::VariableAssignment {
                name: "gap".to_string(),
                value: Value::dimension(4.0, Unit::Px),
            },
            Origin::synthetic(),
        );
        let usage = Property::name_value(
            "margin",
            Value::Var("gap".to_string()),
            Origin::synthetic(),
        );
        let mut ctx = context();
        let out = bind_and_expand(vec![rule(vec![assign, usage])], &mut ctx).expect("expansion");
        assert_eq!(
            declarations(&out[0]),
            vec![("margin".to_string(), Value::dimension(4.0, Unit::Px))]
        );
    }

    #[test]
    fn media_bodies_get_their_own_frame() {
        let media = Block::new(
            BlockKind::Media(MediaBlock {
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
        let mut ctx = context();
        let out = bind_and_expand(vec![media], &mut ctx).expect("expansion");
        let BlockKind::Media(media) = &out[0].kind else {
            panic!("expected media block");
        };
        assert_eq!(media.blocks.len(), 1);
        assert_eq!(
            declarations(&media.blocks[0]),
            vec![("color".to_string(), Value::ident("black"))]
        );
    }

    #[test]
    fn arguments_binds_the_actuals_in_order() {
        let mixin = mixin_block(
            "font",
            vec![
                MixinParam {
                    name: "size".to_string(),
                    default: None,
                    hidden: true,
                },
                MixinParam {
                    name: "family".to_string(),
                    default: None,
                    hidden: true,
                },
            ],
            vec![Property::name_value(
                "font",
                Value::Var("arguments".to_string()),
                Origin::synthetic(),
            )],
        );
        let application = Property::new(
            PropertyKind::MixinApplication {
                name: "font".to_string(),
                args: vec![
                    MixinArg::positional(Value::dimension(12.0, Unit::Px)),
                    MixinArg::positional(Value::ident("serif")),
                ],
                optional: false,
                override_existing: false,
            },
            Origin::synthetic(),
        );
        let mut ctx = context();
        let out =
            bind_and_expand(vec![mixin, rule(vec![application])], &mut ctx).expect("expansion");
        assert_eq!(
            declarations(&out[0]),
            vec![(
                "font".to_string(),
                Value::Compound(vec![
                    Value::dimension(12.0, Unit::Px),
                    Value::ident("serif"),
                ])
            )]
        );
    }

    #[test]
    fn self_application_is_rejected() {
        let mixin = mixin_block("loop", Vec::new(), vec![apply_property("loop")]);
        let mut ctx = context();
        bind_and_expand(vec![mixin, rule(vec![apply_property("loop")])], &mut ctx)
            .expect("expansion continues");
        assert_eq!(ctx.diagnostics().error_count(), 1);
    }
}
