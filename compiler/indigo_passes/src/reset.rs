//! `@reset` handling: body unrolling and reference resolution.
//!
//! Unrolling runs early: it inlines every `@reset { ... }` body into the
//! main sequence with the contained rules marked reset-origin, so those
//! rules participate in mixin expansion, nesting, and evaluation like any
//! other rule. Resolution runs after includes: it copies declarations from
//! reset-origin rules into rules holding `@reset()` references — never
//! overriding an existing name — and then drops the reset-origin rules,
//! which are not part of the output.
//!
//! A reset-origin rule matches a reference when any of its selector
//! alternatives equals any alternative of the target, so the classic
//! grouped form `a, p, div { ... }` serves `@reset()` inside `.x a`-style
//! rules written against a single alternative.

use indigo_diagnostic::Phase;
use indigo_ir::{Block, BlockKind, MediaBlock, Property, PropertyKind, Selector, SelectorRule};
use indigo_session::{CompileContext, FatalError};
use rustc_hash::FxHashSet;

/// Inline every `@reset { ... }` body at its position. Rules inside gain
/// the reset-origin mark; local variable declarations join the document
/// scope at the same position.
pub fn unroll(blocks: Vec<Block>, _ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block { kind, origin } = block;
        let BlockKind::Reset(reset) = kind else {
            out.push(Block { kind, origin });
            continue;
        };
        for inner in reset.blocks {
            let Block { kind, origin } = inner;
            match kind {
                BlockKind::SelectorRule(mut rule) => {
                    rule.from_reset = true;
                    out.push(Block {
                        kind: BlockKind::SelectorRule(rule),
                        origin,
                    });
                }
                other => out.push(Block { kind: other, origin }),
            }
        }
    }
    Ok(out)
}

/// Replace every `@reset()` reference with the matching declarations from
/// reset-origin rules, then drop those rules from the document.
pub fn resolve(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let sources: Vec<(Selector, Vec<Property>)> = blocks
        .iter()
        .filter_map(Block::as_rule)
        .filter(|rule| rule.from_reset)
        .map(|rule| {
            let declarations = rule
                .properties
                .iter()
                .filter(|property| property.is_name_value())
                .cloned()
                .collect();
            (rule.selector.clone(), declarations)
        })
        .collect();

    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block { kind, origin } = block;
        match kind {
            BlockKind::SelectorRule(rule) if rule.from_reset => {}
            BlockKind::SelectorRule(rule) => out.push(Block {
                kind: BlockKind::SelectorRule(resolve_rule(rule, &sources)),
                origin,
            }),
            BlockKind::Media(media) => {
                let MediaBlock { query, blocks } = media;
                let blocks = blocks
                    .into_iter()
                    .map(|inner| {
                        let Block { kind, origin } = inner;
                        let kind = match kind {
                            BlockKind::SelectorRule(rule) => {
                                BlockKind::SelectorRule(resolve_rule(rule, &sources))
                            }
                            other => other,
                        };
                        Block { kind, origin }
                    })
                    .collect();
                out.push(Block {
                    kind: BlockKind::Media(MediaBlock { query, blocks }),
                    origin,
                });
            }
            BlockKind::KeyFrames(mut keyframes) => {
                for frame in &mut keyframes.frames {
                    reject_references(&mut frame.properties, "@keyframes frames", ctx);
                }
                out.push(Block {
                    kind: BlockKind::KeyFrames(keyframes),
                    origin,
                });
            }
            BlockKind::FontFace(mut font_face) => {
                reject_references(&mut font_face.properties, "@font-face", ctx);
                out.push(Block {
                    kind: BlockKind::FontFace(font_face),
                    origin,
                });
            }
            other => out.push(Block { kind: other, origin }),
        }
    }
    Ok(out)
}

fn resolve_rule(rule: SelectorRule, sources: &[(Selector, Vec<Property>)]) -> SelectorRule {
    let has_reference = rule
        .properties
        .iter()
        .any(|property| matches!(property.kind, PropertyKind::ResetReference { .. }));
    if !has_reference {
        return rule;
    }
    let SelectorRule {
        selector,
        properties,
        from_reset,
    } = rule;
    // Names anywhere in the rule block copies: a reference never overrides.
    let mut taken: FxHashSet<String> = properties.iter().filter_map(Property::name_key).collect();
    let mut out = Vec::with_capacity(properties.len());
    for property in properties {
        let PropertyKind::ResetReference { selector: target } = &property.kind else {
            out.push(property);
            continue;
        };
        let target = target.clone().unwrap_or_else(|| selector.clone());
        for (source_selector, declarations) in sources {
            if !overlaps(source_selector, &target) {
                continue;
            }
            for declaration in declarations {
                let Some(key) = declaration.name_key() else {
                    continue;
                };
                if taken.insert(key) {
                    out.push(declaration.clone());
                }
            }
        }
    }
    SelectorRule {
        selector,
        properties: out,
        from_reset,
    }
}

/// Any-alternative selector match, case-insensitive.
fn overlaps(source: &Selector, target: &Selector) -> bool {
    source.alternatives().iter().any(|alternative| {
        target
            .alternatives()
            .iter()
            .any(|wanted| alternative.eq_ignore_ascii_case(wanted))
    })
}

fn reject_references(properties: &mut Vec<Property>, container: &str, ctx: &mut CompileContext) {
    properties.retain(|property| {
        if matches!(property.kind, PropertyKind::ResetReference { .. }) {
            ctx.error(
                Phase::Compiler,
                format!("`@reset()` is not allowed inside {container}"),
                property.origin.clone(),
            );
            false
        } else {
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use indigo_ir::{Origin, ResetBlock, Value};
    use indigo_session::{CompileOptions, FileCache, MemoryLookup};
    use pretty_assertions::assert_eq;

    use super::*;

    fn context() -> CompileContext {
        CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::empty(),
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new()),
        )
    }

    fn declaration(name: &str, value: &str) -> Property {
        Property::name_value(name, Value::ident(value), Origin::synthetic())
    }

    fn reference(selector: Option<&str>) -> Property {
        Property::new(
            PropertyKind::ResetReference {
                selector: selector.map(Selector::parse),
            },
            Origin::synthetic(),
        )
    }

    fn reset(rules: Vec<Block>) -> Block {
        Block::new(BlockKind::Reset(ResetBlock { blocks: rules }), Origin::synthetic())
    }

    fn rule(selector: &str, properties: Vec<Property>) -> Block {
        Block::rule(Selector::parse(selector), properties, Origin::synthetic())
    }

    #[test]
    fn unroll_marks_rules_and_keeps_variables() {
        let body = vec![
            rule("a", vec![declaration("margin", "0")]),
            Block::new(
                BlockKind::VariableDeclaration {
                    name: "gap".to_string(),
                    value: Value::number(4.0),
                },
                Origin::synthetic(),
            ),
        ];
        let mut ctx = context();
        let out = unroll(vec![reset(body)], &mut ctx).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0].as_rule().unwrap().from_reset);
        assert!(matches!(
            out[1].kind,
            BlockKind::VariableDeclaration { .. }
        ));
    }

    #[test]
    fn bare_reference_uses_the_enclosing_selector() {
        let blocks = vec![
            {
                let mut source = rule("a", vec![declaration("margin", "0")]);
                if let BlockKind::SelectorRule(rule) = &mut source.kind {
                    rule.from_reset = true;
                }
                source
            },
            rule("a", vec![reference(None), declaration("color", "red")]),
        ];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(out.len(), 1);
        let resolved = out[0].as_rule().unwrap();
        let names: Vec<_> = resolved.properties.iter().filter_map(Property::name_key).collect();
        assert_eq!(names, vec!["margin", "color"]);
    }

    #[test]
    fn references_never_override() {
        let blocks = vec![
            {
                let mut source = rule(".btn", vec![declaration("color", "black")]);
                if let BlockKind::SelectorRule(rule) = &mut source.kind {
                    rule.from_reset = true;
                }
                source
            },
            rule(".x", vec![declaration("color", "red"), reference(Some(".btn"))]),
        ];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        let resolved = out[0].as_rule().unwrap();
        assert_eq!(resolved.properties.len(), 1);
        match &resolved.properties[0].kind {
            PropertyKind::NameValue { value, .. } => assert_eq!(value, &Value::ident("red")),
            other => panic!("unexpected property {other:?}"),
        }
    }

    #[test]
    fn grouped_reset_rules_match_per_alternative() {
        let blocks = vec![
            {
                let mut source = rule("a, p, div", vec![declaration("margin", "0")]);
                if let BlockKind::SelectorRule(rule) = &mut source.kind {
                    rule.from_reset = true;
                }
                source
            },
            rule("p", vec![reference(None)]),
        ];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        let resolved = out[0].as_rule().unwrap();
        assert_eq!(resolved.properties.len(), 1);
        assert_eq!(resolved.properties[0].name_key().as_deref(), Some("margin"));
    }

    #[test]
    fn unmatched_references_resolve_to_nothing() {
        let blocks = vec![rule(".x", vec![reference(Some(".missing"))])];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert!(out[0].as_rule().unwrap().properties.is_empty());
        assert!(!ctx.has_errors());
    }

    #[test]
    fn references_inside_frames_are_rejected() {
        let keyframes = Block::new(
            BlockKind::KeyFrames(indigo_ir::KeyFramesBlock {
                name: "spin".to_string(),
                prefix: String::new(),
                variables: Vec::new(),
                frames: vec![indigo_ir::KeyFrame {
                    stops: vec!["from".to_string()],
                    properties: vec![reference(None)],
                    origin: Origin::synthetic(),
                }],
            }),
            Origin::synthetic(),
        );
        let mut ctx = context();
        resolve(vec![keyframes], &mut ctx).unwrap();
        assert_eq!(ctx.diagnostics().error_count(), 1);
    }
}
