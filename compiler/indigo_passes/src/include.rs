//! `@(selector)` include resolution.
//!
//! Includes copy declarations across rules by selector. The pass works on
//! a snapshot of every rule's declarations taken before any rewriting, so
//! copy order between rules cannot change results: an include always sees
//! the other rule as written, never as rewritten. Matching is
//! whole-selector equality, case-insensitive, and a rule never matches
//! itself. Reset-origin rules are not sources; `@reset()` is the tool for
//! those.
//!
//! Two forms exist. A plain `@(.other);` adds the other rule's
//! declarations without overriding anything already named in this rule. An
//! overriding `@(.other)!;` replaces same-named declarations instead, and
//! two overriding includes supplying the same name is a hard error because
//! the outcome would depend on include order. In value position,
//! `color: @(.other)` copies just the same-named declaration's value.

use indigo_diagnostic::Phase;
use indigo_ir::{
    Block, BlockKind, MediaBlock, Property, PropertyKind, Selector, SelectorRule, Value,
};
use indigo_session::{CompileContext, FatalError};
use rustc_hash::FxHashSet;

/// Declarations of one rule as written, used as the copy source.
struct SourceRule {
    id: usize,
    selector: Selector,
    declarations: Vec<Property>,
}

pub fn resolve(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let sources = snapshot(&blocks);
    let mut failed = false;
    let mut next_id = 0usize;
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block { kind, origin } = block;
        match kind {
            BlockKind::SelectorRule(rule) => {
                let id = next_id;
                next_id += 1;
                out.push(Block {
                    kind: BlockKind::SelectorRule(resolve_rule(
                        rule,
                        id,
                        &sources,
                        ctx,
                        &mut failed,
                    )),
                    origin,
                });
            }
            BlockKind::Media(media) => {
                let MediaBlock { query, blocks } = media;
                let blocks = blocks
                    .into_iter()
                    .map(|inner| {
                        let Block { kind, origin } = inner;
                        let kind = match kind {
                            BlockKind::SelectorRule(rule) => {
                                let id = next_id;
                                next_id += 1;
                                BlockKind::SelectorRule(resolve_rule(
                                    rule,
                                    id,
                                    &sources,
                                    ctx,
                                    &mut failed,
                                ))
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
                    reject_includes(&mut frame.properties, "@keyframes frames", ctx);
                }
                out.push(Block {
                    kind: BlockKind::KeyFrames(keyframes),
                    origin,
                });
            }
            BlockKind::FontFace(mut font_face) => {
                reject_includes(&mut font_face.properties, "@font-face", ctx);
                out.push(Block {
                    kind: BlockKind::FontFace(font_face),
                    origin,
                });
            }
            other => out.push(Block { kind: other, origin }),
        }
    }
    if failed {
        return Err(FatalError::StoppedCompiling);
    }
    Ok(out)
}

/// Pre-rewrite declaration lists, ids matching the rewrite walk order.
fn snapshot(blocks: &[Block]) -> Vec<SourceRule> {
    let mut sources = Vec::new();
    let mut id = 0usize;
    let mut record = |rule: &SelectorRule, sources: &mut Vec<SourceRule>, id: usize| {
        if rule.from_reset {
            return;
        }
        sources.push(SourceRule {
            id,
            selector: rule.selector.clone(),
            declarations: rule
                .properties
                .iter()
                .filter(|property| property.is_name_value())
                .cloned()
                .collect(),
        });
    };
    for block in blocks {
        match &block.kind {
            BlockKind::SelectorRule(rule) => {
                record(rule, &mut sources, id);
                id += 1;
            }
            BlockKind::Media(media) => {
                for inner in &media.blocks {
                    if let BlockKind::SelectorRule(rule) = &inner.kind {
                        record(rule, &mut sources, id);
                        id += 1;
                    }
                }
            }
            _ => {}
        }
    }
    sources
}

fn resolve_rule(
    rule: SelectorRule,
    id: usize,
    sources: &[SourceRule],
    ctx: &mut CompileContext,
    failed: &mut bool,
) -> SelectorRule {
    let SelectorRule {
        selector,
        properties,
        from_reset,
    } = rule;
    let own: FxHashSet<String> = properties.iter().filter_map(Property::name_key).collect();
    let mut pulled: FxHashSet<String> = FxHashSet::default();
    let mut override_supplied: FxHashSet<String> = FxHashSet::default();
    let mut out: Vec<Property> = Vec::with_capacity(properties.len());
    for property in properties {
        let Property { kind, origin } = property;
        match kind {
            PropertyKind::IncludeSelector {
                selector: target,
                override_existing,
            } => {
                let copies = collect(sources, id, &target);
                if override_existing {
                    let mut seen: FxHashSet<String> = FxHashSet::default();
                    for copy in &copies {
                        let Some(key) = copy.name_key() else { continue };
                        if !seen.insert(key.clone()) || !override_supplied.insert(key.clone()) {
                            ctx.error(
                                Phase::Compiler,
                                format!(
                                    "`{key}` is supplied by more than one overriding include"
                                ),
                                origin.clone(),
                            );
                            *failed = true;
                        }
                    }
                    let replaced: FxHashSet<String> =
                        copies.iter().filter_map(Property::name_key).collect();
                    out.retain(|existing| {
                        existing
                            .name_key()
                            .is_none_or(|key| !replaced.contains(&key))
                    });
                    out.extend(copies);
                } else {
                    for copy in copies {
                        let Some(key) = copy.name_key() else { continue };
                        if own.contains(&key) || !pulled.insert(key) {
                            continue;
                        }
                        out.push(copy);
                    }
                }
            }
            PropertyKind::NameValue {
                name,
                value,
                important,
            } => {
                let key = name.to_ascii_lowercase();
                let value = resolve_value_refs(&key, value, sources, id);
                out.push(Property {
                    kind: PropertyKind::NameValue {
                        name,
                        value,
                        important,
                    },
                    origin,
                });
            }
            other => out.push(Property::new(other, origin)),
        }
    }
    SelectorRule {
        selector,
        properties: out,
        from_reset,
    }
}

/// Declarations of every matching source in document order.
fn collect(sources: &[SourceRule], self_id: usize, target: &Selector) -> Vec<Property> {
    let mut copies = Vec::new();
    for source in sources {
        if source.id == self_id || !source.selector.matches(target) {
            continue;
        }
        copies.extend(source.declarations.iter().cloned());
    }
    copies
}

/// Replace `@(selector)` in value position with the matching rule's
/// same-named declaration value. Unmatched references stay in place; the
/// evaluation stage reports them.
fn resolve_value_refs(key: &str, value: Value, sources: &[SourceRule], self_id: usize) -> Value {
    value.map(&mut |node| {
        let Value::IncludeRef(target) = &node else {
            return node;
        };
        for source in sources {
            if source.id == self_id || !source.selector.matches(target) {
                continue;
            }
            for declaration in &source.declarations {
                if declaration.name_key().as_deref() != Some(key) {
                    continue;
                }
                if let PropertyKind::NameValue { value, .. } = &declaration.kind {
                    return value.clone();
                }
            }
        }
        node
    })
}

fn reject_includes(properties: &mut Vec<Property>, container: &str, ctx: &mut CompileContext) {
    properties.retain(|property| {
        if let PropertyKind::IncludeSelector { selector, .. } = &property.kind {
            ctx.error(
                Phase::Compiler,
                format!("`@({selector})` is not allowed inside {container}"),
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

    use indigo_ir::{MediaQuery, Origin};
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

    fn include(target: &str, override_existing: bool) -> Property {
        Property::new(
            PropertyKind::IncludeSelector {
                selector: Selector::parse(target),
                override_existing,
            },
            Origin::synthetic(),
        )
    }

    fn rule(selector: &str, properties: Vec<Property>) -> Block {
        Block::rule(Selector::parse(selector), properties, Origin::synthetic())
    }

    fn names(block: &Block) -> Vec<String> {
        block
            .as_rule()
            .unwrap()
            .properties
            .iter()
            .filter_map(Property::name_key)
            .collect()
    }

    fn value_of(block: &Block, name: &str) -> Value {
        block
            .as_rule()
            .unwrap()
            .properties
            .iter()
            .find_map(|property| match &property.kind {
                PropertyKind::NameValue {
                    name: declared,
                    value,
                    ..
                } if declared.eq_ignore_ascii_case(name) => Some(value.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn include_copies_at_the_reference_position() {
        let blocks = vec![
            rule(
                ".btn",
                vec![declaration("color", "black"), declaration("padding", "4px")],
            ),
            rule(".a", vec![include(".btn", false), declaration("margin", "0")]),
        ];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(names(&out[1]), vec!["color", "padding", "margin"]);
    }

    #[test]
    fn plain_include_never_overrides() {
        let blocks = vec![
            rule(
                ".btn",
                vec![declaration("color", "black"), declaration("padding", "4px")],
            ),
            rule(".a", vec![declaration("color", "red"), include(".btn", false)]),
        ];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(names(&out[1]), vec!["color", "padding"]);
        assert_eq!(value_of(&out[1], "color"), Value::ident("red"));
    }

    #[test]
    fn overriding_include_replaces_same_names() {
        let blocks = vec![
            rule(
                ".btn",
                vec![declaration("color", "black"), declaration("padding", "4px")],
            ),
            rule(".a", vec![declaration("color", "red"), include(".btn", true)]),
        ];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(names(&out[1]), vec!["color", "padding"]);
        assert_eq!(value_of(&out[1], "color"), Value::ident("black"));
    }

    #[test]
    fn two_overriding_includes_for_one_name_abort() {
        let blocks = vec![
            rule(".x", vec![declaration("color", "black")]),
            rule(".y", vec![declaration("color", "white")]),
            rule(".a", vec![include(".x", true), include(".y", true)]),
        ];
        let mut ctx = context();
        let result = resolve(blocks, &mut ctx);
        assert!(matches!(result, Err(FatalError::StoppedCompiling)));
        assert_eq!(ctx.diagnostics().error_count(), 1);
        let message = ctx
            .diagnostics()
            .iter()
            .next()
            .unwrap()
            .message
            .clone();
        assert!(message.contains("more than one overriding include"));
    }

    #[test]
    fn value_position_copies_the_same_named_declaration() {
        let blocks = vec![
            rule(".btn", vec![declaration("color", "black")]),
            rule(
                ".a",
                vec![Property::name_value(
                    "color",
                    Value::IncludeRef(Selector::parse(".btn")),
                    Origin::synthetic(),
                )],
            ),
        ];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(value_of(&out[1], "color"), Value::ident("black"));
    }

    #[test]
    fn unmatched_value_references_stay_for_evaluation() {
        let blocks = vec![rule(
            ".a",
            vec![Property::name_value(
                "color",
                Value::IncludeRef(Selector::parse(".missing")),
                Origin::synthetic(),
            )],
        )];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(
            value_of(&out[0], "color"),
            Value::IncludeRef(Selector::parse(".missing"))
        );
        assert!(!ctx.has_errors());
    }

    #[test]
    fn media_rules_can_include_top_level_sources() {
        let media = Block::new(
            BlockKind::Media(MediaBlock {
                query: MediaQuery::of_type("print"),
                blocks: vec![rule(".a", vec![include(".btn", false)])],
            }),
            Origin::synthetic(),
        );
        let blocks = vec![rule(".btn", vec![declaration("color", "black")]), media];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        let BlockKind::Media(media) = &out[1].kind else {
            panic!("expected a media block");
        };
        assert_eq!(
            media.blocks[0]
                .as_rule()
                .unwrap()
                .properties
                .iter()
                .filter_map(Property::name_key)
                .collect::<Vec<_>>(),
            vec!["color"]
        );
    }

    #[test]
    fn reset_origin_rules_are_not_sources() {
        let mut source = rule(".btn", vec![declaration("color", "black")]);
        if let BlockKind::SelectorRule(rule) = &mut source.kind {
            rule.from_reset = true;
        }
        let blocks = vec![source, rule(".a", vec![include(".btn", false)])];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert!(names(&out[1]).is_empty());
    }
}
