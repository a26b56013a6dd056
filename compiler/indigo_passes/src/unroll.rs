//! Nesting elimination.
//!
//! Two stages flatten the authored tree into the flat rule list CSS wants.
//! [`nested_rules`] rewrites `parent { child { ... } }` into sibling rules
//! with combined selectors, depth-first, parents before children. A
//! `@media` body nested inside a rule is kept attached as a property at
//! this point; where the media body itself nests rules, those become
//! sibling rules each carrying their slice of the media body. [`inner_media`]
//! then pulls every remaining in-rule `@media` out into a top-level media
//! block holding a copy of the rule's selector. [`check`] asserts the
//! invariant every later stage relies on: no nesting of any kind remains.

use indigo_diagnostic::Phase;
use indigo_ir::{Block, BlockKind, MediaBlock, Property, PropertyKind, Selector, SelectorRule};
use indigo_session::{CompileContext, FatalError};
use indigo_stack::ensure_sufficient_stack;

/// Flatten nested rule blocks into sibling rules with combined selectors.
pub fn nested_rules(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block { kind, origin } = block;
        match kind {
            BlockKind::SelectorRule(rule) => push_unrolled(rule, origin, &mut out),
            BlockKind::Media(media) => {
                let MediaBlock { query, blocks } = media;
                let mut unrolled = Vec::with_capacity(blocks.len());
                for inner in blocks {
                    let Block { kind, origin } = inner;
                    match kind {
                        BlockKind::SelectorRule(rule) => {
                            push_unrolled(rule, origin, &mut unrolled);
                        }
                        other => unrolled.push(Block { kind: other, origin }),
                    }
                }
                out.push(Block {
                    kind: BlockKind::Media(MediaBlock {
                        query,
                        blocks: unrolled,
                    }),
                    origin,
                });
            }
            BlockKind::KeyFrames(mut keyframes) => {
                for frame in &mut keyframes.frames {
                    strip_nested(&mut frame.properties, "@keyframes frames", ctx);
                }
                out.push(Block {
                    kind: BlockKind::KeyFrames(keyframes),
                    origin,
                });
            }
            BlockKind::FontFace(mut font_face) => {
                strip_nested(&mut font_face.properties, "@font-face", ctx);
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

fn push_unrolled(rule: SelectorRule, origin: indigo_ir::Origin, out: &mut Vec<Block>) {
    let SelectorRule {
        selector,
        properties,
        from_reset,
    } = rule;
    let (direct, siblings) = unroll_body(&selector, properties);
    out.push(Block {
        kind: BlockKind::SelectorRule(SelectorRule {
            selector,
            properties: direct,
            from_reset,
        }),
        origin: origin.clone(),
    });
    for (sibling, properties) in siblings {
        out.push(Block {
            kind: BlockKind::SelectorRule(SelectorRule {
                selector: sibling,
                properties,
                from_reset,
            }),
            origin: origin.clone(),
        });
    }
}

/// Split a rule body into the properties the rule keeps and the sibling
/// rules its nesting unrolls to, in depth-first order.
fn unroll_body(
    parent: &Selector,
    properties: Vec<Property>,
) -> (Vec<Property>, Vec<(Selector, Vec<Property>)>) {
    let mut direct = Vec::with_capacity(properties.len());
    let mut siblings = Vec::new();
    for property in properties {
        let Property { kind, origin } = property;
        match kind {
            PropertyKind::NestedBlock {
                selector,
                properties,
            } => {
                let combined = parent.combine(&selector);
                let (child_direct, child_siblings) =
                    ensure_sufficient_stack(|| unroll_body(&combined, properties));
                siblings.push((combined, child_direct));
                siblings.extend(child_siblings);
            }
            PropertyKind::InnerMedia { query, properties } => {
                let (media_direct, media_siblings) =
                    ensure_sufficient_stack(|| unroll_body(parent, properties));
                if !media_direct.is_empty() {
                    direct.push(Property::new(
                        PropertyKind::InnerMedia {
                            query: query.clone(),
                            properties: media_direct,
                        },
                        origin.clone(),
                    ));
                }
                for (sibling, properties) in media_siblings {
                    siblings.push((
                        sibling,
                        vec![Property::new(
                            PropertyKind::InnerMedia {
                                query: query.clone(),
                                properties,
                            },
                            origin.clone(),
                        )],
                    ));
                }
            }
            other => direct.push(Property::new(other, origin)),
        }
    }
    (direct, siblings)
}

fn strip_nested(properties: &mut Vec<Property>, container: &str, ctx: &mut CompileContext) {
    properties.retain(|property| match &property.kind {
        PropertyKind::NestedBlock { .. } => {
            ctx.error(
                Phase::Compiler,
                format!("nested blocks are not allowed inside {container}"),
                property.origin.clone(),
            );
            false
        }
        PropertyKind::InnerMedia { .. } => {
            ctx.error(
                Phase::Compiler,
                format!("@media is not allowed inside {container}"),
                property.origin.clone(),
            );
            false
        }
        _ => true,
    });
}

/// Pull every `@media` left inside a rule out to a top-level media block
/// that repeats the rule's selector. Media nested two deep is an error.
pub fn inner_media(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block { kind, origin } = block;
        match kind {
            BlockKind::SelectorRule(rule) => {
                let SelectorRule {
                    selector,
                    properties,
                    from_reset,
                } = rule;
                let mut direct = Vec::with_capacity(properties.len());
                let mut pulled = Vec::new();
                for property in properties {
                    let Property {
                        kind,
                        origin: reference,
                    } = property;
                    let PropertyKind::InnerMedia {
                        query,
                        properties: mut body,
                    } = kind
                    else {
                        direct.push(Property::new(kind, reference));
                        continue;
                    };
                    reject_inner_media(&mut body, ctx);
                    let rule = Block {
                        kind: BlockKind::SelectorRule(SelectorRule {
                            selector: selector.clone(),
                            properties: body,
                            from_reset,
                        }),
                        origin: reference.clone(),
                    };
                    pulled.push(Block {
                        kind: BlockKind::Media(MediaBlock {
                            query,
                            blocks: vec![rule],
                        }),
                        origin: reference,
                    });
                }
                out.push(Block {
                    kind: BlockKind::SelectorRule(SelectorRule {
                        selector,
                        properties: direct,
                        from_reset,
                    }),
                    origin,
                });
                out.extend(pulled);
            }
            BlockKind::Media(media) => {
                let MediaBlock { query, blocks } = media;
                let blocks = blocks
                    .into_iter()
                    .map(|inner| {
                        let Block { kind, origin } = inner;
                        let kind = match kind {
                            BlockKind::SelectorRule(mut rule) => {
                                reject_inner_media(&mut rule.properties, ctx);
                                BlockKind::SelectorRule(rule)
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
            other => out.push(Block { kind: other, origin }),
        }
    }
    Ok(out)
}

fn reject_inner_media(properties: &mut Vec<Property>, ctx: &mut CompileContext) {
    properties.retain(|property| {
        if matches!(property.kind, PropertyKind::InnerMedia { .. }) {
            ctx.error(
                Phase::Compiler,
                "cannot nest @media inside @media",
                property.origin.clone(),
            );
            false
        } else {
            true
        }
    });
}

/// Debug-build sweep asserting that unrolling left no nesting behind.
pub fn check(blocks: Vec<Block>, _ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    if cfg!(debug_assertions) {
        for block in &blocks {
            match &block.kind {
                BlockKind::SelectorRule(rule) => assert_flat(rule),
                BlockKind::Media(media) => {
                    for inner in &media.blocks {
                        match &inner.kind {
                            BlockKind::SelectorRule(rule) => assert_flat(rule),
                            BlockKind::Media(_) => debug_assert!(
                                false,
                                "@media nested inside @media survived unrolling: {:?}",
                                inner.origin
                            ),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Ok(blocks)
}

fn assert_flat(rule: &SelectorRule) {
    for property in &rule.properties {
        debug_assert!(
            !matches!(property.kind, PropertyKind::NestedBlock { .. }),
            "nested block survived unrolling: {:?}",
            property.origin
        );
        debug_assert!(
            !matches!(property.kind, PropertyKind::InnerMedia { .. }),
            "in-rule @media survived unrolling: {:?}",
            property.origin
        );
    }
}
