//! Value evaluation: reduce every expression to emit-ready form.
//!
//! Runs after expansion and include resolution, so any `@name` or
//! `@(selector)` still present is genuinely unresolved and reduces to an
//! error. Declarations whose value reduces to `Excluded` are dropped; that
//! is how `??` chains with no surviving branch erase a declaration.

use indigo_diagnostic::Phase;
use indigo_ir::{Block, BlockKind, MediaBlock, MediaQuery, Origin, Property, PropertyKind, Value};
use indigo_session::{CompileContext, FatalError};

pub fn reduce(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block { kind, origin } = block;
        match kind {
            BlockKind::SelectorRule(mut rule) => {
                rule.properties = reduce_properties(rule.properties, ctx);
                out.push(Block {
                    kind: BlockKind::SelectorRule(rule),
                    origin,
                });
            }
            BlockKind::Media(media) => {
                let MediaBlock { query, blocks } = media;
                let query = reduce_query(query, &origin, ctx);
                let blocks = blocks
                    .into_iter()
                    .map(|inner| {
                        let Block { kind, origin } = inner;
                        let kind = match kind {
                            BlockKind::SelectorRule(mut rule) => {
                                rule.properties = reduce_properties(rule.properties, ctx);
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
            BlockKind::KeyFrames(mut keyframes) => {
                for frame in &mut keyframes.frames {
                    frame.properties = reduce_properties(std::mem::take(&mut frame.properties), ctx);
                }
                out.push(Block {
                    kind: BlockKind::KeyFrames(keyframes),
                    origin,
                });
            }
            BlockKind::FontFace(mut font_face) => {
                font_face.properties = reduce_properties(font_face.properties, ctx);
                out.push(Block {
                    kind: BlockKind::FontFace(font_face),
                    origin,
                });
            }
            BlockKind::Import { value } => {
                let value = reduce_value(value, &origin, ctx);
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

fn reduce_properties(properties: Vec<Property>, ctx: &mut CompileContext) -> Vec<Property> {
    let mut out = Vec::with_capacity(properties.len());
    for property in properties {
        let Property { kind, origin } = property;
        let PropertyKind::NameValue {
            name,
            value,
            important,
        } = kind
        else {
            out.push(Property::new(kind, origin));
            continue;
        };
        let value = reduce_value(value, &origin, ctx);
        if value.is_excluded() {
            continue;
        }
        out.push(Property {
            kind: PropertyKind::NameValue {
                name,
                value,
                important,
            },
            origin,
        });
    }
    out
}

fn reduce_query(mut query: MediaQuery, origin: &Origin, ctx: &mut CompileContext) -> MediaQuery {
    for term in &mut query.terms {
        for feature in &mut term.features {
            let Some(value) = feature.value.take() else {
                continue;
            };
            let value = reduce_value(value, origin, ctx);
            feature.value = if value.is_excluded() { None } else { Some(value) };
        }
    }
    query
}

/// Reduce to fixpoint; on an error the offending value is kept as written
/// so one bad expression produces one diagnostic, not a cascade.
fn reduce_value(mut value: Value, origin: &Origin, ctx: &mut CompileContext) -> Value {
    while value.needs_evaluation() {
        match indigo_eval::evaluate(value.clone()) {
            Ok(reduced) => value = reduced,
            Err(error) => {
                ctx.error(Phase::Compiler, error.message().to_string(), origin.clone());
                return value;
            }
        }
    }
    value
}
