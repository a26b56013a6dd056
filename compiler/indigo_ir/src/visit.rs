//! Generic traversal over declaration-bearing nodes.
//!
//! Several passes do the same thing to every property list regardless of
//! whether it sits in a selector rule, a `@font-face`, or a keyframe frame.
//! They go through [`map_properties`]/[`visit_properties`] instead of
//! re-matching the block tree each time. Passes that treat node kinds
//! differently (unrolling, include resolution) match the tree themselves.

use crate::block::{Block, BlockKind, KeyFrame, MediaBlock, ResetBlock, SelectorRule};
use crate::property::{Property, PropertyKind};
use crate::value::Value;

/// What kind of node a property list belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Body {
    Rule,
    FontFace,
    Frame,
}

/// Rebuild every property list in the tree through `f`.
///
/// Bottom-up: lists nested inside `NestedBlock`/`InnerMedia` properties are
/// rebuilt before the list containing them is offered to `f`. Keyframe
/// local-variable lists are not bodies and are left alone.
pub fn map_properties<F>(blocks: Vec<Block>, f: &mut F) -> Vec<Block>
where
    F: FnMut(Vec<Property>, Body) -> Vec<Property>,
{
    blocks.into_iter().map(|block| map_block(block, f)).collect()
}

fn map_block<F>(block: Block, f: &mut F) -> Block
where
    F: FnMut(Vec<Property>, Body) -> Vec<Property>,
{
    let Block { kind, origin } = block;
    let kind = match kind {
        BlockKind::SelectorRule(rule) => BlockKind::SelectorRule(SelectorRule {
            properties: map_list(rule.properties, Body::Rule, f),
            ..rule
        }),
        BlockKind::Media(media) => BlockKind::Media(MediaBlock {
            query: media.query,
            blocks: map_properties(media.blocks, f),
        }),
        BlockKind::KeyFrames(mut keyframes) => {
            keyframes.frames = keyframes
                .frames
                .into_iter()
                .map(|frame| KeyFrame {
                    properties: map_list(frame.properties, Body::Frame, f),
                    ..frame
                })
                .collect();
            BlockKind::KeyFrames(keyframes)
        }
        BlockKind::FontFace(mut font_face) => {
            font_face.properties = map_list(font_face.properties, Body::FontFace, f);
            BlockKind::FontFace(font_face)
        }
        BlockKind::Reset(reset) => BlockKind::Reset(ResetBlock {
            blocks: map_properties(reset.blocks, f),
        }),
        other => other,
    };
    Block { kind, origin }
}

fn map_list<F>(properties: Vec<Property>, body: Body, f: &mut F) -> Vec<Property>
where
    F: FnMut(Vec<Property>, Body) -> Vec<Property>,
{
    let properties = properties
        .into_iter()
        .map(|property| {
            let Property { kind, origin } = property;
            let kind = match kind {
                PropertyKind::NestedBlock {
                    selector,
                    properties,
                } => PropertyKind::NestedBlock {
                    selector,
                    properties: map_list(properties, Body::Rule, f),
                },
                PropertyKind::InnerMedia { query, properties } => PropertyKind::InnerMedia {
                    query,
                    properties: map_list(properties, Body::Rule, f),
                },
                other => other,
            };
            Property { kind, origin }
        })
        .collect();
    f(properties, body)
}

/// Read-only companion of [`map_properties`], same visitation order.
pub fn visit_properties<F>(blocks: &[Block], f: &mut F)
where
    F: FnMut(&[Property], Body),
{
    for block in blocks {
        match &block.kind {
            BlockKind::SelectorRule(rule) => visit_list(&rule.properties, Body::Rule, f),
            BlockKind::Media(media) => visit_properties(&media.blocks, f),
            BlockKind::KeyFrames(keyframes) => {
                for frame in &keyframes.frames {
                    visit_list(&frame.properties, Body::Frame, f);
                }
            }
            BlockKind::FontFace(font_face) => {
                visit_list(&font_face.properties, Body::FontFace, f);
            }
            BlockKind::Reset(reset) => visit_properties(&reset.blocks, f),
            _ => {}
        }
    }
}

fn visit_list<F>(properties: &[Property], body: Body, f: &mut F)
where
    F: FnMut(&[Property], Body),
{
    for property in properties {
        match &property.kind {
            PropertyKind::NestedBlock { properties, .. } => visit_list(properties, Body::Rule, f),
            PropertyKind::InnerMedia { properties, .. } => visit_list(properties, Body::Rule, f),
            _ => {}
        }
    }
    f(properties, body);
}

/// Rewrite every `Value` in the tree through `f`.
///
/// `f` receives each whole value site (declaration right-hand sides, import
/// targets, variable initializers, mixin argument and default expressions,
/// media feature values). Use [`Value::map`] inside `f` to transform nodes
/// within a value.
pub fn map_values<F>(blocks: Vec<Block>, f: &mut F) -> Vec<Block>
where
    F: FnMut(Value) -> Value,
{
    blocks
        .into_iter()
        .map(|block| map_block_values(block, f))
        .collect()
}

fn map_block_values<F>(block: Block, f: &mut F) -> Block
where
    F: FnMut(Value) -> Value,
{
    let Block { kind, origin } = block;
    let kind = match kind {
        BlockKind::SelectorRule(rule) => BlockKind::SelectorRule(SelectorRule {
            properties: map_list_values(rule.properties, f),
            ..rule
        }),
        BlockKind::Media(media) => BlockKind::Media(MediaBlock {
            query: map_query_values(media.query, f),
            blocks: map_values(media.blocks, f),
        }),
        BlockKind::KeyFrames(mut keyframes) => {
            keyframes.variables = map_list_values(keyframes.variables, f);
            keyframes.frames = keyframes
                .frames
                .into_iter()
                .map(|frame| KeyFrame {
                    properties: map_list_values(frame.properties, f),
                    ..frame
                })
                .collect();
            BlockKind::KeyFrames(keyframes)
        }
        BlockKind::FontFace(mut font_face) => {
            font_face.properties = map_list_values(font_face.properties, f);
            BlockKind::FontFace(font_face)
        }
        BlockKind::Import { value } => BlockKind::Import { value: f(value) },
        BlockKind::Using { path, media } => BlockKind::Using {
            path,
            media: media.map(|query| map_query_values(query, f)),
        },
        BlockKind::VariableDeclaration { name, value } => BlockKind::VariableDeclaration {
            name,
            value: f(value),
        },
        BlockKind::MixinDeclaration(mut mixin) => {
            for param in &mut mixin.params {
                if let Some(default) = param.default.take() {
                    param.default = Some(f(default));
                }
            }
            mixin.properties = map_list_values(mixin.properties, f);
            BlockKind::MixinDeclaration(mixin)
        }
        BlockKind::Reset(reset) => BlockKind::Reset(ResetBlock {
            blocks: map_values(reset.blocks, f),
        }),
        other @ (BlockKind::Charset { .. } | BlockKind::Sprite(_)) => other,
    };
    Block { kind, origin }
}

fn map_query_values<F>(mut query: crate::media::MediaQuery, f: &mut F) -> crate::media::MediaQuery
where
    F: FnMut(Value) -> Value,
{
    for term in &mut query.terms {
        for feature in &mut term.features {
            if let Some(value) = feature.value.take() {
                feature.value = Some(f(value));
            }
        }
    }
    query
}

fn map_list_values<F>(properties: Vec<Property>, f: &mut F) -> Vec<Property>
where
    F: FnMut(Value) -> Value,
{
    properties
        .into_iter()
        .map(|property| {
            let Property { kind, origin } = property;
            let kind = match kind {
                PropertyKind::NameValue {
                    name,
                    value,
                    important,
                } => PropertyKind::NameValue {
                    name,
                    value: f(value),
                    important,
                },
                PropertyKind::VariableAssignment { name, value } => {
                    PropertyKind::VariableAssignment {
                        name,
                        value: f(value),
                    }
                }
                PropertyKind::MixinApplication {
                    name,
                    mut args,
                    optional,
                    override_existing,
                } => {
                    for arg in &mut args {
                        let value = std::mem::replace(&mut arg.value, Value::Excluded);
                        arg.value = f(value);
                    }
                    PropertyKind::MixinApplication {
                        name,
                        args,
                        optional,
                        override_existing,
                    }
                }
                PropertyKind::NestedBlock {
                    selector,
                    properties,
                } => PropertyKind::NestedBlock {
                    selector,
                    properties: map_list_values(properties, f),
                },
                PropertyKind::InnerMedia { query, properties } => PropertyKind::InnerMedia {
                    query: map_query_values(query, f),
                    properties: map_list_values(properties, f),
                },
                other @ (PropertyKind::IncludeSelector { .. }
                | PropertyKind::ResetReference { .. }) => other,
            };
            Property { kind, origin }
        })
        .collect()
}

/// Read-only walk over every `Value` site, same coverage as [`map_values`].
pub fn visit_values<F>(blocks: &[Block], f: &mut F)
where
    F: FnMut(&Value),
{
    for block in blocks {
        match &block.kind {
            BlockKind::SelectorRule(rule) => visit_list_values(&rule.properties, f),
            BlockKind::Media(media) => {
                visit_query_values(&media.query, f);
                visit_values(&media.blocks, f);
            }
            BlockKind::KeyFrames(keyframes) => {
                visit_list_values(&keyframes.variables, f);
                for frame in &keyframes.frames {
                    visit_list_values(&frame.properties, f);
                }
            }
            BlockKind::FontFace(font_face) => visit_list_values(&font_face.properties, f),
            BlockKind::Import { value } => f(value),
            BlockKind::Using { media, .. } => {
                if let Some(query) = media {
                    visit_query_values(query, f);
                }
            }
            BlockKind::VariableDeclaration { value, .. } => f(value),
            BlockKind::MixinDeclaration(mixin) => {
                for param in &mixin.params {
                    if let Some(default) = &param.default {
                        f(default);
                    }
                }
                visit_list_values(&mixin.properties, f);
            }
            BlockKind::Reset(reset) => visit_values(&reset.blocks, f),
            BlockKind::Charset { .. } | BlockKind::Sprite(_) => {}
        }
    }
}

fn visit_query_values<F>(query: &crate::media::MediaQuery, f: &mut F)
where
    F: FnMut(&Value),
{
    for term in &query.terms {
        for feature in &term.features {
            if let Some(value) = &feature.value {
                f(value);
            }
        }
    }
}

fn visit_list_values<F>(properties: &[Property], f: &mut F)
where
    F: FnMut(&Value),
{
    for property in properties {
        match &property.kind {
            PropertyKind::NameValue { value, .. }
            | PropertyKind::VariableAssignment { value, .. } => f(value),
            PropertyKind::MixinApplication { args, .. } => {
                for arg in args {
                    f(&arg.value);
                }
            }
            PropertyKind::NestedBlock { properties, .. } => visit_list_values(properties, f),
            PropertyKind::InnerMedia { query, properties } => {
                visit_query_values(query, f);
                visit_list_values(properties, f);
            }
            PropertyKind::IncludeSelector { .. } | PropertyKind::ResetReference { .. } => {}
        }
    }
}
