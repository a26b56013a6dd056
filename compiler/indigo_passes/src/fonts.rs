//! `@font-face` completeness and usage checks.
//!
//! A face without `font-family` or without `src` cannot load in any
//! browser, so both are errors. A complete face nothing refers to is only
//! suspicious: the declaration costs a download, so it earns a warning.
//! References are searched in `font` and `font-family` declarations
//! anywhere in the document, case-insensitively.

use indigo_diagnostic::Phase;
use indigo_ir::{Block, BlockKind, Property, PropertyKind, Value};
use indigo_session::{CompileContext, FatalError};

pub fn check(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let usage = usage_text(&blocks);
    for block in &blocks {
        let BlockKind::FontFace(font_face) = &block.kind else {
            continue;
        };
        let mut family = None;
        let mut has_src = false;
        for property in &font_face.properties {
            let PropertyKind::NameValue { value, .. } = &property.kind else {
                continue;
            };
            match property.name_key().as_deref() {
                Some("font-family") => family = Some(family_text(value)),
                Some("src") => has_src = true,
                _ => {}
            }
        }
        if family.is_none() {
            ctx.error(
                Phase::Compiler,
                "@font-face is missing `font-family`",
                block.origin.clone(),
            );
        }
        if !has_src {
            ctx.error(
                Phase::Compiler,
                "@font-face is missing `src`",
                block.origin.clone(),
            );
        }
        if let Some(family) = family {
            if !usage.contains(&family.to_ascii_lowercase()) {
                ctx.warning(
                    Phase::Compiler,
                    format!("font face `{family}` is never referenced"),
                    block.origin.clone(),
                );
            }
        }
    }
    Ok(blocks)
}

/// Every `font` / `font-family` declaration value in the document,
/// lowercased, one per line.
fn usage_text(blocks: &[Block]) -> String {
    let mut usage = String::new();
    let mut scan = |properties: &[Property]| {
        for property in properties {
            let PropertyKind::NameValue { value, .. } = &property.kind else {
                continue;
            };
            if matches!(
                property.name_key().as_deref(),
                Some("font") | Some("font-family")
            ) {
                usage.push_str(&value.to_string().to_ascii_lowercase());
                usage.push('\n');
            }
        }
    };
    for block in blocks {
        match &block.kind {
            BlockKind::SelectorRule(rule) => scan(&rule.properties),
            BlockKind::Media(media) => {
                for inner in &media.blocks {
                    if let BlockKind::SelectorRule(rule) = &inner.kind {
                        scan(&rule.properties);
                    }
                }
            }
            BlockKind::KeyFrames(keyframes) => {
                for frame in &keyframes.frames {
                    scan(&frame.properties);
                }
            }
            _ => {}
        }
    }
    usage
}

/// The family name without quoting, for substring matching.
fn family_text(value: &Value) -> String {
    match value {
        Value::Str { text, .. } => text.clone(),
        other => other.to_string(),
    }
}
