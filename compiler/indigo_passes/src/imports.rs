//! Import hoisting.
//!
//! CSS requires `@import` ahead of every rule. Imports move to the front in
//! their relative order, behind any surviving `@charset`.

use indigo_ir::Block;
use indigo_session::{CompileContext, FatalError};

pub fn hoist(blocks: Vec<Block>, _ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut charsets = Vec::new();
    let mut imports = Vec::new();
    let mut rest = Vec::with_capacity(blocks.len());
    for block in blocks {
        if block.is_charset() {
            charsets.push(block);
        } else if block.is_import() {
            imports.push(block);
        } else {
            rest.push(block);
        }
    }
    let mut out = charsets;
    out.append(&mut imports);
    out.append(&mut rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use indigo_ir::{BlockKind, Origin, Selector, Value};
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

    fn import(target: &str) -> Block {
        Block::new(
            BlockKind::Import {
                value: Value::Str {
                    text: target.to_string(),
                    quote: '"',
                },
            },
            Origin::synthetic(),
        )
    }

    fn rule(selector: &str) -> Block {
        Block::rule(Selector::parse(selector), Vec::new(), Origin::synthetic())
    }

    #[test]
    fn imports_keep_their_relative_order_at_the_front() {
        let mut ctx = context();
        let out = hoist(
            vec![rule(".a"), import("one.css"), rule(".b"), import("two.css")],
            &mut ctx,
        )
        .unwrap();
        assert!(out[0].is_import());
        assert!(out[1].is_import());
        let targets: Vec<String> = out[..2]
            .iter()
            .map(|b| match &b.kind {
                BlockKind::Import { value } => value.to_string(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(targets, vec!["\"one.css\"", "\"two.css\""]);
        assert!(out[2].as_rule().is_some());
    }

    #[test]
    fn charset_stays_ahead_of_imports() {
        let mut ctx = context();
        let out = hoist(
            vec![
                Block::new(
                    BlockKind::Charset {
                        name: "UTF-8".to_string(),
                    },
                    Origin::synthetic(),
                ),
                rule(".a"),
                import("one.css"),
            ],
            &mut ctx,
        )
        .unwrap();
        assert!(out[0].is_charset());
        assert!(out[1].is_import());
    }
}
