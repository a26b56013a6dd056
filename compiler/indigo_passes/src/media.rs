//! `@media` block merging.
//!
//! After unrolling, equal media queries can appear many times: once per
//! authored block plus once per rule that nested the query inside itself.
//! Merging folds every later block into the first one with an equal query,
//! preserving rule order within and across the folds. Query equality is
//! structural (case- and term-order-insensitive), so `screen, print`
//! groups with `print, screen`; the first spelling wins.

use indigo_ir::{Block, BlockKind, MediaQuery};
use indigo_session::{CompileContext, FatalError};
use rustc_hash::FxHashMap;

pub fn merge(blocks: Vec<Block>, _ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
    let mut first_at: FxHashMap<MediaQuery, usize> = FxHashMap::default();
    for block in blocks {
        let Block { kind, origin } = block;
        let BlockKind::Media(media) = kind else {
            out.push(Block { kind, origin });
            continue;
        };
        if let Some(&index) = first_at.get(&media.query) {
            if let BlockKind::Media(target) = &mut out[index].kind {
                target.blocks.extend(media.blocks);
            }
        } else {
            first_at.insert(media.query.clone(), out.len());
            out.push(Block {
                kind: BlockKind::Media(media),
                origin,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use indigo_ir::{MediaBlock, Origin, Property, Selector, Value};
    use indigo_session::{CompileContext, CompileOptions, FileCache, MemoryLookup};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn context() -> CompileContext {
        CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::empty(),
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new()),
        )
    }

    fn media(query: MediaQuery, selectors: &[&str]) -> Block {
        let blocks = selectors
            .iter()
            .map(|selector| {
                Block::rule(
                    Selector::parse(selector),
                    vec![Property::name_value(
                        "color",
                        Value::ident("red"),
                        Origin::synthetic(),
                    )],
                    Origin::synthetic(),
                )
            })
            .collect();
        Block::new(
            BlockKind::Media(MediaBlock { query, blocks }),
            Origin::synthetic(),
        )
    }

    fn inner_selectors(block: &Block) -> Vec<String> {
        match &block.kind {
            BlockKind::Media(media) => media
                .blocks
                .iter()
                .filter_map(Block::as_rule)
                .map(|rule| rule.selector.canonical())
                .collect(),
            other => panic!("expected a media block, got {other:?}"),
        }
    }

    #[test]
    fn equal_queries_fold_into_the_first_block() {
        let blocks = vec![
            media(MediaQuery::of_type("screen"), &[".a"]),
            media(MediaQuery::of_type("print"), &[".b"]),
            media(MediaQuery::of_type("screen"), &[".c"]),
        ];
        let mut ctx = context();
        let out = merge(blocks, &mut ctx).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(inner_selectors(&out[0]), vec![".a", ".c"]);
        assert_eq!(inner_selectors(&out[1]), vec![".b"]);
    }

    #[test]
    fn term_order_does_not_split_groups() {
        let screen_print = MediaQuery::new(vec![
            MediaQuery::of_type("screen").terms[0].clone(),
            MediaQuery::of_type("print").terms[0].clone(),
        ]);
        let print_screen = MediaQuery::new(vec![
            MediaQuery::of_type("print").terms[0].clone(),
            MediaQuery::of_type("Screen").terms[0].clone(),
        ]);
        let blocks = vec![media(screen_print, &[".a"]), media(print_screen, &[".b"])];
        let mut ctx = context();
        let out = merge(blocks, &mut ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(inner_selectors(&out[0]), vec![".a", ".b"]);
        // The first spelling survives.
        let BlockKind::Media(merged) = &out[0].kind else {
            panic!("expected a media block");
        };
        assert_eq!(merged.query.to_string(), "screen, print");
    }

    #[test]
    fn other_blocks_keep_their_positions() {
        let rule = Block::rule(Selector::parse(".top"), Vec::new(), Origin::synthetic());
        let blocks = vec![
            media(MediaQuery::of_type("screen"), &[".a"]),
            rule.clone(),
            media(MediaQuery::of_type("screen"), &[".b"]),
        ];
        let mut ctx = context();
        let out = merge(blocks, &mut ctx).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(inner_selectors(&out[0]), vec![".a", ".b"]);
        assert_eq!(
            out[1].as_rule().unwrap().selector.canonical(),
            ".top".to_string()
        );
    }

    proptest! {
        #[test]
        fn merging_keeps_every_rule_and_leaves_queries_unique(picks in prop::collection::vec((0usize..3, 1usize..4), 0..12)) {
            let types = ["screen", "print", "speech"];
            let blocks: Vec<Block> = picks
                .iter()
                .map(|&(which, rules)| {
                    let selectors: Vec<String> =
                        (0..rules).map(|i| format!(".r{i}")).collect();
                    let refs: Vec<&str> = selectors.iter().map(String::as_str).collect();
                    media(MediaQuery::of_type(types[which]), &refs)
                })
                .collect();
            let before: usize = picks.iter().map(|&(_, rules)| rules).sum();

            let mut ctx = context();
            let out = merge(blocks, &mut ctx).unwrap();

            let mut seen = Vec::new();
            let mut after = 0usize;
            for block in &out {
                let BlockKind::Media(media) = &block.kind else {
                    panic!("expected only media blocks");
                };
                prop_assert!(!seen.contains(&media.query), "duplicate query survived");
                seen.push(media.query.clone());
                after += media.blocks.len();
            }
            prop_assert_eq!(before, after);
        }
    }
}
