//! Dead-weight removal: empty blocks and duplicate selectors.
//!
//! [`drop_noops`] removes rules with no declarations left, media blocks
//! those removals emptied, and `@keyframes` whose every frame is empty. A
//! single empty frame inside an otherwise populated `@keyframes` stays:
//! `from {}` is a meaningful hold frame.
//!
//! [`collapse_rules`] merges every rule into the first rule with an equal
//! selector at the same level, concatenating declarations in document
//! order. Levels are independent: the same selector under different media
//! queries stays separate.

use indigo_ir::{Block, BlockKind, MediaBlock, Selector};
use indigo_session::{CompileContext, FatalError};
use rustc_hash::FxHashMap;

pub fn drop_noops(blocks: Vec<Block>, _ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    Ok(blocks.into_iter().filter_map(drop_in_block).collect())
}

fn drop_in_block(block: Block) -> Option<Block> {
    let Block { kind, origin } = block;
    let kind = match kind {
        BlockKind::SelectorRule(rule) if rule.properties.is_empty() => return None,
        BlockKind::Media(media) => {
            let MediaBlock { query, blocks } = media;
            let blocks: Vec<Block> = blocks.into_iter().filter_map(drop_in_block).collect();
            if blocks.is_empty() {
                return None;
            }
            BlockKind::Media(MediaBlock { query, blocks })
        }
        BlockKind::KeyFrames(keyframes)
            if keyframes.frames.iter().all(|frame| frame.properties.is_empty()) =>
        {
            return None;
        }
        other => other,
    };
    Some(Block { kind, origin })
}

pub fn collapse_rules(
    blocks: Vec<Block>,
    _ctx: &mut CompileContext,
) -> Result<Vec<Block>, FatalError> {
    Ok(collapse_level(blocks))
}

fn collapse_level(blocks: Vec<Block>) -> Vec<Block> {
    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
    let mut first_at: FxHashMap<Selector, usize> = FxHashMap::default();
    for block in blocks {
        let Block { kind, origin } = block;
        match kind {
            BlockKind::SelectorRule(rule) => {
                if let Some(&index) = first_at.get(&rule.selector) {
                    if let BlockKind::SelectorRule(target) = &mut out[index].kind {
                        target.properties.extend(rule.properties);
                    }
                } else {
                    first_at.insert(rule.selector.clone(), out.len());
                    out.push(Block {
                        kind: BlockKind::SelectorRule(rule),
                        origin,
                    });
                }
            }
            BlockKind::Media(media) => {
                let MediaBlock { query, blocks } = media;
                out.push(Block {
                    kind: BlockKind::Media(MediaBlock {
                        query,
                        blocks: collapse_level(blocks),
                    }),
                    origin,
                });
            }
            other => out.push(Block { kind: other, origin }),
        }
    }
    out
}
