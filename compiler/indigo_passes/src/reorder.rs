//! Compression-aware reordering of the output document.
//!
//! Gzip encodes repeated text as back-references, and nearby repetitions
//! encode in fewer bits than distant ones, so blocks that share long runs of
//! text compress better when they sit close together. This stage fingerprints
//! every movable block, grows a few greedy similarity chains, gzips each
//! candidate document, and keeps the smallest. The incoming order is always
//! one of the candidates, so the output never gzips larger than the input.
//!
//! `@charset` and `@import` stay pinned at the front. Selector rules and
//! media blocks are the only blocks that move; everything else keeps its
//! relative order between the pins and the movable tail.

use std::io::Write;
use std::mem;

use flate2::write::GzEncoder;
use flate2::Compression;
use indigo_emit::{write_block, write_document, WriteMode};
use indigo_ir::{Block, BlockKind, Origin};
use indigo_session::{CompileContext, CompileOptions, FatalError};

/// How many similarity chains to try on top of the incoming order.
const CHAIN_ROOTS: usize = 3;

/// Reorder movable blocks so the gzipped document gets smaller.
pub fn optimize(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    if !ctx.options().contains(CompileOptions::OPTIMIZE_COMPRESSION) {
        return Ok(blocks);
    }
    if blocks.iter().filter(|block| is_movable(block)).count() < 2 {
        return Ok(blocks);
    }
    let mode = if ctx.options().minify() {
        WriteMode::Minimal
    } else {
        WriteMode::Pretty
    };

    let mut pins = Vec::new();
    let mut anchored = Vec::new();
    let mut movable = Vec::new();
    for block in blocks {
        if block.is_charset() || block.is_import() {
            pins.push(block);
        } else if is_movable(&block) {
            movable.push(block);
        } else {
            anchored.push(block);
        }
    }

    let overlap = overlap_matrix(&movable);
    let orders = candidate_orders(&overlap);

    // Candidate 0 is the incoming order; any other order must be strictly
    // smaller to replace it.
    let mut best_at = 0;
    let mut best_len = usize::MAX;
    let mut original_len = 0;
    for (at, order) in orders.iter().enumerate() {
        let text = render(&pins, &anchored, &movable, order, mode);
        let len = gzipped_len(&text);
        if at == 0 {
            original_len = len;
        }
        if len < best_len {
            best_len = len;
            best_at = at;
        }
    }
    if original_len > best_len && original_len > 0 {
        let saved = original_len.saturating_sub(best_len);
        let percent = 100.0 * saved as f64 / original_len as f64;
        ctx.info(
            format!(
                "compression-aware reordering: {original_len} -> {best_len} gzipped bytes ({percent:.1}% saved)"
            ),
            Origin::synthetic(),
        );
    }

    let order = &orders[best_at];
    let mut slots: Vec<Option<Block>> = movable.into_iter().map(Some).collect();
    let mut out = pins;
    out.extend(anchored);
    out.extend(order.iter().filter_map(|&index| slots[index].take()));
    Ok(out)
}

fn is_movable(block: &Block) -> bool {
    matches!(
        block.kind,
        BlockKind::SelectorRule(_) | BlockKind::Media(_)
    )
}

/// Canonical spelling used only for similarity fingerprints: selector
/// alternatives sorted, declarations sorted by name. The emitted document
/// keeps the author's order.
fn normalized(block: &Block) -> Block {
    let mut clone = block.clone();
    normalize_in_place(&mut clone);
    clone
}

fn normalize_in_place(block: &mut Block) {
    match &mut block.kind {
        BlockKind::SelectorRule(rule) => {
            rule.selector = rule.selector.sorted();
            rule.properties
                .sort_by_cached_key(|property| property.name_key().unwrap_or_default());
        }
        BlockKind::Media(media) => {
            for inner in &mut media.blocks {
                normalize_in_place(inner);
            }
        }
        _ => {}
    }
}

/// Symmetric matrix of shared-text lengths between movable blocks.
fn overlap_matrix(movable: &[Block]) -> Vec<Vec<usize>> {
    let texts: Vec<Vec<u8>> = movable
        .iter()
        .map(|block| write_block(&normalized(block), WriteMode::Minimal).into_bytes())
        .collect();
    let count = texts.len();
    let mut overlap = vec![vec![0; count]; count];
    for i in 0..count {
        for j in i + 1..count {
            let shared = longest_common_substring(&texts[i], &texts[j]);
            overlap[i][j] = shared;
            overlap[j][i] = shared;
        }
    }
    overlap
}

/// Length of the longest byte run present in both `a` and `b`. Two rolling
/// rows keep the dynamic program at `O(min(a, b))` memory.
fn longest_common_substring(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    let mut best = 0;
    for &byte_a in a {
        for (j, &byte_b) in b.iter().enumerate() {
            current[j + 1] = if byte_a == byte_b { previous[j] + 1 } else { 0 };
            best = best.max(current[j + 1]);
        }
        mem::swap(&mut previous, &mut current);
    }
    best
}

/// The incoming order plus one greedy chain per heavy root. Roots are the
/// blocks with the largest overlap row totals.
fn candidate_orders(overlap: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let count = overlap.len();
    let mut orders = vec![(0..count).collect::<Vec<_>>()];
    let mut totals: Vec<(usize, usize)> = overlap
        .iter()
        .enumerate()
        .map(|(index, row)| (row.iter().sum(), index))
        .collect();
    totals.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, root) in totals.iter().take(CHAIN_ROOTS) {
        orders.push(grow_chain(overlap, root));
    }
    orders
}

/// Greedy chain from `root`: repeatedly append the remaining block sharing
/// the most text with everything chosen so far. Ties go to the lower index.
fn grow_chain(overlap: &[Vec<usize>], root: usize) -> Vec<usize> {
    let count = overlap.len();
    let mut order = Vec::with_capacity(count);
    let mut remaining: Vec<usize> = (0..count).filter(|&index| index != root).collect();
    let mut score = vec![0usize; count];
    let mut chosen = root;
    order.push(root);
    while !remaining.is_empty() {
        for &candidate in &remaining {
            score[candidate] += overlap[chosen][candidate];
        }
        let mut best_at = 0;
        for (at, &candidate) in remaining.iter().enumerate().skip(1) {
            let best = remaining[best_at];
            if score[candidate] > score[best]
                || (score[candidate] == score[best] && candidate < best)
            {
                best_at = at;
            }
        }
        chosen = remaining.swap_remove(best_at);
        order.push(chosen);
    }
    order
}

fn render(
    pins: &[Block],
    anchored: &[Block],
    movable: &[Block],
    order: &[usize],
    mode: WriteMode,
) -> String {
    let mut document: Vec<Block> = Vec::with_capacity(pins.len() + anchored.len() + movable.len());
    document.extend(pins.iter().cloned());
    document.extend(anchored.iter().cloned());
    document.extend(order.iter().map(|&index| movable[index].clone()));
    write_document(&document, mode)
}

/// Gzipped size of `text`. Encoder failures count as the raw length.
fn gzipped_len(text: &str) -> usize {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    if encoder.write_all(text.as_bytes()).is_err() {
        return text.len();
    }
    encoder.finish().map_or(text.len(), |bytes| bytes.len())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use indigo_ir::{
        FontFaceBlock, KeyFramesBlock, Property, Selector, Value,
    };
    use indigo_session::{FileCache, MemoryLookup};
    use pretty_assertions::assert_eq;

    use super::*;

    fn context() -> CompileContext {
        CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::OPTIMIZE_COMPRESSION,
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new()),
        )
    }

    fn rule(selector: &str, declarations: &[(&str, &str)]) -> Block {
        Block::rule(
            Selector::parse(selector),
            declarations
                .iter()
                .map(|(name, value)| {
                    Property::name_value(*name, Value::ident(*value), Origin::synthetic())
                })
                .collect(),
            Origin::synthetic(),
        )
    }

    fn selectors(blocks: &[Block]) -> Vec<String> {
        blocks
            .iter()
            .filter_map(Block::as_rule)
            .map(|rule| rule.selector.canonical())
            .collect()
    }

    #[test]
    fn nothing_changes_without_the_flag() {
        let mut ctx = CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::empty(),
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new()),
        );
        let blocks = vec![rule(".b", &[("color", "red")]), rule(".a", &[("color", "red")])];
        let out = optimize(blocks, &mut ctx).unwrap();
        assert_eq!(selectors(&out), vec![".b", ".a"]);
    }

    #[test]
    fn fewer_than_two_movable_blocks_pass_through() {
        let mut ctx = context();
        let blocks = vec![
            Block::new(
                BlockKind::Charset {
                    name: "utf-8".to_string(),
                },
                Origin::synthetic(),
            ),
            rule(".a", &[("color", "red")]),
        ];
        let out = optimize(blocks, &mut ctx).unwrap();
        assert!(out[0].is_charset());
        assert_eq!(selectors(&out), vec![".a"]);
    }

    #[test]
    fn pins_stay_in_front_and_every_block_survives() {
        let mut ctx = context();
        let blocks = vec![
            Block::new(
                BlockKind::Charset {
                    name: "utf-8".to_string(),
                },
                Origin::synthetic(),
            ),
            Block::new(
                BlockKind::Import {
                    value: Value::Str {
                        text: "reset.css".to_string(),
                        quote: '"',
                    },
                },
                Origin::synthetic(),
            ),
            rule(".a", &[("color", "red"), ("margin", "auto")]),
            Block::new(
                BlockKind::KeyFrames(KeyFramesBlock {
                    name: "spin".to_string(),
                    prefix: String::new(),
                    variables: Vec::new(),
                    frames: Vec::new(),
                }),
                Origin::synthetic(),
            ),
            rule(".b", &[("color", "blue")]),
            rule(".c", &[("color", "red"), ("margin", "auto")]),
        ];
        let out = optimize(blocks, &mut ctx).unwrap();
        assert_eq!(out.len(), 6);
        assert!(out[0].is_charset());
        assert!(out[1].is_import());
        assert!(matches!(out[2].kind, BlockKind::KeyFrames(_)));
        let mut rules = selectors(&out);
        rules.sort();
        assert_eq!(rules, vec![".a", ".b", ".c"]);
    }

    #[test]
    fn shared_text_is_detected_between_rules() {
        let twins = [
            rule(".alpha", &[("color", "red"), ("background", "blue")]),
            rule(".omega", &[("color", "red"), ("background", "blue")]),
            rule(".other", &[("margin", "auto")]),
        ];
        let overlap = overlap_matrix(&twins);
        assert!(overlap[0][1] > overlap[0][2]);
        assert_eq!(overlap[0][1], overlap[1][0]);
    }

    #[test]
    fn fingerprints_ignore_declaration_order() {
        let forward = rule(".a", &[("color", "red"), ("margin", "auto")]);
        let backward = rule(".a", &[("margin", "auto"), ("color", "red")]);
        assert_eq!(
            write_block(&normalized(&forward), WriteMode::Minimal),
            write_block(&normalized(&backward), WriteMode::Minimal),
        );
    }

    #[test]
    fn chains_follow_the_overlap_matrix() {
        let overlap = vec![vec![0, 10, 2], vec![10, 0, 1], vec![2, 1, 0]];
        assert_eq!(
            candidate_orders(&overlap),
            vec![vec![0, 1, 2], vec![0, 1, 2], vec![1, 0, 2], vec![2, 0, 1]]
        );
    }

    #[test]
    fn longest_common_substring_finds_inner_runs() {
        assert_eq!(longest_common_substring(b"abcdef", b"zzcdezz"), 3);
        assert_eq!(longest_common_substring(b"", b"abc"), 0);
        assert_eq!(longest_common_substring(b"same", b"same"), 4);
    }

    #[test]
    fn font_faces_keep_their_position_between_pins_and_rules() {
        let mut ctx = context();
        let blocks = vec![
            rule(".a", &[("color", "red")]),
            Block::new(
                BlockKind::FontFace(FontFaceBlock {
                    properties: Vec::new(),
                }),
                Origin::synthetic(),
            ),
            rule(".b", &[("color", "blue")]),
        ];
        let out = optimize(blocks, &mut ctx).unwrap();
        assert!(matches!(out[0].kind, BlockKind::FontFace(_)));
        let mut rules = selectors(&out);
        rules.sort();
        assert_eq!(rules, vec![".a", ".b"]);
    }
}
