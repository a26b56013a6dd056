//! Cache breakers: content hashes appended to `url()` and `@import` targets.
//!
//! Every url pointing at a local file gains a `?<hash>` query string derived
//! from the file's bytes, so editing an asset changes the generated CSS and a
//! browser cannot keep serving the stale copy. Remote, protocol-relative and
//! `data:` urls pass through untouched. A url that already carries a query
//! string is extended with `&<hash>` instead. When the referenced file cannot
//! be read the breaker falls back to a stamp that differs on every build.

use std::hash::Hasher;
use std::time::{SystemTime, UNIX_EPOCH};

use indigo_ir::{visit, Block, BlockKind, Value};
use indigo_session::{CompileContext, CompileOptions, FatalError};
use rustc_hash::FxHasher;

/// Append a content-hash query string to every local url and import target.
pub fn append(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    if !ctx.options().contains(CompileOptions::CACHE_BREAKERS) {
        return Ok(blocks);
    }
    let ctx = &*ctx;
    let mut blocks = visit::map_values(blocks, &mut |value| {
        value.map(&mut |node| match node {
            Value::Url(target) => Value::Url(stamp(&target, ctx)),
            other => other,
        })
    });
    // Imports sit at the top of the document by this stage. Only import
    // targets are stamped as bare strings; string values anywhere else keep
    // their text.
    for block in &mut blocks {
        if let BlockKind::Import {
            value: Value::Str { text, .. },
        } = &mut block.kind
        {
            *text = stamp(text, ctx);
        }
    }
    Ok(blocks)
}

/// Stamp one url target. A quote pair wrapping the whole target is kept
/// around the stamped text.
fn stamp(text: &str, ctx: &CompileContext) -> String {
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')));
    let (inner, quote) = if quoted {
        (&text[1..text.len() - 1], &text[..1])
    } else {
        (text, "")
    };
    if is_remote(inner) {
        return text.to_string();
    }
    let separator = if inner.contains('?') { '&' } else { '?' };
    let hash = content_hash(inner, ctx);
    format!("{quote}{inner}{separator}{hash:08x}{quote}")
}

fn is_remote(target: &str) -> bool {
    let lowered = target.to_ascii_lowercase();
    lowered.starts_with("http:")
        || lowered.starts_with("https:")
        || lowered.starts_with("//")
        || lowered.starts_with("data:")
}

/// Hash of the referenced file's bytes. Query strings and fragments are not
/// part of the file name. An unreadable file hashes its path plus the clock,
/// so the breaker still moves between builds.
fn content_hash(target: &str, ctx: &CompileContext) -> u32 {
    let mut hasher = FxHasher::default();
    let file = target.split(['?', '#']).next().unwrap_or(target);
    let resolved = ctx.resolve(file);
    match ctx.lookup().read_raw(&resolved) {
        Ok(bytes) => hasher.write(&bytes),
        Err(_) => {
            hasher.write(resolved.to_string_lossy().as_bytes());
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos();
            hasher.write_u128(now);
        }
    }
    hasher.finish() as u32
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use indigo_ir::{Origin, Property, Selector};
    use indigo_session::{FileCache, MemoryLookup};
    use pretty_assertions::assert_eq;

    use super::*;

    fn context() -> CompileContext {
        let lookup = MemoryLookup::new()
            .with_file("img/logo.png", "PNGDATA")
            .with_file("reset.css", "* { margin: 0; }");
        CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::CACHE_BREAKERS,
            Arc::new(FileCache::new()),
            Arc::new(lookup),
        )
    }

    fn hash_of(bytes: &[u8]) -> u32 {
        let mut hasher = FxHasher::default();
        hasher.write(bytes);
        hasher.finish() as u32
    }

    fn url_rule(target: &str) -> Block {
        Block::rule(
            Selector::parse(".logo"),
            vec![Property::name_value(
                "background-image",
                Value::Url(target.to_string()),
                Origin::synthetic(),
            )],
            Origin::synthetic(),
        )
    }

    fn first_value(blocks: &[Block]) -> Value {
        let rule = blocks[0].as_rule().unwrap();
        match &rule.properties[0].kind {
            indigo_ir::PropertyKind::NameValue { value, .. } => value.clone(),
            other => panic!("unexpected property {other:?}"),
        }
    }

    #[test]
    fn urls_gain_a_content_hash() {
        let mut ctx = context();
        let out = append(vec![url_rule("img/logo.png")], &mut ctx).unwrap();
        let expected = format!("img/logo.png?{:08x}", hash_of(b"PNGDATA"));
        assert_eq!(first_value(&out), Value::Url(expected));
    }

    #[test]
    fn quoted_urls_keep_their_quotes() {
        let mut ctx = context();
        let out = append(vec![url_rule("\"img/logo.png\"")], &mut ctx).unwrap();
        let expected = format!("\"img/logo.png?{:08x}\"", hash_of(b"PNGDATA"));
        assert_eq!(first_value(&out), Value::Url(expected));
    }

    #[test]
    fn existing_query_strings_are_extended() {
        let mut ctx = context();
        let out = append(vec![url_rule("img/logo.png?v=2")], &mut ctx).unwrap();
        let expected = format!("img/logo.png?v=2&{:08x}", hash_of(b"PNGDATA"));
        assert_eq!(first_value(&out), Value::Url(expected));
    }

    #[test]
    fn remote_urls_are_left_alone() {
        let mut ctx = context();
        let remote = [
            "https://cdn.example.com/app.css",
            "http://example.com/a.png",
            "//example.com/a.png",
            "data:image/png;base64,AAAA",
        ];
        for target in remote {
            let out = append(vec![url_rule(target)], &mut ctx).unwrap();
            assert_eq!(first_value(&out), Value::Url(target.to_string()));
        }
    }

    #[test]
    fn missing_files_still_get_a_breaker() {
        let mut ctx = context();
        let out = append(vec![url_rule("img/ghost.png")], &mut ctx).unwrap();
        let Value::Url(stamped) = first_value(&out) else {
            panic!("url expected");
        };
        let suffix = stamped.strip_prefix("img/ghost.png?").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn import_targets_are_stamped() {
        let mut ctx = context();
        let import = Block::new(
            BlockKind::Import {
                value: Value::Str {
                    text: "reset.css".to_string(),
                    quote: '"',
                },
            },
            Origin::synthetic(),
        );
        let out = append(vec![import], &mut ctx).unwrap();
        let expected = format!("reset.css?{:08x}", hash_of(b"* { margin: 0; }"));
        match &out[0].kind {
            BlockKind::Import {
                value: Value::Str { text, .. },
            } => assert_eq!(text, &expected),
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn content_strings_are_untouched() {
        let mut ctx = context();
        let rule = Block::rule(
            Selector::parse(".q::after"),
            vec![Property::name_value(
                "content",
                Value::Str {
                    text: "?".to_string(),
                    quote: '"',
                },
                Origin::synthetic(),
            )],
            Origin::synthetic(),
        );
        let out = append(vec![rule], &mut ctx).unwrap();
        assert_eq!(
            first_value(&out),
            Value::Str {
                text: "?".to_string(),
                quote: '"'
            }
        );
    }

    #[test]
    fn nothing_changes_without_the_flag() {
        let mut ctx = CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::empty(),
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new().with_file("img/logo.png", "PNGDATA")),
        );
        let out = append(vec![url_rule("img/logo.png")], &mut ctx).unwrap();
        assert_eq!(first_value(&out), Value::Url("img/logo.png".to_string()));
    }
}
