//! `!important` conflict resolution.
//!
//! Inside one rule, marking exactly one of several same-named declarations
//! `!important` picks it as the survivor and the flag itself is removed:
//! the marker expresses author intent to the compiler, not to the browser.
//! Duplicates with no marked declaration all survive with a warning asking
//! whether a marker was forgotten; more than one marked declaration is
//! ambiguous and also warned. Uniquely named declarations pass through
//! untouched, marked or not.

use indigo_diagnostic::Phase;
use indigo_ir::{Block, BlockKind, MediaBlock, Property, PropertyKind, SelectorRule};
use indigo_session::{CompileContext, FatalError};
use rustc_hash::{FxHashMap, FxHashSet};

pub fn resolve(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block { kind, origin } = block;
        match kind {
            BlockKind::SelectorRule(rule) => out.push(Block {
                kind: BlockKind::SelectorRule(resolve_rule(rule, ctx)),
                origin,
            }),
            BlockKind::Media(media) => {
                let MediaBlock { query, blocks } = media;
                let blocks = blocks
                    .into_iter()
                    .map(|inner| {
                        let Block { kind, origin } = inner;
                        let kind = match kind {
                            BlockKind::SelectorRule(rule) => {
                                BlockKind::SelectorRule(resolve_rule(rule, ctx))
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

fn resolve_rule(rule: SelectorRule, ctx: &mut CompileContext) -> SelectorRule {
    let SelectorRule {
        selector,
        properties,
        from_reset,
    } = rule;
    let mut counts: FxHashMap<String, (usize, usize)> = FxHashMap::default();
    for property in &properties {
        if let PropertyKind::NameValue { important, .. } = &property.kind {
            if let Some(key) = property.name_key() {
                let entry = counts.entry(key).or_insert((0, 0));
                entry.0 += 1;
                if *important {
                    entry.1 += 1;
                }
            }
        }
    }
    let mut warned: FxHashSet<String> = FxHashSet::default();
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
        let key = name.to_ascii_lowercase();
        let (total, marked) = counts.get(&key).copied().unwrap_or((1, 0));
        if total <= 1 {
            out.push(Property {
                kind: PropertyKind::NameValue {
                    name,
                    value,
                    important,
                },
                origin,
            });
            continue;
        }
        match marked {
            // The single marked declaration wins and sheds the marker.
            1 if important => out.push(Property::name_value(name, value, origin)),
            1 => {}
            0 => {
                if warned.insert(key) {
                    ctx.warning(
                        Phase::Compiler,
                        format!("`{name}` is declared {total} times; did you mean `!important`?"),
                        origin.clone(),
                    );
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
            _ => {
                if warned.insert(key) {
                    ctx.warning(
                        Phase::Compiler,
                        format!("`{name}` is marked `!important` {marked} times"),
                        origin.clone(),
                    );
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
        }
    }
    SelectorRule {
        selector,
        properties: out,
        from_reset,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use indigo_diagnostic::Severity;
    use indigo_ir::{Origin, Selector, Value};
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

    fn declaration(name: &str, value: &str, important: bool) -> Property {
        Property::new(
            PropertyKind::NameValue {
                name: name.to_string(),
                value: Value::ident(value),
                important,
            },
            Origin::synthetic(),
        )
    }

    fn rule(properties: Vec<Property>) -> Block {
        Block::rule(Selector::parse(".a"), properties, Origin::synthetic())
    }

    fn emitted(block: &Block) -> Vec<(String, String, bool)> {
        block
            .as_rule()
            .unwrap()
            .properties
            .iter()
            .filter_map(|property| match &property.kind {
                PropertyKind::NameValue {
                    name,
                    value,
                    important,
                } => Some((name.clone(), value.to_string(), *important)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn the_marked_declaration_wins_and_loses_the_marker() {
        let blocks = vec![rule(vec![
            declaration("color", "red", false),
            declaration("color", "blue", true),
        ])];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(
            emitted(&out[0]),
            vec![("color".to_string(), "blue".to_string(), false)]
        );
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn unmarked_duplicates_warn_once_and_all_survive() {
        let blocks = vec![rule(vec![
            declaration("color", "red", false),
            declaration("color", "blue", false),
        ])];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(emitted(&out[0]).len(), 2);
        assert_eq!(ctx.diagnostics().warning_count(), 1);
        let warning = ctx.diagnostics().iter().next().unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert!(warning.message.contains("did you mean `!important`?"));
    }

    #[test]
    fn doubly_marked_duplicates_warn_and_survive() {
        let blocks = vec![rule(vec![
            declaration("color", "red", true),
            declaration("color", "blue", true),
        ])];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(emitted(&out[0]).len(), 2);
        let warning = ctx.diagnostics().iter().next().unwrap();
        assert!(warning.message.contains("is marked `!important` 2 times"));
    }

    #[test]
    fn unique_declarations_keep_their_marker() {
        let blocks = vec![rule(vec![declaration("color", "red", true)])];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(
            emitted(&out[0]),
            vec![("color".to_string(), "red".to_string(), true)]
        );
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn names_compare_case_insensitively() {
        let blocks = vec![rule(vec![
            declaration("Color", "red", false),
            declaration("COLOR", "blue", true),
        ])];
        let mut ctx = context();
        let out = resolve(blocks, &mut ctx).unwrap();
        assert_eq!(
            emitted(&out[0]),
            vec![("COLOR".to_string(), "blue".to_string(), false)]
        );
    }
}
