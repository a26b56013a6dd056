//! Output shortening, enabled by the minify option.
//!
//! Works on meaning-preserving rewrites only; whitespace stripping belongs
//! to the writer. Three families:
//!
//! - numbers move to the convertible peer unit with the shortest exact
//!   spelling (`16px` to `1pc`, `1000ms` to `1s`), never to one that fails
//!   to convert back;
//! - opaque colors take their shortest spelling (3-digit hex or keyword);
//! - longhand declaration groups collapse into their shorthand (`margin`,
//!   `padding`, the `border` family, `background`, `font`, `transition`,
//!   `animation`), but only when the minimal rendering actually shrinks
//!   and no `!important`, duplicate, or pre-existing shorthand interferes.

use indigo_emit::{write_declarations, WriteMode};
use indigo_ir::{format_number, visit, Block, BlockKind, MediaBlock, Property, PropertyKind, Unit, Value};
use indigo_session::{CompileContext, FatalError};

pub fn shorten(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    if !ctx.options().minify() {
        return Ok(blocks);
    }
    let blocks = visit::map_values(blocks, &mut |value| value.map(&mut shorten_value));
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block { kind, origin } = block;
        match kind {
            BlockKind::SelectorRule(mut rule) => {
                rule.properties = collapse_shorthands(rule.properties);
                out.push(Block {
                    kind: BlockKind::SelectorRule(rule),
                    origin,
                });
            }
            BlockKind::Media(media) => {
                let MediaBlock { query, blocks } = media;
                let blocks = blocks
                    .into_iter()
                    .map(|inner| {
                        let Block { kind, origin } = inner;
                        let kind = match kind {
                            BlockKind::SelectorRule(mut rule) => {
                                rule.properties = collapse_shorthands(rule.properties);
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

fn shorten_value(value: Value) -> Value {
    match value {
        Value::Number {
            value,
            unit: Some(unit),
        } => shortest_dimension(value, unit),
        Value::Color(color) if color.alpha.is_none() => Value::Ident(color.shortest()),
        other => other,
    }
}

/// The spelling-shortest convertible peer that survives a round trip. The
/// stored number is the formatted one, so what is measured is what is
/// written. Ties keep the original unit.
fn shortest_dimension(value: f64, unit: Unit) -> Value {
    let mut best: Option<(f64, Unit)> = None;
    let mut best_len = format_number(value).len() + unit.to_string().len();
    for candidate in unit.convertible_peers() {
        if *candidate == unit {
            continue;
        }
        let Some(converted) = unit.convert(value, candidate) else {
            continue;
        };
        let text = format_number(converted);
        let Ok(rounded) = text.parse::<f64>() else {
            continue;
        };
        let Some(back) = candidate.convert(rounded, &unit) else {
            continue;
        };
        if (back - value).abs() > 1e-6 * value.abs().max(1.0) {
            continue;
        }
        let len = text.len() + candidate.to_string().len();
        if len < best_len {
            best_len = len;
            best = Some((rounded, candidate.clone()));
        }
    }
    match best {
        Some((value, unit)) => Value::dimension(value, unit),
        None => Value::dimension(value, unit),
    }
}

type Collapser = fn(&[Property]) -> Option<Vec<Property>>;

const COLLAPSERS: &[Collapser] = &[
    margin,
    padding,
    border_width,
    border_style,
    border_color,
    border,
    background,
    font,
    transition,
    animation,
];

fn collapse_shorthands(mut properties: Vec<Property>) -> Vec<Property> {
    loop {
        let mut changed = false;
        for collapse in COLLAPSERS {
            if let Some(candidate) = collapse(&properties) {
                if minimal_len(&candidate) < minimal_len(&properties) {
                    properties = candidate;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    properties
}

fn minimal_len(properties: &[Property]) -> usize {
    write_declarations(properties, WriteMode::Minimal).len()
}

/// The unique unmarked declaration under `name`, if any. Duplicates and
/// `!important` disqualify the whole collapse: the longhands carry
/// information a shorthand cannot.
fn find_single<'a>(properties: &'a [Property], name: &str) -> Option<(usize, &'a Value)> {
    let mut found = None;
    for (index, property) in properties.iter().enumerate() {
        let PropertyKind::NameValue {
            value, important, ..
        } = &property.kind
        else {
            continue;
        };
        if property.name_key().as_deref() != Some(name) {
            continue;
        }
        if *important || found.is_some() {
            return None;
        }
        found = Some((index, value));
    }
    found
}

fn has_name(properties: &[Property], name: &str) -> bool {
    properties
        .iter()
        .any(|property| property.name_key().as_deref() == Some(name))
}

/// Drop the involved declarations and put the shorthand at the first
/// involved position.
fn replace(
    properties: &[Property],
    involved: &[usize],
    shorthand: &str,
    value: Value,
) -> Vec<Property> {
    let insert_at = involved.iter().copied().min().unwrap_or(0);
    let origin = properties[insert_at].origin.clone();
    let mut value = Some(value);
    let mut out = Vec::with_capacity(properties.len());
    for (index, property) in properties.iter().enumerate() {
        if index == insert_at {
            if let Some(value) = value.take() {
                out.push(Property::name_value(shorthand, value, origin.clone()));
            }
        }
        if involved.contains(&index) {
            continue;
        }
        out.push(property.clone());
    }
    out
}

fn margin(properties: &[Property]) -> Option<Vec<Property>> {
    four_sided(
        properties,
        "margin",
        ["margin-top", "margin-right", "margin-bottom", "margin-left"],
    )
}

fn padding(properties: &[Property]) -> Option<Vec<Property>> {
    four_sided(
        properties,
        "padding",
        ["padding-top", "padding-right", "padding-bottom", "padding-left"],
    )
}

fn border_width(properties: &[Property]) -> Option<Vec<Property>> {
    four_sided(
        properties,
        "border-width",
        [
            "border-top-width",
            "border-right-width",
            "border-bottom-width",
            "border-left-width",
        ],
    )
}

fn border_style(properties: &[Property]) -> Option<Vec<Property>> {
    four_sided(
        properties,
        "border-style",
        [
            "border-top-style",
            "border-right-style",
            "border-bottom-style",
            "border-left-style",
        ],
    )
}

fn border_color(properties: &[Property]) -> Option<Vec<Property>> {
    four_sided(
        properties,
        "border-color",
        [
            "border-top-color",
            "border-right-color",
            "border-bottom-color",
            "border-left-color",
        ],
    )
}

fn four_sided(
    properties: &[Property],
    shorthand: &str,
    names: [&str; 4],
) -> Option<Vec<Property>> {
    if has_name(properties, shorthand) {
        return None;
    }
    let top = find_single(properties, names[0])?;
    let right = find_single(properties, names[1])?;
    let bottom = find_single(properties, names[2])?;
    let left = find_single(properties, names[3])?;
    let value = abbreviate_sides([
        top.1.clone(),
        right.1.clone(),
        bottom.1.clone(),
        left.1.clone(),
    ]);
    Some(replace(
        properties,
        &[top.0, right.0, bottom.0, left.0],
        shorthand,
        value,
    ))
}

/// CSS side abbreviation: drop left when it equals right, then bottom when
/// it equals top, then right when it equals top.
fn abbreviate_sides(sides: [Value; 4]) -> Value {
    let mut parts = sides.to_vec();
    if parts[3] == parts[1] {
        parts.pop();
    }
    if parts.len() == 3 && parts[2] == parts[0] {
        parts.pop();
    }
    if parts.len() == 2 && parts[1] == parts[0] {
        parts.pop();
    }
    if parts.len() == 1 {
        return parts.swap_remove(0);
    }
    Value::Compound(parts)
}

/// `border` wants one width, one style, one color, each single-valued:
/// compound longhands describe per-side values the shorthand cannot carry.
fn border(properties: &[Property]) -> Option<Vec<Property>> {
    if has_name(properties, "border") {
        return None;
    }
    let width = find_single(properties, "border-width")?;
    let style = find_single(properties, "border-style")?;
    let color = find_single(properties, "border-color")?;
    for (_, value) in [&width, &style, &color] {
        if matches!(value, Value::Compound(_) | Value::List(_)) {
            return None;
        }
    }
    let value = Value::Compound(vec![width.1.clone(), style.1.clone(), color.1.clone()]);
    Some(replace(
        properties,
        &[width.0, style.0, color.0],
        "border",
        value,
    ))
}

fn background(properties: &[Property]) -> Option<Vec<Property>> {
    if has_name(properties, "background") {
        return None;
    }
    const PARTS: [&str; 5] = [
        "background-color",
        "background-image",
        "background-repeat",
        "background-attachment",
        "background-position",
    ];
    let mut found = Vec::new();
    for name in PARTS {
        if has_name(properties, name) {
            found.push(find_single(properties, name)?);
        }
    }
    if found.len() < 2 {
        return None;
    }
    let indices: Vec<usize> = found.iter().map(|(index, _)| *index).collect();
    let value = Value::Compound(found.iter().map(|(_, value)| (*value).clone()).collect());
    Some(replace(properties, &indices, "background", value))
}

fn font(properties: &[Property]) -> Option<Vec<Property>> {
    if has_name(properties, "font") {
        return None;
    }
    let size = find_single(properties, "font-size")?;
    let family = find_single(properties, "font-family")?;
    let mut indices = vec![size.0, family.0];
    let mut parts = Vec::new();
    for optional in ["font-style", "font-variant", "font-weight"] {
        if has_name(properties, optional) {
            let (index, value) = find_single(properties, optional)?;
            indices.push(index);
            parts.push(value.clone());
        }
    }
    let size_part = if has_name(properties, "line-height") {
        let (index, line) = find_single(properties, "line-height")?;
        indices.push(index);
        Value::Ident(format!("{}/{}", size.1, line))
    } else {
        size.1.clone()
    };
    parts.push(size_part);
    parts.push(family.1.clone());
    Some(replace(properties, &indices, "font", Value::Compound(parts)))
}

fn transition(properties: &[Property]) -> Option<Vec<Property>> {
    shorthand_chain(
        properties,
        "transition",
        &["transition-property", "transition-duration"],
        &["transition-timing-function", "transition-delay"],
    )
}

fn animation(properties: &[Property]) -> Option<Vec<Property>> {
    shorthand_chain(
        properties,
        "animation",
        &["animation-name", "animation-duration"],
        &[
            "animation-timing-function",
            "animation-delay",
            "animation-iteration-count",
            "animation-direction",
        ],
    )
}

fn shorthand_chain(
    properties: &[Property],
    shorthand: &str,
    required: &[&str],
    optional: &[&str],
) -> Option<Vec<Property>> {
    if has_name(properties, shorthand) {
        return None;
    }
    let mut indices = Vec::new();
    let mut parts = Vec::new();
    for name in required {
        let (index, value) = find_single(properties, name)?;
        indices.push(index);
        parts.push(value.clone());
    }
    for name in optional {
        if has_name(properties, name) {
            let (index, value) = find_single(properties, name)?;
            indices.push(index);
            parts.push(value.clone());
        }
    }
    Some(replace(
        properties,
        &indices,
        shorthand,
        Value::Compound(parts),
    ))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use indigo_ir::{Origin, Rgba, Selector};
    use indigo_session::{CompileOptions, FileCache, MemoryLookup};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn context() -> CompileContext {
        CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::MINIFY,
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new()),
        )
    }

    fn declaration(name: &str, value: Value) -> Property {
        Property::name_value(name, value, Origin::synthetic())
    }

    fn rule(properties: Vec<Property>) -> Vec<Block> {
        vec![Block::rule(
            Selector::parse(".a"),
            properties,
            Origin::synthetic(),
        )]
    }

    fn rendered(blocks: &[Block]) -> String {
        write_declarations(
            &blocks[0].as_rule().unwrap().properties,
            WriteMode::Minimal,
        )
    }

    #[test]
    fn numbers_move_to_shorter_units() {
        assert_eq!(
            shortest_dimension(16.0, Unit::Px),
            Value::dimension(1.0, Unit::Pc)
        );
        assert_eq!(
            shortest_dimension(1000.0, Unit::Ms),
            Value::dimension(1.0, Unit::S)
        );
        // 6pc and 1in are equally short; the earlier peer wins.
        assert_eq!(
            shortest_dimension(96.0, Unit::Px),
            Value::dimension(6.0, Unit::Pc)
        );
        assert_eq!(
            shortest_dimension(0.0, Unit::Px),
            Value::dimension(0.0, Unit::Q)
        );
    }

    #[test]
    fn lossy_conversions_keep_the_original() {
        assert_eq!(
            shortest_dimension(1.0, Unit::Px),
            Value::dimension(1.0, Unit::Px)
        );
        // Opaque units have no peers at all.
        assert_eq!(
            shortest_dimension(50.0, Unit::Percent),
            Value::dimension(50.0, Unit::Percent)
        );
    }

    #[test]
    fn opaque_colors_take_their_shortest_spelling() {
        let blocks = rule(vec![
            declaration("color", Value::Color(Rgba::rgb(255, 0, 0))),
            declaration("background-color", Value::Color(Rgba::rgb(255, 255, 255))),
        ]);
        let mut ctx = context();
        let out = shorten(blocks, &mut ctx).unwrap();
        let css = rendered(&out);
        assert!(css.contains("color:#f00"));
        assert!(css.contains("background-color:#fff"));
    }

    #[test]
    fn translucent_colors_are_untouched() {
        let blocks = rule(vec![declaration(
            "color",
            Value::Color(Rgba::rgba(255, 0, 0, 0.5)),
        )]);
        let mut ctx = context();
        let out = shorten(blocks, &mut ctx).unwrap();
        assert!(rendered(&out).contains("rgba"));
    }

    #[test]
    fn four_margins_collapse_with_side_abbreviation() {
        let px = |n: f64| Value::dimension(n, Unit::Px);
        let blocks = rule(vec![
            declaration("margin-top", px(1.0)),
            declaration("margin-right", px(2.0)),
            declaration("margin-bottom", px(3.0)),
            declaration("margin-left", px(2.0)),
        ]);
        let mut ctx = context();
        let out = shorten(blocks, &mut ctx).unwrap();
        assert_eq!(rendered(&out), "margin:1px 2px 3px");
    }

    #[test]
    fn equal_margins_collapse_to_one_value() {
        let blocks = rule(vec![
            declaration("margin-top", Value::number(0.0)),
            declaration("margin-right", Value::number(0.0)),
            declaration("margin-bottom", Value::number(0.0)),
            declaration("margin-left", Value::number(0.0)),
        ]);
        let mut ctx = context();
        let out = shorten(blocks, &mut ctx).unwrap();
        assert_eq!(rendered(&out), "margin:0");
    }

    #[test]
    fn twelve_border_longhands_collapse_to_border() {
        let mut properties = Vec::new();
        for side in ["top", "right", "bottom", "left"] {
            properties.push(declaration(
                &format!("border-{side}-width"),
                Value::dimension(1.0, Unit::Px),
            ));
            properties.push(declaration(
                &format!("border-{side}-style"),
                Value::ident("solid"),
            ));
            properties.push(declaration(
                &format!("border-{side}-color"),
                Value::ident("red"),
            ));
        }
        let mut ctx = context();
        let out = shorten(rule(properties), &mut ctx).unwrap();
        assert_eq!(rendered(&out), "border:1px solid red");
    }

    #[test]
    fn important_longhands_do_not_collapse() {
        let px = |n: f64| Value::dimension(n, Unit::Px);
        let mut properties = vec![
            declaration("margin-top", px(1.0)),
            declaration("margin-right", px(1.0)),
            declaration("margin-bottom", px(1.0)),
        ];
        properties.push(Property::new(
            PropertyKind::NameValue {
                name: "margin-left".to_string(),
                value: px(1.0),
                important: true,
            },
            Origin::synthetic(),
        ));
        let mut ctx = context();
        let out = shorten(rule(properties), &mut ctx).unwrap();
        assert!(rendered(&out).contains("margin-left"));
    }

    #[test]
    fn an_existing_shorthand_blocks_collapsing() {
        let px = |n: f64| Value::dimension(n, Unit::Px);
        let blocks = rule(vec![
            declaration("margin", px(5.0)),
            declaration("margin-top", px(1.0)),
            declaration("margin-right", px(1.0)),
            declaration("margin-bottom", px(1.0)),
            declaration("margin-left", px(1.0)),
        ]);
        let mut ctx = context();
        let out = shorten(blocks, &mut ctx).unwrap();
        assert!(rendered(&out).contains("margin-top"));
    }

    #[test]
    fn transitions_chain_in_canonical_order() {
        let blocks = rule(vec![
            declaration("transition-duration", Value::dimension(0.3, Unit::S)),
            declaration("transition-property", Value::ident("opacity")),
        ]);
        let mut ctx = context();
        let out = shorten(blocks, &mut ctx).unwrap();
        assert_eq!(rendered(&out), "transition:opacity 0.3s");
    }

    #[test]
    fn font_merges_size_and_line_height() {
        let blocks = rule(vec![
            declaration("font-size", Value::dimension(12.0, Unit::Px)),
            declaration("line-height", Value::number(1.5)),
            declaration("font-family", Value::ident("sans-serif")),
            declaration("font-weight", Value::ident("bold")),
        ]);
        let mut ctx = context();
        let out = shorten(blocks, &mut ctx).unwrap();
        assert_eq!(rendered(&out), "font:bold 12px/1.5 sans-serif");
    }

    #[test]
    fn nothing_happens_without_the_option() {
        let blocks = rule(vec![declaration(
            "width",
            Value::dimension(16.0, Unit::Px),
        )]);
        let mut ctx = CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::empty(),
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new()),
        );
        let out = shorten(blocks, &mut ctx).unwrap();
        assert_eq!(rendered(&out), "width:16px");
    }

    proptest! {
        #[test]
        fn shortened_dimensions_convert_back_exactly_enough(
            value in -10_000.0f64..10_000.0,
            which in 0usize..7,
        ) {
            let units = [Unit::Px, Unit::Pt, Unit::Pc, Unit::In, Unit::Cm, Unit::Mm, Unit::Q];
            let unit = units[which].clone();
            let Value::Number { value: shortened, unit: Some(chosen) } =
                shortest_dimension(value, unit.clone())
            else {
                panic!("dimension lost its unit");
            };
            let back = chosen.convert(shortened, &unit).unwrap();
            prop_assert!((back - value).abs() <= 1e-6 * value.abs().max(1.0));
            let shortened_len =
                format_number(shortened).len() + chosen.to_string().len();
            let original_len = format_number(value).len() + unit.to_string().len();
            prop_assert!(shortened_len <= original_len);
        }
    }
}
