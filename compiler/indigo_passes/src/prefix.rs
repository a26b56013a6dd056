//! Vendor prefixes: synthesized `-webkit-`/`-moz-`/`-ms-`/`-o-` copies.
//!
//! A fixed table lists the properties that shipped behind vendor prefixes
//! and which vendors need them. Each standard declaration gains one prefixed
//! copy per vendor, placed before it so the standard spelling wins where the
//! browser understands both. A hand-written prefixed copy is reported as a
//! warning instead of being duplicated, and a prefixed spelling without its
//! standard counterpart is left exactly as written.

use indigo_diagnostic::Phase;
use indigo_ir::visit::{self, Body};
use indigo_ir::{Block, Property, PropertyKind};
use indigo_session::{CompileContext, CompileOptions, FatalError};
use rustc_hash::FxHashSet;

/// Property names and the vendor prefixes generated for them.
const PREFIXABLE: &[(&str, &[&str])] = &[
    ("appearance", &["-webkit-", "-moz-"]),
    ("border-radius", &["-webkit-", "-moz-"]),
    ("box-shadow", &["-webkit-", "-moz-"]),
    ("box-sizing", &["-webkit-", "-moz-"]),
    ("transform", &["-webkit-", "-moz-", "-ms-", "-o-"]),
    ("transition", &["-webkit-", "-moz-", "-o-"]),
    ("animation", &["-webkit-", "-moz-", "-o-"]),
    ("user-select", &["-webkit-", "-moz-", "-ms-"]),
];

fn prefixes_for(name: &str) -> Option<&'static [&'static str]> {
    PREFIXABLE
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, prefixes)| *prefixes)
}

/// Insert vendor-prefixed copies in every rule and keyframe frame.
pub fn synthesize(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    if !ctx.options().contains(CompileOptions::AUTO_PREFIX) {
        return Ok(blocks);
    }
    let blocks = visit::map_properties(blocks, &mut |properties, body| {
        if body == Body::FontFace {
            return properties;
        }
        prefix_list(properties, ctx)
    });
    Ok(blocks)
}

fn prefix_list(properties: Vec<Property>, ctx: &mut CompileContext) -> Vec<Property> {
    let present: FxHashSet<String> = properties.iter().filter_map(Property::name_key).collect();
    let mut out = Vec::with_capacity(properties.len());
    for property in properties {
        let PropertyKind::NameValue {
            name,
            value,
            important,
        } = &property.kind
        else {
            out.push(property);
            continue;
        };
        let lowered = name.to_ascii_lowercase();
        if let Some(prefixes) = prefixes_for(&lowered) {
            for prefix in prefixes {
                let spelled = format!("{prefix}{lowered}");
                if present.contains(&spelled) {
                    ctx.warning(
                        Phase::Compiler,
                        format!("`{spelled}` would be generated from `{name}`; remove the hand-written copy"),
                        property.origin.clone(),
                    );
                    continue;
                }
                out.push(Property {
                    kind: PropertyKind::NameValue {
                        name: spelled,
                        value: value.clone(),
                        important: *important,
                    },
                    origin: property.origin.clone(),
                });
            }
        }
        out.push(property);
    }
    out
}
