//! Sprite packing: declaration rendering and image writing.
//!
//! Rendering runs before mixin expansion. Each `@sprite` declaration is
//! handed to the session's packing backend; the placements that come back
//! are turned into one hidden-parameter mixin per image, so `@icons-save()`
//! expands to the background declarations that show exactly that image out
//! of the packed sheet. The packed image itself stays queued on the context
//! until the writing stage late in the pipeline saves it next to the CSS.

use std::sync::Arc;

use indigo_diagnostic::Phase;
use indigo_ir::{
    Block, BlockKind, MixinDeclaration, MixinParam, Origin, Property, SpriteDeclaration, Unit,
    Value,
};
use indigo_session::{CompileContext, FatalError, Placement, SpriteExport, SpriteInput};

/// Pack every `@sprite` declaration and replace it with per-image mixin
/// declarations. A failed pack drops the declaration with an error; the
/// rest of the document still compiles so later packs get reported too.
pub fn render(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block { kind, origin } = block;
        let BlockKind::Sprite(sprite) = kind else {
            out.push(Block { kind, origin });
            continue;
        };
        let inputs: Vec<SpriteInput> = sprite
            .images
            .iter()
            .map(|image| SpriteInput {
                name: image.name.clone(),
                path: ctx.resolve(&image.path),
            })
            .collect();
        let backend = Arc::clone(ctx.sprite_backend());
        let packed = match backend.pack(&inputs) {
            Ok(packed) => packed,
            Err(error) => {
                ctx.error(
                    Phase::Compiler,
                    format!("failed to pack sprite `{}`: {error}", sprite.output),
                    origin,
                );
                continue;
            }
        };
        for (name, placement) in &packed.placements {
            out.push(image_mixin(&sprite, name, *placement, &origin));
        }
        ctx.queue_sprite(SpriteExport {
            output: ctx.resolve(&sprite.output),
            image: packed.image,
        });
    }
    Ok(out)
}

/// Save every queued packed image and register the produced files.
pub fn write(blocks: Vec<Block>, ctx: &mut CompileContext) -> Result<Vec<Block>, FatalError> {
    for export in ctx.take_sprites() {
        let SpriteExport { output, mut image } = export;
        let lookup = Arc::clone(ctx.lookup());
        image
            .save(&output, lookup.as_ref())
            .map_err(|error| FatalError::io(output.clone(), error))?;
        ctx.record_produced(output);
    }
    Ok(blocks)
}

/// The mixin synthesized for one packed image. All parameters are hidden:
/// applying the mixin emits only the background declarations below, but a
/// caller can still override `url` or the offsets by name.
fn image_mixin(
    sprite: &SpriteDeclaration,
    image: &str,
    placement: Placement,
    origin: &Origin,
) -> Block {
    let param = |name: &str, default: Value| MixinParam {
        name: name.to_string(),
        default: Some(default),
        hidden: true,
    };
    let declaration =
        |name: &str, value: Value| Property::name_value(name, value, origin.clone());
    Block::new(
        BlockKind::MixinDeclaration(MixinDeclaration {
            name: sprite.mixin_name(image),
            params: vec![
                param("url", Value::Url(sprite.output.clone())),
                param("x", Value::dimension(-f64::from(placement.x), Unit::Px)),
                param("y", Value::dimension(-f64::from(placement.y), Unit::Px)),
                param("w", Value::dimension(f64::from(placement.width), Unit::Px)),
                param("h", Value::dimension(f64::from(placement.height), Unit::Px)),
            ],
            properties: vec![
                declaration("background-image", Value::Var("url".to_string())),
                declaration(
                    "background-position",
                    Value::Compound(vec![
                        Value::Var("x".to_string()),
                        Value::Var("y".to_string()),
                    ]),
                ),
                declaration("background-repeat", Value::ident("no-repeat")),
                declaration("width", Value::Var("w".to_string())),
                declaration("height", Value::Var("h".to_string())),
            ],
        }),
        origin.clone(),
    )
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use indigo_ir::{MixinArg, PropertyKind, Selector, SpriteImage};
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

    fn sprite_block() -> Block {
        Block::new(
            BlockKind::Sprite(SpriteDeclaration {
                output: "img/icons.png".to_string(),
                images: vec![
                    SpriteImage {
                        name: "save".to_string(),
                        path: "img/save.png".to_string(),
                    },
                    SpriteImage {
                        name: "load".to_string(),
                        path: "img/load.png".to_string(),
                    },
                ],
            }),
            Origin::synthetic(),
        )
    }

    #[test]
    fn each_image_becomes_a_mixin() {
        let mut ctx = context();
        let out = render(vec![sprite_block()], &mut ctx).unwrap();
        let names: Vec<_> = out
            .iter()
            .map(|block| match &block.kind {
                BlockKind::MixinDeclaration(mixin) => mixin.name.clone(),
                other => panic!("unexpected block {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["icons-save", "icons-load"]);
        assert_eq!(ctx.take_sprites().len(), 1);
    }

    #[test]
    fn second_image_is_offset_by_its_cell() {
        let mut ctx = context();
        let out = render(vec![sprite_block()], &mut ctx).unwrap();
        // FixedGridBackend stacks 16px cells vertically.
        let BlockKind::MixinDeclaration(mixin) = &out[1].kind else {
            panic!("expected a mixin declaration");
        };
        let y = mixin.param("y").and_then(|p| p.default.clone());
        assert_eq!(y, Some(Value::dimension(-16.0, Unit::Px)));
        let w = mixin.param("w").and_then(|p| p.default.clone());
        assert_eq!(w, Some(Value::dimension(16.0, Unit::Px)));
    }

    #[test]
    fn applying_a_sprite_mixin_yields_background_declarations() {
        let mut ctx = context();
        let mut blocks = render(vec![sprite_block()], &mut ctx).unwrap();
        blocks.push(Block::rule(
            Selector::parse(".toolbar .save"),
            vec![Property::new(
                PropertyKind::MixinApplication {
                    name: "icons-save".to_string(),
                    args: Vec::<MixinArg>::new(),
                    optional: false,
                    override_existing: false,
                },
                Origin::synthetic(),
            )],
            Origin::synthetic(),
        ));
        let out = indigo_eval::bind_and_expand(blocks, &mut ctx).unwrap();
        assert!(!ctx.has_errors());
        assert_eq!(out.len(), 1);
        let rule = out[0].as_rule().unwrap();
        let names: Vec<_> = rule.properties.iter().filter_map(Property::name_key).collect();
        assert_eq!(
            names,
            vec![
                "background-image",
                "background-position",
                "background-repeat",
                "width",
                "height",
            ]
        );
        match &rule.properties[0].kind {
            PropertyKind::NameValue { value, .. } => {
                assert_eq!(value, &Value::Url("img/icons.png".to_string()));
            }
            other => panic!("unexpected property {other:?}"),
        }
    }

    #[test]
    fn queued_images_are_saved_on_write() {
        let lookup = Arc::new(MemoryLookup::new());
        let mut ctx = CompileContext::new(
            PathBuf::from("main.icss"),
            CompileOptions::empty(),
            Arc::new(FileCache::new()),
            Arc::clone(&lookup) as Arc<dyn indigo_session::FileLookup>,
        );
        render(vec![sprite_block()], &mut ctx).unwrap();
        write(Vec::new(), &mut ctx).unwrap();
        let manifest = lookup.written(Path::new("img/icons.png")).unwrap();
        assert!(manifest.contains("save"));
        assert!(manifest.contains("load"));
        assert_eq!(ctx.produced_files(), [PathBuf::from("img/icons.png")]);
    }
}
