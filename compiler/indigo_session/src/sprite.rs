//! Sprite packing interface.
//!
//! Real bitmap packing lives outside the compiler. The core hands a list
//! of named images to a [`SpriteBackend`], reads back placements to
//! synthesize CSS, and keeps the packed-image handle queued until the
//! write stage saves it.

use std::io;
use std::path::{Path, PathBuf};

use crate::FileLookup;

/// Top-left offset and size of one image inside the packed sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One named source image of a sprite declaration.
#[derive(Clone, Debug)]
pub struct SpriteInput {
    pub name: String,
    pub path: PathBuf,
}

/// An in-memory packed image awaiting `save`. Dropping the handle without
/// saving discards it.
pub trait PackedImage: Send {
    fn save(&mut self, path: &Path, lookup: &dyn FileLookup) -> io::Result<()>;
}

pub struct PackResult {
    /// Placement per input, in input order, keyed by image name.
    pub placements: Vec<(String, Placement)>,
    pub image: Box<dyn PackedImage>,
}

pub trait SpriteBackend: Send + Sync {
    fn pack(&self, images: &[SpriteInput]) -> io::Result<PackResult>;
}

/// A packed image queued on the context for the sprite-writing stage.
pub struct SpriteExport {
    pub output: PathBuf,
    pub image: Box<dyn PackedImage>,
}

/// Test backend: every image gets a fixed-size cell, stacked vertically in
/// input order. The "image" it produces is a plain text manifest.
#[derive(Clone, Copy, Debug)]
pub struct FixedGridBackend {
    pub cell_width: u32,
    pub cell_height: u32,
}

impl Default for FixedGridBackend {
    fn default() -> Self {
        FixedGridBackend {
            cell_width: 16,
            cell_height: 16,
        }
    }
}

impl SpriteBackend for FixedGridBackend {
    fn pack(&self, images: &[SpriteInput]) -> io::Result<PackResult> {
        let placements = images
            .iter()
            .enumerate()
            .map(|(i, input)| {
                (
                    input.name.clone(),
                    Placement {
                        x: 0,
                        y: i as u32 * self.cell_height,
                        width: self.cell_width,
                        height: self.cell_height,
                    },
                )
            })
            .collect();
        let manifest = images
            .iter()
            .map(|input| format!("{} {}\n", input.name, input.path.display()))
            .collect::<String>();
        Ok(PackResult {
            placements,
            image: Box::new(ManifestImage {
                bytes: manifest.into_bytes(),
            }),
        })
    }
}

struct ManifestImage {
    bytes: Vec<u8>,
}

impl PackedImage for ManifestImage {
    fn save(&mut self, path: &Path, lookup: &dyn FileLookup) -> io::Result<()> {
        let mut sink = lookup.open_write(path)?;
        sink.write_all(&self.bytes)?;
        sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryLookup;

    #[test]
    fn fixed_grid_stacks_vertically() {
        let backend = FixedGridBackend::default();
        let result = backend
            .pack(&[
                SpriteInput {
                    name: "save".into(),
                    path: PathBuf::from("img/save.png"),
                },
                SpriteInput {
                    name: "load".into(),
                    path: PathBuf::from("img/load.png"),
                },
            ])
            .unwrap();

        assert_eq!(result.placements[0].1, Placement {
            x: 0,
            y: 0,
            width: 16,
            height: 16,
        });
        assert_eq!(result.placements[1].1.y, 16);
    }

    #[test]
    fn packed_image_saves_through_lookup() {
        let lookup = MemoryLookup::new();
        let backend = FixedGridBackend::default();
        let mut result = backend
            .pack(&[SpriteInput {
                name: "icon".into(),
                path: PathBuf::from("icon.png"),
            }])
            .unwrap();
        result
            .image
            .save(Path::new("out/sprite.png"), &lookup)
            .unwrap();
        assert!(lookup
            .written(Path::new("out/sprite.png"))
            .unwrap()
            .contains("icon"));
    }
}
