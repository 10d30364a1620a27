//! Sprite manifest parsing and the texture registry handed to the painter.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use glam::Vec2;
use grove_maze_rendering::SpriteKey;
use macroquad::{
    color::WHITE,
    math::{Rect, Vec2 as MacroquadVec2},
    texture::{draw_texture_ex, DrawTextureParams, FilterMode, Texture2D},
};
use serde::Deserialize;

const MANIFEST_VERSION: u32 = 1;

/// Screen-space quad a sprite is stretched onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SpriteQuad {
    origin: Vec2,
    size: Vec2,
    frame: Option<SheetFrame>,
}

impl SpriteQuad {
    pub(crate) fn new(origin: Vec2, size: Vec2) -> Self {
        Self {
            origin,
            size,
            frame: None,
        }
    }

    /// Restricts drawing to one frame of a horizontal sprite sheet.
    pub(crate) fn sheet_frame(mut self, index: u32, count: u32) -> Self {
        self.frame = Some(SheetFrame {
            index,
            count: count.max(1),
        });
        self
    }
}

/// Frame `index` of a sheet holding `count` equally wide frames side by side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SheetFrame {
    index: u32,
    count: u32,
}

impl SheetFrame {
    /// Source rectangle `(x, y, width, height)` inside a sheet of the given size.
    fn source(self, sheet_width: f32, sheet_height: f32) -> (f32, f32, f32, f32) {
        let width = sheet_width / self.count as f32;
        let column = self.index % self.count;
        (width * column as f32, 0.0, width, sheet_height)
    }
}

/// Draws `texture` stretched over `quad`.
pub(crate) fn draw_sprite(texture: Texture2D, quad: SpriteQuad) {
    let source = quad.frame.map(|frame| {
        let (x, y, width, height) = frame.source(texture.width(), texture.height());
        Rect::new(x, y, width, height)
    });
    draw_texture_ex(
        texture,
        quad.origin.x,
        quad.origin.y,
        WHITE,
        DrawTextureParams {
            dest_size: Some(MacroquadVec2::new(quad.size.x, quad.size.y)),
            source,
            ..DrawTextureParams::default()
        },
    );
}

/// Every sprite file named by a manifest, resolved against the manifest's directory.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SpriteManifest {
    entries: Vec<(SpriteKey, PathBuf)>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    version: u32,
    sprites: BTreeMap<String, PathBuf>,
}

impl SpriteManifest {
    /// Reads and parses the manifest at `path`.
    pub(crate) fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("cannot read sprite manifest {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&contents, base)
            .with_context(|| format!("invalid sprite manifest {}", path.display()))
    }

    /// Parses manifest text; every [`SpriteKey`] must be named exactly once.
    fn parse(contents: &str, base: &Path) -> Result<Self> {
        let file: ManifestFile = toml::from_str(contents).context("manifest is not valid TOML")?;
        ensure!(
            file.version == MANIFEST_VERSION,
            "manifest version {} is not supported (expected {MANIFEST_VERSION})",
            file.version
        );

        let mut named = HashMap::with_capacity(file.sprites.len());
        for (name, relative) in file.sprites {
            let key = SpriteKey::from_manifest_name(&name)?;
            let _ = named.insert(key, base.join(relative));
        }

        let mut entries = Vec::with_capacity(named.len());
        let mut missing = Vec::new();
        for key in SpriteKey::all() {
            match named.remove(&key) {
                Some(path) => entries.push((key, path)),
                None => missing.push(key.manifest_name()),
            }
        }
        ensure!(
            missing.is_empty(),
            "manifest lacks sprites: {}",
            missing.join(", ")
        );

        Ok(Self { entries })
    }
}

/// Textures for every [`SpriteKey`], loaded once before the first frame.
#[derive(Debug)]
pub(crate) struct SpriteAtlas {
    textures: HashMap<SpriteKey, Texture2D>,
}

impl SpriteAtlas {
    /// Manifest location used when none is configured.
    pub(crate) fn default_manifest_path() -> PathBuf {
        PathBuf::from("assets/manifest.toml")
    }

    /// Reads the manifest at `path` and decodes every texture it names.
    pub(crate) fn from_manifest_path(path: &Path) -> Result<Self> {
        Self::load(&SpriteManifest::read(path)?, read_texture)
    }

    /// Loads each manifest entry through `load_texture`, in [`SpriteKey::all`] order.
    fn load(
        manifest: &SpriteManifest,
        mut load_texture: impl FnMut(&Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let mut textures = HashMap::with_capacity(manifest.entries.len());
        for (key, path) in &manifest.entries {
            let texture = load_texture(path)
                .with_context(|| format!("cannot load {} from {}", key.manifest_name(), path.display()))?;
            let _ = textures.insert(*key, texture);
        }
        Ok(Self { textures })
    }

    /// Texture registered for `key`.
    pub(crate) fn get(&self, key: SpriteKey) -> Option<Texture2D> {
        self.textures.get(&key).copied()
    }

    /// Number of registered textures.
    pub(crate) fn len(&self) -> usize {
        self.textures.len()
    }
}

fn read_texture(path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let texture = Texture2D::from_file_with_format(&bytes, None);
    texture.set_filter(FilterMode::Nearest);
    Ok(texture)
}
