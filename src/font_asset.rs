//! Renderable-font bundle built from a parsed descriptor.
//!
//! This is the shape a font-asset registry consumes: face metrics, the
//! character/glyph tables (plus any aliased code points), a kerning lookup
//! and the name of the backing material.

use log::{debug, trace, warn};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::fnt::{Character, Descriptor, Glyph};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FaceInfo {
    pub point_size: i32,
    pub line_height: i32,
    pub baseline: i32,
    pub ascent_line: i32,
}

impl FaceInfo {
    pub const fn from_descriptor(d: &Descriptor) -> Self {
        let size = d.point_size();
        Self {
            point_size: size,
            line_height: d.line_height,
            baseline: d.line_base,
            ascent_line: size,
        }
    }
}

/// Code points redirected to the glyph of `source`.
///
/// Aliasing replaces whatever glyph a code point already had, so the
/// default list is empty and nothing is aliased unless configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasOptions {
    pub source: u32,
    pub codes: Vec<u32>,
}

impl Default for AliasOptions {
    fn default() -> Self {
        Self {
            // SPACE: an exporter-independent blank glyph.
            source: 0x20,
            codes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FontAsset {
    pub name: String,
    pub material_name: String,
    pub face_info: FaceInfo,
    pub atlas_width: i32,
    pub atlas_height: i32,
    pub texture_names: Vec<String>,
    pub characters: Vec<Character>,
    pub glyphs: Vec<Glyph>,
    #[serde(skip)]
    lookup: FxHashMap<u32, usize>,
    #[serde(skip)]
    kerning: FxHashMap<(u32, u32), i32>,
    pub kerning_pairs: usize,
}

pub fn material_name_for(font_name: &str) -> String {
    format!("{font_name} Material")
}

impl FontAsset {
    pub fn from_descriptor(name: &str, descriptor: Descriptor, aliases: &AliasOptions) -> Self {
        let face_info = FaceInfo::from_descriptor(&descriptor);

        let mut kerning =
            FxHashMap::with_capacity_and_hasher(descriptor.kernings.len(), Default::default());
        for k in &descriptor.kernings {
            kerning.entry((k.first, k.second)).or_insert(k.amount);
        }
        if kerning.len() != descriptor.kernings.len() {
            debug!(
                "'{name}': {} duplicate kerning pair(s) dropped (first entry kept)",
                descriptor.kernings.len() - kerning.len()
            );
        }

        let mut asset = Self {
            name: name.to_string(),
            material_name: material_name_for(name),
            face_info,
            atlas_width: descriptor.texture_width,
            atlas_height: descriptor.texture_height,
            texture_names: descriptor.texture_names,
            characters: descriptor.characters,
            glyphs: descriptor.glyphs,
            lookup: descriptor.lookup,
            kerning_pairs: kerning.len(),
            kerning,
        };
        for &code in &aliases.codes {
            asset.alias(code, aliases.source);
        }
        asset
    }

    /// Point `code` at the glyph already used by `source`.
    ///
    /// A new character is appended and the lookup entry for `code` is
    /// overwritten, even if the font defined `code` itself. Returns false
    /// only when `source` is absent.
    pub fn alias(&mut self, code: u32, source: u32) -> bool {
        let Some(glyph) = self.character(source).map(|c| c.glyph) else {
            warn!(
                "'{}': cannot alias U+{code:04X}, source U+{source:04X} is missing",
                self.name
            );
            return false;
        };
        if self.lookup.contains_key(&code) {
            trace!("'{}': U+{code:04X} replaced by alias of U+{source:04X}", self.name);
        }
        self.lookup.insert(code, self.characters.len());
        self.characters.push(Character { code, glyph });
        true
    }

    pub fn character(&self, code: u32) -> Option<&Character> {
        self.lookup.get(&code).map(|&i| &self.characters[i])
    }

    pub fn glyph_for(&self, code: u32) -> Option<&Glyph> {
        self.character(code)
            .and_then(|c| self.glyphs.get(c.glyph as usize))
    }

    pub fn kerning(&self, first: u32, second: u32) -> Option<i32> {
        self.kerning.get(&(first, second)).copied()
    }
}
