//! Name-hash keyed directory of imported fonts and their materials.

use std::fmt;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::font_asset::FontAsset;

/// Text-engine style name hash: `h = ((h << 5) + h) ^ unit` over UTF-16 units.
pub fn simple_hash_code(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |h, unit| {
        (h.wrapping_shl(5).wrapping_add(h)) ^ i32::from(unit)
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    FontAlreadyRegistered { name: String, hash: i32 },
    MaterialAlreadyRegistered { name: String, hash: i32 },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontAlreadyRegistered { name, hash } => {
                write!(f, "font '{name}' (hash {hash}) is already registered")
            }
            Self::MaterialAlreadyRegistered { name, hash } => {
                write!(f, "material '{name}' (hash {hash}) is already registered")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

#[derive(Debug, Default)]
pub struct FontDirectory {
    fonts: FxHashMap<i32, FontAsset>,
    materials: FxHashMap<i32, String>,
}

impl FontDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the font and its material; nothing is changed on error.
    pub fn register_font(&mut self, font: FontAsset) -> Result<i32, DirectoryError> {
        let hash = simple_hash_code(&font.name);
        if self.fonts.contains_key(&hash) {
            return Err(DirectoryError::FontAlreadyRegistered {
                name: font.name,
                hash,
            });
        }
        let mat_hash = simple_hash_code(&font.material_name);
        if self.materials.contains_key(&mat_hash) {
            return Err(DirectoryError::MaterialAlreadyRegistered {
                name: font.material_name,
                hash: mat_hash,
            });
        }
        info!("Registered font '{}' ({hash})", font.name);
        self.materials.insert(mat_hash, font.material_name.clone());
        self.fonts.insert(hash, font);
        Ok(hash)
    }

    /// Removes the font and its material, returning the font.
    pub fn unregister_font(&mut self, name: &str) -> Option<FontAsset> {
        let font = self.fonts.remove(&simple_hash_code(name))?;
        self.materials.remove(&simple_hash_code(&font.material_name));
        debug!("Unregistered font '{name}'");
        Some(font)
    }

    /// Registers a material that does not belong to an imported font.
    pub fn register_material(&mut self, name: &str) -> Result<i32, DirectoryError> {
        let hash = simple_hash_code(name);
        if self.materials.contains_key(&hash) {
            return Err(DirectoryError::MaterialAlreadyRegistered {
                name: name.to_string(),
                hash,
            });
        }
        debug!("Registered material '{name}' ({hash})");
        self.materials.insert(hash, name.to_string());
        Ok(hash)
    }

    pub fn unregister_material(&mut self, name: &str) -> Option<String> {
        let removed = self.materials.remove(&simple_hash_code(name))?;
        debug!("Unregistered material '{name}'");
        Some(removed)
    }

    pub fn font(&self, name: &str) -> Option<&FontAsset> {
        self.fonts.get(&simple_hash_code(name))
    }

    pub fn material(&self, name: &str) -> Option<&str> {
        self.materials
            .get(&simple_hash_code(name))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn clear(&mut self) {
        self.fonts.clear();
        self.materials.clear();
    }
}
