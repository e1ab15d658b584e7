//! File-level import: find `.fnt` descriptors, parse them, resolve their
//! texture pages and assemble a [`FontAsset`] per file.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::assets::{self, TexturePage};
use crate::config::Config;
use crate::fnt::{self, ParseError};
use crate::font_asset::FontAsset;

#[derive(Debug)]
pub enum ImportError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: ParseError },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug)]
pub struct ImportedFont {
    pub path: PathBuf,
    pub font: FontAsset,
    /// Empty when texture resolution is disabled.
    pub textures: Vec<TexturePage>,
}

pub fn is_fnt(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("fnt"))
}

/// All `.fnt` files below `root`, sorted by path.
pub fn collect_fnt_files(root: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    fn walk(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                if recursive {
                    walk(&path, recursive, out)?;
                }
            } else if is_fnt(&path) {
                out.push(path);
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    walk(root, recursive, &mut out)?;
    out.sort();
    debug!("Found {} descriptor(s) under '{}'", out.len(), root.display());
    Ok(out)
}

/// Font name used for the asset: the descriptor's file stem.
pub fn font_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn import_file(path: &Path, config: &Config) -> Result<ImportedFont, ImportError> {
    let text = fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptor = fnt::parse(&text).map_err(|source| ImportError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let textures = if config.resolve_textures {
        assets::resolve_pages(path, &descriptor)
    } else {
        Vec::new()
    };

    let font = FontAsset::from_descriptor(&font_name_for(path), descriptor, &config.aliases);
    info!(
        "Imported '{}': {} chars, {} glyphs, {} kerning pairs, {} page(s)",
        font.name,
        font.characters.len(),
        font.glyphs.len(),
        font.kerning_pairs,
        font.texture_names.len()
    );
    Ok(ImportedFont {
        path: path.to_path_buf(),
        font,
        textures,
    })
}
