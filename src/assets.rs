//! Texture-page resolution for imported descriptors.
//!
//! Page names are reduced to their file-name component and looked up next to
//! the descriptor: ShoeBox writes absolute exporter-side paths, so the
//! directory part is never meaningful on the importing machine.

use std::path::{Path, PathBuf};

use image::ImageReader;
use log::{debug, error, warn};
use serde::Serialize;

use crate::fnt::Descriptor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TexturePage {
    pub page: u32,
    /// Name as written in the descriptor.
    pub name: String,
    pub path: PathBuf,
    /// Pixel size read from the image header; `None` if it could not be read.
    pub dims: Option<(u32, u32)>,
}

impl TexturePage {
    pub const fn is_found(&self) -> bool {
        self.dims.is_some()
    }
}

/// Forward-slash form of a path, for log output and map keys.
pub fn canonical_texture_key<P: AsRef<Path>>(p: P) -> String {
    p.as_ref().to_string_lossy().replace('\\', "/")
}

/// Last component of `page_name`, splitting on both separator styles.
#[inline(always)]
fn page_file_name(page_name: &str) -> &str {
    page_name.rsplit(['/', '\\']).next().unwrap_or(page_name)
}

pub fn texture_path(fnt_path: &Path, page_name: &str) -> PathBuf {
    let dir = fnt_path.parent().unwrap_or_else(|| Path::new(""));
    dir.join(page_file_name(page_name))
}

/// Reads only the image header.
pub fn texture_dimensions(path: &Path) -> image::ImageResult<(u32, u32)> {
    ImageReader::open(path)
        .map_err(image::ImageError::IoError)?
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .into_dimensions()
}

pub fn resolve_pages(fnt_path: &Path, descriptor: &Descriptor) -> Vec<TexturePage> {
    descriptor
        .texture_names
        .iter()
        .enumerate()
        .map(|(page, name)| {
            let path = texture_path(fnt_path, name);
            let dims = match texture_dimensions(&path) {
                Ok((w, h)) => {
                    if i64::from(w) != i64::from(descriptor.texture_width)
                        || i64::from(h) != i64::from(descriptor.texture_height)
                    {
                        warn!(
                            "{}: page {page} '{}' is {w}x{h}, descriptor declares {}x{}",
                            canonical_texture_key(fnt_path),
                            canonical_texture_key(&path),
                            descriptor.texture_width,
                            descriptor.texture_height
                        );
                    } else {
                        debug!("page {page}: '{}' {w}x{h}", canonical_texture_key(&path));
                    }
                    Some((w, h))
                }
                Err(e) => {
                    error!(
                        "{}: texture not found or unreadable '{}': {e}",
                        canonical_texture_key(fnt_path),
                        canonical_texture_key(&path)
                    );
                    None
                }
            };
            TexturePage {
                page: page as u32,
                name: name.clone(),
                path,
                dims,
            }
        })
        .collect()
}
