use std::path::{Path, PathBuf};

use fntimport::assets::TexturePage;
use fntimport::config;
use fntimport::directory::FontDirectory;
use fntimport::import::{self, ImportedFont};
use log::{error, warn};
use serde::Serialize;

/// Import BMFont descriptors and report what each one contains.
#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Print the summaries as JSON
    #[arg(long)]
    json: bool,
    /// Do not descend into subdirectories
    #[arg(long)]
    flat: bool,
    /// Descriptor files or directories to scan for `.fnt` files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Serialize)]
struct FontSummary<'a> {
    path: String,
    name: &'a str,
    point_size: i32,
    line_height: i32,
    baseline: i32,
    atlas: (i32, i32),
    characters: usize,
    glyphs: usize,
    kerning_pairs: usize,
    pages: &'a [TexturePage],
}

impl<'a> FontSummary<'a> {
    fn new(imported: &'a ImportedFont) -> Self {
        let font = &imported.font;
        Self {
            path: display_path(&imported.path),
            name: &font.name,
            point_size: font.face_info.point_size,
            line_height: font.face_info.line_height,
            baseline: font.face_info.baseline,
            atlas: (font.atlas_width, font.atlas_height),
            characters: font.characters.len(),
            glyphs: font.glyphs.len(),
            kerning_pairs: font.kerning_pairs,
            pages: &imported.textures,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    log::set_max_level(log::LevelFilter::Warn);

    config::load();
    let mut cfg = config::get();
    log::set_max_level(cfg.log_level.as_level_filter());

    use clap::Parser as _;
    let args = Args::parse();
    if args.flat {
        cfg.recursive = false;
    }

    let mut files = Vec::new();
    for input in &args.inputs {
        if input.is_dir() {
            files.extend(import::collect_fnt_files(input, cfg.recursive)?);
        } else {
            if !import::is_fnt(input) {
                warn!("'{}' has no .fnt extension, importing anyway", input.display());
            }
            files.push(input.clone());
        }
    }

    let mut imported = Vec::with_capacity(files.len());
    let mut failures = 0usize;
    for path in &files {
        match import::import_file(path, &cfg) {
            Ok(font) => imported.push(font),
            Err(e) => {
                error!("{e}");
                failures += 1;
            }
        }
    }

    let mut directory = FontDirectory::new();
    for font in &imported {
        if let Err(e) = directory.register_font(font.font.clone()) {
            warn!("{}: {e}", display_path(&font.path));
        }
    }

    if args.json {
        let summaries: Vec<FontSummary<'_>> = imported.iter().map(FontSummary::new).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for font in &imported {
            let s = FontSummary::new(font);
            let missing = s.pages.iter().filter(|p| !p.is_found()).count();
            println!(
                "{}: '{}' {}pt, line {} base {}, {}x{} atlas, {} chars, {} kerning pairs{}",
                s.path,
                s.name,
                s.point_size,
                s.line_height,
                s.baseline,
                s.atlas.0,
                s.atlas.1,
                s.characters,
                s.kerning_pairs,
                if missing > 0 {
                    format!(", {missing} missing page(s)")
                } else {
                    String::new()
                }
            );
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} descriptor(s) failed to import", files.len()).into());
    }
    Ok(())
}

fn display_path(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}
