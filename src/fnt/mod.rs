//! BMFont descriptor parsing.
//!
//! Accepts both encodings BMFont-style exporters produce (the line-oriented
//! `key=value` text form and the XML form) and normalizes them into a single
//! [`Descriptor`]. Call [`parse`]; the encoding is sniffed from the content.

pub mod error;
pub mod glyph;
pub mod text;
pub mod xml;

use std::str::FromStr;

use log::debug;
use rustc_hash::FxHashMap;
use serde::Serialize;

pub use error::ParseError;
pub use glyph::{CharRecord, GlyphTableBuilder, GlyphTables};
pub use text::TextParser;
pub use xml::XmlParser;

/* ======================= TYPES ======================= */

/// Atlas rectangle in texture pixels, bottom-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlyphRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlyphMetrics {
    pub width: i32,
    pub height: i32,
    pub bearing_x: i32,
    pub bearing_y: i32,
    pub advance: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Glyph {
    /// Dense creation-order handle, independent of code point.
    pub index: u32,
    pub rect: GlyphRect,
    pub metrics: GlyphMetrics,
    /// Texture page holding this glyph.
    pub page: u32,
}

/// Binds a code point to a glyph by index into [`Descriptor::glyphs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Character {
    pub code: u32,
    pub glyph: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Kerning {
    pub first: u32,
    pub second: u32,
    pub amount: i32,
}

/// A fully parsed font descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Descriptor {
    pub texture_width: i32,
    pub texture_height: i32,
    /// Texture file names indexed by page id.
    pub texture_names: Vec<String>,
    pub font_name: String,
    /// Signed as exported; see [`Descriptor::point_size`].
    pub font_size: i32,
    pub line_height: i32,
    /// Baseline distance from the top of a line.
    pub line_base: i32,
    pub characters: Vec<Character>,
    /// Code point -> index into `characters`.
    #[serde(skip)]
    pub lookup: FxHashMap<u32, usize>,
    pub glyphs: Vec<Glyph>,
    /// Parse order, duplicates kept. Empty when the file has no kerning block.
    pub kernings: Vec<Kerning>,
}

impl Descriptor {
    pub fn character(&self, code: u32) -> Option<&Character> {
        self.lookup.get(&code).map(|&i| &self.characters[i])
    }

    pub fn glyph_for(&self, code: u32) -> Option<&Glyph> {
        self.character(code)
            .and_then(|c| self.glyphs.get(c.glyph as usize))
    }

    /// Kerning adjustment for `second` following `first`.
    ///
    /// When the file repeats a pair, the earliest entry wins.
    pub fn kerning(&self, first: u32, second: u32) -> Option<i32> {
        self.kernings
            .iter()
            .find(|k| k.first == first && k.second == second)
            .map(|k| k.amount)
    }

    /// Point size; the sign of `font_size` is an exporter flag, not a size.
    #[inline(always)]
    pub const fn point_size(&self) -> i32 {
        self.font_size.abs()
    }

    pub fn page_count(&self) -> usize {
        self.texture_names.len()
    }
}

/* ======================= FORMAT DISPATCH ======================= */

/// Common capability of the two encodings.
pub trait DescriptorParser {
    fn parse(&self, text: &str) -> Result<Descriptor, ParseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Xml,
}

impl Format {
    /// Sniff the encoding from the first meaningful token.
    pub fn detect(text: &str) -> Result<Self, ParseError> {
        let t = strip_preamble(text);
        if t.starts_with("info") {
            Ok(Self::Text)
        } else if t.starts_with('<') {
            Ok(Self::Xml)
        } else {
            Err(ParseError::UnsupportedFormat)
        }
    }

    pub fn parser(self) -> &'static dyn DescriptorParser {
        match self {
            Self::Text => &TextParser,
            Self::Xml => &XmlParser,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Xml => "xml",
        }
    }
}

/// Parse a descriptor in either encoding.
pub fn parse(text: &str) -> Result<Descriptor, ParseError> {
    let format = Format::detect(text)?;
    debug!("Parsing {} bytes of {}-encoded descriptor", text.len(), format.as_str());
    format.parser().parse(text)
}

/// Drops a UTF-8 BOM and leading whitespace.
#[inline(always)]
pub(crate) fn strip_preamble(text: &str) -> &str {
    text.trim_start_matches('\u{FEFF}').trim_start()
}

/* ======================= SHARED FIELD HELPERS ======================= */

/// Number of line endings in `text`; `\r\n`, `\r` and `\n` each count once.
pub(crate) fn line_breaks(text: &str) -> usize {
    let b = text.as_bytes();
    let mut n = 0;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'\r' => {
                n += 1;
                if b.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => n += 1,
            _ => {}
        }
        i += 1;
    }
    n
}

pub(crate) fn parse_num<T: FromStr>(line: usize, key: &str, value: &str) -> Result<T, ParseError> {
    value.trim().parse::<T>().map_err(|_| ParseError::MalformedAttribute {
        line,
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Code points are unsigned, but some exporters write `-1` for their
/// invalid-glyph slot; negative `i32` values wrap like a C cast.
pub(crate) fn parse_code(line: usize, key: &str, value: &str) -> Result<u32, ParseError> {
    let v = value.trim();
    v.parse::<u32>()
        .or_else(|_| v.parse::<i32>().map(|n| n as u32))
        .map_err(|_| ParseError::MalformedAttribute {
            line,
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// Page-name slots sized by the declared page count.
#[derive(Debug)]
pub(crate) struct PageTable {
    slots: Vec<Option<String>>,
}

impl PageTable {
    pub(crate) fn new(pages: usize) -> Self {
        Self {
            slots: vec![None; pages],
        }
    }

    pub(crate) fn set(&mut self, id: i64, file: String, line: usize) -> Result<(), ParseError> {
        let pages = self.slots.len();
        let slot = usize::try_from(id)
            .ok()
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(ParseError::PageIndexOutOfRange { id, pages, line })?;
        *slot = Some(file);
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<Vec<String>, ParseError> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(id, s)| s.ok_or(ParseError::MissingPage { id }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Format, ParseError, line_breaks, parse};

    const ARIAL_TEXT: &str = include_str!("../../testdata/arial.fnt");
    const ARIAL_XML: &str = include_str!("../../testdata/arial.xml");

    const MIN_TEXT: &str = "info face=\"Arial\" size=24\n\
        common lineHeight=30 base=24 scaleW=256 scaleH=256 pages=1\n\
        page id=0 file=\"a.png\"\n\
        chars count=1\n\
        char id=65 x=0 y=0 width=10 height=12 xoffset=0 yoffset=0 xadvance=11 page=0";

    const MIN_XML: &str = r#"<?xml version="1.0"?>
<font>
  <info face="Arial" size="24"/>
  <common lineHeight="30" base="24" scaleW="256" scaleH="256" pages="1"/>
  <pages>
    <page id="0" file="a.png"/>
  </pages>
  <chars count="1">
    <char id="65" x="0" y="0" width="10" height="12" xoffset="0" yoffset="0" xadvance="11" page="0"/>
  </chars>
</font>"#;

    #[test]
    fn detects_encodings() {
        assert_eq!(Format::detect("info face=x").unwrap(), Format::Text);
        assert_eq!(Format::detect("  \n<font/>").unwrap(), Format::Xml);
        assert_eq!(Format::detect("\u{FEFF}info").unwrap(), Format::Text);
        assert!(matches!(
            Format::detect("common lineHeight=1"),
            Err(ParseError::UnsupportedFormat)
        ));
        assert!(matches!(Format::detect(""), Err(ParseError::UnsupportedFormat)));
    }

    #[test]
    fn minimal_text_descriptor() {
        let d = parse(MIN_TEXT).unwrap();
        assert_eq!(d.font_name, "Arial");
        assert_eq!(d.font_size, 24);
        assert_eq!(d.texture_names, vec!["a.png".to_string()]);
        assert_eq!(d.characters.len(), 1);
        assert_eq!(d.characters[0].code, 65);
        assert_eq!(d.glyph_for(65).unwrap().rect.y, 244);
        assert!(d.kernings.is_empty());
    }

    #[test]
    fn minimal_xml_matches_minimal_text() {
        assert_eq!(parse(MIN_XML).unwrap(), parse(MIN_TEXT).unwrap());
    }

    #[test]
    fn fixture_encodings_are_equivalent() {
        let t = parse(ARIAL_TEXT).unwrap();
        let x = parse(ARIAL_XML).unwrap();
        assert_eq!(t.font_name, x.font_name);
        assert_eq!(t.font_size, x.font_size);
        assert_eq!(t.point_size(), 32);
        assert_eq!((t.line_height, t.line_base), (x.line_height, x.line_base));
        assert_eq!(
            (t.texture_width, t.texture_height),
            (x.texture_width, x.texture_height)
        );
        assert_eq!(t.texture_names, x.texture_names);
        assert_eq!(t.characters.len(), x.characters.len());
        assert_eq!(t.glyphs.len(), x.glyphs.len());
        assert_eq!(t.kernings.len(), x.kernings.len());
        assert_eq!(t, x);
    }

    #[test]
    fn kerning_lookup_prefers_first_entry() {
        let d = parse(ARIAL_TEXT).unwrap();
        assert_eq!(d.kerning(65, 86), Some(-2));
        assert_eq!(d.kerning(86, 65), Some(-2));
        assert_eq!(d.kerning(65, 65), None);
        // The fixture repeats (32, 65) with a later -3.
        assert_eq!(d.kerning(32, 65), Some(-1));
    }

    #[test]
    fn missing_and_empty_kerning_blocks_look_the_same() {
        let empty = format!("{MIN_TEXT}\nkernings count=0\n");
        let a = parse(MIN_TEXT).unwrap();
        let b = parse(&empty).unwrap();
        assert!(a.kernings.is_empty() && b.kernings.is_empty());
        assert_eq!(a.kerning(65, 65), b.kerning(65, 65));
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_size_returns_no_descriptor() {
        let bad = MIN_TEXT.replace("size=24", "size=abc");
        match parse(&bad) {
            Err(ParseError::MalformedAttribute { line, key, value }) => {
                assert_eq!((line, key.as_str(), value.as_str()), (1, "size", "abc"));
            }
            other => panic!("expected MalformedAttribute, got {other:?}"),
        }
    }

    #[test]
    fn line_breaks_treat_crlf_as_one_ending() {
        assert_eq!(line_breaks(""), 0);
        assert_eq!(line_breaks("a\r\nb"), 1);
        assert_eq!(line_breaks("\r\r\n\n"), 3);
        assert_eq!(line_breaks(" \t"), 0);
    }
}
