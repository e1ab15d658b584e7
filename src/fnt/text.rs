//! Line-oriented `key=value` BMFont encoding.
//!
//! The header (`info`, `common`, `page` x N) is read positionally. The
//! `char` and `kerning` runs after it are consumed until the first line with
//! a different tag; declared counts are never trusted to delimit a run,
//! because exporters miscount when the literal space character is data.

use std::str::FromStr;

use log::{debug, trace, warn};

use super::{
    CharRecord, Descriptor, DescriptorParser, GlyphTableBuilder, Kerning, PageTable, ParseError,
    parse_code, parse_num,
};

/// Parser for the text encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParser;

impl DescriptorParser for TextParser {
    fn parse(&self, text: &str) -> Result<Descriptor, ParseError> {
        parse_text(text)
    }
}

/* ======================= TOKENIZER ======================= */

/// One tokenized line: the record tag followed by its attributes in file order.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub line: usize,
    pub tag: &'a str,
    attrs: Vec<(&'a str, &'a str)>,
}

/// End (exclusive) of a quoted value whose opening quote sits at `open`.
///
/// The closing quote is the first later `"` followed by whitespace or the
/// end of the line, so values may contain spaces and quotes themselves.
fn quoted_end(b: &[u8], open: usize) -> usize {
    let mut j = open + 1;
    while j < b.len() {
        if b[j] == b'"' && b.get(j + 1).is_none_or(|c| c.is_ascii_whitespace()) {
            return j + 1;
        }
        j += 1;
    }
    b.len()
}

/// Split a line into whitespace-separated fragments, keeping quoted values whole.
pub fn split_fragments(s: &str) -> Vec<&str> {
    let b = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < b.len() {
        while i < b.len() && b[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= b.len() {
            break;
        }
        let start = i;
        while i < b.len() && !b[i].is_ascii_whitespace() {
            if b[i] == b'=' && b.get(i + 1) == Some(&b'"') {
                i = quoted_end(b, i + 1);
                break;
            }
            i += 1;
        }
        out.push(&s[start..i]);
    }
    out
}

#[inline(always)]
fn unquote(v: &str) -> &str {
    match v.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').unwrap_or(rest),
        None => v,
    }
}

#[inline(always)]
fn first_token(raw: &str) -> &str {
    raw.split_ascii_whitespace().next().unwrap_or("")
}

impl<'a> Record<'a> {
    pub fn tokenize(line: usize, raw: &'a str) -> Self {
        let mut frags = split_fragments(raw).into_iter();
        let tag = frags.next().unwrap_or("");
        let attrs = frags
            .filter_map(|f| f.split_once('='))
            .map(|(k, v)| (k, unquote(v)))
            .collect();
        Self { line, tag, attrs }
    }

    /// First value for `key`; exact, case-sensitive match.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.attrs.iter().find(|(k, _)| *k == key).map(|&(_, v)| v)
    }

    pub fn attrs(&self) -> &[(&'a str, &'a str)] {
        &self.attrs
    }

    fn require(&self, record: &'static str, key: &'static str) -> Result<&'a str, ParseError> {
        self.get(key).ok_or(ParseError::MissingRequiredField {
            record,
            key,
            line: self.line,
        })
    }

    fn num<T: FromStr>(&self, record: &'static str, key: &'static str) -> Result<T, ParseError> {
        parse_num(self.line, key, self.require(record, key)?)
    }

    fn code(&self, record: &'static str, key: &'static str) -> Result<u32, ParseError> {
        parse_code(self.line, key, self.require(record, key)?)
    }

    fn num_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ParseError> {
        self.get(key)
            .map_or(Ok(default), |v| parse_num(self.line, key, v))
    }
}

/* ======================= PARSER ======================= */

/// Non-blank lines tagged with their 1-based physical line number.
///
/// `\r\n`, a lone `\r` and `\n` are all line endings.
///
/// Blank and whitespace-only lines never reach the record phases, which is
/// what lets the kerning header be found after trailing blank lines.
fn logical_lines(text: &str) -> Vec<(usize, &str)> {
    let mut rest = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut out = Vec::new();
    let mut line = 1;
    loop {
        let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
        let piece = &rest[..end];
        if !piece.trim().is_empty() {
            out.push((line, piece));
        }
        if end == rest.len() {
            break;
        }
        // \r\n, \r and \n all end exactly one line.
        let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + skip..];
        line += 1;
    }
    out
}

fn expect_record<'a>(
    lines: &[(usize, &'a str)],
    i: usize,
    record: &'static str,
) -> Result<Record<'a>, ParseError> {
    let Some(&(n, raw)) = lines.get(i) else {
        let line = lines.last().map_or(1, |&(n, _)| n + 1);
        return Err(ParseError::MissingRecord { record, line });
    };
    let rec = Record::tokenize(n, raw);
    if rec.tag != record {
        return Err(ParseError::MissingRecord { record, line: n });
    }
    Ok(rec)
}

fn read_char(rec: &Record<'_>) -> Result<CharRecord, ParseError> {
    Ok(CharRecord {
        code: rec.code("char", "id")?,
        x: rec.num("char", "x")?,
        y: rec.num("char", "y")?,
        width: rec.num("char", "width")?,
        height: rec.num("char", "height")?,
        x_offset: rec.num("char", "xoffset")?,
        y_offset: rec.num("char", "yoffset")?,
        x_advance: rec.num("char", "xadvance")?,
        page: rec.num_or("page", 0)?,
    })
}

fn read_kerning(rec: &Record<'_>) -> Result<Kerning, ParseError> {
    Ok(Kerning {
        first: rec.code("kerning", "first")?,
        second: rec.code("kerning", "second")?,
        amount: rec.num("kerning", "amount")?,
    })
}

pub fn parse_text(text: &str) -> Result<Descriptor, ParseError> {
    let lines = logical_lines(text);
    let mut i = 0;

    // ---- info / common / pages (fixed positions)
    let info = expect_record(&lines, i, "info")?;
    i += 1;
    let font_name = info.require("info", "face")?.to_string();
    let font_size: i32 = info.num("info", "size")?;

    let common = expect_record(&lines, i, "common")?;
    i += 1;
    let line_height: i32 = common.num("common", "lineHeight")?;
    let line_base: i32 = common.num("common", "base")?;
    let texture_width: i32 = common.num("common", "scaleW")?;
    let texture_height: i32 = common.num("common", "scaleH")?;
    let pages: usize = common.num("common", "pages")?;

    if lines.len() - i < pages {
        let line = lines.last().map_or(1, |&(n, _)| n + 1);
        return Err(ParseError::MissingRecord {
            record: "page",
            line,
        });
    }
    let mut page_table = PageTable::new(pages);
    for _ in 0..pages {
        let rec = expect_record(&lines, i, "page")?;
        i += 1;
        let id: i64 = rec.num("page", "id")?;
        let file = rec.require("page", "file")?;
        trace!("page {id}: '{file}'");
        page_table.set(id, file.to_string(), rec.line)?;
    }
    let texture_names = page_table.finish()?;

    // ---- chars (sentinel-terminated)
    let mut declared_chars = None;
    if let Some(&(n, raw)) = lines.get(i)
        && first_token(raw) == "chars"
    {
        declared_chars = Record::tokenize(n, raw)
            .get("count")
            .and_then(|v| v.trim().parse::<usize>().ok());
        i += 1;
    }

    let remaining = lines.len() - i;
    let mut builder =
        GlyphTableBuilder::with_capacity(texture_height, declared_chars.unwrap_or(0).min(remaining));
    while let Some(&(n, raw)) = lines.get(i) {
        if first_token(raw) != "char" {
            break;
        }
        builder.push(&read_char(&Record::tokenize(n, raw))?);
        i += 1;
    }
    if builder.is_empty() {
        warn!("'{font_name}' has no char records");
    }
    if let Some(declared) = declared_chars
        && declared != builder.len()
    {
        debug!(
            "chars count={declared} disagrees with {} char records; using the records",
            builder.len()
        );
    }

    // ---- kernings (optional, sentinel-terminated)
    let mut kernings = Vec::new();
    if let Some(&(n, raw)) = lines.get(i) {
        let header = Record::tokenize(n, raw);
        if let Some(count) = header.get("count") {
            let count: usize = parse_num(n, "count", count)?;
            i += 1;
            kernings.reserve(count.min(lines.len() - i));
            while let Some(&(n, raw)) = lines.get(i) {
                if first_token(raw) != "kerning" {
                    break;
                }
                kernings.push(read_kerning(&Record::tokenize(n, raw))?);
                i += 1;
            }
            if count != kernings.len() {
                debug!(
                    "kernings count={count} disagrees with {} kerning records",
                    kernings.len()
                );
            }
        }
    }

    if let Some(&(n, raw)) = lines.get(i) {
        warn!(
            "Ignoring {} trailing line(s) starting at line {n} ('{}')",
            lines.len() - i,
            first_token(raw)
        );
    }

    let tables = builder.finish();
    debug!(
        "Parsed '{font_name}': {} chars, {} pages, {} kernings",
        tables.characters.len(),
        texture_names.len(),
        kernings.len()
    );

    Ok(Descriptor {
        texture_width,
        texture_height,
        texture_names,
        font_name,
        font_size,
        line_height,
        line_base,
        characters: tables.characters,
        lookup: tables.lookup,
        glyphs: tables.glyphs,
        kernings,
    })
}
