//! XML BMFont encoding.
//!
//! The document is structurally delimited, so every `chars/char` and
//! `kernings/kerning` element is taken as-is; no sentinel scanning needed.

use std::str::FromStr;

use log::{debug, warn};
use roxmltree::{Document, Node};

use super::{
    CharRecord, Descriptor, DescriptorParser, GlyphTableBuilder, Kerning, PageTable, ParseError,
    line_breaks, parse_code, parse_num, strip_preamble,
};

/// Parser for the XML encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlParser;

impl DescriptorParser for XmlParser {
    fn parse(&self, text: &str) -> Result<Descriptor, ParseError> {
        parse_xml(text)
    }
}

/// Physical line of `node`; `skipped` counts lines trimmed before the document.
#[inline(always)]
fn line_of(node: Node<'_, '_>, skipped: usize) -> usize {
    node.document().text_pos_at(node.range().start).row as usize + skipped
}

/// An element read as a descriptor record.
struct Element<'a, 'input> {
    node: Node<'a, 'input>,
    record: &'static str,
    line: usize,
}

impl<'a, 'input> Element<'a, 'input> {
    fn new(node: Node<'a, 'input>, record: &'static str, skipped: usize) -> Self {
        Self {
            node,
            record,
            line: line_of(node, skipped),
        }
    }

    fn require(&self, key: &'static str) -> Result<&'a str, ParseError> {
        self.node
            .attribute(key)
            .ok_or(ParseError::MissingRequiredField {
                record: self.record,
                key,
                line: self.line,
            })
    }

    fn num<T: FromStr>(&self, key: &'static str) -> Result<T, ParseError> {
        parse_num(self.line, key, self.require(key)?)
    }

    fn code(&self, key: &'static str) -> Result<u32, ParseError> {
        parse_code(self.line, key, self.require(key)?)
    }

    fn num_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ParseError> {
        self.node
            .attribute(key)
            .map_or(Ok(default), |v| parse_num(self.line, key, v))
    }
}

fn child<'a, 'input>(
    parent: Node<'a, 'input>,
    record: &'static str,
    skipped: usize,
) -> Result<Element<'a, 'input>, ParseError> {
    parent
        .children()
        .find(|n| n.has_tag_name(record))
        .map(|n| Element::new(n, record, skipped))
        .ok_or(ParseError::MissingRecord {
            record,
            line: line_of(parent, skipped),
        })
}

/// Every `group/item` element under `parent`, in document order.
fn grouped<'a, 'input>(
    parent: Node<'a, 'input>,
    group: &'static str,
    item: &'static str,
    skipped: usize,
) -> Vec<Element<'a, 'input>> {
    parent
        .children()
        .filter(|n| n.has_tag_name(group))
        .flat_map(|g| g.children().filter(move |n| n.has_tag_name(item)))
        .map(|n| Element::new(n, item, skipped))
        .collect()
}

fn read_char(el: &Element<'_, '_>) -> Result<CharRecord, ParseError> {
    Ok(CharRecord {
        code: el.code("id")?,
        x: el.num("x")?,
        y: el.num("y")?,
        width: el.num("width")?,
        height: el.num("height")?,
        x_offset: el.num("xoffset")?,
        y_offset: el.num("yoffset")?,
        x_advance: el.num("xadvance")?,
        page: el.num_or("page", 0)?,
    })
}

pub fn parse_xml(text: &str) -> Result<Descriptor, ParseError> {
    let body = strip_preamble(text);
    let skipped = line_breaks(&text[..text.len() - body.len()]);
    let doc = Document::parse(body)?;
    let root = doc.root_element();

    let info = child(root, "info", skipped)?;
    let font_name = info.require("face")?.to_string();
    let font_size: i32 = info.num("size")?;

    let common = child(root, "common", skipped)?;
    let line_height: i32 = common.num("lineHeight")?;
    let line_base: i32 = common.num("base")?;
    let texture_width: i32 = common.num("scaleW")?;
    let texture_height: i32 = common.num("scaleH")?;
    let pages: usize = common.num("pages")?;

    let page_elems = grouped(root, "pages", "page", skipped);
    if page_elems.len() < pages {
        return Err(ParseError::MissingPage {
            id: page_elems.len(),
        });
    }
    let mut page_table = PageTable::new(pages);
    for el in &page_elems {
        let id: i64 = el.num("id")?;
        let file = el.require("file")?;
        page_table.set(id, file.to_string(), el.line)?;
    }
    let texture_names = page_table.finish()?;

    let char_elems = grouped(root, "chars", "char", skipped);
    let mut builder = GlyphTableBuilder::with_capacity(texture_height, char_elems.len());
    for el in &char_elems {
        builder.push(&read_char(el)?);
    }
    if builder.is_empty() {
        warn!("'{font_name}' has no char elements");
    }

    let kernings = grouped(root, "kernings", "kerning", skipped)
        .iter()
        .map(|el| -> Result<Kerning, ParseError> {
            Ok(Kerning {
                first: el.code("first")?,
                second: el.code("second")?,
                amount: el.num("amount")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let tables = builder.finish();
    debug!(
        "Parsed '{font_name}' (xml): {} chars, {} pages, {} kernings",
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

#[cfg(test)]
mod tests {
    use super::parse_xml;
    use crate::fnt::ParseError;

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<font>
  <info face="X" size="12" bold="0"/>
  <common lineHeight="14" base="11" scaleW="64" scaleH="32" pages="1"/>
  <pages><page id="0" file="x.png"/></pages>
{body}
</font>"#
        )
    }

    #[test]
    fn page_attribute_defaults_to_zero() {
        let d = parse_xml(&doc(
            r#"<chars><char id="65" x="1" y="2" width="3" height="4" xoffset="0" yoffset="1" xadvance="4"/></chars>"#,
        ))
        .unwrap();
        let g = d.glyph_for(65).unwrap();
        assert_eq!(g.page, 0);
        assert_eq!(g.rect.y, 32 - 2 - 4);
        assert!(d.kernings.is_empty());
    }

    #[test]
    fn root_element_name_is_not_checked() {
        let text = doc("").replace("<font>", "<bmfont>").replace("</font>", "</bmfont>");
        let d = parse_xml(&text).unwrap();
        assert_eq!(d.font_name, "X");
        assert_eq!(d.texture_names, vec!["x.png"]);
    }

    #[test]
    fn every_element_is_taken_even_if_count_disagrees() {
        let d = parse_xml(&doc(
            r#"<chars count="1">
    <char id="32" x="0" y="0" width="0" height="0" xoffset="0" yoffset="0" xadvance="3" page="0"/>
    <char id="65" x="0" y="0" width="5" height="7" xoffset="0" yoffset="1" xadvance="6" page="0"/>
  </chars>
  <kernings count="1">
    <kerning first="65" second="65" amount="-1"/>
    <kerning first="65" second="65" amount="-4"/>
  </kernings>"#,
        ))
        .unwrap();
        assert_eq!(d.characters.len(), 2);
        assert_eq!(d.kernings.len(), 2);
        assert_eq!(d.kerning(65, 65), Some(-1));
    }

    #[test]
    fn missing_attribute_reports_element_line() {
        let text = doc(
            r#"<chars>
    <char id="65" x="0" y="0" width="5" height="7" xoffset="0" yoffset="1"/>
  </chars>"#,
        );
        match parse_xml(&text) {
            Err(ParseError::MissingRequiredField { record, key, line }) => {
                assert_eq!((record, key), ("char", "xadvance"));
                assert_eq!(line, 7);
            }
            other => panic!("expected MissingRequiredField, got {other:?}"),
        }
    }

    #[test]
    fn malformed_integer_is_fatal() {
        let text = doc("").replace(r#"size="12""#, r#"size="12px""#);
        assert!(matches!(
            parse_xml(&text),
            Err(ParseError::MalformedAttribute { line: 3, .. })
        ));
    }

    #[test]
    fn leading_whitespace_before_declaration_is_skipped() {
        let d = parse_xml(&format!("\u{FEFF}\r\n\n  {}", doc(""))).unwrap();
        assert_eq!(d.font_name, "X");

        let bad = doc("").replace(r#"size="12""#, r#"size="12px""#);
        assert!(matches!(
            parse_xml(&format!("\n\r\n\t{bad}")),
            Err(ParseError::MalformedAttribute { line: 5, .. })
        ));
    }

    #[test]
    fn pages_index_by_id_not_document_order() {
        let text = doc("")
            .replace(r#"pages="1""#, r#"pages="2""#)
            .replace(
                r#"<page id="0" file="x.png"/>"#,
                r#"<page id="1" file="b.png"/><page id="0" file="a.png"/>"#,
            );
        let d = parse_xml(&text).unwrap();
        assert_eq!(d.texture_names, vec!["a.png", "b.png"]);
        assert_eq!(d.page_count(), 2);
    }

    #[test]
    fn missing_common_element() {
        let text = r#"<font><info face="X" size="1"/></font>"#;
        assert!(matches!(
            parse_xml(text),
            Err(ParseError::MissingRecord {
                record: "common",
                ..
            })
        ));
    }

    #[test]
    fn page_errors() {
        let out_of_range = doc("").replace(r#"id="0""#, r#"id="3""#);
        assert!(matches!(
            parse_xml(&out_of_range),
            Err(ParseError::PageIndexOutOfRange { id: 3, pages: 1, .. })
        ));
        let too_few = doc("").replace(r#"pages="1""#, r#"pages="2""#);
        assert!(matches!(
            parse_xml(&too_few),
            Err(ParseError::MissingPage { id: 1 })
        ));
    }

    #[test]
    fn broken_document_is_a_syntax_error() {
        let err = parse_xml("<font><info face=\"X\" size=\"1\"></font>").unwrap_err();
        assert!(matches!(err, ParseError::XmlSyntax(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
