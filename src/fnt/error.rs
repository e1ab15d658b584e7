use std::fmt;

/// Everything that can abort a descriptor parse.
///
/// Line numbers are 1-based positions in the input text.
#[derive(Debug)]
pub enum ParseError {
    /// The text starts with neither `info` nor `<`.
    UnsupportedFormat,
    /// A value could not be read as the expected integer type.
    MalformedAttribute {
        line: usize,
        key: String,
        value: String,
    },
    /// A record lacks an attribute it cannot do without.
    MissingRequiredField {
        record: &'static str,
        key: &'static str,
        line: usize,
    },
    /// A fixed header record (`info`, `common`, `page`) is absent or out of place.
    MissingRecord { record: &'static str, line: usize },
    /// A `page` record names an id outside `[0, pages)`.
    PageIndexOutOfRange { id: i64, pages: usize, line: usize },
    /// A declared page slot was never filled by a `page` record.
    MissingPage { id: usize },
    XmlSyntax(roxmltree::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat => {
                write!(f, "unsupported descriptor format (expected 'info' or '<')")
            }
            Self::MalformedAttribute { line, key, value } => {
                write!(f, "line {line}: malformed value '{value}' for '{key}'")
            }
            Self::MissingRequiredField { record, key, line } => {
                write!(f, "line {line}: '{record}' record is missing '{key}'")
            }
            Self::MissingRecord { record, line } => {
                write!(f, "line {line}: expected a '{record}' record")
            }
            Self::PageIndexOutOfRange { id, pages, line } => write!(
                f,
                "line {line}: page id {id} is outside the {pages} declared page(s)"
            ),
            Self::MissingPage { id } => write!(f, "page {id} is declared but never defined"),
            Self::XmlSyntax(e) => write!(f, "malformed XML: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::XmlSyntax(e) => Some(e),
            _ => None,
        }
    }
}

impl From<roxmltree::Error> for ParseError {
    fn from(e: roxmltree::Error) -> Self {
        Self::XmlSyntax(e)
    }
}
