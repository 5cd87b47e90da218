//! Error types for wmtscaps

use std::fmt;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// Why a document is not well-formed XML
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidToken,
    UnexpectedEof,
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute { name: String },
    InvalidEntity { entity: String },
    InvalidUtf8,
    TrailingContent,
    MissingRoot,
    MaxDepthExceeded { max: usize },
    MaxSizeExceeded { max: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity { entity } => write!(f, "invalid entity reference: &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::TrailingContent => write!(f, "content after the root element"),
            Self::MissingRoot => write!(f, "document has no root element"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
        }
    }
}

/// Malformed XML input
#[derive(Error, Clone, Debug, PartialEq)]
pub struct ParseError {
    kind: ParseErrorKind,
    span: Span,
    message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create error at a specific position
    pub fn at(kind: ParseErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.span.start, self.message)
    }
}

/// What was wrong with a well-formed document's shape
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructureErrorKind {
    /// Required element or attribute is absent
    Missing,
    /// Entry exists but holds no text value
    NotText,
    /// Entry exists but is a text value where an element was required
    NotElement,
    /// A single element was required but the entry repeats
    Ambiguous { count: usize },
    /// The layer list resolved to zero layers
    EmptyLayers,
}

impl fmt::Display for StructureErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::NotText => write!(f, "expected a text value"),
            Self::NotElement => write!(f, "expected an element"),
            Self::Ambiguous { count } => {
                write!(f, "expected a single element, found {count}")
            }
            Self::EmptyLayers => write!(f, "no layers"),
        }
    }
}

/// Well-formed document missing a required path or attribute
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("structure error at {path}: {kind}")]
pub struct StructureError {
    path: String,
    kind: StructureErrorKind,
}

impl StructureError {
    pub fn new(path: impl Into<String>, kind: StructureErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn missing(path: impl Into<String>) -> Self {
        Self::new(path, StructureErrorKind::Missing)
    }

    /// Dotted path of the offending entry, e.g. `Capabilities.Contents.Layer[2].ResourceURL`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> &StructureErrorKind {
        &self.kind
    }
}

/// Main error type for wmtscaps
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Structure(#[from] StructureError),
}

impl Error {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    pub fn is_structure(&self) -> bool {
        matches!(self, Self::Structure(_))
    }
}

/// Result type alias for wmtscaps
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for the XML parser
pub type ParseResult<T> = std::result::Result<T, ParseError>;
