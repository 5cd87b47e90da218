//! XML parser implementation
//!
//! A small non-validating parser. It checks well-formedness
//! (balanced tags, quoted attributes, unique attribute names, a single root)
//! and skips the XML declaration, doctype, comments, processing instructions
//! and CDATA sections wherever they occur.

use indexmap::IndexMap;

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseErrorKind, ParseResult, Pos, Span};
use crate::xml::model::{Content, Document, Element};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Configuration for the XML parser
///
/// The default imposes no limits. Any well-formed document parses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: usize,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: usize, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
}

/// An element whose closing tag has not been seen yet
struct OpenElement {
    element: Element,
    start: Pos,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom configuration
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> ParseResult<Document> {
        let size = self.cursor.remaining().len();
        if self.config.max_size > 0 && size > self.config.max_size {
            return Err(self.error_here(ParseErrorKind::MaxSizeExceeded {
                max: self.config.max_size,
            }));
        }

        self.cursor.consume_bytes(BOM);
        self.skip_misc(true)?;

        if self.cursor.is_eof() {
            return Err(self.error_here(ParseErrorKind::MissingRoot));
        }
        if self.cursor.current() != Some(b'<') {
            return Err(self.error_here(ParseErrorKind::InvalidToken));
        }

        let root = self.parse_root()?;

        self.skip_misc(false)?;
        if !self.cursor.is_eof() {
            return Err(self.error_here(ParseErrorKind::TrailingContent));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, comments and processing instructions outside the root
    /// element. A doctype is only allowed before it.
    fn skip_misc(&mut self, allow_doctype: bool) -> ParseResult<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if allow_doctype && self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Parse the root element and everything inside it. Open elements live on
    /// an explicit stack, so nesting depth is bounded by memory only.
    fn parse_root(&mut self) -> ParseResult<Element> {
        let mut open: Vec<OpenElement> = Vec::new();

        loop {
            // the cursor is on the '<' of a start tag
            if self.config.max_depth > 0 && open.len() >= self.config.max_depth {
                return Err(self.error_here(ParseErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                }));
            }
            let start = self.cursor.position();
            let (element, self_closing) = self.parse_start_tag()?;
            if !self_closing {
                open.push(OpenElement { element, start });
            } else if let Some(parent) = open.last_mut() {
                parent.element.children.push(Content::Element(element));
            } else {
                return Ok(element);
            }

            while let Some(current) = open.last_mut() {
                if self.cursor.is_eof() {
                    return Err(ParseError::with_message(
                        ParseErrorKind::UnexpectedEof,
                        Span::new(current.start, self.cursor.position()),
                        format!("unterminated element <{}>", current.element.name),
                    ));
                }

                if self.cursor.starts_with(b"</") {
                    self.cursor.advance_by(2);
                    let close_name = self.parse_name()?;
                    if close_name != current.element.name {
                        return Err(self.error_here(ParseErrorKind::MismatchedTag {
                            expected: current.element.name.clone(),
                            found: close_name,
                        }));
                    }
                    self.cursor.skip_whitespace();
                    self.expect_byte(b'>')?;

                    let Some(closed) = open.pop() else { break };
                    match open.last_mut() {
                        Some(parent) => parent.element.children.push(Content::Element(closed.element)),
                        None => return Ok(closed.element),
                    }
                } else if self.cursor.starts_with(b"<!--") {
                    self.skip_comment()?;
                } else if self.cursor.starts_with(b"<![CDATA[") {
                    self.cursor.advance_by(9);
                    self.skip_until(b"]]>")?;
                } else if self.cursor.starts_with(b"<?") {
                    self.skip_processing_instruction()?;
                } else if self.cursor.starts_with(b"<!") {
                    return Err(self.error_here(ParseErrorKind::InvalidToken));
                } else if self.cursor.current() == Some(b'<') {
                    // a child start tag, handled at the top of the outer loop
                    break;
                } else if let Some(text) = self.parse_text()? {
                    current.element.children.push(Content::Text(text));
                }
            }
        }
    }

    /// Parse `<name attr="value" ...>` or `<name ... />`. The flag is true for
    /// a self-closing tag.
    fn parse_start_tag(&mut self) -> ParseResult<(Element, bool)> {
        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        let self_closing = self.cursor.consume(b'/');
        self.expect_byte(b'>')?;

        let element = Element {
            name,
            attributes,
            children: Vec::new(),
        };
        Ok((element, self_closing))
    }

    fn parse_attributes(&mut self) -> ParseResult<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let before = self.cursor.pos();
            self.cursor.skip_whitespace();
            let separated = self.cursor.pos() > before;

            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) if !separated => {
                    return Err(self.error_here(ParseErrorKind::InvalidToken));
                }
                Some(_) => {}
                None => return Err(self.error_here(ParseErrorKind::UnexpectedEof)),
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(self.error_here(ParseErrorKind::DuplicateAttribute { name }));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> ParseResult<String> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(_) => return Err(self.error_here(ParseErrorKind::InvalidToken)),
            None => return Err(self.error_here(ParseErrorKind::UnexpectedEof)),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        let start_pos = self.cursor.position();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_str(raw, start_pos)?;
                return unescape(text, start_pos, true);
            }
            if b == b'<' {
                return Err(self.error_here(ParseErrorKind::InvalidToken));
            }
            self.cursor.advance();
        }

        Err(self.error_here(ParseErrorKind::UnexpectedEof))
    }

    fn parse_text(&mut self) -> ParseResult<Option<String>> {
        let start = self.cursor.pos();
        let start_pos = self.cursor.position();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = bytes_to_str(self.cursor.slice_from(start), start_pos)?;
        let text = unescape(raw, start_pos, false)?;

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn parse_name(&mut self) -> ParseResult<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(b) if is_name_start(b) => self.cursor.advance(),
            Some(_) => return Err(ParseError::at(ParseErrorKind::InvalidToken, start_pos)),
            None => return Err(ParseError::at(ParseErrorKind::UnexpectedEof, start_pos)),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_str(self.cursor.slice_from(start), start_pos).map(str::to_string)
    }

    fn skip_comment(&mut self) -> ParseResult<()> {
        self.cursor.advance_by(4);
        self.skip_until(b"-->")
    }

    fn skip_processing_instruction(&mut self) -> ParseResult<()> {
        self.cursor.advance_by(2);
        self.skip_until(b"?>")
    }

    fn skip_doctype(&mut self) -> ParseResult<()> {
        // the internal subset may itself contain '>' inside brackets
        let mut in_subset = false;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => in_subset = true,
                b']' => in_subset = false,
                b'>' if !in_subset => return Ok(()),
                _ => {}
            }
        }
        Err(self.error_here(ParseErrorKind::UnexpectedEof))
    }

    fn skip_until(&mut self, pattern: &[u8]) -> ParseResult<()> {
        while !self.cursor.is_eof() {
            if self.cursor.consume_bytes(pattern) {
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(self.error_here(ParseErrorKind::UnexpectedEof))
    }

    fn expect_byte(&mut self, expected: u8) -> ParseResult<()> {
        match self.cursor.current() {
            Some(b) if b == expected => {
                self.cursor.advance();
                Ok(())
            }
            Some(_) => Err(self.error_here(ParseErrorKind::InvalidToken)),
            None => Err(self.error_here(ParseErrorKind::UnexpectedEof)),
        }
    }

    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::at(kind, self.cursor.position())
    }
}

fn bytes_to_str(bytes: &[u8], pos: Pos) -> ParseResult<&str> {
    std::str::from_utf8(bytes).map_err(|_| ParseError::at(ParseErrorKind::InvalidUtf8, pos))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

/// Decode entity references and normalize line ends (`\r\n` and a lone `\r`
/// become `\n`). In attribute values every literal tab, newline or carriage
/// return becomes a space. Characters produced by references are kept as is.
fn unescape(raw: &str, start: Pos, attribute: bool) -> ParseResult<String> {
    let needs_work = |b: u8| b == b'&' || b == b'\r' || (attribute && matches!(b, b'\t' | b'\n'));
    if !raw.bytes().any(needs_work) {
        return Ok(raw.to_string());
    }

    let mut result = String::with_capacity(raw.len());
    let mut pos = start;
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        let at = pos;
        step(&mut pos, ch);
        match ch {
            '&' => {
                let mut entity = String::new();
                loop {
                    match chars.next() {
                        Some(';') => {
                            step(&mut pos, ';');
                            break;
                        }
                        Some(c) if c != '&' && !c.is_whitespace() => {
                            step(&mut pos, c);
                            entity.push(c);
                        }
                        _ => return Err(invalid_entity(entity, at)),
                    }
                }
                match decode_entity(&entity) {
                    Some(decoded) => result.push(decoded),
                    None => return Err(invalid_entity(entity, at)),
                }
            }
            '\r' => {
                // the following '\n' stands for the pair
                if chars.peek() != Some(&'\n') {
                    result.push(if attribute { ' ' } else { '\n' });
                }
            }
            '\t' | '\n' if attribute => result.push(' '),
            _ => result.push(ch),
        }
    }

    Ok(result)
}

/// Advance a position over one character, the way the cursor counts
fn step(pos: &mut Pos, ch: char) {
    pos.offset += ch.len_utf8();
    if ch == '\n' {
        pos.line += 1;
        pos.col = 1;
    } else {
        pos.col += 1;
    }
}

fn invalid_entity(entity: String, at: Pos) -> ParseError {
    ParseError::at(ParseErrorKind::InvalidEntity { entity }, at)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => decode_numeric_entity(entity),
    }
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
