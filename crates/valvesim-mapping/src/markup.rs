//! Minimal tag-markup reader and writer for mapping files.
//!
//! The mapping vocabulary is a small XML subset: a declaration line,
//! elements with double-quoted attributes, self-closing tags, comments
//! (possibly spanning lines) and text content in leaf elements. Nothing in
//! the format needs namespaces, CDATA or processing instructions, so the
//! parser is an explicit hand-written scanner rather than a general XML
//! dependency.
//!
//! The writer renders a canonical form: one node per line, one tab per
//! nesting level, attributes in stored order. Re-emitting a parsed document
//! is therefore byte-stable, which the structured-output idempotence
//! guarantee relies on.

use thiserror::Error;

/// Errors raised while scanning a markup document.
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("line {line}: unexpected end of input")]
    UnexpectedEof { line: usize },

    #[error("line {line}: expected '{expected}'")]
    Expected { line: usize, expected: String },

    #[error("line {line}: mismatched closing tag </{found}>, expected </{expected}>")]
    MismatchedTag {
        line: usize,
        found: String,
        expected: String,
    },

    #[error("line {line}: element <{name}> mixes text and child elements")]
    MixedContent { line: usize, name: String },

    #[error("line {line}: unknown entity reference '&{entity};'")]
    UnknownEntity { line: usize, entity: String },

    #[error("line {line}: stray content outside the root element")]
    TrailingContent { line: usize },
}

/// One node in a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Comment text, stored verbatim (without the `<!--`/`-->` brackets).
    Comment(String),
}

/// An element with ordered attributes and either children or leaf text.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Text content of a leaf element (e.g. `<Uri>…</Uri>`), trimmed.
    pub text: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }
}

/// Parse a document and return its root element.
pub fn parse(input: &str) -> Result<Element, MarkupError> {
    let mut parser = Parser::new(input);
    parser.skip_bom();
    parser.skip_whitespace();
    parser.skip_declaration()?;
    parser.skip_whitespace();
    // Leading comments before the root are tolerated and dropped.
    while parser.peek_is("<!--") {
        parser.read_comment()?;
        parser.skip_whitespace();
    }
    let root = parser.read_element()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(MarkupError::TrailingContent { line: parser.line });
    }
    Ok(root)
}

/// Render a document in canonical form (declaration, tabs, one node per
/// line).
pub fn render(root: &Element) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    render_element(root, 0, &mut out);
    out
}

fn render_element(el: &Element, depth: usize, out: &mut String) {
    let indent = "\t".repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    if let Some(text) = &el.text {
        out.push('>');
        escape_into(text, false, out);
        out.push_str("</");
        out.push_str(&el.name);
        out.push_str(">\n");
    } else if el.children.is_empty() {
        out.push_str(" />\n");
    } else {
        out.push_str(">\n");
        for child in &el.children {
            match child {
                Node::Element(inner) => render_element(inner, depth + 1, out),
                Node::Comment(text) => {
                    out.push_str(&"\t".repeat(depth + 1));
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->\n");
                }
            }
        }
        out.push_str(&indent);
        out.push_str("</");
        out.push_str(&el.name);
        out.push_str(">\n");
    }
}

fn escape_into(text: &str, in_attr: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn peek_is(&self, literal: &str) -> bool {
        literal
            .chars()
            .enumerate()
            .all(|(i, ch)| self.chars.get(self.pos + i) == Some(&ch))
    }

    fn expect(&mut self, literal: &str) -> Result<(), MarkupError> {
        if self.peek_is(literal) {
            for _ in literal.chars() {
                self.bump();
            }
            Ok(())
        } else {
            Err(MarkupError::Expected {
                line: self.line,
                expected: literal.to_string(),
            })
        }
    }

    fn skip_bom(&mut self) {
        if self.peek() == Some('\u{feff}') {
            self.bump();
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.bump();
        }
    }

    fn skip_declaration(&mut self) -> Result<(), MarkupError> {
        if !self.peek_is("<?") {
            return Ok(());
        }
        while !self.peek_is("?>") {
            if self.bump().is_none() {
                return Err(MarkupError::UnexpectedEof { line: self.line });
            }
        }
        self.expect("?>")
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == '.' {
                name.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    fn read_comment(&mut self) -> Result<String, MarkupError> {
        self.expect("<!--")?;
        let mut text = String::new();
        loop {
            if self.peek_is("-->") {
                self.expect("-->")?;
                return Ok(text);
            }
            match self.bump() {
                Some(ch) => text.push(ch),
                None => return Err(MarkupError::UnexpectedEof { line: self.line }),
            }
        }
    }

    fn read_entity(&mut self) -> Result<char, MarkupError> {
        // Caller consumed the '&'.
        let mut entity = String::new();
        loop {
            match self.bump() {
                Some(';') => break,
                Some(ch) if entity.len() < 8 => entity.push(ch),
                _ => {
                    return Err(MarkupError::UnknownEntity {
                        line: self.line,
                        entity,
                    })
                }
            }
        }
        match entity.as_str() {
            "amp" => Ok('&'),
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "quot" => Ok('"'),
            "apos" => Ok('\''),
            _ => Err(MarkupError::UnknownEntity {
                line: self.line,
                entity,
            }),
        }
    }

    fn read_attr_value(&mut self) -> Result<String, MarkupError> {
        self.expect("\"")?;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(value),
                Some('&') => value.push(self.read_entity()?),
                Some(ch) => value.push(ch),
                None => return Err(MarkupError::UnexpectedEof { line: self.line }),
            }
        }
    }

    fn read_element(&mut self) -> Result<Element, MarkupError> {
        self.expect("<")?;
        let name = self.read_name();
        if name.is_empty() {
            return Err(MarkupError::Expected {
                line: self.line,
                expected: "element name".to_string(),
            });
        }
        let mut element = Element::new(name);

        // Attribute list.
        loop {
            self.skip_whitespace();
            if self.peek_is("/>") {
                self.expect("/>")?;
                return Ok(element);
            }
            if self.peek_is(">") {
                self.expect(">")?;
                break;
            }
            let key = self.read_name();
            if key.is_empty() {
                return Err(MarkupError::Expected {
                    line: self.line,
                    expected: "attribute name".to_string(),
                });
            }
            self.skip_whitespace();
            self.expect("=")?;
            self.skip_whitespace();
            let value = self.read_attr_value()?;
            element.attrs.push((key, value));
        }

        // Content: children, comments and/or leaf text.
        let mut text = String::new();
        loop {
            if self.peek_is("</") {
                self.expect("</")?;
                let closing = self.read_name();
                self.skip_whitespace();
                self.expect(">")?;
                if closing != element.name {
                    return Err(MarkupError::MismatchedTag {
                        line: self.line,
                        found: closing,
                        expected: element.name,
                    });
                }
                break;
            }
            if self.peek_is("<!--") {
                let comment = self.read_comment()?;
                element.children.push(Node::Comment(comment));
                continue;
            }
            if self.peek_is("<") {
                let child = self.read_element()?;
                element.children.push(Node::Element(child));
                continue;
            }
            match self.bump() {
                Some('&') => text.push(self.read_entity()?),
                Some(ch) => text.push(ch),
                None => return Err(MarkupError::UnexpectedEof { line: self.line }),
            }
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            if !element.children.is_empty() {
                return Err(MarkupError::MixedContent {
                    line: self.line,
                    name: element.name,
                });
            }
            element.text = Some(trimmed.to_string());
        }
        Ok(element)
    }
}
