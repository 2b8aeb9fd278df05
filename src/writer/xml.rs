//! Append-only XML text builder.
//!
//! Owns the output string for one conversion call. Guarantees well-formed
//! nesting, escaped attribute and text content, and an optional byte cap on
//! growth. Elements containing character data are written inline so that
//! no pretty-printing whitespace lands inside text content.

use std::borrow::Cow;

use crate::error::ConvertError;

/// Format a coordinate with fixed precision and trailing zeros trimmed.
///
/// Non-finite values degrade to `0`; negative zero is normalized.
pub(crate) fn format_number(value: f64, precision: u8) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let factor = 10f64.powi(precision as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        return "0".to_string();
    }
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        return format!("{}", rounded as i64);
    }
    let mut s = format!("{:.*}", precision as usize, rounded);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

/// Whether `c` is permitted in an XML 1.0 document at all
fn is_valid_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || ('\u{10000}'..='\u{10FFFF}').contains(&c)
}

/// True when `s` holds characters that cannot appear in XML even escaped
pub(crate) fn contains_invalid_xml(s: &str) -> bool {
    s.chars().any(|c| !is_valid_xml_char(c))
}

/// Strip characters that cannot appear in XML; borrows when already clean
pub(crate) fn strip_invalid_xml(s: &str) -> Cow<'_, str> {
    if contains_invalid_xml(s) {
        Cow::Owned(s.chars().filter(|c| is_valid_xml_char(*c)).collect())
    } else {
        Cow::Borrowed(s)
    }
}

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
}

struct OpenElement {
    name: &'static str,
    /// Start tag not yet closed with `>`
    tag_open: bool,
    /// Children or text were written, so a full end tag is required
    had_content: bool,
    /// Suppress pretty-printing inside this element
    inline: bool,
}

/// The serialization buffer: an append-only UTF-8 text builder
pub(crate) struct XmlWriter {
    out: String,
    pretty: bool,
    precision: u8,
    limit: Option<usize>,
    stack: Vec<OpenElement>,
}

impl XmlWriter {
    pub fn new(pretty: bool, precision: u8, limit: Option<usize>) -> Self {
        Self {
            out: String::new(),
            pretty,
            precision,
            limit,
            stack: Vec::new(),
        }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    fn in_inline_scope(&self) -> bool {
        self.stack.iter().any(|frame| frame.inline)
    }

    fn check_limit(&self) -> Result<(), ConvertError> {
        match self.limit {
            Some(limit) if self.out.len() > limit => Err(ConvertError::OutputLimit { limit }),
            _ => Ok(()),
        }
    }

    /// Close the parent's start tag before writing nested content
    fn seal_parent(&mut self, inline: bool) {
        if let Some(parent) = self.stack.last_mut() {
            parent.had_content = true;
            if parent.tag_open {
                parent.tag_open = false;
                self.out.push('>');
                if self.pretty && !inline {
                    self.out.push('\n');
                }
            }
        }
    }

    pub fn start_element(&mut self, name: &'static str) -> Result<(), ConvertError> {
        self.start_element_impl(name, false)
    }

    /// Open an element whose whole subtree is written on one line, keeping
    /// pretty-print whitespace out of character data
    pub fn start_inline_element(&mut self, name: &'static str) -> Result<(), ConvertError> {
        self.start_element_impl(name, true)
    }

    fn start_element_impl(&mut self, name: &'static str, inline: bool) -> Result<(), ConvertError> {
        let suppress = self.in_inline_scope();
        self.seal_parent(suppress);
        if self.pretty && !suppress {
            let depth = self.stack.len();
            for _ in 0..depth {
                self.out.push_str("  ");
            }
        }
        self.out.push('<');
        self.out.push_str(name);
        self.stack.push(OpenElement {
            name,
            tag_open: true,
            had_content: false,
            inline,
        });
        self.check_limit()
    }

    pub fn attr(&mut self, name: &str, value: &str) -> Result<(), ConvertError> {
        debug_assert!(self.stack.last().is_some_and(|f| f.tag_open));
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        escape_attr(value, &mut self.out);
        self.out.push('"');
        self.check_limit()
    }

    pub fn attr_f64(&mut self, name: &str, value: f64) -> Result<(), ConvertError> {
        let formatted = format_number(value, self.precision);
        self.attr(name, &formatted)
    }

    /// Write escaped character data inside the current element
    pub fn text(&mut self, content: &str) -> Result<(), ConvertError> {
        if let Some(frame) = self.stack.last_mut() {
            frame.had_content = true;
            if frame.tag_open {
                frame.tag_open = false;
                self.out.push('>');
            }
        }
        escape_text(content, &mut self.out);
        self.check_limit()
    }

    pub fn end_element(&mut self) -> Result<(), ConvertError> {
        let frame = self.stack.pop().expect("end_element without start_element");
        let suppress = frame.inline || self.in_inline_scope();
        if frame.tag_open {
            self.out.push_str("/>");
        } else {
            if self.pretty && !suppress && frame.had_content {
                // Children already ended their lines; just indent the close tag
                let depth = self.stack.len();
                for _ in 0..depth {
                    self.out.push_str("  ");
                }
            }
            self.out.push_str("</");
            self.out.push_str(frame.name);
            self.out.push('>');
        }
        if self.pretty && !self.in_inline_scope() {
            self.out.push('\n');
        }
        self.check_limit()
    }

    pub fn finish(mut self) -> String {
        debug_assert!(self.stack.is_empty(), "unclosed elements remain");
        if self.pretty && self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out
    }
}
