//! Cursor-based tokenizers for `class="..."` and `style="..."` text.
//!
//! The `parse_*` functions prime a [`ParserState`] and return the index to resume
//! from; the `*_next` functions advance one entry at a time. Nothing is collected
//! into intermediate token lists: callers read the last key/value out of the state
//! and store it wherever they need it.

use crate::error::{Result, StylingError};

const UPPER_CASE_MASK: u8 = !0x20;

/// Cursor state shared by the class and style tokenizers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParserState {
    text_end: usize,
    key: usize,
    key_end: usize,
    value: usize,
    value_end: usize,
    strict: bool,
}

impl ParserState {
    /// `strict` turns malformed separators and unterminated quotes into errors.
    /// Lenient parsing skips the offending character instead.
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            ..Self::default()
        }
    }

    fn reset(&mut self, text: &str) {
        self.text_end = text.len();
        self.key = 0;
        self.key_end = 0;
        self.value = 0;
        self.value_end = 0;
    }

    /// Key (class name or style property) of the entry parsed last.
    pub fn last_key<'t>(&self, text: &'t str) -> &'t str {
        &text[self.key..self.key_end]
    }

    /// Value of the style declaration parsed last.
    pub fn last_value<'t>(&self, text: &'t str) -> &'t str {
        &text[self.value..self.value_end]
    }
}

/// Start tokenizing a class list. `Some(index)` means a class name is available
/// through [`ParserState::last_key`]; pass `index` to [`parse_class_name_next`].
pub fn parse_class_name(text: &str, state: &mut ParserState) -> Option<usize> {
    state.reset(text);
    let start = consume_whitespace(text.as_bytes(), 0, state.text_end);
    parse_class_name_next(text, state, start)
}

pub fn parse_class_name_next(text: &str, state: &mut ParserState, index: usize) -> Option<usize> {
    let end = state.text_end;
    if index >= end {
        return None;
    }
    let bytes = text.as_bytes();
    state.key = index;
    state.key_end = consume_class_token(bytes, index, end);
    Some(consume_whitespace(bytes, state.key_end, end))
}

/// Start tokenizing a style declaration list such as `color: red; width: 10px`.
pub fn parse_style(text: &str, state: &mut ParserState) -> Result<Option<usize>> {
    state.reset(text);
    let start = consume_whitespace(text.as_bytes(), 0, state.text_end);
    parse_style_next(text, state, start)
}

pub fn parse_style_next(
    text: &str,
    state: &mut ParserState,
    start: usize,
) -> Result<Option<usize>> {
    let end = state.text_end;
    let bytes = text.as_bytes();
    let mut index = consume_whitespace(bytes, start, end);
    state.key = index;
    if index >= end {
        return Ok(None);
    }
    index = consume_style_key(bytes, index, end);
    state.key_end = index;
    index = consume_separator(text, index, end, b':', state.strict)?;
    index = consume_whitespace(bytes, index, end);
    state.value = index;
    index = consume_style_value(text, index, end, state.strict)?;
    state.value_end = index;
    consume_separator(text, index, end, b';', state.strict).map(Some)
}

fn consume_whitespace(bytes: &[u8], mut index: usize, end: usize) -> usize {
    while index < end && bytes[index] <= b' ' {
        index += 1;
    }
    index
}

fn consume_class_token(bytes: &[u8], mut index: usize, end: usize) -> usize {
    while index < end && bytes[index] > b' ' {
        index += 1;
    }
    index
}

/// Property names: `-`, `_`, ASCII letters and digits.
fn consume_style_key(bytes: &[u8], mut index: usize, end: usize) -> usize {
    while index < end {
        let ch = bytes[index];
        let upper = ch & UPPER_CASE_MASK;
        if ch == b'-' || ch == b'_' || (b'A'..=b'Z').contains(&upper) || ch.is_ascii_digit() {
            index += 1;
        } else {
            break;
        }
    }
    index
}

fn consume_separator(
    text: &str,
    index: usize,
    end: usize,
    separator: u8,
    strict: bool,
) -> Result<usize> {
    let index = consume_whitespace(text.as_bytes(), index, end);
    if index >= end {
        return Ok(index);
    }
    if text.as_bytes()[index] == separator {
        return Ok(index + 1);
    }
    if strict {
        return Err(StylingError::MalformedStyle {
            text: text.to_string(),
            expected: char::from(separator),
            index,
        });
    }
    // Skip the whole offending character so the cursor stays on a char boundary.
    let width = text[index..].chars().next().map_or(1, char::len_utf8);
    Ok(index + width)
}

/// Returns the end of the value, excluding trailing whitespace. Quoted text and
/// `url(...)` arguments may contain `;`.
fn consume_style_value(text: &str, start: usize, end: usize, strict: bool) -> Result<usize> {
    let bytes = text.as_bytes();
    let mut ch1: Option<u8> = None;
    let mut ch2: Option<u8> = None;
    let mut ch3: Option<u8> = None;
    let mut i = start;
    let mut last = i;
    while i < end {
        let ch = bytes[i];
        i += 1;
        if ch == b';' {
            return Ok(last);
        } else if ch == b'"' || ch == b'\'' {
            i = consume_quoted_text(text, ch, i, end, strict)?;
            last = i;
        } else if i == start + 4
            && ch3 == Some(b'U')
            && ch2 == Some(b'R')
            && ch1 == Some(b'L')
            && ch == b'('
        {
            i = consume_quoted_text(text, b')', i, end, strict)?;
            last = i;
        } else if ch > b' ' {
            last = i;
        }
        ch3 = ch2;
        ch2 = ch1;
        ch1 = Some(ch & UPPER_CASE_MASK);
    }
    Ok(last)
}

fn consume_quoted_text(
    text: &str,
    quote: u8,
    start: usize,
    end: usize,
    strict: bool,
) -> Result<usize> {
    let bytes = text.as_bytes();
    let mut prev: u8 = 0;
    let mut index = start;
    while index < end {
        let ch = bytes[index];
        index += 1;
        if ch == quote && prev != b'\\' {
            return Ok(index);
        }
        // Two backslashes cancel out: `"\\"` ends the quotation.
        prev = if ch == b'\\' && prev == b'\\' { 0 } else { ch };
    }
    if strict {
        Err(StylingError::UnterminatedQuote {
            text: text.to_string(),
            quote: char::from(quote),
        })
    } else {
        Ok(end)
    }
}

/// Iterator over the class names of a `class` attribute value.
pub struct ClassNames<'a> {
    text: &'a str,
    state: ParserState,
    next: Option<usize>,
}

pub fn class_names(text: &str) -> ClassNames<'_> {
    let mut state = ParserState::new(false);
    let next = parse_class_name(text, &mut state);
    ClassNames { text, state, next }
}

impl<'a> Iterator for ClassNames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let index = self.next?;
        let name = self.state.last_key(self.text);
        self.next = parse_class_name_next(self.text, &mut self.state, index);
        Some(name)
    }
}

/// Iterator over the `(property, value)` declarations of a `style` attribute value.
///
/// A strict iterator yields one error and then stops.
pub struct StyleDeclarations<'a> {
    text: &'a str,
    state: ParserState,
    next: Result<Option<usize>>,
}

pub fn style_declarations(text: &str, strict: bool) -> StyleDeclarations<'_> {
    let mut state = ParserState::new(strict);
    let next = parse_style(text, &mut state);
    StyleDeclarations { text, state, next }
}

impl<'a> Iterator for StyleDeclarations<'a> {
    type Item = Result<(&'a str, &'a str)>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.next, Ok(None)) {
            Err(e) => Some(Err(e)),
            Ok(None) => None,
            Ok(Some(index)) => {
                let entry = (self.state.last_key(self.text), self.state.last_value(self.text));
                self.next = parse_style_next(self.text, &mut self.state, index);
                Some(Ok(entry))
            }
        }
    }
}
