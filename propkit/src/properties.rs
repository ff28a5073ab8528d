//! Support for the `.properties` key/value format.
//!
//! Parsing follows the Java properties syntax: `#`/`!` comments, `=`, `:`
//! or whitespace separators, and backslash line continuations. Escaped
//! separators (`\:`, `\=`, ...) lose their backslash while parsing; every
//! other escape is kept raw so the coercion engine decides how to decode the
//! value based on the key suffix.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::{
    error::Error,
    escape::{decode_latin1, escape, unescape},
    traits::Parser,
};

/// An ordered set of raw key/value pairs from one property file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesFile {
    pub properties: Vec<Property>,
}

/// A single raw property. `value` still contains its backslash escapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: String,
}

impl Property {
    /// Builds a property from decoded text, escaping it for storage.
    pub fn from_text(key: impl Into<String>, text: &str) -> Self {
        Self {
            key: key.into(),
            value: escape(text),
        }
    }

    /// The value with its escapes decoded.
    pub fn text(&self) -> String {
        unescape(&self.value)
    }
}

impl PropertiesFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.properties.iter()
    }

    /// Returns the raw value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Inserts or replaces a raw value, keeping the original position of an existing key.
    pub fn set(&mut self, key: impl Into<String>, raw_value: impl Into<String>) {
        let key = key.into();
        let raw_value = raw_value.into();
        match self.properties.iter_mut().find(|p| p.key == key) {
            Some(existing) => existing.value = raw_value,
            None => self.properties.push(Property {
                key,
                value: raw_value,
            }),
        }
    }

    fn parse(content: &str) -> Self {
        let mut properties: Vec<Property> = Vec::new();
        let mut positions = HashMap::<String, usize>::new();

        for line in logical_lines(content) {
            let (key, value) = split_key_value(&line);
            match positions.get(&key) {
                Some(&index) => properties[index].value = value,
                None => {
                    positions.insert(key.clone(), properties.len());
                    properties.push(Property { key, value });
                }
            }
        }

        PropertiesFile { properties }
    }
}

impl Parser for PropertiesFile {
    /// Reads all bytes and decodes them as Latin-1 (or per BOM) before parsing.
    fn from_reader<R: Read>(mut reader: R) -> Result<Self, Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::parse(&decode_latin1(&bytes)))
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut content =
            String::from("# Generated by propkit. Non-Latin text is stored as \\uXXXX escapes.\n");
        for property in &self.properties {
            content.push_str(&escape_key(&property.key));
            content.push('=');
            content.push_str(&property.value);
            content.push('\n');
        }
        // Raw values are escaped ASCII, so this is also valid Latin-1.
        writer.write_all(content.as_bytes()).map_err(Error::Io)
    }

    fn from_str(s: &str) -> Result<Self, Error> {
        Ok(Self::parse(s))
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{0c}')
}

/// Joins continuation lines and drops comments and blank lines.
fn logical_lines(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending: Option<String> = None;

    for physical in content.lines() {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        let trimmed = physical.trim_start_matches(is_blank);

        let mut line = match pending.take() {
            Some(mut joined) => {
                joined.push_str(trimmed);
                joined
            }
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed.to_string()
            }
        };

        let trailing_backslashes = line.chars().rev().take_while(|&c| c == '\\').count();
        if trailing_backslashes % 2 == 1 {
            line.pop();
            pending = Some(line);
        } else {
            out.push(line);
        }
    }

    if let Some(line) = pending {
        out.push(line);
    }
    out
}

fn split_key_value(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = unescape_key(&line[..key_end]);
    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, strip_separator_escapes(rest))
}

/// Drops the backslash in front of a separator, comment or blank character
/// (`\=`, `\:`, `\#`, `\!`, `\ `). Every other escape pair is copied
/// through untouched, so `\\:` stays an escaped backslash and a colon.
fn strip_separator_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('=' | ':' | ' ' | '\t' | '#' | '!')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn unescape_key(raw: &str) -> String {
    unescape(&strip_separator_escapes(raw))
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in escape(key).chars() {
        if matches!(c, '=' | ':' | ' ' | '#' | '!') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
