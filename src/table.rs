// table.rs
// The offset table: namespace -> symbol -> hex literal, in first-seen order

use crate::error::{Error, Result};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io::{self, Write};
use std::path::Path;

lazy_static! {
    static ref HEX_LITERAL: Regex = Regex::new(r"^0x[0-9a-fA-F]+$").unwrap();
}

/// Symbols of one namespace, symbol name -> offset literal.
pub type Namespace = IndexMap<String, String>;

/// The canonical table built by a run.
///
/// The same type holds the result of parsing a single file and the merged
/// result of a whole scan. Iteration order is insertion order, and
/// overwriting a symbol keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OffsetTable {
    namespaces: IndexMap<String, Namespace>,
}

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `namespace.symbol = value`, replacing any previous value.
    /// Returns the replaced value, if there was one.
    pub fn insert(
        &mut self,
        namespace: impl Into<String>,
        symbol: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.namespaces
            .entry(namespace.into())
            .or_default()
            .insert(symbol.into(), value.into())
    }

    #[cfg(test)]
    pub fn get(&self, namespace: &str, symbol: &str) -> Option<&str> {
        self.namespaces
            .get(namespace)
            .and_then(|symbols| symbols.get(symbol))
            .map(String::as_str)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &Namespace)> {
        self.namespaces.iter().map(|(name, symbols)| (name.as_str(), symbols))
    }

    /// Every `(namespace, symbol, value)` triple, in table order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.namespaces.iter().flat_map(|(ns, symbols)| {
            symbols
                .iter()
                .map(move |(sym, value)| (ns.as_str(), sym.as_str(), value.as_str()))
        })
    }

    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.namespaces.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Drop namespaces that ended up without any symbol.
    pub fn prune_empty(&mut self) {
        self.namespaces.retain(|_, symbols| !symbols.is_empty());
    }

    /// Check the invariants a table read from outside must satisfy.
    pub fn validate(&self) -> Result<()> {
        for (ns, symbols) in &self.namespaces {
            if ns.is_empty() {
                return Err(Error::InvalidTable("empty namespace name".to_string()));
            }
            check_name(ns)?;
            for (sym, value) in symbols {
                check_name(sym)?;
                if !HEX_LITERAL.is_match(value) {
                    return Err(Error::InvalidTable(format!(
                        "{}.{} has non-hex value {:?}",
                        ns, sym, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// Serialize as pretty JSON with four-space indentation and every
    /// non-ASCII character written as a `\uXXXX` escape.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = AsciiFormatter {
            pretty: PrettyFormatter::with_indent(b"    "),
        };
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json().map_err(|e| Error::json(path, e))?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))
    }

    /// Load and validate a table previously written by [`save_to_file`](Self::save_to_file).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let table = Self::from_json(&json).map_err(|e| Error::json(path, e))?;
        table.validate()?;
        Ok(table)
    }
}

/// Names end up inside C++ comments and string literals.
fn check_name(name: &str) -> Result<()> {
    if name.chars().any(char::is_control) {
        return Err(Error::InvalidTable(format!(
            "name {:?} contains control characters",
            name
        )));
    }
    Ok(())
}

/// Pretty formatter that keeps the output pure ASCII.
struct AsciiFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
