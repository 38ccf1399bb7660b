// parse.rs
// Phase 2: Pull `constexpr std::ptrdiff_t` offsets out of dumped headers

use crate::error::{Error, Result};
use crate::table::OffsetTable;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref NAMESPACE_OPEN: Regex = Regex::new(r"namespace\s+(\w+)\s*\{").unwrap();
    static ref OFFSET_DECL: Regex =
        Regex::new(r"constexpr\s+std::ptrdiff_t\s+(\w+)\s*=\s*(0x[0-9a-fA-F]+);").unwrap();
}

/// Where the line walker currently is.
///
/// There is no close-brace tracking: once a namespace opens, every later
/// declaration belongs to it until the next `namespace X {` line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Outside,
    InNamespace(String),
}

/// One `namespace.symbol = value` found on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub namespace: String,
    pub symbol: String,
    pub value: String,
}

/// Advance the walker by one line.
pub fn step(state: ScanState, line: &str) -> (ScanState, Option<Capture>) {
    let state = match NAMESPACE_OPEN.captures(line) {
        Some(caps) => ScanState::InNamespace(caps[1].to_string()),
        None => state,
    };

    let capture = match &state {
        ScanState::Outside => None,
        ScanState::InNamespace(namespace) => OFFSET_DECL.captures(line).map(|caps| Capture {
            namespace: namespace.clone(),
            symbol: caps[1].to_string(),
            value: caps[2].to_string(),
        }),
    };

    (state, capture)
}

/// Parse the text of one header into its own table.
pub fn parse_source(source: &str) -> OffsetTable {
    let mut table = OffsetTable::new();
    let mut state = ScanState::Outside;

    for line in source.lines() {
        let (next, capture) = step(state, line);
        state = next;
        if let Some(Capture {
            namespace,
            symbol,
            value,
        }) = capture
        {
            table.insert(namespace, symbol, value);
        }
    }

    table
}

/// A header that has been read and parsed.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub offsets: OffsetTable,
}

pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let offsets = parse_source(&source);
    log::debug!(
        "Parsed {}: {} namespaces, {} offsets",
        path.display(),
        offsets.namespace_count(),
        offsets.symbol_count()
    );
    Ok(ParsedFile {
        path: path.to_path_buf(),
        offsets,
    })
}
