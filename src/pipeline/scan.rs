// scan.rs
// Phase 1: Find the declaration headers the dumper wrote

use crate::error::{Error, Result};
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};

/// Lazily walk `root` for files ending in `.{extension}`, recursing into
/// subdirectories.
///
/// A missing root yields nothing. Paths come out in lexicographic order per
/// directory level, so the sequence is stable for a given tree.
pub fn scan(root: &Path, extension: &str) -> Result<impl Iterator<Item = Result<PathBuf>>> {
    let root_str = root.to_string_lossy();
    let pattern = format!(
        "{}/**/*.{}",
        Pattern::escape(&root_str),
        Pattern::escape(extension)
    );
    log::debug!("Scanning with pattern {}", pattern);

    let paths = glob(&pattern)
        .map_err(|e| Error::Config(format!("bad scan pattern {:?}: {}", pattern, e)))?;

    Ok(paths.filter_map(|entry| match entry {
        Ok(path) if path.is_file() => Some(Ok(path)),
        Ok(_) => None,
        Err(e) => {
            let path = e.path().to_path_buf();
            Some(Err(Error::io(path, std::io::Error::from(e))))
        }
    }))
}
