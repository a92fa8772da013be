//! Source image discovery.
//!
//! Resolves the top-level input into sweep subjects: a single file is one
//! subject, a directory contributes every direct child with a recognized
//! image extension, and anything else is a fatal configuration error.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Recognized source image extensions. Matched case-sensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "gif", "png", "webp", "tif"];

/// Resolve an input path into the list of sweep subjects.
///
/// Returns absolute paths. Directory children are sorted by file name so a
/// multi-image run is deterministic regardless of directory listing order.
pub fn collect_sources(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        Ok(vec![fs::canonicalize(input)?])
    } else if input.is_dir() {
        let mut sources: Vec<PathBuf> = fs::read_dir(input)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_supported_extension(p))
            .collect();
        sources.sort();
        sources
            .into_iter()
            .map(|p| fs::canonicalize(p).map_err(Error::from))
            .collect()
    } else {
        Err(Error::InvalidSource(input.to_path_buf()))
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}
