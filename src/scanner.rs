//! Directory scanner: builds the key -> descriptor-path map the
//! registry resolves names against.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Everything a directory walk over the search path turns up: ordinary
/// descriptors, and the uninstalled variants (`foo-uninstalled.pc`) that an
/// in-tree build directory uses to point at its own not-yet-installed
/// build products instead of whatever got installed system-wide.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub found: HashMap<String, PathBuf>,
    pub uninstalled: HashMap<String, PathBuf>,
}

/// Walks every directory in `search_path` (earlier directories win ties,
/// giving "first PKG_CONFIG_PATH entry found wins" semantics) and
/// collects every `*.pc` file's stem as a package key.
///
/// Only the top level of each search directory is scanned - pkg-config
/// registries are flat, one descriptor per package, never nested.
pub fn scan_search_path(search_path: &[PathBuf]) -> ScanResult {
    let mut result = ScanResult::default();
    for dir in search_path {
        scan_dir(dir, &mut result);
    }
    result
}

fn scan_dir(dir: &Path, result: &mut ScanResult) {
    let entries = WalkDir::new(dir).min_depth(1).max_depth(1).into_iter();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pc") {
            continue;
        }
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(k) => k,
            None => continue,
        };

        match stem.strip_suffix("-uninstalled") {
            Some(key) => {
                result
                    .uninstalled
                    .entry(key.to_string())
                    .or_insert_with(|| path.to_path_buf());
            }
            None => {
                result
                    .found
                    .entry(stem.to_string())
                    .or_insert_with(|| path.to_path_buf());
            }
        }
    }
}
