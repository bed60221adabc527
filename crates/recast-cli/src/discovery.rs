//! Java source discovery
//!
//! Directories are walked recursively and filtered by the include/exclude
//! globs of the configuration, matched against the path relative to the
//! directory given on the command line. Files named explicitly skip the
//! include globs but still honor the excludes.

use anyhow::{Context, bail};
use glob::Pattern;
use recast_core::FilesConfig;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const JAVA_EXTENSION: &str = "java";

/// Compiled include/exclude globs
#[derive(Debug)]
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileFilter {
    pub fn new(files: &FilesConfig) -> anyhow::Result<Self> {
        Ok(Self {
            include: compile(&files.include)?,
            exclude: compile(&files.exclude)?,
        })
    }

    fn is_excluded(&self, relative: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(relative))
    }

    fn is_included(&self, relative: &str) -> bool {
        self.include.is_empty() || self.include.iter().any(|p| p.matches(relative))
    }
}

fn compile(patterns: &[String]) -> anyhow::Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid glob pattern '{p}'")))
        .collect()
}

fn is_java_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == JAVA_EXTENSION)
}

/// Forward-slash relative path, so globs behave the same on every platform
fn relative_str(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// All Java files under `paths`, sorted and without duplicates
pub fn discover_files(paths: &[PathBuf], files: &FilesConfig) -> anyhow::Result<Vec<PathBuf>> {
    let filter = FileFilter::new(files)?;
    let mut found = BTreeSet::new();

    for path in paths {
        if path.is_file() {
            if !is_java_file(path) {
                warn!("Skipping non-Java file: {}", path.display());
            } else if filter.is_excluded(&path.to_string_lossy()) {
                debug!("Excluded by configuration: {}", path.display());
            } else {
                found.insert(path.clone());
            }
        } else if path.is_dir() {
            walk_dir(path, &filter, &mut found);
        } else {
            bail!("Path does not exist: {}", path.display());
        }
    }

    debug!("Discovered {} Java files", found.len());
    Ok(found.into_iter().collect())
}

fn walk_dir(root: &Path, filter: &FileFilter, found: &mut BTreeSet<PathBuf>) {
    let entries = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|entry| {
        // prune excluded directories early
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !filter.is_excluded(&format!("{}/", relative_str(entry.path(), root)))
    });

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read directory entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_java_file(path) {
            continue;
        }
        let relative = relative_str(path, root);
        if filter.is_included(&relative) && !filter.is_excluded(&relative) {
            found.insert(path.to_path_buf());
        }
    }
}
