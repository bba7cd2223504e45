//! Turning command-line style inputs into [`UploadedFile`]s.
//!
//! An input is a file path, a directory (walked recursively) or a glob pattern. Directory and
//! glob matches are filtered by extension; an explicitly named file is always taken.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::EngineResult;
use crate::types::UploadedFile;

impl UploadedFile {
    /// Read a file from disk. Its base name becomes the identifying name.
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, content))
    }
}

/// Expand `inputs` into a sorted, de-duplicated list of file paths.
pub fn collect_files<S: AsRef<str>>(inputs: &[S], extensions: &[String]) -> EngineResult<Vec<PathBuf>> {
    let mut out = BTreeSet::new();
    for input in inputs {
        let input = input.as_ref();
        if is_pattern(input) {
            for entry in glob::glob(input)? {
                let path = entry.map_err(std::io::Error::from)?;
                if path.is_file() && has_extension(&path, extensions) {
                    out.insert(path);
                }
            }
            continue;
        }

        let path = Path::new(input);
        if fs::metadata(path)?.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                    out.insert(entry.into_path());
                }
            }
        } else {
            out.insert(path.to_path_buf());
        }
    }
    debug!(files = out.len(), "inputs collected");
    Ok(out.into_iter().collect())
}

/// [`collect_files`] followed by reading every match.
pub fn load_files<S: AsRef<str>>(inputs: &[S], extensions: &[String]) -> EngineResult<Vec<UploadedFile>> {
    collect_files(inputs, extensions)?
        .iter()
        .map(UploadedFile::from_path)
        .collect()
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
