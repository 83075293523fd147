use crate::config::SizeCheckConfig;
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OversizedFile {
    pub path: PathBuf,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReadFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of one pass over a source tree.
#[derive(Debug, Clone, Serialize)]
pub struct SizeReport {
    pub root: PathBuf,
    pub max_lines: usize,
    pub files_scanned: usize,
    pub oversized: Vec<OversizedFile>,
    pub failures: Vec<ReadFailure>,
}

impl SizeReport {
    pub fn passed(&self) -> bool {
        self.oversized.is_empty() && self.failures.is_empty()
    }

    /// One diagnostic line per offending file or unreadable path.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .oversized
            .iter()
            .map(|f| {
                format!(
                    "{}: {} lines (limit {})",
                    f.path.display(),
                    f.lines,
                    self.max_lines
                )
            })
            .collect();
        lines.extend(
            self.failures
                .iter()
                .map(|f| format!("{}: unreadable: {}", f.path.display(), f.message)),
        );
        lines
    }
}

/// Lazily walk `root`, yielding files whose extension is listed in `config`.
///
/// Excluded directories are pruned rather than filtered, so their contents
/// are never visited. Walk errors are yielded, not dropped.
pub fn source_files<'a>(
    root: &Path,
    config: &'a SizeCheckConfig,
) -> impl Iterator<Item = walkdir::Result<PathBuf>> + 'a {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !config
                    .exclude_dirs
                    .iter()
                    .any(|d| entry.file_name() == d.as_str())
        })
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                let path = entry.path();
                let wanted = entry.file_type().is_file()
                    && path.extension().is_some_and(|ext| {
                        config.extensions.iter().any(|e| ext == e.as_str())
                    });
                wanted.then(|| Ok(entry.into_path()))
            }
            Err(e) => Some(Err(e)),
        })
}

/// Count lines the way `wc -l` does, plus a final unterminated line.
pub fn count_lines(path: &Path) -> Result<usize> {
    let bytes = std::fs::read(path)?;
    Ok(count_lines_in(&bytes))
}

fn count_lines_in(bytes: &[u8]) -> usize {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    match bytes.last() {
        Some(&b) if b != b'\n' => newlines + 1,
        _ => newlines,
    }
}

/// Check every source file under `root` against `config.max_lines`.
///
/// Per-file failures are collected into the report; only a missing root
/// aborts the check.
pub fn check_file_sizes(root: &Path, config: &SizeCheckConfig) -> Result<SizeReport> {
    info!(root = %root.display(), max_lines = config.max_lines, "size check: starting");

    if !root.exists() {
        return Err(Error::not_found(root));
    }

    let mut report = SizeReport {
        root: root.to_path_buf(),
        max_lines: config.max_lines,
        files_scanned: 0,
        oversized: Vec::new(),
        failures: Vec::new(),
    };

    for item in source_files(root, config) {
        let path = match item {
            Ok(path) => path,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!(path = %path.display(), error = %e, "walk failed");
                report.failures.push(ReadFailure {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };

        report.files_scanned += 1;
        match count_lines(&path) {
            Ok(lines) if lines > config.max_lines => {
                debug!(path = %path.display(), lines, "over limit");
                report.oversized.push(OversizedFile { path, lines });
            }
            Ok(_) => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "read failed");
                report.failures.push(ReadFailure {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        scanned = report.files_scanned,
        oversized = report.oversized.len(),
        failures = report.failures.len(),
        "size check complete"
    );
    Ok(report)
}
