// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

use super::FileInfo;
use super::matcher::FileMatcher;
use crate::utils::error::RepoChainError;
use ignore::WalkBuilder;
use std::path::Path;
use std::sync::Arc;

/// Default cap on the number of selected files.
pub const DEFAULT_MAX_FILES: usize = 1000;

/// Default per-file size limit (1 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Scan-wide budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    /// Maximum number of included files before the scan is aborted
    pub max_files: usize,
    /// Files larger than this many bytes are excluded
    pub max_file_size: u64,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Normalize path to a forward-slash separated string for glob matching.
fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// Walk `root`, annotate every visited file with a selection decision, and
/// enforce the scan budgets.
///
/// A directory is skipped only when [`FileMatcher::prunes_directory`]
/// guarantees every file below it would be excluded anyway. Files that
/// exceed the size limit are recorded as excluded and do not count toward
/// `max_files`.
pub fn scan_files(
    root: &Path,
    matcher: Arc<FileMatcher>,
    limits: ScanLimits,
) -> Result<Vec<FileInfo>, RepoChainError> {
    let filter_root = root.to_path_buf();
    let filter_matcher = Arc::clone(&matcher);

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return true;
            }
            if entry.file_name() == ".git" {
                return false;
            }
            match relative_to(&filter_root, entry.path()) {
                Some(rel) => !filter_matcher.prunes_directory(&rel),
                None => true,
            }
        })
        .build();

    let mut files = Vec::new();
    let mut included_count = 0usize;

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error walking directory: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let Some(path) = relative_to(root, entry.path()) else {
            continue;
        };

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::warn!("Failed to read metadata for {}: {}", path, e);
                continue;
            }
        };

        let selection = matcher.select(&path);
        let (included, reason) = if selection.included && size > limits.max_file_size {
            (
                false,
                format!(
                    "exceeds size limit ({} > {} bytes)",
                    size, limits.max_file_size
                ),
            )
        } else {
            (selection.included, selection.reason)
        };

        if included {
            included_count += 1;
            if included_count > limits.max_files {
                return Err(RepoChainError::FileLimitExceeded {
                    limit: limits.max_files,
                });
            }
        }

        tracing::trace!("{} -> included={} ({})", path, included, reason);
        files.push(FileInfo {
            path,
            size,
            included,
            reason,
        });
    }

    tracing::info!(
        "Scanned {} files, {} selected",
        files.len(),
        included_count
    );
    Ok(files)
}
