// Copyright (c) 2025-2026 the repochain contributors
// SPDX-License-Identifier: Apache-2.0

//! Availability check for the external pipeline tools.

use crate::utils::error::RepoChainError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Resolve an executable the way the pipeline will launch it.
///
/// Names containing a path component are checked directly; bare names are
/// searched for in each directory of `search_path`.
pub fn find_executable(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if name.is_empty() {
        return None;
    }

    if candidate.is_absolute() || candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    std::env::split_paths(search_path?).find_map(|dir| {
        let direct = dir.join(name);
        if direct.is_file() {
            return Some(direct);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{name}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

/// Verify that every tool is reachable via `PATH`.
///
/// # Errors
///
/// Returns [`RepoChainError::MissingTools`] listing every tool that was not found.
pub fn check_tools<'a>(tools: impl IntoIterator<Item = &'a str>) -> Result<(), RepoChainError> {
    let search_path = std::env::var_os("PATH");
    let mut missing: Vec<String> = Vec::new();

    for tool in tools {
        match find_executable(tool, search_path.as_deref()) {
            Some(path) => tracing::debug!("Found '{}' at {}", tool, path.display()),
            None => {
                if !missing.iter().any(|m| m == tool) {
                    missing.push(tool.to_string());
                }
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RepoChainError::MissingTools(missing))
    }
}
