// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::{Path, PathBuf};

use folio_core::error::Result;

const APP_DIR: &str = "folio";

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> Result<PathBuf> {
    let dir = base_dir().join(APP_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Return a subdirectory inside `root` (e.g. "transcripts"), creating it if
/// needed.
pub fn subdir(root: &Path, name: &str) -> Result<PathBuf> {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn base_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME")
        && !xdg.is_empty()
    {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
