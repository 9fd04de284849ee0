// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

use path_clean::clean;

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walk from `path` up to the filesystem root looking for `filename`.
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = path.to_path_buf();

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Explicit file first (absolute, or relative to `cwd`), then a search upward from `cwd`, then
/// the default config dir.
pub fn resolve_config_path(
    find_in_parent: FindInParent,
    cwd: &Path,
    default_config_dir: &Path,
    default_filename: &str,
    explicit_file: Option<&Path>,
) -> PathBuf {
    if let Some(file) = explicit_file {
        if file.is_absolute() {
            return file.to_path_buf();
        }
        return clean(cwd.join(file));
    }

    if let Some(found) = find_in_parent(cwd, default_filename) {
        return found;
    }

    clean(default_config_dir.join(default_filename))
}
