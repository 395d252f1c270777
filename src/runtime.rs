//! Runtime helpers shared across binaries.
//!
//! Centralizes executable detection and helper search order so CLIs subscribe
//! to the same behavior instead of re-implementing it.

use std::env;
use std::path::{Path, PathBuf};

/// Returns true when a file exists and has any execute bit set.
pub fn helper_is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(path) {
            return meta.permissions().mode() & 0o111 != 0;
        }
        false
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Look for a helper next to the running executable.
///
/// Cargo drops every workspace binary into the same directory, so the sibling
/// location is the right first stop whether the tools run from target/ or an
/// installed prefix.
pub fn sibling_helper(name: &str) -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let candidate = exe.parent()?.join(name);
    helper_is_executable(&candidate).then_some(candidate)
}

/// Find an executable by name somewhere on PATH.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    for dir in env::split_paths(&paths) {
        let candidate = dir.join(name);
        if helper_is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Resolve a helper binary: sibling of the current executable first, then
/// PATH.
pub fn resolve_helper(name: &str) -> Option<PathBuf> {
    sibling_helper(name).or_else(|| find_on_path(name))
}
