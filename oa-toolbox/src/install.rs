//! Making the toolbox executables visible on the search path
//!
//! The Fortran build leaves `kraken.exe`, `bellhop.exe` and friends in the
//! toolbox's `bin` directory. Linking them into a directory on `PATH` (for
//! example `~/.local/bin`) lets runs omit the model path.

use crate::error::{Result, ToolboxError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// True for regular files with an execute bit or a `.exe` suffix
fn is_executable(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    if path.extension().is_some_and(|ext| ext == "exe") {
        return true;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Executables in `bin_dir`, sorted by name
pub fn toolbox_executables(bin_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(bin_dir)? {
        let path = entry?.path();
        if is_executable(&path) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Link every executable of `bin_dir` into `target_dir`
///
/// Links that already point at the same executable are left alone; any other
/// existing entry is a [`ToolboxError::LinkConflict`] and nothing is linked.
/// Returns the links created.
#[cfg(unix)]
pub fn link_executables(bin_dir: &Path, target_dir: &Path) -> Result<Vec<PathBuf>> {
    let bin_dir = bin_dir.canonicalize()?;
    let mut pending = Vec::new();
    for exe in toolbox_executables(&bin_dir)? {
        let Some(name) = exe.file_name() else {
            continue;
        };
        let link = target_dir.join(name);
        if fs::symlink_metadata(&link).is_ok() {
            if link.canonicalize().ok().as_deref() == Some(exe.as_path()) {
                log::debug!("{} already linked", link.display());
                continue;
            }
            return Err(ToolboxError::LinkConflict { path: link, target: exe });
        }
        pending.push((exe, link));
    }

    fs::create_dir_all(target_dir)?;
    let mut created = Vec::with_capacity(pending.len());
    for (exe, link) in pending {
        if let Err(err) = std::os::unix::fs::symlink(&exe, &link) {
            for done in &created {
                let _ = fs::remove_file(done);
            }
            return Err(err.into());
        }
        log::info!("linked {} -> {}", link.display(), exe.display());
        created.push(link);
    }
    Ok(created)
}

/// Link every executable of `bin_dir` into `target_dir`
#[cfg(not(unix))]
pub fn link_executables(_bin_dir: &Path, _target_dir: &Path) -> Result<Vec<PathBuf>> {
    Err(ToolboxError::Unsupported(
        "symbolic links to the toolbox require a Unix platform".to_string(),
    ))
}

/// Where a link points, resolved as far as the filesystem allows
///
/// A dangling link still resolves through its parent directory so links to
/// deleted executables can be cleaned up.
fn link_destination(link: &Path, target_dir: &Path) -> Option<PathBuf> {
    let raw = fs::read_link(link).ok()?;
    let raw = if raw.is_relative() {
        target_dir.join(raw)
    } else {
        raw
    };
    if let Ok(resolved) = raw.canonicalize() {
        return Some(resolved);
    }
    match (raw.parent().and_then(|dir| dir.canonicalize().ok()), raw.file_name()) {
        (Some(dir), Some(name)) => Some(dir.join(name)),
        _ => Some(raw),
    }
}

/// Remove the links in `target_dir` that point into `bin_dir`
///
/// Other files and links are never touched. Links left dangling by a removed
/// executable are removed too. Returns the links removed.
pub fn unlink_executables(bin_dir: &Path, target_dir: &Path) -> Result<Vec<PathBuf>> {
    let bin_dir = bin_dir
        .canonicalize()
        .unwrap_or_else(|_| bin_dir.to_path_buf());
    let mut removed = Vec::new();
    for entry in fs::read_dir(target_dir)? {
        let path = entry?.path();
        if !fs::symlink_metadata(&path)?.file_type().is_symlink() {
            continue;
        }
        let Some(destination) = link_destination(&path, target_dir) else {
            continue;
        };
        if destination.starts_with(&bin_dir) {
            fs::remove_file(&path)?;
            log::info!("removed {}", path.display());
            removed.push(path);
        }
    }
    removed.sort();
    Ok(removed)
}

/// Find `<name>.exe` on the search path
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let file = format!("{}.exe", name.to_lowercase());
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(&file))
        .find(|candidate| is_executable(candidate))
}
