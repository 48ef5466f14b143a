//! Source file enumeration.
//!
//! Static mode returns the configured list as-is. Discover mode treats the
//! configured list as a seed and appends every matching file found under the
//! discovery root that is not already present.

use crate::config::SourcesConfig;
use crate::error::{BuildError, BuildResult};
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Enumerate sources relative to `project_dir`.
///
/// `skip_dirs` are directories the walk must not enter (the temp artifact
/// directory, typically), either project-relative or absolute. Every returned
/// path is valid UTF-8 so it can be passed to the toolchain unchanged.
pub fn enumerate_sources(
    sources: &SourcesConfig,
    project_dir: &Path,
    skip_dirs: &[PathBuf],
) -> BuildResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::with_capacity(sources.files.len());
    for file in &sources.files {
        push_unique(&mut files, utf8_path(normalize(file))?);
    }

    let Some(discover) = &sources.discover else {
        return Ok(files);
    };

    let skip: Vec<PathBuf> = skip_dirs
        .iter()
        .map(|d| relative_to(d, project_dir))
        .collect();
    let walk_root = project_dir.join(&discover.root);
    tracing::debug!("discovering sources under {}", walk_root.display());

    let walker = WalkDir::new(&walk_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !should_skip(entry, project_dir, &skip));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| walk_root.clone());
            BuildError::io(path, e.into())
        })?;
        // `Path::is_file` follows symlinks, `DirEntry::file_type` does not.
        if !has_extension(entry.path(), &discover.extensions) || !entry.path().is_file() {
            continue;
        }
        let relative = utf8_path(relative_to(entry.path(), project_dir))?;
        push_unique(&mut files, relative);
    }

    Ok(files)
}

/// True if `path` ends in one of `extensions` (given without the dot).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| extensions.iter().any(|e| ext == e.as_str()))
        .unwrap_or(false)
}

fn should_skip(entry: &DirEntry, project_dir: &Path, skip: &[PathBuf]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    if entry.file_name().to_string_lossy().starts_with('.') {
        return true;
    }
    let relative = relative_to(entry.path(), project_dir);
    skip.iter().any(|dir| *dir == relative)
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    normalize(path.strip_prefix(base).unwrap_or(path))
}

/// Drop `.` components so `./main.cpp` and `main.cpp` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn utf8_path(path: PathBuf) -> BuildResult<PathBuf> {
    if path.to_str().is_some() {
        Ok(path)
    } else {
        Err(BuildError::NonUtf8Path(path))
    }
}

fn push_unique(files: &mut Vec<PathBuf>, path: PathBuf) {
    if !files.contains(&path) {
        files.push(path);
    }
}
