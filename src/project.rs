use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProjectSection;

/// Directories never worth descending into
const SKIPPED_DIRS: &[&str] = &["build", ".gradle", ".git", ".idea", "node_modules"];

/// Discover source files under `root` with one of `extensions`, sorted by path
pub fn discover_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        anyhow::bail!("Source directory '{}' not found", root.display());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e.path()))
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && has_extension(path, extensions) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Files for a project section, relative to `base`
pub fn discover_project_files(base: &Path, project: &ProjectSection) -> Result<Vec<PathBuf>> {
    discover_files(&base.join(&project.source_dir), &project.extensions)
}

pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map_or(false, |ext| extensions.iter().any(|e| e == ext))
}

fn is_skipped_dir(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |name| SKIPPED_DIRS.contains(&name))
}
