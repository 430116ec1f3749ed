pub mod generate;
pub mod parse;
pub mod sync;
pub mod validate;
pub mod watch;

use anyhow::{Context, Result};
use colored::Colorize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::designer::model::{ComposeNode, ParsedComposeFile};
use crate::project;

/// What a command operates on
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A single Kotlin source file
    File(PathBuf),
    /// A directory searched for source files
    Directory(PathBuf),
    /// The current directory as a project root; `[project].source_dir` applies
    Project(PathBuf),
}

/// Detect whether the target is a single file, a directory or the project
pub fn detect_target(target: &str) -> Target {
    let path = Path::new(target);
    if target == "." {
        Target::Project(path.to_path_buf())
    } else if path.is_dir() {
        Target::Directory(path.to_path_buf())
    } else {
        Target::File(path.to_path_buf())
    }
}

/// Directory to search (or watch) for a target
pub fn source_root(target: &Target, config: &Config) -> PathBuf {
    match target {
        Target::File(path) | Target::Directory(path) => path.clone(),
        Target::Project(root) => root.join(&config.project.source_dir),
    }
}

/// Files a target refers to
pub fn target_files(target: &Target, config: &Config) -> Result<Vec<PathBuf>> {
    let files = match target {
        Target::File(path) => return Ok(vec![path.clone()]),
        Target::Directory(dir) => project::discover_files(dir, &config.project.extensions)?,
        Target::Project(root) => project::discover_project_files(root, &config.project)?,
    };
    if files.is_empty() {
        anyhow::bail!(
            "No .{} files found in {}",
            config.project.extensions.join("/."),
            source_root(target, config).display()
        );
    }
    Ok(files)
}

pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).context(format!("Failed to read {}", path.display()))
}

/// SHA256 of file content, used to skip no-op change events
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One status line per parsed file plus its parse errors
pub fn print_file_summary(parsed: &ParsedComposeFile) {
    let nodes: usize = parsed
        .functions
        .iter()
        .filter_map(|f| f.body.as_ref())
        .map(|body| body.descendants().len())
        .sum();
    println!(
        "{} {} ({} functions, {} nodes)",
        "   Parsed".green().bold(),
        parsed.path,
        parsed.functions.len(),
        nodes
    );
    print_parse_errors(parsed);
}

pub fn print_parse_errors(parsed: &ParsedComposeFile) {
    for error in &parsed.errors {
        eprintln!("{} {}: {}", "warning:".yellow().bold(), parsed.path, error);
    }
}

/// Indented `id Type prop=value` lines for a node subtree
pub fn format_tree(node: &ComposeNode, depth: usize) -> String {
    let mut line = format!("{}{} {}", "  ".repeat(depth), node.id, node.name);
    for property in &node.properties {
        line.push_str(&format!(" {}={}", property.name, property.value));
    }
    line.push('\n');
    for child in &node.children {
        line.push_str(&format_tree(child, depth + 1));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designer::parse_component;

    #[test]
    fn test_hash_content_is_stable() {
        assert_eq!(hash_content("Text(\"a\")"), hash_content("Text(\"a\")"));
        assert_ne!(hash_content("Text(\"a\")"), hash_content("Text(\"b\")"));
        assert_eq!(hash_content("").len(), 64);
    }

    #[test]
    fn test_detect_target() {
        assert_eq!(detect_target("."), Target::Project(PathBuf::from(".")));
        assert_eq!(detect_target("Missing.kt"), Target::File(PathBuf::from("Missing.kt")));
    }

    #[test]
    fn test_project_target_uses_source_dir() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let root = temp_dir.path();
        fs::create_dir_all(root.join("ui"))?;
        fs::write(root.join("ui/Home.kt"), "@Composable\nfun Home() {}\n")?;
        fs::write(root.join("Scratch.kt"), "fun x() {}\n")?;

        let mut config = Config::default();
        config.project.source_dir = "ui".to_string();

        let project = Target::Project(root.to_path_buf());
        assert_eq!(target_files(&project, &config)?, vec![root.join("ui/Home.kt")]);
        assert_eq!(source_root(&project, &config), root.join("ui"));

        let directory = Target::Directory(root.to_path_buf());
        assert_eq!(target_files(&directory, &config)?.len(), 2);

        config.project.source_dir = "missing".to_string();
        assert!(target_files(&project, &config).is_err());
        Ok(())
    }

    #[test]
    fn test_format_tree() {
        let node = parse_component("Row { Text(\"Hi\") }").expect("node");
        assert_eq!(format_tree(&node, 0), "0 Row\n  0.0 Text text=\"Hi\"\n");
    }
}
