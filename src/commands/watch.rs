use anyhow::Result;
use colored::Colorize;
use notify::{Event, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use crate::commands::{
    detect_target, hash_content, print_file_summary, read_source, source_root, target_files, Target,
};
use crate::config;
use crate::designer::parse_file;
use crate::project::has_extension;

pub fn execute(target: &str, config_path: Option<&str>) -> Result<()> {
    let config = config::load_or_default(config_path)?;
    let target = detect_target(target);
    let extensions = config.project.extensions.clone();

    // Initial parse
    let mut hashes: HashMap<PathBuf, String> = HashMap::new();
    for path in target_files(&target, &config)? {
        if let Err(e) = reparse(&path, &mut hashes) {
            eprintln!("{} {}", "error:".red().bold(), e);
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;

    // Set up file watcher
    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;
    let root = source_root(&target, &config);
    match &target {
        Target::File(_) => watcher.watch(&root, RecursiveMode::NonRecursive)?,
        Target::Directory(_) | Target::Project(_) => watcher.watch(&root, RecursiveMode::Recursive)?,
    }
    println!("{}", "   Watching for changes... (Ctrl-C to exit)".green().bold());

    while running.load(Ordering::SeqCst) {
        let event = match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        if !should_reparse(&event, &extensions) {
            continue;
        }
        for path in event.paths.iter().filter(|p| has_extension(p, &extensions)) {
            if !path.exists() {
                if hashes.remove(path).is_some() {
                    println!("{} {}", "   Removed".yellow().bold(), path.display());
                }
                continue;
            }
            if let Err(e) = reparse(path, &mut hashes) {
                eprintln!("{} {}", "error:".red().bold(), e);
            }
        }
    }

    println!("\n   Exiting watch mode");
    Ok(())
}

/// Parse `path` and print a summary unless its content is unchanged
fn reparse(path: &Path, hashes: &mut HashMap<PathBuf, String>) -> Result<()> {
    let source = read_source(path)?;
    let hash = hash_content(&source);
    if hashes.get(path) == Some(&hash) {
        return Ok(());
    }
    hashes.insert(path.to_path_buf(), hash);

    let parsed = parse_file(&source, &path.display().to_string());
    print_file_summary(&parsed);
    Ok(())
}

fn should_reparse(event: &Event, extensions: &[String]) -> bool {
    use notify::EventKind::*;

    match event.kind {
        Modify(_) | Create(_) | Remove(_) => event.paths.iter().any(|p| has_extension(p, extensions)),
        _ => false,
    }
}
