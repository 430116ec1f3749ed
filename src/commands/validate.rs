use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::commands::read_source;
use crate::designer::emitter::{ValidationIssue, ValidationResult};
use crate::designer::validate_code;

pub fn execute(file: &str) -> Result<()> {
    let code = read_source(Path::new(file))?;
    let result = validate_code(&code);
    report(file, &result);

    if !result.is_valid {
        anyhow::bail!("{} failed validation with {} error(s)", file, result.errors.len());
    }
    println!("{} {}", "   Valid".green().bold(), file);
    Ok(())
}

/// Print validation findings, errors first
pub fn report(file: &str, result: &ValidationResult) {
    for error in &result.errors {
        eprintln!("{} {}", "error:".red().bold(), describe(file, error));
    }
    for warning in &result.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), describe(file, warning));
    }
}

fn describe(file: &str, issue: &ValidationIssue) -> String {
    match issue.line {
        Some(line) => format!("{}:{}: {}", file, line, issue.message),
        None => format!("{}: {}", file, issue.message),
    }
}
