use anyhow::Result;
use colored::Colorize;

use crate::commands::{detect_target, format_tree, print_parse_errors, read_source, target_files};
use crate::config;
use crate::designer::model::ParsedComposeFile;
use crate::designer::parse_file;

pub fn execute(target: &str, config_path: Option<&str>) -> Result<()> {
    let config = config::load_or_default(config_path)?;
    let files = target_files(&detect_target(target), &config)?;

    let mut error_count = 0;
    for path in &files {
        let source = read_source(path)?;
        let parsed = parse_file(&source, &path.display().to_string());
        print_file(&parsed);
        error_count += parsed.errors.len();
    }

    println!(
        "{} {} file(s), {} parse error(s)",
        "   Finished".green().bold(),
        files.len(),
        error_count
    );
    Ok(())
}

fn print_file(parsed: &ParsedComposeFile) {
    println!("{} {}", "   Parsed".green().bold(), parsed.path);
    if let Some(package) = &parsed.package_name {
        println!("package {}", package);
    }
    for import in &parsed.imports {
        println!("import {}", import);
    }

    for function in &parsed.functions {
        let params: Vec<String> = function
            .parameters
            .iter()
            .map(|p| match &p.default_value {
                Some(default) => format!("{}: {} = {}", p.name, p.param_type, default),
                None => format!("{}: {}", p.name, p.param_type),
            })
            .collect();
        println!("\n{} {}({})", "fun".bold(), function.name, params.join(", "));

        if let Some(preview) = &function.preview {
            let args: Vec<String> = preview.arguments.iter().map(|(k, v)| format!("{} = {}", k, v)).collect();
            println!("  @Preview({})", args.join(", "));
        }
        match &function.body {
            Some(body) => print!("{}", format_tree(body, 1)),
            None => println!("  (no UI content)"),
        }
    }

    print_parse_errors(parsed);
}
