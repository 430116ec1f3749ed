use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use crate::commands::{read_source, validate};
use crate::config;
use crate::designer::{validate_code, BlockTree, CodeEmitter};

/// Command-line overrides for the `[generation]` config section
#[derive(Debug, Default)]
pub struct GenerateOptions<'a> {
    pub name: Option<&'a str>,
    pub package: Option<&'a str>,
    pub no_preview: bool,
    pub output: Option<&'a str>,
    pub config: Option<&'a str>,
}

pub fn execute(blocks_path: &str, options: &GenerateOptions) -> Result<()> {
    let config = config::load_or_default(options.config)?;
    let mut generation = config.generation_config();
    if let Some(name) = options.name {
        generation.function_name = name.to_string();
    }
    if let Some(package) = options.package {
        generation.package = Some(package.to_string());
    }
    if options.no_preview {
        generation.include_preview = false;
    }

    let text = read_source(Path::new(blocks_path))?;
    let tree = BlockTree::from_toml(&text)
        .map_err(|e| anyhow::anyhow!("failed to parse `{}`: {}", blocks_path, e))?;

    let emitter = CodeEmitter::new(generation);
    let theme = config.theme_config();
    let generated = emitter.generate_code(&tree, theme.as_ref());

    let validation = validate_code(&generated.code);
    validate::report(blocks_path, &validation);
    if !validation.is_valid {
        anyhow::bail!("generated code for {} failed validation", generated.function_name);
    }

    match options.output {
        Some(output) => {
            if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
            }
            fs::write(output, &generated.code).context(format!("Failed to write {}", output))?;
            println!(
                "{} {} ({} imports) -> {}",
                "   Generated".green().bold(),
                generated.function_name,
                generated.imports.len(),
                output
            );
        }
        None => print!("{}", generated.code),
    }
    Ok(())
}
