use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::designer::{GenerationConfig, ThemeConfig};

pub const CONFIG_FILE: &str = "compose-sync.toml";

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub theme: Option<ThemeSection>,
    #[serde(default)]
    pub project: ProjectSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationSection {
    pub package: Option<String>,
    #[serde(default = "default_function_name")]
    pub function_name: String,
    #[serde(default = "default_include_preview")]
    pub include_preview: bool,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            package: None,
            function_name: default_function_name(),
            include_preview: default_include_preview(),
            indent: default_indent(),
        }
    }
}

fn default_function_name() -> String {
    "GeneratedScreen".to_string()
}

fn default_include_preview() -> bool {
    true
}

fn default_indent() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeSection {
    pub name: String,
    pub import: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectSection {
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            extensions: default_extensions(),
        }
    }
}

fn default_source_dir() -> String {
    ".".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["kt".to_string()]
}

impl Config {
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            function_name: self.generation.function_name.clone(),
            package: self.generation.package.clone(),
            include_preview: self.generation.include_preview,
            indent: self.generation.indent,
        }
    }

    pub fn theme_config(&self) -> Option<ThemeConfig> {
        self.theme.as_ref().map(|theme| ThemeConfig {
            name: theme.name.clone(),
            import: theme.import.clone(),
        })
    }
}

/// Load and parse a compose-sync.toml file
pub fn load_config(path: &str) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("could not find `{}`", path)
        } else {
            anyhow::anyhow!("failed to read `{}`: {}", path, e)
        }
    })?;

    let config: Config =
        toml::from_str(&content).map_err(|e| anyhow::anyhow!("failed to parse `{}`: {}", path, e))?;

    if config.generation.indent == 0 {
        anyhow::bail!("invalid `{}`: generation.indent must be at least 1", path);
    }
    if let Some(package) = &config.generation.package {
        validate_package_name(package)?;
    }

    Ok(config)
}

/// Load `path` when given, else compose-sync.toml from the current
/// directory if present, else defaults
pub fn load_or_default(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(CONFIG_FILE).exists() => load_config(CONFIG_FILE),
        None => Ok(Config::default()),
    }
}

/// Kotlin package names are dot-separated identifiers
fn validate_package_name(package: &str) -> Result<()> {
    for part in package.split('.') {
        let mut chars = part.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if !valid {
            anyhow::bail!("Invalid package name '{}'. Part '{}' is not an identifier", package, part);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_package_name() {
        assert!(validate_package_name("com.example.app").is_ok());
        assert!(validate_package_name("com.example.my_app2").is_ok());

        assert!(validate_package_name("com..app").is_err());
        assert!(validate_package_name("com.2fast").is_err());
        assert!(validate_package_name("com.my-app").is_err());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").expect("empty config");
        assert_eq!(config.generation.function_name, "GeneratedScreen");
        assert!(config.generation.include_preview);
        assert_eq!(config.generation.indent, 4);
        assert!(config.theme.is_none());
        assert_eq!(config.project.source_dir, ".");
        assert_eq!(config.project.extensions, vec!["kt"]);
    }

    #[test]
    fn test_generation_and_theme_conversion() {
        let config: Config = toml::from_str(
            r#"
[generation]
package = "com.example.ui"
indent = 2

[theme]
name = "AppTheme"
"#,
        )
        .expect("config");
        let generation = config.generation_config();
        assert_eq!(generation.package.as_deref(), Some("com.example.ui"));
        assert_eq!(generation.indent, 2);
        assert_eq!(generation.function_name, "GeneratedScreen");
        let theme = config.theme_config().expect("theme");
        assert_eq!(theme.name, "AppTheme");
        assert_eq!(theme.import, None);
    }
}
