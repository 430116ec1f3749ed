/// Code emitter: block tree → Kotlin/Compose source
pub mod imports;
pub mod widgets;

use std::collections::BTreeSet;

use crate::designer::block::{Block, BlockTree};
use crate::designer::lexer::{LineIndex, TokenStream};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub function_name: String,
    pub package: Option<String>,
    pub include_preview: bool,
    /// Spaces per indentation level
    pub indent: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            function_name: "GeneratedScreen".to_string(),
            package: None,
            include_preview: true,
            indent: 4,
        }
    }
}

/// App theme composable used to wrap previews
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub name: String,
    /// Fully qualified import, e.g. `com.example.app.ui.theme.AppTheme`
    pub import: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub code: String,
    pub imports: Vec<String>,
    pub function_name: String,
}

/// Source for a single block, used when splicing into existing files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedBlock {
    pub code: String,
    pub imports: Vec<String>,
}

/// Per-call accumulator threaded through the generators
pub struct EmitContext {
    imports: BTreeSet<String>,
    opt_ins: BTreeSet<String>,
    indent_unit: String,
}

impl EmitContext {
    pub fn new(indent: usize) -> Self {
        EmitContext {
            imports: BTreeSet::new(),
            opt_ins: BTreeSet::new(),
            indent_unit: " ".repeat(indent),
        }
    }

    pub fn import(&mut self, path: &str) {
        self.imports.insert(path.to_string());
    }

    /// Require `@OptIn(<marker>::class)`; `import` is the marker's path
    pub fn opt_in(&mut self, marker: &str, import: &str) {
        self.opt_ins.insert(marker.to_string());
        self.import(import);
    }

    pub fn indent(&self, level: usize) -> String {
        self.indent_unit.repeat(level)
    }

    fn into_imports(self) -> Vec<String> {
        self.imports.into_iter().collect()
    }
}

pub struct CodeEmitter {
    config: GenerationConfig,
}

impl CodeEmitter {
    pub fn new(config: GenerationConfig) -> Self {
        CodeEmitter { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn generate_code(&self, tree: &BlockTree, theme: Option<&ThemeConfig>) -> GeneratedCode {
        let mut ctx = EmitContext::new(self.config.indent);
        let name = &self.config.function_name;
        ctx.import("androidx.compose.runtime.Composable");

        let mut body = String::new();
        for block in &tree.blocks {
            body.push_str(&widgets::emit_block(&mut ctx, block, 1));
        }
        if body.is_empty() {
            body.push_str(&format!("{}// TODO: add components\n", ctx.indent(1)));
        }

        let mut function = String::new();
        if !ctx.opt_ins.is_empty() {
            let markers: Vec<String> = ctx.opt_ins.iter().map(|m| format!("{}::class", m)).collect();
            function.push_str(&format!("@OptIn({})\n", markers.join(", ")));
        }
        function.push_str("@Composable\n");
        function.push_str(&format!("fun {}() {{\n", name));
        function.push_str(&body);
        function.push_str("}\n");

        if self.config.include_preview {
            ctx.import("androidx.compose.ui.tooling.preview.Preview");
            function.push('\n');
            function.push_str("@Preview(showBackground = true)\n");
            function.push_str("@Composable\n");
            function.push_str(&format!("fun {}Preview() {{\n", name));
            match theme {
                Some(theme) => {
                    if let Some(import) = &theme.import {
                        ctx.import(import);
                    }
                    function.push_str(&format!("{}{} {{\n", ctx.indent(1), theme.name));
                    function.push_str(&format!("{}{}()\n", ctx.indent(2), name));
                    function.push_str(&format!("{}}}\n", ctx.indent(1)));
                }
                None => function.push_str(&format!("{}{}()\n", ctx.indent(1), name)),
            }
            function.push_str("}\n");
        }

        for import in imports::scan_imports(&function) {
            ctx.import(&import);
        }

        let imports = ctx.into_imports();
        let mut code = String::new();
        if let Some(package) = &self.config.package {
            code.push_str(&format!("package {}\n\n", package));
        }
        for import in &imports {
            code.push_str(&format!("import {}\n", import));
        }
        code.push('\n');
        code.push_str(&function);

        GeneratedCode {
            code,
            imports,
            function_name: name.clone(),
        }
    }

    /// Source for one block at indentation level 0, with the imports it needs
    pub fn emit_block(&self, block: &Block) -> EmittedBlock {
        let mut ctx = EmitContext::new(self.config.indent);
        let code = widgets::emit_block(&mut ctx, block, 0);
        for import in imports::scan_imports(&code) {
            ctx.import(&import);
        }
        EmittedBlock {
            code,
            imports: ctx.into_imports(),
        }
    }

    /// Opening of a container call without its content, e.g.
    /// `Card(modifier = Modifier.padding(8.dp))`. `None` for a custom block
    /// with no name.
    pub fn call_header(&self, block: &Block) -> Option<EmittedBlock> {
        let mut ctx = EmitContext::new(self.config.indent);
        let code = widgets::emit_header(&mut ctx, block)?;
        for import in imports::scan_imports(&code) {
            ctx.import(&import);
        }
        Some(EmittedBlock {
            code,
            imports: ctx.into_imports(),
        })
    }
}

impl Default for CodeEmitter {
    fn default() -> Self {
        CodeEmitter::new(GenerationConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub message: String,
    pub line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Structural sanity check of generated code. Delimiters inside strings and
/// comments are ignored.
pub fn validate_code(code: &str) -> ValidationResult {
    let stream = TokenStream::new(code);
    let lines = LineIndex::new(code);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (open, close, label) in [('{', '}', "braces"), ('(', ')', "parentheses")] {
        let opens = (0..stream.len()).filter(|&i| stream.is_punct(i, open)).count();
        let closes = (0..stream.len()).filter(|&i| stream.is_punct(i, close)).count();
        if opens != closes {
            let first_unmatched = (0..stream.len())
                .find(|&i| (stream.is_punct(i, open) || stream.is_punct(i, close)) && stream.partner(i).is_none())
                .map(|i| lines.line_col(stream.token(i).start).0);
            errors.push(ValidationIssue {
                message: format!(
                    "Unbalanced {}: {} '{}' vs {} '{}'",
                    label, opens, open, closes, close
                ),
                line: first_unmatched,
            });
        }
    }

    if !code.contains("@Composable") {
        errors.push(ValidationIssue {
            message: "Missing @Composable annotation".to_string(),
            line: None,
        });
    }

    for (number, line) in code.lines().enumerate() {
        if line.contains("TODO") {
            warnings.push(ValidationIssue {
                message: format!("TODO marker left in code: {}", line.trim()),
                line: Some(number + 1),
            });
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designer::block::{BlockType, LayoutSize};
    use crate::designer::model::PropertyValue;

    fn emitter(name: &str) -> CodeEmitter {
        CodeEmitter::new(GenerationConfig {
            function_name: name.to_string(),
            package: Some("com.example.ui".to_string()),
            include_preview: false,
            indent: 4,
        })
    }

    #[test]
    fn test_generate_simple_column() {
        let column = Block::new(BlockType::Column)
            .with_child(Block::new(BlockType::Text).with_property("text", PropertyValue::Str("Hello".to_string())))
            .with_child(Block::new(BlockType::Button).with_property("text", PropertyValue::Str("Go".to_string())));
        let mut column = column;
        column.width = Some(LayoutSize::Fill);

        let generated = emitter("Home").generate_code(&BlockTree::new(vec![column]), None);
        let expected = r#"package com.example.ui

import androidx.compose.foundation.layout.Column
import androidx.compose.foundation.layout.fillMaxWidth
import androidx.compose.material3.Button
import androidx.compose.material3.Text
import androidx.compose.runtime.Composable
import androidx.compose.ui.Modifier

@Composable
fun Home() {
    Column(modifier = Modifier.fillMaxWidth()) {
        Text(text = "Hello")
        Button(onClick = {}) {
            Text(text = "Go")
        }
    }
}
"#;
        assert_eq!(generated.code, expected);
        assert_eq!(generated.function_name, "Home");
        assert!(validate_code(&generated.code).is_valid);
    }

    #[test]
    fn test_imports_sorted_and_deduplicated() {
        let tree = BlockTree::new(vec![
            Block::new(BlockType::Text).with_property("text", PropertyValue::Str("a".to_string())),
            Block::new(BlockType::Text).with_property("text", PropertyValue::Str("b".to_string())),
        ]);
        let generated = emitter("Texts").generate_code(&tree, None);
        let mut sorted = generated.imports.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(generated.imports, sorted);
        assert_eq!(generated.imports.iter().filter(|i| i.ends_with(".Text")).count(), 1);
    }

    #[test]
    fn test_generation_is_independent_per_call() {
        let emitter = emitter("Screen");
        let with_icon = BlockTree::new(vec![Block::new(BlockType::Icon)]);
        let first = emitter.generate_code(&with_icon, None);
        assert!(first.imports.iter().any(|i| i.ends_with("material3.Icon")));

        let second = emitter.generate_code(&BlockTree::default(), None);
        assert!(!second.imports.iter().any(|i| i.ends_with("material3.Icon")));
        assert!(second.code.contains("// TODO: add components"));
    }

    #[test]
    fn test_preview_with_theme() {
        let emitter = CodeEmitter::new(GenerationConfig {
            function_name: "Profile".to_string(),
            ..GenerationConfig::default()
        });
        let theme = ThemeConfig {
            name: "AppTheme".to_string(),
            import: Some("com.example.ui.theme.AppTheme".to_string()),
        };
        let generated = emitter.generate_code(
            &BlockTree::new(vec![Block::new(BlockType::Spacer)]),
            Some(&theme),
        );
        assert!(generated.code.contains("@Preview(showBackground = true)\n@Composable\nfun ProfilePreview() {\n    AppTheme {\n        Profile()\n    }\n}\n"));
        assert!(generated.imports.contains(&"com.example.ui.theme.AppTheme".to_string()));
        assert!(generated.imports.contains(&"androidx.compose.ui.tooling.preview.Preview".to_string()));
        assert!(!generated.code.starts_with("package"));
    }

    #[test]
    fn test_top_app_bar_requires_opt_in() {
        let tree = BlockTree::new(vec![Block::new(BlockType::TopAppBar)
            .with_property("title", PropertyValue::Str("Inbox".to_string()))]);
        let generated = emitter("Inbox").generate_code(&tree, None);
        assert!(generated.code.contains("@OptIn(ExperimentalMaterial3Api::class)\n@Composable\nfun Inbox()"));
        assert!(generated.imports.contains(&"androidx.compose.material3.ExperimentalMaterial3Api".to_string()));
        assert!(generated.code.contains("title = { Text(\"Inbox\") }"));
    }

    #[test]
    fn test_validate_missing_annotation() {
        let result = validate_code("fun Broken() {\n    Text(\"x\")\n}\n");
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.message.contains("@Composable")));
    }

    #[test]
    fn test_validate_balanced_with_todo_is_valid() {
        let result = validate_code("@Composable\nfun Ok() {\n    // TODO: fill in\n    Text(\"x\")\n}\n");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].line, Some(3));
    }

    #[test]
    fn test_validate_unbalanced() {
        let result = validate_code("@Composable\nfun Bad() {\n    Column {\n        Text(\"x\"\n}\n");
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].line, Some(2));
    }

    #[test]
    fn test_validate_ignores_delimiters_in_strings() {
        let result = validate_code("@Composable\nfun Ok() {\n    Text(\"{ (\")\n}\n");
        assert!(result.is_valid);
    }
}
