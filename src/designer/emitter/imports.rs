/// Import inference for emitted or spliced Compose code

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::designer::lexer::{tokenize, TokenKind};

/// Identifiers that need an import wherever they appear in code
const SYMBOL_IMPORTS: &[(&str, &str)] = &[
    ("Modifier", "androidx.compose.ui.Modifier"),
    ("Color", "androidx.compose.ui.graphics.Color"),
    ("Arrangement", "androidx.compose.foundation.layout.Arrangement"),
    ("Alignment", "androidx.compose.ui.Alignment"),
    ("FontWeight", "androidx.compose.ui.text.font.FontWeight"),
    ("TextAlign", "androidx.compose.ui.text.style.TextAlign"),
    ("MaterialTheme", "androidx.compose.material3.MaterialTheme"),
    ("RoundedCornerShape", "androidx.compose.foundation.shape.RoundedCornerShape"),
    ("CircleShape", "androidx.compose.foundation.shape.CircleShape"),
    ("painterResource", "androidx.compose.ui.res.painterResource"),
    ("Icons", "androidx.compose.material.icons.Icons"),
];

/// Import path of a `Modifier` extension, if it needs one
pub fn modifier_import(name: &str) -> Option<String> {
    let package = match name {
        "padding" | "fillMaxWidth" | "fillMaxHeight" | "fillMaxSize" | "width" | "height"
        | "size" | "offset" | "wrapContentWidth" | "wrapContentHeight" | "wrapContentSize"
        | "requiredWidth" | "requiredHeight" | "requiredSize" | "aspectRatio" | "defaultMinSize" => {
            "androidx.compose.foundation.layout"
        }
        "background" | "border" | "clickable" | "horizontalScroll" | "verticalScroll" => {
            "androidx.compose.foundation"
        }
        "clip" | "alpha" | "rotate" | "scale" | "shadow" => "androidx.compose.ui.draw",
        _ => return None,
    };
    Some(format!("{}.{}", package, name))
}

fn icon_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bIcons\.(Default|Filled|Outlined|Rounded|Sharp|TwoTone)\.(\w+)").expect("valid regex")
    })
}

fn unit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.(dp|sp)\b").expect("valid regex"))
}

fn member_call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.(\w+)\s*\(").expect("valid regex"))
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z_]\w*\b").expect("valid regex"))
}

/// Code with string literals and comments blanked out
fn code_only(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for token in tokenize(code) {
        match token.kind {
            TokenKind::Str | TokenKind::Char => out.push_str("\"\""),
            TokenKind::LineComment | TokenKind::BlockComment => out.push(' '),
            _ => out.push_str(&code[token.start..token.end]),
        }
    }
    out
}

/// Imports needed by the values and modifier calls used in `code`
/// (components are imported by their generators)
pub fn scan_imports(code: &str) -> BTreeSet<String> {
    let code = code_only(code);
    let mut imports = BTreeSet::new();

    let words: BTreeSet<&str> = word_regex().find_iter(&code).map(|m| m.as_str()).collect();
    for (symbol, import) in SYMBOL_IMPORTS {
        if words.contains(symbol) {
            imports.insert(import.to_string());
        }
    }

    for caps in icon_regex().captures_iter(&code) {
        let style = match &caps[1] {
            "Default" | "Filled" => "filled",
            "Outlined" => "outlined",
            "Rounded" => "rounded",
            "Sharp" => "sharp",
            _ => "twotone",
        };
        imports.insert(format!("androidx.compose.material.icons.{}.{}", style, &caps[2]));
    }

    for caps in unit_regex().captures_iter(&code) {
        imports.insert(format!("androidx.compose.ui.unit.{}", &caps[1]));
    }

    for caps in member_call_regex().captures_iter(&code) {
        if let Some(import) = modifier_import(&caps[1]) {
            imports.insert(import);
        }
    }

    imports
}

/// Does `existing` (an import list) already cover `import`?
pub fn is_imported(existing: &[String], import: &str) -> bool {
    existing.iter().any(|e| {
        e == import
            || e.strip_suffix(".*")
                .is_some_and(|package| import.rsplit_once('.').map(|(p, _)| p) == Some(package))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_imports() {
        let imports = scan_imports(
            "Icon(Icons.Default.Add, contentDescription = null, modifier = Modifier.size(24.dp).clip(CircleShape))",
        );
        let expected = [
            "androidx.compose.foundation.layout.size",
            "androidx.compose.foundation.shape.CircleShape",
            "androidx.compose.material.icons.Icons",
            "androidx.compose.material.icons.filled.Add",
            "androidx.compose.ui.Modifier",
            "androidx.compose.ui.draw.clip",
            "androidx.compose.ui.unit.dp",
        ];
        assert_eq!(imports.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_strings_do_not_trigger_imports() {
        assert!(scan_imports("Text(\"Color.Red at 12.dp\")").is_empty());
    }

    #[test]
    fn test_is_imported_with_wildcard() {
        let existing = vec!["androidx.compose.material3.*".to_string()];
        assert!(is_imported(&existing, "androidx.compose.material3.Text"));
        assert!(!is_imported(&existing, "androidx.compose.ui.Modifier"));
    }
}
