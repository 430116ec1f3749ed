/// Parser for Kotlin/Compose source
///
/// Best-effort: the parser never fails. Anything it can't make sense of is
/// skipped and, where useful, recorded as a `ParseError` on the result.

use regex::Regex;
use std::sync::OnceLock;

use crate::designer::lexer::{split_top_level, LineIndex, TokenKind, TokenStream};
use crate::designer::model::{
    classify_value, split_named_argument, ComposableFunction, ComposeNode, ComponentType,
    FunctionParameter, NodeProperty, ParseError, ParsedComposeFile, PreviewMetadata, SourceRange,
};

/// Lowercase composables (and scope functions) that still count as components
const KNOWN_COMPONENTS: &[&str] = &[
    "Column", "Row", "Box", "LazyColumn", "LazyRow", "Card", "Surface", "Scaffold", "Text",
    "Button", "OutlinedButton", "TextButton", "IconButton", "FloatingActionButton", "TextField",
    "OutlinedTextField", "Icon", "Image", "TopAppBar", "BottomAppBar", "NavigationBar",
    "NavigationBarItem", "Switch", "Checkbox", "RadioButton", "Slider", "Spacer", "Divider",
    "HorizontalDivider", "item",
];

/// Uppercase callables that build values rather than emit UI
const NON_COMPONENTS: &[&str] = &[
    "Modifier", "Color", "Offset", "Size", "TextStyle", "RoundedCornerShape", "PaddingValues",
    "Dp", "Arrangement", "Alignment", "Brush", "Rect", "IntOffset", "IntSize", "LaunchedEffect",
    "DisposableEffect", "SideEffect",
];

const DECLARATION_MODIFIERS: &[&str] = &[
    "private", "internal", "public", "protected", "override", "inline", "suspend", "open",
    "actual", "expect", "final",
];

fn package_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)").expect("valid regex"))
}

fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*import\s+([\w.]+(?:\.\*)?)(?:\s+as\s+\w+)?").expect("valid regex")
    })
}

fn lambda_params_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\(?[\w\s,:<>?.()]*?\)?\s*->").expect("valid regex")
    })
}

/// Parse a whole Kotlin file
pub fn parse_file(source: &str, path: &str) -> ParsedComposeFile {
    let mut parser = ComposeParser::new(source);
    let functions = parser.parse_functions();

    ParsedComposeFile {
        path: path.to_string(),
        package_name: package_regex()
            .captures(source)
            .map(|c| c[1].to_string()),
        imports: import_regex()
            .captures_iter(source)
            .map(|c| c[1].to_string())
            .collect(),
        functions,
        errors: parser.errors,
    }
}

/// Parse a single call fragment such as `Button(onClick = {}) { Text("Hi") }`
pub fn parse_component(fragment: &str) -> Option<ComposeNode> {
    let mut parser = ComposeParser::new(fragment);
    let start = parser.stream.next_significant(0, parser.stream.len())?;
    parser
        .parse_component_at(start, parser.stream.len(), "0")
        .map(|(node, _)| node)
}

pub struct ComposeParser<'a> {
    stream: TokenStream<'a>,
    lines: LineIndex<'a>,
    errors: Vec<ParseError>,
}

impl<'a> ComposeParser<'a> {
    pub fn new(source: &'a str) -> Self {
        ComposeParser {
            stream: TokenStream::new(source),
            lines: LineIndex::new(source),
            errors: Vec::new(),
        }
    }

    fn source(&self) -> &'a str {
        self.stream.source()
    }

    fn range(&self, start: usize, end: usize) -> SourceRange {
        let (start_line, start_column) = self.lines.line_col(start);
        let (end_line, end_column) = self.lines.line_col(end);
        SourceRange {
            start,
            end,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    fn error_at(&mut self, offset: usize, message: impl Into<String>) {
        let (line, column) = self.lines.line_col(offset);
        self.errors.push(ParseError {
            message: message.into(),
            line,
            column,
        });
    }

    /// Find every `@Composable fun` declaration
    pub fn parse_functions(&mut self) -> Vec<ComposableFunction> {
        let mut functions = Vec::new();
        let mut i = 0;

        while i < self.stream.len() {
            if !self.stream.is_ident(i, "fun") {
                i += 1;
                continue;
            }

            let annotations = self.collect_annotations(i);
            if !annotations.iter().any(|a| a.name == "Composable") {
                i += 1;
                continue;
            }

            match self.parse_function(i, &annotations) {
                Some((function, next)) => {
                    functions.push(function);
                    i = next.max(i + 1);
                }
                None => i += 1,
            }
        }

        functions
    }

    /// Walk backwards from a `fun` keyword over modifiers and annotations
    fn collect_annotations(&self, fun_idx: usize) -> Vec<Annotation> {
        let mut annotations = Vec::new();
        let mut cursor = fun_idx;

        while let Some(prev) = self.stream.prev_significant(cursor) {
            if self.stream.kind(prev) == Some(TokenKind::Ident)
                && DECLARATION_MODIFIERS.contains(&self.stream.text(prev))
            {
                cursor = prev;
                continue;
            }

            // @Name, @Name(args), @pkg.Name(args)
            let mut args = None;
            let mut name_end = prev;
            if self.stream.is_punct(prev, ')') {
                let Some(open) = self.stream.partner(prev) else { break };
                args = Some((open, prev));
                match self.stream.prev_significant(open) {
                    Some(idx) => name_end = idx,
                    None => break,
                }
            }
            if self.stream.kind(name_end) != Some(TokenKind::Ident) {
                break;
            }
            let mut name_start = name_end;
            while name_start >= 2
                && self.stream.is_punct(name_start - 1, '.')
                && self.stream.kind(name_start - 2) == Some(TokenKind::Ident)
            {
                name_start -= 2;
            }
            if name_start == 0 || !self.stream.is_punct(name_start - 1, '@') {
                break;
            }

            let at = name_start - 1;
            let arguments = args
                .map(|(open, close)| {
                    self.source()[self.stream.token(open).end..self.stream.token(close).start]
                        .to_string()
                })
                .unwrap_or_default();
            annotations.push(Annotation {
                name: self.stream.text(name_end).to_string(),
                arguments,
                start: self.stream.token(at).start,
            });
            cursor = at;
        }

        annotations.reverse();
        annotations
    }

    fn parse_function(
        &mut self,
        fun_idx: usize,
        annotations: &[Annotation],
    ) -> Option<(ComposableFunction, usize)> {
        let len = self.stream.len();
        let fun_offset = self.stream.token(fun_idx).start;

        // Extension receivers (`fun RowScope.Item()`) keep the last identifier
        let mut name_idx = self.stream.next_significant(fun_idx + 1, len)?;
        if self.stream.is_punct(name_idx, '<') {
            while name_idx < len && !self.stream.is_punct(name_idx, '>') {
                name_idx += 1;
            }
            name_idx = self.stream.next_significant(name_idx + 1, len)?;
        }
        let mut open_paren = None;
        let mut idx = name_idx;
        while idx < len {
            if self.stream.is_punct(idx, '(') {
                open_paren = Some(idx);
                break;
            }
            if self.stream.kind(idx) == Some(TokenKind::Ident) {
                name_idx = idx;
            } else if !self.stream.is_punct(idx, '.') && !self.stream.token(idx).is_trivia() {
                break;
            }
            idx += 1;
        }

        if self.stream.kind(name_idx) != Some(TokenKind::Ident) {
            self.error_at(fun_offset, "Expected function name after 'fun'");
            return None;
        }
        let name = self.stream.text(name_idx).to_string();

        let Some(open_paren) = open_paren else {
            self.error_at(fun_offset, format!("Expected parameter list for function '{}'", name));
            return None;
        };
        let Some(close_paren) = self.stream.partner(open_paren) else {
            self.error_at(
                self.stream.token(open_paren).start,
                format!("Unbalanced parentheses in parameters of '{}'", name),
            );
            return None;
        };

        let params_text = &self.source()
            [self.stream.token(open_paren).end..self.stream.token(close_paren).start];
        let parameters = parse_parameters(params_text);

        let start = annotations.first().map(|a| a.start).unwrap_or(fun_offset);
        let preview = annotations
            .iter()
            .find(|a| a.name == "Preview")
            .map(|a| parse_preview(&a.arguments));
        let annotation_names: Vec<String> = annotations.iter().map(|a| a.name.clone()).collect();

        // Skip an optional `: ReturnType`, then expect `{` or `=`
        let mut cursor = close_paren + 1;
        let body_start = loop {
            let Some(next) = self.stream.next_significant(cursor, len) else {
                break None;
            };
            if self.stream.is_punct(next, '{') || self.stream.is_punct(next, '=') {
                break Some(next);
            }
            if self.stream.is_ident(next, "fun") || self.stream.is_punct(next, '}') {
                break None;
            }
            cursor = match self.stream.partner(next) {
                Some(close) if close > next => close + 1,
                _ => next + 1,
            };
        };

        let Some(body_start) = body_start else {
            self.error_at(fun_offset, format!("Missing body for function '{}'", name));
            return None;
        };

        let (body, end_idx) = if self.stream.is_punct(body_start, '=') {
            // Expression body: `= Text("Hi")`
            let expr = self.stream.next_significant(body_start + 1, len);
            match expr.and_then(|e| self.parse_component_at(e, len, "0")) {
                Some((node, end)) => (Some(node), end),
                None => (None, body_start),
            }
        } else {
            match self.stream.partner(body_start) {
                Some(close) => (self.parse_function_body(&name, body_start + 1, close), close),
                None => {
                    self.error_at(
                        self.stream.token(body_start).start,
                        format!("Unbalanced braces in body of '{}'", name),
                    );
                    // No reliable end; keep scanning for later declarations
                    (None, body_start)
                }
            }
        };

        let end = self.stream.token(end_idx).end;
        let function = ComposableFunction {
            name,
            parameters,
            body,
            source_range: self.range(start, end),
            annotations: annotation_names,
            preview,
        };
        Some((function, end_idx + 1))
    }

    fn parse_function_body(&mut self, name: &str, lo: usize, hi: usize) -> Option<ComposeNode> {
        let mut roots = self.parse_block(lo, hi, "");
        if roots.is_empty() {
            return None;
        }
        for extra in roots.iter().skip(1) {
            let offset = extra.source_range.map(|r| r.start).unwrap_or(0);
            self.error_at(
                offset,
                format!(
                    "Ignoring additional top-level {} in '{}'; only the first component is editable",
                    extra.name, name
                ),
            );
        }
        Some(roots.swap_remove(0))
    }

    /// Scan the statements of a block for component calls. `parent_id` is
    /// the id prefix for the children found.
    fn parse_block(&mut self, lo: usize, hi: usize, parent_id: &str) -> Vec<ComposeNode> {
        let mut nodes = Vec::new();
        let mut i = self.skip_lambda_parameters(lo, hi);

        loop {
            let Some(start) = self.stream.next_significant(i, hi) else {
                break;
            };
            if self.stream.is_punct(start, ';') {
                i = start + 1;
                continue;
            }

            let id = child_id(parent_id, nodes.len());
            if let Some((node, end)) = self.parse_component_at(start, hi, &id) {
                nodes.push(node);
                i = end + 1;
            } else {
                i = self.skip_statement(start, hi);
            }
        }

        nodes
    }

    /// `{ item -> ... }` / `{ (a, b) -> ... }`: start after the arrow
    fn skip_lambda_parameters(&self, lo: usize, hi: usize) -> usize {
        if lo >= hi {
            return lo;
        }
        let start = self.stream.token(lo).start;
        let end = self.stream.token(hi - 1).end;
        let body = &self.source()[start..end];
        match lambda_params_regex().find(body) {
            // A lambda parameter clause sits on the opening line
            Some(m) if !body[..m.end()].trim_start().contains('\n') => {
                self.stream.index_from_offset(start + m.end())
            }
            _ => lo,
        }
    }

    /// Advance past one statement: to the next newline or `;` at depth 0
    fn skip_statement(&self, start: usize, hi: usize) -> usize {
        let mut i = start;
        while i < hi {
            let token = self.stream.token(i);
            match token.kind {
                TokenKind::Newline => return i + 1,
                TokenKind::Punct if self.stream.is_punct(i, ';') => return i + 1,
                TokenKind::Punct => match self.stream.partner(i) {
                    Some(close) if close > i => i = close.min(hi - 1) + 1,
                    // An unmatched opener swallows the rest of the block
                    None if matches!(self.stream.text(i), "(" | "{" | "[") => return hi,
                    _ => i += 1,
                },
                _ => i += 1,
            }
        }
        hi
    }

    fn is_component_name(&self, idx: usize) -> bool {
        let name = self.stream.text(idx);
        if NON_COMPONENTS.contains(&name) {
            return false;
        }
        let first_upper = name.chars().next().is_some_and(|c| c.is_uppercase());
        KNOWN_COMPONENTS.contains(&name) || first_upper
    }

    /// Parse a call site `Name(args) { children }` starting at token `idx`.
    /// Returns the node and the index of its last token.
    fn parse_component_at(&mut self, idx: usize, hi: usize, id: &str) -> Option<(ComposeNode, usize)> {
        if self.stream.kind(idx) != Some(TokenKind::Ident) || !self.is_component_name(idx) {
            return None;
        }
        // `foo.Bar()` is a member call, not a component
        if let Some(prev) = self.stream.prev_significant(idx) {
            if self.stream.is_punct(prev, '.') {
                return None;
            }
        }

        let name = self.stream.text(idx).to_string();
        let mut node = ComposeNode::new(id, &name);
        let mut end = idx;

        let next = self.stream.next_on_line(idx + 1, hi)?;
        let mut lambda_open = None;
        if self.stream.is_punct(next, '(') {
            let Some(close) = self.stream.partner(next) else {
                self.error_at(
                    self.stream.token(next).start,
                    format!("Unbalanced parentheses in call to {}", name),
                );
                return None;
            };
            if close >= hi {
                return None;
            }
            node.properties = self.parse_arguments(&node.component_type, next, close);
            end = close;
            if let Some(after) = self.stream.next_on_line(close + 1, hi) {
                if self.stream.is_punct(after, '{') {
                    lambda_open = Some(after);
                }
            }
        } else if self.stream.is_punct(next, '{') {
            lambda_open = Some(next);
        } else {
            return None;
        }

        if let Some(open) = lambda_open {
            match self.stream.partner(open) {
                Some(close) if close < hi => {
                    node.children = self.parse_block(open + 1, close, id);
                    end = close;
                }
                _ => {
                    self.error_at(
                        self.stream.token(open).start,
                        format!("Unbalanced braces in content of {}", name),
                    );
                    if end == idx {
                        return None;
                    }
                }
            }
        }

        node.source_range = Some(self.range(self.stream.token(idx).start, self.stream.token(end).end));
        Some((node, end))
    }

    fn parse_arguments(&self, component: &ComponentType, open: usize, close: usize) -> Vec<NodeProperty> {
        let inner_start = self.stream.token(open).end;
        let inner = &self.source()[inner_start..self.stream.token(close).start];
        let positional_names = component.positional_parameters();
        let mut positional_index = 0;

        split_top_level(inner, ',', false)
            .into_iter()
            .map(|(offset, piece)| {
                let leading = piece.len() - piece.trim_start().len();
                let text = piece.trim();
                let start = inner_start + offset + leading;
                let range = self.range(start, start + text.len());

                match split_named_argument(text) {
                    Some((name, value)) => NodeProperty {
                        name: name.to_string(),
                        value: classify_value(value),
                        source_range: Some(range),
                        positional: false,
                    },
                    None => {
                        let name = positional_names
                            .get(positional_index)
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| format!("arg{}", positional_index));
                        positional_index += 1;
                        NodeProperty {
                            name,
                            value: classify_value(text),
                            source_range: Some(range),
                            positional: true,
                        }
                    }
                }
            })
            .collect()
    }
}

struct Annotation {
    name: String,
    arguments: String,
    start: usize,
}

fn child_id(parent_id: &str, index: usize) -> String {
    if parent_id.is_empty() {
        index.to_string()
    } else {
        format!("{}.{}", parent_id, index)
    }
}

/// `name: Type = default` entries of a parameter list
pub fn parse_parameters(text: &str) -> Vec<FunctionParameter> {
    split_top_level(text, ',', true)
        .into_iter()
        .filter_map(|(_, piece)| {
            let mut piece = piece.trim();
            // Drop parameter annotations and modifiers
            loop {
                if let Some(rest) = piece.strip_prefix('@') {
                    let name_len = rest
                        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                        .unwrap_or(rest.len());
                    let mut after = &rest[name_len..];
                    if after.starts_with('(') {
                        after = after.find(')').map(|i| &after[i + 1..]).unwrap_or("");
                    }
                    piece = after.trim_start();
                } else if let Some(rest) = ["vararg ", "noinline ", "crossinline ", "val ", "var "]
                    .iter()
                    .find_map(|m| piece.strip_prefix(m))
                {
                    piece = rest.trim_start();
                } else {
                    break;
                }
            }

            let colon = piece.find(':')?;
            let name = piece[..colon].trim().to_string();
            let rest = &piece[colon + 1..];
            let (param_type, default_value) = match split_top_level(rest, '=', true).as_slice() {
                [(_, ty), (offset, _), ..] => {
                    let default = rest[*offset..].trim().to_string();
                    (ty.trim().to_string(), Some(default))
                }
                _ => (rest.trim().to_string(), None),
            };

            Some(FunctionParameter {
                name,
                param_type,
                default_value,
            })
        })
        .collect()
}

fn parse_preview(arguments: &str) -> PreviewMetadata {
    PreviewMetadata {
        arguments: split_top_level(arguments, ',', false)
            .into_iter()
            .filter_map(|(_, piece)| {
                split_named_argument(piece.trim()).map(|(n, v)| (n.to_string(), v.to_string()))
            })
            .collect(),
    }
}
