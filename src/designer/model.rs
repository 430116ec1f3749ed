/// Structural model extracted from Compose source

use std::fmt;

use crate::designer::lexer::{split_top_level, TokenKind, TokenStream};

/// `[start, end)` byte offsets into one source snapshot, plus 1-based
/// line/column positions for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SourceRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Column,
    Row,
    Box,
    LazyColumn,
    LazyRow,
    Card,
    Surface,
    Scaffold,
    Text,
    Button,
    OutlinedButton,
    TextButton,
    IconButton,
    FloatingActionButton,
    TextField,
    OutlinedTextField,
    Icon,
    Image,
    TopAppBar,
    BottomAppBar,
    NavigationBar,
    NavigationBarItem,
    Switch,
    Checkbox,
    RadioButton,
    Slider,
    Spacer,
    Divider,
    Custom(String),
}

impl ComponentType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Column" => ComponentType::Column,
            "Row" => ComponentType::Row,
            "Box" => ComponentType::Box,
            "LazyColumn" => ComponentType::LazyColumn,
            "LazyRow" => ComponentType::LazyRow,
            "Card" | "ElevatedCard" | "OutlinedCard" => ComponentType::Card,
            "Surface" => ComponentType::Surface,
            "Scaffold" => ComponentType::Scaffold,
            "Text" => ComponentType::Text,
            "Button" | "ElevatedButton" | "FilledTonalButton" => ComponentType::Button,
            "OutlinedButton" => ComponentType::OutlinedButton,
            "TextButton" => ComponentType::TextButton,
            "IconButton" => ComponentType::IconButton,
            "FloatingActionButton" | "ExtendedFloatingActionButton" => {
                ComponentType::FloatingActionButton
            }
            "TextField" => ComponentType::TextField,
            "OutlinedTextField" => ComponentType::OutlinedTextField,
            "Icon" => ComponentType::Icon,
            "Image" => ComponentType::Image,
            "TopAppBar" | "CenterAlignedTopAppBar" | "MediumTopAppBar" | "LargeTopAppBar" => {
                ComponentType::TopAppBar
            }
            "BottomAppBar" => ComponentType::BottomAppBar,
            "NavigationBar" => ComponentType::NavigationBar,
            "NavigationBarItem" => ComponentType::NavigationBarItem,
            "Switch" => ComponentType::Switch,
            "Checkbox" => ComponentType::Checkbox,
            "RadioButton" => ComponentType::RadioButton,
            "Slider" => ComponentType::Slider,
            "Spacer" => ComponentType::Spacer,
            "Divider" | "HorizontalDivider" | "VerticalDivider" => ComponentType::Divider,
            other => ComponentType::Custom(other.to_string()),
        }
    }

    /// Canonical composable name for this type
    pub fn name(&self) -> &str {
        match self {
            ComponentType::Column => "Column",
            ComponentType::Row => "Row",
            ComponentType::Box => "Box",
            ComponentType::LazyColumn => "LazyColumn",
            ComponentType::LazyRow => "LazyRow",
            ComponentType::Card => "Card",
            ComponentType::Surface => "Surface",
            ComponentType::Scaffold => "Scaffold",
            ComponentType::Text => "Text",
            ComponentType::Button => "Button",
            ComponentType::OutlinedButton => "OutlinedButton",
            ComponentType::TextButton => "TextButton",
            ComponentType::IconButton => "IconButton",
            ComponentType::FloatingActionButton => "FloatingActionButton",
            ComponentType::TextField => "TextField",
            ComponentType::OutlinedTextField => "OutlinedTextField",
            ComponentType::Icon => "Icon",
            ComponentType::Image => "Image",
            ComponentType::TopAppBar => "TopAppBar",
            ComponentType::BottomAppBar => "BottomAppBar",
            ComponentType::NavigationBar => "NavigationBar",
            ComponentType::NavigationBarItem => "NavigationBarItem",
            ComponentType::Switch => "Switch",
            ComponentType::Checkbox => "Checkbox",
            ComponentType::RadioButton => "RadioButton",
            ComponentType::Slider => "Slider",
            ComponentType::Spacer => "Spacer",
            ComponentType::Divider => "HorizontalDivider",
            ComponentType::Custom(name) => name,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ComponentType::Custom(_))
    }

    /// Names given to leading positional arguments, e.g. `Text("Hi")`
    /// binds `"Hi"` to `text`
    pub fn positional_parameters(&self) -> &'static [&'static str] {
        match self {
            ComponentType::Text => &["text"],
            ComponentType::Icon => &["imageVector", "contentDescription"],
            ComponentType::Image => &["painter", "contentDescription"],
            ComponentType::Checkbox => &["checked", "onCheckedChange"],
            ComponentType::Switch => &["checked", "onCheckedChange"],
            ComponentType::RadioButton => &["selected", "onClick"],
            ComponentType::Slider => &["value", "onValueChange"],
            ComponentType::TextField | ComponentType::OutlinedTextField => {
                &["value", "onValueChange"]
            }
            ComponentType::Button
            | ComponentType::OutlinedButton
            | ComponentType::TextButton
            | ComponentType::IconButton
            | ComponentType::FloatingActionButton => &["onClick"],
            _ => &[],
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionUnit {
    Dp,
    Sp,
}

impl DimensionUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            DimensionUnit::Dp => "dp",
            DimensionUnit::Sp => "sp",
        }
    }
}

/// A property value, classified by lightweight lexical rules
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// String literal content, unescaped
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Dimension { value: f64, unit: DimensionUnit },
    /// `Color.Red`, `Color(0xFF6200EE)`
    Color(String),
    /// `Icons.Default.Add`
    Icon(String),
    /// `{ ... }`, kept as opaque source text
    Lambda(String),
    Modifier(ModifierChain),
    /// Anything else, kept verbatim
    Expression(String),
}

impl PropertyValue {
    /// Render the value as Kotlin source
    pub fn to_source(&self) -> String {
        match self {
            PropertyValue::Str(s) => quote_string(s),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Float(f) => format!("{}f", format_number(*f)),
            PropertyValue::Dimension { value, unit } => {
                format!("{}.{}", format_number(*value), unit.suffix())
            }
            PropertyValue::Color(raw)
            | PropertyValue::Icon(raw)
            | PropertyValue::Lambda(raw)
            | PropertyValue::Expression(raw) => raw.clone(),
            PropertyValue::Modifier(chain) => chain.to_source(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_modifier(&self) -> Option<&ModifierChain> {
        match self {
            PropertyValue::Modifier(chain) => Some(chain),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Quote and escape a string for Kotlin source. `$` is left alone so
/// string templates survive an edit.
pub fn quote_string(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 2);
    out.push('"');
    let mut chars = content.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' if chars.peek() == Some(&'$') => out.push('\\'),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn unescape_string(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            // `\$` is kept escaped so it doesn't turn into a template
            Some('$') => out.push_str("\\$"),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Classify a property value from its source text
pub fn classify_value(text: &str) -> PropertyValue {
    let text = text.trim();

    // A single string literal spanning the whole value
    let stream = TokenStream::new(text);
    let significant: Vec<usize> = (0..stream.len())
        .filter(|&i| !stream.token(i).is_trivia())
        .collect();
    if significant.len() == 1 && stream.kind(significant[0]) == Some(TokenKind::Str) {
        if let Some(body) = text.strip_prefix("\"\"\"").and_then(|t| t.strip_suffix("\"\"\"")) {
            return PropertyValue::Str(body.to_string());
        }
        if let Some(body) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            return PropertyValue::Str(unescape_string(body));
        }
    }

    if text.starts_with('{') && text.ends_with('}') && stream.partner(0).map(|close| stream.token(close).end) == Some(text.len()) {
        return PropertyValue::Lambda(text.to_string());
    }

    match text {
        "true" => return PropertyValue::Bool(true),
        "false" => return PropertyValue::Bool(false),
        _ => {}
    }

    if let Some(value) = parse_integer(text) {
        return PropertyValue::Int(value);
    }
    if let Some(value) = parse_float(text) {
        return PropertyValue::Float(value);
    }
    if let Some(dimension) = parse_dimension(text) {
        return dimension;
    }

    if text.starts_with("Color.") || text.starts_with("Color(") {
        return PropertyValue::Color(text.to_string());
    }
    if text.starts_with("Icons.") {
        return PropertyValue::Icon(text.to_string());
    }
    if text.starts_with("Modifier") {
        if let Some(chain) = parse_modifier_chain(text) {
            return PropertyValue::Modifier(chain);
        }
    }

    PropertyValue::Expression(text.to_string())
}

fn parse_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_float(text: &str) -> Option<f64> {
    let body = text
        .strip_suffix('f')
        .or_else(|| text.strip_suffix('F'))
        .unwrap_or(text);
    let digits = body.strip_prefix('-').unwrap_or(body);
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let is_numeric = !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit());
    // A bare integer only counts as a float with an explicit suffix
    if !is_numeric || (fraction.is_empty() && body.len() == text.len()) {
        return None;
    }
    body.parse().ok()
}

fn parse_dimension(text: &str) -> Option<PropertyValue> {
    let (number, unit) = if let Some(n) = text.strip_suffix(".dp") {
        (n, DimensionUnit::Dp)
    } else if let Some(n) = text.strip_suffix(".sp") {
        (n, DimensionUnit::Sp)
    } else {
        return None;
    };
    let number = number.trim_start_matches('(').trim_end_matches(')');
    let digits = number.strip_prefix('-').unwrap_or(number);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    number
        .parse()
        .ok()
        .map(|value| PropertyValue::Dimension { value, unit })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierArgument {
    pub name: Option<String>,
    pub value: String,
}

impl ModifierArgument {
    pub fn positional(value: impl Into<String>) -> Self {
        ModifierArgument { name: None, value: value.into() }
    }

    pub fn named(name: impl Into<String>, value: impl Into<String>) -> Self {
        ModifierArgument {
            name: Some(name.into()),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierCall {
    pub name: String,
    pub arguments: Vec<ModifierArgument>,
}

impl ModifierCall {
    pub fn new(name: impl Into<String>, arguments: Vec<ModifierArgument>) -> Self {
        ModifierCall {
            name: name.into(),
            arguments,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| a.value.as_str())
    }

    pub fn to_source(&self) -> String {
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|arg| match &arg.name {
                Some(name) => format!("{} = {}", name, arg.value),
                None => arg.value.clone(),
            })
            .collect();
        format!("{}({})", self.name, args.join(", "))
    }
}

/// Ordered modifier calls hanging off a receiver, usually `Modifier`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierChain {
    pub receiver: String,
    pub calls: Vec<ModifierCall>,
}

impl Default for ModifierChain {
    fn default() -> Self {
        ModifierChain {
            receiver: "Modifier".to_string(),
            calls: Vec::new(),
        }
    }
}

impl ModifierChain {
    pub fn new(calls: Vec<ModifierCall>) -> Self {
        ModifierChain {
            calls,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn call(&self, name: &str) -> Option<&ModifierCall> {
        self.calls.iter().find(|c| c.name == name)
    }

    pub fn to_source(&self) -> String {
        let mut out = self.receiver.clone();
        for call in &self.calls {
            out.push('.');
            out.push_str(&call.to_source());
        }
        out
    }
}

/// Parse `Modifier.padding(16.dp).fillMaxWidth()` style chains. Returns
/// `None` when the text has anything besides `.name(args)` segments.
pub fn parse_modifier_chain(text: &str) -> Option<ModifierChain> {
    let text = text.trim();
    let stream = TokenStream::new(text);
    let mut i = stream.next_significant(0, stream.len())?;
    if stream.kind(i) != Some(TokenKind::Ident) {
        return None;
    }
    let receiver = stream.text(i).to_string();
    let mut calls = Vec::new();
    i += 1;

    while let Some(dot) = stream.next_significant(i, stream.len()) {
        if !stream.is_punct(dot, '.') {
            return None;
        }
        let name_idx = stream.next_significant(dot + 1, stream.len())?;
        if stream.kind(name_idx) != Some(TokenKind::Ident) {
            return None;
        }
        let name = stream.text(name_idx).to_string();

        // A bare property like `.weight` is not a modifier call
        let open = stream
            .next_significant(name_idx + 1, stream.len())
            .filter(|&open| stream.is_punct(open, '('))?;
        let close = stream.partner(open)?;
        let inner = &text[stream.token(open).end..stream.token(close).start];
        calls.push(ModifierCall {
            name,
            arguments: parse_modifier_arguments(inner),
        });
        i = close + 1;
    }

    Some(ModifierChain { receiver, calls })
}

fn parse_modifier_arguments(inner: &str) -> Vec<ModifierArgument> {
    split_top_level(inner, ',', false)
        .into_iter()
        .map(|(_, piece)| {
            let piece = piece.trim();
            match split_named_argument(piece) {
                Some((name, value)) => ModifierArgument::named(name, value),
                None => ModifierArgument::positional(piece),
            }
        })
        .collect()
}

/// `name = value` → `Some((name, value))`; `==` comparisons are not
/// assignments.
pub fn split_named_argument(piece: &str) -> Option<(&str, &str)> {
    let eq = piece.find('=')?;
    let name = piece[..eq].trim();
    let rest = &piece[eq + 1..];
    if rest.starts_with('=') || !crate::designer::lexer::is_identifier(name) {
        return None;
    }
    Some((name, rest.trim()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeProperty {
    pub name: String,
    pub value: PropertyValue,
    /// Whole argument text: `name = value`, or the bare value when positional
    pub source_range: Option<SourceRange>,
    pub positional: bool,
}

impl NodeProperty {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        NodeProperty {
            name: name.into(),
            value,
            source_range: None,
            positional: false,
        }
    }

    /// Source text for this property as an argument
    pub fn to_argument(&self) -> String {
        if self.positional {
            self.value.to_source()
        } else {
            format!("{} = {}", self.name, self.value.to_source())
        }
    }
}

/// Child-index path of a node inside its function body, e.g. `0.2.1`
pub type NodeId = String;

/// A parsed UI call site
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeNode {
    pub id: NodeId,
    pub component_type: ComponentType,
    /// Callee name as written in source
    pub name: String,
    pub properties: Vec<NodeProperty>,
    pub children: Vec<ComposeNode>,
    pub source_range: Option<SourceRange>,
}

impl ComposeNode {
    pub fn new(id: impl Into<NodeId>, name: &str) -> Self {
        ComposeNode {
            id: id.into(),
            component_type: ComponentType::from_name(name),
            name: name.to_string(),
            properties: Vec::new(),
            children: Vec::new(),
            source_range: None,
        }
    }

    pub fn property(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn modifier(&self) -> Option<&ModifierChain> {
        self.property("modifier").and_then(|p| p.value.as_modifier())
    }

    /// Depth-first lookup
    pub fn find_by_id(&self, id: &str) -> Option<&ComposeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by_id(id))
    }

    pub fn find_parent_of(&self, id: &str) -> Option<&ComposeNode> {
        if self.children.iter().any(|c| c.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_parent_of(id))
    }

    /// This node and all descendants, depth-first
    pub fn descendants(&self) -> Vec<&ComposeNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParameter {
    pub name: String,
    pub param_type: String,
    pub default_value: Option<String>,
}

/// Arguments of a `@Preview(...)` annotation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewMetadata {
    pub arguments: Vec<(String, String)>,
}

impl PreviewMetadata {
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn name(&self) -> Option<String> {
        self.argument("name")
            .and_then(|v| classify_value(v).as_str().map(str::to_string))
    }

    pub fn show_background(&self) -> bool {
        self.argument("showBackground") == Some("true")
    }

    pub fn show_system_ui(&self) -> bool {
        self.argument("showSystemUi") == Some("true")
    }

    pub fn width_dp(&self) -> Option<u32> {
        self.argument("widthDp").and_then(|v| v.parse().ok())
    }

    pub fn height_dp(&self) -> Option<u32> {
        self.argument("heightDp").and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposableFunction {
    pub name: String,
    pub parameters: Vec<FunctionParameter>,
    pub body: Option<ComposeNode>,
    pub source_range: SourceRange,
    pub annotations: Vec<String>,
    pub preview: Option<PreviewMetadata>,
}

impl ComposableFunction {
    pub fn find_node(&self, id: &str) -> Option<&ComposeNode> {
        self.body.as_ref().and_then(|body| body.find_by_id(id))
    }

    pub fn is_preview(&self) -> bool {
        self.preview.is_some()
    }
}

/// A non-fatal problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Line {}:{}] {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedComposeFile {
    pub path: String,
    pub package_name: Option<String>,
    pub imports: Vec<String>,
    pub functions: Vec<ComposableFunction>,
    pub errors: Vec<ParseError>,
}

impl ParsedComposeFile {
    pub fn function(&self, name: &str) -> Option<&ComposableFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn previews(&self) -> impl Iterator<Item = &ComposableFunction> {
        self.functions.iter().filter(|f| f.is_preview())
    }
}
