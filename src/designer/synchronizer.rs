/// Targeted text edits that keep Compose source in step with designer changes
///
/// Every edit resolves a function by name and a node by id in a parsed
/// `SourceDocument`, computes the smallest text splice that expresses the
/// change, and returns the patched source. Text outside the splice is left
/// byte-for-byte intact.
use std::fmt;

use crate::designer::block::Block;
use crate::designer::document::SourceDocument;
use crate::designer::emitter::imports::{is_imported, scan_imports};
use crate::designer::emitter::{CodeEmitter, GenerationConfig};
use crate::designer::lexer::TokenStream;
use crate::designer::model::{
    ComposeNode, ModifierCall, ModifierChain, NodeProperty, PropertyValue, SourceRange,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    FunctionNotFound(String),
    NodeNotFound(String),
    PropertyNotFound { node: String, property: String },
    ModifierCallNotFound { node: String, call: String },
    MissingSourceRange(String),
    InvalidIndex { node: String, index: usize, len: usize },
    Unsupported(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::FunctionNotFound(name) => write!(f, "Function '{}' not found", name),
            SyncError::NodeNotFound(id) => write!(f, "Node '{}' not found", id),
            SyncError::PropertyNotFound { node, property } => {
                write!(f, "Property '{}' not found on node '{}'", property, node)
            }
            SyncError::ModifierCallNotFound { node, call } => {
                write!(f, "Modifier call '{}' not found on node '{}'", call, node)
            }
            SyncError::MissingSourceRange(what) => write!(f, "No source range for {}", what),
            SyncError::InvalidIndex { node, index, len } => write!(
                f,
                "Index {} out of bounds for node '{}' with {} children",
                index, node, len
            ),
            SyncError::Unsupported(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for SyncError {}

/// Outcome of one edit. On failure `updated_code` is the unchanged input.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub updated_code: String,
    pub success: bool,
    pub error: Option<SyncError>,
    pub change_description: Option<String>,
    pub path: String,
}

impl SyncResult {
    /// Re-parse the updated code for the next edit
    pub fn into_document(self) -> SourceDocument {
        SourceDocument::parse(self.updated_code, &self.path)
    }

    pub fn into_result(self) -> Result<SyncResult, SyncError> {
        match self.error.clone() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

/// A computed edit: the new source plus what changed
struct Edit {
    code: String,
    description: String,
    imports: Vec<String>,
}

impl Edit {
    fn new(code: String, description: String) -> Self {
        Edit {
            code,
            description,
            imports: Vec::new(),
        }
    }
}

pub struct CodeSynchronizer {
    emitter: CodeEmitter,
}

impl Default for CodeSynchronizer {
    fn default() -> Self {
        CodeSynchronizer::new(GenerationConfig::default())
    }
}

impl CodeSynchronizer {
    pub fn new(config: GenerationConfig) -> Self {
        CodeSynchronizer {
            emitter: CodeEmitter::new(config),
        }
    }

    fn indent_unit(&self) -> String {
        " ".repeat(self.emitter.config().indent)
    }

    pub fn update_node_property(
        &self,
        doc: SourceDocument,
        function: &str,
        node_id: &str,
        name: &str,
        value: &PropertyValue,
    ) -> SyncResult {
        let edit = self.replace_property(&doc, function, node_id, name, value);
        finish(doc, edit)
    }

    /// Add `name = value` to a call, or update it when already present
    pub fn add_node_property(
        &self,
        doc: SourceDocument,
        function: &str,
        node_id: &str,
        name: &str,
        value: &PropertyValue,
    ) -> SyncResult {
        let edit = self.insert_property(&doc, function, node_id, name, value);
        finish(doc, edit)
    }

    /// Replace the whole modifier chain of a node
    pub fn update_modifier(
        &self,
        doc: SourceDocument,
        function: &str,
        node_id: &str,
        chain: &ModifierChain,
    ) -> SyncResult {
        let value = PropertyValue::Modifier(chain.clone());
        let edit = self.insert_property(&doc, function, node_id, "modifier", &value);
        finish(doc, edit)
    }

    /// Append a call to the node's modifier chain
    pub fn add_modifier_call(
        &self,
        doc: SourceDocument,
        function: &str,
        node_id: &str,
        call: &ModifierCall,
    ) -> SyncResult {
        let edit = resolve(&doc, function, node_id).and_then(|node| {
            let mut chain = current_chain(node).unwrap_or_default();
            chain.calls.push(call.clone());
            let value = PropertyValue::Modifier(chain);
            self.insert_property(&doc, function, node_id, "modifier", &value)
        });
        finish(doc, edit)
    }

    /// Replace the first call named like `call` in the node's modifier chain
    pub fn update_modifier_call(
        &self,
        doc: SourceDocument,
        function: &str,
        node_id: &str,
        call: &ModifierCall,
    ) -> SyncResult {
        let edit = resolve(&doc, function, node_id).and_then(|node| {
            let Some(mut chain) = current_chain(node) else {
                let value = PropertyValue::Modifier(ModifierChain::new(vec![call.clone()]));
                return self.insert_property(&doc, function, node_id, "modifier", &value);
            };
            let slot = chain
                .calls
                .iter_mut()
                .find(|c| c.name == call.name)
                .ok_or_else(|| SyncError::ModifierCallNotFound {
                    node: node_id.to_string(),
                    call: call.name.clone(),
                })?;
            *slot = call.clone();
            self.replace_property(&doc, function, node_id, "modifier", &PropertyValue::Modifier(chain))
        });
        finish(doc, edit)
    }

    pub fn remove_modifier_call(
        &self,
        doc: SourceDocument,
        function: &str,
        node_id: &str,
        call_name: &str,
    ) -> SyncResult {
        let edit = resolve(&doc, function, node_id).and_then(|node| {
            let mut chain = current_chain(node).ok_or_else(|| SyncError::PropertyNotFound {
                node: node_id.to_string(),
                property: "modifier".to_string(),
            })?;
            let position = chain
                .calls
                .iter()
                .position(|c| c.name == call_name)
                .ok_or_else(|| SyncError::ModifierCallNotFound {
                    node: node_id.to_string(),
                    call: call_name.to_string(),
                })?;
            chain.calls.remove(position);
            self.replace_property(&doc, function, node_id, "modifier", &PropertyValue::Modifier(chain))
        });
        finish(doc, edit)
    }

    /// Insert a child emitted from `block`, before child `index` or at the end
    pub fn add_child(
        &self,
        doc: SourceDocument,
        function: &str,
        parent_id: &str,
        block: &Block,
        index: Option<usize>,
    ) -> SyncResult {
        let edit = self.insert_child(&doc, function, parent_id, block, index);
        finish(doc, edit)
    }

    /// Delete a node. Lines holding only the node go entirely, including
    /// the trailing newline.
    pub fn remove_node(&self, doc: SourceDocument, function: &str, node_id: &str) -> SyncResult {
        let edit = resolve(&doc, function, node_id).and_then(|node| {
            let range = node_range(node)?;
            let source = doc.source();
            let line_start = line_start(source, range.start);
            let line_end = source[range.end..]
                .find('\n')
                .map(|i| range.end + i + 1)
                .unwrap_or(source.len());
            let owns_lines = source[line_start..range.start].trim().is_empty()
                && source[range.end..line_end].trim().is_empty();
            let (start, end) = if owns_lines {
                (line_start, line_end)
            } else {
                (range.start, range.end)
            };
            Ok(Edit::new(
                splice(source, start, end, ""),
                format!("Removed {} ({})", node.name, node.id),
            ))
        });
        finish(doc, edit)
    }

    /// Swap the source text of two children of one parent
    pub fn reorder_children(
        &self,
        doc: SourceDocument,
        function: &str,
        parent_id: &str,
        first: usize,
        second: usize,
    ) -> SyncResult {
        let edit = resolve(&doc, function, parent_id).and_then(|parent| {
            let len = parent.children.len();
            for index in [first, second] {
                if index >= len {
                    return Err(SyncError::InvalidIndex {
                        node: parent_id.to_string(),
                        index,
                        len,
                    });
                }
            }
            let source = doc.source();
            if first == second {
                return Ok(Edit::new(source.to_string(), "No change".to_string()));
            }
            let (low, high) = (first.min(second), first.max(second));
            let low_range = node_range(&parent.children[low])?;
            let high_range = node_range(&parent.children[high])?;
            let low_text = low_range.text(source).to_string();
            let high_text = high_range.text(source).to_string();

            // Later range first, so the earlier offsets stay valid
            let code = splice(source, high_range.start, high_range.end, &low_text);
            let code = splice(&code, low_range.start, low_range.end, &high_text);
            Ok(Edit::new(
                code,
                format!("Swapped children {} and {} of {} ({})", low, high, parent.name, parent.id),
            ))
        });
        finish(doc, edit)
    }

    /// Surround a node with a container call built from `container`
    pub fn wrap_node(
        &self,
        doc: SourceDocument,
        function: &str,
        node_id: &str,
        container: &Block,
    ) -> SyncResult {
        let edit = resolve(&doc, function, node_id).and_then(|node| {
            let range = node_range(node)?;
            let header = self
                .emitter
                .call_header(container)
                .ok_or_else(|| SyncError::Unsupported("Cannot wrap in a component without a name".to_string()))?;
            let source = doc.source();
            let indent = detect_indent(source, range.start);
            let unit = self.indent_unit();

            let mut wrapped = reindent_tail(&header.code, indent);
            wrapped.push_str(" {\n");
            for (i, line) in range.text(source).split('\n').enumerate() {
                if i == 0 {
                    wrapped.push_str(&format!("{}{}{}\n", indent, unit, line));
                } else if line.trim().is_empty() {
                    wrapped.push('\n');
                } else {
                    wrapped.push_str(&format!("{}{}\n", unit, line));
                }
            }
            wrapped.push_str(indent);
            wrapped.push('}');

            let mut edit = Edit::new(
                splice(source, range.start, range.end, &wrapped),
                format!("Wrapped {} ({}) in {}", node.name, node.id, container_name(&header.code)),
            );
            edit.imports = header.imports;
            Ok(edit)
        });
        finish(doc, edit)
    }

    fn replace_property(
        &self,
        doc: &SourceDocument,
        function: &str,
        node_id: &str,
        name: &str,
        value: &PropertyValue,
    ) -> Result<Edit, SyncError> {
        let node = resolve(doc, function, node_id)?;
        let property = node.property(name).ok_or_else(|| SyncError::PropertyNotFound {
            node: node_id.to_string(),
            property: name.to_string(),
        })?;
        let range = property
            .source_range
            .ok_or_else(|| SyncError::MissingSourceRange(format!("property '{}'", name)))?;
        let replacement = NodeProperty {
            positional: property.positional,
            ..NodeProperty::new(name, value.clone())
        };
        let mut edit = Edit::new(
            splice(doc.source(), range.start, range.end, &replacement.to_argument()),
            format!("Updated {} of {} ({})", name, node.name, node.id),
        );
        edit.imports = value_imports(value);
        Ok(edit)
    }

    fn insert_property(
        &self,
        doc: &SourceDocument,
        function: &str,
        node_id: &str,
        name: &str,
        value: &PropertyValue,
    ) -> Result<Edit, SyncError> {
        let node = resolve(doc, function, node_id)?;
        if node.property(name).is_some() {
            return self.replace_property(doc, function, node_id, name, value);
        }
        let range = node_range(node)?;
        let source = doc.source();
        let stream = TokenStream::new(source);
        let shape = call_shape(&stream, range).ok_or_else(|| SyncError::MissingSourceRange(node.name.clone()))?;
        let argument = NodeProperty::new(name, value.clone()).to_argument();

        let (at, text) = match shape.parens {
            Some((open, close)) => match stream.prev_significant(close) {
                Some(last) if last != open => {
                    let last_end = stream.token(last).end;
                    let multiline = source[stream.token(open).end..stream.token(close).start].contains('\n');
                    if multiline {
                        let indent = detect_indent(source, stream.token(last).start);
                        if stream.is_punct(last, ',') {
                            (last_end, format!("\n{}{},", indent, argument))
                        } else {
                            (last_end, format!(",\n{}{}", indent, argument))
                        }
                    } else if stream.is_punct(last, ',') {
                        (last_end, format!(" {},", argument))
                    } else {
                        (last_end, format!(", {}", argument))
                    }
                }
                _ => (stream.token(close).start, argument),
            },
            None => (shape.name_end, format!("({})", argument)),
        };

        let mut edit = Edit::new(
            splice(source, at, at, &text),
            format!("Added {} to {} ({})", name, node.name, node.id),
        );
        edit.imports = value_imports(value);
        Ok(edit)
    }

    fn insert_child(
        &self,
        doc: &SourceDocument,
        function: &str,
        parent_id: &str,
        block: &Block,
        index: Option<usize>,
    ) -> Result<Edit, SyncError> {
        let parent = resolve(doc, function, parent_id)?;
        let range = node_range(parent)?;
        let len = parent.children.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(SyncError::InvalidIndex {
                node: parent_id.to_string(),
                index,
                len,
            });
        }

        let source = doc.source();
        let emitted = self.emitter.emit_block(block);
        let parent_indent = detect_indent(source, range.start);
        let child_indent = match parent.children.first().and_then(|c| c.source_range) {
            Some(first) => detect_indent(source, first.start).to_string(),
            None => {
                let level = detect_indent_level(source, range.start, self.emitter.config().indent);
                self.indent_unit().repeat(level + 1)
            }
        };
        let child = reindent(&emitted.code, &child_indent);

        let stream = TokenStream::new(source);
        let shape = call_shape(&stream, range).ok_or_else(|| SyncError::MissingSourceRange(parent.name.clone()))?;

        let (at, text) = if index < len {
            let sibling = node_range(&parent.children[index])?;
            if source[line_start(source, sibling.start)..sibling.start].trim().is_empty() {
                (line_start(source, sibling.start), child)
            } else {
                (sibling.start, format!("{}\n{}", child.trim(), child_indent))
            }
        } else {
            match shape.lambda {
                Some((_, close)) => {
                    let close_start = stream.token(close).start;
                    let before_close = &source[line_start(source, close_start)..close_start];
                    if before_close.trim().is_empty() {
                        (line_start(source, close_start), child)
                    } else {
                        (close_start, format!("\n{}{}", child, parent_indent))
                    }
                }
                None => (range.end, format!(" {{\n{}{}}}", child, parent_indent)),
            }
        };

        let mut edit = Edit::new(
            splice(source, at, at, &text),
            format!("Added {} to {} ({})", container_name(emitted.code.trim_start()), parent.name, parent.id),
        );
        edit.imports = emitted.imports;
        Ok(edit)
    }

}

fn value_imports(value: &PropertyValue) -> Vec<String> {
    scan_imports(&value.to_source()).into_iter().collect()
}

fn finish(doc: SourceDocument, edit: Result<Edit, SyncError>) -> SyncResult {
    let path = doc.path().to_string();
    match edit {
        Ok(edit) => {
            let updated_code = ensure_imports(&edit.code, &doc.file().imports, &edit.imports);
            SyncResult {
                updated_code,
                success: true,
                error: None,
                change_description: Some(edit.description),
                path,
            }
        }
        Err(error) => SyncResult {
            updated_code: doc.into_source(),
            success: false,
            error: Some(error),
            change_description: None,
            path,
        },
    }
}

fn resolve<'d>(doc: &'d SourceDocument, function: &str, node_id: &str) -> Result<&'d ComposeNode, SyncError> {
    let function = doc
        .function(function)
        .ok_or_else(|| SyncError::FunctionNotFound(function.to_string()))?;
    function
        .find_node(node_id)
        .ok_or_else(|| SyncError::NodeNotFound(node_id.to_string()))
}

fn node_range(node: &ComposeNode) -> Result<SourceRange, SyncError> {
    node.source_range
        .ok_or_else(|| SyncError::MissingSourceRange(format!("node '{}'", node.id)))
}

fn current_chain(node: &ComposeNode) -> Option<ModifierChain> {
    node.property("modifier").map(|p| match &p.value {
        PropertyValue::Modifier(chain) => chain.clone(),
        other => ModifierChain {
            receiver: other.to_source(),
            calls: Vec::new(),
        },
    })
}

/// Token positions of a call's name end, argument parens and trailing lambda
struct CallShape {
    name_end: usize,
    parens: Option<(usize, usize)>,
    lambda: Option<(usize, usize)>,
}

fn call_shape(stream: &TokenStream, range: SourceRange) -> Option<CallShape> {
    let name = stream.index_at_offset(range.start)?;
    let within = |close: usize| stream.token(close).end <= range.end;
    let mut shape = CallShape {
        name_end: stream.token(name).end,
        parens: None,
        lambda: None,
    };

    let mut next = stream.next_on_line(name + 1, stream.len());
    if let Some(open) = next.filter(|&i| stream.is_punct(i, '(')) {
        let close = stream.partner(open).filter(|&c| within(c))?;
        shape.parens = Some((open, close));
        next = stream.next_on_line(close + 1, stream.len());
    }
    if let Some(open) = next.filter(|&i| stream.is_punct(i, '{')) {
        if let Some(close) = stream.partner(open).filter(|&c| within(c)) {
            shape.lambda = Some((open, close));
        }
    }
    Some(shape)
}

/// Leading whitespace of the line holding `offset`
pub fn detect_indent(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let line = &source[start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Indentation depth of the line holding `offset`, in units of
/// `indent_width` spaces (a tab counts as one unit)
pub fn detect_indent_level(source: &str, offset: usize, indent_width: usize) -> usize {
    let columns: usize = detect_indent(source, offset)
        .chars()
        .map(|c| if c == '\t' { indent_width } else { 1 })
        .sum();
    columns / indent_width.max(1)
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn splice(source: &str, start: usize, end: usize, text: &str) -> String {
    let mut out = String::with_capacity(source.len() + text.len());
    out.push_str(&source[..start]);
    out.push_str(text);
    out.push_str(&source[end..]);
    out
}

/// Prefix every non-blank line with `indent`
fn reindent(code: &str, indent: &str) -> String {
    code.split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect()
}

/// Indent every line but the first, for text spliced after existing indentation
fn reindent_tail(code: &str, indent: &str) -> String {
    match code.split_once('\n') {
        Some((first, rest)) => format!("{}\n{}", first, reindent(rest, indent)),
        None => code.to_string(),
    }
}

fn container_name(code: &str) -> &str {
    let end = code
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(code.len());
    &code[..end]
}

/// Add imports missing from `existing` after the last import line, or after
/// the package line when the file has no imports. `@file:` annotations
/// always stay above the header.
pub fn ensure_imports(code: &str, existing: &[String], required: &[String]) -> String {
    let missing: Vec<&String> = required
        .iter()
        .filter(|import| !is_imported(existing, import))
        .collect();
    if missing.is_empty() {
        return code.to_string();
    }
    let block: String = missing.iter().map(|import| format!("import {}\n", import)).collect();

    let mut offset = 0;
    let mut last_import_end = None;
    let mut package_end = None;
    let mut file_annotations_end = None;
    for line in code.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("import ") {
            last_import_end = Some(offset + line.len());
        } else if trimmed.starts_with("package ") {
            package_end = Some(offset + line.len());
        } else if trimmed.starts_with("@file:") {
            file_annotations_end = Some(offset + line.len());
        } else if trimmed.starts_with('@') || trimmed.starts_with("fun ") {
            break;
        }
        offset += line.len();
    }

    match (last_import_end, package_end.or(file_annotations_end)) {
        (Some(end), _) if code[..end].ends_with('\n') => splice(code, end, end, &block),
        (Some(end), _) => splice(code, end, end, &format!("\n{}", block.trim_end())),
        (None, Some(end)) => splice(code, end, end, &format!("\n{}", block)),
        (None, None) => format!("{}\n{}", block, code),
    }
}
