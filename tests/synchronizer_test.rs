use compose_sync::designer::model::{ModifierArgument, ModifierCall, ModifierChain};
use compose_sync::designer::{
    Block, BlockType, CodeSynchronizer, PropertyValue, SourceDocument, SyncError,
};

const LIST: &str = "@Composable
fun Items() {
    Column {
        Text(\"First\")
        Button(onClick = {}) {
            Text(\"Second\")
        }
        Text(\"Third\")
    }
}
";

fn doc(source: &str) -> SourceDocument {
    SourceDocument::parse(source, "Items.kt")
}

fn text(value: &str) -> PropertyValue {
    PropertyValue::Str(value.to_string())
}

#[test]
fn test_update_property_only_touches_its_range() {
    let source = "@Composable\nfun Title() {\n    Text(text = \"Hi\", fontSize = 12.sp)\n}\n";
    let document = doc(source);
    let range = document
        .function("Title")
        .and_then(|f| f.find_node("0"))
        .and_then(|n| n.property("text"))
        .and_then(|p| p.source_range)
        .expect("range");

    let result = CodeSynchronizer::default().update_node_property(document, "Title", "0", "text", &text("Hello"));
    assert!(result.success);

    let replacement = "text = \"Hello\"";
    let updated = &result.updated_code;
    assert_eq!(&updated[..range.start], &source[..range.start]);
    assert_eq!(&updated[range.start..range.start + replacement.len()], replacement);
    assert_eq!(&updated[range.start + replacement.len()..], &source[range.end..]);
    assert_eq!(result.change_description.as_deref(), Some("Updated text of Text (0)"));
}

#[test]
fn test_remove_node_deletes_whole_lines() {
    let result = CodeSynchronizer::default().remove_node(doc(LIST), "Items", "0.1");
    assert!(result.success);
    let expected = "@Composable
fun Items() {
    Column {
        Text(\"First\")
        Text(\"Third\")
    }
}
";
    assert_eq!(result.updated_code, expected);
}

#[test]
fn test_remove_node_on_shared_line_removes_exact_range() {
    let source = "@Composable\nfun Pair() {\n    Row { Text(\"a\") }\n}\n";
    let result = CodeSynchronizer::default().remove_node(doc(source), "Pair", "0.0");
    assert!(result.success);
    assert_eq!(result.updated_code, "@Composable\nfun Pair() {\n    Row {  }\n}\n");
}

#[test]
fn test_reorder_swaps_first_and_last() {
    let result = CodeSynchronizer::default().reorder_children(doc(LIST), "Items", "0", 0, 2);
    assert!(result.success);
    let expected = "@Composable
fun Items() {
    Column {
        Text(\"Third\")
        Button(onClick = {}) {
            Text(\"Second\")
        }
        Text(\"First\")
    }
}
";
    assert_eq!(result.updated_code, expected);

    // Argument order does not matter
    let reversed = CodeSynchronizer::default().reorder_children(doc(LIST), "Items", "0", 2, 0);
    assert_eq!(reversed.updated_code, expected);
}

#[test]
fn test_reorder_out_of_bounds() {
    let result = CodeSynchronizer::default().reorder_children(doc(LIST), "Items", "0", 0, 3);
    assert!(!result.success);
    assert_eq!(
        result.error,
        Some(SyncError::InvalidIndex { node: "0".to_string(), index: 3, len: 3 })
    );
    assert_eq!(result.updated_code, LIST);
}

#[test]
fn test_precondition_failures_return_original() {
    let sync = CodeSynchronizer::default();

    let missing_node = sync.remove_node(doc(LIST), "Items", "0.9");
    assert_eq!(missing_node.error, Some(SyncError::NodeNotFound("0.9".to_string())));
    assert_eq!(missing_node.updated_code, LIST);

    let missing_property = sync.update_node_property(doc(LIST), "Items", "0.0", "color", &text("x"));
    assert!(matches!(missing_property.error, Some(SyncError::PropertyNotFound { .. })));
    assert_eq!(missing_property.updated_code, LIST);

    let missing_call = sync.remove_modifier_call(doc(LIST), "Items", "0", "padding");
    assert!(!missing_call.success);
    assert!(missing_call.change_description.is_none());
}

#[test]
fn test_add_property_single_and_multi_line() {
    let sync = CodeSynchronizer::default();

    let result = sync.add_node_property(doc(LIST), "Items", "0.0", "color", &PropertyValue::Color("Color.Gray".to_string()));
    assert!(result.success);
    assert!(result.updated_code.contains("        Text(\"First\", color = Color.Gray)\n"));
    assert!(result.updated_code.starts_with("import androidx.compose.ui.graphics.Color\n\n@Composable"));

    let source = "@Composable\nfun Form() {\n    Button(\n        onClick = {},\n        enabled = true,\n    ) {\n        Text(\"Go\")\n    }\n}\n";
    let result = sync.add_node_property(doc(source), "Form", "0", "shape", &PropertyValue::Expression("CircleShape".to_string()));
    assert!(result.success);
    assert!(result.updated_code.contains("        enabled = true,\n        shape = CircleShape,\n    ) {\n"));

    let source = "@Composable\nfun Form() {\n    Button(\n        onClick = {}\n    ) {}\n}\n";
    let result = sync.add_node_property(doc(source), "Form", "0", "enabled", &PropertyValue::Bool(false));
    assert!(result.updated_code.contains("        onClick = {},\n        enabled = false\n    ) {}\n"));
}

#[test]
fn test_add_property_keeps_trailing_comma() {
    let source = "@Composable\nfun Label() {\n    Text(\"a\",)\n}\n";
    let result = CodeSynchronizer::default().add_node_property(doc(source), "Label", "0", "softWrap", &PropertyValue::Bool(false));
    assert!(result.success);
    assert_eq!(result.updated_code, "@Composable\nfun Label() {\n    Text(\"a\", softWrap = false,)\n}\n");
}

#[test]
fn test_imports_go_below_file_annotation_and_package() {
    let source = "@file:OptIn(ExperimentalMaterial3Api::class)

package com.example

import androidx.compose.material3.Text

@Composable
fun Screen() {
    Text(\"Hi\")
}
";
    let padding = ModifierCall::new("padding", vec![ModifierArgument::positional("8.dp")]);
    let result = CodeSynchronizer::default().add_modifier_call(doc(source), "Screen", "0", &padding);
    assert!(result.success);
    let expected = "@file:OptIn(ExperimentalMaterial3Api::class)

package com.example

import androidx.compose.material3.Text
import androidx.compose.foundation.layout.padding
import androidx.compose.ui.Modifier
import androidx.compose.ui.unit.dp

@Composable
fun Screen() {
    Text(\"Hi\", modifier = Modifier.padding(8.dp))
}
";
    assert_eq!(result.updated_code, expected);
}

#[test]
fn test_add_existing_property_updates_it() {
    let result = CodeSynchronizer::default().add_node_property(doc(LIST), "Items", "0.0", "text", &text("Uno"));
    assert!(result.success);
    assert!(result.updated_code.contains("        Text(\"Uno\")\n"));
    assert!(!result.updated_code.contains("First"));
}

#[test]
fn test_modifier_edits() {
    let source = "@Composable\nfun Tile() {\n    Text(\"Hi\", modifier = Modifier.padding(8.dp).fillMaxWidth())\n}\n";
    let sync = CodeSynchronizer::default();

    let padding = ModifierCall::new("padding", vec![ModifierArgument::positional("16.dp")]);
    let updated = sync.update_modifier_call(doc(source), "Tile", "0", &padding);
    assert!(updated.updated_code.contains("modifier = Modifier.padding(16.dp).fillMaxWidth())"));

    let removed = sync.remove_modifier_call(doc(source), "Tile", "0", "fillMaxWidth");
    assert!(removed.updated_code.contains("modifier = Modifier.padding(8.dp))"));

    let clip = ModifierCall::new("clip", vec![ModifierArgument::positional("CircleShape")]);
    let added = sync.add_modifier_call(doc(source), "Tile", "0", &clip);
    assert!(added.updated_code.contains("modifier = Modifier.padding(8.dp).fillMaxWidth().clip(CircleShape))"));
    assert!(added.updated_code.contains("import androidx.compose.ui.draw.clip\n"));

    let missing = sync.update_modifier_call(doc(source), "Tile", "0", &clip);
    assert_eq!(
        missing.error,
        Some(SyncError::ModifierCallNotFound { node: "0".to_string(), call: "clip".to_string() })
    );
}

#[test]
fn test_modifier_without_existing_chain_goes_through_add_property() {
    let sync = CodeSynchronizer::default();
    let call = ModifierCall::new("weight", vec![ModifierArgument::positional("1f")]);
    let result = sync.add_modifier_call(doc(LIST), "Items", "0.2", &call);
    assert!(result.success);
    assert!(result.updated_code.contains("        Text(\"Third\", modifier = Modifier.weight(1f))\n"));

    let chain = ModifierChain::new(vec![ModifierCall::new("fillMaxSize", vec![])]);
    let result = sync.update_modifier(doc(LIST), "Items", "0", &chain);
    assert!(result.updated_code.contains("    Column(modifier = Modifier.fillMaxSize()) {\n"));
}

#[test]
fn test_add_child_at_index_and_end() {
    let sync = CodeSynchronizer::default();
    let spacer = Block::new(BlockType::Spacer);

    let result = sync.add_child(doc(LIST), "Items", "0", &spacer, Some(1));
    assert!(result.success);
    assert!(result.updated_code.contains(
        "        Text(\"First\")\n        Spacer(modifier = Modifier.height(8.dp))\n        Button(onClick = {}) {\n"
    ));
    assert!(result.updated_code.contains("import androidx.compose.foundation.layout.Spacer\n"));

    let card = Block::new(BlockType::Card).with_child(Block::new(BlockType::Text).with_property("text", text("Nested")));
    let result = sync.add_child(doc(LIST), "Items", "0", &card, None);
    assert!(result.updated_code.contains(
        "        Text(\"Third\")\n        Card {\n            Text(text = \"Nested\")\n        }\n    }\n}\n"
    ));

    let result = sync.add_child(doc(LIST), "Items", "0", &card, Some(7));
    assert!(matches!(result.error, Some(SyncError::InvalidIndex { index: 7, .. })));
}

#[test]
fn test_add_child_to_leaf_opens_a_lambda() {
    let source = "@Composable\nfun Chip() {\n    Surface(tonalElevation = 2.dp)\n}\n";
    let label = Block::new(BlockType::Text).with_property("text", text("Chip"));
    let result = CodeSynchronizer::default().add_child(doc(source), "Chip", "0", &label, None);
    assert!(result.success);
    assert!(result.updated_code.contains("    Surface(tonalElevation = 2.dp) {\n        Text(text = \"Chip\")\n    }\n"));
}

#[test]
fn test_wrap_node_reindents() {
    let sync = CodeSynchronizer::default();
    let card = Block::new(BlockType::Card);
    let result = sync.wrap_node(doc(LIST), "Items", "0.1", &card);
    assert!(result.success);
    assert!(result.updated_code.contains(
        "        Card {\n            Button(onClick = {}) {\n                Text(\"Second\")\n            }\n        }\n        Text(\"Third\")\n"
    ));
    assert!(result.updated_code.starts_with("import androidx.compose.material3.Card\n"));
}

#[test]
fn test_sequential_edits_reparse() {
    let sync = CodeSynchronizer::default();
    let first = sync.remove_node(doc(LIST), "Items", "0.0");
    assert!(first.success);

    // Ids shift after the removal: the old 0.2 is now 0.1
    let document = first.into_document();
    let node = document.function("Items").and_then(|f| f.find_node("0.1")).expect("node");
    assert_eq!(node.property("text").map(|p| &p.value), Some(&text("Third")));

    let second = sync.update_node_property(document, "Items", "0.1", "text", &text("Last"));
    assert!(second.success);
    assert!(second.updated_code.contains("        Text(\"Last\")\n    }\n"));
    assert!(!second.updated_code.contains("First"));
}
