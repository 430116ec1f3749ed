/// Designer-authored block tree, the input of the code emitter
///
/// Blocks are not tied to any source text. They can be written by hand in
/// TOML or derived from a parsed `ComposeNode`.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::designer::model::{classify_value, ComponentType, ComposeNode, PropertyValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BlockType {
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
    CustomComponent,
}

impl BlockType {
    pub fn from_component(component: &ComponentType) -> Self {
        match component {
            ComponentType::Column => BlockType::Column,
            ComponentType::Row => BlockType::Row,
            ComponentType::Box => BlockType::Box,
            ComponentType::LazyColumn => BlockType::LazyColumn,
            ComponentType::LazyRow => BlockType::LazyRow,
            ComponentType::Card => BlockType::Card,
            ComponentType::Surface => BlockType::Surface,
            ComponentType::Scaffold => BlockType::Scaffold,
            ComponentType::Text => BlockType::Text,
            ComponentType::Button => BlockType::Button,
            ComponentType::OutlinedButton => BlockType::OutlinedButton,
            ComponentType::TextButton => BlockType::TextButton,
            ComponentType::IconButton => BlockType::IconButton,
            ComponentType::FloatingActionButton => BlockType::FloatingActionButton,
            ComponentType::TextField => BlockType::TextField,
            ComponentType::OutlinedTextField => BlockType::OutlinedTextField,
            ComponentType::Icon => BlockType::Icon,
            ComponentType::Image => BlockType::Image,
            ComponentType::TopAppBar => BlockType::TopAppBar,
            ComponentType::BottomAppBar => BlockType::BottomAppBar,
            ComponentType::NavigationBar => BlockType::NavigationBar,
            ComponentType::NavigationBarItem => BlockType::NavigationBarItem,
            ComponentType::Switch => BlockType::Switch,
            ComponentType::Checkbox => BlockType::Checkbox,
            ComponentType::RadioButton => BlockType::RadioButton,
            ComponentType::Slider => BlockType::Slider,
            ComponentType::Spacer => BlockType::Spacer,
            ComponentType::Divider => BlockType::Divider,
            ComponentType::Custom(_) => BlockType::CustomComponent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutSize {
    Fill,
    Wrap,
    Dp(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Composable name for `CustomComponent` blocks
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub children: Vec<Block>,
    #[serde(default)]
    pub width: Option<LayoutSize>,
    #[serde(default)]
    pub height: Option<LayoutSize>,
    #[serde(default)]
    pub position: Option<Position>,
}

impl Block {
    pub fn new(block_type: BlockType) -> Self {
        Block {
            block_type,
            name: None,
            properties: BTreeMap::new(),
            children: Vec::new(),
            width: None,
            height: None,
            position: None,
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Block {
            name: Some(name.into()),
            ..Block::new(BlockType::CustomComponent)
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Convert a parsed node (and its subtree) into a block. Positional
    /// placeholders (`arg0`…) keep their names.
    pub fn from_node(node: &ComposeNode) -> Self {
        let block_type = BlockType::from_component(&node.component_type);
        Block {
            block_type,
            name: match &node.component_type {
                ComponentType::Custom(name) => Some(name.clone()),
                _ => None,
            },
            properties: node
                .properties
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
            children: node.children.iter().map(Block::from_node).collect(),
            width: None,
            height: None,
            position: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BlockTree {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl BlockTree {
    pub fn new(blocks: Vec<Block>) -> Self {
        BlockTree { blocks }
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Property values as written in TOML: plain strings are text, `{ expr =
/// "..." }` tables are Kotlin expressions classified like parsed source.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawProperty {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Expr { expr: String },
}

impl From<RawProperty> for PropertyValue {
    fn from(raw: RawProperty) -> Self {
        match raw {
            RawProperty::Bool(b) => PropertyValue::Bool(b),
            RawProperty::Int(i) => PropertyValue::Int(i),
            RawProperty::Float(f) => PropertyValue::Float(f),
            RawProperty::Text(s) => PropertyValue::Str(s),
            RawProperty::Expr { expr } => classify_value(&expr),
        }
    }
}

fn deserialize_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, PropertyValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, RawProperty>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designer::model::DimensionUnit;
    use crate::designer::parser::parse_component;

    #[test]
    fn test_block_tree_from_toml() {
        let tree = BlockTree::from_toml(
            r#"
[[blocks]]
type = "Column"
width = "fill"
height = { dp = 200.0 }

[blocks.properties]
verticalArrangement = { expr = "Arrangement.spacedBy(8.dp)" }

[[blocks.children]]
type = "Text"
properties = { text = "Hello", fontSize = { expr = "20.sp" } }

[[blocks.children]]
type = "CustomComponent"
name = "Avatar"
"#,
        )
        .expect("valid block tree");

        assert_eq!(tree.blocks.len(), 1);
        let column = &tree.blocks[0];
        assert_eq!(column.block_type, BlockType::Column);
        assert_eq!(column.width, Some(LayoutSize::Fill));
        assert_eq!(column.height, Some(LayoutSize::Dp(200.0)));
        assert_eq!(column.children.len(), 2);

        let text = &column.children[0];
        assert_eq!(text.property("text"), Some(&PropertyValue::Str("Hello".to_string())));
        assert_eq!(
            text.property("fontSize"),
            Some(&PropertyValue::Dimension { value: 20.0, unit: DimensionUnit::Sp })
        );
        assert_eq!(column.children[1].name.as_deref(), Some("Avatar"));
    }

    #[test]
    fn test_unknown_block_type_is_rejected() {
        let result = BlockTree::from_toml("[[blocks]]\ntype = \"Marquee\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_node() {
        let node = parse_component("Card { ProfileRow(user, compact = true) }").expect("node");
        let block = Block::from_node(&node);
        assert_eq!(block.block_type, BlockType::Card);
        let child = &block.children[0];
        assert_eq!(child.block_type, BlockType::CustomComponent);
        assert_eq!(child.name.as_deref(), Some("ProfileRow"));
        assert_eq!(child.property("compact"), Some(&PropertyValue::Bool(true)));
        assert!(child.property("arg0").is_some());
    }
}
