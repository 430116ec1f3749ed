use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::Path;

use crate::commands::read_source;
use crate::config;
use crate::designer::block::{Block, BlockType};
use crate::designer::model::{classify_value, parse_modifier_chain, split_named_argument, ComponentType, ModifierCall};
use crate::designer::{CodeSynchronizer, SourceDocument, SyncResult};

/// One synchronizer edit. Values are Kotlin source, e.g. `"Hello"` or `16.dp`.
#[derive(Subcommand, Debug, Clone)]
pub enum SyncEdit {
    /// Replace the value of an existing property
    SetProp { node: String, name: String, value: String },
    /// Add a property (updates it when already present)
    AddProp { node: String, name: String, value: String },
    /// Replace the whole modifier chain, e.g. `Modifier.padding(8.dp)`
    SetModifier { node: String, chain: String },
    /// Append a modifier call, e.g. `padding(8.dp)`
    AddModifier { node: String, call: String },
    /// Replace an existing modifier call with the same name
    UpdateModifier { node: String, call: String },
    /// Remove a modifier call by name
    RemoveModifier { node: String, name: String },
    /// Insert a new component as a child
    AddChild {
        parent: String,
        /// Component name, e.g. Text or a custom composable
        component: String,
        /// `name=value` properties
        #[arg(long = "prop")]
        props: Vec<String>,
        /// Insert before this child index instead of appending
        #[arg(long)]
        index: Option<usize>,
    },
    /// Remove a node and its subtree
    Remove { node: String },
    /// Swap two children of a parent
    Swap { parent: String, first: usize, second: usize },
    /// Wrap a node in a container component
    Wrap {
        node: String,
        container: String,
        #[arg(long = "prop")]
        props: Vec<String>,
    },
}

pub fn execute(file: &str, function: &str, edit: &SyncEdit, write: bool, config_path: Option<&str>) -> Result<()> {
    let config = config::load_or_default(config_path)?;
    let source = read_source(Path::new(file))?;
    let doc = SourceDocument::parse(source.clone(), file);
    let synchronizer = CodeSynchronizer::new(config.generation_config());

    let result = apply(&synchronizer, doc, function, edit)?;
    let result = result.into_result().map_err(|e| anyhow::anyhow!("{}", e))?;
    let description = result.change_description.clone().unwrap_or_default();

    if write {
        fs::write(file, &result.updated_code).context(format!("Failed to write {}", file))?;
        println!("{} {}: {}", "   Updated".green().bold(), file, description);
    } else {
        println!("{} {}", "   Preview".cyan().bold(), description);
        print_diff(file, &source, &result.updated_code);
    }
    Ok(())
}

/// Run one edit against a parsed document
pub fn apply(synchronizer: &CodeSynchronizer, doc: SourceDocument, function: &str, edit: &SyncEdit) -> Result<SyncResult> {
    let result = match edit {
        SyncEdit::SetProp { node, name, value } => {
            synchronizer.update_node_property(doc, function, node, name, &classify_value(value))
        }
        SyncEdit::AddProp { node, name, value } => {
            synchronizer.add_node_property(doc, function, node, name, &classify_value(value))
        }
        SyncEdit::SetModifier { node, chain } => {
            let chain = parse_modifier_chain(chain)
                .ok_or_else(|| anyhow::anyhow!("'{}' is not a modifier chain", chain))?;
            synchronizer.update_modifier(doc, function, node, &chain)
        }
        SyncEdit::AddModifier { node, call } => {
            synchronizer.add_modifier_call(doc, function, node, &parse_call(call)?)
        }
        SyncEdit::UpdateModifier { node, call } => {
            synchronizer.update_modifier_call(doc, function, node, &parse_call(call)?)
        }
        SyncEdit::RemoveModifier { node, name } => synchronizer.remove_modifier_call(doc, function, node, name),
        SyncEdit::AddChild { parent, component, props, index } => {
            let block = build_block(component, props)?;
            synchronizer.add_child(doc, function, parent, &block, *index)
        }
        SyncEdit::Remove { node } => synchronizer.remove_node(doc, function, node),
        SyncEdit::Swap { parent, first, second } => {
            synchronizer.reorder_children(doc, function, parent, *first, *second)
        }
        SyncEdit::Wrap { node, container, props } => {
            let block = build_block(container, props)?;
            synchronizer.wrap_node(doc, function, node, &block)
        }
    };
    Ok(result)
}

/// `padding(8.dp)` → a single modifier call
fn parse_call(text: &str) -> Result<ModifierCall> {
    let text = text.trim().trim_start_matches('.');
    parse_modifier_chain(&format!("Modifier.{}", text))
        .and_then(|chain| chain.calls.into_iter().next())
        .ok_or_else(|| anyhow::anyhow!("'{}' is not a modifier call", text))
}

fn build_block(component: &str, props: &[String]) -> Result<Block> {
    let component_type = ComponentType::from_name(component);
    let mut block = match &component_type {
        ComponentType::Custom(name) => Block::custom(name.clone()),
        known => Block::new(BlockType::from_component(known)),
    };
    for prop in props {
        let (name, value) = split_named_argument(prop)
            .or_else(|| prop.split_once('=').map(|(n, v)| (n.trim(), v.trim())))
            .ok_or_else(|| anyhow::anyhow!("expected name=value, got '{}'", prop))?;
        block.properties.insert(name.to_string(), classify_value(value));
    }
    Ok(block)
}

fn print_diff(file: &str, old: &str, new: &str) {
    let diff = TextDiff::from_lines(old, new);
    println!("{}", format!("--- {}\n+++ {}", file, file).bold());
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = format!("{}{}", change.tag(), change.value());
            let line = line.trim_end_matches('\n');
            match change.tag() {
                ChangeTag::Delete => println!("{}", line.red()),
                ChangeTag::Insert => println!("{}", line.green()),
                ChangeTag::Equal => println!("{}", line),
            }
        }
    }
}
