/// Per-component code generators
use crate::designer::block::{Block, BlockType, LayoutSize, Position};
use crate::designer::emitter::EmitContext;
use crate::designer::model::{
    quote_string, DimensionUnit, ModifierArgument, ModifierCall, ModifierChain, PropertyValue,
};

/// Calls longer than this are broken into one argument per line
const MAX_LINE_WIDTH: usize = 100;

/// Properties folded into the generated `modifier` argument
const MODIFIER_PROPERTIES: &[&str] = &["modifier", "padding", "background"];

const MATERIAL3_OPT_IN: (&str, &str) = (
    "ExperimentalMaterial3Api",
    "androidx.compose.material3.ExperimentalMaterial3Api",
);

/// A component call before layout
struct Call {
    name: String,
    args: Vec<String>,
    /// Rendered trailing-lambda content; `None` means no trailing lambda
    content: Option<String>,
    lambda_param: Option<&'static str>,
}

impl Call {
    fn new(name: &str, args: Vec<String>) -> Self {
        Call {
            name: name.to_string(),
            args,
            content: None,
            lambda_param: None,
        }
    }

    fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }
}

/// Kotlin source for `block` and its subtree at `level`, one trailing newline
pub fn emit_block(ctx: &mut EmitContext, block: &Block, level: usize) -> String {
    match build_call(ctx, block, level) {
        Some(call) => render(ctx, call, level),
        None => format!("{}// TODO: choose a component\n", ctx.indent(level)),
    }
}

/// Call head without trailing lambda, e.g. `Card(modifier = ...)`
pub fn emit_header(ctx: &mut EmitContext, block: &Block) -> Option<String> {
    let call = build_call(ctx, block, 0)?;
    Some(render_head(ctx, &call.name, &call.args, 0))
}

fn build_call(ctx: &mut EmitContext, block: &Block, level: usize) -> Option<Call> {
    let call = match block.block_type {
        BlockType::Column | BlockType::Row | BlockType::Box => {
            let name = component_name(block.block_type);
            ctx.import(&format!("androidx.compose.foundation.layout.{}", name));
            let mut args = standard_args(block, &[], &["spacing"]);
            if let Some(spacing) = block.property("spacing") {
                let arrangement = match block.block_type {
                    BlockType::Row => "horizontalArrangement",
                    _ => "verticalArrangement",
                };
                args.push(format!("{} = Arrangement.spacedBy({})", arrangement, dp_value(spacing)));
            }
            Call::new(name, args).with_content(children(ctx, &block.children, level + 1))
        }
        BlockType::LazyColumn | BlockType::LazyRow => {
            let name = component_name(block.block_type);
            ctx.import(&format!("androidx.compose.foundation.lazy.{}", name));
            let content = lazy_items(ctx, &block.children, level + 1);
            Call::new(name, standard_args(block, &[], &[])).with_content(content)
        }
        BlockType::Card | BlockType::Surface | BlockType::BottomAppBar | BlockType::NavigationBar => {
            let name = material(ctx, block.block_type);
            Call::new(name, standard_args(block, &[], &[]))
                .with_content(children(ctx, &block.children, level + 1))
        }
        BlockType::Scaffold => scaffold(ctx, block, level),
        BlockType::Text => {
            let name = material(ctx, block.block_type);
            Call::new(name, standard_args(block, &[("text", "\"\"")], &[]))
        }
        BlockType::Button | BlockType::OutlinedButton | BlockType::TextButton => {
            let name = material(ctx, block.block_type);
            let args = standard_args(block, &[("onClick", "{}")], &["text"]);
            let mut content = String::new();
            if let Some(text) = block.property("text") {
                let label = Block::new(BlockType::Text).with_property("text", text.clone());
                content.push_str(&emit_block(ctx, &label, level + 1));
            }
            content.push_str(&children(ctx, &block.children, level + 1));
            Call::new(name, args).with_content(content)
        }
        BlockType::IconButton | BlockType::FloatingActionButton => {
            let name = material(ctx, block.block_type);
            let args = standard_args(block, &[("onClick", "{}")], &["icon"]);
            let mut content = String::new();
            if let Some(icon) = block.property("icon") {
                let icon = Block::new(BlockType::Icon).with_property("imageVector", icon.clone());
                content.push_str(&emit_block(ctx, &icon, level + 1));
            }
            content.push_str(&children(ctx, &block.children, level + 1));
            Call::new(name, args).with_content(content)
        }
        BlockType::TextField | BlockType::OutlinedTextField => {
            let name = material(ctx, block.block_type);
            let mut args = standard_args(
                block,
                &[("value", "\"\""), ("onValueChange", "{}")],
                &["label", "placeholder"],
            );
            for slot in ["label", "placeholder"] {
                if let Some(value) = block.property(slot) {
                    args.push(format!("{} = {}", slot, text_slot(ctx, value)));
                }
            }
            Call::new(name, args)
        }
        BlockType::Switch | BlockType::Checkbox => {
            let name = material(ctx, block.block_type);
            Call::new(
                name,
                standard_args(block, &[("checked", "false"), ("onCheckedChange", "{}")], &[]),
            )
        }
        BlockType::RadioButton => {
            let name = material(ctx, block.block_type);
            Call::new(name, standard_args(block, &[("selected", "false"), ("onClick", "{}")], &[]))
        }
        BlockType::Slider => {
            let name = material(ctx, block.block_type);
            Call::new(name, standard_args(block, &[("value", "0.5f"), ("onValueChange", "{}")], &[]))
        }
        BlockType::Icon => {
            let name = material(ctx, block.block_type);
            Call::new(
                name,
                standard_args(
                    block,
                    &[("imageVector", "Icons.Default.Info"), ("contentDescription", "null")],
                    &[],
                ),
            )
        }
        BlockType::Image => {
            ctx.import("androidx.compose.foundation.Image");
            Call::new(
                "Image",
                standard_args(
                    block,
                    &[
                        ("painter", "painterResource(id = android.R.drawable.ic_menu_gallery)"),
                        ("contentDescription", "null"),
                    ],
                    &[],
                ),
            )
        }
        BlockType::TopAppBar => top_app_bar(ctx, block, level),
        BlockType::NavigationBarItem => {
            let name = material(ctx, block.block_type);
            let mut args = standard_args(
                block,
                &[("selected", "false"), ("onClick", "{}")],
                &["icon", "label"],
            );
            let icon = match block.property("icon") {
                Some(PropertyValue::Icon(icon)) => {
                    ctx.import("androidx.compose.material3.Icon");
                    format!("{{ Icon({}, contentDescription = null) }}", icon)
                }
                Some(other) => other.to_source(),
                None => {
                    ctx.import("androidx.compose.material3.Icon");
                    "{ Icon(Icons.Default.Home, contentDescription = null) }".to_string()
                }
            };
            args.insert(2.min(args.len()), format!("icon = {}", icon));
            if let Some(label) = block.property("label") {
                args.push(format!("label = {}", text_slot(ctx, label)));
            }
            Call::new(name, args)
        }
        BlockType::Spacer => {
            ctx.import("androidx.compose.foundation.layout.Spacer");
            let mut args = standard_args(block, &[], &[]);
            if !args.iter().any(|a| a.starts_with("modifier = ")) {
                args.push("modifier = Modifier.height(8.dp)".to_string());
            }
            Call::new("Spacer", args)
        }
        BlockType::Divider => {
            let name = material(ctx, block.block_type);
            Call::new(name, standard_args(block, &[], &[]))
        }
        BlockType::CustomComponent => {
            let name = block.name.as_deref()?;
            let call = Call::new(name, standard_args(block, &[], &[]));
            if block.children.is_empty() {
                call
            } else {
                call.with_content(children(ctx, &block.children, level + 1))
            }
        }
    };
    Some(call)
}

/// Composable function name for a built-in block type
pub fn component_name(block_type: BlockType) -> &'static str {
    match block_type {
        BlockType::Column => "Column",
        BlockType::Row => "Row",
        BlockType::Box => "Box",
        BlockType::LazyColumn => "LazyColumn",
        BlockType::LazyRow => "LazyRow",
        BlockType::Card => "Card",
        BlockType::Surface => "Surface",
        BlockType::Scaffold => "Scaffold",
        BlockType::Text => "Text",
        BlockType::Button => "Button",
        BlockType::OutlinedButton => "OutlinedButton",
        BlockType::TextButton => "TextButton",
        BlockType::IconButton => "IconButton",
        BlockType::FloatingActionButton => "FloatingActionButton",
        BlockType::TextField => "TextField",
        BlockType::OutlinedTextField => "OutlinedTextField",
        BlockType::Icon => "Icon",
        BlockType::Image => "Image",
        BlockType::TopAppBar => "TopAppBar",
        BlockType::BottomAppBar => "BottomAppBar",
        BlockType::NavigationBar => "NavigationBar",
        BlockType::NavigationBarItem => "NavigationBarItem",
        BlockType::Switch => "Switch",
        BlockType::Checkbox => "Checkbox",
        BlockType::RadioButton => "RadioButton",
        BlockType::Slider => "Slider",
        BlockType::Spacer => "Spacer",
        BlockType::Divider => "HorizontalDivider",
        BlockType::CustomComponent => "",
    }
}

fn material(ctx: &mut EmitContext, block_type: BlockType) -> &'static str {
    let name = component_name(block_type);
    ctx.import(&format!("androidx.compose.material3.{}", name));
    name
}

fn children(ctx: &mut EmitContext, blocks: &[Block], level: usize) -> String {
    blocks.iter().map(|child| emit_block(ctx, child, level)).collect()
}

/// Lazy list children, each wrapped in `item { }` unless it already is a
/// list DSL call
fn lazy_items(ctx: &mut EmitContext, blocks: &[Block], level: usize) -> String {
    let mut out = String::new();
    for child in blocks {
        let is_dsl = child.block_type == BlockType::CustomComponent
            && matches!(child.name.as_deref(), Some("item" | "items" | "itemsIndexed"));
        if is_dsl {
            out.push_str(&emit_block(ctx, child, level));
        } else {
            let indent = ctx.indent(level);
            out.push_str(&format!("{}item {{\n", indent));
            out.push_str(&emit_block(ctx, child, level + 1));
            out.push_str(&format!("{}}}\n", indent));
        }
    }
    out
}

fn top_app_bar(ctx: &mut EmitContext, block: &Block, level: usize) -> Call {
    let name = material(ctx, block.block_type);
    ctx.opt_in(MATERIAL3_OPT_IN.0, MATERIAL3_OPT_IN.1);
    let title = match block.property("title") {
        Some(value) => text_slot(ctx, value),
        None => text_slot(ctx, &PropertyValue::Str("Title".to_string())),
    };
    let mut args = vec![format!("title = {}", title)];
    args.extend(standard_args(block, &[], &["title"]));
    if !block.children.is_empty() {
        args.push(format!(
            "actions = {{\n{}{}}}",
            children(ctx, &block.children, level + 2),
            ctx.indent(level + 1)
        ));
    }
    Call::new(name, args)
}

fn scaffold(ctx: &mut EmitContext, block: &Block, level: usize) -> Call {
    let name = material(ctx, block.block_type);
    let mut args = standard_args(block, &[], &[]);
    let mut body = Vec::new();

    for child in &block.children {
        let slot = match child.block_type {
            BlockType::TopAppBar => Some("topBar"),
            BlockType::BottomAppBar | BlockType::NavigationBar => Some("bottomBar"),
            BlockType::FloatingActionButton => Some("floatingActionButton"),
            _ => None,
        };
        match slot {
            Some(slot) if !args.iter().any(|a| a.starts_with(&format!("{} = ", slot))) => {
                args.push(format!(
                    "{} = {{\n{}{}}}",
                    slot,
                    emit_block(ctx, child, level + 2),
                    ctx.indent(level + 1)
                ));
            }
            _ => body.push(child),
        }
    }

    let mut content = String::new();
    if !body.is_empty() {
        ctx.import("androidx.compose.foundation.layout.Box");
        let indent = ctx.indent(level + 1);
        content.push_str(&format!("{}Box(modifier = Modifier.padding(innerPadding)) {{\n", indent));
        for child in body {
            content.push_str(&emit_block(ctx, child, level + 2));
        }
        content.push_str(&format!("{}}}\n", indent));
    }

    let mut call = Call::new(name, args).with_content(content);
    call.lambda_param = Some("innerPadding");
    call
}

/// Slot lambdas like `label`: text becomes `{ Text("...") }`, other values
/// are kept as written
fn text_slot(ctx: &mut EmitContext, value: &PropertyValue) -> String {
    match value {
        PropertyValue::Str(text) => {
            ctx.import("androidx.compose.material3.Text");
            format!("{{ Text({}) }}", quote_string(text))
        }
        other => other.to_source(),
    }
}

fn dp_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Int(i) => format!("{}.dp", i),
        PropertyValue::Float(f) => PropertyValue::Dimension {
            value: *f,
            unit: DimensionUnit::Dp,
        }
        .to_source(),
        other => other.to_source(),
    }
}

fn positional_index(name: &str) -> Option<usize> {
    name.strip_prefix("arg")?.parse().ok()
}

/// Arguments in call order: positional placeholders, then `leading`
/// parameters (with defaults when unset), then the modifier, then the
/// remaining properties by name. Names in `skip` are left to the caller.
///
/// Placeholders (`arg2`…) are only kept for calls without named leading
/// parameters. After a named argument their slot is unknown, so they are
/// dropped.
fn standard_args(block: &Block, leading: &[(&str, &str)], skip: &[&str]) -> Vec<String> {
    let mut args = Vec::new();

    let mut positional: Vec<(usize, &PropertyValue)> = block
        .properties
        .iter()
        .filter_map(|(name, value)| positional_index(name).map(|i| (i, value)))
        .collect();
    positional.sort_by_key(|(i, _)| *i);
    if leading.is_empty() {
        args.extend(positional.into_iter().map(|(_, value)| value.to_source()));
    }

    for (name, default) in leading {
        let value = block
            .property(name)
            .map(|v| v.to_source())
            .unwrap_or_else(|| default.to_string());
        args.push(format!("{} = {}", name, value));
    }

    if let Some(modifier) = build_modifier(block) {
        args.push(format!("modifier = {}", modifier));
    }

    for (name, value) in &block.properties {
        let handled = positional_index(name).is_some()
            || leading.iter().any(|(l, _)| l == name)
            || skip.contains(&name.as_str())
            || MODIFIER_PROPERTIES.contains(&name.as_str());
        if !handled {
            args.push(format!("{} = {}", name, value.to_source()));
        }
    }

    args
}

/// Modifier expression from layout fields, modifier-like properties and an
/// explicit `modifier` property. `None` when there is nothing to apply.
fn build_modifier(block: &Block) -> Option<String> {
    let mut calls = size_calls(block.width, block.height);

    if let Some(Position { x, y }) = block.position {
        calls.push(ModifierCall::new(
            "offset",
            vec![
                ModifierArgument::named("x", dp_value(&PropertyValue::Float(x as f64))),
                ModifierArgument::named("y", dp_value(&PropertyValue::Float(y as f64))),
            ],
        ));
    }
    if let Some(padding) = block.property("padding") {
        calls.push(ModifierCall::new("padding", vec![ModifierArgument::positional(dp_value(padding))]));
    }
    if let Some(background) = block.property("background") {
        calls.push(ModifierCall::new(
            "background",
            vec![ModifierArgument::positional(background.to_source())],
        ));
    }

    let chain = match block.property("modifier") {
        Some(PropertyValue::Modifier(explicit)) => {
            calls.extend(explicit.calls.iter().cloned());
            ModifierChain {
                receiver: explicit.receiver.clone(),
                calls,
            }
        }
        Some(other) => ModifierChain {
            receiver: other.to_source(),
            calls,
        },
        None if calls.is_empty() => return None,
        None => ModifierChain::new(calls),
    };
    Some(chain.to_source())
}

fn size_calls(width: Option<LayoutSize>, height: Option<LayoutSize>) -> Vec<ModifierCall> {
    let dp = |v: f32| ModifierArgument::positional(dp_value(&PropertyValue::Float(v as f64)));
    match (width, height) {
        (Some(LayoutSize::Fill), Some(LayoutSize::Fill)) => vec![ModifierCall::new("fillMaxSize", vec![])],
        (Some(LayoutSize::Wrap), Some(LayoutSize::Wrap)) => vec![ModifierCall::new("wrapContentSize", vec![])],
        _ => {
            let mut calls = Vec::new();
            match width {
                Some(LayoutSize::Fill) => calls.push(ModifierCall::new("fillMaxWidth", vec![])),
                Some(LayoutSize::Dp(v)) => calls.push(ModifierCall::new("width", vec![dp(v)])),
                Some(LayoutSize::Wrap) => calls.push(ModifierCall::new("wrapContentWidth", vec![])),
                None => {}
            }
            match height {
                Some(LayoutSize::Fill) => calls.push(ModifierCall::new("fillMaxHeight", vec![])),
                Some(LayoutSize::Dp(v)) => calls.push(ModifierCall::new("height", vec![dp(v)])),
                Some(LayoutSize::Wrap) => calls.push(ModifierCall::new("wrapContentHeight", vec![])),
                None => {}
            }
            calls
        }
    }
}

fn render_head(ctx: &EmitContext, name: &str, args: &[String], level: usize) -> String {
    if args.is_empty() {
        return name.to_string();
    }
    let inline = format!("{}({})", name, args.join(", "));
    if !args.iter().any(|a| a.contains('\n')) && ctx.indent(level).len() + inline.len() <= MAX_LINE_WIDTH {
        return inline;
    }

    let inner = ctx.indent(level + 1);
    let mut out = format!("{}(\n", name);
    for arg in args {
        out.push_str(&format!("{}{},\n", inner, arg));
    }
    out.push_str(&ctx.indent(level));
    out.push(')');
    out
}

fn render(ctx: &EmitContext, call: Call, level: usize) -> String {
    let indent = ctx.indent(level);
    let head = render_head(ctx, &call.name, &call.args, level);
    match call.content {
        None if call.args.is_empty() => format!("{}{}()\n", indent, head),
        None => format!("{}{}\n", indent, head),
        Some(content) => {
            let param = call.lambda_param.map(|p| format!(" {} ->", p)).unwrap_or_default();
            if content.is_empty() && param.is_empty() {
                format!("{}{} {{}}\n", indent, head)
            } else {
                format!("{}{} {{{}\n{}{}}}\n", indent, head, param, content, indent)
            }
        }
    }
}
