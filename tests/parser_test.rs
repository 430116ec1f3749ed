use anyhow::Result;
use std::fs;

use compose_sync::designer::lexer::{extract_function_body, find_matching};
use compose_sync::designer::model::{ComponentType, DimensionUnit, PropertyValue};
use compose_sync::designer::parse_file;

fn profile_screen() -> Result<String> {
    Ok(fs::read_to_string("tests/fixtures/ProfileScreen.kt")?)
}

#[test]
fn test_parse_profile_screen() -> Result<()> {
    let source = profile_screen()?;
    let file = parse_file(&source, "ProfileScreen.kt");

    assert_eq!(file.package_name.as_deref(), Some("com.example.profile"));
    assert_eq!(file.imports.len(), 10);
    assert!(file.errors.is_empty(), "{:?}", file.errors);

    // formatName is not a composable
    let names: Vec<&str> = file.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["ProfileScreen", "ProfileScreenPreview"]);

    let screen = file.function("ProfileScreen").expect("ProfileScreen");
    assert_eq!(screen.parameters.len(), 2);
    assert_eq!(screen.parameters[1].param_type, "() -> Unit");
    assert_eq!(screen.parameters[1].default_value.as_deref(), Some("{}"));
    assert!(!screen.is_preview());

    let column = screen.body.as_ref().expect("body");
    assert_eq!(column.component_type, ComponentType::Column);
    let padding = column.modifier().and_then(|m| m.call("padding")).expect("padding");
    assert_eq!(padding.arguments[0].value, "16.dp");

    // The `if` block is not descended into
    let ids: Vec<&str> = column.descendants().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "0.0", "0.1", "0.2", "0.2.0", "0.2.1"]);

    let title = screen.find_node("0.0").expect("title");
    assert_eq!(
        title.property("text").map(|p| &p.value),
        Some(&PropertyValue::Str("Hello, $name!".to_string()))
    );
    assert_eq!(
        title.property("fontSize").map(|p| &p.value),
        Some(&PropertyValue::Dimension { value: 20.0, unit: DimensionUnit::Sp })
    );

    let icon = screen.find_node("0.2.0").expect("icon");
    assert_eq!(icon.component_type, ComponentType::Icon);
    assert_eq!(
        icon.property("imageVector").map(|p| &p.value),
        Some(&PropertyValue::Icon("Icons.Default.Edit".to_string()))
    );
    assert_eq!(column.find_parent_of("0.2.1").map(|n| n.id.as_str()), Some("0.2"));

    Ok(())
}

#[test]
fn test_preview_metadata() -> Result<()> {
    let source = profile_screen()?;
    let file = parse_file(&source, "ProfileScreen.kt");

    let previews: Vec<_> = file.previews().collect();
    assert_eq!(previews.len(), 1);
    let preview = previews[0].preview.as_ref().expect("metadata");
    assert_eq!(preview.name().as_deref(), Some("Profile"));
    assert!(preview.show_background());
    assert!(!preview.show_system_ui());
    assert_eq!(preview.width_dp(), Some(360));
    assert_eq!(preview.height_dp(), None);

    let body = previews[0].body.as_ref().expect("body");
    assert_eq!(body.component_type, ComponentType::Custom("ProfileScreen".to_string()));
    Ok(())
}

#[test]
fn test_source_ranges_match_text() -> Result<()> {
    let source = profile_screen()?;
    let file = parse_file(&source, "ProfileScreen.kt");
    let screen = file.function("ProfileScreen").expect("ProfileScreen");

    let spacer = screen.find_node("0.1").expect("spacer");
    let range = spacer.source_range.expect("range");
    assert_eq!(range.text(&source), "Spacer(modifier = Modifier.height(8.dp))");
    assert_eq!(range.start_line, 18);
    assert_eq!(range.start_column, 9);

    let button = screen.find_node("0.2").expect("button");
    let text = button.source_range.expect("range").text(&source);
    assert!(text.starts_with("Button(onClick = onEdit) {"));
    assert!(text.ends_with('}'));
    Ok(())
}

#[test]
fn test_parse_errors_are_collected() {
    let source = "@Composable\nfun Broken() {\n    Column {\n        Text(\"a\"\n    }\n}\n\n@Composable\nfun Fine() {\n    Text(\"ok\")\n}\n";
    let file = parse_file(source, "Broken.kt");

    assert!(!file.errors.is_empty());
    assert!(file.errors.iter().all(|e| e.line > 0 && e.column > 0));

    // Parsing continues past the broken function
    let fine = file.function("Fine").expect("Fine");
    assert_eq!(fine.body.as_ref().map(|b| b.component_type.clone()), Some(ComponentType::Text));
}

#[test]
fn test_multiple_top_level_components_reported() {
    let source = "@Composable\nfun Two() {\n    Text(\"a\")\n    Text(\"b\")\n}\n";
    let file = parse_file(source, "Two.kt");
    let body = file.function("Two").and_then(|f| f.body.as_ref()).expect("body");
    assert_eq!(body.property("text").map(|p| &p.value), Some(&PropertyValue::Str("a".to_string())));
    assert_eq!(file.errors.len(), 1);
    assert_eq!(file.errors[0].line, 4);
}

#[test]
fn test_scanners_skip_strings_and_comments() {
    let source = "fun f() { val s = \"}\" /* } */ }";
    let open = source.find('{').expect("brace");
    assert_eq!(find_matching(source, open), Some(source.len() - 1));
    assert_eq!(extract_function_body(source, 0), " val s = \"}\" /* } */ ");
    assert_eq!(extract_function_body("fun f() { {", 0), "");
}
