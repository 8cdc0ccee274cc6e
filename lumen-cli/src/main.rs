//! Lumen CLI
//!
//! Lays out and paints a node tree described as JSON, then prints the box
//! tree, the display list and the hit-test tables.
//!
//! A node is either a string (a text node) or an object:
//!
//! ```json
//! {
//!   "tag": "div",
//!   "attrs": { "href": "/next" },
//!   "style": { "opacity": "0.5" },
//!   "focused": false,
//!   "animations": { "opacity": { "from": 0.0, "to": 1.0, "frames": 10 } },
//!   "children": ["Hello ", { "tag": "b", "children": ["world"] }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use lumen_browser::{FontdueFontService, Page, RenderOutput};
use lumen_common::warning::{recorded_warnings, warn_once};
use lumen_dom::{ElementData, NodeId, NodeTree, NumericAnimation};
use lumen_layout::layout::BoundsTable;
use lumen_layout::{
    ApproximateFontService, DisplayCommand, FontService, LayoutBox, LayoutOptions, Rect,
};
use owo_colors::OwoColorize;
use serde::Deserialize;

/// Lumen: inspect layout and paint output for a node tree
#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the display list for a page
    lumen page.json

    # Print the box tree as well
    lumen --boxes page.json

    # Lay out an inline tree in a narrow viewport
    lumen --width 200 --tree '{"tag":"p","children":["Hello world"]}'

    # Machine-readable output with hit-test tables
    lumen --json --bounds page.json

    # Render the third frame of the page's animations
    lumen --frames 2 page.json
"#)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Path to a JSON node tree
    #[arg(value_name = "FILE")]
    path: Option<PathBuf>,

    /// Parse a JSON node tree given inline instead of a file
    #[arg(long, value_name = "JSON")]
    tree: Option<String>,

    /// Viewport width in pixels
    #[arg(long, default_value = "800")]
    width: f32,

    /// Viewport height in pixels
    #[arg(long, default_value = "600")]
    height: f32,

    /// Vertical scroll offset in pixels
    #[arg(long, default_value = "0")]
    scroll: f32,

    /// Print the box tree with its geometry
    #[arg(long)]
    boxes: bool,

    /// Print the link and input rectangles
    #[arg(long)]
    bounds: bool,

    /// Emit JSON instead of the human-readable listing
    #[arg(long)]
    json: bool,

    /// Measure text with fixed per-character advances instead of system fonts
    #[arg(long)]
    approximate_fonts: bool,

    /// Step the page's animations this many frames before rendering
    #[arg(long, default_value = "0")]
    frames: u32,
}

/// A node as written in the input file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonNode {
    Text(String),
    Element(JsonElement),
}

#[derive(Debug, Deserialize)]
struct JsonElement {
    tag: String,
    #[serde(default)]
    attrs: HashMap<String, String>,
    #[serde(default)]
    style: HashMap<String, String>,
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    animations: HashMap<String, JsonAnimation>,
    #[serde(default)]
    children: Vec<JsonNode>,
}

#[derive(Debug, Deserialize)]
struct JsonAnimation {
    from: f64,
    to: f64,
    frames: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let source = load_source(&cli)?;
    let (tree, root) = parse_tree(&source)?;

    let mut page = Page::new(tree, root, font_service(cli.approximate_fonts));
    for _ in 0..cli.frames {
        if !page.advance_animations() {
            break;
        }
    }

    let options = LayoutOptions {
        viewport_width: cli.width,
        viewport_height: cli.height,
        scroll_y: cli.scroll,
        ..LayoutOptions::default()
    };
    let output = page.render(&options)?;

    if cli.json {
        print_json(&cli, &output)?;
        return Ok(());
    }

    if cli.boxes {
        println!("{}", "=== Box Tree ===".bold());
        print_layout_box(&output.document, 0, page.tree());
        println!();
    }

    println!("{}", "=== Display List ===".bold());
    for command in output.display_list.commands() {
        print_command(command, 0);
    }
    println!("\n{} {:.1}", "content height:".bold(), output.content_height);

    if cli.bounds {
        println!("\n{}", "=== Links ===".bold());
        print_bounds(&output.link_bounds, page.tree());
        println!("\n{}", "=== Inputs ===".bold());
        print_bounds(&output.input_bounds, page.tree());
    }

    let warnings = recorded_warnings();
    if !warnings.is_empty() {
        println!("\n{}", "=== Warnings ===".bold());
        for warning in warnings {
            println!("{}", warning.yellow());
        }
    }

    Ok(())
}

/// Read the node tree source from the CLI arguments.
fn load_source(cli: &Cli) -> Result<String> {
    if let Some(ref json) = cli.tree {
        Ok(json.clone())
    } else if let Some(ref path) = cli.path {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    } else {
        bail!("no input: pass a FILE or --tree '<json>'")
    }
}

/// Parse `source` into a node tree, returning the tree and its root.
fn parse_tree(source: &str) -> Result<(NodeTree, NodeId)> {
    let node: JsonNode = serde_json::from_str(source).context("invalid node tree JSON")?;
    let mut tree = NodeTree::new();
    let root = build_node(&mut tree, &node, None);
    Ok((tree, root))
}

fn build_node(tree: &mut NodeTree, node: &JsonNode, parent: Option<NodeId>) -> NodeId {
    match node {
        JsonNode::Text(text) => tree.create_text(text, parent),
        JsonNode::Element(element) => {
            let mut data = ElementData::new(&element.tag);
            data.attrs.clone_from(&element.attrs);
            for (key, value) in &element.style {
                data.style.set(key, value);
            }
            data.is_focused = element.focused;
            for (property, animation) in &element.animations {
                let animation = if property == "opacity" {
                    NumericAnimation::opacity(animation.from, animation.to, animation.frames)
                } else {
                    NumericAnimation::new(animation.from, animation.to, animation.frames)
                };
                let _ = data.animations.insert(property.clone(), animation);
            }

            let id = tree.create_element(data, parent);
            for child in &element.children {
                let _ = build_node(tree, child, Some(id));
            }
            id
        }
    }
}

/// System fonts when any are installed, fixed advances otherwise.
fn font_service(approximate: bool) -> Box<dyn FontService> {
    if approximate {
        return Box::new(ApproximateFontService);
    }
    let service = FontdueFontService::load_system();
    if service.face_count() == 0 {
        warn_once("Fonts", "no system fonts found, using approximate metrics");
        return Box::new(ApproximateFontService);
    }
    Box::new(service)
}

fn print_json(cli: &Cli, output: &RenderOutput) -> Result<()> {
    let mut value = serde_json::json!({
        "content_height": output.content_height,
        "display_list": output.display_list,
    });
    if cli.boxes {
        value["document"] = serde_json::to_value(&output.document)?;
    }
    if cli.bounds {
        value["link_bounds"] = serde_json::to_value(sorted_bounds(&output.link_bounds))?;
        value["input_bounds"] = serde_json::to_value(sorted_bounds(&output.input_bounds))?;
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Bounds keyed by raw node index, in node order.
fn sorted_bounds(table: &BoundsTable) -> BTreeMap<usize, Rect> {
    table.iter().map(|(node, rect)| (node.0, *rect)).collect()
}

fn print_layout_box(layout_box: &LayoutBox, depth: usize, tree: &NodeTree) {
    let indent = "  ".repeat(depth);
    let bounds = layout_box.bounds();
    let node = layout_box.node();

    let name = match layout_box {
        LayoutBox::Text(text) => format!("Text({:?})", preview(&text.text)),
        LayoutBox::Input(input) => format!("Input({:?}) ({node:?})", preview(&input.text)),
        _ => tree
            .tag_name(node)
            .map_or_else(|| format!("{node:?}"), |tag| format!("<{tag}> ({node:?})")),
    };

    println!("{}[{}] {}", indent, layout_box.kind().cyan(), name);
    println!("{}  {}", indent, format_rect(&bounds));

    for child in layout_box.children() {
        print_layout_box(child, depth + 1, tree);
    }
}

fn print_command(command: &DisplayCommand, depth: usize) {
    let indent = "  ".repeat(depth);
    let kind_name = command.kind();
    let kind = kind_name.green();

    match command {
        DisplayCommand::Glyph {
            x, y, text, color, ..
        } => println!(
            "{indent}{kind} x={x:.1} y={y:.1} {:?} {}",
            preview(text),
            color.to_hex_string()
        ),
        DisplayCommand::Rect { rect, color } => {
            println!("{indent}{kind} {} {}", format_rect(rect), color.to_hex_string());
        }
        DisplayCommand::RoundedRect {
            rect,
            radius,
            color,
        } => println!(
            "{indent}{kind} {} r={radius:.1} {}",
            format_rect(rect),
            color.to_hex_string()
        ),
        DisplayCommand::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            thickness,
        } => println!(
            "{indent}{kind} ({x1:.1}, {y1:.1}) -> ({x2:.1}, {y2:.1}) t={thickness:.1} {}",
            color.to_hex_string()
        ),
        DisplayCommand::Blend {
            opacity,
            blend_mode,
            needs_compositing,
            node,
            ..
        } => println!(
            "{indent}{kind} opacity={opacity:.2} mode={} compositing={needs_compositing} node={node:?}",
            blend_mode.as_deref().unwrap_or("normal")
        ),
        DisplayCommand::Transform { dx, dy, node, .. } => {
            println!("{indent}{kind} dx={dx} dy={dy} node={node:?}");
        }
    }

    for child in command.children() {
        print_command(child, depth + 1);
    }
}

fn print_bounds(table: &BoundsTable, tree: &NodeTree) {
    if table.is_empty() {
        println!("  (none)");
        return;
    }
    for (node, rect) in sorted_bounds(table) {
        let id = NodeId(node);
        let target = tree
            .as_element(id)
            .and_then(|element| element.attrs.get("href"))
            .map_or_else(String::new, |href| format!(" -> {href}"));
        println!("  {id:?} {}{target}", format_rect(&rect));
    }
}

fn format_rect(rect: &Rect) -> String {
    format!(
        "x={:.1} y={:.1} w={:.1} h={:.1}",
        rect.x, rect.y, rect.width, rect.height
    )
}

fn preview(text: &str) -> String {
    let short: String = text.chars().take(30).collect();
    if short.len() < text.len() {
        format!("{short}...")
    } else {
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree_builds_elements_and_text() {
        let (tree, root) = parse_tree(
            r#"{"tag":"body","children":[{"tag":"p","style":{"color":"red"},"children":["Hi"]}]}"#,
        )
        .unwrap();
        assert_eq!(tree.tag_name(root), Some("body"));
        let p = tree.children(root)[0];
        assert_eq!(tree.as_element(p).unwrap().style.get("color"), Some("red"));
        assert_eq!(tree.text_content(p), "Hi");
    }

    #[test]
    fn test_parse_tree_reads_animations() {
        let (tree, root) = parse_tree(
            r#"{"tag":"div","animations":{"opacity":{"from":0.0,"to":1.0,"frames":4}}}"#,
        )
        .unwrap();
        let element = tree.as_element(root).unwrap();
        assert_eq!(element.animated_value("opacity"), Some(0.0));
    }

    #[test]
    fn test_parse_tree_rejects_malformed_json() {
        assert!(parse_tree("{\"tag\":").is_err());
    }

    #[test]
    fn test_preview_truncates_long_text() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"x".repeat(40)), format!("{}...", "x".repeat(30)));
    }
}
