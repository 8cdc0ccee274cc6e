//! Integration tests for box tree construction and line breaking.

use lumen_dom::{ElementData, NodeId, NodeTree};
use lumen_layout::font::{FontCategory, FontWeight};
use lumen_layout::layout::{InlineLayout, LayoutBox, LayoutOptions, Rect, layout};
use lumen_layout::{FontRequest, FontService, Glyph, LayoutError};

/// Every cluster is 8px wide; ascent is the point size, descent a quarter
/// of it.
struct FixedFontService;

impl FontService for FixedFontService {
    fn glyph(&self, text: &str, request: FontRequest) -> lumen_layout::Result<Glyph> {
        let size = f32::from(request.size);
        Ok(Glyph {
            width: text.chars().count() as f32 * 8.0,
            ascent: size,
            descent: size / 4.0,
        })
    }
}

/// Fails on anything that is not Latin.
struct LatinOnlyFontService;

impl FontService for LatinOnlyFontService {
    fn glyph(&self, text: &str, request: FontRequest) -> lumen_layout::Result<Glyph> {
        match FontCategory::classify(text, request.monospace) {
            Some(FontCategory::Latin | FontCategory::Monospace) => FixedFontService.glyph(text, request),
            Some(category) => Err(LayoutError::NoFontForGlyph {
                cluster: text.to_string(),
                category,
            }),
            None => Err(LayoutError::RenderFailed("empty text".to_string())),
        }
    }
}

/// Helper: viewport `width` wide with no page margins.
fn options(width: f32) -> LayoutOptions {
    LayoutOptions {
        viewport_width: width,
        hstep: 0.0,
        vstep: 0.0,
        ..LayoutOptions::default()
    }
}

/// Helper: element with inline style declarations.
fn element(tree: &mut NodeTree, tag: &str, parent: Option<NodeId>, style: &[(&str, &str)]) -> NodeId {
    let mut data = ElementData::new(tag);
    for (key, value) in style {
        data.style.set(key, value);
    }
    tree.create_element(data, parent)
}

/// Helper: `<body><p>text</p></body>`, returning `(tree, body, p)`.
fn paragraph(text: &str) -> (NodeTree, NodeId, NodeId) {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let p = element(&mut tree, "p", Some(body), &[]);
    let _ = tree.create_text(text, Some(p));
    (tree, body, p)
}

fn lines(document: &LayoutBox) -> Vec<&LayoutBox> {
    document
        .descendants()
        .into_iter()
        .filter(|b| matches!(b, LayoutBox::Line(_)))
        .collect()
}

fn texts(document: &LayoutBox) -> Vec<(String, Rect)> {
    document
        .descendants()
        .into_iter()
        .filter_map(|b| match b {
            LayoutBox::Text(text) => Some((text.text.clone(), text.bounds)),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Box tree shape
// ---------------------------------------------------------------------------

#[test]
fn test_document_box_sits_inside_page_margins() {
    let (tree, body, _) = paragraph("Hello");
    let result = layout(&tree, body, &FixedFontService, &LayoutOptions::default()).unwrap();
    let bounds = result.document.bounds();
    assert_eq!(bounds.x, 13.0);
    assert_eq!(bounds.y, 18.0);
    assert_eq!(bounds.width, 774.0);
    assert_eq!(result.document.kind(), "document");
    assert_eq!(result.document.children().len(), 1);
}

#[test]
fn test_empty_element_is_zero_height_block() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let div = element(&mut tree, "div", Some(body), &[]);
    let p = element(&mut tree, "p", Some(body), &[]);
    let _ = tree.create_text("after", Some(p));

    let result = layout(&tree, body, &FixedFontService, &options(500.0)).unwrap();
    let body_box = &result.document.children()[0];
    assert_eq!(body_box.kind(), "block");
    let div_box = &body_box.children()[0];
    assert_eq!(div_box.node(), div);
    assert_eq!(div_box.kind(), "block");
    assert_eq!(div_box.bounds().height, 0.0);
    assert!(div_box.children().is_empty());

    let p_box = &body_box.children()[1];
    assert_eq!(p_box.bounds().y, 0.0);
}

#[test]
fn test_blocks_stack_vertically() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    for word in ["one", "two", "three"] {
        let p = element(&mut tree, "p", Some(body), &[]);
        let _ = tree.create_text(word, Some(p));
    }

    let result = layout(&tree, body, &FixedFontService, &options(500.0)).unwrap();
    let body_box = &result.document.children()[0];
    let mut expected_y = 0.0;
    for child in body_box.children() {
        assert_eq!(child.bounds().y, expected_y);
        assert_eq!(child.bounds().width, 500.0);
        expected_y += child.bounds().height;
    }
    assert_eq!(body_box.bounds().height, expected_y);
    assert_eq!(result.document.bounds().height, expected_y);
}

#[test]
fn test_hidden_elements_generate_no_boxes() {
    let mut tree = NodeTree::new();
    let html = element(&mut tree, "html", None, &[]);
    let head = element(&mut tree, "head", Some(html), &[]);
    let title = element(&mut tree, "title", Some(head), &[]);
    let _ = tree.create_text("Title", Some(title));
    let body = element(&mut tree, "body", Some(html), &[]);
    let p = element(&mut tree, "p", Some(body), &[]);
    let _ = tree.create_text("visible", Some(p));

    let result = layout(&tree, html, &FixedFontService, &options(500.0)).unwrap();
    let words: Vec<String> = texts(&result.document).into_iter().map(|(t, _)| t).collect();
    assert_eq!(words, vec!["visible"]);
}

// ---------------------------------------------------------------------------
// Line breaking
// ---------------------------------------------------------------------------

#[test]
fn test_two_words_fit_on_one_line() {
    let (tree, _, p) = paragraph("Hello World");
    let mut inline = InlineLayout::new(&FixedFontService, &tree, p, (0.0, 500.0), 0.0, false);
    let style = lumen_layout::StyleSnapshot::initial(12);
    let mut hits = lumen_layout::layout::HitTestCollector::new();

    inline.add_word("Hello", &style, p, &mut hits).unwrap();
    inline.add_space(&style).unwrap();
    inline.add_word("World", &style, p, &mut hits).unwrap();
    assert!(inline.cursor() <= 500.0);

    let (lines, _) = inline.finish(&mut hits).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].children().len(), 2);
    assert_eq!(lines[0].children()[0].bounds().width, 40.0);
    assert_eq!(lines[0].children()[1].bounds().x, 48.0);
}

#[test]
fn test_words_wrap_within_line_width() {
    let (tree, body, _) =
        paragraph("the quick brown fox jumps over the lazy dog and keeps running far away");
    let result = layout(&tree, body, &FixedFontService, &options(120.0)).unwrap();

    let lines = lines(&result.document);
    assert!(lines.len() > 1);
    for line in lines {
        let line_right = line.bounds().right();
        let children = line.children();
        if children.len() == 1 {
            continue;
        }
        for child in children {
            assert!(child.bounds().right() <= line_right);
        }
    }
}

#[test]
fn test_oversized_word_is_placed_alone() {
    let (tree, body, _) = paragraph("a extraordinarily b");
    let result = layout(&tree, body, &FixedFontService, &options(40.0)).unwrap();

    let words: Vec<Vec<String>> = lines(&result.document)
        .into_iter()
        .map(|line| {
            line.children()
                .iter()
                .filter_map(|c| match c {
                    LayoutBox::Text(t) => Some(t.text.clone()),
                    _ => None,
                })
                .collect()
        })
        .collect();
    assert_eq!(
        words,
        vec![
            vec!["a".to_string()],
            vec!["extraordinarily".to_string()],
            vec!["b".to_string()]
        ]
    );
}

#[test]
fn test_cjk_breaks_between_clusters() {
    let (tree, body, _) = paragraph("中文字");
    let result = layout(&tree, body, &FixedFontService, &options(20.0)).unwrap();
    let lines = lines(&result.document);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].children().len(), 2);
    assert_eq!(lines[1].children().len(), 1);
}

#[test]
fn test_soft_hyphen_breaks_with_visible_hyphen() {
    let (tree, body, _) = paragraph("aaaa\u{AD}bbbb");
    let result = layout(&tree, body, &FixedFontService, &options(60.0)).unwrap();
    let words: Vec<String> = texts(&result.document).into_iter().map(|(t, _)| t).collect();
    assert_eq!(words, vec!["aaaa-", "bbbb"]);
}

#[test]
fn test_unbroken_soft_hyphen_is_invisible() {
    let (tree, body, _) = paragraph("co&shy;operate");
    let result = layout(&tree, body, &FixedFontService, &options(500.0)).unwrap();
    let words: Vec<String> = texts(&result.document).into_iter().map(|(t, _)| t).collect();
    assert_eq!(words, vec!["cooperate"]);
}

#[test]
fn test_line_advances_by_glyph_height_plus_leading() {
    let (tree, body, _) = paragraph("aaaa bbbb");
    let result = layout(&tree, body, &FixedFontService, &options(40.0)).unwrap();
    let lines = lines(&result.document);
    assert_eq!(lines.len(), 2);
    // ascent 12 + descent 3, plus 25%.
    assert_eq!(lines[0].bounds().height, 18.75);
    assert_eq!(lines[1].bounds().y, 18.75);
}

// ---------------------------------------------------------------------------
// Baselines
// ---------------------------------------------------------------------------

#[test]
fn test_glyphs_share_the_line_baseline() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let p = element(&mut tree, "p", Some(body), &[]);
    let _ = tree.create_text("small ", Some(p));
    let span = element(&mut tree, "span", Some(p), &[("font-size", "32px")]);
    let _ = tree.create_text("Big", Some(span));
    let _ = tree.create_text(" text", Some(p));

    let result = layout(&tree, body, &FixedFontService, &options(500.0)).unwrap();
    for line in lines(&result.document) {
        let LayoutBox::Line(line) = line else { unreachable!() };
        assert_eq!(line.children.len(), 3);
        for child in &line.children {
            let LayoutBox::Text(text) = child else { continue };
            assert!((text.bounds.y + text.ascent - line.baseline).abs() < 1e-4);
        }
        // The 24pt span sets the baseline.
        assert_eq!(line.baseline, line.bounds.y + 24.0);
    }
}

#[test]
fn test_superscript_sits_at_line_top() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let p = element(&mut tree, "p", Some(body), &[]);
    let _ = tree.create_text("x", Some(p));
    let sup = element(&mut tree, "sup", Some(p), &[]);
    let _ = tree.create_text("2", Some(sup));

    let result = layout(&tree, body, &FixedFontService, &options(500.0)).unwrap();
    let lines = lines(&result.document);
    let LayoutBox::Line(line) = lines[0] else { unreachable!() };
    let LayoutBox::Text(base) = &line.children[0] else { unreachable!() };
    let LayoutBox::Text(raised) = &line.children[1] else { unreachable!() };

    assert!(!base.superscript);
    assert!(raised.superscript);
    assert_eq!(raised.font.size, 6);
    assert_eq!(raised.bounds.y, line.bounds.y);
    assert_eq!(line.baseline, line.bounds.y + 12.0);
}

// ---------------------------------------------------------------------------
// Style inheritance
// ---------------------------------------------------------------------------

#[test]
fn test_style_does_not_leak_into_siblings() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let p = element(&mut tree, "p", Some(body), &[]);
    let b = element(&mut tree, "b", Some(p), &[("font-weight", "bold"), ("color", "red")]);
    let _ = tree.create_text("bold", Some(b));
    let _ = tree.create_text("plain", Some(p));

    let result = layout(&tree, body, &FixedFontService, &options(500.0)).unwrap();
    let boxes: Vec<_> = result
        .document
        .descendants()
        .into_iter()
        .filter_map(|b| match b {
            LayoutBox::Text(t) => Some(t.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(boxes[0].font.weight, FontWeight::Bold);
    assert_eq!(boxes[0].color, lumen_layout::Color::rgb(255, 0, 0));
    assert_eq!(boxes[1].font.weight, FontWeight::Normal);
    assert_eq!(boxes[1].color, lumen_layout::Color::BLACK);
}

#[test]
fn test_preformatted_text_keeps_spaces_and_newlines() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let pre = element(&mut tree, "pre", Some(body), &[]);
    let _ = tree.create_text("a  b\nc", Some(pre));

    let result = layout(&tree, body, &FixedFontService, &options(500.0)).unwrap();
    let lines = lines(&result.document);
    assert_eq!(lines.len(), 2);
    let placed = texts(&result.document);
    assert_eq!(placed[0].0, "a");
    assert_eq!(placed[1].0, "b");
    assert_eq!(placed[1].1.x, 24.0);
    let LayoutBox::Text(first) = &lines[0].children()[0] else { unreachable!() };
    assert!(first.font.monospace);
}

#[test]
fn test_br_on_empty_line_emits_blank_line() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let p = element(&mut tree, "p", Some(body), &[]);
    let _ = element(&mut tree, "br", Some(p), &[]);
    let _ = tree.create_text("x", Some(p));

    let result = layout(&tree, body, &FixedFontService, &options(500.0)).unwrap();
    let lines = lines(&result.document);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].children().is_empty());
    assert_eq!(lines[0].bounds().height, 18.75);
    assert_eq!(lines[1].children()[0].bounds().y, 18.75);
}

#[test]
fn test_right_to_left_lines_start_at_right_edge() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let mut div_data = ElementData::new("div");
    let _ = div_data.attrs.insert("dir".to_string(), "rtl".to_string());
    let div = tree.create_element(div_data, Some(body));
    let p = element(&mut tree, "p", Some(div), &[]);
    let _ = tree.create_text("ab cd", Some(p));

    let result = layout(&tree, body, &FixedFontService, &options(100.0)).unwrap();
    let placed = texts(&result.document);
    assert_eq!(placed[0].0, "ab");
    assert_eq!(placed[0].1.right(), 100.0);
    assert_eq!(placed[1].0, "cd");
    assert_eq!(placed[1].1.right(), 76.0);
    for (_, rect) in placed {
        assert!(rect.x >= 0.0);
    }
}

#[test]
fn test_right_to_left_wrapped_lines_stay_inside_the_block() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let mut p_data = ElementData::new("p");
    let _ = p_data.attrs.insert("dir".to_string(), "rtl".to_string());
    let p = tree.create_element(p_data, Some(body));
    let _ = tree.create_text("the quick brown fox jumps over the lazy dog", Some(p));

    let result = layout(&tree, body, &FixedFontService, &options(100.0)).unwrap();
    let lines = lines(&result.document);
    assert_eq!(lines.len(), 4);
    for line in lines {
        let (line_left, line_right) = (line.bounds().x, line.bounds().right());
        let children = line.children();
        // Every line restarts at the right edge.
        assert_eq!(children[0].bounds().right(), line_right);
        if children.len() == 1 {
            continue;
        }
        for child in children {
            assert!(child.bounds().x >= line_left);
            assert!(child.bounds().right() <= line_right);
        }
    }
}

#[test]
fn test_title_heading_is_centered() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let mut h1 = ElementData::new("h1");
    let _ = h1.attrs.insert("class".to_string(), "title".to_string());
    let h1 = tree.create_element(h1, Some(body));
    let _ = tree.create_text("ab", Some(h1));

    let result = layout(&tree, body, &FixedFontService, &options(100.0)).unwrap();
    let placed = texts(&result.document);
    assert_eq!(placed[0].1.x, 42.0);
}

#[test]
fn test_list_item_gets_bullet_and_indent() {
    let mut tree = NodeTree::new();
    let ul = element(&mut tree, "ul", None, &[]);
    let li = element(&mut tree, "li", Some(ul), &[]);
    let _ = tree.create_text("item", Some(li));

    let result = layout(&tree, ul, &FixedFontService, &options(200.0)).unwrap();
    let li_box = &result.document.children()[0].children()[0];
    let LayoutBox::Block(block) = li_box else { unreachable!() };
    assert_eq!(block.display_items.len(), 1);
    assert_eq!(texts(&result.document)[0].1.x, 16.0);
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

#[test]
fn test_wrapped_anchor_yields_one_merged_bounds_entry() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let p = element(&mut tree, "p", Some(body), &[]);
    let _ = tree.create_text("aaaa ", Some(p));
    let a = element(&mut tree, "a", Some(p), &[]);
    let _ = tree.create_text("bbbb cccc", Some(a));

    let result = layout(&tree, body, &FixedFontService, &options(100.0)).unwrap();
    assert_eq!(lines(&result.document).len(), 2);
    assert_eq!(result.link_bounds.len(), 1);
    assert_eq!(
        result.link_bounds.get(&a),
        Some(&Rect::new(0.0, 0.0, 72.0, 33.75))
    );
}

#[test]
fn test_link_bounds_follow_transform_offset() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let p = element(&mut tree, "p", Some(body), &[("transform", "translate(10px, 5px)")]);
    let a = element(&mut tree, "a", Some(p), &[]);
    let _ = tree.create_text("go", Some(a));

    let result = layout(&tree, body, &FixedFontService, &options(100.0)).unwrap();
    let glyph = texts(&result.document)[0].1;
    assert_eq!(result.link_bounds.get(&a), Some(&glyph.translate(10.0, 5.0)));
}

#[test]
fn test_inputs_record_widget_bounds() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let form = element(&mut tree, "form", Some(body), &[]);
    let p = element(&mut tree, "p", Some(form), &[]);
    let mut input = ElementData::new("input");
    let _ = input.attrs.insert("value".to_string(), "hi".to_string());
    input.is_focused = true;
    let input = tree.create_element(input, Some(p));
    let button = element(&mut tree, "button", Some(p), &[]);
    let _ = tree.create_text("Go", Some(button));

    let result = layout(&tree, body, &FixedFontService, &options(500.0)).unwrap();
    assert_eq!(result.input_bounds.len(), 2);
    let input_rect = result.input_bounds[&input];
    assert_eq!(input_rect.width, 200.0);
    assert_eq!(input_rect.x, 0.0);
    assert_eq!(result.input_bounds[&button].x, 208.0);

    let inputs: Vec<_> = result
        .document
        .descendants()
        .into_iter()
        .filter_map(|b| match b {
            LayoutBox::Input(i) => Some(i.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(inputs[0].text, "hi");
    assert!(inputs[0].focused);
    assert_eq!(inputs[0].text_width, 16.0);
    assert_eq!(inputs[1].text, "Go");
}

// ---------------------------------------------------------------------------
// Passes and errors
// ---------------------------------------------------------------------------

#[test]
fn test_layout_is_idempotent() {
    let mut tree = NodeTree::new();
    let body = element(&mut tree, "body", None, &[]);
    let p = element(&mut tree, "p", Some(body), &[("opacity", "0.5")]);
    let _ = tree.create_text("some words that wrap around the line", Some(p));
    let a = element(&mut tree, "a", Some(p), &[]);
    let _ = tree.create_text("link", Some(a));

    let first = layout(&tree, body, &FixedFontService, &options(100.0)).unwrap();
    let second = layout(&tree, body, &FixedFontService, &options(100.0)).unwrap();
    assert_eq!(first.document, second.document);
    assert_eq!(first.link_bounds, second.link_bounds);

    let painter = lumen_layout::Painter::new(&tree);
    assert_eq!(
        painter.paint(&first.document).unwrap(),
        painter.paint(&second.document).unwrap()
    );
}

#[test]
fn test_missing_font_aborts_the_pass() {
    let (tree, body, _) = paragraph("hello 世界");
    let err = layout(&tree, body, &LatinOnlyFontService, &options(500.0)).unwrap_err();
    match err {
        LayoutError::NoFontForGlyph { cluster, category } => {
            assert_eq!(cluster, "世");
            assert_eq!(category, FontCategory::Cjk);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_root_is_an_error() {
    let tree = NodeTree::new();
    let err = layout(&tree, NodeId(3), &FixedFontService, &options(500.0)).unwrap_err();
    assert!(matches!(err, LayoutError::UnknownNode(NodeId(3))));
}
