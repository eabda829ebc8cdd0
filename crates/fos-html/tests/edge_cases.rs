//! Edge case and stress tests for fos-html
//!
//! Tests rare template shapes, malformed markup, and stress conditions.

use fos_dom::DomTree;
use fos_html::{TemplateError, TreeBuilder};

// ============================================================================
// EMPTY AND MINIMAL INPUT
// ============================================================================

#[test]
fn test_build_only_whitespace() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, "   \t\n\r\n   ").unwrap();
    assert_eq!(tree.tag_name(node), Some("span"));
    assert_eq!(tree.child_count(node), 0);
}

#[test]
fn test_build_only_doctype() {
    let mut tree = DomTree::new();
    assert!(fos_html::build(&mut tree, "<!DOCTYPE html>").is_err());
}

#[test]
fn test_build_only_comment() {
    let mut tree = DomTree::new();
    let result = TreeBuilder::new().build_all(&mut tree, "<!-- just a comment -->");
    assert!(matches!(result, Err(TemplateError::Malformed { .. })));
}

#[test]
fn test_build_null_bytes() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, "Hello\0World").unwrap();
    assert!(tree.text(node).unwrap().starts_with("Hello"));
}

#[test]
fn test_leading_comment_is_skipped() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, "<div><!-- c --></div>").unwrap();
    assert_eq!(tree.tag_name(node), Some("div"));
    assert_eq!(tree.child_count(node), 0);
}

// ============================================================================
// WHITESPACE
// ============================================================================

#[test]
fn test_line_breaks_and_indentation_removed() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, "<div>\n    <p>a</p>\n    <p>b</p>\n</div>").unwrap();
    assert_eq!(tree.child_count(node), 2);
}

#[test]
fn test_inline_whitespace_text_kept() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, "<div> <span>x</span></div>").unwrap();
    let children = tree.children(node).to_vec();
    assert_eq!(children.len(), 2);
    assert_eq!(tree.text(children[0]), Some(" "));
}

#[test]
fn test_text_spanning_lines_is_joined() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, "<p>\n  hello\n  world\n</p>").unwrap();
    assert_eq!(tree.text_content(node), "helloworld");
}

// ============================================================================
// MALFORMED MARKUP
// ============================================================================

#[test]
fn test_build_unclosed_tags() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, "<div><p><span>text").unwrap();
    assert_eq!(tree.tag_name(node), Some("div"));
    assert_eq!(tree.text_content(node), "text");
}

#[test]
fn test_build_mismatched_tags() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, "<div><p></div></p>").unwrap();
    assert_eq!(tree.tag_name(node), Some("div"));
}

#[test]
fn test_build_orphan_closing_tag() {
    let mut tree = DomTree::new();
    assert!(fos_html::build(&mut tree, "</div>").is_err());
}

#[test]
fn test_uppercase_names_lowered() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, r#"<DIV ID="x">a</DIV>"#).unwrap();
    assert_eq!(tree.tag_name(node), Some("div"));
    assert_eq!(tree.attribute(node, "id"), Some("x"));
}

#[test]
fn test_entities_decoded() {
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, "<p>a &amp; b &lt;c&gt;</p>").unwrap();
    assert_eq!(tree.text_content(node), "a & b <c>");
}

#[test]
fn test_table_gets_tbody() {
    let mut tree = DomTree::new();
    let table = fos_html::build(&mut tree, "<table><tr><td>x</td></tr></table>").unwrap();
    assert!(tree.query_selector(table, "tbody > tr > td").unwrap().is_some());
}

// ============================================================================
// STRESS
// ============================================================================

#[test]
fn test_deep_nesting() {
    let depth = 200;
    let markup = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, markup).unwrap();
    assert_eq!(tree.descendants(node).count(), depth);
}

#[test]
fn test_many_siblings() {
    let markup = format!("<ul>{}</ul>", "<li>i</li>".repeat(1000));
    let mut tree = DomTree::new();
    let node = fos_html::build(&mut tree, markup).unwrap();
    assert_eq!(tree.child_count(node), 1000);
}
