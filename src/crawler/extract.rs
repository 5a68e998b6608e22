//! Readable-text extraction from raw HTML
//!
//! The crawl treats extraction as a pluggable function from markup plus a tag
//! allowlist to plain text. [`TagTextExtractor`] is the built-in implementation.

use scraper::{ElementRef, Html, Node};
use std::collections::HashSet;
use thiserror::Error;

/// Elements whose contents are never treated as readable text
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Content extraction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("No tags to extract")]
    EmptyAllowlist,

    #[error("Extraction failed: {0}")]
    Failed(String),
}

/// Converts raw markup to plain text restricted to an allowlist of tags
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, raw_html: &str, tags: &[String]) -> Result<String, ExtractError>;
}

/// Collects the text of allowlisted elements in document order
///
/// Each element whose name is in the allowlist contributes the trimmed text
/// of all its descendants and is not descended into again, so nested
/// allowlisted elements are not repeated. Anchors render as `text (href)`.
/// The pieces are joined by single spaces with line breaks collapsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagTextExtractor;

impl ContentExtractor for TagTextExtractor {
    fn extract(&self, raw_html: &str, tags: &[String]) -> Result<String, ExtractError> {
        if tags.is_empty() {
            return Err(ExtractError::EmptyAllowlist);
        }

        let allow: HashSet<String> = tags.iter().map(|t| t.to_ascii_lowercase()).collect();
        let document = Html::parse_document(raw_html);

        let mut parts = Vec::new();
        walk(document.root_element(), &allow, &mut parts);

        Ok(collapse_lines(&parts.join(" ")))
    }
}

/// Visits elements in document order using an explicit stack
fn walk(root: ElementRef<'_>, allow: &HashSet<String>, parts: &mut Vec<String>) {
    let mut stack = vec![root];

    while let Some(element) = stack.pop() {
        let name = element.value().name();
        if SKIPPED_TAGS.contains(&name) {
            continue;
        }

        if allow.contains(name) {
            let text = element_text(element);
            if !text.is_empty() {
                parts.push(text);
            }
            continue;
        }

        stack.extend(element.children().filter_map(ElementRef::wrap).rev());
    }
}

/// Text of one allowlisted element
fn element_text(element: ElementRef<'_>) -> String {
    if element.value().name() == "a" {
        return anchor_text(element);
    }
    collect_text(element, true)
}

fn anchor_text(anchor: ElementRef<'_>) -> String {
    let text = collect_text(anchor, false);

    match anchor.value().attr("href").map(str::trim) {
        Some(href) if !href.is_empty() && text.is_empty() => format!("({})", href),
        Some(href) if !href.is_empty() => format!("{} ({})", text, href),
        _ => text,
    }
}

/// Joins the trimmed text nodes under `element`
///
/// With `render_anchors`, descendant anchors are rendered by [`anchor_text`].
/// Anchors cannot nest, so that call never recurses further.
fn collect_text(element: ElementRef<'_>, render_anchors: bool) -> String {
    let mut pieces = Vec::new();
    let mut stack: Vec<_> = element.children().rev().collect();

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    pieces.push(trimmed.to_string());
                }
            }
            Node::Element(child) => {
                let name = child.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if render_anchors && name == "a" {
                    if let Some(anchor) = ElementRef::wrap(node) {
                        let text = anchor_text(anchor);
                        if !text.is_empty() {
                            pieces.push(text);
                        }
                    }
                    continue;
                }
                stack.extend(node.children().rev());
            }
            _ => {}
        }
    }

    pieces.join(" ")
}

/// Trims every line, drops blank ones and joins the rest with spaces
fn collapse_lines(text: &str) -> String {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
