//! Small DOM helpers shared by the strategies.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

pub(super) static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
pub(super) static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
pub(super) static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
pub(super) static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
pub(super) static PRE_ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("pre a"));

/// A number followed by a byte unit: `12 MB`, `1,5 Go`, `800 B`.
pub(super) static SIZE_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:[.,]\d+)?\s*[KMGTP]?[BO]\b").expect("size pattern is valid")
});

/// Looser size shape used on zipview pages: `12.5KB`, `800B`.
pub(super) static ZIPVIEW_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\.?\d*\s*[KMGTP]?B").expect("zipview size pattern is valid")
});

/// Concatenated text of an element and its descendants.
pub(super) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Trimmed text content.
pub(super) fn trimmed_text(element: ElementRef<'_>) -> String {
    text_of(element).trim().to_string()
}

/// All `td` descendants of a row, in document order.
pub(super) fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.select(&CELL).collect()
}

/// First anchor below an element.
pub(super) fn first_anchor(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.select(&ANCHOR).next()
}

pub(super) fn href(anchor: ElementRef<'_>) -> &str {
    anchor.value().attr("href").unwrap_or_default()
}

pub(super) fn class_attr(element: ElementRef<'_>) -> &str {
    element.value().attr("class").unwrap_or_default()
}

/// Case-insensitive substring test.
pub(super) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whether a value would pass as a plain number (`123`, `1.5`).
pub(super) fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

/// Element children of a node, skipping text and comments.
pub(super) fn element_children(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}
