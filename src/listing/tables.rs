//! Table layouts of file hosts and web server autoindexes.

use scraper::{ElementRef, Html};

use super::dom::{
    cells, class_attr, contains_ci, first_anchor, href, text_of, trimmed_text, ANCHOR, CELL, ROW,
    SIZE_WITH_UNIT,
};
use super::{ListingEntry, ParseContext};

/// Which table-specific layouts a page looks like, from its cell classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct CellMarkers {
    pub password_host: bool,
    pub classic: bool,
}

pub(super) fn scan_cell_markers(doc: &Html) -> CellMarkers {
    let mut markers = CellMarkers::default();
    for td in doc.select(&CELL) {
        let class = class_attr(td);
        if class.is_empty() {
            continue;
        }
        if contains_ci(class, "file-obj") || contains_ci(class, "fichier") {
            markers.password_host = true;
        }
        if contains_ci(class, "link") {
            markers.classic = true;
        }
        if markers.password_host && markers.classic {
            break;
        }
    }
    markers
}

/// Password-gated file host directory (1fichier style).
///
/// Three passes, each only when the previous one found nothing: the
/// structured `file-obj` rows, then anchors with a `data-href` override and a
/// nearby size, then any row holding an anchor and a size-shaped cell.
pub(super) fn password_host_table(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    let entries = file_obj_rows(doc, ctx);
    if !entries.is_empty() {
        return entries;
    }
    let entries = data_href_anchors(doc, ctx);
    if !entries.is_empty() {
        return entries;
    }
    heuristic_rows(doc, ctx)
}

fn file_obj_rows(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    let mut entries = Vec::new();
    for row in doc.select(&ROW) {
        let tds = cells(row);
        if tds.len() < 2 || !contains_ci(class_attr(tds[0]), "file-obj") {
            continue;
        }
        let Some(anchor) = first_anchor(tds[0]) else {
            continue;
        };
        let name = trimmed_text(anchor);
        if !ctx.accepts(&name) {
            continue;
        }
        entries.push(ListingEntry::new(
            name,
            ctx.resolve(href(anchor)),
            trimmed_text(tds[1]),
        ));
    }
    entries
}

fn data_href_anchors(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    let mut entries = Vec::new();
    for anchor in doc.select(&ANCHOR) {
        let target = anchor
            .value()
            .attr("data-href")
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| href(anchor));
        if target.is_empty() {
            continue;
        }
        let name = trimmed_text(anchor);
        if !ctx.accepts(&name) {
            continue;
        }
        entries.push(ListingEntry::new(
            name,
            ctx.resolve(target),
            sibling_size(anchor),
        ));
    }
    entries
}

/// Size text from the element siblings following the anchor's parent.
fn sibling_size(anchor: ElementRef<'_>) -> String {
    let Some(parent) = anchor.parent() else {
        return String::new();
    };
    parent
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .map(|sibling| text_of(sibling).trim().to_string())
        .find(|txt| SIZE_WITH_UNIT.is_match(txt))
        .unwrap_or_default()
}

fn heuristic_rows(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    let mut entries = Vec::new();
    for row in doc.select(&ROW) {
        let tds = cells(row);
        let Some(anchor) = tds.iter().find_map(|td| first_anchor(*td)) else {
            continue;
        };
        let name = trimmed_text(anchor);
        if !ctx.accepts(&name) {
            continue;
        }
        let size = tds
            .iter()
            .skip(1)
            .map(|td| trimmed_text(*td))
            .find(|txt| !txt.is_empty() && SIZE_WITH_UNIT.is_match(txt))
            .unwrap_or_default();
        entries.push(ListingEntry::new(name, ctx.resolve(href(anchor)), size));
    }
    entries
}

/// Apache/nginx style autoindex: `<td class="link">` followed by the size.
pub(super) fn classic_autoindex(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    let mut entries = Vec::new();
    for row in doc.select(&ROW) {
        let tds = cells(row);
        let Some(link_cell) = tds.first() else {
            continue;
        };
        if !contains_ci(class_attr(*link_cell), "link") {
            continue;
        }
        let Some(anchor) = first_anchor(*link_cell) else {
            continue;
        };
        let name = trimmed_text(anchor);
        if name == "Parent directory/" || !ctx.accepts(&name) {
            continue;
        }
        let size = tds.get(1).map(|td| trimmed_text(*td)).unwrap_or_default();
        entries.push(ListingEntry::new(name, ctx.resolve(href(anchor)), size));
    }
    entries
}
