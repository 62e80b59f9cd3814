//! Archive.org listing formats.

use scraper::{ElementRef, Html};

use super::dom::{
    cells, class_attr, contains_ci, element_children, first_anchor, href, is_numeric,
    trimmed_text, ANCHOR, PRE_ANCHOR, ROW, TABLE, ZIPVIEW_SIZE,
};
use super::{ListingEntry, ParseContext};
use crate::size::format_bytes;

const PARENT_LINK: &str = "Go to parent directory";

fn has_class(table: ElementRef<'_>, class: &str) -> bool {
    class_attr(table).split_whitespace().any(|c| c == class)
}

/// `/download/<item>/` pages: name link in the first cell, size in the third.
pub(super) fn directory_listing_table(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    let mut entries = Vec::new();
    for table in doc.select(&TABLE).filter(|t| has_class(*t, "directory-listing-table")) {
        for row in table.select(&ROW) {
            let tds = cells(row);
            if tds.len() < 3 {
                continue;
            }
            let Some(anchor) = first_anchor(tds[0]) else {
                continue;
            };
            let name = trimmed_text(anchor);
            if contains_ci(&name, PARENT_LINK) || !ctx.accepts(&name) {
                continue;
            }
            entries.push(ListingEntry::new(
                name,
                ctx.resolve(href(anchor)),
                trimmed_text(tds[2]),
            ));
        }
    }
    entries
}

/// Rows of an `archext` table: the `tbody` rows when there is one, the
/// table's own rows otherwise.
fn archext_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let from_body: Vec<_> = element_children(table)
        .filter(|child| child.value().name() == "tbody")
        .flat_map(element_children)
        .filter(|row| row.value().name() == "tr")
        .collect();
    if !from_body.is_empty() {
        return from_body;
    }
    element_children(table)
        .filter(|row| row.value().name() == "tr")
        .collect()
}

fn is_header_row(row: ElementRef<'_>) -> bool {
    element_children(row)
        .next()
        .map(|first| first.value().name() == "th")
        .unwrap_or(false)
}

/// Archive contents view (`view_archive.php`): name, date, ..., size in the
/// fourth column, often as a raw byte count.
pub(super) fn archext_table(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    for table in doc.select(&TABLE).filter(|t| has_class(*t, "archext")) {
        let mut entries = Vec::new();
        for row in archext_rows(table) {
            if is_header_row(row) {
                continue;
            }
            let tds = cells(row);
            let Some(anchor) = tds.first().and_then(|td| first_anchor(*td)) else {
                continue;
            };
            let name = trimmed_text(anchor);
            if contains_ci(&name, PARENT_LINK) || !ctx.accepts(&name) {
                continue;
            }
            let size = tds
                .get(3)
                .map(|td| archext_size(trimmed_text(*td)))
                .unwrap_or_default();
            entries.push(ListingEntry::new(name, ctx.resolve(href(anchor)), size));
        }
        if !entries.is_empty() {
            return entries;
        }
    }
    Vec::new()
}

/// Plain byte counts (`1048576`, `1048576.0`) are reformatted; anything
/// else is kept as shown.
fn archext_size(raw: String) -> String {
    if !is_numeric(&raw) {
        return raw;
    }
    match raw.parse::<f64>() {
        Ok(bytes) if bytes >= 0.0 => format_bytes(bytes.floor() as u64),
        _ => raw,
    }
}

/// `zipview.php` pages, which vary between a table layout and bare links.
pub(super) fn zipview(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    if !contains_ci(&ctx.base, "zipview.php") {
        return Vec::new();
    }

    for table in doc.select(&TABLE) {
        let mut entries = Vec::new();
        for row in table.select(&ROW) {
            let tds = cells(row);
            let Some(anchor) = tds.first().and_then(|td| first_anchor(*td)) else {
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
                .find(|txt| !txt.is_empty() && (ZIPVIEW_SIZE.is_match(txt) || is_numeric(txt)))
                .unwrap_or_default();
            entries.push(ListingEntry::new(name, ctx.resolve(href(anchor)), size));
        }
        if !entries.is_empty() {
            return entries;
        }
    }

    doc.select(&ANCHOR)
        .filter_map(|anchor| {
            let name = trimmed_text(anchor);
            let link = href(anchor);
            (ctx.accepts(&name) && !link.is_empty())
                .then(|| ListingEntry::new(name, ctx.resolve(link), ""))
        })
        .collect()
}

/// Legacy plain indexes: one anchor per line inside `<pre>`.
pub(super) fn pre_index(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    doc.select(&PRE_ANCHOR)
        .filter_map(|anchor| {
            let name = trimmed_text(anchor);
            (name != PARENT_LINK && ctx.accepts(&name))
                .then(|| ListingEntry::new(name, ctx.resolve(href(anchor)), ""))
        })
        .collect()
}
