//! Last-resort anchor scan.

use scraper::Html;

use super::dom::{contains_ci, href, trimmed_text, ANCHOR};
use super::{ListingEntry, ParseContext};
use crate::input::url_decode;

/// Every anchor whose text, or failing that whose href basename, names a
/// file with an allowed extension. Anchors without text and directory links
/// are skipped.
pub(super) fn anchors(doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
    let mut entries = Vec::new();
    for anchor in doc.select(&ANCHOR) {
        let link = href(anchor);
        if link.is_empty() {
            continue;
        }
        let text = trimmed_text(anchor);
        if text.is_empty() || text.ends_with('/') || contains_ci(&text, "Parent directory") {
            continue;
        }

        let name = if ctx.accepts(&text) {
            text
        } else {
            match href_basename(link) {
                Some(base) if ctx.accepts(&base) => base,
                _ => continue,
            }
        };
        entries.push(ListingEntry::new(name, ctx.resolve(link), ""));
    }
    entries
}

/// Decoded last path segment of an href, ignoring query and fragment.
/// Directory hrefs (trailing `/`) have none.
fn href_basename(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    if path.ends_with('/') {
        return None;
    }
    let base = path.rsplit('/').next().unwrap_or_default();
    if base.is_empty() {
        return None;
    }
    Some(url_decode(base))
}
