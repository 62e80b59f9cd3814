//! Listing parser chain.
//!
//! A fetched page is parsed once into a tolerant [`Html`] tree and handed to
//! a fixed sequence of format-specific strategies. The first strategy that
//! produces at least one entry wins; the rest are skipped.
//!
//! ## Strategy order
//!
//! 1. [`Strategy::DirectoryListingTable`]: archive.org `directory-listing-table`
//! 2. [`Strategy::ArchextTable`]: archive.org `archext` table
//! 3. [`Strategy::Zipview`]: archive.org `zipview.php` pages
//! 4. [`Strategy::PreIndex`]: anchors inside `<pre>` blocks
//! 5. [`Strategy::PasswordHostTable`]: password-gated file host directories
//! 6. [`Strategy::ClassicAutoindex`]: web server autoindex tables
//! 7. [`Strategy::GenericAnchors`]: any anchor with an allowed extension
//!
//! Strategies 5 and 6 are mutually exclusive: the cell classes of the page
//! decide which one is consulted, and only after 1 to 4 found nothing.
//!
//! Every strategy is a pure function of the document and the
//! [`ParseContext`]; none of them can fail; a page that does not fit a
//! strategy simply yields nothing for it.

mod archive;
mod dom;
mod generic;
mod tables;

use log::debug;
use scraper::Html;
use std::borrow::Cow;
use std::collections::HashSet;

use self::dom::contains_ci;
use crate::input::{extension_of, resolve_url};

/// One downloadable file discovered on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub url: String,
    /// Size as shown by the page (`950K`, `1.2 GB`), possibly empty.
    pub size_text: String,
}

impl ListingEntry {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        size_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            size_text: size_text.into(),
        }
    }

    /// Size in bytes, as far as the size text can be interpreted.
    pub fn size_bytes(&self) -> u64 {
        crate::size::parse_size(&self.size_text)
    }
}

/// Everything a strategy needs besides the document itself.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Human-readable origin of the page, used in logs.
    pub source_label: String,
    /// Whether `base` is the URL the page was fetched from.
    pub is_remote_url: bool,
    /// Effective page URL for remote sources, empty for inline HTML.
    pub base: String,
    /// Lowercased extensions without the leading dot.
    pub allowed_extensions: HashSet<String>,
}

impl ParseContext {
    /// Context for a page fetched from `url`.
    pub fn remote(url: impl Into<String>, allowed_extensions: HashSet<String>) -> Self {
        let url = url.into();
        Self {
            source_label: url.clone(),
            is_remote_url: true,
            base: url,
            allowed_extensions,
        }
    }

    /// Context for HTML pasted inline.
    pub fn inline(label: impl Into<String>, allowed_extensions: HashSet<String>) -> Self {
        Self {
            source_label: label.into(),
            is_remote_url: false,
            base: String::new(),
            allowed_extensions,
        }
    }

    /// Whether `name` is a file with an allowed extension.
    pub fn accepts(&self, name: &str) -> bool {
        if name.is_empty() || name.ends_with('/') {
            return false;
        }
        extension_of(name)
            .map(|ext| self.allowed_extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// Turn an href into the URL stored in the entry.
    pub fn resolve(&self, href: &str) -> String {
        if self.is_remote_url {
            resolve_url(&self.base, href)
        } else {
            href.to_string()
        }
    }
}

/// The page formats the chain knows about, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DirectoryListingTable,
    ArchextTable,
    Zipview,
    PreIndex,
    PasswordHostTable,
    ClassicAutoindex,
    GenericAnchors,
}

impl Strategy {
    /// Archive.org formats, always tried first and in this order.
    pub const ARCHIVE_ORG: [Strategy; 4] = [
        Strategy::DirectoryListingTable,
        Strategy::ArchextTable,
        Strategy::Zipview,
        Strategy::PreIndex,
    ];

    pub fn extract(self, doc: &Html, ctx: &ParseContext) -> Vec<ListingEntry> {
        match self {
            Strategy::DirectoryListingTable => archive::directory_listing_table(doc, ctx),
            Strategy::ArchextTable => archive::archext_table(doc, ctx),
            Strategy::Zipview => archive::zipview(doc, ctx),
            Strategy::PreIndex => archive::pre_index(doc, ctx),
            Strategy::PasswordHostTable => tables::password_host_table(doc, ctx),
            Strategy::ClassicAutoindex => tables::classic_autoindex(doc, ctx),
            Strategy::GenericAnchors => generic::anchors(doc, ctx),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::DirectoryListingTable => "directory-listing-table",
            Strategy::ArchextTable => "archext",
            Strategy::Zipview => "zipview",
            Strategy::PreIndex => "pre",
            Strategy::PasswordHostTable => "password-host",
            Strategy::ClassicAutoindex => "autoindex",
            Strategy::GenericAnchors => "generic",
        }
    }
}

/// Entries plus the strategy that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedListing {
    pub strategy: Option<Strategy>,
    pub entries: Vec<ListingEntry>,
}

/// Extract the file listing of a page.
pub fn parse_listing(html: &str, ctx: &ParseContext) -> Vec<ListingEntry> {
    parse_listing_detailed(html, ctx).entries
}

/// Like [`parse_listing`], also reporting which strategy matched.
pub fn parse_listing_detailed(html: &str, ctx: &ParseContext) -> ParsedListing {
    let doc = Html::parse_document(&with_table_context(html));

    for strategy in chain_for(&doc) {
        let entries = strategy.extract(&doc, ctx);
        if !entries.is_empty() {
            debug!(
                "{}: {} entries via {} strategy",
                ctx.source_label,
                entries.len(),
                strategy.name()
            );
            return ParsedListing {
                strategy: Some(strategy),
                entries,
            };
        }
    }

    debug!("{}: no entries found", ctx.source_label);
    ParsedListing::default()
}

/// Row fragments (`<tr>...`, `<td>...`) pasted without their table.
///
/// The HTML tree builder drops table cells found outside a table, so such a
/// fragment would lose its cells and their classes.
fn with_table_context(html: &str) -> Cow<'_, str> {
    let trimmed = html.trim_start();
    let head = trimmed.get(..3).unwrap_or_default().to_ascii_lowercase();
    let is_row_fragment = head == "<tr" || head == "<td";
    if is_row_fragment && !contains_ci(html, "<table") {
        Cow::Owned(format!("<table>{html}</table>"))
    } else {
        Cow::Borrowed(html)
    }
}

fn chain_for(doc: &Html) -> Vec<Strategy> {
    let mut chain = Strategy::ARCHIVE_ORG.to_vec();
    let markers = tables::scan_cell_markers(doc);
    if markers.password_host {
        chain.push(Strategy::PasswordHostTable);
    } else if markers.classic {
        chain.push(Strategy::ClassicAutoindex);
    }
    chain.push(Strategy::GenericAnchors);
    chain
}
