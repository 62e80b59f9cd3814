//! # dirscrape
//!
//! Extract file listings from directory-style web pages.
//!
//! Given URLs or pasted HTML, this library produces ordered `(name, url,
//! size)` entries from web server autoindex pages, archive.org listings,
//! password-protected file host directories, or any page with plain download
//! links. Remote ZIP archives can be listed from their central directory
//! alone, with two HTTP range requests at most.
//!
//! ## Features
//!
//! - Parser chain with one strategy per listing format, first match wins
//! - Fetch fallback ladder for certificate errors and archive.org edge hosts
//! - Password unlock flow with a per-call cookie jar
//! - Remote ZIP listing via HTTP Range requests
//!
//! ## Example
//!
//! ```no_run
//! use dirscrape::{ScrapeOptions, Scraper};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = ScrapeOptions::default().with_extensions(["zip", "7z"])?;
//!     let scraper = Scraper::new(options)?;
//!
//!     for listing in scraper.scrape_text("https://example.com/roms/").await {
//!         for entry in &listing.entries {
//!             println!("{}\t{}\t{}", entry.name, entry.url, entry.size_text);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod io;
pub mod listing;
pub mod scrape;
pub mod size;
pub mod zip;

pub use cli::Cli;
pub use config::{ScrapeOptions, DEFAULT_EXTENSIONS};
pub use error::{ConfigError, FetchError, ScrapeInitError, ZipFormatError};
pub use io::{FetchClient, FetchResult, RangeFetch, UnlockStatus};
pub use listing::{parse_listing, ListingEntry, ParseContext, Strategy};
pub use scrape::{PageSource, Scraper, SourceListing};
pub use size::{format_bytes, parse_size, total_size};
pub use zip::{list_zip_entries, ZipCentralDirectoryEntry};
