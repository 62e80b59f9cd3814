//! Remote ZIP listing.
//!
//! This module recovers the file list of a ZIP archive served over HTTP
//! without downloading it, by reading only the trailing records.
//!
//! ## Architecture
//!
//! - [`structures`]: the EOCD record and central directory file headers
//! - [`parser`]: range-request driven reading of those records
//! - [`view_archive`]: mapping archive.org view-archive pages to their ZIP
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Limitations
//!
//! - No ZIP64 (sizes are the 32-bit central directory fields)
//! - No multi-disk archives
//! - Local file headers are never read

mod parser;
mod structures;
mod view_archive;

pub use parser::{list_zip_entries, scan_central_directory, ContentRange, TAIL_SIZE};
pub use structures::{
    EndOfCentralDirectory, ZipCentralDirectoryEntry, CDFH_MIN_SIZE, CDFH_SIGNATURE,
};
pub use view_archive::ViewArchiveTarget;
