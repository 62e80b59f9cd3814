//! Main entry point for the dirscrape CLI application.
//!
//! Reads inputs from arguments, a file or stdin, and prints one block of
//! tab-separated entries per source. With `-l`, inputs are ZIP URLs and their
//! central directories are listed instead.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;
use tokio::io::AsyncReadExt;

use dirscrape::input::split_inputs;
use dirscrape::{
    format_bytes, list_zip_entries, total_size, Cli, FetchClient, Scraper, SourceListing,
    ZipCentralDirectoryEntry,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level());

    let options = cli.options()?;
    let raw = read_inputs(&cli).await?;
    if raw.trim().is_empty() {
        bail!("no input given");
    }

    if cli.list_zip {
        let client = FetchClient::new()?;
        for url in split_inputs(&raw) {
            let entries = list_zip_entries(&client, &url, options.timeout).await;
            if entries.is_empty() {
                eprintln!("{url}: no central directory entries");
                continue;
            }
            list_files(&url, &entries, cli.verbose > 0);
        }
        // Display network transfer statistics
        if !cli.is_quiet() {
            eprintln!("\nTotal bytes transferred: {}", format_bytes(client.transferred_bytes()));
        }
        return Ok(());
    }

    let scraper = Scraper::new(options)?;
    for listing in scraper.scrape_text(&raw).await {
        print_listing(&listing);
    }

    Ok(())
}

/// `RUST_LOG` wins over the command line flags when set.
fn init_logger(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .filter_module("html5ever", LevelFilter::Error)
        .filter_module("selectors", LevelFilter::Warn)
        .parse_default_env()
        .format_timestamp(None);
    let _ = builder.try_init();
}

/// Positional inputs, then the `-f` file; stdin only when neither is given.
async fn read_inputs(cli: &Cli) -> Result<String> {
    let mut raw = cli.inputs.join("\n");

    if let Some(path) = &cli.file {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        if !raw.is_empty() {
            raw.push('\n');
        }
        raw.push_str(&contents);
    }

    if cli.inputs.is_empty() && cli.file.is_none() {
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("cannot read stdin")?;
    }
    Ok(raw)
}

fn print_listing(listing: &SourceListing) {
    println!(
        "# {}: {} file(s), {}",
        listing.label,
        listing.entries.len(),
        total_size(&listing.entries)
    );
    if let Some(error) = &listing.error {
        eprintln!("{}: {error}", listing.label);
    }
    for entry in &listing.entries {
        println!("{}\t{}\t{}", entry.name, entry.url, entry.size_text);
    }
}

/// Print the entries of one archive, either names only or as a table with
/// sizes and compression ratio.
fn list_files(url: &str, entries: &[ZipCentralDirectoryEntry], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.name);
        }
        return;
    }

    println!("Archive: {url}");
    println!("{:>10}  {:>10}  {:>5}  Name", "Length", "Size", "Cmpr");
    println!("{}", "-".repeat(50));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    for entry in entries {
        println!(
            "{:>10}  {:>10}  {:>4.0}%  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            entry.ratio(),
            entry.name
        );
        total_uncompressed += u64::from(entry.uncompressed_size);
        total_compressed += u64::from(entry.compressed_size);
    }

    println!("{}", "-".repeat(50));
    let total_ratio = if total_uncompressed > 0 {
        (1.0 - total_compressed as f64 / total_uncompressed as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "{:>10}  {:>10}  {:>4.0}%  {} files",
        total_uncompressed,
        total_compressed,
        total_ratio,
        entries.len()
    );
}
