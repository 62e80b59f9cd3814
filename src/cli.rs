use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{allowed_extensions, ScrapeOptions, DEFAULT_CONCURRENCY};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "dirscrape")]
#[command(version)]
#[command(about = "Extract file listings from remote directory pages", long_about = None)]
#[command(after_help = "Examples:\n  \
  dirscrape https://example.org/roms/            list files of an autoindex page\n  \
  dirscrape -e zip,7z -f sources.txt             only .zip and .7z, inputs from a file\n  \
  dirscrape -p secret https://1fichier.com/dir/x unlock a password-protected directory\n  \
  dirscrape -l -v https://example.org/big.zip    list a remote ZIP without downloading it")]
pub struct Cli {
    /// Directory URLs or inline HTML (default: read stdin)
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Read inputs from a file
    #[arg(short = 'f', value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Password for protected file host directories
    #[arg(short = 'p', value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Allowed extensions, repeatable or comma-separated (default: all known)
    #[arg(short = 'e', value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(short = 't', value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,

    /// Inputs fetched concurrently
    #[arg(short = 'j', value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    pub jobs: usize,

    /// List files of remote ZIP archives (central directory only)
    #[arg(short = 'l')]
    pub list_zip: bool,

    /// More log output; with -l, a verbose table
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    /// Log level from `-v`/`-q`; warnings by default.
    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (q, _) if q > 1 => LevelFilter::Off,
            (1, _) => LevelFilter::Error,
            (_, 0) => LevelFilter::Warn,
            (_, 1) => LevelFilter::Info,
            (_, 2) => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn options(&self) -> Result<ScrapeOptions, ConfigError> {
        let mut options = ScrapeOptions {
            timeout: Duration::from_secs(self.timeout),
            concurrency: self.jobs,
            password: self.password.clone().filter(|p| !p.is_empty()),
            ..ScrapeOptions::default()
        };
        if !self.extensions.is_empty() {
            options.allowed_extensions = allowed_extensions(&self.extensions)?;
        }
        options.validate()?;
        Ok(options)
    }
}
