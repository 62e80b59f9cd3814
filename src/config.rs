//! Scrape configuration.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::ConfigError;
use crate::io::DEFAULT_TIMEOUT;

/// Inputs processed at once.
pub const DEFAULT_CONCURRENCY: usize = 1;
/// Wait between submitting a password and re-reading the directory, so the
/// host has committed the session cookie.
pub const DEFAULT_UNLOCK_DELAY: Duration = Duration::from_millis(500);

/// Every extension the scraper knows: ROMs, disk images, archives and the
/// few companion formats that sit next to them.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "40t", "68k", "7z", "a0", "a26", "a52", "a78", "abs", "actionmax", "adf", "adl", "adm", "ads",
    "adz", "app", "apd", "atr", "atm", "atx", "auto", "axf", "b0", "bat", "bg1", "bg2", "bbc",
    "bin", "bml", "boom3", "bs", "bsx", "c", "cas", "cbn", "ccc", "cci", "ccd", "cdi", "cdm",
    "cdg", "cdr", "chd", "cmd", "cof", "col", "cqm", "cqi", "croft", "crt", "cso", "csw", "cue",
    "d64", "d77", "d81", "d88", "daphne", "dat", "ddp", "dfi", "dim", "dk", "dms", "dol", "dos",
    "dosbox", "dosz", "dsk", "dup", "dx1", "dx2", "easyrpg", "eduke32", "elf", "exe", "fba", "fds",
    "fig", "fpt", "frd", "g64", "gam", "game", "gbc", "gcz", "gd3", "gd7", "gdi", "gem", "gen",
    "gg", "gz", "hb", "hdf", "hdm", "hex", "hfe", "how", "hypseus", "ikemen", "ima", "img", "int",
    "ipf", "ipk3", "iso", "iwd", "iwd2", "j64", "jag", "jfd", "kip", "lbd", "lha", "libretro",
    "lnk", "love", "lua", "lutro", "lux", "lx", "m3u", "m3u8", "m5", "m7", "md", "mdf", "mds",
    "mfi", "mfm", "mgw", "min", "msa", "mugen", "mx1", "mx2", "n64", "nca", "ndd", "neo", "nes",
    "nib", "nrg", "nro", "nso", "nx", "ogv", "p", "p8", "pak", "pb", "pbp", "pc", "pce", "pk3",
    "png", "po", "prg", "prx", "pst", "psv", "pxp", "rar", "raze", "rem", "ri", "rom", "rp9",
    "rpk", "rpx", "rsdk", "rvz", "sbw", "sc", "scummvm", "sfc", "sg", "sgd", "smc", "sms",
    "solarus", "squashfs", "st", "sv", "swf", "swc", "symbian", "t64", "t77", "table", "tap",
    "tar", "tfd", "tgc", "tic", "toc", "txt", "u88", "uae", "uef", "ufi", "uze", "v32", "v64",
    "vb", "vboy", "vec", "vpk", "vpx", "wad", "wav", "wbfs", "wia", "win", "windows", "wine",
    "wsquashfs", "woz", "ws", "wsc", "wua", "wud", "wux", "xbe", "xcp", "xci", "xdf", "xex", "xfd",
    "zip", "zar", "zcxi", "zso",
];

/// Options for a batch of inputs.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub timeout: Duration,
    /// Upper bound on inputs fetched concurrently. Output order does not
    /// depend on it.
    pub concurrency: usize,
    /// Password for gated file host directories.
    pub password: Option<String>,
    /// Lowercased extensions without the leading dot.
    pub allowed_extensions: HashSet<String>,
    pub unlock_delay: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            password: None,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            unlock_delay: DEFAULT_UNLOCK_DELAY,
        }
    }
}

impl ScrapeOptions {
    /// Restrict the allow-list to `requested` (see [`allowed_extensions`]).
    pub fn with_extensions<I, S>(mut self, requested: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = allowed_extensions(requested)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::NoValidExtension(String::new()));
        }
        Ok(())
    }
}

/// Intersect user-supplied extensions with [`DEFAULT_EXTENSIONS`].
///
/// Items may be comma-separated, dotted (`.zip`) and in any case. Unknown
/// extensions are dropped; nothing left is an error.
pub fn allowed_extensions<I, S>(requested: I) -> Result<HashSet<String>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut asked = Vec::new();
    for item in requested {
        for ext in item.as_ref().split(',') {
            let ext = ext.trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() {
                asked.push(ext);
            }
        }
    }

    let allowed: HashSet<String> = asked
        .iter()
        .filter(|ext| DEFAULT_EXTENSIONS.contains(&ext.as_str()))
        .cloned()
        .collect();
    if allowed.is_empty() {
        return Err(ConfigError::NoValidExtension(asked.join(",")));
    }
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_known_extensions() {
        let options = ScrapeOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.concurrency, 1);
        assert!(options.password.is_none());
        assert!(options.allowed_extensions.contains("zip"));
        assert!(options.allowed_extensions.contains("chd"));
        assert_eq!(options.allowed_extensions.len(), DEFAULT_EXTENSIONS.len());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn requested_extensions_are_normalized_and_intersected() {
        let allowed = allowed_extensions(["ZIP, .7z", "exe", "docx"]).unwrap();
        let mut sorted: Vec<_> = allowed.into_iter().collect();
        sorted.sort();
        assert_eq!(sorted, ["7z", "exe", "zip"]);
    }

    #[test]
    fn unknown_extensions_only_is_an_error() {
        assert_eq!(
            allowed_extensions(["docx", "pdf"]),
            Err(ConfigError::NoValidExtension("docx,pdf".to_string()))
        );
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let options = ScrapeOptions {
            concurrency: 0,
            ..ScrapeOptions::default()
        };
        assert_eq!(options.validate(), Err(ConfigError::ZeroConcurrency));
    }
}
