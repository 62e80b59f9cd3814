//! archive.org "view archive" pages.
//!
//! `view_archive.php?archive=/26/items/<item>/<path>.zip` shows the contents
//! of a ZIP stored in an item. When the page itself is forbidden, the archive
//! is still reachable under `/download/<item>/<path>`, which is enough to read
//! its central directory.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

const DOWNLOAD_BASE: &str = "https://archive.org/download/";
const ZIPVIEW_BASE: &str = "https://archive.org/zipview.php";

static ARCHIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?:\d+|download)/items/([^/]+)/(.+)$").expect("archive path regex is valid")
});

/// The ZIP behind a view-archive URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewArchiveTarget {
    pub item: String,
    /// Path of the ZIP inside the item.
    pub rel: String,
    /// Direct download URL of the ZIP.
    pub download: String,
    /// The `archive` query parameter, with a leading `/`.
    pub archive_param: String,
}

impl ViewArchiveTarget {
    /// Derive the target from a view-archive URL. `None` when the URL has no
    /// `archive` parameter or the parameter is not an item path.
    pub fn from_url(view_url: &str) -> Option<Self> {
        let url = Url::parse(view_url).ok()?;
        let archive = url
            .query_pairs()
            .find(|(key, value)| key == "archive" && !value.is_empty())
            .map(|(_, value)| value.into_owned())?;
        let archive_param = if archive.starts_with('/') {
            archive
        } else {
            format!("/{archive}")
        };

        let caps = ARCHIVE_PATH.captures(&archive_param)?;
        let item = caps[1].to_string();
        let rel = caps[2].to_string();

        let mut download = Url::parse(DOWNLOAD_BASE).ok()?;
        download
            .path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push(&item)
            .extend(rel.split('/'));

        Some(Self {
            item,
            rel,
            download: download.into(),
            archive_param,
        })
    }

    /// zipview.php link to one file inside the archive.
    pub fn file_url(&self, name: &str) -> String {
        let mut url = match Url::parse(ZIPVIEW_BASE) {
            Ok(url) => url,
            Err(_) => return String::new(),
        };
        url.query_pairs_mut()
            .append_pair("zip", &self.archive_param)
            .append_pair("file", name);
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_download_url() {
        let target = ViewArchiveTarget::from_url(
            "https://ia801234.us.archive.org/view_archive.php?archive=/26/items/my-item/Roms%20Set/all.zip",
        )
        .unwrap();
        assert_eq!(target.item, "my-item");
        assert_eq!(target.rel, "Roms Set/all.zip");
        assert_eq!(target.archive_param, "/26/items/my-item/Roms Set/all.zip");
        assert_eq!(
            target.download,
            "https://archive.org/download/my-item/Roms%20Set/all.zip"
        );
    }

    #[test]
    fn accepts_relative_archive_param() {
        let target = ViewArchiveTarget::from_url(
            "https://archive.org/view_archive.php?archive=download/items/x/y.zip",
        )
        .unwrap();
        assert_eq!(target.archive_param, "/download/items/x/y.zip");
        assert_eq!(target.download, "https://archive.org/download/x/y.zip");
    }

    #[test]
    fn rejects_non_item_paths() {
        assert_eq!(
            ViewArchiveTarget::from_url("https://archive.org/view_archive.php?archive=/x.zip"),
            None
        );
        assert_eq!(
            ViewArchiveTarget::from_url("https://archive.org/view_archive.php"),
            None
        );
    }

    #[test]
    fn file_url_points_at_zipview() {
        let target = ViewArchiveTarget::from_url(
            "https://archive.org/view_archive.php?archive=/5/items/it/a.zip",
        )
        .unwrap();
        assert_eq!(
            target.file_url("Game (EU).sfc"),
            "https://archive.org/zipview.php?zip=%2F5%2Fitems%2Fit%2Fa.zip&file=Game+%28EU%29.sfc"
        );
    }
}
