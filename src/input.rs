//! Input classification and URL handling.
//!
//! A batch of pasted text is split into inputs, each of which is either a
//! URL to fetch or an inline HTML fragment to parse directly. This module
//! also owns the URL helpers shared by the fetch layer and the parsers:
//! normalization of sloppy URLs, relative link resolution, and the
//! archive.org host patterns that drive the fetch fallback ladder.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static HTML_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(tr|table|html|body|pre)[\s>]").expect("html block pattern is valid")
});

static ARCHIVE_EDGE_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^ia\d+\.(?:us\.)?archive\.org$").expect("edge host pattern is valid")
});

static SCHEMELESS_ARCHIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:www\.)?archive\.org|ia\d+\.(?:us\.)?archive\.org)/")
        .expect("schemeless archive pattern is valid")
});

static INPUT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n,]+").expect("separator pattern is valid"));

/// What a single line of input turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// An absolute URL with a host, to be fetched.
    Url,
    /// An inline HTML fragment, parsed as-is.
    Html,
    /// Neither; reported and skipped.
    Unrecognized,
}

/// Classify one (already normalized) input.
pub fn classify(input: &str) -> InputKind {
    if is_url(input) {
        InputKind::Url
    } else if is_html_block(input) {
        InputKind::Html
    } else {
        InputKind::Unrecognized
    }
}

/// True for absolute URLs that carry a host.
pub fn is_url(input: &str) -> bool {
    if input.chars().any(char::is_whitespace) {
        return false;
    }
    Url::parse(input).map(|u| u.has_host()).unwrap_or(false)
}

/// True when the text contains an opening listing-ish tag.
pub fn is_html_block(input: &str) -> bool {
    HTML_BLOCK.is_match(input)
}

/// Split pasted text into individual inputs.
///
/// A text that contains an HTML block is kept whole. Otherwise it is split on
/// newlines and commas; each piece is trimmed, given a scheme when it is an
/// obviously schemeless archive.org or protocol-relative link, and
/// normalized with [`normalize_url_like`].
pub fn split_inputs(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    if is_html_block(raw) {
        return vec![raw.to_string()];
    }

    INPUT_SEPARATOR
        .split(raw)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| normalize_url_like(&with_scheme(line)))
        .collect()
}

fn with_scheme(line: &str) -> String {
    if let Some(rest) = line.strip_prefix("//") {
        return format!("https://{rest}");
    }
    let lower = line.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") && SCHEMELESS_ARCHIVE.is_match(line)
    {
        return format!("https://{line}");
    }
    line.to_string()
}

/// Percent-encode a URL-like string that is not a valid URL as typed.
///
/// Spaces and other characters that are illegal in paths and queries are
/// encoded by re-serializing through [`Url`]. Strings that do not even parse
/// as a URL with a host only get their spaces encoded.
pub fn normalize_url_like(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() || is_url(input) {
        return input.to_string();
    }
    match Url::parse(input) {
        Ok(url) if url.has_host() => url.to_string(),
        _ => input.replace(' ', "%20"),
    }
}

/// Resolve an href found on a page against the page's URL.
///
/// Scheme-relative hrefs get `https:`, absolute hrefs pass through, root
/// relative hrefs keep the base origin, and anything else is joined to the
/// directory of the base path. `.` and `..` segments are then collapsed.
/// Query strings and fragments of the base are dropped.
pub fn resolve_url(base: &str, href: &str) -> String {
    if href.is_empty() {
        return base.to_string();
    }
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return href.to_string();
    }
    if href.starts_with("//") {
        return format!("https:{href}");
    }

    let base_url = match Url::parse(base) {
        Ok(url) if url.has_host() => url,
        _ => {
            if href.starts_with('/') {
                return href.to_string();
            }
            return format!(
                "{}/{}",
                base.trim_end_matches('/'),
                href.trim_start_matches('/')
            );
        }
    };

    let joined = if href.starts_with('/') {
        href.to_string()
    } else {
        let base_path = base_url.path();
        let dir = match base_path.rfind('/') {
            Some(idx) => &base_path[..=idx],
            None => "",
        };
        format!("{dir}{href}")
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let port = base_url
        .port()
        .map(|p| format!(":{p}"))
        .unwrap_or_default();
    format!(
        "{}://{}{}/{}",
        base_url.scheme(),
        base_url.host_str().unwrap_or_default(),
        port,
        segments.join("/")
    )
}

/// Decode `%XX` escapes and `+` the way HTML form decoding does.
pub fn url_decode(text: &str) -> String {
    let escaped = text.replace('&', "%26").replace('=', "%3D");
    url::form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

/// `archive.org` itself or any of its subdomains.
pub fn is_archive_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "archive.org" || host.ends_with(".archive.org")
}

/// Storage edge hosts such as `ia801234.us.archive.org`, which often answer
/// 403 to anything that does not look like a browser.
pub fn is_archive_edge_host(host: &str) -> bool {
    ARCHIVE_EDGE_HOST.is_match(host)
}

/// Lowercased extension of the last path segment, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let base = name.trim_end_matches('/').rsplit('/').next().unwrap_or(name);
    base.rfind('.')
        .map(|idx| base[idx + 1..].to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_urls_and_html() {
        assert_eq!(classify("https://example.org/files/"), InputKind::Url);
        assert_eq!(classify("<table><tr><td>x</td></tr></table>"), InputKind::Html);
        assert_eq!(classify("<PRE>\n<a href=x.zip>x.zip</a></pre>"), InputKind::Html);
        assert_eq!(classify("just some words"), InputKind::Unrecognized);
        assert_eq!(classify("<tablet>"), InputKind::Unrecognized);
        assert_eq!(classify("mailto:someone@example.org"), InputKind::Unrecognized);
    }

    #[test]
    fn splits_lines_and_commas() {
        let inputs = split_inputs("https://a.example/x/\n\n , https://b.example/y/ \r\n");
        assert_eq!(inputs, vec!["https://a.example/x/", "https://b.example/y/"]);
    }

    #[test]
    fn html_paste_stays_whole() {
        let html = "<table>\n<tr><td><a href=\"a.zip\">a.zip</a></td></tr>,\n</table>";
        assert_eq!(split_inputs(html), vec![html.to_string()]);
    }

    #[test]
    fn adds_scheme_to_archive_lines() {
        let inputs = split_inputs(
            "archive.org/download/item/\nia801234.us.archive.org/0/items/x/\n//host.example/dir/",
        );
        assert_eq!(
            inputs,
            vec![
                "https://archive.org/download/item/",
                "https://ia801234.us.archive.org/0/items/x/",
                "https://host.example/dir/",
            ]
        );
    }

    #[test]
    fn normalizes_spaces() {
        assert_eq!(
            normalize_url_like("https://example.org/My Games/list?q=a b"),
            "https://example.org/My%20Games/list?q=a%20b"
        );
        assert_eq!(normalize_url_like("not a url"), "not%20a%20url");
        assert_eq!(
            normalize_url_like("https://example.org/ok/"),
            "https://example.org/ok/"
        );
    }

    #[test]
    fn resolves_relative_links() {
        assert_eq!(
            resolve_url("https://example.org/a/b/", "../c.zip"),
            "https://example.org/a/c.zip"
        );
        assert_eq!(
            resolve_url("https://example.org/a/b/index.html", "./d/e.zip"),
            "https://example.org/a/b/d/e.zip"
        );
        assert_eq!(
            resolve_url("https://example.org/a/b/", "/root.zip"),
            "https://example.org/root.zip"
        );
        assert_eq!(
            resolve_url("http://example.org:8080/dir/", "f.zip"),
            "http://example.org:8080/dir/f.zip"
        );
    }

    #[test]
    fn passes_through_absolute_links() {
        assert_eq!(
            resolve_url("https://example.org/a/", "http://other.example/x.zip"),
            "http://other.example/x.zip"
        );
        assert_eq!(
            resolve_url("https://example.org/a/", "//cdn.example/x.zip"),
            "https://cdn.example/x.zip"
        );
        assert_eq!(resolve_url("https://example.org/a/", ""), "https://example.org/a/");
    }

    #[test]
    fn resolves_against_unparseable_base() {
        assert_eq!(resolve_url("files", "a.zip"), "files/a.zip");
        assert_eq!(resolve_url("files/", "/a.zip"), "/a.zip");
    }

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(url_decode("Super%20Game%20%28USA%29.zip"), "Super Game (USA).zip");
        assert_eq!(url_decode("a+b.zip"), "a b.zip");
        assert_eq!(url_decode("Tom&Jerry=1.zip"), "Tom&Jerry=1.zip");
    }

    #[test]
    fn recognizes_archive_hosts() {
        assert!(is_archive_host("archive.org"));
        assert!(is_archive_host("ia601234.us.archive.org"));
        assert!(!is_archive_host("notarchive.org"));
        assert!(is_archive_edge_host("ia601234.us.archive.org"));
        assert!(is_archive_edge_host("IA8000.archive.org"));
        assert!(!is_archive_edge_host("archive.org"));
        assert!(!is_archive_edge_host("ia.us.archive.org"));
    }

    #[test]
    fn extracts_extensions() {
        assert_eq!(extension_of("Game (USA).ZIP").as_deref(), Some("zip"));
        assert_eq!(extension_of("dir/sub/file.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }
}
