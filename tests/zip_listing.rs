//! Remote ZIP listing through range requests.

mod common;

use std::time::Duration;

use common::{build_zip, MemoryZip};
use dirscrape::zip::{list_zip_entries, TAIL_SIZE};
use dirscrape::{FetchClient, ZipCentralDirectoryEntry};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn entry(name: &str, size: u32) -> ZipCentralDirectoryEntry {
    ZipCentralDirectoryEntry {
        name: name.to_string(),
        compressed_size: size,
        uncompressed_size: size,
    }
}

#[tokio::test]
async fn lists_two_entries_in_archive_order() {
    let zip = MemoryZip::new(build_zip(&[("a.txt", 10), ("b.bin", 20)], 0, b""));

    let entries = list_zip_entries(&zip, "https://example.org/two.zip", TIMEOUT).await;

    assert_eq!(entries, vec![entry("a.txt", 10), entry("b.bin", 20)]);
    assert!(zip.request_count() <= 2);
    assert_eq!(zip.requests.lock().unwrap()[0], format!("-{TAIL_SIZE}"));
}

#[tokio::test]
async fn large_file_data_is_never_transferred() {
    let big = TAIL_SIZE as usize + 4096;
    let zip = MemoryZip::new(build_zip(&[("big.iso", big), ("small.cue", 12)], 0, b""));

    let entries = list_zip_entries(&zip, "https://example.org/big.zip", TIMEOUT).await;

    assert_eq!(entries, vec![entry("big.iso", big as u32), entry("small.cue", 12)]);
    // The directory sits inside the fetched tail.
    assert_eq!(zip.request_count(), 1);
}

#[tokio::test]
async fn directory_starting_before_the_tail_is_fetched_whole() {
    // Many entries push the central directory start out of the fetched tail.
    let names: Vec<String> = (0..6000).map(|i| format!("dir/file-{i:05}.bin")).collect();
    let files: Vec<(&str, usize)> = names.iter().map(|n| (n.as_str(), 1)).collect();
    let zip = MemoryZip::new(build_zip(&files, 0, b""));

    let entries = list_zip_entries(&zip, "https://example.org/many.zip", TIMEOUT).await;

    assert_eq!(entries.len(), 6000);
    assert_eq!(entries[0].name, "dir/file-00000.bin");
    assert_eq!(entries[5999].name, "dir/file-05999.bin");
    let requests = zip.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert!(!requests[1].starts_with('-'));
}

#[tokio::test]
async fn archive_comment_and_directories() {
    let data = build_zip(&[("roms/", 0), ("roms/game.sfc", 64)], 100, b"made by a test");
    let zip = MemoryZip::new(data);

    let entries = list_zip_entries(&zip, "https://example.org/c.zip", TIMEOUT).await;

    assert_eq!(entries, vec![entry("roms/game.sfc", 64)]);
}

#[tokio::test]
async fn empty_archive_needs_one_request() {
    let zip = MemoryZip::new(build_zip(&[], 0, b""));

    let entries = list_zip_entries(&zip, "https://example.org/empty.zip", TIMEOUT).await;

    assert!(entries.is_empty());
    assert_eq!(zip.request_count(), 1);
}

#[tokio::test]
async fn missing_content_range_yields_nothing() {
    let mut zip = MemoryZip::new(build_zip(&[("a.txt", 10)], 0, b""));
    zip.send_content_range = false;

    let entries = list_zip_entries(&zip, "https://example.org/a.zip", TIMEOUT).await;

    assert!(entries.is_empty());
    assert_eq!(zip.request_count(), 1);
}

#[tokio::test]
async fn not_a_zip_yields_nothing() {
    let zip = MemoryZip::new(b"<html>this is not an archive, just a page</html>".to_vec());

    let entries = list_zip_entries(&zip, "https://example.org/page", TIMEOUT).await;

    assert!(entries.is_empty());
}

#[tokio::test]
async fn failed_range_request_yields_nothing() {
    let mut zip = MemoryZip::new(build_zip(&[("a.txt", 10)], 0, b""));
    zip.fail = true;

    let entries = list_zip_entries(&zip, "https://example.org/gone.zip", TIMEOUT).await;

    assert!(entries.is_empty());
}

#[tokio::test]
async fn http_client_sends_suffix_range() {
    let server = MockServer::start().await;
    let data = build_zip(&[("a.txt", 10), ("b.bin", 20)], 0, b"");
    let len = data.len();

    Mock::given(method("GET"))
        .and(path("/files/two.zip"))
        .and(header("range", format!("bytes=-{TAIL_SIZE}").as_str()))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", format!("bytes 0-{}/{len}", len - 1).as_str())
                .set_body_bytes(data),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = FetchClient::new().unwrap();
    let url = format!("{}/files/two.zip", server.uri());
    let entries = list_zip_entries(&client, &url, TIMEOUT).await;

    assert_eq!(entries, vec![entry("a.txt", 10), entry("b.bin", 20)]);
    assert_eq!(client.transferred_bytes(), len as u64);
}

#[tokio::test]
async fn range_not_supported_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plain.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(build_zip(&[("a.txt", 1)], 0, b"")))
        .mount(&server)
        .await;

    let client = FetchClient::new().unwrap();
    let url = format!("{}/plain.zip", server.uri());

    assert!(list_zip_entries(&client, &url, TIMEOUT).await.is_empty());
}
