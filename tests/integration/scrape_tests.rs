//! Integration tests for the full scrape cycle
//!
//! These tests use wiremock to serve small directory trees and verify the
//! mirrored files, the run summary, and the requests that must never be
//! made (excluded, out-of-scope, or already-complete resources).

use std::path::Path;
use std::time::{Duration, Instant};

use odscrape::config::{ScrapeConfig, ScrapeOptions};
use odscrape::crawler::crawl;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates options pointing at the mock server's /files/ tree
fn create_test_options(base: &str, output_dir: &Path) -> ScrapeOptions {
    ScrapeOptions {
        url: format!("{}/files/", base),
        output_dir: output_dir.to_path_buf(),
        parallel: 5,
        delay_secs: 0,
        exclude: vec![],
        exclude_from: None,
        clobber: false,
    }
}

/// Mounts an HTML listing page at `route`
async fn mount_listing(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            // set_body_string would pin the mime to text/plain; set_body_raw
            // is the only way to serve an actual text/html listing.
            ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts a downloadable file at `route`
async fn mount_file(server: &MockServer, route: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(bytes.to_vec(), "application/octet-stream"),
        )
        .mount(server)
        .await;
}

/// Mounts the pair of mocks a partial file needs: a header probe answering
/// 200 with the full length, and a range request answering 206 with the
/// missing tail. The range mock is mounted first so the probe (which
/// carries no Range header) falls through to the plain mock.
async fn mount_partial_pair(server: &MockServer, route: &str, payload: &[u8], seeded: usize) {
    let range = format!("bytes={}-{}", seeded, payload.len());
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("Range", range.as_str()))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(payload[seeded..].to_vec()))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(payload.to_vec(), "application/octet-stream"),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_mirrors_two_level_tree() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/files/",
        r#"<html><body>
        <a href="../">Parent Directory</a>
        <a href="a.txt">a.txt</a>
        <a href="sub/">sub/</a>
        </body></html>"#,
    )
    .await;
    mount_listing(
        &server,
        "/files/sub/",
        r#"<html><body>
        <a href="../">Parent Directory</a>
        <a href="b.bin">b.bin</a>
        </body></html>"#,
    )
    .await;
    mount_file(&server, "/files/a.txt", b"alpha").await;
    mount_file(&server, "/files/sub/b.bin", b"\x00\x01\x02beta").await;

    let dir = tempfile::tempdir().unwrap();
    let config = ScrapeConfig::from_options(create_test_options(&server.uri(), dir.path()))
        .expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    assert_eq!(std::fs::read(root.join("a.txt")).unwrap(), b"alpha");
    assert_eq!(
        std::fs::read(root.join("sub/b.bin")).unwrap(),
        b"\x00\x01\x02beta"
    );
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 0);
    // The root listing's parent link leaves the tree; sub's parent link
    // resolves to the already-visited root listing.
    assert_eq!(summary.out_of_scope, 1);
}

#[tokio::test]
async fn test_exclude_pattern_prevents_fetch() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/files/",
        r#"<html><body>
        <a href="a.txt">a.txt</a>
        <a href="sub/">sub/</a>
        </body></html>"#,
    )
    .await;
    mount_listing(
        &server,
        "/files/sub/",
        r#"<html><body><a href="b.bin">b.bin</a></body></html>"#,
    )
    .await;
    mount_file(&server, "/files/a.txt", b"alpha").await;

    // Excluded, must never be fetched
    Mock::given(method("GET"))
        .and(path("/files/sub/b.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"never".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut options = create_test_options(&server.uri(), dir.path());
    options.exclude = vec!["*.bin".to_string()];
    let config = ScrapeConfig::from_options(options).expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    assert_eq!(std::fs::read(root.join("a.txt")).unwrap(), b"alpha");
    assert!(!root.join("sub/b.bin").exists());
    assert_eq!(summary.excluded, 1);
    assert_eq!(summary.downloaded, 1);
    // An excluded file never shows up as any download outcome.
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.already_complete, 0);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/files/",
        r#"<html><body>
        <a href="a.txt">a.txt</a>
        <a href="sub/">sub/</a>
        </body></html>"#,
    )
    .await;
    mount_listing(
        &server,
        "/files/sub/",
        r#"<html><body><a href="b.bin">b.bin</a></body></html>"#,
    )
    .await;

    // One GET per run: the second run reads the length from the probe's
    // headers and drops the body without a second request.
    Mock::given(method("GET"))
        .and(path("/files/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"alpha".to_vec()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/sub/b.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"beta-beta".to_vec()))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let options = create_test_options(&server.uri(), dir.path());

    let config = ScrapeConfig::from_options(options.clone()).expect("valid config");
    let root = config.output_root.clone();
    let first = crawl(config).await.expect("first crawl failed");
    assert_eq!(first.downloaded, 2);
    assert_eq!(first.already_complete, 0);

    let config = ScrapeConfig::from_options(options).expect("valid config");
    let second = crawl(config).await.expect("second crawl failed");

    assert_eq!(second.already_complete, 2);
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.failed, 0);
    assert_eq!(std::fs::read(root.join("a.txt")).unwrap(), b"alpha");
    assert_eq!(std::fs::read(root.join("sub/b.bin")).unwrap(), b"beta-beta");
}

#[tokio::test]
async fn test_resume_completes_partial_file() {
    let server = MockServer::start().await;
    let payload = b"hello world!";

    mount_listing(
        &server,
        "/files/",
        r#"<html><body><a href="a.bin">a.bin</a></body></html>"#,
    )
    .await;
    mount_partial_pair(&server, "/files/a.bin", payload, 5).await;

    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("mirror");
    std::fs::create_dir_all(&output_dir).unwrap();
    std::fs::write(output_dir.join("a.bin"), &payload[..5]).unwrap();

    let config = ScrapeConfig::from_options(create_test_options(&server.uri(), &output_dir))
        .expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    assert_eq!(std::fs::read(root.join("a.bin")).unwrap(), payload);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.already_complete, 0);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_resume_fails_when_server_ignores_range() {
    let server = MockServer::start().await;
    let payload = b"hello world!";

    mount_listing(
        &server,
        "/files/",
        r#"<html><body><a href="a.bin">a.bin</a></body></html>"#,
    )
    .await;
    // One mock for both requests: a server without range support answers
    // the ranged re-GET with 200 and the full body, just like the probe.
    Mock::given(method("GET"))
        .and(path("/files/a.bin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(payload.to_vec(), "application/octet-stream"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("mirror");
    std::fs::create_dir_all(&output_dir).unwrap();
    std::fs::write(output_dir.join("a.bin"), &payload[..5]).unwrap();

    let config = ScrapeConfig::from_options(create_test_options(&server.uri(), &output_dir))
        .expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    // Appending a full body would corrupt the file, so anything but 206
    // is a per-file failure and the partial copy is left untouched.
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.downloaded, 0);
    assert_eq!(std::fs::read(root.join("a.bin")).unwrap(), &payload[..5]);
}

#[tokio::test]
async fn test_larger_local_file_fails_without_clobber() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/files/",
        r#"<html><body><a href="a.txt">a.txt</a></body></html>"#,
    )
    .await;
    // Remote is shorter than the local copy; no range request is legal.
    Mock::given(method("GET"))
        .and(path("/files/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("mirror");
    std::fs::create_dir_all(&output_dir).unwrap();
    let stale = b"twenty bytes of junk";
    std::fs::write(output_dir.join("a.txt"), stale).unwrap();

    let config = ScrapeConfig::from_options(create_test_options(&server.uri(), &output_dir))
        .expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.downloaded, 0);
    // The local file is left alone; replacing it is a --clobber decision.
    assert_eq!(std::fs::read(root.join("a.txt")).unwrap(), stale);
}

#[tokio::test]
async fn test_clobber_replaces_existing_file() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/files/",
        r#"<html><body><a href="a.txt">a.txt</a></body></html>"#,
    )
    .await;
    // Exactly one GET: clobber never probes sizes or issues ranges.
    Mock::given(method("GET"))
        .and(path("/files/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("mirror");
    std::fs::create_dir_all(&output_dir).unwrap();
    std::fs::write(output_dir.join("a.txt"), b"twenty bytes of junk").unwrap();

    let mut options = create_test_options(&server.uri(), &output_dir);
    options.clobber = true;
    let config = ScrapeConfig::from_options(options).expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(std::fs::read(root.join("a.txt")).unwrap(), b"fresh");
}

#[tokio::test]
async fn test_encoded_traversal_never_escapes_root() {
    let server = MockServer::start().await;

    // An encoded ../ survives URL canonicalization as a single path
    // segment and only becomes a parent reference after decoding.
    mount_listing(
        &server,
        "/files/",
        r#"<html><body><a href="%2e%2e%2fescape.txt">escape</a></body></html>"#,
    )
    .await;
    // Serves whatever path the crafted link resolves to.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"evil".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("mirror");
    let config = ScrapeConfig::from_options(create_test_options(&server.uri(), &output_dir))
        .expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.downloaded, 0);
    // Nothing lands beside the output root.
    assert!(!dir.path().join("escape.txt").exists());
    assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
}

#[tokio::test]
async fn test_out_of_scope_link_is_not_fetched() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/files/",
        r#"<html><body>
        <a href="../outside.txt">outside</a>
        <a href="a.txt">a.txt</a>
        </body></html>"#,
    )
    .await;
    mount_file(&server, "/files/a.txt", b"alpha").await;

    // Above the base URL, must never be fetched
    Mock::given(method("GET"))
        .and(path("/outside.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"secret".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = ScrapeConfig::from_options(create_test_options(&server.uri(), dir.path()))
        .expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    assert_eq!(summary.out_of_scope, 1);
    assert_eq!(summary.downloaded, 1);
    assert!(root.join("a.txt").exists());
    assert!(!root.join("outside.txt").exists());
}

#[tokio::test]
async fn test_failed_branch_does_not_stop_crawl() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/files/",
        r#"<html><body>
        <a href="broken/">broken/</a>
        <a href="a.txt">a.txt</a>
        </body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/files/broken/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_file(&server, "/files/a.txt", b"alpha").await;

    let dir = tempfile::tempdir().unwrap();
    let config = ScrapeConfig::from_options(create_test_options(&server.uri(), dir.path()))
        .expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    // The broken branch is abandoned; the sibling after it still downloads.
    assert_eq!(summary.fetch_errors, 1);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(std::fs::read(root.join("a.txt")).unwrap(), b"alpha");
}

#[tokio::test]
async fn test_sort_links_terminate_and_dedup() {
    let server = MockServer::start().await;

    // Apache-style listings carry sort links that reload the same page
    // with a query. The path matcher serves both variants.
    mount_listing(
        &server,
        "/files/",
        r#"<html><body>
        <a href="?C=N;O=D">Name</a>
        <a href="a.txt">a.txt</a>
        </body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/files/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"alpha".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = ScrapeConfig::from_options(create_test_options(&server.uri(), dir.path()))
        .expect("valid config");

    let summary = crawl(config).await.expect("crawl failed");

    // The sorted variant is one extra listing visit, and its links are
    // already taken; the walk terminates instead of ping-ponging.
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.downloaded, 1);
}

#[tokio::test]
async fn test_percent_encoded_paths_decode_locally() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/files/",
        r#"<html><body><a href="My%20Docs/">My Docs</a></body></html>"#,
    )
    .await;
    mount_listing(
        &server,
        "/files/My%20Docs/",
        r#"<html><body><a href="a%26b.txt">a&amp;b.txt</a></body></html>"#,
    )
    .await;
    mount_file(&server, "/files/My%20Docs/a%26b.txt", b"payload").await;

    let dir = tempfile::tempdir().unwrap();
    let config = ScrapeConfig::from_options(create_test_options(&server.uri(), dir.path()))
        .expect("valid config");
    let root = config.output_root.clone();

    let summary = crawl(config).await.expect("crawl failed");

    assert_eq!(summary.downloaded, 1);
    assert_eq!(
        std::fs::read(root.join("My Docs").join("a&b.txt")).unwrap(),
        b"payload"
    );
}

#[tokio::test]
async fn test_single_permit_serializes_downloads() {
    let server = MockServer::start().await;
    let payload = b"xy";

    mount_listing(
        &server,
        "/files/",
        r#"<html><body>
        <a href="a.bin">a.bin</a>
        <a href="b.bin">b.bin</a>
        <a href="c.bin">c.bin</a>
        </body></html>"#,
    )
    .await;
    mount_partial_pair(&server, "/files/a.bin", payload, 1).await;
    mount_partial_pair(&server, "/files/b.bin", payload, 1).await;
    mount_partial_pair(&server, "/files/c.bin", payload, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("mirror");
    std::fs::create_dir_all(&output_dir).unwrap();
    for name in ["a.bin", "b.bin", "c.bin"] {
        std::fs::write(output_dir.join(name), &payload[..1]).unwrap();
    }

    let mut options = create_test_options(&server.uri(), &output_dir);
    options.parallel = 1;
    options.delay_secs = 1;
    let config = ScrapeConfig::from_options(options).expect("valid config");

    let started = Instant::now();
    let summary = crawl(config).await.expect("crawl failed");
    let elapsed = started.elapsed();

    assert_eq!(summary.downloaded, 3);
    // Each resume sleeps the one-second delay inside its writer task;
    // a single permit cannot let those sleeps overlap.
    assert!(
        elapsed >= Duration::from_secs(3),
        "serialized resumes finished too fast: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_parallel_resumes_overlap_the_delay() {
    let server = MockServer::start().await;
    let payload = b"xy";

    mount_listing(
        &server,
        "/files/",
        r#"<html><body>
        <a href="a.bin">a.bin</a>
        <a href="b.bin">b.bin</a>
        <a href="c.bin">c.bin</a>
        </body></html>"#,
    )
    .await;
    mount_partial_pair(&server, "/files/a.bin", payload, 1).await;
    mount_partial_pair(&server, "/files/b.bin", payload, 1).await;
    mount_partial_pair(&server, "/files/c.bin", payload, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("mirror");
    std::fs::create_dir_all(&output_dir).unwrap();
    for name in ["a.bin", "b.bin", "c.bin"] {
        std::fs::write(output_dir.join(name), &payload[..1]).unwrap();
    }

    let mut options = create_test_options(&server.uri(), &output_dir);
    options.parallel = 3;
    options.delay_secs = 1;
    let config = ScrapeConfig::from_options(options).expect("valid config");

    let started = Instant::now();
    let summary = crawl(config).await.expect("crawl failed");
    let elapsed = started.elapsed();

    assert_eq!(summary.downloaded, 3);
    // With three permits the three one-second delays run concurrently.
    assert!(
        elapsed >= Duration::from_secs(1),
        "delay was skipped: {:?}",
        elapsed
    );
    assert!(
        elapsed < Duration::from_millis(2500),
        "parallel resumes did not overlap: {:?}",
        elapsed
    );
}
