//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive sitemap
//! discovery, fetching, checkpoint/resume and the worker pool end-to-end.

use corpus_crawl::config::{Config, FetchConfig, SitemapConfig};
use corpus_crawl::crawler::{
    build_http_client, fetch_url, FetchOutcome, RetryPolicy, SiteCrawler, TargetFailure,
};
use corpus_crawl::sitemap::SitemapResolver;
use corpus_crawl::storage::{read_ledger, StorageError};
use corpus_crawl::CrawlError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing under `root`
fn create_test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.fetch.timeout = 2;
    config.fetch.retries = 3;
    config.fetch.backoff_base = 0.01;
    config.pool.workers = 2;
    config.pool.target_timeout = 60;
    config.output.root = root.display().to_string();
    config
}

fn urlset(urls: &[String]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    for url in urls {
        xml.push_str(&format!("<url><loc>{}</loc></url>", url));
    }
    xml.push_str("</urlset>");
    xml
}

fn sitemap_index(sitemaps: &[String]) -> String {
    let mut xml = String::from(r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    for sitemap in sitemaps {
        xml.push_str(&format!("<sitemap><loc>{}</loc></sitemap>", sitemap));
    }
    xml.push_str("</sitemapindex>");
    xml
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

/// Target directory name for a mock server, e.g. `127.0.0.1_54321`
fn target_dir(root: &Path, server: &MockServer) -> PathBuf {
    let address = server.address();
    root.join("scraped")
        .join(format!("{}_{}", address.ip(), address.port()))
}

fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".txt"))
        })
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn test_full_site_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_get(
        &server,
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_string(sitemap_index(&[format!("{}/pages.xml", base)])),
        1,
    )
    .await;
    mount_get(
        &server,
        "/pages.xml",
        ResponseTemplate::new(200).set_body_string(urlset(&[
            format!("{}/blog/post-1", base),
            format!("{}/about", base),
            format!("{}/missing", base),
            format!("{}/", base),
            format!("{}/empty", base),
            format!("{}/report.pdf", base),
        ])),
        1,
    )
    .await;
    mount_get(&server, "/", html("<h1>Home</h1><p>Welcome</p>"), 1).await;
    mount_get(&server, "/about", html("<p>About us</p>"), 1).await;
    mount_get(&server, "/missing", ResponseTemplate::new(404), 1).await;
    mount_get(&server, "/empty", html("<script>track()</script>"), 1).await;
    mount_get(&server, "/report.pdf", ResponseTemplate::new(200), 0).await;
    mount_get(&server, "/blog/post-1", html("<p>Deep</p>"), 0).await;

    let crawler = Arc::new(SiteCrawler::from_config(create_test_config(output.path())).unwrap());
    let report = crawler.run(vec![base.clone(), "   ".to_string()]).await;

    assert_eq!(report.total(), 1);
    assert!(report.failed.is_empty(), "failures: {:?}", report.failed);
    let (_, target) = &report.completed[0];
    assert_eq!(target.pages_written(), 2);

    let folder = target_dir(output.path(), &server);
    assert_eq!(target.folder, folder);
    assert_eq!(
        read_ledger(&folder.join("index.urls")).unwrap(),
        vec![format!("{}/", base), format!("{}/about", base)]
    );
    assert_eq!(
        read_ledger(&folder.join("bad.urls")).unwrap(),
        vec![format!("{}/missing", base)]
    );
    assert_eq!(
        read_ledger(&folder.join("empty.urls")).unwrap(),
        vec![format!("{}/empty", base)]
    );
    assert_eq!(
        read_ledger(&folder.join("skip.urls")).unwrap(),
        vec![format!("{}/report.pdf", base)]
    );

    let first = files_with_prefix(&folder, "0_");
    assert_eq!(first.len(), 1);
    assert_eq!(
        fs::read_to_string(&first[0]).unwrap(),
        format!("{}/\nHome\nWelcome", base)
    );
    assert_eq!(files_with_prefix(&folder, "1_").len(), 1);

    let listing = fs::read_to_string(folder.join("filenames.txt")).unwrap();
    assert_eq!(listing.lines().count(), 2);

    let name = folder.file_name().unwrap().to_str().unwrap().to_string();
    let all_urls = fs::read_to_string(output.path().join("websites").join(format!("{}_urls.txt", name))).unwrap();
    assert_eq!(all_urls.lines().count(), 6);
    assert_eq!(all_urls.lines().last().unwrap(), format!("{}/blog/post-1", base));

    let selected = fs::read_to_string(output.path().join("to_scrape").join(format!("{}_urls.txt", name))).unwrap();
    assert_eq!(selected.lines().count(), 5);
}

#[tokio::test]
async fn test_resume_skips_recorded_urls() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("site");

    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("index.urls"), format!("{}/a\n", base)).unwrap();
    fs::write(folder.join("0_abc123.txt"), format!("{}/a\nA", base)).unwrap();

    let links = dir.path().join("links.txt");
    fs::write(&links, format!("{base}/a\n{base}/b\n")).unwrap();

    mount_get(&server, "/a", html("<p>A</p>"), 0).await;
    mount_get(&server, "/b", html("<p>B</p>"), 1).await;

    let crawler = SiteCrawler::from_config(create_test_config(dir.path())).unwrap();
    let report = crawler.download_pages(&links, &folder).await.unwrap();

    assert!(report.resumed);
    assert_eq!(report.start_index, 1);
    assert_eq!(report.next_index, 2);
    assert_eq!(
        read_ledger(&folder.join("index.urls")).unwrap(),
        vec![format!("{}/a", base), format!("{}/b", base)]
    );
    assert_eq!(report.corpus_files.len(), 2);

    let second = files_with_prefix(&folder, "1_");
    assert_eq!(second.len(), 1);
    assert_eq!(fs::read_to_string(&second[0]).unwrap(), format!("{}/b\nB", base));
}

#[tokio::test]
async fn test_resume_after_completion_fetches_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("site");
    let links = dir.path().join("links.txt");
    fs::write(&links, format!("{base}/a\n{base}/gone\n")).unwrap();

    mount_get(&server, "/a", html("<p>A</p>"), 1).await;
    mount_get(&server, "/gone", ResponseTemplate::new(410), 1).await;

    let crawler = SiteCrawler::from_config(create_test_config(dir.path())).unwrap();
    let first = crawler.download_pages(&links, &folder).await.unwrap();
    let second = crawler.download_pages(&links, &folder).await.unwrap();

    assert_eq!(first.next_index, 1);
    assert!(second.resumed);
    assert_eq!(second.start_index, 1);
    assert_eq!(second.pages_written(), 0);
    assert_eq!(read_ledger(&folder.join("bad.urls")).unwrap().len(), 1);
}

#[tokio::test]
async fn test_resume_cursor_missing_fails_fast() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("site");

    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("index.urls"), format!("{}/removed\n", base)).unwrap();

    let links = dir.path().join("links.txt");
    fs::write(&links, format!("{base}/a\n{base}/b\n")).unwrap();

    mount_get(&server, "/a", html("<p>A</p>"), 0).await;
    mount_get(&server, "/b", html("<p>B</p>"), 0).await;

    let crawler = SiteCrawler::from_config(create_test_config(dir.path())).unwrap();
    let result = crawler.download_pages(&links, &folder).await;

    assert!(matches!(
        result,
        Err(CrawlError::Storage(StorageError::ResumeCursorNotFound { .. }))
    ));
}

#[tokio::test]
async fn test_timeouts_retried_up_to_bound() {
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/slow",
        html("<p>late</p>").set_delay(Duration::from_secs(3)),
        3,
    )
    .await;

    let client = build_http_client(&FetchConfig {
        timeout: 1,
        ..FetchConfig::default()
    })
    .unwrap();
    let policy = RetryPolicy::new(3, Duration::from_millis(10));

    let outcome = fetch_url(&client, &format!("{}/slow", server.uri()), &policy).await;
    assert!(matches!(outcome, FetchOutcome::Connection(_)));
}

#[tokio::test]
async fn test_http_error_not_retried() {
    let server = MockServer::start().await;
    mount_get(&server, "/broken", ResponseTemplate::new(500), 1).await;

    let client = build_http_client(&FetchConfig::default()).unwrap();
    let policy = RetryPolicy::new(3, Duration::from_millis(10));

    let outcome = fetch_url(&client, &format!("{}/broken", server.uri()), &policy).await;
    assert!(matches!(outcome, FetchOutcome::Malformed(_)));
}

#[tokio::test]
async fn test_sitemap_sorted_shallow_first() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_get(
        &server,
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_string(urlset(&[
            format!("{}/a/b/c", base),
            format!("{}/x", base),
            format!("{}/x", base),
        ])),
        1,
    )
    .await;

    let resolver = SitemapResolver::new(reqwest::Client::new(), &SitemapConfig::default());
    let urls = resolver.resolve(&format!("{}/sitemap.xml", base)).await;

    assert_eq!(urls, vec![format!("{}/x", base), format!("{}/a/b/c", base)]);
}

#[tokio::test]
async fn test_sitemap_cycle_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();

    let first = format!(
        r#"<sitemapindex><sitemap><loc>{base}/second.xml</loc></sitemap></sitemapindex>"#
    );
    let second = format!(
        r#"<root><sitemap><loc>{base}/sitemap.xml</loc></sitemap><url><loc>{base}/page</loc></url></root>"#
    );
    mount_get(&server, "/sitemap.xml", ResponseTemplate::new(200).set_body_string(first), 1).await;
    mount_get(&server, "/second.xml", ResponseTemplate::new(200).set_body_string(second), 1).await;

    let resolver = SitemapResolver::new(reqwest::Client::new(), &SitemapConfig::default());
    let urls = resolver.resolve(&format!("{}/sitemap.xml", base)).await;

    assert_eq!(urls, vec![format!("{}/page", base)]);
}

#[tokio::test]
async fn test_unusable_sitemap_yields_empty_target() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_get(
        &server,
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_string("this is not a sitemap"),
        1,
    )
    .await;

    let crawler = SiteCrawler::from_config(create_test_config(output.path())).unwrap();
    let report = crawler.process_website(&server.uri()).await.unwrap();

    assert_eq!(report.pages_written(), 0);
    assert!(report.corpus_files.is_empty());
    assert!(!output.path().join("websites").exists());

    let missing = MockServer::start().await;
    let report = crawler.process_website(&missing.uri()).await.unwrap();
    assert_eq!(report.pages_written(), 0);
}

#[tokio::test]
async fn test_failing_target_does_not_affect_others() {
    let blocked = MockServer::start().await;
    let healthy = MockServer::start().await;
    let output = TempDir::new().unwrap();

    for server in [&blocked, &healthy] {
        let base = server.uri();
        mount_get(
            server,
            "/sitemap.xml",
            ResponseTemplate::new(200).set_body_string(urlset(&[format!("{}/", base)])),
            1,
        )
        .await;
    }
    mount_get(&blocked, "/", html("<p>never</p>"), 0).await;
    mount_get(&healthy, "/", html("<p>Healthy</p>"), 1).await;

    // A regular file where the target directory should go.
    let blocked_dir = target_dir(output.path(), &blocked);
    fs::create_dir_all(blocked_dir.parent().unwrap()).unwrap();
    fs::write(&blocked_dir, "not a directory").unwrap();

    let crawler = Arc::new(SiteCrawler::from_config(create_test_config(output.path())).unwrap());
    let report = crawler
        .run(vec![
            blocked.uri(),
            "not a url".to_string(),
            healthy.uri(),
        ])
        .await;

    assert_eq!(report.total(), 3);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].0, healthy.uri());
    assert!(!report.all_failed());

    let healthy_dir = target_dir(output.path(), &healthy);
    assert_eq!(
        read_ledger(&healthy_dir.join("index.urls")).unwrap(),
        vec![format!("{}/", healthy.uri())]
    );
}

#[tokio::test]
async fn test_aliased_roots_crawled_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_get(
        &server,
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_string(urlset(&[
            format!("{}/", base),
            format!("{}/about", base),
            format!("{}/more", base),
        ])),
        1,
    )
    .await;
    mount_get(&server, "/", html("<p>Home</p>"), 1).await;
    mount_get(&server, "/about", html("<p>About</p>"), 1).await;
    mount_get(&server, "/more", html("<p>More</p>"), 1).await;

    let crawler = Arc::new(SiteCrawler::from_config(create_test_config(output.path())).unwrap());
    let report = crawler
        .run(vec![base.clone(), format!("{}/", base), base.clone()])
        .await;

    assert_eq!(report.total(), 1);
    assert_eq!(report.completed.len(), 1);

    let folder = target_dir(output.path(), &server);
    let recorded = read_ledger(&folder.join("index.urls")).unwrap();
    assert_eq!(
        recorded,
        vec![
            format!("{}/", base),
            format!("{}/about", base),
            format!("{}/more", base),
        ]
    );
    assert_eq!(report.completed[0].1.corpus_files.len(), recorded.len());
}

/// Every ledger's lines plus the sorted corpus file names of a target
fn target_state(folder: &Path) -> (Vec<Vec<String>>, Vec<String>) {
    let ledgers = [
        "index.urls",
        "skip.urls",
        "connection.urls",
        "bad.urls",
        "non_ascii.urls",
        "empty.urls",
    ]
    .iter()
    .map(|name| read_ledger(&folder.join(name)).unwrap())
    .collect();
    let corpus = files_with_prefix(folder, "")
        .into_iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .filter(|name| name != "filenames.txt")
        .collect();
    (ledgers, corpus)
}

const RESUME_PAGES: [&str; 7] = ["/", "/a", "/b", "/gone", "/m", "/x", "/y"];

async fn mount_resume_site(server: &MockServer, expect_page: impl Fn(&str) -> u64, slow: Option<&str>) {
    let base = server.uri();
    let urls: Vec<String> = RESUME_PAGES.iter().map(|p| format!("{}{}", base, p)).collect();
    mount_get(
        server,
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_string(urlset(&urls)),
        1,
    )
    .await;

    for page in RESUME_PAGES {
        let response = if page == "/gone" {
            ResponseTemplate::new(404)
        } else {
            html(&format!("<p>page {}</p>", page))
        };
        let response = if slow == Some(page) {
            response.set_delay(Duration::from_secs(10))
        } else {
            response
        };
        mount_get(server, page, response, expect_page(page)).await;
    }
}

#[tokio::test]
async fn test_interrupted_run_resumes_to_same_result() {
    let server = MockServer::start().await;
    let uninterrupted = TempDir::new().unwrap();
    let interrupted = TempDir::new().unwrap();

    // Reference run start to finish.
    mount_resume_site(&server, |_| 1, None).await;
    let crawler = Arc::new(SiteCrawler::from_config(create_test_config(uninterrupted.path())).unwrap());
    let report = crawler.run(vec![server.uri()]).await;
    assert_eq!(report.completed.len(), 1);
    server.verify().await;
    server.reset().await;

    // Cut short by the target timeout while /m is in flight.
    mount_resume_site(
        &server,
        |page| if ["/x", "/y"].contains(&page) { 0 } else { 1 },
        Some("/m"),
    )
    .await;
    let mut config = create_test_config(interrupted.path());
    config.pool.target_timeout = 1;
    let crawler = Arc::new(SiteCrawler::from_config(config).unwrap());
    let report = crawler.run(vec![server.uri()]).await;
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(report.failed[0].1, TargetFailure::TimedOut(_)));
    server.verify().await;
    server.reset().await;

    let folder = target_dir(interrupted.path(), &server);
    assert_eq!(read_ledger(&folder.join("index.urls")).unwrap().len(), 3);

    // Restart: only the pages after the interruption are requested.
    mount_resume_site(
        &server,
        |page| if ["/m", "/x", "/y"].contains(&page) { 1 } else { 0 },
        None,
    )
    .await;
    let crawler = Arc::new(SiteCrawler::from_config(create_test_config(interrupted.path())).unwrap());
    let report = crawler.run(vec![server.uri()]).await;
    assert_eq!(report.completed.len(), 1);
    assert!(report.completed[0].1.resumed);

    let expected = target_state(&target_dir(uninterrupted.path(), &server));
    let resumed = target_state(&folder);
    assert_eq!(resumed, expected);
    assert_eq!(resumed.0[0].len(), 5);
    assert_eq!(resumed.1.len(), 5);
}
