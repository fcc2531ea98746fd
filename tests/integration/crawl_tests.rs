//! Integration tests for the crawler
//!
//! These tests use wiremock to serve sitemap trees and check the full
//! crawl-then-reduce cycle end-to-end.

use sitemap_tally::config::Config;
use sitemap_tally::crawler::{build_http_client, fetch_document, CrawlOptions, Crawler};
use sitemap_tally::robots::fetch_sitemap_entries;
use sitemap_tally::tally::{reduce, ReduceMode};
use sitemap_tally::TallyError;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a `<urlset>` body
fn urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|u| format!("  <url><loc>{}</loc></url>\n", u))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
        entries
    )
}

/// Builds a `<sitemapindex>` body
fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|u| format!("  <sitemap><loc>{}</loc></sitemap>\n", u))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</sitemapindex>",
        entries
    )
}

/// `count` distinct page URLs under `prefix`
fn pages(prefix: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("https://site.test/{}/{}", prefix, i))
        .collect()
}

async fn mount_body(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, at: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

fn default_crawler() -> Crawler {
    Crawler::from_config(&Config::default()).expect("Failed to build crawler")
}

#[tokio::test]
async fn test_index_of_two_leaves_totals_all_urls() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_body(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/a.xml", base), format!("{}/b.xml", base)]),
    )
    .await;
    mount_body(&server, "/a.xml", urlset(&pages("a", 3))).await;
    mount_body(&server, "/b.xml", urlset(&pages("b", 5))).await;

    let stream = default_crawler().crawl(format!("{}/sitemap.xml", base));
    let stats = stream.stats();
    let total = reduce(stream, &ReduceMode::Total).await;

    assert_eq!(total, 8);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.documents_fetched, 3);
    assert_eq!(snapshot.index_documents, 1);
    assert_eq!(snapshot.leaf_documents, 2);
    assert_eq!(snapshot.urls_emitted, 8);
    assert_eq!(snapshot.fetch_failures, 0);
}

#[tokio::test]
async fn test_pattern_match_on_leaf_document() {
    let server = MockServer::start().await;
    mount_body(
        &server,
        "/sitemap.xml",
        urlset(&[
            "https://a.com/product-abc".to_string(),
            "https://a.com/other".to_string(),
        ]),
    )
    .await;

    let start = format!("{}/sitemap.xml", server.uri());
    let crawler = default_crawler();

    let products = reduce(
        crawler.crawl(start.as_str()),
        &ReduceMode::PatternMatch("product".to_string()),
    )
    .await;
    assert_eq!(products, 1);

    // Changing only the pattern's case does not change the count
    let upper = reduce(
        crawler.crawl(start.as_str()),
        &ReduceMode::PatternMatch("ABC".to_string()),
    )
    .await;
    let lower = reduce(
        crawler.crawl(start.as_str()),
        &ReduceMode::PatternMatch("abc".to_string()),
    )
    .await;
    assert_eq!(upper, 1);
    assert_eq!(upper, lower);
}

#[tokio::test]
async fn test_failed_child_is_isolated() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_body(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/broken.xml", base), format!("{}/ok.xml", base)]),
    )
    .await;
    mount_status(&server, "/broken.xml", 500).await;
    mount_body(&server, "/ok.xml", urlset(&pages("ok", 4))).await;

    let stream = default_crawler().crawl(format!("{}/sitemap.xml", base));
    let stats = stream.stats();
    let total = reduce(stream, &ReduceMode::Total).await;

    assert_eq!(total, 4);
    assert_eq!(stats.snapshot().fetch_failures, 1);
}

#[tokio::test]
async fn test_unreachable_child_is_isolated() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Port 9 on localhost: nothing listens there in a test environment
    mount_body(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            "http://127.0.0.1:9/gone.xml".to_string(),
            format!("{}/ok.xml", base),
        ]),
    )
    .await;
    mount_body(&server, "/ok.xml", urlset(&pages("ok", 2))).await;

    let total = reduce(
        default_crawler().crawl(format!("{}/sitemap.xml", base)),
        &ReduceMode::Total,
    )
    .await;
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_unrecognized_document_contributes_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_body(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            format!("{}/page.html", base),
            format!("{}/plain.txt", base),
            format!("{}/leaf.xml", base),
        ]),
    )
    .await;
    mount_body(
        &server,
        "/page.html",
        "<html><body><loc>https://a.com/</loc></body></html>".to_string(),
    )
    .await;
    mount_body(
        &server,
        "/plain.txt",
        "https://a.com/1\nhttps://a.com/2\n".to_string(),
    )
    .await;
    mount_body(&server, "/leaf.xml", urlset(&pages("leaf", 3))).await;

    let stream = default_crawler().crawl(format!("{}/sitemap.xml", base));
    let stats = stream.stats();
    let total = reduce(stream, &ReduceMode::Total).await;

    assert_eq!(total, 3);
    assert_eq!(stats.snapshot().unrecognized_documents, 2);
}

#[tokio::test]
async fn test_empty_documents_contribute_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_body(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/empty-index.xml", base), format!("{}/empty-leaf.xml", base)]),
    )
    .await;
    mount_body(&server, "/empty-index.xml", sitemap_index(&[])).await;
    mount_body(&server, "/empty-leaf.xml", urlset(&[])).await;

    let crawler = default_crawler();
    let start = format!("{}/sitemap.xml", base);

    assert_eq!(reduce(crawler.crawl(start.as_str()), &ReduceMode::Total).await, 0);
    assert_eq!(
        reduce(
            crawler.crawl(start.as_str()),
            &ReduceMode::PatternMatch(String::new())
        )
        .await,
        0
    );
}

#[tokio::test]
async fn test_nested_indexes_are_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_body(
        &server,
        "/root.xml",
        sitemap_index(&[format!("{}/mid-1.xml", base), format!("{}/mid-2.xml", base)]),
    )
    .await;
    mount_body(
        &server,
        "/mid-1.xml",
        sitemap_index(&[format!("{}/deep.xml", base), format!("{}/leaf-1.xml", base)]),
    )
    .await;
    mount_body(
        &server,
        "/deep.xml",
        sitemap_index(&[format!("{}/leaf-2.xml", base)]),
    )
    .await;
    mount_body(
        &server,
        "/mid-2.xml",
        sitemap_index(&[format!("{}/leaf-3.xml", base)]),
    )
    .await;
    mount_body(&server, "/leaf-1.xml", urlset(&pages("blog", 7))).await;
    mount_body(&server, "/leaf-2.xml", urlset(&pages("shop", 11))).await;
    mount_body(&server, "/leaf-3.xml", urlset(&pages("blog-archive", 2))).await;

    let crawler = default_crawler();
    let start = format!("{}/root.xml", base);

    let stream = crawler.crawl(start.as_str());
    let stats = stream.stats();
    assert_eq!(reduce(stream, &ReduceMode::Total).await, 20);
    assert_eq!(stats.snapshot().index_documents, 4);
    assert_eq!(stats.snapshot().leaf_documents, 3);

    let blog = reduce(
        crawler.crawl(start.as_str()),
        &ReduceMode::PatternMatch("BLOG".to_string()),
    )
    .await;
    assert_eq!(blog, 9);
}

#[tokio::test]
async fn test_repeated_runs_are_stable() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (0..10).map(|i| format!("{}/part-{}.xml", base, i)).collect();
    mount_body(&server, "/sitemap.xml", sitemap_index(&children)).await;
    for i in 0..10 {
        mount_body(
            &server,
            &format!("/part-{}.xml", i),
            urlset(&pages(&format!("part-{}", i), i + 1)),
        )
        .await;
    }

    let crawler = default_crawler();
    let start = format!("{}/sitemap.xml", base);
    for _ in 0..5 {
        assert_eq!(reduce(crawler.crawl(start.as_str()), &ReduceMode::Total).await, 55);
    }
}

#[tokio::test]
async fn test_small_buffer_applies_backpressure_without_losing_urls() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (0..4).map(|i| format!("{}/big-{}.xml", base, i)).collect();
    mount_body(&server, "/sitemap.xml", sitemap_index(&children)).await;
    for i in 0..4 {
        mount_body(
            &server,
            &format!("/big-{}.xml", i),
            urlset(&pages(&format!("big-{}", i), 250)),
        )
        .await;
    }

    let client = build_http_client(&Config::default()).unwrap();
    let crawler = Crawler::new(
        client,
        CrawlOptions {
            max_concurrent_fetches: None,
            stream_capacity: 1,
        },
    );

    let total = reduce(
        crawler.crawl(format!("{}/sitemap.xml", base)),
        &ReduceMode::Total,
    )
    .await;
    assert_eq!(total, 1000);
}

#[tokio::test]
async fn test_fetch_limit_caps_concurrency() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (0..6).map(|i| format!("{}/slow-{}.xml", base, i)).collect();
    mount_body(&server, "/sitemap.xml", sitemap_index(&children)).await;
    for i in 0..6 {
        Mock::given(method("GET"))
            .and(path(format!("/slow-{}.xml", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(urlset(&pages(&format!("slow-{}", i), 2)))
                    .set_delay(Duration::from_millis(100)),
            )
            .mount(&server)
            .await;
    }

    let mut config = Config::default();
    config.crawler.max_concurrent_fetches = Some(2);
    let crawler = Crawler::from_config(&config).unwrap();
    assert_eq!(crawler.options().max_concurrent_fetches, Some(2));

    let stream = crawler.crawl(format!("{}/sitemap.xml", base));
    let stats = stream.stats();
    let total = reduce(stream, &ReduceMode::Total).await;

    assert_eq!(total, 12);
    let peak = stats.snapshot().peak_in_flight;
    assert!((1..=2).contains(&peak), "peak in flight was {}", peak);
}

#[tokio::test]
async fn test_unrecognized_start_yields_zero() {
    let server = MockServer::start().await;
    mount_body(&server, "/feed.xml", "<rss><channel/></rss>".to_string()).await;

    let total = reduce(
        default_crawler().crawl(format!("{}/feed.xml", server.uri())),
        &ReduceMode::Total,
    )
    .await;
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_dropping_the_stream_still_lets_the_crawl_finish() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_body(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/a.xml", base), format!("{}/b.xml", base)]),
    )
    .await;
    mount_body(&server, "/a.xml", urlset(&pages("a", 3))).await;
    mount_body(&server, "/b.xml", urlset(&pages("b", 3))).await;

    let client = build_http_client(&Config::default()).unwrap();
    let crawler = Crawler::new(
        client,
        CrawlOptions {
            max_concurrent_fetches: Some(1),
            stream_capacity: 2,
        },
    );
    let mut stream = crawler.crawl(format!("{}/sitemap.xml", base));
    assert!(stream.next().await.is_some());
    let stats = stream.stats();
    drop(stream);

    // Both children are still fetched even though nobody reads their URLs
    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        while stats.snapshot().leaf_documents < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(finished.is_ok(), "crawl stalled: {}", stats.snapshot());

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.documents_fetched, 3);
    assert_eq!(snapshot.leaf_documents, 2);
    assert_eq!(snapshot.fetch_failures, 0);
    assert!(snapshot.urls_emitted < 6);
}

#[tokio::test]
async fn test_fetch_document_statuses() {
    let server = MockServer::start().await;
    mount_body(&server, "/ok.xml", "<urlset/>".to_string()).await;
    mount_status(&server, "/missing.xml", 404).await;

    let client = build_http_client(&Config::default()).unwrap();

    let body = fetch_document(&client, &format!("{}/ok.xml", server.uri()))
        .await
        .expect("Fetch failed");
    assert_eq!(body, b"<urlset/>".to_vec());

    let err = fetch_document(&client, &format!("{}/missing.xml", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_robots_lists_sitemap_entry_points() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_body(
        &server,
        "/robots.txt",
        format!(
            "User-agent: *\nDisallow: /admin\n\nSitemap: {}/sitemap.xml\nSitemap: {}/news.xml\n",
            base, base
        ),
    )
    .await;
    mount_body(&server, "/sitemap.xml", urlset(&pages("main", 3))).await;

    let crawler = default_crawler();
    let sitemaps = fetch_sitemap_entries(crawler.client(), &format!("{}/robots.txt", base))
        .await
        .expect("Failed to read robots.txt");

    assert_eq!(
        sitemaps,
        vec![format!("{}/sitemap.xml", base), format!("{}/news.xml", base)]
    );

    let total = reduce(crawler.crawl(sitemaps[0].as_str()), &ReduceMode::Total).await;
    assert_eq!(total, 3);
}

#[tokio::test]
async fn test_robots_fetch_failure_is_reported() {
    let server = MockServer::start().await;
    mount_status(&server, "/robots.txt", 404).await;

    let client = build_http_client(&Config::default()).unwrap();
    let result = fetch_sitemap_entries(&client, &format!("{}/robots.txt", server.uri())).await;
    assert!(result.is_err());
}
