//! Integration tests for the crawler
//!
//! The host-scoped scenarios run against an in-memory scripted fetcher so
//! they can use real host names; the end-to-end tests use wiremock to serve
//! pages and robots.txt over HTTP.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use webcrawler::config::CrawlConfig;
use webcrawler::crawler::{
    ContentExtractor, Coordinator, ExtractError, FetchError, FetchedPage, FetchedResponse,
    Fetcher, TagTextExtractor,
};
use webcrawler::output::{MemorySink, PageRecord};
use webcrawler::robots::AllowAll;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory fetcher with per-host concurrency tracking
#[derive(Default)]
struct ScriptedFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
    delay: Duration,
    log: Mutex<Vec<String>>,
    in_flight: Mutex<HashMap<String, usize>>,
    peak: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self::default()
    }

    fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    fn fail(mut self, url: &str, reason: FetchError) -> Self {
        self.pages.insert(url.to_string(), Err(reason));
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn fetch_count(&self, url: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    fn peak_for(&self, host: &str) -> usize {
        self.peak.lock().unwrap().get(host).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, FetchError> {
        let host = url.host_str().unwrap_or_default().to_string();
        self.log.lock().unwrap().push(url.to_string());

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let current = in_flight.entry(host.clone()).or_insert(0);
            *current += 1;
            let mut peak = self.peak.lock().unwrap();
            let max = peak.entry(host.clone()).or_insert(0);
            *max = (*max).max(*current);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        *self.in_flight.lock().unwrap().get_mut(&host).unwrap() -= 1;

        match self.pages.get(url.as_str()) {
            Some(Ok(body)) => Ok(FetchedResponse::Page(FetchedPage {
                status_code: 200,
                body: body.clone(),
            })),
            Some(Err(e)) => Err(e.clone()),
            None => Err(FetchError::Status {
                code: 404,
                reason: "Not Found".to_string(),
            }),
        }
    }
}

struct BrokenExtractor;

impl ContentExtractor for BrokenExtractor {
    fn extract(&self, _raw_html: &str, _tags: &[String]) -> Result<String, ExtractError> {
        Err(ExtractError::Failed("unsupported markup".to_string()))
    }
}

fn test_config(seeds: &[&str], max_depth: u32) -> CrawlConfig {
    let mut config = CrawlConfig::with_seeds(seeds.iter().copied());
    config.crawler.max_depth = max_depth;
    config.crawler.request_delay_ms = 0;
    config
}

fn coordinator(
    config: CrawlConfig,
    fetcher: Arc<ScriptedFetcher>,
    extractor: Option<Arc<dyn ContentExtractor>>,
    sink: &MemorySink,
) -> Coordinator {
    Coordinator::with_collaborators(
        config,
        fetcher,
        Arc::new(AllowAll),
        extractor,
        Box::new(sink.clone()),
    )
}

fn record_urls(records: &[PageRecord]) -> Vec<String> {
    let mut urls: Vec<String> = records.iter().map(|r| r.url().to_string()).collect();
    urls.sort();
    urls
}

const PAGE_A: &str = r#"<html><body>
    <p>Page A</p>
    <a href="https://example.com/b">B</a>
    <a href="https://external.com/x">X</a>
    <a href="https://example.com/fr/c">C</a>
</body></html>"#;

const PAGE_B: &str = r#"<html><body>
    <p>Page B</p>
    <a href="https://example.com/d">D</a>
</body></html>"#;

#[tokio::test]
async fn test_scope_exclusion_and_depth_scenario() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://example.com/a", PAGE_A)
            .page("https://example.com/b", PAGE_B)
            .page("https://external.com/x", "<p>x</p>")
            .page("https://example.com/fr/c", "<p>c</p>")
            .page("https://example.com/d", "<p>d</p>"),
    );
    let sink = MemorySink::new();

    let stats = coordinator(
        test_config(&["https://example.com/a"], 1),
        fetcher.clone(),
        None,
        &sink,
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(PageRecord::is_success));
    assert_eq!(
        record_urls(&records),
        vec!["https://example.com/a", "https://example.com/b"]
    );

    let mut fetched = fetcher.fetched();
    fetched.sort();
    assert_eq!(fetched, vec!["https://example.com/a", "https://example.com/b"]);

    assert_eq!(stats.pages_succeeded, 2);
    assert_eq!(stats.out_of_scope_links, 1);
    assert_eq!(stats.excluded_links, 1);
    assert_eq!(stats.depth_truncated_pages, 1);
}

#[tokio::test]
async fn test_fetch_failure_is_dead_end() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://example.com/a", PAGE_A)
            .fail(
                "https://example.com/b",
                FetchError::Connect("connection reset".to_string()),
            )
            .page("https://example.com/d", "<p>d</p>"),
    );
    let sink = MemorySink::new();

    let stats = coordinator(
        test_config(&["https://example.com/a"], 3),
        fetcher.clone(),
        None,
        &sink,
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert!(records.contains(&PageRecord::error(
        "https://example.com/b",
        "Connection failed: connection reset"
    )));
    assert_eq!(fetcher.fetch_count("https://example.com/d"), 0);
    assert_eq!(stats.pages_failed, 1);
}

#[tokio::test]
async fn test_http_status_failure_record() {
    let fetcher = Arc::new(ScriptedFetcher::new().page(
        "https://example.com/a",
        r#"<a href="/missing">gone</a>"#,
    ));
    let sink = MemorySink::new();

    coordinator(
        test_config(&["https://example.com/a"], 1),
        fetcher,
        None,
        &sink,
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    assert!(sink.records().contains(&PageRecord::error(
        "https://example.com/missing",
        "HTTP 404 Not Found"
    )));
}

#[tokio::test]
async fn test_shared_link_fetched_once() {
    let linking = r#"<a href="https://example.com/shared">shared</a>"#;
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://example.com/one", linking)
            .page("https://example.com/two", linking)
            .page("https://example.com/three", linking)
            .page("https://example.com/shared", "<p>shared</p>")
            .with_delay(Duration::from_millis(10)),
    );
    let sink = MemorySink::new();

    let stats = coordinator(
        test_config(
            &[
                "https://example.com/one",
                "https://example.com/two",
                "https://example.com/three",
            ],
            2,
        ),
        fetcher.clone(),
        None,
        &sink,
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    assert_eq!(fetcher.fetch_count("https://example.com/shared"), 1);
    let shared_records = sink
        .records()
        .iter()
        .filter(|r| r.url() == "https://example.com/shared")
        .count();
    assert_eq!(shared_records, 1);
    assert_eq!(stats.links_admitted, 1);
    assert_eq!(stats.duplicate_links, 2);
}

#[tokio::test]
async fn test_per_host_concurrency_bound() {
    let links: String = (0..24)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    let mut scripted = ScriptedFetcher::new()
        .page("https://example.com/", &links)
        .with_delay(Duration::from_millis(20));
    for i in 0..24 {
        scripted = scripted.page(&format!("https://example.com/p{}", i), "<p>leaf</p>");
    }
    let fetcher = Arc::new(scripted);
    let sink = MemorySink::new();

    let mut config = test_config(&["https://example.com/"], 1);
    config.crawler.per_host_concurrency = 3;
    config.crawler.global_concurrency = 16;

    coordinator(config, fetcher.clone(), None, &sink)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink.records().len(), 25);
    let peak = fetcher.peak_for("example.com");
    assert!(peak <= 3, "peak in-flight for one host was {}", peak);
    assert!(peak >= 2, "fetches were never concurrent (peak {})", peak);
}

#[tokio::test]
async fn test_hosts_do_not_share_limits() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://one.example/", "<p>1</p>")
            .page("https://two.example/", "<p>2</p>")
            .with_delay(Duration::from_millis(50)),
    );
    let sink = MemorySink::new();

    let mut config = test_config(&["https://one.example/", "https://two.example/"], 0);
    config.crawler.per_host_concurrency = 1;

    coordinator(config, fetcher.clone(), None, &sink)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink.records().len(), 2);
    assert_eq!(fetcher.peak_for("one.example"), 1);
    assert_eq!(fetcher.peak_for("two.example"), 1);
}

#[tokio::test]
async fn test_depth_bound_on_chain() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://example.com/0", r#"<a href="/1">1</a>"#)
            .page("https://example.com/1", r#"<a href="/2">2</a>"#)
            .page("https://example.com/2", r#"<a href="/3">3</a>"#)
            .page("https://example.com/3", r#"<a href="/4">4</a>"#),
    );
    let sink = MemorySink::new();

    coordinator(
        test_config(&["https://example.com/0"], 2),
        fetcher.clone(),
        None,
        &sink,
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    assert_eq!(
        record_urls(&sink.records()),
        vec![
            "https://example.com/0",
            "https://example.com/1",
            "https://example.com/2"
        ]
    );
    assert_eq!(fetcher.fetch_count("https://example.com/3"), 0);
}

#[tokio::test]
async fn test_extraction_failure_keeps_success_record() {
    let fetcher = Arc::new(ScriptedFetcher::new().page("https://example.com/", "<p>body</p>"));
    let sink = MemorySink::new();

    let stats = coordinator(
        test_config(&["https://example.com/"], 0),
        fetcher,
        Some(Arc::new(BrokenExtractor)),
        &sink,
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    assert_eq!(
        sink.records(),
        vec![PageRecord::success("https://example.com/", "<p>body</p>", None)]
    );
    assert_eq!(stats.extraction_failures, 1);
}

#[tokio::test]
async fn test_extracted_content_in_record() {
    let fetcher = Arc::new(ScriptedFetcher::new().page(
        "https://example.com/",
        "<html><body><h1>Title</h1><p>Hello <a href=\"/x\">there</a></p></body></html>",
    ));
    let sink = MemorySink::new();

    coordinator(
        test_config(&["https://example.com/"], 0),
        fetcher,
        Some(Arc::new(TagTextExtractor)),
        &sink,
    )
    .run(CancellationToken::new())
    .await
    .unwrap();

    match &sink.records()[0] {
        PageRecord::Success { page_content, .. } => {
            assert_eq!(page_content.as_deref(), Some("Title Hello there (/x)"));
        }
        other => panic!("expected success record, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_drains_in_flight() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://example.com/", r#"<a href="/next">next</a>"#)
            .page("https://example.com/next", "<p>never</p>")
            .with_delay(Duration::from_millis(200)),
    );
    let sink = MemorySink::new();

    let mut config = test_config(&["https://example.com/"], 3);
    config.crawler.drain_timeout_secs = 5;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let stats = coordinator(config, fetcher.clone(), None, &sink)
        .run(cancel)
        .await
        .unwrap();

    // The in-flight seed finished and was emitted; its child was never dispatched.
    assert_eq!(
        record_urls(&sink.records()),
        vec!["https://example.com/"]
    );
    assert_eq!(fetcher.fetch_count("https://example.com/next"), 0);
    assert_eq!(stats.abandoned, 0);
}

#[tokio::test]
async fn test_cancel_abandons_after_drain_timeout() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("https://example.com/", "<p>slow</p>")
            .with_delay(Duration::from_secs(30)),
    );
    let sink = MemorySink::new();

    let mut config = test_config(&["https://example.com/"], 1);
    config.crawler.drain_timeout_secs = 0;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let stats = tokio::time::timeout(
        Duration::from_secs(5),
        coordinator(config, fetcher, None, &sink).run(cancel),
    )
    .await
    .expect("crawl did not stop")
    .unwrap();

    assert!(sink.records().is_empty());
    assert_eq!(stats.abandoned, 1);
}

#[tokio::test]
async fn test_end_to_end_http_with_robots() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<html><body><h1>Home</h1>
                    <a href="{base}/page1">Page 1</a>
                    <a href="/page2#section">Page 2</a>
                    <a href="/admin/panel">Admin</a>
                    <a href="/it/ciao">Italian</a>
                    <a href="https://external.example/">Elsewhere</a>
                    </body></html>"#
                ))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<p>Content 1</p><a href="/">home</a>"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/panel"))
        .respond_with(ResponseTemplate::new(200).set_body_string("secret"))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/it/ciao"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out/output.jsonl");
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();
    std::fs::write(&output, "stale\n").unwrap();

    let seed = format!("{}/", base);
    let mut config = test_config(&[seed.as_str()], 2);
    config.crawler.request_timeout_secs = 5;
    config.output.path = output.to_string_lossy().into_owned();

    let stats = Coordinator::new(config)
        .await
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(!content.contains("stale"));

    let lines: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);

    let by_path: HashMap<String, &Value> = lines
        .iter()
        .map(|v| {
            let url = Url::parse(v["url"].as_str().unwrap()).unwrap();
            (url.path().to_string(), v)
        })
        .collect();

    assert!(by_path["/"]["html"].as_str().unwrap().contains("<h1>Home</h1>"));
    assert!(by_path["/"]["page_content"]
        .as_str()
        .unwrap()
        .starts_with("Home"));
    assert_eq!(by_path["/page1"]["page_content"], "Content 1 home (/)");
    assert_eq!(by_path["/page2"]["error"], "HTTP 500 Internal Server Error");
    assert_eq!(by_path["/admin/panel"]["error"], "Forbidden by robots.txt");

    assert_eq!(stats.records(), 4);
    assert_eq!(stats.robots_denied, 1);
    assert_eq!(stats.excluded_links, 1);
    assert_eq!(stats.out_of_scope_links, 1);
}

async fn serve(server: &MockServer, route: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

async fn serve_redirect(server: &MockServer, route: &str, location: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(301).insert_header("location", location))
        .expect(1)
        .mount(server)
        .await;
}

fn http_config(seed: &str, max_depth: u32, dir: &tempfile::TempDir) -> CrawlConfig {
    let mut config = test_config(&[seed], max_depth);
    config.crawler.request_timeout_secs = 5;
    config.crawler.respect_robots = false;
    config.output.path = dir.path().join("output.jsonl").to_string_lossy().into_owned();
    config
}

fn read_records(dir: &tempfile::TempDir) -> HashMap<String, Value> {
    let content = std::fs::read_to_string(dir.path().join("output.jsonl")).unwrap();
    content
        .lines()
        .map(|line| {
            let value: Value = serde_json::from_str(line).unwrap();
            let url = Url::parse(value["url"].as_str().unwrap()).unwrap();
            (url.path().to_string(), value)
        })
        .collect()
}

#[tokio::test]
async fn test_redirect_to_visited_page_not_refetched() {
    let server = MockServer::start().await;
    serve(&server, "/a", r#"<a href="/b">b</a><a href="/c">c</a>"#, 1).await;
    serve(&server, "/b", "<p>B</p>", 1).await;
    serve_redirect(&server, "/c", "/b").await;

    let dir = tempfile::tempdir().unwrap();
    let seed = format!("{}/a", server.uri());
    let stats = Coordinator::new(http_config(&seed, 1, &dir))
        .await
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    let records = read_records(&dir);
    assert_eq!(records.len(), 3);
    assert_eq!(records["/b"]["html"], "<p>B</p>");
    assert_eq!(records["/c"]["error"], "Redirected to already visited URL");
    assert!(records["/c"].get("html").is_none());
    assert_eq!(stats.pages_succeeded, 2);
    assert_eq!(stats.pages_failed, 1);
}

#[tokio::test]
async fn test_redirect_target_claimed_for_the_crawl() {
    let server = MockServer::start().await;
    serve(&server, "/a", r#"<a href="/old">old</a>"#, 1).await;
    serve_redirect(&server, "/old", "/new").await;
    serve(
        &server,
        "/new",
        r#"<p>New</p><a href="/new">self</a><a href="old">back</a>"#,
        1,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let seed = format!("{}/a", server.uri());
    let stats = Coordinator::new(http_config(&seed, 3, &dir))
        .await
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    let records = read_records(&dir);
    assert_eq!(records.len(), 2);
    assert!(records["/old"]["html"].as_str().unwrap().contains("<p>New</p>"));
    assert!(!records.contains_key("/new"));
    assert_eq!(stats.duplicate_links, 2);
}
