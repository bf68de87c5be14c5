//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use polite_crawler::config::Config;
use polite_crawler::crawler::{Coordinator, CrawlState, StopReason};
use polite_crawler::output::SqliteSink;
use polite_crawler::state::PageState;
use polite_crawler::storage::{RunStatus, SqliteStorage, Storage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration crawling from the given seed
fn create_test_config(seed: &str) -> Config {
    let mut config = Config::default();
    config.seeds = vec![seed.to_string()];
    config.crawler.max_depth = 2;
    config.crawler.workers = 4;
    config.crawler.min_host_delay_ms = 0;
    config.crawler.fetch_timeout_ms = 2_000;
    config.crawler.grace_period_ms = 200;
    config.crawler.max_retries = 0;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawls_seed_children_and_ignores_self_link() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(404)).await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/a">A</a>
            <a href="/b">B</a>
            <a href="/c">C</a>
            <a href="/">Home</a>
        </body></html>"#,
    )
    .await;
    for route in ["/a", "/b", "/c"] {
        mount_page(&server, route, "<html><body>leaf</body></html>").await;
    }

    let config = create_test_config(&server.uri());
    let report = Coordinator::new(config).unwrap().run().await;

    assert_eq!(report.state, CrawlState::Stopped);
    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.stats.pages_fetched, 4);
    assert!(report.stats.links_discovered >= 4);
    assert!(report.stats.pages_fetched + report.stats.pages_failed <= report.stats.pages_dispatched);

    // The seed was fetched once despite linking to itself
    let seed_hits = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/")
        .count();
    assert_eq!(seed_hits, 1);
}

#[tokio::test]
async fn test_global_timeout_cancels_slow_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(r#"<a href="/next">next</a>"#).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.crawler.global_timeout_ms = 100;
    config.crawler.grace_period_ms = 50;
    config.crawler.respect_robots = false;

    let started = Instant::now();
    let report = Coordinator::new(config).unwrap().run().await;
    let elapsed = started.elapsed();

    assert_eq!(report.state, CrawlState::Stopped);
    assert_eq!(report.stop_reason, StopReason::Timeout);
    assert_eq!(report.stats.pages_fetched, 0);
    assert!(report.stats.pages_cancelled >= 1);
    assert_eq!(report.stats.pages_dispatched, report.stats.pages_completed());
    assert!(elapsed < Duration::from_millis(100 + 50 + 2_000));
}

#[tokio::test]
async fn test_robots_failure_fails_open() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(500)).await;
    mount_page(&server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&server, "/a", "<p>a</p>").await;

    let report = Coordinator::new(create_test_config(&server.uri()))
        .unwrap()
        .run()
        .await;

    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.robots_failures, 1);
    assert_eq!(report.stats.pages_disallowed, 0);
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
    )
    .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/public">public</a><a href="/private/page">private</a>"#,
    )
    .await;
    mount_page(&server, "/public", "<p>public</p>").await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let report = Coordinator::new(create_test_config(&server.uri()))
        .unwrap()
        .run()
        .await;

    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.pages_disallowed, 1);
    assert_eq!(report.stats.robots_failures, 0);
}

#[tokio::test]
async fn test_depth_limit_bounds_the_crawl() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(404)).await;
    mount_page(&server, "/", r#"<a href="/1">1</a>"#).await;
    mount_page(&server, "/1", r#"<a href="/2">2</a>"#).await;
    mount_page(&server, "/2", r#"<a href="/3">3</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/3"))
        .respond_with(html("<p>too deep</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let report = Coordinator::new(create_test_config(&server.uri()))
        .unwrap()
        .run()
        .await;

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(report.stats.pages_dispatched, 3);
}

#[tokio::test]
async fn test_missing_pages_are_failures() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(404)).await;
    mount_page(&server, "/", r#"<a href="/gone">gone</a><a href="/here">here</a>"#).await;
    mount_page(&server, "/here", "<p>here</p>").await;

    let report = Coordinator::new(create_test_config(&server.uri()))
        .unwrap()
        .run()
        .await;

    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.pages_failed, 1);
    assert_eq!(report.stats.retries, 0);
    assert!(report.stats.pages_fetched + report.stats.pages_failed <= report.stats.pages_dispatched);
}

#[tokio::test]
async fn test_outcomes_are_persisted_to_sqlite() {
    let server = MockServer::start().await;
    mount_robots(&server, ResponseTemplate::new(404)).await;
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "<p>a</p>").await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");
    let sink = Arc::new(SqliteSink::open(&db_path, "test-hash").unwrap());
    let run_id = sink.run_id();

    let report = Coordinator::new(create_test_config(&server.uri()))
        .unwrap()
        .sink(sink.clone())
        .run()
        .await;
    assert_eq!(sink.write_errors(), 0);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.id, run_id);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.stats.pages_fetched, report.stats.pages_fetched);

    assert_eq!(
        storage
            .count_outcomes_by_state(run_id, PageState::Fetched)
            .unwrap(),
        2
    );
    assert_eq!(
        storage
            .count_outcomes_by_state(run_id, PageState::Failed)
            .unwrap(),
        1
    );
    assert_eq!(storage.get_outcomes(run_id).unwrap().len(), 3);
}

#[tokio::test]
async fn test_stop_handle_ends_crawl_early() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(r#"<a href="/next">next</a>"#).set_delay(Duration::from_secs(1)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.crawler.respect_robots = false;
    config.crawler.grace_period_ms = 50;

    let coordinator = Coordinator::new(config).unwrap();
    let handle = coordinator.shutdown_handle();
    let run = tokio::spawn(coordinator.run());

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.stop();

    let report = tokio::time::timeout(Duration::from_secs(3), run)
        .await
        .expect("crawl did not stop")
        .unwrap();
    assert_eq!(report.stop_reason, StopReason::Requested);
    assert_eq!(report.stats.pages_fetched, 0);
    assert_eq!(report.stats.pages_cancelled, 1);
}
