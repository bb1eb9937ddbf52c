//! Integration tests for the title fetcher
//!
//! These tests use wiremock to create mock HTTP servers and test
//! fetching, retrying, batching and report writing end-to-end.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use titlescan::config::{Config, FetchConfig};
use titlescan::crawler::{
    build_http_client, fetch_page, fetch_with_retry, BatchRunner, Coordinator, HttpFetcher,
    HttpSessionFactory, RetryPolicy,
};
use titlescan::state::{Bucket, FetchError, Tally};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fetch configuration with short timeouts and retry delays
fn create_test_fetch_config() -> FetchConfig {
    FetchConfig {
        timeout_secs: 1,
        retry_delay_ms: 10,
        max_concurrent_requests: 4,
        chunk_size: 3,
        ..FetchConfig::default()
    }
}

fn create_test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.fetch = create_test_fetch_config();
    config.io.input_dir = root.join("output");
    config.io.output_dir = root.join("URLTitles");
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_h1_wins_over_title() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/page",
        "<html><head><title>Site</title></head><body><h1> Hello </h1></body></html>",
    )
    .await;

    let client = build_http_client(&create_test_fetch_config()).unwrap();
    let url = format!("{}/page", mock_server.uri());
    let outcome = fetch_page(&client, &url).await;

    assert_eq!(outcome.url, url);
    assert_eq!(outcome.title(), Some("Hello"));
}

#[tokio::test]
async fn test_title_used_without_h1() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/page",
        "<html><head><title>Only Title</title></head><body><p>x</p></body></html>",
    )
    .await;

    let client = build_http_client(&create_test_fetch_config()).unwrap();
    let outcome = fetch_page(&client, &format!("{}/page", mock_server.uri())).await;

    assert_eq!(outcome.title(), Some("Only Title"));
}

#[tokio::test]
async fn test_page_without_headings() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/bare", "<html></html>").await;

    let client = build_http_client(&create_test_fetch_config()).unwrap();
    let outcome = fetch_page(&client, &format!("{}/bare", mock_server.uri())).await;

    assert_eq!(outcome.error(), Some(&FetchError::NoTitleFound));
}

#[tokio::test]
async fn test_server_error_is_retried_until_budget_exhausted() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_fetch_config();
    let fetcher = HttpFetcher::new(build_http_client(&config).unwrap());
    let policy = RetryPolicy::from_config(&config);

    let retried = fetch_with_retry(&fetcher, &format!("{}/flaky", mock_server.uri()), &policy).await;

    assert_eq!(retried.attempts, 3);
    assert_eq!(retried.outcome.error(), Some(&FetchError::HttpStatus(503)));
    assert_eq!(Bucket::classify(&retried.outcome), Bucket::ServerError);
}

#[tokio::test]
async fn test_client_error_is_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_fetch_config();
    let fetcher = HttpFetcher::new(build_http_client(&config).unwrap());
    let policy = RetryPolicy::from_config(&config);

    let retried = fetch_with_retry(&fetcher, &format!("{}/gone", mock_server.uri()), &policy).await;

    assert_eq!(retried.outcome.error(), Some(&FetchError::HttpStatus(404)));
    assert_eq!(Bucket::classify(&retried.outcome), Bucket::ClientError);
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/later"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/later", "<title>Back</title>").await;

    let config = create_test_fetch_config();
    let fetcher = HttpFetcher::new(build_http_client(&config).unwrap());
    let policy = RetryPolicy::from_config(&config);

    let retried = fetch_with_retry(&fetcher, &format!("{}/later", mock_server.uri()), &policy).await;

    assert_eq!(retried.attempts, 2);
    assert_eq!(retried.outcome.title(), Some("Back"));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<title>Late</title>").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = FetchConfig {
        max_attempts: 1,
        ..create_test_fetch_config()
    };
    let fetcher = HttpFetcher::new(build_http_client(&config).unwrap());
    let policy = RetryPolicy::from_config(&config);

    let retried = fetch_with_retry(&fetcher, &format!("{}/slow", mock_server.uri()), &policy).await;

    assert_eq!(retried.attempts, 1);
    assert_eq!(retried.outcome.error(), Some(&FetchError::Timeout));
    assert_eq!(Bucket::classify(&retried.outcome), Bucket::OtherError);
}

#[tokio::test]
async fn test_batch_runner_over_http() {
    let mock_server = MockServer::start().await;
    for i in 0..5 {
        mount_page(
            &mock_server,
            &format!("/ok/{}", i),
            &format!("<h1>Page {}</h1>", i),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/empty", "<html><body></body></html>").await;

    let mut urls: Vec<String> = (0..5)
        .map(|i| format!("{}/ok/{}", mock_server.uri(), i))
        .collect();
    urls.push(format!("{}/broken", mock_server.uri()));
    urls.push(format!("{}/empty", mock_server.uri()));

    let config = create_test_fetch_config();
    let runner = BatchRunner::from_config(HttpSessionFactory::new(config.clone()), &config);
    let tally = Arc::new(Tally::new());

    let mut chunks_seen = 0;
    let outcomes = runner
        .run_with_progress(&urls, &tally, |_| chunks_seen += 1)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), urls.len());
    // chunk size 3 over 7 URLs
    assert_eq!(chunks_seen, 3);

    let snapshot = tally.snapshot();
    assert_eq!(snapshot.success, 5);
    assert_eq!(snapshot.server_error, 1);
    assert_eq!(snapshot.other_error, 1);
    assert_eq!(snapshot.total(), urls.len() as u64);

    let mut returned: Vec<&str> = outcomes.iter().map(|o| o.url.as_str()).collect();
    let mut expected: Vec<&str> = urls.iter().map(String::as_str).collect();
    returned.sort();
    expected.sort();
    assert_eq!(returned, expected);
}

#[tokio::test]
async fn test_full_run_writes_reports() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/a", "<h1>Alpha</h1>").await;
    mount_page(&mock_server, "/b", "<title>Beta, Inc.</title>").await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let root = TempDir::new().unwrap();
    let input = root.path().join("output");
    fs::create_dir_all(&input).unwrap();
    fs::write(
        input.join("first.txt"),
        format!(
            "{0}/a\n\n  {0}/missing  \n",
            mock_server.uri()
        ),
    )
    .unwrap();
    fs::write(input.join("second.txt"), format!("{}/b\n", mock_server.uri())).unwrap();
    fs::write(input.join("ignored.md"), "not a url list").unwrap();

    let coordinator = Coordinator::new(create_test_config(root.path()));
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.total_urls(), 3);
    assert_eq!(summary.failed_reports(), 0);

    let first = &summary.files[0];
    assert_eq!(first.name, "first.txt");
    assert_eq!(first.tally.success, 1);
    assert_eq!(first.tally.client_error, 1);

    let report = first.report.as_ref().unwrap();
    let file_name = report.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("first_"));
    assert!(file_name.ends_with(".csv"));

    let mut reader = csv::Reader::from_path(report).unwrap();
    assert_eq!(reader.headers().unwrap(), vec!["URL", "Title"]);
    let mut rows: Vec<(String, String)> = reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].to_string())
        })
        .collect();
    rows.sort();
    assert_eq!(
        rows,
        vec![
            (format!("{}/a", mock_server.uri()), "Alpha".to_string()),
            (
                format!("{}/missing", mock_server.uri()),
                "Error: HTTP 404".to_string()
            ),
        ]
    );

    let second = summary.files[1].report.as_ref().unwrap();
    let content = fs::read_to_string(second).unwrap();
    assert!(content.contains("\"Beta, Inc.\""));
}
