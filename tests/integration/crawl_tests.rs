//! Integration tests for the census
//!
//! These tests use wiremock to stand in for the remote API and run the full
//! census end-to-end: timeline paging, comment paging, brand lookups, the
//! progress log, the report files and sentiment enrichment.

use commenter_census::config::{
    ClientConfig, Config, CrawlerConfig, EnrichmentConfig, OutputConfig, TargetConfig,
};
use commenter_census::crawler::{run_census, StopReason};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTHOR: &str = "1000";

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, output_dir: &TempDir) -> Config {
    Config {
        target: TargetConfig {
            author_id: AUTHOR.to_string(),
            post_ids: vec![],
        },
        crawler: CrawlerConfig {
            global_limit: 100,
            per_post_limit: None,
            request_interval_seconds: 0,
            brand_lookup_pages: 1,
        },
        client: ClientConfig {
            base_url: base_url.to_string(),
            cookie: "SUB=test".to_string(),
            user_agent: None,
            timeout_seconds: 5,
        },
        output: OutputConfig {
            directory: output_dir.path().display().to_string(),
            ..OutputConfig::default()
        },
        enrichment: EnrichmentConfig::default(),
    }
}

fn post_json(id: &str, author: &str, source: &str) -> Value {
    json!({
        "idstr": format!("id-{}", id),
        "mblogid": id,
        "source": source,
        "text_raw": format!("post {}", id),
        "user": { "idstr": author }
    })
}

async fn mount_posts(server: &MockServer, uid: &str, page: u32, posts: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/ajax/statuses/mymblog"))
        .and(query_param("uid", uid))
        .and(query_param("page", page.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": 1,
            "data": { "list": posts }
        })))
        .mount(server)
        .await;
}

async fn mount_comments(server: &MockServer, post_id: &str, max_id: u64, users: &[&str], next: u64) {
    let data: Vec<Value> = users
        .iter()
        .map(|user| json!({ "text": format!("hello from {}", user), "user": { "idstr": user } }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/ajax/statuses/buildComments"))
        .and(query_param("id", post_id))
        .and(query_param("max_id", max_id.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": 1,
            "data": data,
            "max_id": next
        })))
        .mount(server)
        .await;
}

/// Two posts by the author, one repost, three distinct commenters
async fn mount_scenario(server: &MockServer) {
    mount_posts(
        server,
        AUTHOR,
        1,
        vec![
            post_json("A", AUTHOR, "iPhone 15 Pro"),
            post_json("B", AUTHOR, "iPhone 15 Pro"),
            post_json("R", "5555", "HUAWEI Mate 60"),
        ],
    )
    .await;
    mount_posts(server, AUTHOR, 2, vec![]).await;

    mount_comments(server, "A", 0, &["201", "202"], 31).await;
    mount_comments(server, "A", 31, &["201"], 0).await;
    mount_comments(server, "B", 0, &["202", "203"], 0).await;
    mount_comments(server, "R", 0, &["299"], 0).await;

    mount_posts(server, "201", 1, vec![post_json("p1", "201", "iPhone 14")]).await;
    mount_posts(server, "202", 1, vec![post_json("p2", "202", "HUAWEI Mate 60 Pro")]).await;
    mount_posts(server, "203", 1, vec![post_json("p3", "203", "SomeObscurePhone")]).await;
}

#[tokio::test]
async fn test_full_census() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    let output_dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &output_dir);

    let report = run_census(&config, Some("hash123".to_string()), CancellationToken::new())
        .await
        .expect("census should succeed");

    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.snapshot.total(), 3);
    assert_eq!(report.users_seen, 3);
    assert_eq!(report.snapshot.count("Apple"), 1);
    assert_eq!(report.snapshot.count("Huawei"), 1);
    assert_eq!(report.snapshot.count("unknown"), 1);
    assert_eq!(report.post_pages_fetched, 1);
    assert_eq!(report.posts_walked, 2);
    assert_eq!(report.comment_pages_fetched, 3);
    assert_eq!(report.config_hash.as_deref(), Some("hash123"));

    let run_dir = config.output.run_dir(AUTHOR);
    let progress = std::fs::read_to_string(run_dir.join("stats.txt")).unwrap();
    assert_eq!(progress, "201:Apple\n202:Huawei\n203:unknown\n");

    let summary = std::fs::read_to_string(run_dir.join("summary.md")).unwrap();
    assert!(summary.contains("# Commenter Census: 1000"));
    assert!(summary.contains("hash123"));

    // Enrichment is disabled, so no export is written.
    assert!(!run_dir.join("stats-llm.csv").exists());
}

#[tokio::test]
async fn test_limit_stops_census() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    let output_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), &output_dir);
    config.crawler.global_limit = 2;

    let report = run_census(&config, None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::LimitReached);
    assert_eq!(report.snapshot.total(), 2);

    let progress =
        std::fs::read_to_string(config.output.run_dir(AUTHOR).join("stats.txt")).unwrap();
    assert_eq!(progress.lines().count(), 2);
}

#[tokio::test]
async fn test_post_page_failure_still_reports() {
    let server = MockServer::start().await;

    mount_posts(&server, AUTHOR, 1, vec![post_json("A", AUTHOR, "iPhone 15")]).await;
    Mock::given(method("GET"))
        .and(path("/ajax/statuses/mymblog"))
        .and(query_param("uid", AUTHOR))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_comments(&server, "A", 0, &["201"], 0).await;
    mount_posts(&server, "201", 1, vec![post_json("p1", "201", "vivo X100")]).await;

    let output_dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &output_dir);

    let report = run_census(&config, None, CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(report.stop_reason, StopReason::FetchFailed(_)));
    assert_eq!(report.snapshot.count("Vivo"), 1);
    assert!(config.output.run_dir(AUTHOR).join("summary.md").exists());
}

#[tokio::test]
async fn test_listed_posts_census() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    let output_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), &output_dir);
    config.target.post_ids = vec!["B".to_string()];

    let report = run_census(&config, None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.posts_walked, 1);
    assert_eq!(report.post_pages_fetched, 0);
    assert_eq!(report.snapshot.total(), 2);
}

#[tokio::test]
async fn test_census_with_sentiment_enrichment() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "content": "{\"value\": 1}" } }
            ]
        })))
        .mount(&server)
        .await;

    let output_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), &output_dir);
    config.enrichment = EnrichmentConfig {
        enabled: true,
        api_key: "sk-test".to_string(),
        base_url: server.uri(),
        ..EnrichmentConfig::default()
    };

    let report = run_census(&config, None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.enrichment_results.len(), 3);
    assert!(report
        .enrichment_results
        .iter()
        .all(|result| result.sentiment_value == 1));

    let csv = std::fs::read_to_string(config.output.run_dir(AUTHOR).join("stats-llm.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("user_id,brand,sentiment_value,reasoning"));
    assert_eq!(lines.next(), Some("201,Apple,1,"));
    assert_eq!(lines.count(), 2);
}

#[tokio::test]
async fn test_cancelled_census_writes_partial_report() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    let output_dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &output_dir);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = run_census(&config, None, cancel).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert_eq!(report.snapshot.total(), 0);
    assert!(config.output.run_dir(AUTHOR).join("summary.md").exists());
}

#[tokio::test]
async fn test_unwritable_report_keeps_counts() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    let output_dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &output_dir);

    // A directory where the report file belongs makes the write fail.
    let run_dir = config.output.run_dir(AUTHOR);
    std::fs::create_dir_all(run_dir.join(&config.output.summary_file)).unwrap();

    let report = run_census(&config, None, CancellationToken::new())
        .await
        .expect("report write failure should not fail the census");

    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.snapshot.total(), 3);
    assert!(run_dir.join(&config.output.summary_file).is_dir());

    let progress = std::fs::read_to_string(run_dir.join("stats.txt")).unwrap();
    assert_eq!(progress.lines().count(), 3);
}

#[tokio::test]
async fn test_listed_posts_enrichment_sees_post_body() {
    let server = MockServer::start().await;
    mount_scenario(&server).await;

    Mock::given(method("GET"))
        .and(path("/ajax/statuses/show"))
        .and(query_param("id", "B"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(post_json("B", AUTHOR, "iPhone 15 Pro")),
        )
        .mount(&server)
        .await;

    // Only answers when the system prompt carries the post body.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("post B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "content": "{\"value\": 2}" } }
            ]
        })))
        .mount(&server)
        .await;

    let output_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), &output_dir);
    config.target.post_ids = vec!["B".to_string()];
    config.enrichment = EnrichmentConfig {
        enabled: true,
        api_key: "sk-test".to_string(),
        base_url: server.uri(),
        ..EnrichmentConfig::default()
    };

    let report = run_census(&config, None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.snapshot.total(), 2);
    assert_eq!(report.enrichment_results.len(), 2);
    assert!(report
        .enrichment_results
        .iter()
        .all(|result| result.sentiment_value == 2));
}
