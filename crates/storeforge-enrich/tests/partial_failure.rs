use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use storeforge_core::{EnrichConfig, RequestPolicy};
use storeforge_enrich::{Enricher, SourceStatus};

const WEATHER_BODY: &str =
    r#"{"main":{"temp":21.5,"humidity":48},"weather":[{"main":"Clear","description":"clear sky"}]}"#;
const SOCIAL_BODY: &str = r#"{"data":{"children":[
    {"data":{"id":"p1","title":"Best deals this week","score":12,"num_comments":3,
             "subreddit":"deals","author":"a","permalink":"/r/deals/p1/","created_utc":1714550400}},
    {"data":{"id":"p2","title":"Returns policy rant","score":-2,"num_comments":0,
             "created_utc":1714550500}}
]}}"#;
const LISTING_PAGE: &str = r#"
<div class="product-item">
  <h3 class="product-name">Desk Lamp</h3>
  <span class="price">$24.50</span>
  <div class="rating">4.1</div>
</div> <!-- /product-item -->
"#;

/// Minimal HTTP/1.1 responder serving canned bodies by path.
async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = vec![0_u8; 8192];
                let mut read = 0;
                loop {
                    let Ok(n) = stream.read(&mut buf[read..]).await else {
                        return;
                    };
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|window| window == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }
                let request = String::from_utf8_lossy(&buf[..read]);
                let target = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                let (content_type, body) = if target.starts_with("/weather?q=Atlantis") {
                    ("text/plain", "")
                } else if target.starts_with("/weather?q=Garbled") {
                    ("application/json", "{\"main\": {\"temp\": ")
                } else if target.starts_with("/weather") {
                    ("application/json", WEATHER_BODY)
                } else if target.starts_with("/search.json") {
                    ("application/json", SOCIAL_BODY)
                } else if target.starts_with("/shop/category/books") && target.contains("page=1") {
                    ("text/html", LISTING_PAGE)
                } else if target.starts_with("/shop/category/") {
                    ("text/html", "<html><body>no results</body></html>")
                } else {
                    ("text/plain", "")
                };
                let status = if body.is_empty() { "404 Not Found" } else { "200 OK" };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// A local port with nothing listening on it.
async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

fn fast_policy() -> RequestPolicy {
    RequestPolicy {
        min_interval_ms: 0,
        jitter_ms: 0,
        max_attempts: 2,
        timeout_secs: 5,
        ..RequestPolicy::default()
    }
}

fn temp_out_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "storeforge_enrich_{label}_{}",
        uuid::Uuid::new_v4()
    ));
    dir
}

#[tokio::test]
async fn unreachable_source_does_not_stop_reachable_ones() {
    let server = spawn_server().await;
    let closed = closed_port().await;

    let mut config = EnrichConfig {
        request: fast_policy(),
        ..EnrichConfig::default()
    };
    config.weather.endpoint = format!("http://{server}/weather");
    config.weather.api_key = Some("test-key".to_string());
    config.weather.cities = vec!["Chicago".to_string(), "Houston".to_string()];
    config.economic.endpoint = format!("http://{closed}/fred/series/observations");
    config.economic.api_key = Some("test-key".to_string());
    config.social.endpoint = format!("http://{server}/search.json");
    config.social.keywords = vec!["ecommerce".to_string()];
    config.competitor.enabled = true;
    config.competitor.base_url = Some(format!("http://{server}/shop"));
    config.competitor.categories = vec!["books".to_string()];

    let out_dir = temp_out_dir("partial");
    let report = Enricher::new(&config).run(&out_dir).await.expect("run completes");

    let weather = report.source("weather").expect("weather report");
    assert_eq!(weather.status, SourceStatus::Ok);
    assert_eq!(weather.records_written, 2);
    let weather_file = fs::read_to_string(out_dir.join("weather_observations.csv")).expect("weather csv");
    assert_eq!(weather_file.lines().count(), 3);
    assert!(weather_file.contains("Chicago"));

    let economic = report.source("economic").expect("economic report");
    assert_eq!(economic.status, SourceStatus::Failed);
    assert!(economic.message.as_deref().unwrap_or_default().contains("fetch failed"));
    assert!(!out_dir.join("economic_indicators.csv").exists());

    let social = report.source("social").expect("social report");
    assert_eq!(social.status, SourceStatus::Ok);
    assert_eq!(social.records_written, 2);

    let competitor = report.source("competitor").expect("competitor report");
    assert_eq!(competitor.status, SourceStatus::Ok);
    assert_eq!(competitor.records_written, 1);

    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn failed_cities_do_not_discard_fetched_ones() {
    let server = spawn_server().await;

    let mut config = EnrichConfig {
        request: fast_policy(),
        ..EnrichConfig::default()
    };
    config.weather.endpoint = format!("http://{server}/weather");
    config.weather.api_key = Some("test-key".to_string());
    config.weather.cities = vec![
        "Chicago".to_string(),
        "Atlantis".to_string(),
        "Houston".to_string(),
        "Garbled".to_string(),
    ];
    config.economic.enabled = false;
    config.social.enabled = false;
    config.competitor.enabled = false;

    let out_dir = temp_out_dir("cities");
    let report = Enricher::new(&config).run(&out_dir).await.expect("run completes");

    let weather = report.source("weather").expect("weather report");
    assert_eq!(weather.status, SourceStatus::Ok);
    assert_eq!(weather.records_written, 2);
    assert_eq!(weather.requests_failed, 1);
    assert_eq!(weather.records_skipped, 1);
    assert!(weather.message.as_deref().unwrap_or_default().contains("1 request(s) failed"));

    let weather_file = fs::read_to_string(out_dir.join("weather_observations.csv")).expect("weather csv");
    assert_eq!(weather_file.lines().count(), 3);
    assert!(weather_file.contains("Chicago"));
    assert!(weather_file.contains("Houston"));
    assert!(!weather_file.contains("Atlantis"));
    assert_eq!(report.failed(), 0);
}

#[tokio::test]
async fn source_fails_when_every_request_fails() {
    let server = spawn_server().await;

    let mut config = EnrichConfig {
        request: fast_policy(),
        ..EnrichConfig::default()
    };
    config.weather.endpoint = format!("http://{server}/weather");
    config.weather.api_key = Some("test-key".to_string());
    config.weather.cities = vec!["Atlantis".to_string()];
    config.economic.enabled = false;
    config.social.enabled = false;
    config.competitor.enabled = false;

    let out_dir = temp_out_dir("all_failed");
    let report = Enricher::new(&config).run(&out_dir).await.expect("run completes");

    let weather = report.source("weather").expect("weather report");
    assert_eq!(weather.status, SourceStatus::Failed);
    assert!(weather.message.as_deref().unwrap_or_default().contains("404"));
    assert!(!out_dir.join("weather_observations.csv").exists());
}

#[tokio::test]
async fn missing_credentials_fail_or_fall_back() {
    let mut config = EnrichConfig {
        request: fast_policy(),
        ..EnrichConfig::default()
    };
    config.weather.api_key = None;
    config.weather.synthetic_fallback = true;
    config.weather.cities = vec!["Phoenix".to_string()];
    config.economic.api_key = None;
    config.economic.synthetic_fallback = false;
    config.social.enabled = false;
    config.competitor.enabled = false;

    let out_dir = temp_out_dir("credentials");
    let report = Enricher::new(&config).run(&out_dir).await.expect("run completes");

    let weather = report.source("weather").expect("weather report");
    assert_eq!(weather.status, SourceStatus::Ok);
    assert!(weather.synthetic);
    assert_eq!(weather.records_written, 30);

    let economic = report.source("economic").expect("economic report");
    assert_eq!(economic.status, SourceStatus::Failed);
    assert!(
        economic
            .message
            .as_deref()
            .unwrap_or_default()
            .contains("FRED_API_KEY")
    );

    assert_eq!(
        report.source("social").map(|source| source.status),
        Some(SourceStatus::Skipped)
    );
}
