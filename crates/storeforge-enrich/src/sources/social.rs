use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use storeforge_core::{SocialMention, SocialSourceConfig};

use super::{ExternalSource, RequestTally, SourceOutcome, f64_field, field, slug, str_field};
use crate::errors::EnrichError;
use crate::http::Fetcher;

const PLATFORM: &str = "reddit";
const PERMALINK_BASE: &str = "https://reddit.com";

/// Recent posts per keyword from a Reddit-compatible search endpoint.
pub struct SocialSource {
    config: SocialSourceConfig,
}

impl SocialSource {
    pub fn new(config: SocialSourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ExternalSource for SocialSource {
    fn name(&self) -> &'static str {
        "social"
    }

    async fn run(&self, fetcher: &mut Fetcher, out_dir: &Path) -> Result<SourceOutcome, EnrichError> {
        let limit = self.config.limit.to_string();
        let mut records = Vec::new();
        let mut tally = RequestTally::new();

        for keyword in &self.config.keywords {
            let response = fetcher
                .get_json(
                    &self.config.endpoint,
                    &[("q", keyword.as_str()), ("sort", "new"), ("limit", limit.as_str())],
                )
                .await;
            let Some(body) = tally.settle(self.name(), keyword, response) else {
                continue;
            };
            let scraped_at = Utc::now().naive_utc();
            let parsed = match parse_listing(keyword, &body, scraped_at) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(source = self.name(), keyword = %keyword, error = %err, "skipping listing");
                    tally.skip(1);
                    continue;
                }
            };
            if parsed.skipped > 0 {
                warn!(
                    source = self.name(),
                    keyword = %keyword,
                    skipped = parsed.skipped,
                    "skipped malformed posts"
                );
            }
            tally.skip(parsed.skipped);
            records.extend(parsed.records);
        }

        info!(
            source = self.name(),
            records = records.len(),
            skipped = tally.skipped(),
            requests_failed = tally.failed(),
            "mentions fetched"
        );
        tally.finish(out_dir, &records)
    }
}

#[derive(Debug, Default)]
pub struct ParsedListing {
    pub records: Vec<SocialMention>,
    pub skipped: u64,
}

/// Map a search listing (`data.children[].data`) to mentions.
pub fn parse_listing(
    keyword: &str,
    body: &Value,
    scraped_at: NaiveDateTime,
) -> Result<ParsedListing, EnrichError> {
    let children = field(body, "/data/children")?
        .as_array()
        .ok_or_else(|| EnrichError::Parse("/data/children is not an array".to_string()))?;

    let mut parsed = ParsedListing::default();
    for child in children {
        match parse_post(keyword, child, scraped_at) {
            Ok(record) => parsed.records.push(record),
            Err(_) => parsed.skipped += 1,
        }
    }
    Ok(parsed)
}

fn parse_post(keyword: &str, child: &Value, scraped_at: NaiveDateTime) -> Result<SocialMention, EnrichError> {
    let post = field(child, "/data")?;
    let id = str_field(post, "/id")?;
    let created = f64_field(post, "/created_utc")?;
    let created_at = DateTime::from_timestamp(created as i64, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| EnrichError::Parse(format!("invalid created_utc {created}")))?;
    let optional = |pointer: &str| {
        post.pointer(pointer)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    Ok(SocialMention {
        mention_id: format!("{PLATFORM}:{}:{id}", slug(keyword)),
        platform: PLATFORM.to_string(),
        keyword: keyword.to_string(),
        title: str_field(post, "/title")?.to_string(),
        score: post.get("score").and_then(Value::as_i64).unwrap_or(0),
        comments: post
            .get("num_comments")
            .and_then(Value::as_i64)
            .unwrap_or(0)
            .max(0),
        community: optional("/subreddit"),
        author: optional("/author"),
        url: optional("/permalink").map(|permalink| format!("{PERMALINK_BASE}{permalink}")),
        created_at,
        scraped_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_posts_and_skips_malformed_children() {
        let body = json!({
            "data": {
                "children": [
                    {"data": {
                        "id": "abc123",
                        "title": "Where do you shop online?",
                        "score": 42,
                        "num_comments": 7,
                        "subreddit": "ecommerce",
                        "author": "shopper",
                        "permalink": "/r/ecommerce/comments/abc123/",
                        "created_utc": 1714550400.0
                    }},
                    {"data": {"title": "no id"}}
                ]
            }
        });
        let scraped_at = NaiveDate::from_ymd_opt(2024, 5, 2)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid timestamp");
        let parsed = parse_listing("online shopping", &body, scraped_at).expect("parse");

        assert_eq!(parsed.skipped, 1);
        let mention = &parsed.records[0];
        assert_eq!(mention.mention_id, "reddit:online-shopping:abc123");
        assert_eq!(mention.score, 42);
        assert_eq!(mention.comments, 7);
        assert_eq!(
            mention.url.as_deref(),
            Some("https://reddit.com/r/ecommerce/comments/abc123/")
        );
    }

    #[test]
    fn rejects_unexpected_document() {
        let scraped_at = NaiveDate::from_ymd_opt(2024, 5, 2)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid timestamp");
        let err = parse_listing("ecommerce", &json!({"kind": "Listing"}), scraped_at)
            .expect_err("no children");
        assert!(matches!(err, EnrichError::Parse(_)));
    }
}
