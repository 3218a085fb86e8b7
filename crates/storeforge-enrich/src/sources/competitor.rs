use std::path::Path;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use tracing::{info, warn};

use storeforge_core::values::round_currency;
use storeforge_core::{CompetitorListing, CompetitorSourceConfig};

use super::{ExternalSource, RequestTally, SourceOutcome};
use crate::errors::EnrichError;
use crate::http::Fetcher;

const SOURCE: &str = "competitor";

const TAG_PATTERN: &str = r"<[^>]*>";
const NUMBER_PATTERN: &str = r"\d+(?:\.\d+)?";

/// Compiled extraction patterns for listing pages.
#[derive(Debug, Clone)]
pub struct ListingPatterns {
    item: Regex,
    name: Regex,
    price: Regex,
    rating: Regex,
    tag: Regex,
    number: Regex,
}

impl ListingPatterns {
    pub fn from_config(config: &CompetitorSourceConfig) -> Result<Self, EnrichError> {
        let compile = |key: &str, pattern: &str| {
            Regex::new(pattern)
                .map_err(|err| EnrichError::Config(format!("competitor.{key}: {err}")))
        };
        Ok(Self {
            item: compile("item_pattern", &config.item_pattern)?,
            name: compile("name_pattern", &config.name_pattern)?,
            price: compile("price_pattern", &config.price_pattern)?,
            rating: compile("rating_pattern", &config.rating_pattern)?,
            tag: compile("tag", TAG_PATTERN)?,
            number: compile("number", NUMBER_PATTERN)?,
        })
    }
}

/// Paged category listings from a competitor storefront.
pub struct CompetitorSource {
    config: CompetitorSourceConfig,
}

impl CompetitorSource {
    pub fn new(config: CompetitorSourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ExternalSource for CompetitorSource {
    fn name(&self) -> &'static str {
        "competitor"
    }

    async fn run(&self, fetcher: &mut Fetcher, out_dir: &Path) -> Result<SourceOutcome, EnrichError> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| EnrichError::Config("competitor base_url not set".to_string()))?;
        let patterns = ListingPatterns::from_config(&self.config)?;

        let mut records = Vec::new();
        let mut tally = RequestTally::new();
        for category in &self.config.categories {
            let url = format!("{base_url}/category/{category}");
            for page in 1..=self.config.max_pages {
                let page_param = page.to_string();
                let response = fetcher.get_text(&url, &[("page", page_param.as_str())]).await;
                let request = format!("{category} page {page}");
                // A failed page ends this category.
                let Some(html) = tally.settle(self.name(), &request, response) else {
                    break;
                };
                let parsed = parse_page(&patterns, category, page, &html, Utc::now().naive_utc());
                if parsed.records.is_empty() && parsed.skipped == 0 {
                    // Past the last page.
                    break;
                }
                if parsed.skipped > 0 {
                    warn!(
                        source = self.name(),
                        category = %category,
                        page,
                        skipped = parsed.skipped,
                        "skipped unparseable listings"
                    );
                }
                tally.skip(parsed.skipped);
                records.extend(parsed.records);
            }
        }

        info!(
            source = self.name(),
            records = records.len(),
            skipped = tally.skipped(),
            requests_failed = tally.failed(),
            "listings fetched"
        );
        tally.finish(out_dir, &records)
    }
}

#[derive(Debug, Default)]
pub struct ParsedPage {
    pub records: Vec<CompetitorListing>,
    pub skipped: u64,
}

/// Extract listings from one page; items without a name or price are skipped.
pub fn parse_page(
    patterns: &ListingPatterns,
    category: &str,
    page: u32,
    html: &str,
    scraped_at: NaiveDateTime,
) -> ParsedPage {
    let mut parsed = ParsedPage::default();
    for (index, item) in patterns.item.captures_iter(html).enumerate() {
        let Some(block) = item.get(1).or_else(|| item.get(0)).map(|m| m.as_str()) else {
            continue;
        };
        let position = index as i64 + 1;
        let name = capture(&patterns.name, block).map(|raw| patterns.clean_text(&raw));
        let price = capture(&patterns.price, block).and_then(|raw| patterns.clean_price(&raw));
        let (Some(name), Some(price)) = (name.filter(|n| !n.is_empty()), price) else {
            parsed.skipped += 1;
            continue;
        };
        let rating = capture(&patterns.rating, block).and_then(|raw| patterns.extract_rating(&raw));

        parsed.records.push(CompetitorListing {
            listing_id: format!("{category}:{page}:{position}"),
            category: category.to_string(),
            name,
            price,
            rating,
            page: i64::from(page),
            position,
            source: SOURCE.to_string(),
            scraped_at,
        });
    }
    parsed
}

fn capture(pattern: &Regex, block: &str) -> Option<String> {
    pattern
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

impl ListingPatterns {
    fn clean_text(&self, raw: &str) -> String {
        self.tag
            .replace_all(raw, "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Keep digits and the decimal point: `"$1,299.00"` becomes `1299.0`.
    fn clean_price(&self, raw: &str) -> Option<f64> {
        let digits: String = self
            .clean_text(raw)
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        digits.parse::<f64>().ok().map(round_currency)
    }

    fn extract_rating(&self, raw: &str) -> Option<f64> {
        let text = self.clean_text(raw);
        self.number
            .find(&text)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|rating| (0.0..=5.0).contains(rating))
    }
}
