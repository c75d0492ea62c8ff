use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{http_client, FetchError};
use crate::cli_style::progress_bar;
use crate::config::SteamReviewsSettings;
use crate::model::ReviewRecord;
use crate::workbook::{Cell, Sheet, Table, WorkbookWriter};

/// Name of the trailing sheet listing the outcome of every app id.
pub const SUMMARY_SHEET: &str = "0_Summary";

/// Review bodies are cut to this many characters before saving.
pub const MAX_CONTENT_CHARS: usize = 2000;

const REVIEW_COLUMNS: [&str; 10] = [
    "review_id",
    "language",
    "is_recommended",
    "votes_up",
    "votes_funny",
    "weighted_score",
    "playtime_at_review",
    "content",
    "created_at",
    "steam_purchase",
];

/// Control characters that spreadsheet files cannot store.
static ILLEGAL_CHARS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0b-\x0c\x0e-\x1f]").ok());

pub fn clean_illegal_chars(s: &str) -> String {
    match ILLEGAL_CHARS.as_ref() {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s
            .chars()
            .filter(|c| !matches!(*c as u32, 0x00..=0x08 | 0x0b..=0x0c | 0x0e..=0x1f))
            .collect(),
    }
}

/// Minutes of playtime rendered as hours with one decimal, e.g. "2.5h".
pub fn format_playtime(minutes: u64) -> String {
    format!("{:.1}h", minutes as f64 / 60.0)
}

/// Stable sort by `votes_up` descending, keeping the first `n`.
pub fn top_by_votes(mut reviews: Vec<ReviewRecord>, n: usize) -> Vec<ReviewRecord> {
    reviews.sort_by(|a, b| b.votes_up.cmp(&a.votes_up));
    reviews.truncate(n);
    reviews
}

#[derive(Debug, Deserialize)]
struct ReviewsResponse {
    #[serde(default)]
    success: i64,
    #[serde(default)]
    reviews: Vec<ApiReview>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiReview {
    recommendationid: Value,
    #[serde(default)]
    author: Option<ApiAuthor>,
    language: Option<String>,
    #[serde(default)]
    review: String,
    #[serde(default)]
    timestamp_created: i64,
    voted_up: Option<bool>,
    #[serde(default)]
    votes_up: u64,
    #[serde(default)]
    votes_funny: u64,
    #[serde(default)]
    weighted_vote_score: Value,
    #[serde(default)]
    steam_purchase: bool,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    #[serde(default)]
    playtime_at_review: u64,
}

impl From<ApiReview> for ReviewRecord {
    fn from(review: ApiReview) -> Self {
        let review_id = match review.recommendationid {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let weighted_score = match &review.weighted_vote_score {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        };
        let playtime = review.author.map(|a| a.playtime_at_review).unwrap_or(0);
        let truncated: String = review.review.chars().take(MAX_CONTENT_CHARS).collect();

        ReviewRecord {
            review_id,
            language: review.language.unwrap_or_else(|| "unknown".to_string()),
            is_recommended: review.voted_up,
            votes_up: review.votes_up,
            votes_funny: review.votes_funny,
            weighted_score,
            playtime_at_review: format_playtime(playtime),
            content: clean_illegal_chars(&truncated),
            created_at: DateTime::from_timestamp(review.timestamp_created, 0)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            steam_purchase: review.steam_purchase,
        }
    }
}

/// One page of reviews plus the cursor for the next page.
#[derive(Debug)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewRecord>,
    pub cursor: Option<String>,
}

/// Client for the Steam store `appreviews` endpoint.
pub struct SteamReviewsClient {
    client: reqwest::Client,
    base_url: String,
    filter: String,
    language: String,
    num_per_page: u32,
    max_pages: u32,
    page_delay: Duration,
}

impl SteamReviewsClient {
    pub fn new(settings: &SteamReviewsSettings) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(settings.request_timeout_sec)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            filter: settings.filter.clone(),
            language: settings.language.clone(),
            num_per_page: settings.num_per_page,
            max_pages: settings.max_pages,
            page_delay: Duration::from_millis(settings.page_delay_ms),
        })
    }

    pub async fn fetch_page(&self, app_id: u64, cursor: &str) -> Result<ReviewPage, FetchError> {
        let url = format!("{}/appreviews/{}", self.base_url, app_id);
        let num_per_page = self.num_per_page.to_string();

        debug!("GET {} cursor={}", url, cursor);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("json", "1"),
                ("filter", self.filter.as_str()),
                ("language", self.language.as_str()),
                ("num_per_page", num_per_page.as_str()),
                ("review_type", "all"),
                ("purchase_type", "all"),
                ("cursor", cursor),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body: ReviewsResponse = response.json().await?;
        if body.success != 1 {
            return Err(FetchError::Payload(format!(
                "Steam reported success={} for app {}",
                body.success, app_id
            )));
        }

        Ok(ReviewPage {
            reviews: body.reviews.into_iter().map(ReviewRecord::from).collect(),
            cursor: body.cursor,
        })
    }

    /// Follows the cursor until an empty page, a repeated cursor or the page
    /// limit. Reviews seen twice are kept once.
    pub async fn fetch_all(&self, app_id: u64) -> Result<Vec<ReviewRecord>, FetchError> {
        let mut cursor = "*".to_string();
        let mut seen = HashSet::new();
        let mut reviews = Vec::new();

        for page_no in 0..self.max_pages {
            if page_no > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let page = self.fetch_page(app_id, &cursor).await?;
            if page.reviews.is_empty() {
                break;
            }
            let count = page.reviews.len();
            for review in page.reviews {
                if seen.insert(review.review_id.clone()) {
                    reviews.push(review);
                }
            }
            debug!("App {} page {}: {} reviews", app_id, page_no + 1, count);

            match page.cursor {
                Some(next) if next != cursor && !next.is_empty() => cursor = next,
                _ => break,
            }
        }

        Ok(reviews)
    }
}

pub fn reviews_table(reviews: &[ReviewRecord]) -> Table {
    let mut table = Table::new(REVIEW_COLUMNS);
    for r in reviews {
        table.push_row(vec![
            r.review_id.as_str().into(),
            r.language.as_str().into(),
            r.is_recommended.into(),
            r.votes_up.into(),
            r.votes_funny.into(),
            r.weighted_score.into(),
            r.playtime_at_review.as_str().into(),
            r.content.as_str().into(),
            r.created_at.naive_utc().into(),
            r.steam_purchase.into(),
        ]);
    }
    table
}

/// Result of downloading one app's reviews.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub app_id: u64,
    /// Number of reviews written, or `None` when the download failed.
    pub reviews_saved: Option<usize>,
}

impl FetchOutcome {
    pub fn succeeded(&self) -> bool {
        self.reviews_saved.is_some()
    }
}

pub fn summary_table(outcomes: &[FetchOutcome]) -> Table {
    let mut table = Table::new(["app_id", "status", "reviews_saved"]);
    for outcome in outcomes {
        let status = if outcome.succeeded() {
            "Success"
        } else {
            "Failed"
        };
        table.push_row(vec![
            outcome.app_id.into(),
            status.into(),
            Cell::from(outcome.reviews_saved.unwrap_or(0)),
        ]);
    }
    table
}

/// Downloads the most up-voted reviews of every configured app into one
/// workbook: a sheet per successful app id and a trailing summary sheet.
pub async fn fetch_reviews(settings: &SteamReviewsSettings) -> Result<Vec<FetchOutcome>> {
    let client = SteamReviewsClient::new(settings)?;
    let mut writer = WorkbookWriter::new(&settings.output);
    let mut outcomes = Vec::with_capacity(settings.app_ids.len());

    let pb = progress_bar(settings.app_ids.len(), "Downloading top reviews");
    for &app_id in &settings.app_ids {
        settings.before_delay.sleep().await;

        match client.fetch_all(app_id).await {
            Ok(reviews) => {
                let total = reviews.len();
                let top = top_by_votes(reviews, settings.top_n);
                info!(
                    "App {}: kept {} of {} reviews",
                    app_id,
                    top.len(),
                    total
                );
                writer.add_sheet(Sheet::from_table(app_id.to_string(), reviews_table(&top)));
                writer.flush()?;
                outcomes.push(FetchOutcome {
                    app_id,
                    reviews_saved: Some(top.len()),
                });
            }
            Err(e) => {
                error!("Failed to fetch reviews for app {}: {}", app_id, e);
                outcomes.push(FetchOutcome {
                    app_id,
                    reviews_saved: None,
                });
            }
        }

        pb.inc(1);
        settings.after_delay.sleep().await;
    }
    pb.finish_and_clear();

    writer.add_sheet(Sheet::from_table(SUMMARY_SHEET, summary_table(&outcomes)));
    writer.flush()?;

    let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
    info!(
        "Saved reviews for {}/{} apps to {:?}",
        succeeded,
        outcomes.len(),
        settings.output
    );
    Ok(outcomes)
}
