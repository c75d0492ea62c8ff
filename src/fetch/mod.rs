//! Clients for the external data sources: the Steam store review API, the
//! SteamSpy API and the third-party regional score page.
//!
//! Every fetcher processes its app ids strictly in order, logs and skips
//! per-id failures, and pauses between calls.

mod delay;
mod playtime;
mod regional;
mod reviews;

pub use delay::DelayRange;
pub use playtime::{fetch_playtime, playtime_table, SteamSpyClient};
pub use regional::{
    create_page_source, fetch_regional_scores, first_html_table, parse_score_table,
    HttpPageSource, PageSource, PageSourceKind, WebDriverPageSource,
};
pub use reviews::{
    clean_illegal_chars, fetch_reviews, format_playtime, reviews_table, summary_table,
    top_by_votes, FetchOutcome, ReviewPage, SteamReviewsClient, MAX_CONTENT_CHARS,
    SUMMARY_SHEET,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid payload: {0}")]
    Payload(String),

    #[error("No tables found")]
    NoTable,

    #[error("WebDriver error: {0}")]
    WebDriver(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Payload(e.to_string())
        } else {
            FetchError::Connection(e.to_string())
        }
    }
}

/// Builds the shared HTTP client used by the fetchers.
pub(crate) fn http_client(timeout_sec: u64) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(concat!("regional-sentiment/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(timeout_sec))
        .build()
        .map_err(|e| FetchError::Connection(format!("Failed to create HTTP client: {}", e)))
}
