//! Regional review scores scraped from a third-party HTML page.
//!
//! The page builds its score table with JavaScript, so the default source is
//! a WebDriver session that renders it. A plain HTTP source is available for
//! pages that are served pre-rendered.

use anyhow::Result;
use async_trait::async_trait;
use clap::ValueEnum;
use fantoccini::ClientBuilder;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};

use super::{http_client, DelayRange, FetchError};
use crate::config::RegionalScoresSettings;
use crate::workbook::{Cell, Sheet, Table, WorkbookWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PageSourceKind {
    /// Render the page in a browser driven over WebDriver.
    Webdriver,
    /// Plain HTTP GET, no JavaScript.
    Http,
}

/// Something that turns a URL into the HTML of the page.
#[async_trait]
pub trait PageSource: Send + Sync {
    fn name(&self) -> &str;

    async fn page_html(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages with a plain GET request.
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(timeout_sec: u64) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout_sec)?,
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn page_html(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Opens a fresh browser session per page, waits for the page scripts to
/// finish, then reads back the rendered source.
pub struct WebDriverPageSource {
    webdriver_url: String,
    render_wait: DelayRange,
}

impl WebDriverPageSource {
    pub fn new(webdriver_url: impl Into<String>, render_wait: DelayRange) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            render_wait,
        }
    }
}

#[async_trait]
impl PageSource for WebDriverPageSource {
    fn name(&self) -> &str {
        "webdriver"
    }

    async fn page_html(&self, url: &str) -> Result<String, FetchError> {
        let mut capabilities = serde_json::Map::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": ["--headless", "--disable-gpu"] }),
        );

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities);
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| FetchError::WebDriver(e.to_string()))?;

        let result = async {
            client
                .goto(url)
                .await
                .map_err(|e| FetchError::WebDriver(e.to_string()))?;
            let waited = self.render_wait.sleep().await;
            debug!("Waited {:.1}s for {} to render", waited.as_secs_f64(), url);
            client
                .source()
                .await
                .map_err(|e| FetchError::WebDriver(e.to_string()))
        }
        .await;

        if let Err(e) = client.close().await {
            warn!("Failed to close WebDriver session: {}", e);
        }
        result
    }
}

/// Create the page source selected in the settings.
pub fn create_page_source(settings: &RegionalScoresSettings) -> Result<Box<dyn PageSource>> {
    match settings.page_source {
        PageSourceKind::Webdriver => {
            info!("Using WebDriver page source at {}", settings.webdriver_url);
            Ok(Box::new(WebDriverPageSource::new(
                settings.webdriver_url.clone(),
                settings.render_wait,
            )))
        }
        PageSourceKind::Http => {
            info!("Using plain HTTP page source");
            Ok(Box::new(HttpPageSource::new(settings.request_timeout_sec)?))
        }
    }
}

static THOUSANDS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^-?\d{1,3}(,\d{3})+(\.\d+)?$").ok());

fn parse_cell(text: &str) -> Cell {
    if text.is_empty() {
        return Cell::Empty;
    }
    if let Ok(n) = text.parse::<f64>() {
        return Cell::from(n);
    }
    let grouped = THOUSANDS
        .as_ref()
        .map(|re| re.is_match(text))
        .unwrap_or(false);
    if grouped {
        if let Ok(n) = text.replace(',', "").parse::<f64>() {
            return Cell::from(n);
        }
    }
    Cell::Text(text.to_string())
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Payload(format!("Bad selector {}: {}", css, e)))
}

fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the first `<table>` of a page. Its first row becomes the headers;
/// numeric-looking cells are stored as numbers.
pub fn first_html_table(html: &str) -> Result<Table, FetchError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;

    let table_el = document.select(&table_sel).next().ok_or(FetchError::NoTable)?;

    let mut rows = table_el
        .select(&row_sel)
        .map(|tr| tr.select(&cell_sel).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty());

    let headers = rows.next().ok_or(FetchError::NoTable)?;
    let mut table = Table::new(headers);
    for cells in rows {
        table.push_row(cells.iter().map(|c| parse_cell(c)).collect());
    }
    Ok(table)
}

/// First table of the page with its first two columns swapped, headers
/// included.
pub fn parse_score_table(html: &str) -> Result<Table, FetchError> {
    let mut table = first_html_table(html)?;
    if table.headers.len() >= 2 {
        table.swap_columns(0, 1);
    }
    Ok(table)
}

/// Scrapes the regional score table of every configured app into one sheet
/// per app id. Returns how many sheets were saved.
pub async fn fetch_regional_scores(
    settings: &RegionalScoresSettings,
    source: &dyn PageSource,
) -> Result<usize> {
    let mut writer = WorkbookWriter::new(&settings.output);
    let mut saved = 0;

    for &app_id in &settings.app_ids {
        let url = settings
            .url_template
            .replace("{app_id}", &app_id.to_string());
        info!("Fetching regional scores for app {} via {}", app_id, source.name());

        let table = match source.page_html(&url).await {
            Ok(html) => parse_score_table(&html),
            Err(e) => Err(e),
        };

        match table {
            Ok(table) => {
                info!(
                    "App {}: {} regional rows saved to {:?}",
                    app_id,
                    table.len(),
                    settings.output
                );
                writer.add_sheet(Sheet::from_table(app_id.to_string(), table));
                writer.flush()?;
                saved += 1;
            }
            Err(FetchError::NoTable) => warn!("No tables found for app {}", app_id),
            Err(e) => error!("Error reading tables for app {}: {}", app_id, e),
        }
    }

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <p>Loading done</p>
          <table id="scores">
            <thead><tr><th>Region</th><th>Score</th><th>Reviews</th></tr></thead>
            <tbody>
              <tr><td>China</td><td>71.5</td><td>12,345</td></tr>
              <tr><td> United
                   States </td><td>88</td><td>n/a</td></tr>
            </tbody>
          </table>
          <table><tr><th>Other</th></tr></table>
        </body></html>
    "#;

    #[test]
    fn test_first_table_is_parsed() {
        let table = first_html_table(PAGE).unwrap();
        assert_eq!(table.headers, vec!["Region", "Score", "Reviews"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Score"), &Cell::Number(71.5));
        assert_eq!(table.get(0, "Reviews"), &Cell::Number(12345.0));
        assert_eq!(table.get(1, "Region"), &Cell::Text("United States".into()));
        assert_eq!(table.get(1, "Reviews"), &Cell::Text("n/a".into()));
    }

    #[test]
    fn test_score_table_swaps_first_two_columns() {
        let table = parse_score_table(PAGE).unwrap();
        assert_eq!(table.headers, vec!["Score", "Region", "Reviews"]);
        assert_eq!(table.rows[0][0], Cell::Number(71.5));
        assert_eq!(table.rows[0][1], Cell::Text("China".into()));
    }

    #[test]
    fn test_single_column_is_left_alone() {
        let html = "<table><tr><th>Only</th></tr><tr><td>1</td></tr></table>";
        let table = parse_score_table(html).unwrap();
        assert_eq!(table.headers, vec!["Only"]);
        assert_eq!(table.rows[0][0], Cell::Number(1.0));
    }

    #[test]
    fn test_page_without_table() {
        assert!(matches!(
            first_html_table("<html><body><p>Please wait</p></body></html>"),
            Err(FetchError::NoTable)
        ));
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell(""), Cell::Empty);
        assert_eq!(parse_cell("-3.5"), Cell::Number(-3.5));
        assert_eq!(parse_cell("1,234,567.5"), Cell::Number(1234567.5));
        assert_eq!(parse_cell("1,2"), Cell::Text("1,2".into()));
        assert_eq!(parse_cell("85%"), Cell::Text("85%".into()));
    }
}
