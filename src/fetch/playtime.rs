use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::{http_client, FetchError};
use crate::config::SteamSpySettings;
use crate::workbook::{Sheet, Table, WorkbookWriter};

#[derive(Debug, Deserialize)]
struct AppDetails {
    /// Median playtime over all owners, in minutes.
    median_forever: Option<f64>,
}

/// Client for the SteamSpy `appdetails` request.
pub struct SteamSpyClient {
    client: reqwest::Client,
    base_url: String,
}

impl SteamSpyClient {
    pub fn new(base_url: impl Into<String>, timeout_sec: u64) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout_sec)?,
            base_url: base_url.into(),
        })
    }

    /// Median playtime in hours, `None` when SteamSpy has no figure.
    pub async fn median_playtime_hours(&self, app_id: u64) -> Result<Option<f64>, FetchError> {
        let app_id_str = app_id.to_string();
        debug!("GET {} appdetails {}", self.base_url, app_id);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("request", "appdetails"), ("appid", app_id_str.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.base_url.clone(),
            });
        }

        let details: AppDetails = response.json().await?;
        Ok(details.median_forever.map(|minutes| minutes / 60.0))
    }
}

pub fn playtime_table(results: &[(u64, Option<f64>)]) -> Table {
    let mut table = Table::new(["App ID", "Median Playtime (Hours)"]);
    for (app_id, hours) in results {
        table.push_row(vec![(*app_id).into(), (*hours).into()]);
    }
    table
}

/// Looks up the median playtime of every configured app, re-writing the
/// output workbook after each one.
pub async fn fetch_playtime(settings: &SteamSpySettings) -> Result<Vec<(u64, Option<f64>)>> {
    let client = SteamSpyClient::new(settings.base_url.clone(), settings.request_timeout_sec)?;
    let mut writer = WorkbookWriter::new(&settings.output);
    let mut results = Vec::with_capacity(settings.app_ids.len());

    for &app_id in &settings.app_ids {
        match client.median_playtime_hours(app_id).await {
            Ok(hours) => {
                match hours {
                    Some(h) => info!("App {}: median playtime {:.2}h", app_id, h),
                    None => info!("App {}: no median playtime reported", app_id),
                }
                results.push((app_id, hours));
                save(&mut writer, &results)?;
                settings.delay.sleep().await;
            }
            Err(e) => {
                error!("Error fetching data for app {}: {}", app_id, e);
                results.push((app_id, None));
                save(&mut writer, &results)?;
            }
        }
    }

    Ok(results)
}

fn save(writer: &mut WorkbookWriter, results: &[(u64, Option<f64>)]) -> Result<()> {
    writer.add_sheet(Sheet::from_table("Sheet1", playtime_table(results)));
    writer.flush()?;
    debug!("Current results saved to {:?}", writer.path());
    Ok(())
}
