use std::{collections::HashMap, time::Duration};

use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::errors::ApiError;
use super::model::{
    DailyStat, Envelope, HistoryEnvelope, HistoryPage, MonthlyEnvelope, MonthlyStats,
    RecentStats, SiteRecord, StatsBlock,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the monitoring API. No retries: every failure goes straight
/// back to the caller.
#[derive(Debug, Clone)]
pub struct MonitorClient {
    base_url: String,
    http: Client,
}

impl MonitorClient {
    pub fn new(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/data`
    pub async fn fetch_sites(&self) -> Result<Vec<SiteRecord>, ApiError> {
        let envelope: Envelope<Vec<SiteRecord>> = self.get_json("/api/data", &[]).await?;
        into_data(envelope.success, envelope.data)
    }

    /// `GET /api/history?url&page&limit`
    pub async fn fetch_history_page(
        &self,
        url: &str,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, ApiError> {
        let query = [
            ("url", url.to_string()),
            ("page", page.to_string()),
            ("limit", page_size.to_string()),
        ];
        let envelope: HistoryEnvelope = self.get_json("/api/history", &query).await?;
        let entries = into_data(envelope.success, envelope.data)?;
        Ok(HistoryPage {
            entries,
            monthly_summary: envelope.monthly_summary,
            has_more: envelope.pagination.unwrap_or_default().has_more,
        })
    }

    /// `GET /api/recent-stats[?url]`, keyed by site URL.
    pub async fn fetch_recent_stats(
        &self,
        url: Option<&str>,
    ) -> Result<HashMap<String, Vec<DailyStat>>, ApiError> {
        let query: Vec<(&str, String)> = url.map(|url| ("url", url.to_string())).into_iter().collect();
        let envelope: Envelope<RecentStats> = self.get_json("/api/recent-stats", &query).await?;
        match (into_data(envelope.success, envelope.data)?, url) {
            (RecentStats::Batch(sites), _) => Ok(sites
                .into_iter()
                .map(|site| (site.url, site.stats))
                .collect()),
            (RecentStats::Single(block), Some(url)) => Ok(HashMap::from([(url.to_string(), block.stats)])),
            (RecentStats::Single(_), None) => {
                warn!("recent-stats answered a single block without a url filter");
                Err(ApiError::Unsuccessful)
            }
        }
    }

    /// `GET /api/monthly`
    pub async fn fetch_monthly(&self) -> Result<MonthlyStats, ApiError> {
        let envelope: MonthlyEnvelope = self.get_json("/api/monthly", &[]).await?;
        let sites = into_data(envelope.success, envelope.data)?;
        Ok(MonthlyStats {
            month: envelope.month,
            sites,
        })
    }

    /// `GET /api/current-month?url`
    pub async fn fetch_current_month(&self, url: &str) -> Result<Vec<DailyStat>, ApiError> {
        let query = [("url", url.to_string())];
        let envelope: Envelope<StatsBlock> = self.get_json("/api/current-month", &query).await?;
        Ok(into_data(envelope.success, envelope.data)?.stats)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let response = self
            .http
            .get(&url)
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered {}", url, status);
            return Err(ApiError::HttpStatus(status));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn into_data<T>(success: bool, data: Option<T>) -> Result<T, ApiError> {
    match (success, data) {
        (true, Some(data)) => Ok(data),
        _ => Err(ApiError::Unsuccessful),
    }
}
