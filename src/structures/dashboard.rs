use std::collections::HashMap;

use futures::{stream, StreamExt};
use log::{info, warn};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use super::api::MonitorClient;
use super::calendar::{
    current_month, fill_gaps, month_window, parse_month_label, recent_window, RECENT_DAYS, SHANGHAI,
};
use super::errors::ApiError;
use super::model::{DailyStat, SiteRecord};
use super::view::{failure_message, site_card, DashboardView, SiteCard};

/// Where the daily strips come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StripMode {
    /// One batched `/api/recent-stats` call, last 30 days.
    #[default]
    Recent,
    /// One `/api/monthly` call, every day of the reported month.
    Monthly,
    /// `/api/current-month` for each site in turn.
    PerSite,
}

/// Dates of the strip and the daily stats of every site.
#[derive(Debug, Default)]
pub struct StripData {
    pub range: Vec<Date>,
    pub stats: HashMap<String, Vec<DailyStat>>,
}

pub async fn load_dashboard(client: &MonitorClient, mode: StripMode, now: OffsetDateTime) -> DashboardView {
    let sites = match client.fetch_sites().await {
        Ok(sites) if sites.is_empty() => return DashboardView::Empty,
        Ok(sites) => sites,
        Err(ApiError::Unsuccessful) => return DashboardView::Empty,
        Err(e) => {
            warn!("Failed to fetch sites ({}): {}", e.kind().as_str(), e);
            return DashboardView::Failed(failure_message(&e));
        }
    };
    info!("Loaded {} sites from {}", sites.len(), client.base_url());

    let strips = match load_strips(client, mode, &sites, now).await {
        Ok(strips) => Some(strips),
        Err(e) => {
            warn!("Failed to fetch daily stats ({}): {}", e.kind().as_str(), e);
            None
        }
    };

    DashboardView::Sites(build_cards(&sites, strips.as_ref()))
}

pub fn build_cards(sites: &[SiteRecord], strips: Option<&StripData>) -> Vec<SiteCard> {
    sites
        .iter()
        .map(|site| {
            let slots = strips.map(|strips| {
                let stats = strips.stats.get(&site.url).map(Vec::as_slice).unwrap_or(&[]);
                fill_gaps(stats, &strips.range)
            });
            site_card(site, slots.as_deref())
        })
        .collect()
}

pub async fn load_strips(
    client: &MonitorClient,
    mode: StripMode,
    sites: &[SiteRecord],
    now: OffsetDateTime,
) -> Result<StripData, ApiError> {
    match mode {
        StripMode::Recent => Ok(StripData {
            range: recent_window(now, RECENT_DAYS, SHANGHAI),
            stats: client.fetch_recent_stats(None).await?,
        }),
        StripMode::Monthly => {
            let monthly = client.fetch_monthly().await?;
            let (year, month) = monthly
                .month
                .as_deref()
                .and_then(parse_month_label)
                .unwrap_or_else(|| current_month(now, SHANGHAI));
            Ok(StripData {
                range: month_window(year, month),
                stats: monthly.sites,
            })
        }
        StripMode::PerSite => {
            let (year, month) = current_month(now, SHANGHAI);
            let stats = stream::iter(sites)
                .then(|site| async move {
                    match client.fetch_current_month(&site.url).await {
                        Ok(stats) => Some((site.url.clone(), stats)),
                        Err(e) => {
                            warn!("Failed to load daily stats for {}: {}", site.url, e);
                            None
                        }
                    }
                })
                .filter_map(|entry| async move { entry })
                .collect::<HashMap<String, Vec<DailyStat>>>()
                .await;
            Ok(StripData {
                range: month_window(year, month),
                stats,
            })
        }
    }
}
