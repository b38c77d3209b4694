use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Latest check snapshot for one monitored site, as served by `/api/data`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub status: Option<StatusValue>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub available: bool,
    #[serde(default, deserialize_with = "lenient_number")]
    pub response_time: Option<f64>,
    #[serde(default)]
    pub checked_at: Option<String>,
}

/// HTTP status as reported upstream: a code, or a label such as `"timeout"`
/// when no response was received.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Code(i64),
    Text(String),
    Other(serde_json::Value),
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

// Numbers may arrive as strings; anything else reads as missing.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

impl SiteRecord {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.url,
        }
    }
}

/// Counters for one calendar day at one URL.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawDailyStat")]
pub struct DailyStat {
    pub date: String,
    pub total_checks: u64,
    pub successful_checks: u64,
    pub failed_checks: u64,
    pub total_response_time: f64,
    /// Fraction reported by the server, kept as is since the derived
    /// counters are rounded.
    pub reported_uptime: Option<f64>,
}

// `/api/monthly` reports `{ date, uptime, count }` instead of counters.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDailyStat {
    date: String,
    #[serde(default)]
    total_checks: Option<u64>,
    #[serde(default)]
    successful_checks: Option<u64>,
    #[serde(default)]
    failed_checks: Option<u64>,
    #[serde(default)]
    total_response_time: Option<f64>,
    #[serde(default)]
    uptime: Option<f64>,
    #[serde(default)]
    count: Option<u64>,
}

impl From<RawDailyStat> for DailyStat {
    fn from(raw: RawDailyStat) -> Self {
        let total_checks = raw.total_checks.or(raw.count).unwrap_or(0);
        let successful_checks = match (raw.successful_checks, raw.uptime) {
            (Some(successful), _) => successful,
            (None, Some(uptime)) => {
                ((uptime.clamp(0.0, 1.0) * total_checks as f64).round() as u64).min(total_checks)
            }
            (None, None) => 0,
        };
        let failed_checks = raw
            .failed_checks
            .unwrap_or_else(|| total_checks.saturating_sub(successful_checks));
        DailyStat {
            date: raw.date,
            total_checks,
            successful_checks,
            failed_checks,
            total_response_time: raw.total_response_time.unwrap_or(0.0),
            reported_uptime: raw.uptime.filter(|uptime| uptime.is_finite()),
        }
    }
}

impl DailyStat {
    pub fn uptime(&self) -> f64 {
        match self.reported_uptime {
            Some(_) if self.total_checks == 0 => 0.0,
            Some(uptime) => uptime.clamp(0.0, 1.0),
            None => uptime_fraction(self.successful_checks, self.total_checks),
        }
    }
}

/// Sum of the daily stats of one `YYYY-MM` month.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: String,
    #[serde(default)]
    pub total_checks: u64,
    #[serde(default)]
    pub successful_checks: u64,
    #[serde(default)]
    pub failed_checks: u64,
    #[serde(default)]
    pub total_response_time: f64,
}

impl MonthlySummary {
    pub fn uptime(&self) -> f64 {
        uptime_fraction(self.successful_checks, self.total_checks)
    }

    pub fn average_response_time(&self) -> Option<f64> {
        match self.total_checks {
            0 => None,
            n => Some(self.total_response_time / n as f64),
        }
    }
}

/// One raw check result from `/api/history`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLogEntry {
    #[serde(default)]
    pub checked_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub available: bool,
    #[serde(default)]
    pub status: Option<StatusValue>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub response_time: Option<f64>,
}

/// Successful over total, 0 when nothing was checked.
pub fn uptime_fraction(successful: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (successful as f64 / total as f64).clamp(0.0, 1.0)
}

// Response envelopes.

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<HistoryLogEntry>>,
    #[serde(default)]
    pub monthly_summary: Option<Vec<MonthlySummary>>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub data: Option<HashMap<String, Vec<DailyStat>>>,
}

#[derive(Debug, Deserialize)]
pub struct StatsBlock {
    #[serde(default)]
    pub stats: Vec<DailyStat>,
}

#[derive(Debug, Deserialize)]
pub struct SiteStats {
    pub url: String,
    #[serde(default)]
    pub stats: Vec<DailyStat>,
}

/// `/api/recent-stats` answers with a single block when asked for one URL,
/// with a list of blocks otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecentStats {
    Batch(Vec<SiteStats>),
    Single(StatsBlock),
}

/// One page of history as handed to the modal.
#[derive(Debug, Clone, Default)]
pub struct HistoryPage {
    pub entries: Vec<HistoryLogEntry>,
    pub monthly_summary: Option<Vec<MonthlySummary>>,
    pub has_more: bool,
}

/// Daily stats of one month for every site, from `/api/monthly`.
#[derive(Debug, Clone, Default)]
pub struct MonthlyStats {
    pub month: Option<String>,
    pub sites: HashMap<String, Vec<DailyStat>>,
}
