//! Pure mapping from API data to what the templates display.

use time::{format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime};

use super::calendar::{DaySlot, SHANGHAI};
use super::model::{HistoryLogEntry, MonthlySummary, SiteRecord, StatusValue};
use super::modal::{HistoryModal, ModalState};

pub const DEFAULT_AVATAR: &str = "https://via.placeholder.com/48";
pub const AVATAR_FALLBACK: &str = "https://via.placeholder.com/48?text=Err";

pub const NO_SITES_MESSAGE: &str = "暂无监控数据";
pub const NO_HISTORY_MESSAGE: &str = "暂无历史记录";
pub const LOADING_MESSAGE: &str = "加载中...";
pub const LOAD_MORE_LABEL: &str = "加载更多";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UptimeLevel {
    Success,
    Partial,
    Fail,
    NoData,
}

impl UptimeLevel {
    pub fn from_fraction(uptime: f64) -> Self {
        if uptime >= 1.0 {
            UptimeLevel::Success
        } else if uptime > 0.0 {
            UptimeLevel::Partial
        } else {
            UptimeLevel::Fail
        }
    }

    pub fn of_slot(slot: &DaySlot) -> Self {
        match slot.stat() {
            Some(stat) => UptimeLevel::from_fraction(stat.uptime()),
            None => UptimeLevel::NoData,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            UptimeLevel::Success => "status-success",
            UptimeLevel::Partial => "status-partial",
            UptimeLevel::Fail => "status-fail",
            UptimeLevel::NoData => "status-none",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StripCell {
    pub level: UptimeLevel,
    pub tooltip: Vec<String>,
}

impl StripCell {
    pub fn css_class(&self) -> &'static str {
        self.level.css_class()
    }
}

#[derive(Debug, Clone)]
pub struct SiteCard {
    pub url: String,
    pub title: String,
    pub avatar: String,
    pub avatar_fallback: &'static str,
    pub screenshot: Option<String>,
    pub available: bool,
    pub status: String,
    pub response_time: String,
    pub checked_at: String,
    pub strip: Option<Vec<StripCell>>,
}

impl SiteCard {
    pub fn badge_class(&self) -> &'static str {
        if self.available {
            "available"
        } else {
            "unavailable"
        }
    }

    pub fn badge_text(&self) -> &'static str {
        availability_text(self.available)
    }
}

#[derive(Debug, Clone)]
pub enum DashboardView {
    Sites(Vec<SiteCard>),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub checked_at: String,
    pub available: bool,
    pub status: String,
    pub response_time: String,
}

impl HistoryRow {
    pub fn css_class(&self) -> &'static str {
        if self.available {
            "success"
        } else {
            "fail"
        }
    }

    pub fn status_text(&self) -> &'static str {
        availability_text(self.available)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub month: String,
    pub uptime: String,
    pub level: UptimeLevel,
    pub checks: String,
    pub average_response_time: String,
}

/// What the modal body shows in place of (or above) the entry list.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalNotice {
    Loading,
    Empty,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ModalView {
    pub title: String,
    pub notice: Option<ModalNotice>,
    pub summary: Vec<SummaryRow>,
    pub rows: Vec<HistoryRow>,
    /// Label of the "load more" control, absent when it is hidden.
    pub load_more: Option<String>,
}

pub fn site_card(site: &SiteRecord, strip: Option<&[DaySlot]>) -> SiteCard {
    SiteCard {
        url: site.url.clone(),
        title: site.display_title().to_string(),
        avatar: site
            .avatar
            .clone()
            .filter(|avatar| !avatar.is_empty())
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        avatar_fallback: AVATAR_FALLBACK,
        screenshot: site.screenshot.clone().filter(|shot| !shot.is_empty()),
        available: site.available,
        status: format_status(site.status.as_ref()),
        response_time: format_response_time(site.response_time),
        checked_at: format_time(site.checked_at.as_deref()),
        strip: strip.map(strip_cells),
    }
}

pub fn strip_cells(slots: &[DaySlot]) -> Vec<StripCell> {
    slots.iter().map(strip_cell).collect()
}

fn strip_cell(slot: &DaySlot) -> StripCell {
    let date = slot.date_label();
    let level = UptimeLevel::of_slot(slot);
    let tooltip = match slot.stat() {
        Some(stat) => vec![
            date,
            format!("可用性: {}%", round_percent(stat.uptime())),
            format!("检测次数: {}", stat.total_checks),
        ],
        None => vec![date, "无数据".to_string()],
    };
    StripCell { level, tooltip }
}

pub fn history_row(entry: &HistoryLogEntry) -> HistoryRow {
    HistoryRow {
        checked_at: format_time(entry.checked_at.as_deref()),
        available: entry.available,
        status: format_status(entry.status.as_ref()),
        response_time: format_response_time(entry.response_time),
    }
}

pub fn summary_row(summary: &MonthlySummary) -> SummaryRow {
    SummaryRow {
        month: summary.month.clone(),
        uptime: format_percent(summary.uptime() * 100.0),
        level: if summary.total_checks == 0 {
            UptimeLevel::NoData
        } else {
            UptimeLevel::from_fraction(summary.uptime())
        },
        checks: format!("{}/{}", summary.successful_checks, summary.total_checks),
        average_response_time: format_response_time(summary.average_response_time()),
    }
}

/// Snapshot of the modal for rendering, `None` while it is closed.
pub fn modal_view(modal: &HistoryModal) -> Option<ModalView> {
    let notice = match modal.state() {
        ModalState::Closed => return None,
        ModalState::Loading if modal.page() == 1 => Some(ModalNotice::Loading),
        ModalState::Error(message) => Some(ModalNotice::Error(message.clone())),
        ModalState::Loaded if modal.entries().is_empty() => Some(ModalNotice::Empty),
        ModalState::Loading | ModalState::Loaded => None,
    };

    let load_more = match modal.state() {
        ModalState::Loading if modal.page() > 1 => Some(LOADING_MESSAGE.to_string()),
        ModalState::Loaded if modal.has_more() => Some(
            modal
                .load_more_error()
                .unwrap_or(LOAD_MORE_LABEL)
                .to_string(),
        ),
        _ => None,
    };

    Some(ModalView {
        title: format!("{} - 历史记录", modal.title()),
        notice,
        summary: modal.summary().iter().map(summary_row).collect(),
        rows: modal.entries().iter().map(history_row).collect(),
        load_more,
    })
}

impl ModalNotice {
    pub fn css_class(&self) -> &'static str {
        match self {
            ModalNotice::Loading => "loading-message",
            ModalNotice::Empty => "none-message",
            ModalNotice::Error(_) => "error-message",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ModalNotice::Loading => LOADING_MESSAGE,
            ModalNotice::Empty => NO_HISTORY_MESSAGE,
            ModalNotice::Error(message) => message,
        }
    }
}

pub fn failure_message(err: &impl std::fmt::Display) -> String {
    format!("加载失败: {err}")
}

fn availability_text(available: bool) -> &'static str {
    if available {
        "正常"
    } else {
        "异常"
    }
}

/// Two decimals, half away from zero: `94.995` gives `"95.00%"`.
pub fn format_percent(percent: f64) -> String {
    let rounded = (percent * 100.0).round() / 100.0;
    format!("{rounded:.2}%")
}

/// Whole percent for strip tooltips.
pub fn round_percent(uptime: f64) -> i64 {
    (uptime * 100.0).round() as i64
}

pub fn format_response_time(ms: Option<f64>) -> String {
    match ms {
        None => "-".to_string(),
        Some(ms) if ms.is_nan() => "-".to_string(),
        Some(ms) if ms < 1000.0 => format!("{ms}ms"),
        Some(ms) => format!("{:.2}s", ms / 1000.0),
    }
}

pub fn format_status(status: Option<&StatusValue>) -> String {
    match status {
        None | Some(StatusValue::Code(0)) => "-".to_string(),
        Some(StatusValue::Code(code)) => code.to_string(),
        Some(StatusValue::Text(text)) if text.trim().is_empty() => "-".to_string(),
        Some(StatusValue::Text(text)) => text.clone(),
        Some(StatusValue::Other(value)) => match value {
            serde_json::Value::Null | serde_json::Value::Bool(false) => "-".to_string(),
            serde_json::Value::Number(n) if n.as_f64() == Some(0.0) => "-".to_string(),
            other => other.to_string(),
        },
    }
}

/// `YYYY-MM-DD HH:MM` at UTC+08:00.
pub fn format_time(timestamp: Option<&str>) -> String {
    let Some(parsed) = timestamp.and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok()) else {
        return "-".to_string();
    };
    parsed
        .to_offset(SHANGHAI)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| "-".to_string())
}
