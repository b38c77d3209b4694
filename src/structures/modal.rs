//! History modal controller.
//!
//! There is a single modal per process. Network calls happen outside of it:
//! `open`/`load_more` hand out a [`PageRequest`], the caller fetches it and
//! passes the outcome back to `complete`. Every request carries a generation
//! number so that a slow response for a superseded request is dropped
//! instead of overwriting newer content.

use log::debug;

use super::calendar::aggregate_by_month;
use super::errors::ApiError;
use super::model::{DailyStat, HistoryLogEntry, HistoryPage, MonthlySummary};
use super::view::failure_message;

pub const PAGE_SIZE: u32 = 20;

pub const LOAD_MORE_RETRY: &str = "加载失败，点击重试";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ModalState {
    #[default]
    Closed,
    Loading,
    Loaded,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub url: String,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Default)]
pub struct HistoryModal {
    state: ModalState,
    generation: u64,
    url: String,
    title: String,
    page: u32,
    entries: Vec<HistoryLogEntry>,
    summary: Vec<MonthlySummary>,
    has_more: bool,
    more_failed: bool,
}

impl HistoryModal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the modal for `url` and returns the request for page 1.
    ///
    /// `daily` seeds the monthly summary until the history endpoint
    /// provides one of its own.
    pub fn open(&mut self, url: &str, title: &str, daily: &[DailyStat]) -> PageRequest {
        self.generation += 1;
        self.url = url.to_string();
        self.title = title.to_string();
        self.page = 1;
        self.entries.clear();
        self.summary = aggregate_by_month(daily);
        self.has_more = false;
        self.more_failed = false;
        self.state = ModalState::Loading;
        debug!("history modal opened for {} (generation {})", url, self.generation);
        self.request()
    }

    /// Request for the next page, `None` unless a loaded page announced more.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if self.state != ModalState::Loaded || !self.has_more {
            return None;
        }
        self.generation += 1;
        self.page += 1;
        self.more_failed = false;
        self.state = ModalState::Loading;
        Some(self.request())
    }

    pub fn close(&mut self) {
        // In-flight responses for the closed modal must not reopen it.
        self.generation += 1;
        self.state = ModalState::Closed;
    }

    /// Applies a fetch outcome. Returns `false` when the request was stale.
    pub fn complete(&mut self, request: &PageRequest, result: Result<HistoryPage, ApiError>) -> bool {
        if request.generation != self.generation || self.state != ModalState::Loading {
            debug!(
                "dropping stale history page {} for {} (generation {}, current {})",
                request.page, request.url, request.generation, self.generation
            );
            return false;
        }

        // `success: false` means there is nothing (more) to show.
        let result = match result {
            Err(ApiError::Unsuccessful) => Ok(HistoryPage::default()),
            other => other,
        };

        match result {
            Ok(page) => {
                self.entries.extend(page.entries);
                self.has_more = page.has_more;
                if let Some(summary) = page.monthly_summary.filter(|months| !months.is_empty()) {
                    self.summary = summary;
                }
                self.state = ModalState::Loaded;
            }
            Err(err) if request.page == 1 => {
                self.state = ModalState::Error(failure_message(&err));
            }
            Err(_) => {
                // Retry fetches the same page again.
                self.page -= 1;
                self.more_failed = true;
                self.state = ModalState::Loaded;
            }
        }
        true
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != ModalState::Closed
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn entries(&self) -> &[HistoryLogEntry] {
        &self.entries
    }

    pub fn summary(&self) -> &[MonthlySummary] {
        &self.summary
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn load_more_error(&self) -> Option<&'static str> {
        self.more_failed.then_some(LOAD_MORE_RETRY)
    }

    fn request(&self) -> PageRequest {
        PageRequest {
            generation: self.generation,
            url: self.url.clone(),
            page: self.page,
            page_size: PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::structures::model::StatusValue;
    use crate::structures::view::{modal_view, ModalNotice, LOAD_MORE_LABEL};

    fn entries(n: usize, available: bool) -> Vec<HistoryLogEntry> {
        (0..n)
            .map(|i| HistoryLogEntry {
                checked_at: Some(format!("2024-03-01T00:{:02}:00Z", i % 60)),
                available,
                status: Some(StatusValue::Code(200)),
                response_time: Some(120.0),
            })
            .collect()
    }

    fn page(n: usize, has_more: bool) -> HistoryPage {
        HistoryPage {
            entries: entries(n, true),
            monthly_summary: None,
            has_more,
        }
    }

    fn daily(date: &str, total: u64, successful: u64) -> DailyStat {
        DailyStat {
            date: date.to_string(),
            total_checks: total,
            successful_checks: successful,
            failed_checks: total - successful,
            total_response_time: 0.0,
            reported_uptime: None,
        }
    }

    #[test]
    fn starts_closed() {
        let modal = HistoryModal::new();
        assert_eq!(modal.state(), &ModalState::Closed);
        assert!(modal_view(&modal).is_none());
    }

    #[test]
    fn open_requests_first_page_and_shows_loading() {
        let mut modal = HistoryModal::new();
        let request = modal.open("https://a.example", "A", &[]);
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, PAGE_SIZE);
        assert_eq!(request.url, "https://a.example");
        assert_eq!(modal.state(), &ModalState::Loading);

        let view = modal_view(&modal).unwrap();
        assert_eq!(view.title, "A - 历史记录");
        assert_eq!(view.notice, Some(ModalNotice::Loading));
        assert!(view.load_more.is_none());
    }

    #[test]
    fn has_more_shows_load_more_and_appends() {
        let mut modal = HistoryModal::new();
        let first = modal.open("https://a.example", "A", &[]);
        assert!(modal.complete(&first, Ok(page(20, true))));
        let view = modal_view(&modal).unwrap();
        assert_eq!(view.load_more.as_deref(), Some(LOAD_MORE_LABEL));
        assert_eq!(view.rows.len(), 20);

        let second = modal.load_more().unwrap();
        assert_eq!(second.page, 2);
        // Existing rows stay visible while the next page loads.
        let view = modal_view(&modal).unwrap();
        assert_eq!(view.rows.len(), 20);
        assert_eq!(view.notice, None);

        let mut last = page(5, false);
        last.entries = entries(5, false);
        assert!(modal.complete(&second, Ok(last)));
        let view = modal_view(&modal).unwrap();
        assert_eq!(view.rows.len(), 25);
        assert!(view.rows[0].available);
        assert!(!view.rows[24].available);
        assert!(view.load_more.is_none());
        assert!(modal.load_more().is_none());
    }

    #[test]
    fn load_more_is_refused_while_loading() {
        let mut modal = HistoryModal::new();
        modal.open("https://a.example", "A", &[]);
        assert!(modal.load_more().is_none());
    }

    #[test]
    fn reopen_resets_pagination_and_content() {
        let mut modal = HistoryModal::new();
        let first = modal.open("https://a.example", "A", &[]);
        modal.complete(&first, Ok(page(20, true)));
        let second = modal.load_more().unwrap();
        modal.complete(&second, Ok(page(20, true)));
        assert_eq!(modal.page(), 2);

        let request = modal.open("https://b.example", "B", &[]);
        assert_eq!(request.page, 1);
        assert_eq!(modal.page(), 1);
        assert!(modal.entries().is_empty());
        assert_eq!(modal.url(), "https://b.example");
    }

    #[test]
    fn stale_response_is_ignored() {
        let mut modal = HistoryModal::new();
        let slow = modal.open("https://a.example", "A", &[]);
        let fast = modal.open("https://b.example", "B", &[]);
        assert!(modal.complete(&fast, Ok(page(3, false))));
        assert!(!modal.complete(&slow, Ok(page(20, true))));
        assert_eq!(modal.entries().len(), 3);
        assert_eq!(modal.title(), "B");
    }

    #[test]
    fn close_discards_in_flight_response() {
        let mut modal = HistoryModal::new();
        let request = modal.open("https://a.example", "A", &[]);
        modal.close();
        assert!(!modal.complete(&request, Ok(page(3, false))));
        assert!(!modal.is_open());
    }

    #[test]
    fn first_page_failure_shows_error() {
        let mut modal = HistoryModal::new();
        let request = modal.open("https://a.example", "A", &[]);
        modal.complete(&request, Err(ApiError::HttpStatus(StatusCode::INTERNAL_SERVER_ERROR)));
        let view = modal_view(&modal).unwrap();
        match view.notice {
            Some(ModalNotice::Error(message)) => assert!(message.starts_with("加载失败: ")),
            other => panic!("unexpected notice {other:?}"),
        }
    }

    #[test]
    fn unsuccessful_first_page_shows_empty() {
        let mut modal = HistoryModal::new();
        let request = modal.open("https://a.example", "A", &[]);
        modal.complete(&request, Err(ApiError::Unsuccessful));
        assert_eq!(modal_view(&modal).unwrap().notice, Some(ModalNotice::Empty));
    }

    #[test]
    fn failed_load_more_keeps_entries_and_allows_retry() {
        let mut modal = HistoryModal::new();
        let first = modal.open("https://a.example", "A", &[]);
        modal.complete(&first, Ok(page(20, true)));
        let second = modal.load_more().unwrap();
        modal.complete(&second, Err(ApiError::HttpStatus(StatusCode::BAD_GATEWAY)));

        let view = modal_view(&modal).unwrap();
        assert_eq!(view.rows.len(), 20);
        assert_eq!(view.load_more.as_deref(), Some(LOAD_MORE_RETRY));

        let retry = modal.load_more().unwrap();
        assert_eq!(retry.page, 2);
        modal.complete(&retry, Ok(page(4, false)));
        assert_eq!(modal.entries().len(), 24);
    }

    #[test]
    fn summary_comes_from_daily_stats_until_server_sends_one() {
        let mut modal = HistoryModal::new();
        let daily = vec![daily("2024-02-29", 4, 2), daily("2024-03-01", 10, 10)];
        let request = modal.open("https://a.example", "A", &daily);
        let months: Vec<&str> = modal.summary().iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2024-03", "2024-02"]);

        let mut first = page(1, false);
        first.monthly_summary = Some(vec![MonthlySummary {
            month: "2024-03".into(),
            total_checks: 100,
            successful_checks: 99,
            failed_checks: 1,
            total_response_time: 0.0,
        }]);
        modal.complete(&request, Ok(first));
        assert_eq!(modal.summary().len(), 1);
        assert_eq!(modal_view(&modal).unwrap().summary[0].uptime, "99.00%");
    }
}
