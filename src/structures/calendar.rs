//! Calendar grid building and monthly aggregation.
//!
//! Day boundaries are always computed at a fixed offset so that every
//! viewer sees the same grid regardless of the machine's local timezone.

use std::collections::{BTreeMap, HashMap};

use time::{
    macros::{format_description, offset},
    Date, Duration, Month, OffsetDateTime, UtcOffset,
};

use super::model::{DailyStat, MonthlySummary};

/// Asia/Shanghai has no DST, so a fixed offset is exact.
pub const SHANGHAI: UtcOffset = offset!(+8);

/// Length of the recent-stats strip.
pub const RECENT_DAYS: u16 = 30;

/// One day of a filled calendar range.
#[derive(Debug, Clone, PartialEq)]
pub enum DaySlot {
    /// Date absent from the input.
    Missing { date: Date },
    /// Present, but no check was recorded.
    Idle(DailyStat),
    Checked(DailyStat),
}

impl DaySlot {
    pub fn date_label(&self) -> String {
        match self {
            DaySlot::Missing { date } => day_label(*date),
            DaySlot::Idle(stat) | DaySlot::Checked(stat) => stat.date.clone(),
        }
    }

    pub fn stat(&self) -> Option<&DailyStat> {
        match self {
            DaySlot::Missing { .. } | DaySlot::Idle(_) => None,
            DaySlot::Checked(stat) => Some(stat),
        }
    }
}

/// Every calendar day from `start` to `end` inclusive, as seen at `offset`.
pub fn build_date_range(start: OffsetDateTime, end: OffsetDateTime, offset: UtcOffset) -> Vec<Date> {
    days_between(start.to_offset(offset).date(), end.to_offset(offset).date())
}

/// The last `days` days ending today at `offset`.
pub fn recent_window(now: OffsetDateTime, days: u16, offset: UtcOffset) -> Vec<Date> {
    if days == 0 {
        return Vec::new();
    }
    let start = now - Duration::days(i64::from(days) - 1);
    build_date_range(start, now, offset)
}

/// Every day of the given month. Empty if the month is out of range.
pub fn month_window(year: i32, month: u8) -> Vec<Date> {
    let Ok(month) = Month::try_from(month) else {
        return Vec::new();
    };
    let last = month.length(year);
    match (
        Date::from_calendar_date(year, month, 1),
        Date::from_calendar_date(year, month, last),
    ) {
        (Ok(first), Ok(last)) => days_between(first, last),
        _ => Vec::new(),
    }
}

/// Parses a `YYYY-MM` label.
pub fn parse_month_label(label: &str) -> Option<(i32, u8)> {
    let first = parse_day(&format!("{label}-01"))?;
    Some((first.year(), first.month() as u8))
}

pub fn current_month(now: OffsetDateTime, offset: UtcOffset) -> (i32, u8) {
    let date = now.to_offset(offset).date();
    (date.year(), date.month() as u8)
}

/// One slot per date of `range`, in range order.
pub fn fill_gaps(daily_stats: &[DailyStat], range: &[Date]) -> Vec<DaySlot> {
    let by_date: HashMap<Date, &DailyStat> = daily_stats
        .iter()
        .filter_map(|stat| Some((parse_day(&stat.date)?, stat)))
        .collect();

    range
        .iter()
        .map(|date| match by_date.get(date) {
            None => DaySlot::Missing { date: *date },
            Some(stat) if stat.total_checks == 0 => DaySlot::Idle((*stat).clone()),
            Some(stat) => DaySlot::Checked((*stat).clone()),
        })
        .collect()
}

/// Sums daily stats per `YYYY-MM`, newest month first.
pub fn aggregate_by_month(daily_stats: &[DailyStat]) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<(i32, u8), MonthlySummary> = BTreeMap::new();
    for stat in daily_stats {
        let Some(date) = parse_day(&stat.date) else {
            continue;
        };
        let summary = months
            .entry((date.year(), date.month() as u8))
            .or_insert_with(|| MonthlySummary {
                month: month_label(date),
                ..MonthlySummary::default()
            });
        summary.total_checks += stat.total_checks;
        summary.successful_checks += stat.successful_checks;
        summary.failed_checks += stat.failed_checks;
        summary.total_response_time += stat.total_response_time;
    }
    months.into_values().rev().collect()
}

pub fn day_label(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Parses a `YYYY-MM-DD` label.
pub fn parse_day(label: &str) -> Option<Date> {
    Date::parse(label, format_description!("[year]-[month]-[day]")).ok()
}

fn month_label(date: Date) -> String {
    date.format(format_description!("[year]-[month]"))
        .unwrap_or_default()
}

fn days_between(first: Date, last: Date) -> Vec<Date> {
    let mut days = Vec::new();
    let mut current = Some(first);
    while let Some(date) = current {
        if date > last {
            break;
        }
        days.push(date);
        current = date.next_day();
    }
    days
}
