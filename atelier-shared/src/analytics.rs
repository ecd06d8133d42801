/// Page-view aggregation over a rolling 30-day window
///
/// [`summarize`] is pure: it receives the raw rows and the reference time,
/// so the window and the counting rules are testable without a database.
/// [`get_analytics`] loads the rows and calls it.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::analytics::PageView;

/// Length of the reporting window in days
pub const WINDOW_DAYS: i64 = 30;

/// Number of pages listed in `top_pages`
pub const TOP_PAGES_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCount {
    pub page: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub window_start: DateTime<Utc>,
    pub total_views: u64,
    /// Distinct non-empty visitor ids
    pub unique_visitors: u64,
    /// Mean over views that reported a duration; `None` when none did
    pub average_duration_ms: Option<f64>,
    pub top_pages: Vec<PageCount>,
    pub views_by_day: Vec<DayCount>,
}

/// Start of the window ending at `now`
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(WINDOW_DAYS)
}

/// Aggregates the views that fall inside the window ending at `now`
pub fn summarize(records: &[PageView], now: DateTime<Utc>) -> AnalyticsSummary {
    let since = window_start(now);

    let mut total_views = 0u64;
    let mut visitors: HashSet<&str> = HashSet::new();
    let mut duration_sum = 0i128;
    let mut duration_count = 0u64;
    let mut pages: HashMap<&str, u64> = HashMap::new();
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();

    for record in records.iter().filter(|r| r.created_at >= since) {
        total_views += 1;

        if let Some(visitor) = record.visitor_id.as_deref().filter(|v| !v.is_empty()) {
            visitors.insert(visitor);
        }

        if let Some(ms) = record.duration_ms {
            duration_sum += i128::from(ms);
            duration_count += 1;
        }

        *pages.entry(record.page.as_str()).or_default() += 1;
        *days.entry(record.created_at.date_naive()).or_default() += 1;
    }

    let mut top_pages: Vec<PageCount> = pages
        .into_iter()
        .map(|(page, views)| PageCount {
            page: page.to_string(),
            views,
        })
        .collect();
    top_pages.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.page.cmp(&b.page)));
    top_pages.truncate(TOP_PAGES_LIMIT);

    AnalyticsSummary {
        window_start: since,
        total_views,
        unique_visitors: visitors.len() as u64,
        average_duration_ms: (duration_count > 0)
            .then(|| duration_sum as f64 / duration_count as f64),
        top_pages,
        views_by_day: days
            .into_iter()
            .map(|(date, views)| DayCount { date, views })
            .collect(),
    }
}

/// Loads the last 30 days of page views and summarizes them
pub async fn get_analytics(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<AnalyticsSummary, sqlx::Error> {
    let records = PageView::list_since(pool, window_start(now)).await?;
    Ok(summarize(&records, now))
}
