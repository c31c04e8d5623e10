use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::filter::CandidateFilter;
use crate::{profiles::model::Availability, store::ProfileStore};

/// Most recent searches kept per recruiter.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

/// The filter values a search ran with; unset filters are kept as nulls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterSnapshot {
    pub skills: Option<Vec<String>>,
    pub location: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub graduation_year: Option<i32>,
    pub availability: Option<Availability>,
    pub experience_range: Range<i64>,
    pub gpa_range: Range<f64>,
    pub search_term: Option<String>,
}

impl From<&CandidateFilter> for FilterSnapshot {
    fn from(f: &CandidateFilter) -> Self {
        Self {
            skills: (!f.skills.is_empty()).then(|| f.skills.clone()),
            location: f.location.clone(),
            degree: f.degree.clone(),
            field_of_study: f.field_of_study.clone(),
            graduation_year: f.graduation_year,
            availability: f.availability,
            experience_range: Range {
                min: f.experience_min,
                max: f.experience_max,
            },
            gpa_range: Range {
                min: f.gpa_min,
                max: f.gpa_max,
            },
            search_term: f.search_term.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub filters: FilterSnapshot,
    #[serde(with = "time::serde::rfc3339")]
    pub search_date: OffsetDateTime,
    pub results_count: u64,
}

/// Inserts `entry` in `search_date` order, then drops the oldest entries
/// beyond `limit`. Writes may land out of order; equal dates keep arrival order.
pub fn push_bounded(history: &mut Vec<SearchHistoryEntry>, entry: SearchHistoryEntry, limit: usize) {
    let at = history.partition_point(|e| e.search_date <= entry.search_date);
    history.insert(at, entry);
    if history.len() > limit {
        let excess = history.len() - limit;
        history.drain(..excess);
    }
}

/// Records a search against the recruiter. Failures are logged and dropped.
pub async fn record_search(
    store: &dyn ProfileStore,
    recruiter_id: Uuid,
    entry: SearchHistoryEntry,
) {
    match store
        .append_search_history(recruiter_id, &entry, HISTORY_LIMIT)
        .await
    {
        Ok(true) => debug!(%recruiter_id, results = entry.results_count, "search recorded"),
        Ok(false) => warn!(%recruiter_id, "search history skipped: recruiter not found"),
        Err(e) => warn!(error = ?e, %recruiter_id, "failed to record search history"),
    }
}

/// Runs [`record_search`] off the request path.
pub fn record_in_background(
    store: Arc<dyn ProfileStore>,
    recruiter_id: Uuid,
    entry: SearchHistoryEntry,
) -> JoinHandle<()> {
    tokio::spawn(async move { record_search(store.as_ref(), recruiter_id, entry).await })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u64) -> SearchHistoryEntry {
        SearchHistoryEntry {
            filters: FilterSnapshot::default(),
            search_date: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(n as i64),
            results_count: n,
        }
    }

    fn counts(history: &[SearchHistoryEntry]) -> Vec<u64> {
        history.iter().map(|e| e.results_count).collect()
    }

    #[test]
    fn history_is_capped_fifo() {
        let mut history = Vec::new();
        for n in 0..51 {
            push_bounded(&mut history, entry(n), HISTORY_LIMIT);
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(counts(&history), (1..51).collect::<Vec<_>>());
    }

    #[test]
    fn late_writes_land_in_date_order() {
        let mut history = Vec::new();
        for n in [3, 1, 4, 2, 5] {
            push_bounded(&mut history, entry(n), HISTORY_LIMIT);
        }
        assert_eq!(counts(&history), vec![1, 2, 3, 4, 5]);

        let mut history: Vec<_> = (10..60).map(entry).collect();
        push_bounded(&mut history, entry(5), HISTORY_LIMIT);
        assert_eq!(counts(&history), (10..60).collect::<Vec<_>>());
        push_bounded(&mut history, entry(30), HISTORY_LIMIT);
        assert_eq!(history.len(), HISTORY_LIMIT);
        let expected: Vec<u64> = (11..31).chain([30]).collect();
        assert_eq!(&counts(&history)[..21], expected.as_slice());
    }

    #[test]
    fn overfull_history_is_trimmed_on_next_push() {
        let mut history: Vec<_> = (0..60).map(entry).collect();
        push_bounded(&mut history, entry(60), HISTORY_LIMIT);
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.first().unwrap().results_count, 11);
        assert_eq!(history.last().unwrap().results_count, 60);
    }

    #[test]
    fn snapshot_keeps_nulls_for_unset_filters() {
        let filter = CandidateFilter {
            skills: vec!["rust".into()],
            experience_min: Some(2),
            ..Default::default()
        };
        let json = serde_json::to_value(FilterSnapshot::from(&filter)).unwrap();
        assert_eq!(json["skills"], serde_json::json!(["rust"]));
        assert!(json["location"].is_null());
        assert!(json["graduationYear"].is_null());
        assert_eq!(json["experienceRange"]["min"], 2);
        assert!(json["experienceRange"]["max"].is_null());
        assert!(json["gpaRange"]["min"].is_null());
    }
}
