use serde::{Deserialize, Serialize};

use super::{filter::SearchParams, history::SearchHistoryEntry, stats::Statistics};
use crate::profiles::model::Candidate;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub candidates: Vec<Candidate>,
    pub total_candidates: u64,
    pub current_page: u32,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    /// Raw filter parameters as received.
    pub filters: SearchParams,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub success: bool,
    pub statistics: Statistics,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryResponse {
    pub success: bool,
    pub search_history: Vec<SearchHistoryEntry>,
}
