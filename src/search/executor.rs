use anyhow::Context;

use super::{filter::PageRequest, predicate::Predicate};
use crate::{profiles::model::Candidate, store::ProfileStore};

/// One page of search results plus the paging flags the client renders.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub candidates: Vec<Candidate>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl SearchPage {
    pub fn new(candidates: Vec<Candidate>, total: u64, paging: PageRequest) -> Self {
        let limit = u64::from(paging.limit.max(1));
        let total_pages = total.div_ceil(limit);
        Self {
            candidates,
            total,
            page: paging.page,
            limit: paging.limit,
            total_pages,
            has_next_page: u64::from(paging.page) < total_pages,
            has_prev_page: paging.page > 1,
        }
    }
}

pub async fn execute(
    store: &dyn ProfileStore,
    predicate: &Predicate,
    page: PageRequest,
) -> anyhow::Result<SearchPage> {
    let (candidates, total) = store
        .search_candidates(predicate, &page)
        .await
        .context("run candidate search")?;
    Ok(SearchPage::new(candidates, total, page))
}
