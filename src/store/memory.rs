use std::{cmp::Reverse, collections::HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ProfileStore;
use crate::{
    profiles::model::{Account, Candidate, Recruiter},
    search::{
        filter::PageRequest,
        history::{push_bounded, SearchHistoryEntry},
        predicate::Predicate,
        stats::Statistics,
        suggestions::{suggestions_from, SuggestionKind},
    },
};

#[derive(Default)]
struct Records {
    candidates: HashMap<Uuid, Candidate>,
    recruiters: HashMap<Uuid, Recruiter>,
}

impl Records {
    fn email_in_use(&self, email: &str) -> bool {
        self.candidates.values().any(|c| c.email == email)
            || self.recruiters.values().any(|r| r.email == email)
    }
}

/// In-process store. Both kinds sit behind one lock, so the email check and
/// the insert are atomic across kinds.
#[derive(Default)]
pub struct MemoryProfileStore {
    records: RwLock<Records>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies all candidates out so aggregation runs without holding the lock.
    async fn candidate_snapshot(&self) -> Vec<Candidate> {
        self.records.read().await.candidates.values().cloned().collect()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn email_in_use(&self, email: &str) -> anyhow::Result<bool> {
        Ok(self.records.read().await.email_in_use(email))
    }

    async fn insert_candidate(&self, candidate: &Candidate) -> anyhow::Result<bool> {
        let mut records = self.records.write().await;
        if records.email_in_use(&candidate.email) {
            return Ok(false);
        }
        records.candidates.insert(candidate.id, candidate.clone());
        Ok(true)
    }

    async fn insert_recruiter(&self, recruiter: &Recruiter) -> anyhow::Result<bool> {
        let mut records = self.records.write().await;
        if records.email_in_use(&recruiter.email) {
            return Ok(false);
        }
        records.recruiters.insert(recruiter.id, recruiter.clone());
        Ok(true)
    }

    async fn find_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let records = self.records.read().await;
        if let Some(c) = records.candidates.values().find(|c| c.email == email) {
            return Ok(Some(Account::Candidate(c.clone())));
        }
        Ok(records
            .recruiters
            .values()
            .find(|r| r.email == email)
            .cloned()
            .map(Account::Recruiter))
    }

    async fn candidate(&self, id: Uuid) -> anyhow::Result<Option<Candidate>> {
        Ok(self.records.read().await.candidates.get(&id).cloned())
    }

    async fn recruiter(&self, id: Uuid) -> anyhow::Result<Option<Recruiter>> {
        Ok(self.records.read().await.recruiters.get(&id).cloned())
    }

    async fn update_candidate(&self, candidate: &Candidate) -> anyhow::Result<bool> {
        let mut records = self.records.write().await;
        match records.candidates.get_mut(&candidate.id) {
            Some(stored) => {
                *stored = Candidate {
                    email: stored.email.clone(),
                    password_hash: stored.password_hash.clone(),
                    created_at: stored.created_at,
                    ..candidate.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_recruiter(&self, recruiter: &Recruiter) -> anyhow::Result<bool> {
        let mut records = self.records.write().await;
        match records.recruiters.get_mut(&recruiter.id) {
            Some(stored) => {
                stored.name = recruiter.name.clone();
                stored.company_name = recruiter.company_name.clone();
                stored.job_title = recruiter.job_title.clone();
                stored.department = recruiter.department.clone();
                stored.search_preferences = recruiter.search_preferences.clone();
                stored.profile_completed = recruiter.profile_completed;
                stored.updated_at = recruiter.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_login(&self, recruiter_id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        if let Some(r) = self.records.write().await.recruiters.get_mut(&recruiter_id) {
            r.last_login = at;
        }
        Ok(())
    }

    async fn search_candidates(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Candidate>, u64)> {
        let mut matches: Vec<Candidate> = {
            let records = self.records.read().await;
            records
                .candidates
                .values()
                .filter(|c| predicate.matches(c))
                .cloned()
                .collect()
        };
        matches.sort_by_key(|c| Reverse((c.updated_at, c.id)));

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(page.skip().try_into().unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn statistics(&self, now: OffsetDateTime) -> anyhow::Result<Statistics> {
        let snapshot = self.candidate_snapshot().await;
        Ok(Statistics::compute(&snapshot, now))
    }

    async fn suggestions(&self, kind: SuggestionKind) -> anyhow::Result<Vec<String>> {
        let snapshot = self.candidate_snapshot().await;
        Ok(suggestions_from(&snapshot, kind))
    }

    async fn append_search_history(
        &self,
        recruiter_id: Uuid,
        entry: &SearchHistoryEntry,
        limit: usize,
    ) -> anyhow::Result<bool> {
        let mut records = self.records.write().await;
        match records.recruiters.get_mut(&recruiter_id) {
            Some(r) => {
                push_bounded(&mut r.search_history, entry.clone(), limit);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{
        filter::{compile, SearchParams},
        history::{FilterSnapshot, HISTORY_LIMIT},
    };
    use time::Duration;

    fn candidate(name: &str, updated_mins_ago: i64) -> Candidate {
        let now = OffsetDateTime::now_utc();
        let mut c = Candidate::new(name.into(), format!("{name}@example.com"), "h".into(), now);
        c.updated_at = now - Duration::minutes(updated_mins_ago);
        c
    }

    fn recruiter(email: &str) -> Recruiter {
        Recruiter::new("Rita".into(), email.into(), "h".into(), "Acme".into(), OffsetDateTime::now_utc())
    }

    #[tokio::test]
    async fn email_namespace_spans_both_kinds() {
        let store = MemoryProfileStore::new();
        let c = Candidate::new("Ana".into(), "a@b.com".into(), "h".into(), OffsetDateTime::now_utc());
        assert!(store.insert_candidate(&c).await.unwrap());
        assert!(store.email_in_use("a@b.com").await.unwrap());
        assert!(!store.insert_recruiter(&recruiter("a@b.com")).await.unwrap());
        assert!(store.insert_recruiter(&recruiter("r@b.com")).await.unwrap());

        match store.find_account_by_email("r@b.com").await.unwrap() {
            Some(Account::Recruiter(r)) => assert_eq!(r.company_name, "Acme"),
            other => panic!("expected recruiter, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_orders_by_update_and_pages() {
        let store = MemoryProfileStore::new();
        for (name, mins) in [("old", 30), ("new", 1), ("mid", 10)] {
            store.insert_candidate(&candidate(name, mins)).await.unwrap();
        }
        let compiled = compile(&SearchParams {
            limit: Some("2".into()),
            ..Default::default()
        });
        let (page, total) = store
            .search_candidates(&compiled.predicate, &compiled.page)
            .await
            .unwrap();
        assert_eq!(total, 3);
        let names: Vec<&str> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["new", "mid"]);

        let (page, _) = store
            .search_candidates(&compiled.predicate, &PageRequest { page: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "old");
    }

    #[tokio::test]
    async fn update_keeps_identity_fields() {
        let store = MemoryProfileStore::new();
        let c = candidate("ana", 0);
        store.insert_candidate(&c).await.unwrap();

        let mut changed = c.clone();
        changed.email = "other@example.com".into();
        changed.skills = vec!["Rust".into()];
        assert!(store.update_candidate(&changed).await.unwrap());

        let stored = store.candidate(c.id).await.unwrap().unwrap();
        assert_eq!(stored.email, c.email);
        assert_eq!(stored.skills, vec!["Rust"]);
    }

    #[tokio::test]
    async fn history_append_is_bounded() {
        let store = MemoryProfileStore::new();
        let r = recruiter("h@corp.io");
        store.insert_recruiter(&r).await.unwrap();
        for n in 0..(HISTORY_LIMIT as u64 + 1) {
            let entry = SearchHistoryEntry {
                filters: FilterSnapshot::default(),
                search_date: OffsetDateTime::UNIX_EPOCH + time::Duration::minutes(n as i64),
                results_count: n,
            };
            assert!(store.append_search_history(r.id, &entry, HISTORY_LIMIT).await.unwrap());
        }
        let stored = store.recruiter(r.id).await.unwrap().unwrap();
        assert_eq!(stored.search_history.len(), HISTORY_LIMIT);
        assert_eq!(stored.search_history[0].results_count, 1);
        assert_eq!(stored.search_history[HISTORY_LIMIT - 1].results_count, HISTORY_LIMIT as u64);

        let unknown = store
            .append_search_history(Uuid::new_v4(), &stored.search_history[0], HISTORY_LIMIT)
            .await
            .unwrap();
        assert!(!unknown);
    }
}
