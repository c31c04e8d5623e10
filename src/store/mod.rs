//! Profile store: candidate and recruiter records with a shared email
//! namespace.

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    profiles::model::{Account, Candidate, Recruiter},
    search::{
        filter::PageRequest, history::SearchHistoryEntry, predicate::Predicate, stats::Statistics,
        suggestions::SuggestionKind,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryProfileStore;
pub use postgres::PgProfileStore;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// True if either kind of account already uses `email`.
    async fn email_in_use(&self, email: &str) -> anyhow::Result<bool>;

    /// Inserts unless the email is taken; returns `false` on a taken email.
    async fn insert_candidate(&self, candidate: &Candidate) -> anyhow::Result<bool>;
    async fn insert_recruiter(&self, recruiter: &Recruiter) -> anyhow::Result<bool>;

    /// Looks in candidates first, then recruiters.
    async fn find_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;

    async fn candidate(&self, id: Uuid) -> anyhow::Result<Option<Candidate>>;
    async fn recruiter(&self, id: Uuid) -> anyhow::Result<Option<Recruiter>>;

    /// Overwrites the mutable profile fields. Returns `false` if missing.
    async fn update_candidate(&self, candidate: &Candidate) -> anyhow::Result<bool>;

    /// Overwrites profile fields; leaves search history and last login alone.
    async fn update_recruiter(&self, recruiter: &Recruiter) -> anyhow::Result<bool>;

    async fn touch_last_login(&self, recruiter_id: Uuid, at: OffsetDateTime) -> anyhow::Result<()>;

    /// One page of matches, newest update first, plus the total match count.
    async fn search_candidates(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> anyhow::Result<(Vec<Candidate>, u64)>;

    async fn statistics(&self, now: OffsetDateTime) -> anyhow::Result<Statistics>;

    async fn suggestions(&self, kind: SuggestionKind) -> anyhow::Result<Vec<String>>;

    /// Appends to the bounded history in one atomic write on the record.
    async fn append_search_history(
        &self,
        recruiter_id: Uuid,
        entry: &SearchHistoryEntry,
        limit: usize,
    ) -> anyhow::Result<bool>;
}
